use log::{debug, info, warn};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::PathBuf;

pub const HIGH_SCORES_KEY: &str = "kbd-trainer-highscores";

/// Per-mode best scores. Reads never fail; unknown modes score 0.
pub trait ScoreStore {
    fn get(&self, mode_id: u32) -> u64;
    fn set(&mut self, mode_id: u32, score: u64);
}

/// Minimal string key-value persistence, the shape of browser local storage.
pub trait KeyValueStore {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&mut self, key: &str, value: &str) -> io::Result<()>;
}

// --- Backends ---

/// One `<key>.json` file per key inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read '{}': {}", path.display(), e);
                None
            }
        }
    }

    fn write(&mut self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        // Write-then-rename so a crash never leaves a half-written table.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store.entries.insert(key.to_string(), value.to_string());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// --- High score table ---

/// Cached high-score table, written through to its backend on every `set`.
#[derive(Debug, Clone)]
pub struct HighScores<K: KeyValueStore> {
    backend: K,
    table: BTreeMap<u32, u64>,
}

impl<K: KeyValueStore> HighScores<K> {
    pub fn load(backend: K) -> Self {
        let table = match backend.read(HIGH_SCORES_KEY) {
            Some(text) => parse_table(&text),
            None => {
                debug!("No stored high scores under '{}'.", HIGH_SCORES_KEY);
                BTreeMap::new()
            }
        };
        info!("Loaded {} high score entries.", table.len());
        Self { backend, table }
    }

    pub fn backend(&self) -> &K {
        &self.backend
    }

    pub fn entries(&self) -> impl Iterator<Item = (u32, u64)> + '_ {
        self.table.iter().map(|(&id, &score)| (id, score))
    }

    fn persist(&mut self) {
        let record: Map<String, Value> = self
            .table
            .iter()
            .map(|(id, score)| (id.to_string(), Value::from(*score)))
            .collect();
        let text = Value::Object(record).to_string();
        if let Err(e) = self.backend.write(HIGH_SCORES_KEY, &text) {
            warn!("Failed to save high scores: {}", e);
        }
    }
}

impl<K: KeyValueStore> ScoreStore for HighScores<K> {
    fn get(&self, mode_id: u32) -> u64 {
        self.table.get(&mode_id).copied().unwrap_or(0)
    }

    fn set(&mut self, mode_id: u32, score: u64) {
        self.table.insert(mode_id, score);
        self.persist();
    }
}

/// Parses the flat `{"<mode id>": <score>}` record. Anything that is not a
/// non-negative integer under a numeric key is dropped.
fn parse_table(text: &str) -> BTreeMap<u32, u64> {
    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            warn!("High score record is not valid JSON ({}), starting fresh.", e);
            return BTreeMap::new();
        }
    };
    let Value::Object(record) = value else {
        warn!("High score record is not an object, starting fresh.");
        return BTreeMap::new();
    };

    let mut table = BTreeMap::new();
    for (key, value) in record {
        match (key.parse::<u32>(), value.as_u64()) {
            (Ok(id), Some(score)) => {
                table.insert(id, score);
            }
            _ => warn!("Skipping malformed high score entry '{}': {}", key, value),
        }
    }
    table
}
