use crate::core::direction::Direction;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mode {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub pattern: Vec<Direction>,
    pub difficulty: Difficulty,
}

#[derive(Debug)]
pub enum ModeError {
    Empty,
    EmptyPattern { id: u32 },
    DuplicateId { id: u32 },
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for ModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeError::Empty => write!(f, "mode table is empty"),
            ModeError::EmptyPattern { id } => write!(f, "mode {} has an empty pattern", id),
            ModeError::DuplicateId { id } => write!(f, "mode id {} appears more than once", id),
            ModeError::Io(e) => write!(f, "failed to read mode file: {}", e),
            ModeError::Parse(e) => write!(f, "failed to parse mode file: {}", e),
        }
    }
}

impl Error for ModeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ModeError::Io(e) => Some(e),
            ModeError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ModeError {
    fn from(e: std::io::Error) -> Self {
        ModeError::Io(e)
    }
}

impl From<serde_json::Error> for ModeError {
    fn from(e: serde_json::Error) -> Self {
        ModeError::Parse(e)
    }
}

/// Ordered, validated list of modes. Indices are stable for the lifetime of the table.
#[derive(Clone, Debug)]
pub struct ModeTable {
    modes: Vec<Mode>,
}

impl ModeTable {
    pub fn new(modes: Vec<Mode>) -> Result<Self, ModeError> {
        if modes.is_empty() {
            return Err(ModeError::Empty);
        }
        let mut seen = HashSet::with_capacity(modes.len());
        for mode in &modes {
            if mode.pattern.is_empty() {
                return Err(ModeError::EmptyPattern { id: mode.id });
            }
            if !seen.insert(mode.id) {
                return Err(ModeError::DuplicateId { id: mode.id });
            }
        }
        Ok(Self { modes })
    }

    pub fn from_json(text: &str) -> Result<Self, ModeError> {
        let modes: Vec<Mode> = serde_json::from_str(text)?;
        Self::new(modes)
    }

    pub fn from_file(path: &Path) -> Result<Self, ModeError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Loads `path` when given, falling back to the built-in table on any error.
    pub fn load_or_builtin(path: Option<&Path>) -> Self {
        let Some(path) = path else { return Self::builtin(); };
        match Self::from_file(path) {
            Ok(table) => {
                info!("Loaded {} modes from '{}'.", table.len(), path.display());
                table
            }
            Err(e) => {
                warn!("Ignoring mode file '{}': {}. Using built-in modes.", path.display(), e);
                Self::builtin()
            }
        }
    }

    pub fn builtin() -> Self {
        use Direction::*;
        let mode = |id, name: &str, description: &str, pattern: Vec<Direction>, difficulty| Mode {
            id,
            name: name.to_string(),
            description: description.to_string(),
            pattern,
            difficulty,
        };
        Self {
            modes: vec![
                mode(0, "P1 KBD", "Korean Back Dash - Player 1 Side",
                    vec![Back, Neutral, Back, DownBack], Difficulty::Beginner),
                mode(1, "P2 KBD", "Korean Back Dash - Player 2 Side",
                    vec![Forward, Neutral, Forward, DownForward], Difficulty::Beginner),
                mode(2, "P1 WD", "Wave Dash - Player 1 Side",
                    vec![Forward, Neutral, Down, DownForward, Forward, Neutral], Difficulty::Intermediate),
                mode(3, "P2 WD", "Wave Dash - Player 2 Side",
                    vec![Back, Neutral, Down, DownBack, Back, Neutral], Difficulty::Intermediate),
            ],
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.modes.len()
    }

    // Never true for a constructed table.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    #[inline(always)]
    pub fn get(&self, index: usize) -> Option<&Mode> {
        self.modes.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mode> {
        self.modes.iter()
    }
}

impl std::ops::Index<usize> for ModeTable {
    type Output = Mode;

    fn index(&self, index: usize) -> &Mode {
        &self.modes[index]
    }
}
