use crate::core::direction::DEFAULT_DEADZONE;
use crate::game::machine::{FAILURE_TICK, FAILURE_TIMEOUT, MachineConfig};
use crate::game::scoring::Scoring;
use configparser::ini::Ini;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const CONFIG_PATH: &str = "save/kbdtrainer.ini";

// Window
pub const WINDOW_TITLE: &str = "KBD Trainer";
pub const WINDOW_WIDTH: u32 = 640;
pub const WINDOW_HEIGHT: u32 = 360;

// Host loop
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);
pub const MAX_DELTA_TIME: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub stick_deadzone: f32,
    pub input_debounce: Duration,
    pub scoring: Scoring,
    pub failure_timeout: Duration,
    pub failure_tick: Duration,
    pub window_width: u32,
    pub window_height: u32,
    pub save_dir: PathBuf,
    pub modes_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stick_deadzone: DEFAULT_DEADZONE,
            input_debounce: Duration::ZERO,
            scoring: Scoring::default(),
            failure_timeout: FAILURE_TIMEOUT,
            failure_tick: FAILURE_TICK,
            window_width: WINDOW_WIDTH,
            window_height: WINDOW_HEIGHT,
            save_dir: PathBuf::from("save"),
            modes_file: None,
        }
    }
}

impl Config {
    pub fn machine(&self) -> MachineConfig {
        MachineConfig {
            scoring: self.scoring,
            failure_timeout: self.failure_timeout,
            failure_tick: self.failure_tick,
        }
    }

    pub fn from_ini(conf: &Ini) -> Self {
        let d = Self::default();
        let ms = |section: &str, key: &str, fallback: Duration| {
            Duration::from_millis(parse_or(conf, section, key, fallback.as_millis() as u64))
        };

        Self {
            stick_deadzone: parse_or(conf, "Input", "StickDeadzone", d.stick_deadzone).clamp(0.0, 0.95),
            input_debounce: ms("Input", "InputDebounceMs", d.input_debounce),
            scoring: Scoring {
                correct_input: parse_or(conf, "Scoring", "CorrectInput", d.scoring.correct_input),
                perfect_pattern: parse_or(conf, "Scoring", "PerfectPattern", d.scoring.perfect_pattern),
                combo_step: parse_or(conf, "Scoring", "ComboStep", d.scoring.combo_step).max(0.0),
                strict_first_input: parse_or(conf, "Scoring", "StrictFirstInput", 0u8) != 0,
            },
            failure_timeout: ms("Timing", "FailureTimeoutMs", d.failure_timeout),
            failure_tick: ms("Timing", "FailureTickMs", d.failure_tick).max(Duration::from_millis(1)),
            window_width: parse_or(conf, "Display", "WindowWidth", d.window_width),
            window_height: parse_or(conf, "Display", "WindowHeight", d.window_height),
            save_dir: conf.get("Storage", "SaveDir").filter(|s| !s.is_empty()).map(PathBuf::from).unwrap_or(d.save_dir),
            modes_file: conf.get("Storage", "ModesFile").filter(|s| !s.is_empty()).map(PathBuf::from),
        }
    }

    fn to_ini(&self) -> Ini {
        let mut conf = Ini::new();
        let mut put = |section: &str, key: &str, value: String| {
            conf.set(section, key, Some(value));
        };
        put("Input", "StickDeadzone", self.stick_deadzone.to_string());
        put("Input", "InputDebounceMs", self.input_debounce.as_millis().to_string());
        put("Scoring", "CorrectInput", self.scoring.correct_input.to_string());
        put("Scoring", "PerfectPattern", self.scoring.perfect_pattern.to_string());
        put("Scoring", "ComboStep", self.scoring.combo_step.to_string());
        put("Scoring", "StrictFirstInput", (self.scoring.strict_first_input as u8).to_string());
        put("Timing", "FailureTimeoutMs", self.failure_timeout.as_millis().to_string());
        put("Timing", "FailureTickMs", self.failure_tick.as_millis().to_string());
        put("Display", "WindowWidth", self.window_width.to_string());
        put("Display", "WindowHeight", self.window_height.to_string());
        put("Storage", "SaveDir", self.save_dir.display().to_string());
        put("Storage", "ModesFile", String::new());
        conf
    }
}

fn parse_or<T: FromStr + Copy>(conf: &Ini, section: &str, key: &str, fallback: T) -> T {
    match conf.get(section, key) {
        None => fallback,
        Some(raw) if raw.trim().is_empty() => fallback,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid value '{}' for [{}] {}, using default.", raw, section, key);
            fallback
        }),
    }
}

fn create_default_file(path: &Path) -> Result<(), std::io::Error> {
    info!("Config not found, writing defaults to '{}'.", path.display());
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    Config::default().to_ini().write(path)
}

/// Reads the config file, creating it with defaults first if it is missing.
/// Never fails; anything unreadable falls back to defaults.
pub fn load(path: &Path) -> Config {
    if !path.exists() {
        if let Err(e) = create_default_file(path) {
            warn!("Failed to create default config: {}", e);
            return Config::default();
        }
    }

    let mut conf = Ini::new();
    match conf.load(path) {
        Ok(_) => {
            let config = Config::from_ini(&conf);
            info!("Loaded config from '{}'.", path.display());
            config
        }
        Err(e) => {
            warn!("Failed to load '{}' ({}), using defaults.", path.display(), e);
            Config::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ini(text: &str) -> Ini {
        let mut conf = Ini::new();
        conf.read(text.to_string()).unwrap();
        conf
    }

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Config::from_ini(&ini("")), Config::default());
    }

    #[test]
    fn reads_overrides() {
        let conf = ini("[Scoring]\nComboStep=0\nStrictFirstInput=1\n[Timing]\nFailureTimeoutMs=500\n[Storage]\nModesFile=modes.json\n");
        let config = Config::from_ini(&conf);
        assert_eq!(config.scoring, Scoring { combo_step: 0.0, strict_first_input: true, ..Scoring::default() });
        assert_eq!(config.failure_timeout, Duration::from_millis(500));
        assert_eq!(config.modes_file, Some(PathBuf::from("modes.json")));
    }

    #[test]
    fn garbage_values_fall_back() {
        let conf = ini("[Input]\nStickDeadzone=lots\n[Display]\nWindowWidth=-3\n");
        let config = Config::from_ini(&conf);
        assert_eq!(config.stick_deadzone, DEFAULT_DEADZONE);
        assert_eq!(config.window_width, WINDOW_WIDTH);
    }

    #[test]
    fn defaults_survive_a_write_and_read() {
        let text = Config::default().to_ini().writes();
        assert_eq!(Config::from_ini(&ini(&text)), Config::default());
    }
}
