use std::path::Path;

use serde::Deserialize;

use crate::logger;
use crate::types::RunConfig;

/// Startup defaults read from `settings.json`. Never written back.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub delay_secs: f64,
    pub loop_repetitions: u32,
    pub total_repetitions: u32,
}

impl Default for Settings {
    fn default() -> Self {
        let cfg = RunConfig::default();
        Self {
            delay_secs: cfg.delay_secs,
            loop_repetitions: cfg.loop_repetitions,
            total_repetitions: cfg.total_repetitions,
        }
    }
}

impl Settings {
    /// Missing file falls back to defaults; a malformed one also warns.
    pub fn load(path: &Path) -> Self {
        let Ok(text) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&text) {
            Ok(settings) => settings,
            Err(e) => {
                logger::warn(&format!("ignoring {}: {}", path.display(), e));
                Self::default()
            }
        }
    }

    pub fn run_config(&self) -> RunConfig {
        RunConfig::new(self.delay_secs, self.loop_repetitions, self.total_repetitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let s: Settings = serde_json::from_str(r#"{ "loop_repetitions": 7 }"#).unwrap();
        let cfg = s.run_config();
        assert_eq!(cfg.loop_repetitions, 7);
        assert_eq!(cfg.total_repetitions, 1);
        assert_eq!(cfg.delay_secs, 1.0);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let s: Settings =
            serde_json::from_str(r#"{ "delay_secs": 0.01, "total_repetitions": 0 }"#).unwrap();
        let cfg = s.run_config();
        assert_eq!(cfg.delay_secs, 0.1);
        assert_eq!(cfg.total_repetitions, 1);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join(format!("clickloop-settings-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.json");

        std::fs::write(&path, "{ \"delay_secs\": ").unwrap();
        assert_eq!(Settings::load(&path).run_config(), RunConfig::default());

        std::fs::write(&path, r#"{ "delay_secs": 2.5 }"#).unwrap();
        assert_eq!(Settings::load(&path).run_config().delay_secs, 2.5);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_is_default() {
        let s = Settings::load(Path::new("/nonexistent/clickloop/settings.json"));
        assert_eq!(s.run_config(), RunConfig::default());
    }
}
