use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::activity::ACTIVITY_LIMIT;
use crate::ids::IdScheme;
use crate::report::MAX_HIRES_WINDOW_MONTHS;
use crate::view::DEFAULT_PAGE_SIZE;

pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub page_size: usize,
    pub activity_limit: usize,
    pub id_scheme: IdScheme,
    /// How long a notification banner stays up.
    pub notice_ms: u64,
    pub hires_window_months: u32,
    pub recent_hires: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            activity_limit: ACTIVITY_LIMIT,
            id_scheme: IdScheme::default(),
            notice_ms: 3_000,
            hires_window_months: 12,
            recent_hires: 5,
        }
    }
}

impl Config {
    /// Reads `path`; a missing or unreadable file yields the defaults.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        let parsed = fs::read_to_string(path)
            .map_err(|err| err.to_string())
            .and_then(|text| serde_json::from_str::<Config>(&text).map_err(|err| err.to_string()));
        match parsed {
            Ok(config) => config.normalized(),
            Err(error) => {
                warn!(path = %path.display(), %error, "ignoring unreadable config");
                Self::default()
            }
        }
    }

    pub fn load_from_dir(root: &Path) -> Self {
        Self::load(root.join(CONFIG_FILE).as_path())
    }

    pub fn normalized(mut self) -> Self {
        self.page_size = self.page_size.max(1);
        self.activity_limit = self.activity_limit.max(1);
        self.hires_window_months = self
            .hires_window_months
            .clamp(1, MAX_HIRES_WINDOW_MONTHS);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from_dir(dir.path());
        assert_eq!(config, Config::default());
        assert_eq!(config.page_size, 5);
        assert_eq!(config.activity_limit, 100);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{ "pageSize": 0, "idScheme": { "kind": "timestamp" } }"#,
        )
        .unwrap();
        let config = Config::load_from_dir(dir.path());
        assert_eq!(config.page_size, 1);
        assert_eq!(config.id_scheme, IdScheme::Timestamp);
        assert_eq!(config.notice_ms, 3_000);
    }

    #[test]
    fn oversized_hires_window_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{ "hiresWindowMonths": 4000000000 }"#,
        )
        .unwrap();
        let config = Config::load_from_dir(dir.path());
        assert_eq!(config.hires_window_months, MAX_HIRES_WINDOW_MONTHS);
    }

    #[test]
    fn garbage_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "page size five").unwrap();
        assert_eq!(Config::load_from_dir(dir.path()), Config::default());
    }
}
