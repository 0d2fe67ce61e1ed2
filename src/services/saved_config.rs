// src/services/saved_config.rs
use log::info;
use regex::Regex;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::models::PortfolioConfig;

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("valid config name pattern"))
}

/// Named allocations saved as JSON files in one directory.
#[derive(Debug, Clone)]
pub struct SavedConfigStore {
    dir: PathBuf,
}

impl SavedConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        SavedConfigStore { dir: dir.into() }
    }

    fn path_for(&self, name: &str) -> AnalyticsResult<PathBuf> {
        if !name_pattern().is_match(name) {
            return Err(AnalyticsError::validation(format!(
                "config name '{}' must be 1-64 letters, digits, '_' or '-'",
                name
            )));
        }
        Ok(self.dir.join(format!("{}.json", name)))
    }

    pub fn save(&self, name: &str, config: &PortfolioConfig) -> AnalyticsResult<()> {
        config.validate()?;
        let path = self.path_for(name)?;
        let write_err = |e: &dyn std::fmt::Display| {
            AnalyticsError::StorageWrite(format!("{}: {}", path.display(), e))
        };
        fs::create_dir_all(&self.dir).map_err(|e| write_err(&e))?;
        let json = serde_json::to_string_pretty(config).map_err(|e| write_err(&e))?;
        fs::write(&path, json).map_err(|e| write_err(&e))?;
        info!("Portfolio configuration saved to {}", path.display());
        Ok(())
    }

    pub fn load(&self, name: &str) -> AnalyticsResult<PortfolioConfig> {
        let path = self.path_for(name)?;
        let read_err = |e: &dyn std::fmt::Display| {
            AnalyticsError::StorageRead(format!("{}: {}", path.display(), e))
        };
        let bytes = fs::read(&path).map_err(|e| read_err(&e))?;
        let config: PortfolioConfig = serde_json::from_slice(&bytes).map_err(|e| read_err(&e))?;
        config.validate()?;
        Ok(config)
    }
}
