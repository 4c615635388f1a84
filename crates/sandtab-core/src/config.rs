//! Isolation engine configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use sandtab_privacy::DEFAULT_EXCLUDED_DOMAINS;

use crate::error::IsolationError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite file backing the session store; `None` keeps it in memory
    pub database_path: Option<PathBuf>,
    /// Domains never isolated (matched with their subdomains)
    pub excluded_domains: Vec<String>,
    /// Priority of projected header rules
    pub rule_priority: u32,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: Some(data_dir.join("sandtab.db")),
            ..Self::in_memory()
        }
    }

    pub fn in_memory() -> Self {
        Self {
            database_path: None,
            excluded_domains: DEFAULT_EXCLUDED_DOMAINS
                .iter()
                .map(|d| d.to_string())
                .collect(),
            rule_priority: 1,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;

        tracing::info!(
            path = %path.display(),
            excluded_domains = config.excluded_domains.len(),
            "Loaded configuration"
        );

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // The host rule engine rejects priorities below 1
        if self.rule_priority == 0 {
            return Err(IsolationError::Config(
                "rule_priority must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("Sandtab"))
            .unwrap_or_else(|| PathBuf::from(".sandtab"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}
