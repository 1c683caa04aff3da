//! # Configuration
//!
//! TOML configuration for the `lumenforge` binary.
//!
//! ```toml
//! [storage]
//! data_dir = "./data/characters"
//!
//! [catalog]
//! # Leave unset to use the catalogs embedded in the binary.
//! skills_file = "data/seeds/skills.json"
//! races_file = "data/seeds/races.json"
//!
//! [progression]
//! dev_mode = false
//!
//! [logging]
//! level = "info"
//! file = "lumenforge.log"
//! ```
//!
//! Sections other than `[storage]` and `[logging]` may be omitted.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::progression::{RaceCatalog, SkillCatalog};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub progression: ProgressionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the sled database of characters.
    pub data_dir: String,
}

/// Optional catalog overrides. Unset paths fall back to the embedded seeds.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub races_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProgressionConfig {
    /// Default for `unlock` when `--dev` is not given. Skips eligibility
    /// checks; funds are still required.
    #[serde(default)]
    pub dev_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

impl Config {
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir must not be empty"));
        }
        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(anyhow!(
                "logging.level '{}' is not one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            ));
        }
        Ok(())
    }

    /// Skill catalog from `catalog.skills_file`, or the embedded one.
    pub fn skill_catalog(&self) -> Result<SkillCatalog> {
        let catalog = match &self.catalog.skills_file {
            Some(path) => SkillCatalog::load_from_json(path)?,
            None => SkillCatalog::standard()?,
        };
        catalog.validate_references()?;
        Ok(catalog)
    }

    /// Race catalog from `catalog.races_file`, or the embedded one.
    pub fn race_catalog(&self) -> Result<RaceCatalog> {
        Ok(match &self.catalog.races_file {
            Some(path) => RaceCatalog::load_from_json(path)?,
            None => RaceCatalog::standard()?,
        })
    }

    pub fn log_level(&self) -> log::LevelFilter {
        self.logging
            .level
            .parse()
            .unwrap_or(log::LevelFilter::Info)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage: StorageConfig {
                data_dir: "./data/characters".to_string(),
            },
            catalog: CatalogConfig::default(),
            progression: ProgressionConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("lumenforge.log".to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(!config.progression.dev_mode);
        assert!(config.catalog.skills_file.is_none());
        assert_eq!(config.log_level(), log::LevelFilter::Info);
    }

    #[test]
    fn test_optional_sections_default() {
        let toml_text = r#"
            [storage]
            data_dir = "/tmp/chars"

            [logging]
            level = "debug"
        "#;
        let config: Config = toml::from_str(toml_text).unwrap();
        assert_eq!(config.storage.data_dir, "/tmp/chars");
        assert!(!config.progression.dev_mode);
        assert!(config.catalog.races_file.is_none());
        assert!(config.logging.file.is_none());
        assert_eq!(config.log_level(), log::LevelFilter::Debug);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.storage.data_dir = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_embedded_catalogs_load() {
        let config = Config::default();
        let skills = config.skill_catalog().unwrap();
        assert!(skills.contains("sword_basics"));
        let races = config.race_catalog().unwrap();
        assert!(races.get("elf").is_some());
    }

    #[test]
    fn test_serialized_default_round_trips() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.storage.data_dir, "./data/characters");
        assert_eq!(parsed.logging.file.as_deref(), Some("lumenforge.log"));
    }
}
