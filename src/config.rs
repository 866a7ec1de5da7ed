use crate::error::CompilerError;
use crate::similarity::DEFAULT_THRESHOLD;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const CONFIG_ENV: &str = "LUAPARSE_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub similarity_threshold: f64,
    pub lua_comments: bool,
    pub format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            similarity_threshold: DEFAULT_THRESHOLD,
            lua_comments: false,
            format: OutputFormat::Text,
        }
    }
}

impl Config {
    /// Loads the config file. An explicitly requested file must exist; the
    /// default location is optional and falls back to built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, CompilerError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => Self::get_config_path(),
        };

        if !path.exists() {
            if explicit.is_some() {
                return Err(CompilerError::FileNotFound(path));
            }
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }

        debug!(path = %path.display(), "loading config");
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self, CompilerError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CompilerError> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(CompilerError::Config(format!(
                "similarity_threshold must be between 0 and 1, got {}",
                self.similarity_threshold
            )));
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), CompilerError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn get_config_path() -> PathBuf {
        if let Ok(custom) = env::var(CONFIG_ENV) {
            return PathBuf::from(custom);
        }

        let home = if cfg!(windows) {
            env::var("USERPROFILE")
        } else {
            env::var("HOME")
        };

        let home = home.unwrap_or_else(|_| {
            warn!("home directory not set, looking for config in the working directory");
            String::from(".")
        });

        PathBuf::from(home)
            .join(".luaparse")
            .join("config.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            similarity_threshold: 0.8,
            lua_comments: true,
            format: OutputFormat::Json,
        };
        config.save(&path).unwrap();

        assert_eq!(Config::load(Some(&path)).unwrap(), config);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "lua_comments": true }"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert!(config.lua_comments);
        assert_eq!(config.similarity_threshold, DEFAULT_THRESHOLD);
        assert_eq!(config.format, OutputFormat::Text);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(matches!(
            Config::load(Some(&path)),
            Err(CompilerError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "similarity_threshold": 1.5 }"#).unwrap();
        assert!(matches!(Config::from_file(&path), Err(CompilerError::Config(_))));
    }

    #[test]
    fn test_malformed_file_is_a_json_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Config::from_file(&path), Err(CompilerError::Json(_))));
    }
}
