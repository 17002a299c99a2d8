use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error reading config: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON config: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("Failed to parse TOML config: {source}")]
    Toml {
        #[from]
        source: toml::de::Error,
    },

    #[error("Failed to serialize TOML config: {source}")]
    TomlSer {
        #[from]
        source: toml::ser::Error,
    },

    #[error("Cannot find config directory")]
    NoConfigDir,
}

/// Deck generator configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DeckgenConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub content_model: String,
    pub image_model: String,
    /// Input text beyond this many characters is not sent to the content model.
    pub max_input_chars: usize,
    pub image_timeout_secs: u64,
    pub output_dir: PathBuf,
    pub log_path: Option<PathBuf>,
}

impl Default for DeckgenConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            content_model: "gemini-3-flash-preview".to_string(),
            image_model: "gemini-2.5-flash-image".to_string(),
            max_input_chars: 4000,
            image_timeout_secs: 120,
            output_dir: PathBuf::from("decks"),
            log_path: None,
        }
    }
}

impl DeckgenConfig {
    const LOCAL_PATHS: [&'static str; 2] = [".deckgen/config.toml", ".deckgen/config.json"];

    /// User-level config file path.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join("deckgen");
        Ok(config_dir.join("config.json"))
    }

    /// Load configuration from file, choosing the format by extension.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        Self::parse(path, &contents)
    }

    /// Async variant of [`DeckgenConfig::load_from_file`].
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path).await?;
        Self::parse(path, &contents)
    }

    fn parse(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            Ok(toml::from_str(contents)?)
        } else {
            Ok(serde_json::from_str(contents)?)
        }
    }

    /// Load configuration with default fallback, then apply the environment.
    pub fn load_with_fallback() -> Self {
        let mut candidates: Vec<PathBuf> = Self::LOCAL_PATHS.iter().map(PathBuf::from).collect();
        if let Ok(user) = Self::config_path() {
            candidates.push(user);
        }

        let mut config = None;
        for path in &candidates {
            if !path.exists() {
                continue;
            }
            match Self::load_from_file(path) {
                Ok(loaded) => {
                    tracing::info!("Loaded configuration from {}", path.display());
                    config = Some(loaded);
                    break;
                }
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                }
            }
        }

        let mut config = config.unwrap_or_else(|| {
            tracing::info!("Using default configuration");
            Self::default()
        });
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Environment overrides. `lookup` is injected so tests need not touch the
    /// process environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("GEMINI_API_KEY").or_else(|| non_empty("API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(model) = non_empty("DECKGEN_MODEL") {
            self.content_model = model;
        }
        if let Some(model) = non_empty("DECKGEN_IMAGE_MODEL") {
            self.image_model = model;
        }
        if let Some(base) = non_empty("DECKGEN_API_BASE") {
            self.api_base = base;
        }
        if let Some(path) = non_empty("DECKGEN_LOG_PATH") {
            self.log_path = Some(PathBuf::from(path));
        }
    }

    pub fn image_timeout(&self) -> Duration {
        Duration::from_secs(self.image_timeout_secs.max(1))
    }

    /// Save configuration to file, choosing the format by extension.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::to_string_pretty(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }
}
