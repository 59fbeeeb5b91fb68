use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const READONLY_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("Failed to parse client secret file {path}: {source}")]
    ClientSecretError {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("No OAuth client configured: set google.client_id or provide {0}")]
    MissingClient(PathBuf),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub google: GoogleConfig,
    pub calendar: CalendarConfig,
    pub files: FilesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub client_secret_file: PathBuf,
    pub token_cache: PathBuf,
    pub auth_uri: String,
    pub token_uri: String,
    pub scopes: Vec<String>,
    pub open_browser: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CalendarConfig {
    pub id: String,
    pub base_url: String,
    pub max_results: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilesConfig {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// OAuth client registration resolved from the config or a `client_secret.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub auth_uri: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }

    pub fn load_or_create_at(config_path: &Path) -> Result<Self, ConfigError> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            Self::from_toml(&content)
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            tracing::info!("Wrote default config to {}", config_path.display());
            Ok(config)
        }
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gcal-digest")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn save_to(&self, config_path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;

        Ok(())
    }

    /// Inline `client_id` wins; otherwise the Google client secret file is read.
    pub fn client_secret(&self) -> Result<ClientSecret, ConfigError> {
        let google = &self.google;
        let mut secret = if !google.client_id.is_empty() {
            ClientSecret {
                client_id: google.client_id.clone(),
                client_secret: google.client_secret.clone(),
                auth_uri: None,
                token_uri: None,
            }
        } else if google.client_secret_file.exists() {
            read_client_secret_file(&google.client_secret_file)?
        } else {
            return Err(ConfigError::MissingClient(google.client_secret_file.clone()));
        };

        secret.auth_uri.get_or_insert_with(|| google.auth_uri.clone());
        secret.token_uri.get_or_insert_with(|| google.token_uri.clone());
        Ok(secret)
    }
}

fn read_client_secret_file(path: &Path) -> Result<ClientSecret, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let parsed: ClientSecretFile =
        serde_json::from_str(&content).map_err(|source| ConfigError::ClientSecretError {
            path: path.to_path_buf(),
            source,
        })?;

    parsed
        .installed
        .or(parsed.web)
        .ok_or_else(|| ConfigError::MissingClient(path.to_path_buf()))
}

impl ClientSecret {
    pub fn auth_uri(&self) -> &str {
        self.auth_uri.as_deref().unwrap_or_default()
    }

    pub fn token_uri(&self) -> &str {
        self.token_uri.as_deref().unwrap_or_default()
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            client_secret_file: PathBuf::from("client_secret.json"),
            token_cache: Config::config_dir().join("token.json"),
            auth_uri: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
            scopes: vec![READONLY_SCOPE.to_string()],
            open_browser: true,
        }
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            id: "primary".to_string(),
            base_url: "https://www.googleapis.com/calendar/v3".to_string(),
            max_results: 1000,
        }
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("input.txt"),
            output: PathBuf::from("output.txt"),
        }
    }
}
