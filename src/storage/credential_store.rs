use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::sync::google_auth::Credential;

pub const STORE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to write credential file: {0}")]
    WriteError(#[from] std::io::Error),
    #[error("Failed to serialize credential: {0}")]
    SerializeError(#[from] serde_json::Error),
}

#[cfg_attr(test, mockall::automock)]
pub trait CredentialStore {
    /// An unreadable or unrecognised store reads as absent.
    fn load(&self) -> Option<Credential>;

    fn save(&self, credential: &Credential) -> Result<(), StoreError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredCredential {
    version: u32,
    credential: Credential,
}

pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Option<Credential> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No credential file at {}", self.path.display());
                return None;
            }
            Err(e) => {
                tracing::warn!("Failed to read credential file {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<StoredCredential>(&content) {
            Ok(stored) if stored.version == STORE_FORMAT_VERSION => Some(stored.credential),
            Ok(stored) => {
                tracing::warn!(
                    "Ignoring credential file with unsupported version {}",
                    stored.version
                );
                None
            }
            Err(e) => {
                tracing::warn!("Ignoring corrupt credential file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let stored = StoredCredential {
            version: STORE_FORMAT_VERSION,
            credential: credential.clone(),
        };
        let json = serde_json::to_string_pretty(&stored)?;
        write_private(&self.path, json.as_bytes())?;
        tracing::info!("Saved credential to {}", self.path.display());

        Ok(())
    }
}

fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    // The open mode only applies when the file is created.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents)?;
    file.flush()
}
