use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::calendar::{DateRange, Event};
use crate::digest::input::{InputError, read_date_range};
use crate::output::summary;
use crate::storage::config::{Config, ConfigError};
use crate::storage::credential_store::{CredentialStore, FileCredentialStore};
use crate::sync::google_api::{ApiError, CalendarApi, GoogleCalendarClient};
use crate::sync::google_auth::{AuthError, Authenticator, AuthorizationFlow, OAuthClient};
use crate::sync::loopback_flow::LoopbackFlow;

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Input(#[from] InputError),
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
    #[error("Failed to fetch events: {0}")]
    Fetch(#[from] ApiError),
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Written { count: usize, path: PathBuf },
    NoEvents,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Written { count, path } => {
                write!(f, "Wrote {} events to {}", count, path.display())
            }
            RunOutcome::NoEvents => f.write_str("No events found."),
        }
    }
}

/// Drives one run: read range, authenticate, fetch, write.
pub struct DigestEngine<S, F> {
    config: Config,
    auth: Authenticator<S, F>,
}

impl DigestEngine<FileCredentialStore, LoopbackFlow> {
    pub fn new(config: Config) -> Result<Self, DigestError> {
        let secret = config.client_secret()?;
        let oauth = OAuthClient::new(secret, config.google.scopes.clone());
        let store = FileCredentialStore::new(config.google.token_cache.clone());
        let flow = if config.google.open_browser {
            LoopbackFlow::new()
        } else {
            LoopbackFlow::new().without_browser()
        };
        let auth = Authenticator::new(store, oauth, flow);

        Ok(Self::with_authenticator(config, auth))
    }
}

impl<S, F> DigestEngine<S, F>
where
    S: CredentialStore,
    F: AuthorizationFlow,
{
    pub fn with_authenticator(config: Config, auth: Authenticator<S, F>) -> Self {
        Self { config, auth }
    }

    pub async fn fetch_events(&self, date_range: &DateRange) -> Result<Vec<Event>, DigestError> {
        let credential = self.auth.get_valid_credential().await?;

        let client = GoogleCalendarClient::new(credential.access_token)
            .with_base_url(self.config.calendar.base_url.clone())
            .with_max_results(self.config.calendar.max_results);

        let events = client
            .fetch_events(&self.config.calendar.id, date_range)
            .await
            .inspect_err(|e| tracing::error!("Event fetch failed: {}", e))?;

        Ok(events)
    }

    pub async fn run(&self) -> Result<RunOutcome, DigestError> {
        let date_range = read_date_range(&self.config.files.input)?;
        let events = self.fetch_events(&date_range).await?;

        if events.is_empty() {
            tracing::info!("No events between {} and {}", date_range.start, date_range.end);
            return Ok(RunOutcome::NoEvents);
        }

        let path = self.config.files.output.clone();
        summary::write_to_file(&path, &events).map_err(|source| DigestError::Write {
            path: path.clone(),
            source,
        })?;

        Ok(RunOutcome::Written {
            count: events.len(),
            path,
        })
    }
}
