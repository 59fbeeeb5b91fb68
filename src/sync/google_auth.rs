use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::config::ClientSecret;
use crate::storage::credential_store::{CredentialStore, StoreError};

/// Tokens expiring within this window are treated as already expired.
const EXPIRY_SKEW_SECONDS: i64 = 60;
const DEFAULT_EXPIRES_IN: i64 = 3600;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("OAuth error: {0}")]
    OAuthError(String),
    #[error("No refresh token available")]
    NoRefreshToken,
    #[error("Authorization listener failed: {0}")]
    ListenerError(#[from] std::io::Error),
    #[error("Invalid authorization callback: {0}")]
    CallbackError(String),
    #[error("Authorization was denied: {0}")]
    AccessDenied(String),
    #[error("Authorization state did not match the request")]
    StateMismatch,
    #[error("Failed to persist credential: {0}")]
    StoreError(#[from] StoreError),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub token_type: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl Credential {
    pub fn new(access_token: String, expires_in_seconds: i64) -> Self {
        Self {
            access_token,
            refresh_token: None,
            expires_at: Utc::now() + chrono::Duration::seconds(expires_in_seconds),
            token_type: "Bearer".to_string(),
            scopes: Vec::new(),
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: String) -> Self {
        self.refresh_token = Some(refresh_token);
        self
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.access_token.is_empty()
            && self.expires_at > now + chrono::Duration::seconds(EXPIRY_SKEW_SECONDS)
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    fn from_response(response: TokenResponse, previous_refresh: Option<String>) -> Self {
        let scopes = response
            .scope
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(previous_refresh),
            expires_at: Utc::now()
                + chrono::Duration::seconds(response.expires_in.unwrap_or(DEFAULT_EXPIRES_IN)),
            token_type: response.token_type.unwrap_or_else(|| "Bearer".to_string()),
            scopes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    NoCredential,
    ExpiredRefreshable,
    ExpiredUnrefreshable,
    Valid,
}

impl CredentialState {
    pub fn of(credential: Option<&Credential>) -> Self {
        match credential {
            None => CredentialState::NoCredential,
            Some(c) if c.is_valid() => CredentialState::Valid,
            Some(c) if c.can_refresh() => CredentialState::ExpiredRefreshable,
            Some(_) => CredentialState::ExpiredUnrefreshable,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
    token_type: Option<String>,
    scope: Option<String>,
}

/// Talks to the OAuth2 token endpoint for one registered client.
pub struct OAuthClient {
    secret: ClientSecret,
    scopes: Vec<String>,
    client: reqwest::Client,
}

impl OAuthClient {
    pub fn new(secret: ClientSecret, scopes: Vec<String>) -> Self {
        Self {
            secret,
            scopes,
            client: reqwest::Client::new(),
        }
    }

    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> String {
        let scope = self.scopes.join(" ");

        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent&state={}",
            self.secret.auth_uri(),
            urlencoding::encode(&self.secret.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scope),
            urlencoding::encode(state)
        )
    }

    pub async fn refresh(&self, credential: &Credential) -> Result<Credential, AuthError> {
        let refresh_token = credential
            .refresh_token
            .as_ref()
            .ok_or(AuthError::NoRefreshToken)?;

        let params = [
            ("client_id", self.secret.client_id.as_str()),
            ("client_secret", self.secret.client_secret.as_str()),
            ("refresh_token", refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let token_response = self.request_token(&params).await?;
        let mut refreshed = Credential::from_response(token_response, Some(refresh_token.clone()));
        if refreshed.scopes.is_empty() {
            refreshed.scopes = credential.scopes.clone();
        }

        Ok(refreshed)
    }

    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<Credential, AuthError> {
        let params = [
            ("client_id", self.secret.client_id.as_str()),
            ("client_secret", self.secret.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ];

        let token_response = self.request_token(&params).await?;
        let mut credential = Credential::from_response(token_response, None);
        if credential.scopes.is_empty() {
            credential.scopes = self.scopes.clone();
        }

        Ok(credential)
    }

    async fn request_token(&self, params: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        let response = self
            .client
            .post(self.secret.token_uri())
            .form(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!("Token endpoint returned {}: {}", status, error_text);
            return Err(AuthError::OAuthError(format!("Status {}: {}", status, error_text)));
        }

        Ok(response.json().await?)
    }
}

/// Obtains a brand new credential with user interaction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthorizationFlow {
    async fn authorize(&self, oauth: &OAuthClient) -> Result<Credential, AuthError>;
}

pub struct Authenticator<S, F> {
    store: S,
    oauth: OAuthClient,
    flow: F,
}

impl<S, F> Authenticator<S, F>
where
    S: CredentialStore,
    F: AuthorizationFlow,
{
    pub fn new(store: S, oauth: OAuthClient, flow: F) -> Self {
        Self { store, oauth, flow }
    }

    /// Returns a credential that is valid right now, persisting it if it changed.
    pub async fn get_valid_credential(&self) -> Result<Credential, AuthError> {
        let stored = self.store.load();
        let state = CredentialState::of(stored.as_ref());
        tracing::info!("Stored credential state: {:?}", state);

        let credential = match (state, stored) {
            (CredentialState::Valid, Some(credential)) => return Ok(credential),
            (CredentialState::ExpiredRefreshable, Some(credential)) => {
                match self.oauth.refresh(&credential).await {
                    Ok(refreshed) => {
                        tracing::info!("Refreshed access token");
                        refreshed
                    }
                    Err(e) => {
                        tracing::warn!("Token refresh failed, falling back to authorization: {}", e);
                        self.authorize_interactively().await?
                    }
                }
            }
            _ => self.authorize_interactively().await?,
        };

        self.store.save(&credential)?;
        Ok(credential)
    }

    async fn authorize_interactively(&self) -> Result<Credential, AuthError> {
        tracing::info!("Starting interactive authorization");
        let credential = self.flow.authorize(&self.oauth).await?;
        tracing::info!("Interactive authorization completed");
        Ok(credential)
    }
}
