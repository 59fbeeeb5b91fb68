use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use url::Url;

use crate::sync::google_auth::{AuthError, AuthorizationFlow, Credential, OAuthClient};

const SUCCESS_PAGE: &str = "Authorization complete. You can close this window and return to the terminal.";
const FAILURE_PAGE: &str = "Authorization failed. Check the terminal for details.";

/// Authorization-code flow completed through a one-shot listener on 127.0.0.1.
pub struct LoopbackFlow {
    open_browser: bool,
}

impl LoopbackFlow {
    pub fn new() -> Self {
        Self { open_browser: true }
    }

    pub fn without_browser(mut self) -> Self {
        self.open_browser = false;
        self
    }
}

impl Default for LoopbackFlow {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthorizationFlow for LoopbackFlow {
    async fn authorize(&self, oauth: &OAuthClient) -> Result<Credential, AuthError> {
        let pending = PendingAuthorization::bind().await?;
        let auth_url = oauth.authorization_url(pending.redirect_uri(), pending.state());

        println!("\n=== Google Calendar Authorization ===\n");
        println!("Visit this URL in your browser to grant read-only calendar access:\n");
        println!("{}\n", auth_url);

        if self.open_browser
            && let Err(e) = webbrowser::open(&auth_url)
        {
            tracing::warn!("Could not open a browser: {}", e);
        }

        println!("Waiting for authorization callback on {} ...", pending.redirect_uri());
        let code = pending.wait_for_code().await?;

        oauth.exchange_code(&code, pending.redirect_uri()).await
    }
}

pub struct PendingAuthorization {
    listener: TcpListener,
    redirect_uri: String,
    state: String,
}

impl PendingAuthorization {
    pub async fn bind() -> Result<Self, AuthError> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        tracing::info!("Authorization listener bound on port {}", port);

        Ok(Self {
            listener,
            redirect_uri: format!("http://127.0.0.1:{}/", port),
            state: uuid::Uuid::new_v4().to_string(),
        })
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    /// Accepts the first connection and answers it before returning the code.
    pub async fn wait_for_code(&self) -> Result<String, AuthError> {
        let (stream, peer) = self.listener.accept().await?;
        tracing::debug!("Authorization callback from {}", peer);

        let mut reader = BufReader::new(stream);
        let mut request_line = String::new();
        reader.read_line(&mut request_line).await?;

        // Drain headers so closing the socket does not reset the browser.
        let mut header = String::new();
        while reader.read_line(&mut header).await? > 0 && !header.trim_end().is_empty() {
            header.clear();
        }

        let result = parse_callback(&request_line, &self.state);
        let body = if result.is_ok() { SUCCESS_PAGE } else { FAILURE_PAGE };
        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: text/plain; charset=utf-8\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        );

        let mut stream = reader.into_inner();
        stream.write_all(response.as_bytes()).await?;
        stream.shutdown().await.ok();

        result
    }
}

/// Extracts the authorization code from a raw `GET /?code=..&state=.. HTTP/1.1` line.
pub fn parse_callback(request_line: &str, expected_state: &str) -> Result<String, AuthError> {
    let target = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| AuthError::CallbackError(format!("malformed request line '{}'", request_line.trim())))?;

    let url = Url::parse("http://127.0.0.1")
        .and_then(|base| base.join(target))
        .map_err(|e| AuthError::CallbackError(e.to_string()))?;

    let param = |name: &str| {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };

    if let Some(error) = param("error") {
        return Err(AuthError::AccessDenied(error));
    }

    if param("state").as_deref() != Some(expected_state) {
        return Err(AuthError::StateMismatch);
    }

    param("code")
        .filter(|code| !code.is_empty())
        .ok_or_else(|| AuthError::CallbackError("missing 'code' parameter".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpStream;

    #[test]
    fn code_is_extracted_from_request_line() {
        let code = parse_callback("GET /?state=s1&code=4%2F0Ab&scope=x HTTP/1.1\r\n", "s1").unwrap();

        assert_eq!(code, "4/0Ab");
    }

    #[test]
    fn error_parameter_means_access_denied() {
        let result = parse_callback("GET /?error=access_denied&state=s1 HTTP/1.1", "s1");

        assert!(matches!(result, Err(AuthError::AccessDenied(e)) if e == "access_denied"));
    }

    #[test]
    fn mismatched_state_is_rejected() {
        let result = parse_callback("GET /?code=abc&state=other HTTP/1.1", "s1");

        assert!(matches!(result, Err(AuthError::StateMismatch)));
    }

    #[test]
    fn missing_code_is_rejected() {
        let result = parse_callback("GET /?state=s1 HTTP/1.1", "s1");

        assert!(matches!(result, Err(AuthError::CallbackError(_))));
    }

    #[test]
    fn garbage_request_line_is_rejected() {
        let result = parse_callback("", "s1");

        assert!(matches!(result, Err(AuthError::CallbackError(_))));
    }

    #[tokio::test]
    async fn listener_uses_ephemeral_loopback_port() {
        let pending = PendingAuthorization::bind().await.unwrap();

        assert!(pending.redirect_uri().starts_with("http://127.0.0.1:"));
        assert!(!pending.redirect_uri().ends_with(":0/"));
    }

    #[tokio::test]
    async fn callback_connection_yields_code_and_gets_a_response() {
        let pending = PendingAuthorization::bind().await.unwrap();
        let addr = pending.redirect_uri().trim_start_matches("http://").trim_end_matches('/').to_string();
        let request = format!(
            "GET /?code=granted&state={} HTTP/1.1\r\nHost: {}\r\n\r\n",
            pending.state(),
            addr
        );

        let browser = tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream.write_all(request.as_bytes()).await.unwrap();
            let mut response = String::new();
            stream.read_to_string(&mut response).await.unwrap();
            response
        });

        let code = pending.wait_for_code().await.unwrap();
        let response = browser.await.unwrap();

        assert_eq!(code, "granted");
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("Authorization complete"));
    }
}
