//! Authorize using the client credentials flow.
//!
//! Every call performs a full round trip: the discovery document is fetched
//! from the stack to find the token endpoint, then the client id and secret
//! are exchanged for an access token. Caching lives in
//! [`TokenManager`](super::token_manager::TokenManager).

use std::{fmt, time::Duration};

use serde::Deserialize;

use super::discovery::{self, DiscoveryDocument, DiscoveryError};
use crate::{
    clock::duration_millis,
    utils::{check_status, ServerError},
};

pub const DEFAULT_TOLERANCE_MS: u64 = 300_000;

#[derive(Debug, thiserror::Error)]
pub enum TokenFetchError {
    #[error("reqwest: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("server: {0}")]
    Server(#[from] ServerError),
    #[error("invalid token response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("encoding token request: {0}")]
    Encode(#[from] serde_urlencoded::ser::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("discovery: {0}")]
    Discovery(#[from] DiscoveryError),
    #[error("token fetch: {0}")]
    TokenFetch(#[from] TokenFetchError),
}

/// Stack credentials, fixed for the lifetime of a provider.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    /// Base URL of the stack, e.g. `https://x.sandbox.formance.cloud`.
    pub endpoint_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// How long before the stated expiry a token is refreshed.
    #[serde(default = "default_tolerance_ms")]
    pub tolerance_ms: u64,
}

fn default_tolerance_ms() -> u64 {
    DEFAULT_TOLERANCE_MS
}

impl Credentials {
    pub fn new(
        endpoint_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            tolerance_ms: DEFAULT_TOLERANCE_MS,
        }
    }

    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance_ms = duration_millis(tolerance);
        self
    }

    pub fn tolerance(&self) -> Duration {
        Duration::from_millis(self.tolerance_ms)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("endpoint_url", &self.endpoint_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("tolerance_ms", &self.tolerance_ms)
            .finish()
    }
}

pub struct ClientCredentials {
    pub client: reqwest::Client,
    pub credentials: Credentials,
}

impl ClientCredentials {
    pub fn new(client: reqwest::Client, credentials: Credentials) -> Self {
        Self {
            client,
            credentials,
        }
    }

    /// Look up the token endpoint of the stack.
    pub async fn discover(&self) -> Result<DiscoveryDocument, DiscoveryError> {
        discovery::fetch(&self.client, &self.credentials.endpoint_url).await
    }

    /// Exchange the client credentials for a token at `token_endpoint`.
    pub async fn perform(&self, token_endpoint: &str) -> Result<AuthResponse, TokenFetchError> {
        let params = &[
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ];
        let params = serde_urlencoded::to_string(params)?;

        let req = self
            .client
            .post(token_endpoint)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(params)
            .build()?;

        let res = self.client.execute(req).await?;
        check_status(&res)?;
        let body = res.text().await?;
        let auth_response = serde_json::from_str(&body)?;
        Ok(auth_response)
    }
}

#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    /// The access token presented as a bearer credential to the stack.
    access_token: String,
    /// The amount of time that an access token is valid (in seconds).
    /// Any JSON number is accepted.
    expires_in: f64,
    /// Usually `bearer`; the authorization value is always built as a bearer token.
    token_type: String,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: Duration,
}

impl From<AuthResponse> for Token {
    fn from(auth: AuthResponse) -> Self {
        let AuthResponse {
            access_token,
            expires_in,
            token_type,
        } = auth;
        Self {
            access_token,
            token_type,
            expires_in: lifetime_from_secs(expires_in),
        }
    }
}

/// Negative or NaN lifetimes count as already expired; huge ones saturate.
fn lifetime_from_secs(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

#[async_trait::async_trait]
impl super::TokenProvider for ClientCredentials {
    type Token = Token;
    type Error = Error;

    async fn get_auth_token(&self) -> Result<Self::Token, Self::Error> {
        let document = self.discover().await?;
        let auth_response = self.perform(&document.token_endpoint).await?;
        let token = auth_response.into();
        Ok(token)
    }
}

impl super::Token for Token {
    fn access_token(&self) -> &str {
        self.access_token.as_str()
    }
}

impl super::ExpiringToken for Token {
    fn expires_in(&self) -> Duration {
        self.expires_in
    }
}
