//! Lookup of the stack's OpenID discovery document.

use serde::Deserialize;

use crate::utils::{check_status, ServerError};

pub const WELL_KNOWN_PATH: &str = "/api/auth/.well-known/openid-configuration";

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("reqwest: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("server: {0}")]
    Server(#[from] ServerError),
    #[error("invalid discovery document: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DiscoveryDocument {
    /// URL of the authorization server's token endpoint.
    pub token_endpoint: String,
}

pub fn well_known_url(endpoint_url: &str) -> String {
    format!("{}{}", endpoint_url.trim_end_matches('/'), WELL_KNOWN_PATH)
}

/// Fetch the discovery document published under `endpoint_url`.
pub async fn fetch(
    client: &reqwest::Client,
    endpoint_url: &str,
) -> Result<DiscoveryDocument, DiscoveryError> {
    let url = well_known_url(endpoint_url);
    let res = client.get(url).send().await?;
    check_status(&res)?;
    let body = res.text().await?;
    let document = serde_json::from_str(&body)?;
    Ok(document)
}
