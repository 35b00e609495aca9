//! Authorization logic.

use std::time::Duration;

use serde::Serialize;

pub mod client_credentials;
pub mod discovery;
pub mod token_manager;

#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    type Token: Token;
    type Error: Send + Sync;

    async fn get_auth_token(&self) -> Result<Self::Token, Self::Error>;
}

pub trait Token: Send {
    fn access_token(&self) -> &str;

    fn authorization(&self) -> Authorization {
        Authorization::bearer(self.access_token())
    }
}

pub trait ExpiringToken: Token {
    /// Lifetime stated by the issuer, counted from the moment it was issued.
    fn expires_in(&self) -> Duration;
}

/// Value for the `Authorization` header of a stack API request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Authorization {
    pub authorization: String,
}

impl Authorization {
    pub fn bearer(access_token: &str) -> Self {
        Self {
            authorization: format!("Bearer {}", access_token),
        }
    }

    pub fn header_value(&self) -> &str {
        &self.authorization
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_authorization_serializes_as_object() {
        let authorization = Authorization::bearer("tok123");
        assert_eq!(authorization.header_value(), "Bearer tok123");
        assert_eq!(
            serde_json::to_value(&authorization).unwrap(),
            serde_json::json!({ "authorization": "Bearer tok123" })
        );
    }
}
