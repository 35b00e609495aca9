use std::{fmt, time::Duration};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{
    client_credentials::{ClientCredentials, Credentials, DEFAULT_TOLERANCE_MS},
    Authorization, ExpiringToken, TokenProvider,
};
use crate::clock::{duration_millis, Clock, SystemClock};

/// Caches the token of an inner provider until shortly before it expires.
///
/// The cache lock is held for the whole refresh, so concurrent callers that
/// find the cache stale wait for a single in-flight refresh instead of each
/// starting their own.
pub struct TokenManager<Provider, C = SystemClock>
where
    Provider: TokenProvider,
{
    provider: Provider,
    clock: C,
    tolerance: Duration,
    cached_token: Mutex<Option<Record>>,
}

#[derive(Debug, thiserror::Error)]
pub enum Error<RenewalError> {
    #[error("token provider: {0}")]
    Provider(#[source] RenewalError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub access_token: String,
    /// Wall-clock milliseconds after which the token is no longer served.
    pub refresh_at: u64,
}

impl Record {
    pub fn from_expiring_token<T: ExpiringToken>(token: T, now: u64, tolerance: Duration) -> Self {
        let lifetime = duration_millis(token.expires_in());
        let tolerance = duration_millis(tolerance);
        Self {
            access_token: token.access_token().to_owned(),
            refresh_at: now.saturating_add(lifetime).saturating_sub(tolerance),
        }
    }

    pub fn is_fresh(&self, now: u64) -> bool {
        now < self.refresh_at
    }
}

impl super::Token for Record {
    fn access_token(&self) -> &str {
        &self.access_token
    }
}

impl TokenManager<ClientCredentials> {
    /// Cached client credentials provider for a stack, refreshing
    /// `credentials.tolerance()` ahead of expiry.
    pub fn for_stack(client: reqwest::Client, credentials: Credentials) -> Self {
        let tolerance = credentials.tolerance();
        Self::new(ClientCredentials::new(client, credentials)).with_tolerance(tolerance)
    }
}

impl<Provider> TokenManager<Provider>
where
    Provider: TokenProvider,
    <Provider as TokenProvider>::Token: ExpiringToken,
    <Provider as TokenProvider>::Error: fmt::Display,
{
    pub fn new(provider: Provider) -> Self {
        Self::with_clock(provider, SystemClock)
    }
}

impl<Provider, C> TokenManager<Provider, C>
where
    Provider: TokenProvider,
    <Provider as TokenProvider>::Token: ExpiringToken,
    <Provider as TokenProvider>::Error: fmt::Display,
    C: Clock,
{
    pub fn with_clock(provider: Provider, clock: C) -> Self {
        let cached_token = Mutex::const_new(None);
        Self {
            provider,
            clock,
            tolerance: Duration::from_millis(DEFAULT_TOLERANCE_MS),
            cached_token,
        }
    }

    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    async fn fetch_new_token(&self) -> Result<Record, Error<Provider::Error>> {
        let token = self
            .provider
            .get_auth_token()
            .await
            .map_err(Error::Provider)?;
        let record = Record::from_expiring_token(token, self.clock.now_millis(), self.tolerance);
        Ok(record)
    }

    pub async fn get_token(&self) -> Result<Record, Error<Provider::Error>> {
        let mut cached_token = self.cached_token.lock().await;

        if let Some(cached_token) = &*cached_token {
            if cached_token.is_fresh(self.clock.now_millis()) {
                debug!(
                    message = "Using preexisting token",
                    token_refresh_at = cached_token.refresh_at,
                );
                return Ok(cached_token.clone());
            }
            debug!(
                message = "Existing token is due for refresh",
                token_refresh_at = cached_token.refresh_at,
            );
        }

        info!(
            message = "No active token found, about to get a new one",
            token_is_stale = cached_token.is_some(),
        );

        let new_record = match self.fetch_new_token().await {
            Ok(record) => record,
            Err(err) => {
                warn!(message = "Failed to get a new token", error = %err);
                return Err(err);
            }
        };
        cached_token.replace(new_record.clone());

        debug!(
            message = "Got new token",
            token_refresh_at = new_record.refresh_at,
        );

        Ok(new_record)
    }

    /// Value for the `Authorization` header, refreshing the token if needed.
    pub async fn get_authorization(&self) -> Result<Authorization, Error<Provider::Error>> {
        let record = self.get_token().await?;
        Ok(super::Token::authorization(&record))
    }

    /// Forget the cached token so the next call fetches a new one.
    pub async fn invalidate(&self) {
        let mut cached_token = self.cached_token.lock().await;
        if cached_token.take().is_some() {
            debug!(message = "Cached token invalidated");
        }
    }
}

#[async_trait::async_trait]
impl<Provider, C> super::TokenProvider for TokenManager<Provider, C>
where
    Provider: TokenProvider,
    <Provider as TokenProvider>::Token: ExpiringToken,
    <Provider as TokenProvider>::Error: fmt::Display,
    C: Clock,
{
    type Token = Record;
    type Error = Error<Provider::Error>;

    async fn get_auth_token(&self) -> Result<Self::Token, Self::Error> {
        let token = self.get_token().await?;
        Ok(token)
    }
}
