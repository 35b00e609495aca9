//! Stack API client that authorizes every request.

use reqwest::{header::AUTHORIZATION, Method};
use serde::de::DeserializeOwned;

use crate::{
    auth::{self, Authorization, Token},
    utils::{check_status, ServerError},
};

pub struct Client<AuthTokenProvider> {
    pub client: reqwest::Client,
    pub endpoint_url: String,
    pub auth_token_provider: AuthTokenProvider,
}

#[derive(Debug, thiserror::Error)]
pub enum Error<AuthError> {
    #[error("auth: {0}")]
    Auth(#[source] AuthError),
    #[error("reqwest: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("server: {0}")]
    Server(#[from] ServerError),
}

impl<AuthTokenProvider> Client<AuthTokenProvider>
where
    AuthTokenProvider: auth::TokenProvider,
{
    pub fn new(
        client: reqwest::Client,
        endpoint_url: impl Into<String>,
        auth_token_provider: AuthTokenProvider,
    ) -> Self {
        Self {
            client,
            endpoint_url: endpoint_url.into(),
            auth_token_provider,
        }
    }

    fn build_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.endpoint_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn build_request(
        &self,
        authorization: &Authorization,
        method: Method,
        url: &str,
    ) -> Result<reqwest::Request, Error<AuthTokenProvider::Error>> {
        self.client
            .request(method, url)
            .header(AUTHORIZATION, authorization.header_value())
            .build()
            .map_err(Error::Reqwest)
    }

    async fn get_authorization(&self) -> Result<Authorization, Error<AuthTokenProvider::Error>> {
        let token = self
            .auth_token_provider
            .get_auth_token()
            .await
            .map_err(Error::Auth)?;
        Ok(token.authorization())
    }

    /// Send an authorized request with an empty body to `path` under the stack URL.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
    ) -> Result<reqwest::Response, Error<AuthTokenProvider::Error>> {
        let authorization = self.get_authorization().await?;
        let url = self.build_url(path);
        let request = self.build_request(&authorization, method, &url)?;
        self.exec(request).await
    }

    pub async fn get_json<T>(&self, path: &str) -> Result<T, Error<AuthTokenProvider::Error>>
    where
        T: DeserializeOwned,
    {
        let res = self.send(Method::GET, path).await?;
        res.json().await.map_err(Error::Reqwest)
    }

    async fn exec(
        &self,
        request: reqwest::Request,
    ) -> Result<reqwest::Response, Error<AuthTokenProvider::Error>> {
        let res = self.client.execute(request).await.map_err(Error::Reqwest)?;
        check_status(&res)?;
        Ok(res)
    }
}
