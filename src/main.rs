use std::time::Duration;

use anyhow::Context;
use formance_auth::{Credentials, StackTokenProvider};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let reqwest_client = reqwest::Client::builder()
        .build()
        .context("building http client")?;

    let endpoint_url = getenv("FORMANCE_ENDPOINT_URL")?;
    let client_id = getenv("FORMANCE_CLIENT_ID")?;
    let client_secret = getenv("FORMANCE_CLIENT_SECRET")?;

    let mut credentials = Credentials::new(endpoint_url, client_id, client_secret);
    if let Ok(tolerance_ms) = std::env::var("FORMANCE_TOLERANCE_MS") {
        let tolerance_ms: u64 = tolerance_ms
            .parse()
            .context("FORMANCE_TOLERANCE_MS must be a number of milliseconds")?;
        credentials = credentials.with_tolerance(Duration::from_millis(tolerance_ms));
    }

    info!(
        message = "Requesting stack token",
        endpoint_url = %credentials.endpoint_url,
        client_id = %credentials.client_id,
    );

    let provider = StackTokenProvider::for_stack(reqwest_client, credentials);
    let authorization = provider
        .get_authorization()
        .await
        .context("getting stack authorization")?;

    println!("Authorization: {}", authorization.header_value());
    Ok(())
}

fn getenv(key: &str) -> anyhow::Result<String> {
    std::env::var(key).with_context(|| format!("env var {} is not set", key))
}
