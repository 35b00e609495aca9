#[derive(Debug, thiserror::Error)]
#[error("{status_code} status code from {url}")]
pub struct ServerError {
    pub status_code: u16,
    pub url: String,
}

pub fn check_status(res: &reqwest::Response) -> Result<(), ServerError> {
    let status = res.status();
    if !status.is_success() {
        return Err(ServerError {
            status_code: status.as_u16(),
            url: res.url().to_string(),
        });
    }
    Ok(())
}
