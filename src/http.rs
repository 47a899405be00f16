// Shared HTTP client utilities

use anyhow::{Context, Result};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// User-Agent string for all HTTP requests
const USER_AGENT: &str = concat!("mcstage/", env!("CARGO_PKG_VERSION"));

pub const API_TIMEOUT: Duration = Duration::from_secs(30);
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(5 * 60);

lazy_static::lazy_static! {
    /// Client for metadata and API calls
    static ref API_CLIENT: Client = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(API_TIMEOUT)
        .build()
        .expect("Failed to create HTTP client");

    /// Client for file transfers
    static ref DOWNLOAD_CLIENT: Client = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(DOWNLOAD_TIMEOUT)
        .build()
        .expect("Failed to create download client");
}

pub fn download_client() -> &'static Client {
    &DOWNLOAD_CLIENT
}

async fn get_checked(url: &str) -> Result<Response> {
    let response: Response = API_CLIENT
        .get(url)
        .send()
        .await
        .with_context(|| format!("Request failed: {}", url))?;

    if response.status() == StatusCode::NOT_FOUND {
        anyhow::bail!("Resource not found: {}", url);
    }

    if !response.status().is_success() {
        anyhow::bail!("HTTP request failed: {} ({})", url, response.status());
    }

    Ok(response)
}

/// Fetch JSON from a URL and deserialize it
pub async fn fetch_json<T: DeserializeOwned>(url: &str) -> Result<T> {
    let response = get_checked(url).await?;
    let result = response
        .json()
        .await
        .with_context(|| format!("Unexpected response body from {}", url))?;
    Ok(result)
}

/// Fetch a plain-text body, trimmed
pub async fn fetch_text(url: &str) -> Result<String> {
    let response = get_checked(url).await?;
    let body = response
        .text()
        .await
        .with_context(|| format!("Failed to read response from {}", url))?;
    Ok(body.trim().to_string())
}
