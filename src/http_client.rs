use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde_json::Value;

const REQUEST_TIMEOUT_SECS: u64 = 25;
const USER_AGENT: &str = concat!("cfb_rankings/", env!("CARGO_PKG_VERSION"));

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Shared client for the CollegeFootballData API. Every response is JSON.
pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .context("failed to build http client")
    })
}

/// Authorized GET decoded as JSON. Non-2xx statuses are errors.
pub fn get_json(url: &str, api_key: &str, params: &[(&str, String)]) -> Result<Value> {
    http_client()?
        .get(url)
        .bearer_auth(api_key)
        .query(params)
        .send()
        .and_then(|r| r.error_for_status())
        .and_then(|r| r.json::<Value>())
        .with_context(|| format!("GET {url}"))
}
