//! Outbound JSON helpers.
//!
//! Thin wrappers over reqwest that decode JSON replies and annotate every
//! failure with the caller's provenance, so client-side errors carry the
//! same tokens handler errors do. Attribution is kept one hop up: the
//! record should point at the code that made the call, not at this module.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::provenance::{annotate_skip, Annotated};

/// Status and decoded body of an upstream reply.
#[derive(Debug)]
pub struct Reply<T> {
    pub status: StatusCode,
    pub body: T,
}

fn base_builder(config: &ClientConfig) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
}

/// Build a pooled client from config.
pub fn new_client(config: &ClientConfig) -> Result<reqwest::Client, Annotated> {
    match base_builder(config).build() {
        Ok(client) => Ok(client),
        Err(err) => Err(annotate_skip(err, 1)),
    }
}

/// Build a client that sends `Authorization: Bearer <token>` on every
/// request.
pub fn new_client_with_bearer(
    config: &ClientConfig,
    token: &str,
) -> Result<reqwest::Client, Annotated> {
    let mut value = match HeaderValue::from_str(&format!("Bearer {token}")) {
        Ok(value) => value,
        Err(err) => return Err(annotate_skip(err, 1)),
    };
    value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value);

    match base_builder(config).default_headers(headers).build() {
        Ok(client) => Ok(client),
        Err(err) => Err(annotate_skip(err, 1)),
    }
}

/// GET `url` and decode the JSON reply.
pub async fn get_json<T>(client: &reqwest::Client, url: &str) -> Result<Reply<T>, Annotated>
where
    T: DeserializeOwned,
{
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(err) => return Err(annotate_skip(err, 1)),
    };
    let status = response.status();
    match response.json().await {
        Ok(body) => Ok(Reply { status, body }),
        Err(err) => Err(annotate_skip(err, 1)),
    }
}

/// POST `payload` as JSON to `url` and decode the JSON reply.
pub async fn post_json<B, T>(
    client: &reqwest::Client,
    url: &str,
    payload: &B,
) -> Result<Reply<T>, Annotated>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let response = match client.post(url).json(payload).send().await {
        Ok(response) => response,
        Err(err) => return Err(annotate_skip(err, 1)),
    };
    let status = response.status();
    match response.json().await {
        Ok(body) => Ok(Reply { status, body }),
        Err(err) => Err(annotate_skip(err, 1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provenance::{decode, Decoded};

    #[test]
    fn test_new_client_applies_config() {
        let config = ClientConfig {
            timeout_secs: 1,
            pool_max_idle_per_host: 2,
        };
        assert!(new_client(&config).is_ok());
        assert!(new_client_with_bearer(&config, "tok-123").is_ok());
    }

    #[test]
    fn test_bearer_token_must_be_a_valid_header() {
        let err = new_client_with_bearer(&ClientConfig::default(), "bad\ntoken").unwrap_err();
        assert!(!decode(err.as_str()).text().is_empty());
    }

    #[tokio::test]
    async fn test_get_json_annotates_invalid_urls() {
        let client = new_client(&ClientConfig::default()).unwrap();
        let err = get_json::<serde_json::Value>(&client, "not a url")
            .await
            .unwrap_err();

        let decoded = decode(err.as_str());
        assert!(decoded.text().contains("builder error"), "got {decoded:?}");
        // Attribution lands on the awaiting test when frames resolve.
        if let Decoded::Located { file, .. } = &decoded {
            assert_eq!(file, "client.rs");
        }
    }

    #[tokio::test]
    async fn test_get_json_annotates_connection_failures() {
        let config = ClientConfig {
            timeout_secs: 2,
            pool_max_idle_per_host: 1,
        };
        let client = new_client(&config).unwrap();
        // Nothing listens on the discard port.
        let err = get_json::<serde_json::Value>(&client, "http://127.0.0.1:9/livez")
            .await
            .unwrap_err();

        let decoded = decode(err.as_str());
        assert!(
            decoded.text().contains("error sending request"),
            "got {decoded:?}"
        );
    }
}
