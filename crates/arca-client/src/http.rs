//! Shared HTTP handle.
//!
//! One [`HttpHandle`] wraps one `reqwest::Client` behind an async mutex.
//! Every request acquires the handle for exactly the duration of the send
//! (retries included), so a client shared by several pipeline stages issues
//! one request at a time over its connection.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tokio::sync::Mutex;

use crate::config::ConfigError;
use crate::error::ClientError;
use crate::retry::{retry_send, RetryPolicy};

#[derive(Debug, Clone)]
pub struct HttpHandle {
    client: Arc<Mutex<reqwest::Client>>,
    retry: RetryPolicy,
}

impl HttpHandle {
    /// Build a handle whose requests carry `token` as a bearer credential.
    pub fn new(timeout: Duration, token: Option<&str>) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                ClientError::Config(ConfigError::MissingToken(
                    "a token valid in an HTTP header".to_string(),
                ))
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            client: Arc::new(Mutex::new(client)),
            retry: RetryPolicy::default(),
        })
    }

    /// Replace the retry policy used by idempotent sends.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Send an idempotent request, retrying transport failures.
    pub(crate) async fn send<F>(
        &self,
        endpoint: &str,
        build: F,
    ) -> Result<reqwest::Response, ClientError>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let client = self.client.lock().await;
        retry_send(&self.retry, endpoint, || build(&client).send())
            .await
            .map_err(|source| ClientError::Http {
                endpoint: endpoint.to_string(),
                source,
            })
    }

    /// Send a request exactly once. For bodies that cannot be replayed.
    pub(crate) async fn send_once<F>(
        &self,
        endpoint: &str,
        build: F,
    ) -> Result<reqwest::Response, ClientError>
    where
        F: FnOnce(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let client = self.client.lock().await;
        build(&client)
            .send()
            .await
            .map_err(|source| ClientError::Http {
                endpoint: endpoint.to_string(),
                source,
            })
    }
}

/// `base` with `segments` appended to its path.
pub(crate) fn join(base: &url::Url, segments: &[&str]) -> url::Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}
