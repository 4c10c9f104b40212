//! Client error types.

use std::error::Error as StdError;

use arca_engine::RemoteError;

/// Errors from remote API calls.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The remote returned a non-2xx status.
    #[error("{endpoint} returned {status}: {body}")]
    ApiError {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The response decoded but did not make sense.
    #[error("unexpected response from {endpoint}: {message}")]
    Protocol { endpoint: String, message: String },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Render an error with its full source chain.
fn chain(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl From<ClientError> for RemoteError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::Http { endpoint, source } => RemoteError::Transport {
                endpoint,
                message: chain(&source),
            },
            ClientError::ApiError {
                endpoint,
                status,
                body,
            } => RemoteError::Status {
                endpoint,
                status,
                body,
            },
            ClientError::Deserialization { endpoint, source } => RemoteError::Protocol {
                endpoint,
                message: chain(&source),
            },
            ClientError::Protocol { endpoint, message } => {
                RemoteError::Protocol { endpoint, message }
            }
            ClientError::Config(e) => RemoteError::Protocol {
                endpoint: "configuration".to_string(),
                message: e.to_string(),
            },
        }
    }
}

/// Turn a non-2xx response into [`ClientError::ApiError`].
pub(crate) async fn check_status(
    endpoint: &str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, ClientError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(ClientError::ApiError {
        endpoint: endpoint.to_string(),
        status,
        body,
    })
}
