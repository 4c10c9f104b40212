//! Client configuration.
//!
//! Each remote gets its own config struct with a base URL, an optional
//! bearer token, and request timeouts. Custom `Debug` implementations redact
//! tokens so configs can be logged.

use std::fmt;

use url::Url;
use zeroize::Zeroizing;

/// Default IPFS node RPC address, as a multiaddr.
pub const DEFAULT_IPFS_API: &str = "/dns/localhost/tcp/5001/http";
/// Default archival service endpoint.
pub const DEFAULT_ARCHIVE_ENDPOINT: &str = "https://api.web3.storage";
/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Default timeout for a single archive upload.
pub const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 600;
/// Pins requested per listing page. Deliberately large; pagination at
/// pinning services is unreliable.
pub const DEFAULT_PIN_PAGE_SIZE: usize = 200;
/// Uploads requested per listing page.
pub const DEFAULT_ARCHIVE_PAGE_SIZE: usize = 25;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    MissingToken(String),
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("unsupported multiaddr {0:?}: expected /<dns|dns4|dns6|ip4|ip6>/<host>/tcp/<port>[/http|/https]")]
    InvalidMultiaddr(String),
}

/// Parse an HTTP endpoint, applying `default_scheme` when none is given.
pub fn parse_endpoint(name: &str, raw: &str, default_scheme: &str) -> Result<Url, ConfigError> {
    let raw = raw.trim();
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("{default_scheme}://{raw}")
    };
    let url = Url::parse(&with_scheme)
        .map_err(|e| ConfigError::InvalidUrl(name.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl(
            name.to_string(),
            "URL cannot be used as a base".to_string(),
        ));
    }
    Ok(url)
}

/// Parse an IPFS API address given either as a multiaddr
/// (`/dns/localhost/tcp/5001/http`) or as a URL.
pub fn parse_api_addr(raw: &str) -> Result<Url, ConfigError> {
    let raw = raw.trim();
    if !raw.starts_with('/') {
        return parse_endpoint("ipfs-api", raw, "http");
    }

    let invalid = || ConfigError::InvalidMultiaddr(raw.to_string());
    let parts: Vec<&str> = raw.split('/').skip(1).collect();
    let (proto, host, port, scheme) = match parts.as_slice() {
        [proto, host, "tcp", port] => (*proto, *host, *port, "http"),
        [proto, host, "tcp", port, scheme @ ("http" | "https")] => (*proto, *host, *port, *scheme),
        _ => return Err(invalid()),
    };
    let port: u16 = port.parse().map_err(|_| invalid())?;
    let host = match proto {
        "dns" | "dns4" | "dns6" | "ip4" => host.to_string(),
        "ip6" => format!("[{host}]"),
        _ => return Err(invalid()),
    };
    parse_endpoint("ipfs-api", &format!("{scheme}://{host}:{port}"), scheme)
}

fn env_or(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

fn env_secs(var: &str, default: u64) -> u64 {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_token(var: &str) -> Result<Zeroizing<String>, ConfigError> {
    std::env::var(var)
        .ok()
        .filter(|token| !token.is_empty())
        .map(Zeroizing::new)
        .ok_or_else(|| ConfigError::MissingToken(var.to_string()))
}

fn local_url(port: u16) -> Result<Url, ConfigError> {
    Url::parse(&format!("http://127.0.0.1:{port}"))
        .map_err(|e| ConfigError::InvalidUrl("localhost".to_string(), e.to_string()))
}

/// IPFS node RPC configuration.
#[derive(Debug, Clone)]
pub struct IpfsConfig {
    /// Base URL of the node's RPC API (without `/api/v0`).
    pub api_url: Url,
    pub timeout_secs: u64,
}

impl IpfsConfig {
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Variables: `ARCA_IPFS_API` (default [`DEFAULT_IPFS_API`]),
    /// `ARCA_TIMEOUT_SECS` (default 30).
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_api_addr(&env_or("ARCA_IPFS_API", DEFAULT_IPFS_API))?,
            timeout_secs: env_secs("ARCA_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Configuration pointing at a local mock server.
    pub fn local_mock(port: u16) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: local_url(port)?,
            timeout_secs: 5,
        })
    }
}

/// IPFS Pinning Service API configuration.
#[derive(Clone)]
pub struct PinningConfig {
    pub endpoint: Url,
    pub token: Zeroizing<String>,
    pub page_size: usize,
    pub timeout_secs: u64,
}

impl fmt::Debug for PinningConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinningConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &"[REDACTED]")
            .field("page_size", &self.page_size)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl PinningConfig {
    pub fn new(endpoint: Url, token: impl Into<String>) -> Self {
        Self {
            endpoint,
            token: Zeroizing::new(token.into()),
            page_size: DEFAULT_PIN_PAGE_SIZE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Variables: `ARCA_PIN_ENDPOINT` (required; `https` assumed when no
    /// scheme is given), `ARCA_PIN_TOKEN` (required), `ARCA_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = std::env::var("ARCA_PIN_ENDPOINT").map_err(|_| {
            ConfigError::InvalidUrl("ARCA_PIN_ENDPOINT".to_string(), "not set".to_string())
        })?;
        Ok(Self {
            endpoint: parse_endpoint("ARCA_PIN_ENDPOINT", &raw, "https")?,
            token: env_token("ARCA_PIN_TOKEN")?,
            page_size: DEFAULT_PIN_PAGE_SIZE,
            timeout_secs: env_secs("ARCA_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
        })
    }

    pub fn local_mock(port: u16, token: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: local_url(port)?,
            token: Zeroizing::new(token.to_string()),
            page_size: DEFAULT_PIN_PAGE_SIZE,
            timeout_secs: 5,
        })
    }
}

/// Archival upload service configuration.
#[derive(Clone)]
pub struct ArchiveConfig {
    pub endpoint: Url,
    pub token: Zeroizing<String>,
    pub page_size: usize,
    pub timeout_secs: u64,
    pub upload_timeout_secs: u64,
}

impl fmt::Debug for ArchiveConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &"[REDACTED]")
            .field("page_size", &self.page_size)
            .field("timeout_secs", &self.timeout_secs)
            .field("upload_timeout_secs", &self.upload_timeout_secs)
            .finish()
    }
}

impl ArchiveConfig {
    pub fn new(endpoint: Url, token: impl Into<String>) -> Self {
        Self {
            endpoint,
            token: Zeroizing::new(token.into()),
            page_size: DEFAULT_ARCHIVE_PAGE_SIZE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            upload_timeout_secs: DEFAULT_UPLOAD_TIMEOUT_SECS,
        }
    }

    /// Variables: `ARCA_W3S_TOKEN` (required), `ARCA_W3S_ENDPOINT`
    /// (default [`DEFAULT_ARCHIVE_ENDPOINT`]), `ARCA_TIMEOUT_SECS`,
    /// `ARCA_UPLOAD_TIMEOUT_SECS` (default 600).
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: parse_endpoint(
                "ARCA_W3S_ENDPOINT",
                &env_or("ARCA_W3S_ENDPOINT", DEFAULT_ARCHIVE_ENDPOINT),
                "https",
            )?,
            token: env_token("ARCA_W3S_TOKEN")?,
            page_size: DEFAULT_ARCHIVE_PAGE_SIZE,
            timeout_secs: env_secs("ARCA_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
            upload_timeout_secs: env_secs("ARCA_UPLOAD_TIMEOUT_SECS", DEFAULT_UPLOAD_TIMEOUT_SECS),
        })
    }

    pub fn local_mock(port: u16, token: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: local_url(port)?,
            token: Zeroizing::new(token.to_string()),
            page_size: DEFAULT_ARCHIVE_PAGE_SIZE,
            timeout_secs: 5,
            upload_timeout_secs: 5,
        })
    }
}
