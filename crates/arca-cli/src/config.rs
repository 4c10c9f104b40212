//! # Run configuration
//!
//! Every flag doubles as an environment variable so the binary can run
//! unchanged as a CI action, where inputs arrive as `INPUT_<NAME>`.
//!
//! | Flag | Variable | Default |
//! |------|----------|---------|
//! | `--repo` | `GITHUB_WORKSPACE` | `.` |
//! | `--mode` | `INPUT_MODE` | `validate` |
//! | `--path` | `INPUT_PATH` | `artifacts` |
//! | `--ipfs-api` | `INPUT_IPFS-API` | `/dns/localhost/tcp/5001/http` |
//! | `--pin-endpoint` | `INPUT_PIN-ENDPOINT` | |
//! | `--pin-token` | `INPUT_PIN-TOKEN` | |
//! | `--w3s-token` | `INPUT_W3S-TOKEN` | |
//! | `--w3s-endpoint` | `INPUT_W3S-ENDPOINT` | `https://api.web3.storage` |
//! | `--dry-run` | `INPUT_DRY-RUN` | `false` |
//! | `--provenance-tag` | `INPUT_PROVENANCE-TAG` | `lgbt.acearchive.artifact-action` |

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};

use arca_client::config::{
    parse_api_addr, parse_endpoint, DEFAULT_ARCHIVE_ENDPOINT, DEFAULT_IPFS_API,
    DEFAULT_TIMEOUT_SECS, DEFAULT_UPLOAD_TIMEOUT_SECS,
};
use arca_client::{ArchiveClient, ArchiveConfig, IpfsClient, IpfsConfig, PinningClient, PinningConfig};
use arca_engine::{Destination, Provenance, SyncOptions, DEFAULT_PROVENANCE_TAG};
use arca_metadata::{GitHistory, MetadataSource, WorkingTree};

/// Where artifact metadata is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// The working tree; every descriptor must be valid.
    Validate,
    /// Every revision reachable from `HEAD`.
    History,
}

/// What to print on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Resolved artifacts as JSON.
    Artifacts,
    /// Unique content identifiers as a JSON array.
    Cids,
    /// Logs only.
    Summary,
}

/// Arguments for a run.
#[derive(Args, Clone)]
pub struct RunArgs {
    /// Path of the git repository containing the artifact files.
    #[arg(short, long, env = "GITHUB_WORKSPACE", default_value = ".")]
    pub repo: PathBuf,

    /// Read the working tree (validate) or the full git history (history).
    #[arg(short, long, env = "INPUT_MODE", value_enum, default_value_t = Mode::Validate)]
    pub mode: Mode,

    /// Path of the artifact files, relative to the repository.
    #[arg(long, env = "INPUT_PATH", default_value = "artifacts")]
    pub path: PathBuf,

    /// Multiaddr or URL of the IPFS node's RPC API.
    #[arg(long, env = "INPUT_IPFS-API", default_value = DEFAULT_IPFS_API)]
    pub ipfs_api: String,

    /// IPFS pinning service API endpoint.
    #[arg(long, env = "INPUT_PIN-ENDPOINT", requires = "pin_token")]
    pub pin_endpoint: Option<String>,

    /// Bearer token for the pinning service.
    #[arg(long, env = "INPUT_PIN-TOKEN", hide_env_values = true, requires = "pin_endpoint")]
    pub pin_token: Option<String>,

    /// API token for the archival upload service.
    #[arg(long, env = "INPUT_W3S-TOKEN", hide_env_values = true)]
    pub w3s_token: Option<String>,

    /// Archival upload service endpoint.
    #[arg(long, env = "INPUT_W3S-ENDPOINT", default_value = DEFAULT_ARCHIVE_ENDPOINT)]
    pub w3s_endpoint: String,

    /// What to print on stdout.
    #[arg(short, long, env = "INPUT_OUTPUT", value_enum, default_value_t = OutputFormat::Summary)]
    pub output: OutputFormat,

    /// Run every read against the destinations but submit nothing.
    #[arg(long, env = "INPUT_DRY-RUN")]
    pub dry_run: bool,

    /// Tag recorded on everything this tool pins.
    #[arg(long, env = "INPUT_PROVENANCE-TAG", default_value = DEFAULT_PROVENANCE_TAG)]
    pub provenance_tag: String,

    /// Request timeout in seconds.
    #[arg(long, env = "ARCA_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Archive upload timeout in seconds.
    #[arg(long, env = "ARCA_UPLOAD_TIMEOUT_SECS", default_value_t = DEFAULT_UPLOAD_TIMEOUT_SECS)]
    pub upload_timeout: u64,

    /// Format output for GitHub Actions.
    #[arg(long, env = "ARCA_ACTION", hide = true)]
    pub action: bool,
}

impl fmt::Debug for RunArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = |token: &Option<String>| token.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("RunArgs")
            .field("repo", &self.repo)
            .field("mode", &self.mode)
            .field("path", &self.path)
            .field("ipfs_api", &self.ipfs_api)
            .field("pin_endpoint", &self.pin_endpoint)
            .field("pin_token", &redacted(&self.pin_token))
            .field("w3s_token", &redacted(&self.w3s_token))
            .field("w3s_endpoint", &self.w3s_endpoint)
            .field("output", &self.output)
            .field("dry_run", &self.dry_run)
            .field("provenance_tag", &self.provenance_tag)
            .field("action", &self.action)
            .finish()
    }
}

impl RunArgs {
    /// The metadata source selected by `--mode`.
    pub fn source(&self) -> Box<dyn MetadataSource> {
        match self.mode {
            Mode::Validate => Box::new(WorkingTree::new(&self.repo, &self.path)),
            Mode::History => Box::new(GitHistory::new(&self.repo, &self.path)),
        }
    }

    pub fn sync_options(&self) -> Result<SyncOptions> {
        let tag = self.provenance_tag.trim();
        if tag.is_empty() {
            bail!("--provenance-tag must not be empty");
        }
        Ok(SyncOptions {
            dry_run: self.dry_run,
            provenance: Provenance::new(tag),
        })
    }

    /// Whether any destination is configured.
    pub fn has_destinations(&self) -> bool {
        self.pin_endpoint.is_some() || self.w3s_token.is_some()
    }

    pub fn ipfs_config(&self) -> Result<IpfsConfig> {
        let mut config = IpfsConfig::new(
            parse_api_addr(&self.ipfs_api).context("invalid --ipfs-api")?,
        );
        config.timeout_secs = self.timeout;
        Ok(config)
    }

    pub fn pinning_config(&self) -> Result<Option<PinningConfig>> {
        let (Some(endpoint), Some(token)) = (&self.pin_endpoint, &self.pin_token) else {
            return Ok(None);
        };
        if token.trim().is_empty() {
            bail!("--pin-token must not be empty");
        }
        let endpoint =
            parse_endpoint("pin-endpoint", endpoint, "https").context("invalid --pin-endpoint")?;
        let mut config = PinningConfig::new(endpoint, token.trim());
        config.timeout_secs = self.timeout;
        Ok(Some(config))
    }

    pub fn archive_config(&self) -> Result<Option<ArchiveConfig>> {
        let Some(token) = &self.w3s_token else {
            return Ok(None);
        };
        if token.trim().is_empty() {
            bail!("--w3s-token must not be empty");
        }
        let endpoint = parse_endpoint("w3s-endpoint", &self.w3s_endpoint, "https")
            .context("invalid --w3s-endpoint")?;
        let mut config = ArchiveConfig::new(endpoint, token.trim());
        config.timeout_secs = self.timeout;
        config.upload_timeout_secs = self.upload_timeout;
        Ok(Some(config))
    }

    /// Build the node client and every configured destination.
    pub fn clients(&self) -> Result<(IpfsClient, Vec<Arc<dyn Destination>>)> {
        let ipfs = IpfsClient::new(self.ipfs_config()?)?;
        let mut destinations: Vec<Arc<dyn Destination>> = Vec::new();

        if let Some(config) = self.pinning_config()? {
            tracing::debug!(endpoint = %config.endpoint, "pinning service configured");
            destinations.push(Arc::new(PinningClient::new(config)?));
        }
        if let Some(config) = self.archive_config()? {
            tracing::debug!(endpoint = %config.endpoint, "archival service configured");
            destinations.push(Arc::new(ArchiveClient::new(config, ipfs.clone())?));
        }

        Ok((ipfs, destinations))
    }
}
