//! # arca-client
//!
//! Typed HTTP clients for the remotes arca synchronizes with. Each client
//! implements one of the `arca-engine` capability traits:
//!
//! - [`IpfsClient`]: the IPFS node RPC API, as the engine's
//!   [`NodeService`](arca_engine::NodeService). Also exports CAR archives.
//! - [`PinningClient`]: an IPFS Pinning Service API endpoint, as a
//!   [`Destination`](arca_engine::Destination).
//! - [`ArchiveClient`]: a Web3.Storage-style CAR upload service, as a
//!   [`Destination`](arca_engine::Destination).
//!
//! Every client owns one [`HttpHandle`]; requests through it are serialized
//! and transport failures on idempotent calls are retried with backoff.

pub mod archive;
pub mod config;
pub mod error;
pub mod http;
pub mod ipfs;
pub mod pinning;
pub mod retry;

pub use archive::ArchiveClient;
pub use config::{ArchiveConfig, ConfigError, IpfsConfig, PinningConfig};
pub use error::ClientError;
pub use http::HttpHandle;
pub use ipfs::IpfsClient;
pub use pinning::PinningClient;
pub use retry::RetryPolicy;
