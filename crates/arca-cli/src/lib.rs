//! # arca-cli
//!
//! The `arca` command. Reads artifact descriptors from a repository (the
//! working tree, or every revision in git history), resolves each
//! artifact's latest files, and synchronizes the content to an IPFS
//! pinning service and/or an archival upload service.
//!
//! ```bash
//! # Validate the working tree and print the unique CIDs:
//! arca --mode validate --output cids
//!
//! # Pin everything ever published, without submitting anything:
//! arca --mode history --pin-endpoint api.pinata.cloud/psa --pin-token "$TOKEN" --dry-run
//! ```
//!
//! Argument parsing lives in [`config`]; the run itself in [`sync`]; the
//! stdout formats in [`output`].

pub mod config;
pub mod output;
pub mod sync;
