//! In-memory stand-ins for the node service and destinations.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use arca_core::{ContentId, ContentKey};
use arca_engine::{
    Destination, Job, NodeLink, NodeService, NodeStat, Provenance, RemoteEntry, RemoteError,
    RemoteResult, Role,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use cid::multihash::Multihash;
use cid::Cid;

const SHA2_256: u64 = 0x12;
const DAG_PB: u64 = 0x70;
const RAW: u64 = 0x55;

fn multihash(seed: u8) -> Multihash<64> {
    Multihash::wrap(SHA2_256, &[seed; 32]).unwrap()
}

/// Raw-codec CIDv1 over a digest derived from `seed`.
pub fn file_id(seed: u8) -> ContentId {
    ContentId::from_cid(Cid::new_v1(RAW, multihash(seed)))
}

/// CIDv0 of the same digest as [`file_id`].
pub fn file_id_v0(seed: u8) -> ContentId {
    ContentId::from_cid(Cid::new_v0(multihash(seed)).unwrap())
}

fn dir_id(seed: u8) -> ContentId {
    ContentId::from_cid(Cid::new_v1(DAG_PB, multihash(seed)))
}

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_600_000_000 + secs, 0).unwrap()
}

fn transport(endpoint: &str) -> RemoteError {
    RemoteError::Transport {
        endpoint: endpoint.to_string(),
        message: "connection reset".to_string(),
    }
}

#[derive(Default)]
struct NodeState {
    next_dir: u8,
    directories: Vec<(ContentId, Vec<NodeLink>)>,
}

/// Node service that knows a fixed set of files and mints directory ids.
#[derive(Default)]
pub struct FakeNode {
    known: HashSet<ContentKey>,
    fail_put: bool,
    state: Mutex<NodeState>,
}

impl FakeNode {
    pub fn with_files(ids: &[ContentId]) -> Self {
        Self {
            known: ids.iter().map(ContentId::key).collect(),
            fail_put: false,
            state: Mutex::new(NodeState {
                next_dir: 200,
                directories: Vec::new(),
            }),
        }
    }

    pub fn failing_put(mut self) -> Self {
        self.fail_put = true;
        self
    }

    /// Every directory stored, in creation order.
    pub fn directories(&self) -> Vec<(ContentId, Vec<NodeLink>)> {
        self.state.lock().unwrap().directories.clone()
    }
}

#[async_trait]
impl NodeService for FakeNode {
    async fn stat(&self, id: &ContentId) -> RemoteResult<NodeStat> {
        if self.known.contains(&id.key()) {
            Ok(NodeStat { id: *id, size: 100 })
        } else {
            Err(RemoteError::Status {
                endpoint: "fake-node/files/stat".to_string(),
                status: 500,
                body: "block not found".to_string(),
            })
        }
    }

    async fn put_directory(&self, links: &[NodeLink]) -> RemoteResult<NodeStat> {
        if self.fail_put {
            return Err(transport("fake-node/dag/put"));
        }
        let mut state = self.state.lock().unwrap();
        let id = dir_id(state.next_dir);
        state.next_dir += 1;
        state.directories.push((id, links.to_vec()));
        let size = links.iter().map(|l| l.target.size).sum::<u64>() + 10;
        Ok(NodeStat { id, size })
    }
}

/// A call a destination received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List { before: DateTime<Utc> },
    Confirm { id: ContentId, role: Role, tag: String },
    Submit { id: ContentId, role: Role, tag: String },
}

/// Destination backed by a newest-first listing and a confirmation set.
pub struct FakeDestination {
    name: String,
    page_size: usize,
    listing: Vec<RemoteEntry>,
    ignore_cursor: bool,
    fail_list: bool,
    fail_submit: Option<ContentKey>,
    confirmable: HashSet<ContentKey>,
    calls: Mutex<Vec<Call>>,
}

impl FakeDestination {
    pub fn new(name: &str, page_size: usize) -> Self {
        Self {
            name: name.to_string(),
            page_size,
            listing: Vec::new(),
            ignore_cursor: false,
            fail_list: false,
            fail_submit: None,
            confirmable: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// List `ids` as present, newest first, one second apart.
    pub fn listing(mut self, ids: &[ContentId]) -> Self {
        let count = ids.len() as i64;
        self.listing = ids
            .iter()
            .enumerate()
            .map(|(i, id)| RemoteEntry {
                cid: id.to_string(),
                created: at(count - i as i64),
            })
            .collect();
        self
    }

    pub fn raw_listing(mut self, entries: Vec<RemoteEntry>) -> Self {
        self.listing = entries;
        self
    }

    /// Behave like a server that ignores the `before` parameter.
    pub fn ignoring_cursor(mut self) -> Self {
        self.ignore_cursor = true;
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn failing_submit(mut self, id: ContentId) -> Self {
        self.fail_submit = Some(id.key());
        self
    }

    /// Answer per-item confirmation positively for `ids`.
    pub fn confirming(mut self, ids: &[ContentId]) -> Self {
        self.confirmable.extend(ids.iter().map(ContentId::key));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn submitted(&self) -> Vec<(ContentId, Role)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Submit { id, role, .. } => Some((id, role)),
                _ => None,
            })
            .collect()
    }

    pub fn list_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::List { .. }))
            .count()
    }
}

#[async_trait]
impl Destination for FakeDestination {
    fn name(&self) -> &str {
        &self.name
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    async fn list_present(
        &self,
        before: DateTime<Utc>,
        limit: usize,
    ) -> RemoteResult<Vec<RemoteEntry>> {
        self.calls.lock().unwrap().push(Call::List { before });
        if self.fail_list {
            return Err(transport(&format!("{}/list", self.name)));
        }
        Ok(self
            .listing
            .iter()
            .filter(|entry| self.ignore_cursor || entry.created < before)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn confirm(
        &self,
        id: &ContentId,
        role: Role,
        provenance: &Provenance,
    ) -> RemoteResult<bool> {
        self.calls.lock().unwrap().push(Call::Confirm {
            id: *id,
            role,
            tag: provenance.tag().to_string(),
        });
        Ok(self.confirmable.contains(&id.key()))
    }

    async fn submit(&self, job: &Job, provenance: &Provenance) -> RemoteResult<()> {
        self.calls.lock().unwrap().push(Call::Submit {
            id: job.id,
            role: job.role,
            tag: provenance.tag().to_string(),
        });
        if self.fail_submit.as_ref() == Some(&job.id.key()) {
            return Err(RemoteError::Status {
                endpoint: format!("{}/submit", self.name),
                status: 400,
                body: "rejected".to_string(),
            });
        }
        Ok(())
    }
}
