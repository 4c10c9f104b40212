//! IPFS Pinning Service API client.
//!
//! Talks to the service directly rather than through a generic pinning
//! client so that pin `meta` filters are encoded exactly as the API
//! expects; per-item confirmation depends on them.

use std::collections::BTreeMap;
use std::time::Duration;

use arca_core::ContentId;
use arca_engine::{Destination, Job, Provenance, RemoteEntry, RemoteResult, Role};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::PinningConfig;
use crate::error::{check_status, ClientError};
use crate::http::{join, HttpHandle};

/// Pin states that count as present.
const PRESENT_STATUSES: &str = "queued,pinning,pinned";

#[derive(Debug, Deserialize)]
struct Pin {
    cid: String,
}

#[derive(Debug, Deserialize)]
struct PinStatus {
    created: DateTime<Utc>,
    pin: Pin,
}

#[derive(Debug, Deserialize)]
struct PinResults {
    #[serde(default)]
    results: Vec<PinStatus>,
}

#[derive(Debug, Serialize)]
struct AddPin<'a> {
    cid: String,
    name: String,
    meta: &'a BTreeMap<String, String>,
}

/// Client for one pinning service endpoint.
#[derive(Debug, Clone)]
pub struct PinningClient {
    http: HttpHandle,
    endpoint: Url,
    page_size: usize,
}

impl PinningClient {
    pub fn new(config: PinningConfig) -> Result<Self, ClientError> {
        Ok(Self {
            http: HttpHandle::new(
                Duration::from_secs(config.timeout_secs),
                Some(config.token.as_str()),
            )?,
            endpoint: config.endpoint,
            page_size: config.page_size,
        })
    }

    async fn query(&self, params: &[(&str, String)]) -> Result<Vec<PinStatus>, ClientError> {
        let endpoint = "GET /pins";
        let url = join(&self.endpoint, &["pins"]);

        let resp = self
            .http
            .send(endpoint, |http| http.get(url.clone()).query(params))
            .await?;

        // Some services answer 404 rather than an empty result list.
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        let results: PinResults = check_status(endpoint, resp)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Deserialization {
                endpoint: endpoint.into(),
                source: e,
            })?;
        Ok(results.results)
    }

    /// Pins in a present state created before `before`, newest first.
    pub async fn list(
        &self,
        before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<RemoteEntry>, ClientError> {
        let pins = self
            .query(&[
                ("status", PRESENT_STATUSES.to_string()),
                ("limit", limit.to_string()),
                ("before", before.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ])
            .await?;
        Ok(pins
            .into_iter()
            .map(|status| RemoteEntry {
                cid: status.pin.cid,
                created: status.created,
            })
            .collect())
    }

    /// Whether a pin for `id` carrying this tool's provenance for `role`
    /// exists in a present state.
    pub async fn is_pinned(
        &self,
        id: &ContentId,
        role: Role,
        provenance: &Provenance,
    ) -> Result<bool, ClientError> {
        let meta = serde_json::to_string(&provenance.meta(role)).map_err(|e| {
            ClientError::Protocol {
                endpoint: "GET /pins".into(),
                message: format!("could not encode meta filter: {e}"),
            }
        })?;
        let pins = self
            .query(&[
                ("cid", id.to_string()),
                ("status", PRESENT_STATUSES.to_string()),
                ("meta", meta),
                ("limit", "10".to_string()),
            ])
            .await?;

        let key = id.key();
        Ok(pins
            .iter()
            .filter_map(|status| ContentId::parse(&status.pin.cid).ok())
            .any(|pinned| pinned.key() == key))
    }

    /// Request a pin. Calls `POST /pins`; the service answers `202`.
    pub async fn add(&self, job: &Job, provenance: &Provenance) -> Result<(), ClientError> {
        let endpoint = "POST /pins";
        let url = join(&self.endpoint, &["pins"]);
        let meta = provenance.meta(job.role);
        let body = AddPin {
            cid: job.id.to_string(),
            name: provenance.name_for(job),
            meta: &meta,
        };

        let resp = self
            .http
            .send(endpoint, |http| http.post(url.clone()).json(&body))
            .await?;
        check_status(endpoint, resp).await?;
        Ok(())
    }
}

#[async_trait]
impl Destination for PinningClient {
    fn name(&self) -> &str {
        "pinning"
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    async fn list_present(
        &self,
        before: DateTime<Utc>,
        limit: usize,
    ) -> RemoteResult<Vec<RemoteEntry>> {
        Ok(self.list(before, limit).await?)
    }

    async fn confirm(
        &self,
        id: &ContentId,
        role: Role,
        provenance: &Provenance,
    ) -> RemoteResult<bool> {
        Ok(self.is_pinned(id, role, provenance).await?)
    }

    async fn submit(&self, job: &Job, provenance: &Provenance) -> RemoteResult<()> {
        Ok(self.add(job, provenance).await?)
    }
}
