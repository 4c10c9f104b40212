//! Archival upload service client (Web3.Storage-style API).
//!
//! Uploads are CAR archives exported from the IPFS node. The export is
//! streamed straight into the upload request: a producer task reads the
//! node's response body and forwards chunks over a bounded channel whose
//! receiving end is the request body. If the export fails midway the
//! producer sends the error down the channel, which fails the upload
//! instead of submitting a truncated archive.

use std::io;
use std::time::Duration;

use arca_core::ContentId;
use arca_engine::{Destination, Job, Provenance, RemoteEntry, RemoteResult, Role};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use futures::{Stream, StreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use url::Url;

use crate::config::ArchiveConfig;
use crate::error::{check_status, ClientError};
use crate::http::{join, HttpHandle};
use crate::ipfs::IpfsClient;

/// Media type of a CAR archive.
pub const CAR_MEDIA_TYPE: &str = "application/vnd.ipld.car";

/// Chunks buffered between the export and the upload.
const CHUNK_BUFFER: usize = 16;

#[derive(Debug, Deserialize)]
struct Upload {
    cid: String,
    created: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct CarResponse {
    cid: String,
}

/// Client for an archival upload service, exporting from an IPFS node.
#[derive(Debug, Clone)]
pub struct ArchiveClient {
    http: HttpHandle,
    endpoint: Url,
    page_size: usize,
    upload_timeout: Duration,
    ipfs: IpfsClient,
}

impl ArchiveClient {
    pub fn new(config: ArchiveConfig, ipfs: IpfsClient) -> Result<Self, ClientError> {
        Ok(Self {
            http: HttpHandle::new(
                Duration::from_secs(config.timeout_secs),
                Some(config.token.as_str()),
            )?,
            endpoint: config.endpoint,
            page_size: config.page_size,
            upload_timeout: Duration::from_secs(config.upload_timeout_secs),
            ipfs,
        })
    }

    /// Uploads created before `before`, newest first. Calls
    /// `GET /user/uploads`.
    pub async fn list(
        &self,
        before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<RemoteEntry>, ClientError> {
        let endpoint = "GET /user/uploads";
        let url = join(&self.endpoint, &["user", "uploads"]);
        let before = before.to_rfc3339_opts(SecondsFormat::Millis, true);
        let size = limit.to_string();

        let resp = self
            .http
            .send(endpoint, |http| {
                http.get(url.clone())
                    .query(&[("before", before.as_str()), ("size", size.as_str())])
            })
            .await?;
        let uploads: Vec<Upload> = check_status(endpoint, resp)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Deserialization {
                endpoint: endpoint.into(),
                source: e,
            })?;

        Ok(uploads
            .into_iter()
            .map(|upload| RemoteEntry {
                cid: upload.cid,
                created: upload.created,
            })
            .collect())
    }

    /// Whether this account has an upload for `id`. Calls
    /// `GET /user/uploads/{cid}`; `404` means absent.
    pub async fn has_upload(&self, id: &ContentId) -> Result<bool, ClientError> {
        let endpoint = "GET /user/uploads/{cid}";
        let cid = id.to_string();
        let url = join(&self.endpoint, &["user", "uploads", &cid]);

        let resp = self
            .http
            .send(endpoint, |http| http.get(url.clone()))
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check_status(endpoint, resp).await?;
        Ok(true)
    }

    /// Export `id` from the node and upload it. Calls `POST /car`.
    pub async fn upload(&self, id: &ContentId) -> Result<(), ClientError> {
        let export = self.ipfs.export(id).await?;
        self.upload_car(id, export.bytes_stream()).await
    }

    /// Upload the CAR archive streamed by `car`, whose root is `id`. Calls
    /// `POST /car`.
    ///
    /// An error from `car` aborts the request, so a partial archive is
    /// never accepted.
    pub async fn upload_car<S, E>(&self, id: &ContentId, car: S) -> Result<(), ClientError>
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        let endpoint = "POST /car";
        let url = join(&self.endpoint, &["car"]);

        let (rx, producer) = pump(car);
        let body = reqwest::Body::wrap_stream(rx);
        let timeout = self.upload_timeout;
        let result = self
            .http
            .send_once(endpoint, |http| {
                http.post(url)
                    .header(CONTENT_TYPE, CAR_MEDIA_TYPE)
                    .timeout(timeout)
                    .body(body)
            })
            .await;
        producer.abort();

        let stored: CarResponse = check_status(endpoint, result?)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Deserialization {
                endpoint: endpoint.into(),
                source: e,
            })?;

        let stored_id = ContentId::parse(&stored.cid).map_err(|e| ClientError::Protocol {
            endpoint: endpoint.into(),
            message: e.to_string(),
        })?;
        if !stored_id.is_equivalent(id) {
            return Err(ClientError::Protocol {
                endpoint: endpoint.into(),
                message: format!("uploaded {id} but the service stored {stored_id}"),
            });
        }
        Ok(())
    }
}

/// Forward `chunks` over a bounded channel from a spawned task. The
/// receiving end yields the first error and then ends.
fn pump<S, E>(chunks: S) -> (ReceiverStream<Result<Bytes, io::Error>>, JoinHandle<()>)
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let (tx, rx) = mpsc::channel::<Result<Bytes, io::Error>>(CHUNK_BUFFER);
    let producer = tokio::spawn(async move {
        let mut chunks = std::pin::pin!(chunks);
        while let Some(chunk) = chunks.next().await {
            let item = chunk.map_err(io::Error::other);
            let failed = item.is_err();
            if tx.send(item).await.is_err() || failed {
                break;
            }
        }
    });
    (ReceiverStream::new(rx), producer)
}

#[async_trait]
impl Destination for ArchiveClient {
    fn name(&self) -> &str {
        "archive"
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

    /// Uploads are scoped to the token's account, which is this tool's
    /// provenance at this destination; the role is not recorded.
    async fn confirm(
        &self,
        id: &ContentId,
        _role: Role,
        _provenance: &Provenance,
    ) -> RemoteResult<bool> {
        Ok(self.has_upload(id).await?)
    }

    async fn submit(&self, job: &Job, _provenance: &Provenance) -> RemoteResult<()> {
        Ok(self.upload(&job.id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("export interrupted")]
    struct Interrupted;

    #[tokio::test]
    async fn pump_forwards_chunks_in_order() {
        let source = futures::stream::iter(vec![
            Ok::<_, Interrupted>(Bytes::from_static(b"ab")),
            Ok(Bytes::from_static(b"cd")),
        ]);
        let (rx, producer) = pump(source);
        let chunks: Vec<_> = rx.map(|c| c.unwrap()).collect().await;
        assert_eq!(chunks, vec![Bytes::from_static(b"ab"), Bytes::from_static(b"cd")]);
        producer.await.unwrap();
    }

    #[tokio::test]
    async fn pump_stops_after_midstream_error() {
        let source = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"car header")),
            Err(Interrupted),
            Ok(Bytes::from_static(b"never sent")),
        ]);
        let (rx, producer) = pump(source);
        let items: Vec<_> = rx.collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), &Bytes::from_static(b"car header"));
        let err = items[1].as_ref().unwrap_err();
        assert_eq!(err.to_string(), "export interrupted");
        producer.await.unwrap();
    }
}
