//! IPFS node RPC client (Kubo HTTP API).
//!
//! Implements [`NodeService`] for the directory tree builder and exports
//! CAR archives for the archival destination. All RPC calls are `POST`.
//!
//! | Call | Use |
//! |------|-----|
//! | `files/stat?arg=/ipfs/<cid>` | resolve an existing node |
//! | `dag/put?store-codec=dag-pb&input-codec=dag-json` | store a directory node |
//! | `dag/export?arg=<cid>` | stream a CAR archive |

use std::time::Duration;

use arca_core::ContentId;
use arca_engine::{NodeLink, NodeService, NodeStat, RemoteResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::config::IpfsConfig;
use crate::error::{check_status, ClientError};
use crate::http::{join, HttpHandle};

/// UnixFS `Data` for a plain directory (`Type = Directory`), base64.
const UNIXFS_DIRECTORY: &str = "CAE";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StatResponse {
    hash: String,
    cumulative_size: u64,
}

#[derive(Debug, Deserialize)]
struct CidLink {
    #[serde(rename = "/")]
    cid: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DagPutResponse {
    cid: CidLink,
}

/// Client for an IPFS node's RPC API.
#[derive(Debug, Clone)]
pub struct IpfsClient {
    http: HttpHandle,
    base_url: Url,
}

impl IpfsClient {
    pub fn new(config: IpfsConfig) -> Result<Self, ClientError> {
        Ok(Self {
            http: HttpHandle::new(Duration::from_secs(config.timeout_secs), None)?,
            base_url: config.api_url,
        })
    }

    fn rpc(&self, command: &[&str]) -> Url {
        let mut segments = vec!["api", "v0"];
        segments.extend_from_slice(command);
        join(&self.base_url, &segments)
    }

    /// Resolve an existing node. Calls `POST /api/v0/files/stat`.
    pub async fn stat(&self, id: &ContentId) -> Result<NodeStat, ClientError> {
        let endpoint = "POST files/stat";
        let url = self.rpc(&["files", "stat"]);
        let arg = format!("/ipfs/{id}");

        let resp = self
            .http
            .send(endpoint, |http| http.post(url.clone()).query(&[("arg", arg.as_str())]))
            .await?;
        let stat: StatResponse = check_status(endpoint, resp)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Deserialization {
                endpoint: endpoint.into(),
                source: e,
            })?;

        Ok(NodeStat {
            id: parse_cid(endpoint, &stat.hash)?,
            size: stat.cumulative_size,
        })
    }

    /// Store a dag-pb directory node with `links`. Calls
    /// `POST /api/v0/dag/put`, then stats the new node for its size.
    pub async fn put_directory(&self, links: &[NodeLink]) -> Result<NodeStat, ClientError> {
        let endpoint = "POST dag/put";
        let url = self.rpc(&["dag", "put"]);
        let node = directory_node(links).to_string();

        let resp = self
            .http
            .send(endpoint, |http| {
                let form = reqwest::multipart::Form::new().part(
                    "file",
                    reqwest::multipart::Part::text(node.clone()).file_name("node.json"),
                );
                http.post(url.clone())
                    .query(&[
                        ("store-codec", "dag-pb"),
                        ("input-codec", "dag-json"),
                        ("pin", "false"),
                    ])
                    .multipart(form)
            })
            .await?;
        let put: DagPutResponse = check_status(endpoint, resp)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Deserialization {
                endpoint: endpoint.into(),
                source: e,
            })?;

        let id = parse_cid(endpoint, &put.cid.cid)?;
        self.stat(&id).await
    }

    /// Start a CAR export of the DAG rooted at `id`. Calls
    /// `POST /api/v0/dag/export`. The body is streamed by the caller.
    pub async fn export(&self, id: &ContentId) -> Result<reqwest::Response, ClientError> {
        let endpoint = "POST dag/export";
        let url = self.rpc(&["dag", "export"]);
        let arg = id.to_string();

        let resp = self
            .http
            .send(endpoint, |http| http.post(url.clone()).query(&[("arg", arg.as_str())]))
            .await?;
        check_status(endpoint, resp).await
    }
}

/// dag-json encoding of a UnixFS directory node. Links are sorted by name,
/// as dag-pb requires.
fn directory_node(links: &[NodeLink]) -> Value {
    let mut sorted: Vec<&NodeLink> = links.iter().collect();
    sorted.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));

    let links: Vec<Value> = sorted
        .into_iter()
        .map(|link| {
            json!({
                "Hash": { "/": link.target.id.to_string() },
                "Name": link.name,
                "Tsize": link.target.size,
            })
        })
        .collect();

    json!({
        "Data": { "/": { "bytes": UNIXFS_DIRECTORY } },
        "Links": links,
    })
}

fn parse_cid(endpoint: &str, raw: &str) -> Result<ContentId, ClientError> {
    ContentId::parse(raw).map_err(|e| ClientError::Protocol {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })
}

#[async_trait]
impl NodeService for IpfsClient {
    async fn stat(&self, id: &ContentId) -> RemoteResult<NodeStat> {
        Ok(IpfsClient::stat(self, id).await?)
    }

    async fn put_directory(&self, links: &[NodeLink]) -> RemoteResult<NodeStat> {
        Ok(IpfsClient::put_directory(self, links).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "bafkreibm6jg3ux5qumhcn2b3flc3tyu6dmlb4xa7u5bf44yegnrjhc4yeq";
    const B: &str = "bafkreigh2akiscaildcqabsyg3dfr6chu3fgpregiymsck7e7aqa4s52zy";

    fn link(name: &str, cid: &str, size: u64) -> NodeLink {
        NodeLink {
            name: name.to_string(),
            target: NodeStat {
                id: ContentId::parse(cid).unwrap(),
                size,
            },
        }
    }

    #[test]
    fn directory_node_sorts_links_by_name() {
        let node = directory_node(&[link("b.txt", B, 20), link("a.txt", A, 10)]);
        assert_eq!(node["Data"]["/"]["bytes"], "CAE");
        assert_eq!(node["Links"][0]["Name"], "a.txt");
        assert_eq!(node["Links"][0]["Hash"]["/"], A);
        assert_eq!(node["Links"][0]["Tsize"], 10);
        assert_eq!(node["Links"][1]["Name"], "b.txt");
    }

    #[test]
    fn empty_directory_has_no_links() {
        let node = directory_node(&[]);
        assert_eq!(node["Links"], json!([]));
    }
}
