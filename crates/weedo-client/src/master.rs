//! Typed client for the master (directory service).
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET    | `/dir/assign` | Allocate file id(s) |
//! | GET    | `/dir/lookup` | Resolve a volume to its locations |
//! | POST   | `/submit` | Allocate and store in one call |
//! | GET    | `/vol/grow` | Pre-allocate volumes |
//! | GET    | `/vol/vacuum` | Trigger garbage reclamation |
//! | GET    | `/dir/status` | Cluster topology snapshot |

use serde::Deserialize;
use url::Url;
use weedo_core::{FileId, Location, VolumeId};

use crate::error::{TransportError, WeedError};
use crate::transport::{self, endpoint_url, Upload, UploadReply};

// -- Requests -----------------------------------------------------------------

/// Parameters for a file-id assignment.
///
/// A `count` of zero is treated as one. Requesting more than one id only
/// reserves a contiguous key range on the master; the caller still gets the
/// first id back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignRequest {
    pub count: u32,
    pub collection: Option<String>,
    pub replication: Option<String>,
    pub data_center: Option<String>,
    pub ttl: Option<String>,
}

impl AssignRequest {
    /// A request for `count` ids with no placement hints.
    pub fn new(count: u32) -> Self {
        Self {
            count,
            ..Self::default()
        }
    }

    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn replication(mut self, replication: impl Into<String>) -> Self {
        self.replication = Some(replication.into());
        self
    }

    pub fn data_center(mut self, data_center: impl Into<String>) -> Self {
        self.data_center = Some(data_center.into());
        self
    }

    pub fn ttl(mut self, ttl: impl Into<String>) -> Self {
        self.ttl = Some(ttl.into());
        self
    }

    /// The count actually requested: never less than one.
    pub fn normalized_count(&self) -> u32 {
        self.count.max(1)
    }

    /// Query parameters. `count` is only sent when above one.
    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        let count = self.normalized_count();
        if count > 1 {
            query.push(("count", count.to_string()));
        }
        push_non_empty(&mut query, "collection", &self.collection);
        push_non_empty(&mut query, "replication", &self.replication);
        push_non_empty(&mut query, "dataCenter", &self.data_center);
        push_non_empty(&mut query, "ttl", &self.ttl);
        query
    }
}

/// Parameters for pre-allocating volumes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrowRequest {
    pub count: u32,
    pub collection: Option<String>,
    pub replication: Option<String>,
    pub data_center: Option<String>,
}

impl GrowRequest {
    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("count", self.count.to_string())];
        push_non_empty(&mut query, "collection", &self.collection);
        push_non_empty(&mut query, "replication", &self.replication);
        push_non_empty(&mut query, "dataCenter", &self.data_center);
        query
    }
}

fn push_non_empty(query: &mut Vec<(&'static str, String)>, key: &'static str, value: &Option<String>) {
    if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
        query.push((key, v.to_string()));
    }
}

// -- Responses ----------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignReply {
    #[serde(alias = "Fid")]
    fid: FileId,
    #[serde(default, alias = "Url")]
    url: String,
    #[serde(default, alias = "PublicUrl")]
    public_url: String,
    #[serde(default, alias = "Count")]
    count: u32,
}

#[derive(Debug, Deserialize)]
struct LookupReply {
    #[serde(default, alias = "Locations")]
    locations: Option<Vec<Location>>,
}

/// Result of an assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// The first granted file id.
    pub fid: FileId,
    /// Where the first write should go.
    pub location: Location,
    /// How many ids the master granted (at most the requested count).
    pub count: u32,
}

/// Result of storing content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stored {
    pub fid: FileId,
    /// Bytes the server reports as written.
    pub size: u64,
}

/// Cluster status from `/dir/status`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ClusterStatus {
    pub version: String,
    pub topology: Topology,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Topology {
    pub data_centers: Vec<DataCenter>,
    pub free: i64,
    pub max: i64,
    pub layouts: Vec<Layout>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DataCenter {
    pub id: String,
    pub free: i64,
    pub max: i64,
    pub racks: Vec<Rack>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Rack {
    pub id: String,
    pub free: i64,
    pub max: i64,
    pub data_nodes: Vec<DataNode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DataNode {
    pub url: String,
    pub public_url: String,
    pub free: i64,
    pub max: i64,
    pub volumes: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Layout {
    pub replication: String,
    pub writables: Vec<u32>,
}

impl Topology {
    /// Every data node in the topology.
    pub fn data_nodes(&self) -> impl Iterator<Item = &DataNode> {
        self.data_centers
            .iter()
            .flat_map(|dc| dc.racks.iter())
            .flat_map(|rack| rack.data_nodes.iter())
    }
}

// -- Client -------------------------------------------------------------------

/// Client for the master.
#[derive(Debug, Clone)]
pub struct MasterClient {
    http: reqwest::Client,
    base_url: Url,
}

impl MasterClient {
    pub(crate) fn new(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The master's base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Allocate file id(s).
    ///
    /// Calls `GET {base_url}/dir/assign`.
    pub async fn assign(&self, req: &AssignRequest) -> Result<Allocation, WeedError> {
        let endpoint = "GET /dir/assign";
        let url = endpoint_url(&self.base_url, "dir/assign");
        let requested = req.normalized_count();
        tracing::debug!(%url, count = requested, "assigning file id");

        let resp = transport::send(self.http.get(&url).query(&req.query()), endpoint)
            .await
            .map_err(WeedError::Assign)?;
        let reply: AssignReply = transport::decode_json(resp, endpoint)
            .await
            .map_err(WeedError::Assign)?;

        if reply.count > requested {
            tracing::warn!(
                requested,
                granted = reply.count,
                "master granted more file ids than requested"
            );
        }

        Ok(Allocation {
            fid: reply.fid,
            location: Location::new(&reply.url, &reply.public_url),
            count: reply.count,
        })
    }

    /// Resolve a volume to its locations, primary first.
    ///
    /// Calls `GET {base_url}/dir/lookup`. An empty list is returned as-is;
    /// deciding what that means is up to the caller.
    pub async fn lookup(
        &self,
        volume_id: VolumeId,
        collection: Option<&str>,
    ) -> Result<Vec<Location>, WeedError> {
        let endpoint = "GET /dir/lookup";
        let url = endpoint_url(&self.base_url, "dir/lookup");
        let mut query = vec![("volumeId", volume_id.to_string())];
        if let Some(c) = collection.filter(|c| !c.is_empty()) {
            query.push(("collection", c.to_string()));
        }
        tracing::debug!(%url, %volume_id, "looking up volume");

        let map_err = |source: TransportError| WeedError::Lookup { volume_id, source };
        let resp = transport::send(self.http.get(&url).query(&query), endpoint)
            .await
            .map_err(map_err)?;
        let reply: LookupReply = transport::decode_json(resp, endpoint)
            .await
            .map_err(map_err)?;

        Ok(reply.locations.unwrap_or_default())
    }

    /// Allocate an id and store content in one call.
    ///
    /// Calls `POST {base_url}/submit`.
    pub async fn submit(&self, upload: Upload) -> Result<Stored, WeedError> {
        let url = endpoint_url(&self.base_url, "submit");
        submit_to(&self.http, url, upload).await
    }

    /// Ask the master to pre-allocate volumes.
    ///
    /// Calls `GET {base_url}/vol/grow`. The response body is not inspected
    /// beyond its status and `error` field.
    pub async fn grow(&self, req: &GrowRequest) -> Result<(), WeedError> {
        let endpoint = "GET /vol/grow";
        let url = endpoint_url(&self.base_url, "vol/grow");
        tracing::debug!(%url, count = req.count, "growing volumes");
        self.admin_get(&url, &req.query(), endpoint, "volume grow").await
    }

    /// Ask the master to vacuum volumes whose garbage ratio exceeds `threshold`.
    ///
    /// Calls `GET {base_url}/vol/vacuum`. Without a threshold the master
    /// applies its own default.
    pub async fn vacuum(&self, threshold: Option<f64>) -> Result<(), WeedError> {
        let endpoint = "GET /vol/vacuum";
        let url = endpoint_url(&self.base_url, "vol/vacuum");
        let query: Vec<(&'static str, String)> = threshold
            .map(|t| vec![("garbageThreshold", t.to_string())])
            .unwrap_or_default();
        tracing::debug!(%url, ?threshold, "vacuuming volumes");
        self.admin_get(&url, &query, endpoint, "volume vacuum").await
    }

    /// Fetch the cluster topology.
    ///
    /// Calls `GET {base_url}/dir/status`.
    pub async fn status(&self) -> Result<ClusterStatus, WeedError> {
        let endpoint = "GET /dir/status";
        let url = endpoint_url(&self.base_url, "dir/status");
        let map_err = |source| WeedError::Admin {
            operation: "cluster status",
            source,
        };
        let resp = transport::send(self.http.get(&url), endpoint)
            .await
            .map_err(map_err)?;
        transport::decode_json(resp, endpoint).await.map_err(map_err)
    }

    async fn admin_get(
        &self,
        url: &str,
        query: &[(&'static str, String)],
        endpoint: &str,
        operation: &'static str,
    ) -> Result<(), WeedError> {
        let map_err = |source| WeedError::Admin { operation, source };
        let resp = transport::send(self.http.get(url).query(query), endpoint)
            .await
            .map_err(map_err)?;
        transport::checked_body(resp, endpoint)
            .await
            .map_err(map_err)?;
        Ok(())
    }
}

/// POST a multipart upload to a `/submit` endpoint on a master or volume server.
pub(crate) async fn submit_to(
    http: &reqwest::Client,
    url: String,
    upload: Upload,
) -> Result<Stored, WeedError> {
    let endpoint = "POST /submit";
    let content_len = upload.len();
    tracing::debug!(%url, filename = %upload.filename, size = content_len, "submitting content");

    let form = upload.into_form()?;
    let map_err = |source| WeedError::Submit {
        url: url.clone(),
        source,
    };
    let resp = transport::send(http.post(&url).multipart(form), endpoint)
        .await
        .map_err(map_err)?;
    let reply: UploadReply = transport::decode_json(resp, endpoint)
        .await
        .map_err(map_err)?;

    let raw_fid = reply.fid.unwrap_or_default();
    let fid: FileId = raw_fid.parse()?;
    let size = reply.size.unwrap_or(content_len);
    tracing::info!(%fid, size, "content submitted");
    Ok(Stored { fid, size })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_count_normalizes_to_one() {
        assert_eq!(AssignRequest::new(0).normalized_count(), 1);
        assert_eq!(AssignRequest::new(0).query(), AssignRequest::new(1).query());
    }

    #[test]
    fn count_sent_only_above_one() {
        assert!(AssignRequest::new(1).query().is_empty());
        assert_eq!(
            AssignRequest::new(3).query(),
            vec![("count", "3".to_string())]
        );
    }

    #[test]
    fn assign_query_skips_empty_hints() {
        let req = AssignRequest::new(1)
            .collection("pictures")
            .replication("")
            .data_center("dc1")
            .ttl("3m");
        assert_eq!(
            req.query(),
            vec![
                ("collection", "pictures".to_string()),
                ("dataCenter", "dc1".to_string()),
                ("ttl", "3m".to_string()),
            ]
        );
    }

    #[test]
    fn grow_query_always_has_count() {
        let req = GrowRequest {
            count: 2,
            replication: Some("001".into()),
            ..GrowRequest::default()
        };
        assert_eq!(
            req.query(),
            vec![("count", "2".to_string()), ("replication", "001".to_string())]
        );
    }

    #[test]
    fn assign_reply_parses_both_casings() {
        let camel: AssignReply = serde_json::from_str(
            r#"{"fid":"3,01637037d6","url":"127.0.0.1:8080","publicUrl":"localhost:8080","count":1}"#,
        )
        .unwrap();
        let pascal: AssignReply = serde_json::from_str(
            r#"{"Fid":"3,01637037d6","Url":"127.0.0.1:8080","PublicUrl":"localhost:8080","Count":1}"#,
        )
        .unwrap();
        assert_eq!(camel.fid, pascal.fid);
        assert_eq!(camel.public_url, pascal.public_url);
    }

    #[test]
    fn cluster_status_parses_topology() {
        let status: ClusterStatus = serde_json::from_value(serde_json::json!({
            "Version": "3.59",
            "Topology": {
                "Free": 10,
                "Max": 14,
                "DataCenters": [{
                    "Id": "dc1", "Free": 10, "Max": 14,
                    "Racks": [{
                        "Id": "rack1", "Free": 10, "Max": 14,
                        "DataNodes": [
                            {"Url": "127.0.0.1:8080", "PublicUrl": "localhost:8080", "Free": 5, "Max": 7, "Volumes": 2},
                            {"Url": "127.0.0.1:8081", "PublicUrl": "localhost:8081", "Free": 5, "Max": 7, "Volumes": 2}
                        ]
                    }]
                }],
                "Layouts": [{"Replication": "000", "Writables": [1, 2, 3]}]
            }
        }))
        .unwrap();
        assert_eq!(status.version, "3.59");
        assert_eq!(status.topology.data_nodes().count(), 2);
        assert_eq!(status.topology.layouts[0].writables, vec![1, 2, 3]);
    }
}
