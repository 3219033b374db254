use packstore_core::EntryMetadata;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) status: String,
    pub(crate) node_id: String,
    pub(crate) address: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct NodesResponse {
    pub(crate) nodes: Vec<NodeItem>,
}

#[derive(Debug, Serialize)]
pub(crate) struct NodeItem {
    pub(crate) node_id: String,
    pub(crate) address: String,
    pub(crate) status: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FileQuery {
    #[serde(default)]
    pub(crate) sync: Option<bool>,
    #[serde(rename = "getFrom", default)]
    pub(crate) get_from: Option<String>,
    #[serde(default)]
    pub(crate) meta: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PutFileQuery {
    /// Comma-separated signature list attached to the entry verbatim.
    #[serde(default)]
    pub(crate) sig: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct FileMetadataResponse {
    pub(crate) name: String,
    #[serde(flatten)]
    pub(crate) metadata: EntryMetadata,
}

#[derive(Debug, Serialize)]
pub(crate) struct ListedFile {
    pub(crate) name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) directory: Option<bool>,
    #[serde(flatten)]
    pub(crate) metadata: Option<EntryMetadata>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ListFilesResponse {
    pub(crate) path: String,
    pub(crate) files: Vec<ListedFile>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SyncResponse {
    pub(crate) path: String,
    pub(crate) dispatched: usize,
    pub(crate) unreachable: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct FetchAcceptedResponse {
    pub(crate) path: String,
    pub(crate) source: String,
    pub(crate) accepted: bool,
}
