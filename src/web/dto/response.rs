//! Response DTOs for the asset admin API.

use serde::Serialize;

use crate::asset::{AssetDir, PublishResult};

/// Reply to an intermediate chunk.
#[derive(Debug, Serialize)]
pub struct ChunkReceivedResponse {
    /// Always true.
    pub success: bool,
    /// Index of the stored fragment.
    pub chunk_received: u32,
}

impl ChunkReceivedResponse {
    /// Create a response for a stored fragment.
    pub fn new(index: u32) -> Self {
        Self {
            success: true,
            chunk_received: index,
        }
    }
}

/// Reply to the final chunk once the asset is published.
#[derive(Debug, Serialize)]
pub struct UploadCompleteResponse {
    /// Always true.
    pub success: bool,
    /// Catalog ID.
    pub asset_id: i64,
    /// Final file name.
    pub filename: String,
    /// Size in bytes.
    pub size: i64,
    /// Detected MIME type.
    pub mime_type: String,
    /// Whether an existing asset was replaced.
    pub overwritten: bool,
}

impl From<PublishResult> for UploadCompleteResponse {
    fn from(result: PublishResult) -> Self {
        Self {
            success: true,
            asset_id: result.asset_id,
            filename: result.filename,
            size: result.size,
            mime_type: result.mime_type,
            overwritten: result.overwritten,
        }
    }
}

/// Either upload reply.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum UploadResponse {
    /// More fragments expected.
    ChunkReceived(ChunkReceivedResponse),
    /// Asset published.
    Complete(UploadCompleteResponse),
}

/// One entry of the directory tree.
#[derive(Debug, Serialize)]
pub struct TreeEntry {
    /// Full relative path.
    pub path: String,
    /// Last segment.
    pub name: String,
    /// Nesting depth, 1 for top-level directories.
    pub depth: usize,
}

impl From<&AssetDir> for TreeEntry {
    fn from(dir: &AssetDir) -> Self {
        Self {
            path: dir.as_string(),
            name: dir.name().map(|n| n.to_string()).unwrap_or_default(),
            depth: dir.depth(),
        }
    }
}

/// Every known directory.
#[derive(Debug, Serialize)]
pub struct TreeResponse {
    /// Directories in natural order.
    pub directories: Vec<TreeEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_response_shapes() {
        let chunk = serde_json::to_value(UploadResponse::ChunkReceived(
            ChunkReceivedResponse::new(0),
        ))
        .unwrap();
        assert_eq!(chunk, serde_json::json!({"success": true, "chunk_received": 0}));

        let done = serde_json::to_value(UploadResponse::Complete(
            PublishResult {
                asset_id: 1,
                filename: "pic.png".to_string(),
                size: 4,
                mime_type: "image/png".to_string(),
                overwritten: false,
            }
            .into(),
        ))
        .unwrap();
        assert_eq!(done["asset_id"], 1);
        assert_eq!(done["overwritten"], false);
        assert!(done.get("chunk_received").is_none());
    }

    #[test]
    fn test_tree_entry() {
        let dir = AssetDir::parse("a/b").unwrap();
        let entry = TreeEntry::from(&dir);
        assert_eq!(entry.path, "a/b");
        assert_eq!(entry.name, "b");
        assert_eq!(entry.depth, 2);
    }
}
