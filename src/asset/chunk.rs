//! Chunk staging.
//!
//! Each upload request carries one fragment of a file. Fragments are stored
//! as `<session>_<index>` in the staging directory; there is no other session
//! state. Writes go through a temp file renamed into place, so an assembly
//! running concurrently never observes a half-written fragment.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use super::path::{sanitize_token, AssetDir};
use crate::{Result, VaultError};

/// Location of one staged fragment.
pub fn fragment_path(staging: &Path, session_id: &str, index: u32) -> PathBuf {
    staging.join(format!("{session_id}_{index}"))
}

/// One fragment as received from the client.
#[derive(Debug, Clone, Default)]
pub struct ChunkUpload {
    /// Client-generated upload identifier, unsanitized.
    pub session_id: String,
    /// Zero-based fragment index.
    pub chunk_index: u32,
    /// Number of fragments in the whole upload.
    pub total_chunks: u32,
    /// File name as sent by the browser.
    pub original_filename: String,
    /// Target directory, unsanitized.
    pub directory: String,
    /// Fragment content.
    pub bytes: Vec<u8>,
}

/// Outcome of staging one fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkReceipt {
    /// Index of the stored fragment.
    pub accepted: u32,
    /// Whether this was the final index. Earlier fragments may still be missing.
    pub is_last: bool,
}

/// Validates fragments and writes them to the staging directory.
#[derive(Debug, Clone)]
pub struct ChunkReceiver {
    staging: PathBuf,
    max_chunk_bytes: usize,
    max_chunks: u32,
}

impl ChunkReceiver {
    /// Create a receiver writing into `staging`.
    pub fn new(staging: impl Into<PathBuf>, max_chunk_bytes: usize, max_chunks: u32) -> Self {
        Self {
            staging: staging.into(),
            max_chunk_bytes,
            max_chunks,
        }
    }

    /// The staging directory.
    pub fn staging_dir(&self) -> &Path {
        &self.staging
    }

    /// Check every field of an upload before touching the disk.
    ///
    /// Returns the sanitized session identifier.
    pub fn validate(&self, upload: &ChunkUpload) -> Result<String> {
        let session_id = sanitize_token(&upload.session_id);
        if session_id.is_empty() {
            return Err(VaultError::InvalidRequest(
                "file_identifier is missing or invalid".to_string(),
            ));
        }
        if upload.total_chunks == 0 {
            return Err(VaultError::InvalidRequest(
                "total_chunks must be at least 1".to_string(),
            ));
        }
        if upload.total_chunks > self.max_chunks {
            return Err(VaultError::InvalidRequest(format!(
                "total_chunks exceeds the limit of {}",
                self.max_chunks
            )));
        }
        if upload.chunk_index >= upload.total_chunks {
            return Err(VaultError::InvalidRequest(format!(
                "chunk_index {} out of range for {} chunks",
                upload.chunk_index, upload.total_chunks
            )));
        }
        if upload.original_filename.trim().is_empty() {
            return Err(VaultError::InvalidRequest(
                "original_filename is missing".to_string(),
            ));
        }
        if upload.bytes.is_empty() {
            return Err(VaultError::InvalidRequest("chunk is empty".to_string()));
        }
        if upload.bytes.len() > self.max_chunk_bytes {
            return Err(VaultError::InvalidRequest(format!(
                "chunk exceeds the limit of {} bytes",
                self.max_chunk_bytes
            )));
        }
        AssetDir::parse(&upload.directory)?;

        Ok(session_id)
    }

    /// Stage one fragment, replacing any earlier fragment at the same index.
    pub async fn receive(&self, upload: &ChunkUpload) -> Result<ChunkReceipt> {
        let session_id = self.validate(upload)?;
        let index = upload.chunk_index;

        fs::create_dir_all(&self.staging).await?;

        let target = fragment_path(&self.staging, &session_id, index);
        let temp = self
            .staging
            .join(format!(".{session_id}_{index}.{}.part", Uuid::new_v4()));

        if let Err(e) = write_file(&temp, &upload.bytes).await {
            discard_part(&temp, &session_id, index).await;
            return Err(e);
        }
        if let Err(e) = fs::rename(&temp, &target).await {
            discard_part(&temp, &session_id, index).await;
            return Err(e.into());
        }

        debug!(
            session_id = %session_id,
            chunk_index = index,
            total_chunks = upload.total_chunks,
            bytes = upload.bytes.len(),
            "Staged chunk"
        );

        Ok(ChunkReceipt {
            accepted: index,
            is_last: index == upload.total_chunks - 1,
        })
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    Ok(())
}

/// Best-effort removal of a fragment temp file that never made it into place.
async fn discard_part(temp: &Path, session_id: &str, index: u32) {
    match fs::remove_file(temp).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            warn!(
                session_id = %session_id,
                chunk_index = index,
                error = %e,
                "Failed to remove partial chunk"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, ChunkReceiver) {
        let temp_dir = TempDir::new().unwrap();
        let receiver = ChunkReceiver::new(temp_dir.path().join("_chunks"), 16, 4);
        (temp_dir, receiver)
    }

    fn upload(index: u32, total: u32, bytes: &[u8]) -> ChunkUpload {
        ChunkUpload {
            session_id: "f1".to_string(),
            chunk_index: index,
            total_chunks: total,
            original_filename: "pic.png".to_string(),
            directory: String::new(),
            bytes: bytes.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_receive_stages_fragment() {
        let (_temp, receiver) = setup();

        let receipt = receiver.receive(&upload(0, 2, b"hello")).await.unwrap();
        assert_eq!(receipt.accepted, 0);
        assert!(!receipt.is_last);

        let staged = std::fs::read(fragment_path(receiver.staging_dir(), "f1", 0)).unwrap();
        assert_eq!(staged, b"hello");
    }

    #[tokio::test]
    async fn test_receive_last_chunk() {
        let (_temp, receiver) = setup();

        let receipt = receiver.receive(&upload(1, 2, b"world")).await.unwrap();
        assert!(receipt.is_last);

        let single = receiver.receive(&upload(0, 1, b"only")).await.unwrap();
        assert!(single.is_last);
    }

    #[tokio::test]
    async fn test_resend_overwrites() {
        let (_temp, receiver) = setup();

        receiver.receive(&upload(0, 2, b"first")).await.unwrap();
        receiver.receive(&upload(0, 2, b"second")).await.unwrap();

        let staged = std::fs::read(fragment_path(receiver.staging_dir(), "f1", 0)).unwrap();
        assert_eq!(staged, b"second");
    }

    #[tokio::test]
    async fn test_no_temp_files_left() {
        let (_temp, receiver) = setup();

        receiver.receive(&upload(0, 2, b"a")).await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(receiver.staging_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(entries, vec!["f1_0".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_rename_leaves_no_part_file() {
        let (_temp, receiver) = setup();
        let occupied = fragment_path(receiver.staging_dir(), "f1", 0);
        std::fs::create_dir_all(&occupied).unwrap();
        std::fs::write(occupied.join("keep"), b"x").unwrap();

        let result = receiver.receive(&upload(0, 2, b"a")).await;
        assert!(matches!(result, Err(VaultError::Io(_))));

        let entries: Vec<_> = std::fs::read_dir(receiver.staging_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(entries, vec!["f1_0".to_string()]);
    }

    #[tokio::test]
    async fn test_session_id_is_sanitized() {
        let (_temp, receiver) = setup();
        let mut chunk = upload(0, 1, b"x");
        chunk.session_id = "../../f1".to_string();

        receiver.receive(&chunk).await.unwrap();
        assert!(fragment_path(receiver.staging_dir(), "f1", 0).is_file());
    }

    #[tokio::test]
    async fn test_rejects_invalid_fields() {
        let (_temp, receiver) = setup();

        let out_of_range = receiver.receive(&upload(2, 2, b"x")).await;
        assert!(matches!(out_of_range, Err(VaultError::InvalidRequest(_))));

        let zero_total = receiver.receive(&upload(0, 0, b"x")).await;
        assert!(matches!(zero_total, Err(VaultError::InvalidRequest(_))));

        let too_many = receiver.receive(&upload(0, 5, b"x")).await;
        assert!(matches!(too_many, Err(VaultError::InvalidRequest(_))));

        let empty = receiver.receive(&upload(0, 1, b"")).await;
        assert!(matches!(empty, Err(VaultError::InvalidRequest(_))));

        let too_big = receiver.receive(&upload(0, 1, &[0u8; 17])).await;
        assert!(matches!(too_big, Err(VaultError::InvalidRequest(_))));

        let mut no_session = upload(0, 1, b"x");
        no_session.session_id = "!!!".to_string();
        assert!(matches!(
            receiver.receive(&no_session).await,
            Err(VaultError::InvalidRequest(_))
        ));

        let mut no_name = upload(0, 1, b"x");
        no_name.original_filename = "  ".to_string();
        assert!(matches!(
            receiver.receive(&no_name).await,
            Err(VaultError::InvalidRequest(_))
        ));

        let mut bad_dir = upload(0, 1, b"x");
        bad_dir.directory = "a/_chunks".to_string();
        assert!(matches!(
            receiver.receive(&bad_dir).await,
            Err(VaultError::InvalidRequest(_))
        ));
    }
}
