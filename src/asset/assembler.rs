//! Upload assembly and publishing.
//!
//! Triggered by the final fragment of an upload. Fragments are concatenated
//! into a temp file in the staging directory and renamed onto the destination,
//! so a published file is always complete. The catalog is written last.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::catalog::{Asset, AssetRepository, NewAsset};
use super::chunk::fragment_path;
use super::directory::DirectoryManager;
use super::path::{join_filename, sanitize_token, split_filename, AssetDir};
use super::FALLBACK_BASE_NAME;
use crate::{Result, VaultError};

/// Outcome of a successful assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishResult {
    /// Catalog ID of the published asset.
    pub asset_id: i64,
    /// Final file name.
    pub filename: String,
    /// Published size in bytes.
    pub size: i64,
    /// Detected MIME type.
    pub mime_type: String,
    /// Whether an existing asset was replaced.
    pub overwritten: bool,
}

/// Where an assembly will publish, decided before any bytes move.
struct Destination {
    filename: String,
    path: PathBuf,
    existing: Option<Asset>,
}

/// Concatenates staged fragments and publishes the result.
#[derive(Debug, Clone)]
pub struct Assembler {
    directories: DirectoryManager,
    max_name_probes: u32,
}

impl Assembler {
    /// Create an assembler publishing under `directories`' root.
    pub fn new(directories: DirectoryManager, max_name_probes: u32) -> Self {
        Self {
            directories,
            max_name_probes,
        }
    }

    /// Assemble fragments `0..total_chunks` of `session_id` and publish them
    /// as `original_filename` in `directory`.
    pub async fn assemble(
        &self,
        session_id: &str,
        total_chunks: u32,
        original_filename: &str,
        directory: &AssetDir,
        catalog: &AssetRepository<'_>,
    ) -> Result<PublishResult> {
        let session_id = sanitize_token(session_id);
        if session_id.is_empty() {
            return Err(VaultError::InvalidRequest(
                "file_identifier is missing or invalid".to_string(),
            ));
        }
        if total_chunks == 0 {
            return Err(VaultError::InvalidRequest(
                "total_chunks must be at least 1".to_string(),
            ));
        }

        let destination = self
            .resolve_destination(original_filename, directory, catalog)
            .await?;

        let staging = self.directories.staging_dir();
        let temp = staging.join(format!(".assemble_{session_id}_{}.tmp", Uuid::new_v4()));

        if let Err(e) = concatenate(&staging, &session_id, total_chunks, &temp).await {
            discard_temp(&temp, &session_id).await;
            return Err(e);
        }

        if let Err(e) = self.directories.ensure_dir(directory) {
            discard_temp(&temp, &session_id).await;
            return Err(e);
        }
        if let Err(e) = publish(&temp, &destination.path).await {
            discard_temp(&temp, &session_id).await;
            return Err(e);
        }

        for index in 0..total_chunks {
            let fragment = fragment_path(&staging, &session_id, index);
            if let Err(e) = fs::remove_file(&fragment).await {
                warn!(
                    session_id = %session_id,
                    chunk_index = index,
                    error = %e,
                    "Failed to remove consumed chunk"
                );
            }
        }

        let size = fs::metadata(&destination.path).await?.len() as i64;
        let mime_type = mime_guess::from_path(&destination.filename)
            .first_or_octet_stream()
            .to_string();

        let (asset, overwritten) = self
            .record(&destination, directory, &mime_type, size, catalog)
            .await
            .map_err(|e| {
                error!(
                    session_id = %session_id,
                    directory = %directory,
                    filename = %destination.filename,
                    error = %e,
                    "File published but catalog write failed"
                );
                e
            })?;

        info!(
            session_id = %session_id,
            asset_id = asset.id,
            directory = %directory,
            filename = %asset.filename,
            size,
            overwritten,
            "Published asset"
        );

        Ok(PublishResult {
            asset_id: asset.id,
            filename: asset.filename,
            size,
            mime_type,
            overwritten,
        })
    }

    /// Decide between overwriting a catalogued asset and publishing a new one.
    async fn resolve_destination(
        &self,
        original_filename: &str,
        directory: &AssetDir,
        catalog: &AssetRepository<'_>,
    ) -> Result<Destination> {
        let (base, ext) = split_filename(original_filename, FALLBACK_BASE_NAME);
        let intended = join_filename(&base, &ext);

        if let Some(existing) = catalog
            .get_by_directory_and_filename(directory, &intended)
            .await?
        {
            return Ok(Destination {
                filename: existing.filename.clone(),
                path: self.directories.asset_path(&existing),
                existing: Some(existing),
            });
        }

        let mut candidate = intended.clone();
        for attempt in 0..=self.max_name_probes {
            if attempt > 0 {
                candidate = join_filename(&format!("{base}_{}", attempt + 1), &ext);
            }

            let path = self.directories.file_path(directory, &candidate);
            if path.exists() {
                continue;
            }
            if catalog
                .get_by_directory_and_filename(directory, &candidate)
                .await?
                .is_some()
            {
                continue;
            }

            return Ok(Destination {
                filename: candidate,
                path,
                existing: None,
            });
        }

        Err(VaultError::NameExhausted {
            name: intended,
            attempts: self.max_name_probes,
        })
    }

    async fn record(
        &self,
        destination: &Destination,
        directory: &AssetDir,
        mime_type: &str,
        size: i64,
        catalog: &AssetRepository<'_>,
    ) -> Result<(Asset, bool)> {
        if let Some(existing) = &destination.existing {
            if let Some(updated) = catalog.update_metadata(existing.id, mime_type, size).await? {
                return Ok((updated, true));
            }
        }

        let new_asset = NewAsset::new(directory.clone(), &destination.filename, mime_type, size);
        match catalog.create(&new_asset).await {
            Ok(asset) => Ok((asset, false)),
            Err(e) => {
                // A concurrent assembly may have catalogued the same name first.
                match catalog
                    .get_by_directory_and_filename(directory, &destination.filename)
                    .await?
                {
                    Some(other) => {
                        let updated = catalog
                            .update_metadata(other.id, mime_type, size)
                            .await?
                            .unwrap_or(other);
                        Ok((updated, true))
                    }
                    None => Err(e),
                }
            }
        }
    }
}

/// Copy every fragment in index order into `output`.
async fn concatenate(staging: &Path, session_id: &str, total_chunks: u32, output: &Path) -> Result<()> {
    let mut out = fs::File::create(output).await?;

    for index in 0..total_chunks {
        let fragment = fragment_path(staging, session_id, index);
        let mut input = match fs::File::open(&fragment).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VaultError::MissingChunk {
                    session_id: session_id.to_string(),
                    index,
                });
            }
            Err(e) => return Err(e.into()),
        };
        tokio::io::copy(&mut input, &mut out).await?;
    }

    out.flush().await?;
    out.sync_all().await?;
    Ok(())
}

/// Best-effort removal of partial assembly output.
async fn discard_temp(temp: &Path, session_id: &str) {
    match fs::remove_file(temp).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            warn!(session_id = %session_id, error = %e, "Failed to remove partial assembly");
        }
    }
}

/// Rename `temp` onto `destination`, replacing it if the first rename fails.
async fn publish(temp: &Path, destination: &Path) -> Result<()> {
    let first = match fs::rename(temp, destination).await {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };

    if !fs::try_exists(destination).await.unwrap_or(false) {
        return Err(first.into());
    }

    replace_existing(temp, destination, first).await
}

/// Second publish attempt: remove the occupant of `destination`, then rename.
async fn replace_existing(temp: &Path, destination: &Path, first: std::io::Error) -> Result<()> {
    warn!(
        destination = %destination.display(),
        error = %first,
        "Rename onto existing file failed, replacing it"
    );
    fs::remove_file(destination).await?;
    fs::rename(temp, destination).await?;
    Ok(())
}
