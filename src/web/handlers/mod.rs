//! API handlers for the asset admin endpoints.

pub mod asset;
pub mod directory;
pub mod picker;
pub mod upload;

pub use asset::*;
pub use directory::*;
pub use picker::*;
pub use upload::*;

use std::sync::Arc;

use axum::response::Redirect;

use crate::asset::{Assembler, ChunkReceiver, DirectoryManager};
use crate::config::UploadsConfig;
use crate::{Database, Result};

/// Shared database handle.
pub type SharedDatabase = Arc<Database>;

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// Catalog database.
    pub db: SharedDatabase,
    /// Directory tree under the upload root.
    pub directories: DirectoryManager,
    /// Fragment staging.
    pub receiver: ChunkReceiver,
    /// Fragment assembly.
    pub assembler: Assembler,
    /// Prefix of public asset URLs.
    pub public_url_prefix: String,
    /// Largest accepted chunk in bytes.
    pub max_chunk_bytes: usize,
}

impl AppState {
    /// Create a new application state, creating the upload root if needed.
    pub fn new(db: SharedDatabase, uploads: &UploadsConfig) -> Result<Self> {
        let directories = DirectoryManager::new(&uploads.root)?;
        let max_chunk_bytes = uploads.max_chunk_bytes();
        let receiver = ChunkReceiver::new(
            directories.staging_dir(),
            max_chunk_bytes,
            uploads.max_chunks,
        );
        let assembler = Assembler::new(directories.clone(), uploads.max_name_probes);

        tracing::info!("Asset storage initialized at: {}", uploads.root);

        Ok(Self {
            db,
            directories,
            receiver,
            assembler,
            public_url_prefix: uploads.public_url_prefix.clone(),
            max_chunk_bytes,
        })
    }
}

/// Redirect back to the asset manager showing `dir`.
pub(crate) fn redirect_to_dir(dir: &str) -> Redirect {
    Redirect::to(&format!("/admin/assets?dir={}", urlencoding::encode(dir)))
}
