//! Asset upload pipeline and catalog.
//!
//! This module provides:
//! - Path sanitization and validated directory types
//! - The SQLite-backed asset catalog
//! - Directory management under the upload root
//! - Chunk staging and assembly
//! - The read-only picker used by the editor

pub mod assembler;
pub mod catalog;
pub mod chunk;
pub mod directory;
pub mod path;
pub mod picker;

pub use assembler::{Assembler, PublishResult};
pub use catalog::{Asset, AssetFilter, AssetPage, AssetRepository, NewAsset};
pub use chunk::{ChunkReceipt, ChunkReceiver, ChunkUpload};
pub use directory::{natural_cmp, DirectoryManager};
pub use path::{
    is_reserved_name, sanitize_directory, sanitize_name, sanitize_token, AssetDir, PathSegment,
    STAGING_DIR_NAME,
};
pub use picker::{
    AssetPicker, PickerDirectory, PickerItem, PickerMode, PickerPage, PickerRequest,
    DEFAULT_PICKER_LIMIT, MAX_PICKER_LIMIT,
};

/// Base name used when nothing usable survives file name sanitization.
pub const FALLBACK_BASE_NAME: &str = "file";
