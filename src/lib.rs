//! assetvault - chunked asset uploads and a filesystem-backed asset catalog.
//!
//! Large files arrive in fragments, are assembled in a staging area under the
//! upload root and published with an atomic rename. Published files are
//! recorded in a SQLite catalog, organized in a directory tree that is kept
//! consistent with the catalog, and exposed to the content editor through a
//! paginated picker.

pub mod asset;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod web;

pub use asset::{
    Assembler, Asset, AssetDir, AssetFilter, AssetPage, AssetPicker, AssetRepository,
    ChunkReceipt, ChunkReceiver, ChunkUpload, DirectoryManager, NewAsset, PathSegment,
    PickerPage, PickerRequest, PublishResult,
};
pub use config::Config;
pub use db::Database;
pub use error::{Result, VaultError};
