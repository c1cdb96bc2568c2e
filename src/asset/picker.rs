//! Read-only asset picker used by the editing UI.
//!
//! Two modes: directory mode lists the subdirectories and files of one
//! directory, search mode matches file names across every directory.

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use super::catalog::{Asset, AssetFilter, AssetRepository};
use super::directory::DirectoryManager;
use super::path::AssetDir;
use crate::Result;

/// Page size when the client does not ask for one.
pub const DEFAULT_PICKER_LIMIT: i64 = 50;

/// Largest page a client may request.
pub const MAX_PICKER_LIMIT: i64 = 200;

/// Raw picker query parameters.
///
/// Numbers arrive as strings so that garbage falls back to defaults instead
/// of rejecting the whole request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PickerRequest {
    /// Search text; a non-blank value selects search mode.
    #[serde(default)]
    pub q: Option<String>,
    /// Directory to list in directory mode.
    #[serde(default)]
    pub dir: Option<String>,
    /// `all`, `images` or `other`.
    #[serde(default)]
    pub filter: Option<String>,
    /// Page size.
    #[serde(default)]
    pub limit: Option<String>,
    /// Page offset.
    #[serde(default)]
    pub offset: Option<String>,
}

impl PickerRequest {
    /// Trimmed search text, if any.
    pub fn search_query(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    /// Page size clamped to `[1, MAX_PICKER_LIMIT]`.
    pub fn limit(&self) -> i64 {
        clamp_limit(self.limit.as_deref().and_then(|l| l.trim().parse().ok()))
    }

    /// Offset clamped to `>= 0`.
    pub fn offset(&self) -> i64 {
        clamp_offset(self.offset.as_deref().and_then(|o| o.trim().parse().ok()))
    }

    /// Parsed filter.
    pub fn filter(&self) -> AssetFilter {
        self.filter
            .as_deref()
            .map(AssetFilter::parse)
            .unwrap_or_default()
    }
}

/// Clamp a requested page size.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_PICKER_LIMIT)
        .clamp(1, MAX_PICKER_LIMIT)
}

/// Clamp a requested offset.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

/// Which query produced a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PickerMode {
    /// One directory's contents.
    Directory,
    /// File name search across all directories.
    Search,
}

/// A subdirectory entry in directory mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickerDirectory {
    /// Last path segment.
    pub name: String,
    /// Full relative path.
    pub path: String,
}

/// A file entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickerItem {
    pub id: i64,
    pub filename: String,
    pub path: String,
    pub directory: String,
    pub mime: String,
    pub size: i64,
    pub created_at: String,
    pub url: String,
}

/// One picker response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickerPage {
    pub mode: PickerMode,
    pub search_query: String,
    pub directory: String,
    pub sub_directories: Vec<PickerDirectory>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub items: Vec<PickerItem>,
}

/// Picker over the catalog and the live directory tree.
pub struct AssetPicker<'a> {
    catalog: &'a AssetRepository<'a>,
    directories: &'a DirectoryManager,
    public_url_prefix: &'a str,
}

impl<'a> AssetPicker<'a> {
    /// Create a picker. Item URLs are `public_url_prefix` followed by the asset path.
    pub fn new(
        catalog: &'a AssetRepository<'a>,
        directories: &'a DirectoryManager,
        public_url_prefix: &'a str,
    ) -> Self {
        Self {
            catalog,
            directories,
            public_url_prefix,
        }
    }

    /// Run a picker request, choosing the mode from `q`.
    ///
    /// In search mode `dir` is ignored.
    pub async fn query(&self, request: &PickerRequest) -> Result<PickerPage> {
        let limit = request.limit();
        let offset = request.offset();
        let filter = request.filter();

        match request.search_query() {
            Some(q) => self.search(q, limit, offset, filter).await,
            None => {
                let directory = AssetDir::parse(request.dir.as_deref().unwrap_or(""))?;
                self.list(&directory, limit, offset, filter).await
            }
        }
    }

    /// Directory mode: subdirectories of `directory` plus one page of its files.
    pub async fn list(
        &self,
        directory: &AssetDir,
        limit: i64,
        offset: i64,
        filter: AssetFilter,
    ) -> Result<PickerPage> {
        let limit = clamp_limit(Some(limit));
        let offset = clamp_offset(Some(offset));

        let catalog_dirs = self.catalog.list_distinct_directories().await?;
        let sub_directories = self
            .directories
            .merged_children(directory, &catalog_dirs)?
            .into_iter()
            .filter_map(|child| {
                child.name().map(|name| PickerDirectory {
                    name: name.to_string(),
                    path: child.as_string(),
                })
            })
            .collect();

        let page = self
            .catalog
            .paged_by_directory(directory, limit, offset, filter)
            .await?;

        Ok(PickerPage {
            mode: PickerMode::Directory,
            search_query: String::new(),
            directory: directory.as_string(),
            sub_directories,
            total: page.total,
            limit,
            offset,
            items: page.items.iter().map(|a| self.item(a)).collect(),
        })
    }

    /// Search mode: files from every directory whose name contains `query`.
    pub async fn search(
        &self,
        query: &str,
        limit: i64,
        offset: i64,
        filter: AssetFilter,
    ) -> Result<PickerPage> {
        let limit = clamp_limit(Some(limit));
        let offset = clamp_offset(Some(offset));
        let query = query.trim();

        let page = self.catalog.search(query, limit, offset, filter).await?;

        Ok(PickerPage {
            mode: PickerMode::Search,
            search_query: query.to_string(),
            directory: String::new(),
            sub_directories: Vec::new(),
            total: page.total,
            limit,
            offset,
            items: page.items.iter().map(|a| self.item(a)).collect(),
        })
    }

    /// Public URL of an asset.
    pub fn public_url(&self, asset: &Asset) -> String {
        if self.public_url_prefix.is_empty() || self.public_url_prefix.ends_with('/') {
            format!("{}{}", self.public_url_prefix, asset.path)
        } else {
            format!("{}/{}", self.public_url_prefix, asset.path)
        }
    }

    fn item(&self, asset: &Asset) -> PickerItem {
        PickerItem {
            id: asset.id,
            filename: asset.filename.clone(),
            path: asset.path.clone(),
            directory: asset.directory.clone(),
            mime: asset.mime_type.clone(),
            size: asset.size,
            created_at: asset
                .created_at_datetime()
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            url: self.public_url(asset),
        }
    }
}
