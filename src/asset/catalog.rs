//! Asset metadata types and the catalog repository.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::path::AssetDir;
use crate::{Result, VaultError};

/// A published asset.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Asset {
    /// Stable asset ID.
    pub id: i64,
    /// Final on-disk file name.
    pub filename: String,
    /// Path relative to the upload root, unique.
    pub path: String,
    /// Parent directory (`""` for the root).
    pub directory: String,
    /// Detected MIME type.
    pub mime_type: String,
    /// File size in bytes.
    pub size: i64,
    /// When the asset was first published.
    pub created_at: String,
}

impl Asset {
    /// Get the created_at as DateTime<Utc>.
    pub fn created_at_datetime(&self) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(&format!("{}Z", self.created_at.replace(' ', "T")))
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }
}

/// Data for creating a new asset row.
#[derive(Debug, Clone)]
pub struct NewAsset {
    /// Parent directory.
    pub directory: AssetDir,
    /// Final file name.
    pub filename: String,
    /// Detected MIME type.
    pub mime_type: String,
    /// File size in bytes.
    pub size: i64,
}

impl NewAsset {
    /// Create a new NewAsset.
    pub fn new(
        directory: AssetDir,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        size: i64,
    ) -> Self {
        Self {
            directory,
            filename: filename.into(),
            mime_type: mime_type.into(),
            size,
        }
    }

    /// Catalog path of the new asset.
    pub fn path(&self) -> String {
        self.directory.file_path(&self.filename)
    }
}

/// MIME-type filter for listings and searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetFilter {
    /// Every asset.
    #[default]
    All,
    /// `image/*` only.
    Images,
    /// Everything except `image/*`.
    Other,
}

impl AssetFilter {
    /// Parse a filter name, falling back to [`AssetFilter::All`].
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "images" | "image" => AssetFilter::Images,
            "other" => AssetFilter::Other,
            _ => AssetFilter::All,
        }
    }

    /// Name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetFilter::All => "all",
            AssetFilter::Images => "images",
            AssetFilter::Other => "other",
        }
    }

    fn push_condition(&self, query: &mut QueryBuilder<'_, Sqlite>) {
        match self {
            AssetFilter::All => {}
            AssetFilter::Images => {
                query.push(" AND mime_type LIKE 'image/%'");
            }
            AssetFilter::Other => {
                query.push(" AND mime_type NOT LIKE 'image/%'");
            }
        }
    }
}

/// One page of assets plus the unpaged total.
#[derive(Debug, Clone, Default)]
pub struct AssetPage {
    /// Assets on this page.
    pub items: Vec<Asset>,
    /// Total matching assets.
    pub total: i64,
}

/// Escape `%`, `_` and `\` for use in a LIKE pattern with `ESCAPE '\'`.
fn escape_like(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

const ASSET_COLUMNS: &str = "id, filename, path, directory, mime_type, size, created_at";

/// Repository for asset catalog operations.
///
/// The catalog handle is passed explicitly to every component that needs it.
pub struct AssetRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AssetRepository<'a> {
    /// Create a new AssetRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new asset row.
    pub async fn create(&self, asset: &NewAsset) -> Result<Asset> {
        let result = sqlx::query(
            "INSERT INTO assets (filename, path, directory, mime_type, size)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&asset.filename)
        .bind(asset.path())
        .bind(asset.directory.as_string())
        .bind(&asset.mime_type)
        .bind(asset.size)
        .execute(self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| VaultError::NotFound(format!("asset {id}")))
    }

    /// Get an asset by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Asset>> {
        let asset = sqlx::query_as::<_, Asset>(&format!(
            "SELECT {ASSET_COLUMNS} FROM assets WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(asset)
    }

    /// Get the asset stored under `filename` in `directory`.
    pub async fn get_by_directory_and_filename(
        &self,
        directory: &AssetDir,
        filename: &str,
    ) -> Result<Option<Asset>> {
        let asset = sqlx::query_as::<_, Asset>(&format!(
            "SELECT {ASSET_COLUMNS} FROM assets WHERE directory = ? AND filename = ?"
        ))
        .bind(directory.as_string())
        .bind(filename)
        .fetch_optional(self.pool)
        .await?;

        Ok(asset)
    }

    /// Update MIME type and size after an overwrite.
    pub async fn update_metadata(&self, id: i64, mime_type: &str, size: i64) -> Result<Option<Asset>> {
        let result = sqlx::query("UPDATE assets SET mime_type = ?, size = ? WHERE id = ?")
            .bind(mime_type)
            .bind(size)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// Move a single asset to another directory, keeping its file name.
    pub async fn update_path(&self, id: i64, directory: &AssetDir) -> Result<Option<Asset>> {
        let Some(asset) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        sqlx::query("UPDATE assets SET directory = ?, path = ? WHERE id = ?")
            .bind(directory.as_string())
            .bind(directory.file_path(&asset.filename))
            .bind(id)
            .execute(self.pool)
            .await?;

        self.get_by_id(id).await
    }

    /// Rewrite `directory` and `path` of every asset in `old` or below it.
    ///
    /// Runs as one statement inside one transaction: either every affected
    /// row moves to the `new` prefix or none does. Returns the number of rows
    /// rewritten.
    pub async fn rename_directory_prefix(&self, old: &AssetDir, new: &AssetDir) -> Result<u64> {
        if old.is_root() {
            return Err(VaultError::InvalidRequest(
                "the upload root cannot be renamed".to_string(),
            ));
        }

        let old_prefix = old.as_string();
        let new_prefix = new.as_string();
        let old_len = old_prefix.chars().count() as i64;

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE assets
             SET directory = ? || substr(directory, ? + 1),
                 path = ? || substr(path, ? + 1)
             WHERE directory = ? OR substr(directory, 1, ? + 1) = ? || '/'",
        )
        .bind(&new_prefix)
        .bind(old_len)
        .bind(&new_prefix)
        .bind(old_len)
        .bind(&old_prefix)
        .bind(old_len)
        .bind(&old_prefix)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(result.rows_affected())
    }

    /// Delete an asset row by ID.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM assets WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Every asset directly inside `directory` (not recursive).
    pub async fn list_by_directory(&self, directory: &AssetDir) -> Result<Vec<Asset>> {
        let assets = sqlx::query_as::<_, Asset>(&format!(
            "SELECT {ASSET_COLUMNS} FROM assets WHERE directory = ?
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(directory.as_string())
        .fetch_all(self.pool)
        .await?;

        Ok(assets)
    }

    /// Case-insensitive filename substring search across every directory.
    pub async fn search(
        &self,
        query: &str,
        limit: i64,
        offset: i64,
        filter: AssetFilter,
    ) -> Result<AssetPage> {
        let pattern = format!("%{}%", escape_like(&query.to_lowercase()));

        let mut count: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM assets WHERE lower(filename) LIKE ");
        count.push_bind(pattern.clone());
        count.push(" ESCAPE '\\'");
        filter.push_condition(&mut count);

        let total: (i64,) = count.build_query_as().fetch_one(self.pool).await?;

        let mut select: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {ASSET_COLUMNS} FROM assets WHERE lower(filename) LIKE "
        ));
        select.push_bind(pattern);
        select.push(" ESCAPE '\\'");
        filter.push_condition(&mut select);
        select.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        select.push_bind(limit);
        select.push(" OFFSET ");
        select.push_bind(offset);

        let items = select.build_query_as::<Asset>().fetch_all(self.pool).await?;

        Ok(AssetPage {
            items,
            total: total.0,
        })
    }

    /// One page of the assets directly inside `directory`.
    pub async fn paged_by_directory(
        &self,
        directory: &AssetDir,
        limit: i64,
        offset: i64,
        filter: AssetFilter,
    ) -> Result<AssetPage> {
        let dir = directory.as_string();

        let mut count: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM assets WHERE directory = ");
        count.push_bind(dir.clone());
        filter.push_condition(&mut count);

        let total: (i64,) = count.build_query_as().fetch_one(self.pool).await?;

        let mut select: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {ASSET_COLUMNS} FROM assets WHERE directory = "
        ));
        select.push_bind(dir);
        filter.push_condition(&mut select);
        select.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        select.push_bind(limit);
        select.push(" OFFSET ");
        select.push_bind(offset);

        let items = select.build_query_as::<Asset>().fetch_all(self.pool).await?;

        Ok(AssetPage {
            items,
            total: total.0,
        })
    }

    /// Every distinct non-root directory referenced by an asset, sorted.
    pub async fn list_distinct_directories(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT directory FROM assets WHERE directory != '' ORDER BY directory",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(|(d,)| d).collect())
    }
}
