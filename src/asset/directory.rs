//! Physical directory hierarchy under the upload root.
//!
//! Directories are never persisted on their own. A directory exists either as
//! a folder on disk or as the `directory` value of some catalog row, and the
//! listings here merge both views. Structural changes that touch both stores
//! (rename, asset move) change the filesystem first and report
//! [`VaultError::PartialInconsistency`] if the catalog update then fails.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use super::catalog::{Asset, AssetRepository};
use super::path::{AssetDir, PathSegment, STAGING_DIR_NAME};
use crate::{Result, VaultError};

/// Compare two names case-insensitively, ordering digit runs by value.
///
/// `img2` sorts before `img10`, and `Docs` next to `docs`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let mut l_num = String::new();
                while let Some(c) = left.peek().copied().filter(char::is_ascii_digit) {
                    l_num.push(c);
                    left.next();
                }
                let mut r_num = String::new();
                while let Some(c) = right.peek().copied().filter(char::is_ascii_digit) {
                    r_num.push(c);
                    right.next();
                }

                let l_trim = l_num.trim_start_matches('0');
                let r_trim = r_num.trim_start_matches('0');
                let ord = l_trim
                    .len()
                    .cmp(&r_trim.len())
                    .then_with(|| l_trim.cmp(r_trim));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(l), Some(r)) => {
                let ord = l.to_ascii_lowercase().cmp(&r.to_ascii_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn sort_dirs(dirs: &mut [AssetDir]) {
    dirs.sort_by(|a, b| natural_cmp(&a.as_string(), &b.as_string()));
}

/// Filesystem operations on the asset directory tree.
#[derive(Debug, Clone)]
pub struct DirectoryManager {
    /// Upload root. Every published asset lives below it.
    root: PathBuf,
}

impl DirectoryManager {
    /// Create a manager for `root`, creating the root and staging directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(STAGING_DIR_NAME))?;

        Ok(Self { root })
    }

    /// The upload root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reserved directory holding fragments and temporary assembly output.
    ///
    /// Lives under the upload root so publishing is a same-filesystem rename.
    pub fn staging_dir(&self) -> PathBuf {
        self.root.join(STAGING_DIR_NAME)
    }

    /// Absolute path of a directory.
    pub fn dir_path(&self, dir: &AssetDir) -> PathBuf {
        dir.to_fs_path(&self.root)
    }

    /// Absolute path of a file inside a directory.
    pub fn file_path(&self, dir: &AssetDir, filename: &str) -> PathBuf {
        self.dir_path(dir).join(filename)
    }

    /// Absolute path of an asset's file.
    pub fn asset_path(&self, asset: &Asset) -> PathBuf {
        self.root.join(&asset.path)
    }

    /// Whether the directory exists on disk.
    pub fn exists(&self, dir: &AssetDir) -> bool {
        self.dir_path(dir).is_dir()
    }

    /// Create the directory and its missing ancestors if needed.
    pub fn ensure_dir(&self, dir: &AssetDir) -> Result<PathBuf> {
        let path = self.dir_path(dir);
        fs::create_dir_all(&path)?;
        Ok(path)
    }

    /// Subdirectories of `dir`, one level deep, in natural order.
    ///
    /// The staging directory and names that are not valid path segments are
    /// skipped. A missing directory has no children.
    pub fn list_immediate_children(&self, dir: &AssetDir) -> Result<Vec<AssetDir>> {
        let entries = match fs::read_dir(self.dir_path(dir)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut children = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            // PathSegment rejects the staging name along with anything unaddressable.
            if let Ok(segment) = PathSegment::new(&name) {
                children.push(dir.join(&segment));
            }
        }

        sort_dirs(&mut children);
        Ok(children)
    }

    /// Every directory below the root, pre-order.
    pub fn collect_all_descendants(&self) -> Result<Vec<AssetDir>> {
        let mut out = Vec::new();
        self.collect_into(&AssetDir::root(), &mut out)?;
        Ok(out)
    }

    fn collect_into(&self, dir: &AssetDir, out: &mut Vec<AssetDir>) -> Result<()> {
        for child in self.list_immediate_children(dir)? {
            out.push(child.clone());
            self.collect_into(&child, out)?;
        }
        Ok(())
    }

    /// Create `name` inside `parent`.
    pub fn create(&self, parent: &AssetDir, name: &str) -> Result<AssetDir> {
        let segment = PathSegment::new(name)?;
        let target = parent.join(&segment);
        let path = self.dir_path(&target);

        fs::create_dir_all(self.dir_path(parent))?;
        // The leaf is created exactly once, so concurrent creates race here.
        match fs::create_dir(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(VaultError::Conflict(format!("directory {target}")));
            }
            Err(e) => return Err(e.into()),
        }
        info!(directory = %target, "Created directory");

        Ok(target)
    }

    /// Rename `current` to `new_name` within the same parent.
    ///
    /// The folder is renamed first, then every catalog row in or below it is
    /// rewritten in one transaction.
    pub async fn rename(
        &self,
        current: &AssetDir,
        new_name: &str,
        catalog: &AssetRepository<'_>,
    ) -> Result<AssetDir> {
        let Some(parent) = current.parent() else {
            return Err(VaultError::InvalidRequest(
                "the upload root cannot be renamed".to_string(),
            ));
        };
        let segment = PathSegment::new(new_name)?;
        let target = parent.join(&segment);

        let from = self.dir_path(current);
        let to = self.dir_path(&target);

        if !from.is_dir() {
            return Err(VaultError::NotFound(format!("directory {current}")));
        }
        if to.exists() {
            return Err(VaultError::Conflict(format!("directory {target}")));
        }

        fs::rename(&from, &to)?;

        match catalog.rename_directory_prefix(current, &target).await {
            Ok(rows) => {
                info!(
                    directory = %current,
                    new_directory = %target,
                    rows,
                    "Renamed directory"
                );
                Ok(target)
            }
            Err(e) => {
                error!(
                    directory = %current,
                    new_directory = %target,
                    error = %e,
                    "Directory renamed on disk but catalog rewrite failed"
                );
                Err(VaultError::PartialInconsistency(format!(
                    "directory {current} renamed to {target} on disk, catalog not updated: {e}"
                )))
            }
        }
    }

    /// Remove an empty directory.
    pub fn delete(&self, dir: &AssetDir) -> Result<()> {
        if dir.is_root() {
            return Err(VaultError::InvalidRequest(
                "the upload root cannot be deleted".to_string(),
            ));
        }

        let path = self.dir_path(dir);
        if !path.is_dir() {
            return Err(VaultError::NotFound(format!("directory {dir}")));
        }
        if has_entries(&path)? {
            return Err(VaultError::NotEmpty(dir.to_string()));
        }

        // remove_dir refuses a directory that gained an entry since the check.
        match fs::remove_dir(&path) {
            Ok(()) => {
                info!(directory = %dir, "Deleted directory");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(VaultError::NotFound(format!("directory {dir}")))
            }
            Err(e) => {
                if has_entries(&path).unwrap_or(false) {
                    Err(VaultError::NotEmpty(dir.to_string()))
                } else {
                    Err(e.into())
                }
            }
        }
    }

    /// Immediate subdirectories of `dir` from disk and from catalog rows.
    ///
    /// `catalog_dirs` is the output of
    /// [`AssetRepository::list_distinct_directories`]. Catalog values that no
    /// longer parse are ignored.
    pub fn merged_children(&self, dir: &AssetDir, catalog_dirs: &[String]) -> Result<Vec<AssetDir>> {
        let mut children: BTreeSet<String> = self
            .list_immediate_children(dir)?
            .iter()
            .map(AssetDir::as_string)
            .collect();

        let depth = dir.depth();
        for raw in catalog_dirs {
            let Ok(catalog_dir) = AssetDir::parse(raw) else {
                continue;
            };
            if catalog_dir.depth() <= depth || !catalog_dir.is_within(dir) {
                continue;
            }
            let mut child = catalog_dir;
            while child.depth() > depth + 1 {
                match child.parent() {
                    Some(parent) => child = parent,
                    None => break,
                }
            }
            children.insert(child.as_string());
        }

        let mut merged = children
            .iter()
            .map(|d| AssetDir::parse(d))
            .collect::<Result<Vec<_>>>()?;
        sort_dirs(&mut merged);
        Ok(merged)
    }

    /// Every known directory from disk and catalog, in natural order.
    pub fn merged_tree(&self, catalog_dirs: &[String]) -> Result<Vec<AssetDir>> {
        let mut all: BTreeSet<String> = self
            .collect_all_descendants()?
            .iter()
            .map(AssetDir::as_string)
            .collect();

        for raw in catalog_dirs {
            let Ok(mut dir) = AssetDir::parse(raw) else {
                continue;
            };
            // Catalog rows imply their ancestors too.
            while !dir.is_root() {
                all.insert(dir.as_string());
                match dir.parent() {
                    Some(parent) => dir = parent,
                    None => break,
                }
            }
        }

        let mut merged = all
            .iter()
            .map(|d| AssetDir::parse(d))
            .collect::<Result<Vec<_>>>()?;
        sort_dirs(&mut merged);
        Ok(merged)
    }

    /// Move an asset's file into `target` and update its catalog row.
    pub async fn move_asset(
        &self,
        asset: &Asset,
        target: &AssetDir,
        catalog: &AssetRepository<'_>,
    ) -> Result<Asset> {
        if asset.directory == target.as_string() {
            return Ok(asset.clone());
        }

        let from = self.asset_path(asset);
        if !from.is_file() {
            return Err(VaultError::NotFound(format!("file {}", asset.path)));
        }

        let to = self.file_path(target, &asset.filename);
        if to.exists()
            || catalog
                .get_by_directory_and_filename(target, &asset.filename)
                .await?
                .is_some()
        {
            return Err(VaultError::Conflict(target.file_path(&asset.filename)));
        }

        self.ensure_dir(target)?;
        fs::rename(&from, &to)?;

        match catalog.update_path(asset.id, target).await {
            Ok(Some(moved)) => {
                info!(asset_id = asset.id, directory = %target, "Moved asset");
                Ok(moved)
            }
            Ok(None) => {
                error!(asset_id = asset.id, "Asset row vanished during move");
                Err(VaultError::PartialInconsistency(format!(
                    "asset {} moved on disk but its catalog row is gone",
                    asset.id
                )))
            }
            Err(e) => {
                error!(
                    asset_id = asset.id,
                    directory = %target,
                    error = %e,
                    "Asset moved on disk but catalog update failed"
                );
                Err(VaultError::PartialInconsistency(format!(
                    "asset {} moved to {} on disk, catalog not updated: {e}",
                    asset.id,
                    target.file_path(&asset.filename)
                )))
            }
        }
    }

    /// Delete an asset: the catalog row first, then the file.
    ///
    /// A file that is already gone is not an error.
    pub async fn delete_asset(&self, asset: &Asset, catalog: &AssetRepository<'_>) -> Result<()> {
        if !catalog.delete(asset.id).await? {
            return Err(VaultError::NotFound(format!("asset {}", asset.id)));
        }

        match fs::remove_file(self.asset_path(asset)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(asset_id = asset.id, path = %asset.path, "Asset file was already missing");
            }
            Err(e) => return Err(e.into()),
        }

        info!(asset_id = asset.id, path = %asset.path, "Deleted asset");
        Ok(())
    }
}

fn has_entries(path: &Path) -> Result<bool> {
    Ok(fs::read_dir(path)?.next().is_some())
}
