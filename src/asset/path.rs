//! Path sanitization and validated path types.
//!
//! Every user-supplied directory or file name passes through this module
//! before it reaches the filesystem or the catalog. [`PathSegment`] and
//! [`AssetDir`] can only be built through validation, so code holding one
//! never needs to re-check it.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::{Result, VaultError};

/// Name of the reserved directory holding in-flight upload fragments.
pub const STAGING_DIR_NAME: &str = "_chunks";

/// Maximum length of a single directory segment.
pub const MAX_SEGMENT_LENGTH: usize = 100;

/// Maximum nesting depth of an asset directory.
pub const MAX_DIRECTORY_DEPTH: usize = 16;

fn is_segment_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn is_name_char(c: char) -> bool {
    is_segment_char(c) || c == '.'
}

/// Normalize a raw directory string.
///
/// Removes `..` sequences and backslashes, collapses repeated separators and
/// trims leading/trailing `/`. An empty result denotes the upload root. The
/// output is not yet validated; use [`AssetDir::parse`] for that.
pub fn sanitize_directory(raw: &str) -> String {
    let cleaned = raw.replace('\\', "").replace("..", "");
    cleaned
        .split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Replace every character outside `[A-Za-z0-9._-]` with `_`.
///
/// Leading dots are dropped so a name can never become hidden. If nothing
/// usable remains, `fallback` is returned.
pub fn sanitize_name(raw: &str, fallback: &str) -> String {
    let replaced: String = raw
        .trim()
        .chars()
        .map(|c| if is_name_char(c) { c } else { '_' })
        .collect();
    let trimmed = replaced.trim_start_matches('.');

    if trimmed.is_empty() || trimmed.chars().all(|c| c == '_') {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Reduce a client-generated upload identifier to `[A-Za-z0-9_-]`.
pub fn sanitize_token(raw: &str) -> String {
    raw.chars()
        .filter(|c| is_segment_char(*c))
        .take(MAX_SEGMENT_LENGTH)
        .collect()
}

/// Case-insensitive check against the staging directory name.
pub fn is_reserved_name(name: &str) -> bool {
    name.eq_ignore_ascii_case(STAGING_DIR_NAME)
}

/// Split a client file name into a sanitized base and extension.
///
/// The extension is lowercased and restricted to ASCII alphanumerics; the
/// base falls back to `fallback` when nothing usable remains.
pub fn split_filename(original: &str, fallback: &str) -> (String, String) {
    // Browsers on some platforms send the full client path.
    let name = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original)
        .trim();

    let (base, ext) = match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], &name[pos + 1..]),
        _ => (name, ""),
    };

    let ext: String = ext
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();

    let mut base = sanitize_name(base, fallback);
    if is_reserved_name(&base) {
        base = format!("{base}_file");
    }

    (base, ext)
}

/// Join a base and extension into a file name.
pub fn join_filename(base: &str, ext: &str) -> String {
    if ext.is_empty() {
        base.to_string()
    } else {
        format!("{base}.{ext}")
    }
}

/// A single validated directory name.
///
/// Matches `[A-Za-z0-9_-]+`, is at most [`MAX_SEGMENT_LENGTH`] characters and
/// is never the staging directory name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSegment(String);

impl PathSegment {
    /// Validate a directory name.
    pub fn new(raw: &str) -> Result<Self> {
        let name = raw.trim();

        if name.is_empty() {
            return Err(VaultError::InvalidRequest(
                "directory name must not be empty".to_string(),
            ));
        }
        if name.len() > MAX_SEGMENT_LENGTH {
            return Err(VaultError::InvalidRequest(format!(
                "directory name must be at most {MAX_SEGMENT_LENGTH} characters"
            )));
        }
        if !name.chars().all(is_segment_char) {
            return Err(VaultError::InvalidRequest(format!(
                "directory name {name:?} may only contain letters, digits, '_' and '-'"
            )));
        }
        if is_reserved_name(name) {
            return Err(VaultError::InvalidRequest(format!(
                "directory name {name:?} is reserved"
            )));
        }

        Ok(Self(name.to_string()))
    }

    /// The segment as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated directory relative to the upload root.
///
/// The root is represented by the empty path. Every segment is a valid
/// [`PathSegment`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct AssetDir {
    segments: Vec<PathSegment>,
}

impl AssetDir {
    /// The upload root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Sanitize and validate a raw directory string.
    pub fn parse(raw: &str) -> Result<Self> {
        let sanitized = sanitize_directory(raw);
        if sanitized.is_empty() {
            return Ok(Self::root());
        }

        let segments = sanitized
            .split('/')
            .map(PathSegment::new)
            .collect::<Result<Vec<_>>>()?;

        if segments.len() > MAX_DIRECTORY_DEPTH {
            return Err(VaultError::InvalidRequest(format!(
                "directory nesting exceeds {MAX_DIRECTORY_DEPTH} levels"
            )));
        }

        Ok(Self { segments })
    }

    /// Whether this is the upload root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Child directory.
    pub fn join(&self, segment: &PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.clone());
        Self { segments }
    }

    /// Parent directory, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(Self { segments })
    }

    /// Last segment, or `None` at the root.
    pub fn name(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Whether `self` equals `ancestor` or is nested below it.
    pub fn is_within(&self, ancestor: &AssetDir) -> bool {
        self.segments.starts_with(&ancestor.segments)
    }

    /// The relative path as stored in the catalog (`""` for the root).
    pub fn as_string(&self) -> String {
        self.segments
            .iter()
            .map(PathSegment::as_str)
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Catalog path of a file inside this directory.
    pub fn file_path(&self, filename: &str) -> String {
        if self.is_root() {
            filename.to_string()
        } else {
            format!("{}/{}", self.as_string(), filename)
        }
    }

    /// Absolute location of this directory under `root`.
    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        self.segments
            .iter()
            .fold(root.to_path_buf(), |path, segment| path.join(segment.as_str()))
    }
}

impl fmt::Display for AssetDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("/")
        } else {
            f.write_str(&self.as_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_directory_strips_traversal() {
        assert_eq!(sanitize_directory("../../etc"), "etc");
        assert_eq!(sanitize_directory("a/../b"), "a/b");
        assert_eq!(sanitize_directory("a\\b"), "ab");
    }

    #[test]
    fn test_sanitize_directory_trims_separators() {
        assert_eq!(sanitize_directory("/images/logos/"), "images/logos");
        assert_eq!(sanitize_directory("a//b///c"), "a/b/c");
        assert_eq!(sanitize_directory(""), "");
        assert_eq!(sanitize_directory("///"), "");
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("my photo.png", "file"), "my_photo.png");
        assert_eq!(sanitize_name("résumé", "file"), "r_sum_");
        assert_eq!(sanitize_name("...hidden", "file"), "hidden");
        assert_eq!(sanitize_name("", "file"), "file");
        assert_eq!(sanitize_name("???", "file"), "file");
    }

    #[test]
    fn test_sanitize_token() {
        assert_eq!(sanitize_token("f1"), "f1");
        assert_eq!(sanitize_token("../../evil"), "evil");
        assert_eq!(sanitize_token("abc-123_XYZ"), "abc-123_XYZ");
        assert_eq!(sanitize_token("!!!"), "");
    }

    #[test]
    fn test_is_reserved_name() {
        assert!(is_reserved_name("_chunks"));
        assert!(is_reserved_name("_CHUNKS"));
        assert!(!is_reserved_name("chunks"));
    }

    #[test]
    fn test_split_filename() {
        assert_eq!(
            split_filename("pic.png", "file"),
            ("pic".to_string(), "png".to_string())
        );
        assert_eq!(
            split_filename("Report Final.PDF", "file"),
            ("Report_Final".to_string(), "pdf".to_string())
        );
        assert_eq!(
            split_filename("archive.tar.gz", "file"),
            ("archive.tar".to_string(), "gz".to_string())
        );
        assert_eq!(
            split_filename("README", "file"),
            ("README".to_string(), String::new())
        );
        assert_eq!(
            split_filename(".png", "file"),
            ("png".to_string(), String::new())
        );
        assert_eq!(
            split_filename("日本語.txt", "file"),
            ("file".to_string(), "txt".to_string())
        );
        assert_eq!(
            split_filename("C:\\Users\\me\\cat.jpg", "file"),
            ("cat".to_string(), "jpg".to_string())
        );
    }

    #[test]
    fn test_split_filename_reserved_base() {
        let (base, ext) = split_filename("_chunks", "file");
        assert_eq!(base, "_chunks_file");
        assert!(ext.is_empty());
    }

    #[test]
    fn test_join_filename() {
        assert_eq!(join_filename("pic", "png"), "pic.png");
        assert_eq!(join_filename("README", ""), "README");
    }

    #[test]
    fn test_path_segment_validation() {
        assert!(PathSegment::new("logos").is_ok());
        assert!(PathSegment::new("2024_q1-final").is_ok());
        assert!(PathSegment::new("").is_err());
        assert!(PathSegment::new("with space").is_err());
        assert!(PathSegment::new("a.b").is_err());
        assert!(PathSegment::new("_Chunks").is_err());
        assert!(PathSegment::new(&"x".repeat(MAX_SEGMENT_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_asset_dir_parse() {
        let dir = AssetDir::parse("/images//logos/").unwrap();
        assert_eq!(dir.as_string(), "images/logos");
        assert_eq!(dir.depth(), 2);
        assert_eq!(dir.name().unwrap().as_str(), "logos");

        assert!(AssetDir::parse("").unwrap().is_root());
        assert!(AssetDir::parse("../..").unwrap().is_root());
    }

    #[test]
    fn test_asset_dir_rejects_reserved_at_any_depth() {
        assert!(AssetDir::parse("_chunks").is_err());
        assert!(AssetDir::parse("a/_chunks/b").is_err());
        assert!(AssetDir::parse("a/b c").is_err());
    }

    #[test]
    fn test_asset_dir_depth_limit() {
        let deep = vec!["d"; MAX_DIRECTORY_DEPTH + 1].join("/");
        assert!(AssetDir::parse(&deep).is_err());
    }

    #[test]
    fn test_asset_dir_navigation() {
        let dir = AssetDir::parse("a/b").unwrap();
        let child = dir.join(&PathSegment::new("sub").unwrap());

        assert_eq!(child.as_string(), "a/b/sub");
        assert_eq!(child.parent().unwrap(), dir);
        assert!(child.is_within(&dir));
        assert!(child.is_within(&AssetDir::root()));
        assert!(!dir.is_within(&child));
        assert!(!AssetDir::parse("a/bc").unwrap().is_within(&dir));
        assert!(AssetDir::root().parent().is_none());
    }

    #[test]
    fn test_asset_dir_file_path() {
        assert_eq!(AssetDir::root().file_path("pic.png"), "pic.png");
        assert_eq!(
            AssetDir::parse("a/b").unwrap().file_path("pic.png"),
            "a/b/pic.png"
        );
    }

    #[test]
    fn test_asset_dir_fs_path() {
        let root = Path::new("/srv/uploads");
        assert_eq!(AssetDir::root().to_fs_path(root), root);
        assert_eq!(
            AssetDir::parse("a/b").unwrap().to_fs_path(root),
            root.join("a").join("b")
        );
    }
}
