//! File-based cache implementation.
//!
//! [`FileCache`] keeps one directory per bucket and one file per entry. Each
//! entry file starts with the etag it was stored under:
//!
//! ```text
//! [etag_len: u32 LE][etag bytes][data bytes]
//! ```
//!
//! Reads check the header first and stop on an etag mismatch, so stale
//! entries never cost a full read.
//!
//! The cache root carries a version marker file. A different version wipes the
//! whole root on construction, so entries written by other Quire releases are
//! never served. A root without the marker is only adopted when it is missing
//! or empty; any other directory is left untouched and the cache stays
//! inactive.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use crate::{Cache, CacheBucket, NullCacheBucket};

const VERSION_FILE: &str = "QUIRE_CACHE_VERSION";

/// File-based [`Cache`] rooted at a directory on disk.
///
/// Directory layout:
/// ```text
/// {root}/
/// +-- QUIRE_CACHE_VERSION  # contains the cache version string
/// +-- html/              # bucket "html"
/// |   +-- 3f1c...        # cache entry
/// +-- highlight/         # bucket "highlight"
///     +-- ...
/// ```
pub struct FileCache {
    root: PathBuf,
    active: bool,
}

impl FileCache {
    /// Open a file-based cache at `root`, validating the cache version.
    ///
    /// A version marker that does not match `version` wipes and recreates the
    /// root. A non-empty root without a marker is refused. Failures are logged
    /// and never fatal; a refused or broken cache hands out buckets that
    /// always miss.
    #[must_use]
    pub fn new(root: PathBuf, version: &str) -> Self {
        let active = validate_version(&root, version);
        Self { root, active }
    }

    /// Whether the root was adopted and entries are persisted.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Cache root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Cache for FileCache {
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket> {
        if !self.active {
            return Box::new(NullCacheBucket);
        }
        Box::new(FileCacheBucket {
            name: name.to_owned(),
            dir: self.root.join(name),
        })
    }
}

/// A single bucket backed by a directory on disk.
struct FileCacheBucket {
    name: String,
    dir: PathBuf,
}

impl FileCacheBucket {
    /// Path of the entry for `key`, or `None` if the key would escape the
    /// bucket directory.
    fn entry_path(&self, key: &str) -> Option<PathBuf> {
        let relative = Path::new(key);
        let is_plain = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if is_plain {
            Some(self.dir.join(relative))
        } else {
            tracing::warn!(bucket = %self.name, key, "Rejected cache key");
            None
        }
    }

    fn write_entry(path: &Path, etag: &str, value: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let etag_bytes = etag.as_bytes();
        let etag_len = u32::try_from(etag_bytes.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "etag too long"))?;

        let mut buf = Vec::with_capacity(4 + etag_bytes.len() + value.len());
        buf.extend_from_slice(&etag_len.to_le_bytes());
        buf.extend_from_slice(etag_bytes);
        buf.extend_from_slice(value);
        fs::write(path, &buf)
    }
}

impl CacheBucket for FileCacheBucket {
    fn get(&self, key: &str, etag: &str) -> Option<Vec<u8>> {
        let path = self.entry_path(key)?;
        let mut file = File::open(&path).ok()?;

        let mut len_buf = [0u8; 4];
        file.read_exact(&mut len_buf).ok()?;
        let etag_len = usize::try_from(u32::from_le_bytes(len_buf)).ok()?;

        let mut stored_etag = vec![0u8; etag_len];
        file.read_exact(&mut stored_etag).ok()?;

        if !etag.is_empty() && stored_etag != etag.as_bytes() {
            tracing::debug!(bucket = %self.name, key, "Cache etag mismatch");
            return None;
        }

        let mut data = Vec::new();
        file.read_to_end(&mut data).ok()?;
        tracing::debug!(bucket = %self.name, key, len = data.len(), "Cache hit");
        Some(data)
    }

    fn set(&self, key: &str, etag: &str, value: &[u8]) -> bool {
        let Some(path) = self.entry_path(key) else {
            return false;
        };
        match Self::write_entry(&path, etag, value) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(bucket = %self.name, key, error = %e, "Failed to write cache entry");
                false
            }
        }
    }

    fn remove(&self, key: &str) -> bool {
        let Some(path) = self.entry_path(key) else {
            return false;
        };
        match fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => true,
            Err(e) => {
                tracing::warn!(bucket = %self.name, key, error = %e, "Failed to remove cache entry");
                false
            }
        }
    }

    fn clear(&self) -> bool {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => true,
            Err(e) => {
                tracing::warn!(bucket = %self.name, error = %e, "Failed to clear cache bucket");
                false
            }
        }
    }
}

/// Validate the cache version, wiping the directory on mismatch.
///
/// Returns `false` when the root cannot be used.
fn validate_version(root: &Path, version: &str) -> bool {
    let version_file = root.join(VERSION_FILE);

    match fs::read_to_string(&version_file) {
        Ok(stored) if stored == version => {
            tracing::debug!(version, "Cache version matches");
            return true;
        }
        Ok(stored) => {
            tracing::info!(stored, current = version, "Cache version mismatch, wiping cache");
            if let Err(e) = fs::remove_dir_all(root) {
                tracing::warn!(error = %e, "Failed to remove cache directory");
                return false;
            }
        }
        Err(_) if is_vacant(root) => {
            tracing::info!(root = %root.display(), "Initializing cache directory");
        }
        Err(_) => {
            tracing::warn!(
                root = %root.display(),
                "Cache directory is not empty and has no version marker, caching disabled"
            );
            return false;
        }
    }

    if let Err(e) = fs::create_dir_all(root) {
        tracing::warn!(error = %e, "Failed to create cache directory");
        return false;
    }
    if let Err(e) = fs::write(&version_file, version) {
        tracing::warn!(error = %e, "Failed to write cache version marker");
        return false;
    }
    true
}

/// True when `root` does not exist or is an empty directory.
fn is_vacant(root: &Path) -> bool {
    match fs::read_dir(root) {
        Ok(mut entries) => entries.next().is_none(),
        Err(e) => e.kind() == io::ErrorKind::NotFound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open(tmp: &TempDir) -> FileCache {
        FileCache::new(tmp.path().join("cache"), "v1")
    }

    #[test]
    fn test_file_bucket_set_and_get() {
        let tmp = TempDir::new().unwrap();
        let bucket = open(&tmp).bucket("html");

        assert!(bucket.set("page", "etag1", b"<h1>hello</h1>"));
        assert_eq!(bucket.get("page", "etag1"), Some(b"<h1>hello</h1>".to_vec()));
    }

    #[test]
    fn test_file_bucket_etag_mismatch_misses() {
        let tmp = TempDir::new().unwrap();
        let bucket = open(&tmp).bucket("html");

        bucket.set("key", "correct-etag", b"data");

        assert_eq!(bucket.get("key", "correct-etag"), Some(b"data".to_vec()));
        assert_eq!(bucket.get("key", "wrong-etag"), None);
    }

    #[test]
    fn test_file_bucket_empty_etag_skips_validation() {
        let tmp = TempDir::new().unwrap();
        let bucket = open(&tmp).bucket("html");

        bucket.set("key", "some-etag", b"data");
        assert_eq!(bucket.get("key", ""), Some(b"data".to_vec()));
    }

    #[test]
    fn test_file_bucket_get_nonexistent_key() {
        let tmp = TempDir::new().unwrap();
        let bucket = open(&tmp).bucket("html");

        assert_eq!(bucket.get("nonexistent", "etag"), None);
    }

    #[test]
    fn test_file_bucket_overwrite() {
        let tmp = TempDir::new().unwrap();
        let bucket = open(&tmp).bucket("html");

        bucket.set("key", "etag1", b"first");
        bucket.set("key", "etag2", b"second");

        assert_eq!(bucket.get("key", "etag1"), None);
        assert_eq!(bucket.get("key", "etag2"), Some(b"second".to_vec()));
    }

    #[test]
    fn test_file_cache_buckets_are_isolated() {
        let tmp = TempDir::new().unwrap();
        let cache = open(&tmp);

        let html = cache.bucket("html");
        let highlight = cache.bucket("highlight");

        html.set("key", "etag", b"html-data");
        highlight.set("key", "etag", b"highlight-data");

        assert_eq!(html.get("key", "etag"), Some(b"html-data".to_vec()));
        assert_eq!(highlight.get("key", "etag"), Some(b"highlight-data".to_vec()));
    }

    #[test]
    fn test_file_bucket_nested_key() {
        let tmp = TempDir::new().unwrap();
        let bucket = open(&tmp).bucket("html");

        assert!(bucket.set("docs/guide/intro", "etag1", b"nested"));
        assert_eq!(bucket.get("docs/guide/intro", "etag1"), Some(b"nested".to_vec()));
    }

    #[test]
    fn test_file_bucket_rejects_escaping_keys() {
        let tmp = TempDir::new().unwrap();
        let bucket = open(&tmp).bucket("html");

        assert!(!bucket.set("../outside", "etag", b"data"));
        assert!(!bucket.set("/abs", "etag", b"data"));
        assert!(!bucket.set("", "etag", b"data"));
        assert!(!tmp.path().join("cache/outside").exists());
        assert_eq!(bucket.get("../outside", ""), None);
        assert!(!bucket.remove("../outside"));
    }

    #[test]
    fn test_file_bucket_binary_data() {
        let tmp = TempDir::new().unwrap();
        let bucket = open(&tmp).bucket("html");

        let binary_data: Vec<u8> = vec![0x00, 0x01, 0x0A, 0x0D, 0xFF, 0xFE, 0x80, 0x7F];
        bucket.set("binary", "etag1", &binary_data);
        assert_eq!(bucket.get("binary", "etag1"), Some(binary_data));
    }

    #[test]
    fn test_file_bucket_remove() {
        let tmp = TempDir::new().unwrap();
        let bucket = open(&tmp).bucket("html");

        bucket.set("key", "etag", b"data");
        assert!(bucket.remove("key"));
        assert_eq!(bucket.get("key", ""), None);
        assert!(bucket.remove("key"));
    }

    #[test]
    fn test_file_bucket_clear() {
        let tmp = TempDir::new().unwrap();
        let cache = open(&tmp);
        let html = cache.bucket("html");
        let highlight = cache.bucket("highlight");

        html.set("a", "etag", b"1");
        html.set("nested/b", "etag", b"2");
        highlight.set("a", "etag", b"3");

        assert!(html.clear());
        assert_eq!(html.get("a", ""), None);
        assert_eq!(html.get("nested/b", ""), None);
        assert_eq!(highlight.get("a", ""), Some(b"3".to_vec()));

        assert!(html.clear());
        assert!(html.set("a", "etag", b"again"));
    }

    #[test]
    fn test_version_match_keeps_cache() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("cache");

        let cache = FileCache::new(root.clone(), "v1");
        cache.bucket("html").set("key", "etag1", b"preserved");

        let cache2 = FileCache::new(root, "v1");
        assert_eq!(
            cache2.bucket("html").get("key", "etag1"),
            Some(b"preserved".to_vec())
        );
    }

    #[test]
    fn test_version_mismatch_wipes_cache() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("cache");

        let cache = FileCache::new(root.clone(), "v1");
        cache.bucket("html").set("key", "etag1", b"will-be-wiped");

        let cache2 = FileCache::new(root.clone(), "v2");
        assert_eq!(cache2.bucket("html").get("key", "etag1"), None);

        let version = fs::read_to_string(root.join(VERSION_FILE)).unwrap();
        assert_eq!(version, "v2");
    }

    #[test]
    fn test_unmarked_directory_is_left_alone() {
        let tmp = TempDir::new().unwrap();
        let project = tmp.path().join("project");

        fs::create_dir_all(project.join("html")).unwrap();
        fs::write(project.join("notes.md"), b"# Notes").unwrap();
        fs::write(project.join("html/orphan"), b"stale data").unwrap();

        let cache = FileCache::new(project.clone(), "v1");

        assert!(!cache.is_active());
        assert_eq!(fs::read(project.join("notes.md")).unwrap(), b"# Notes");
        assert!(!project.join(VERSION_FILE).exists());

        let bucket = cache.bucket("html");
        assert_eq!(bucket.get("orphan", ""), None);
        assert!(!bucket.set("page", "etag", b"data"));
        assert!(!project.join("html/page").exists());
        assert!(project.join("html/orphan").exists());
    }

    #[test]
    fn test_empty_directory_is_adopted() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("cache");
        fs::create_dir_all(&root).unwrap();

        let cache = FileCache::new(root.clone(), "v1");

        assert!(cache.is_active());
        assert_eq!(fs::read_to_string(root.join(VERSION_FILE)).unwrap(), "v1");
    }

    #[test]
    fn test_file_as_root_is_refused() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("cache");
        fs::write(&root, b"not a directory").unwrap();

        let cache = FileCache::new(root.clone(), "v1");

        assert!(!cache.is_active());
        assert_eq!(fs::read(&root).unwrap(), b"not a directory");
    }

    #[test]
    fn test_nonexistent_root_creates_version() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("deeply/nested/cache");
        assert!(!root.exists());

        let cache = FileCache::new(root.clone(), "v1");

        assert_eq!(cache.root(), root);
        let version = fs::read_to_string(root.join(VERSION_FILE)).unwrap();
        assert_eq!(version, "v1");
    }
}
