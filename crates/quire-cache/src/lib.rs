//! Key-value persistence for Quire.
//!
//! Two traits form the core API:
//!
//! - [`Cache`]: Factory for named cache buckets
//! - [`CacheBucket`]: Key-value store with etag-based invalidation
//!
//! All operations are best-effort. Failures are logged and reported as a miss
//! or a `false` return value, never as an error.
//!
//! # Implementations
//!
//! - [`NullCache`] / [`NullCacheBucket`]: No-op implementations (always miss)
//! - [`FileCache`]: File-based implementation with version validation
//!
//! # Example
//!
//! ```
//! use quire_cache::{Cache, CacheBucketExt, NullCache};
//!
//! let cache = NullCache;
//! let bucket = cache.bucket("html");
//! assert!(!bucket.set("page", "v1", b"<h1>hello</h1>"));
//! assert_eq!(bucket.get_or("page", "v1", "fallback".to_owned()), "fallback");
//! ```

mod ext;
mod file;

pub use ext::CacheBucketExt;
pub use file::FileCache;

/// A named partition within a [`Cache`].
///
/// Each bucket stores key-value pairs where values are invalidated by an etag.
/// The etag is an opaque string chosen by the caller (e.g. a content hash or
/// a settings fingerprint). A cache hit occurs only when both the key and etag
/// match.
pub trait CacheBucket: Send + Sync {
    /// Retrieve a cached value.
    ///
    /// Returns `Some(value)` if the key exists **and** was stored with the same
    /// `etag`. Returns `None` on cache miss or etag mismatch.
    ///
    /// If `etag` is an empty string, etag validation is skipped and the cached
    /// data is returned regardless of the stored etag.
    fn get(&self, key: &str, etag: &str) -> Option<Vec<u8>>;

    /// Store a value, overwriting any existing entry for the same key.
    ///
    /// Returns `true` if the value was persisted.
    fn set(&self, key: &str, etag: &str, value: &[u8]) -> bool;

    /// Remove a single entry.
    ///
    /// Returns `true` if the entry is gone afterwards, including when it never
    /// existed.
    fn remove(&self, key: &str) -> bool;

    /// Remove every entry in the bucket.
    ///
    /// Returns `true` if the bucket is empty afterwards.
    fn clear(&self) -> bool;
}

/// Factory for named cache [`CacheBucket`]s.
///
/// A `Cache` produces buckets that are logically isolated from each other.
pub trait Cache: Send + Sync {
    /// Open or create a named bucket.
    ///
    /// Calling `bucket` multiple times with the same name may return
    /// independent handles that share the same underlying storage.
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket>;
}

/// No-op [`CacheBucket`] that never stores or retrieves data.
///
/// Every `get` returns `None` and every `set` reports failure; `remove` and
/// `clear` trivially succeed.
pub struct NullCacheBucket;

impl CacheBucket for NullCacheBucket {
    fn get(&self, _key: &str, _etag: &str) -> Option<Vec<u8>> {
        None
    }

    fn set(&self, _key: &str, _etag: &str, _value: &[u8]) -> bool {
        false
    }

    fn remove(&self, _key: &str) -> bool {
        true
    }

    fn clear(&self) -> bool {
        true
    }
}

/// No-op [`Cache`] that always returns [`NullCacheBucket`]s.
///
/// Use when caching is disabled.
pub struct NullCache;

impl Cache for NullCache {
    fn bucket(&self, _name: &str) -> Box<dyn CacheBucket> {
        Box::new(NullCacheBucket)
    }
}
