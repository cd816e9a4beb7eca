//! Typed convenience methods on top of raw-byte buckets.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::CacheBucket;

/// Typed convenience methods for [`CacheBucket`].
///
/// Implementors of [`CacheBucket`] only deal in bytes; this trait adds JSON
/// and UTF-8 access plus [`get_or`](CacheBucketExt::get_or) for every bucket
/// through a blanket impl.
///
/// # Example
///
/// ```
/// use quire_cache::{Cache, CacheBucketExt, NullCache};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Rendered { html: String, code_blocks: usize }
///
/// let bucket = NullCache.bucket("html");
/// bucket.set_json("page", "v1", &Rendered { html: "<p>x</p>".into(), code_blocks: 0 });
/// let hit: Option<Rendered> = bucket.get_json("page", "v1");
/// assert!(hit.is_none());
/// ```
pub trait CacheBucketExt: CacheBucket {
    /// Retrieve a JSON-deserialized value.
    ///
    /// Returns `None` on cache miss, etag mismatch, or deserialization failure.
    fn get_json<T: DeserializeOwned>(&self, key: &str, etag: &str) -> Option<T> {
        let bytes = self.get(key, etag)?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    /// Store a value as JSON.
    ///
    /// Returns `false` if serialization or the write fails.
    fn set_json<T: Serialize>(&self, key: &str, etag: &str, value: &T) -> bool {
        serde_json::to_vec(value).is_ok_and(|bytes| self.set(key, etag, &bytes))
    }

    /// Retrieve a cached UTF-8 string.
    ///
    /// Returns `None` on cache miss, etag mismatch, or invalid UTF-8.
    fn get_string(&self, key: &str, etag: &str) -> Option<String> {
        let bytes = self.get(key, etag)?;
        String::from_utf8(bytes).ok()
    }

    /// Store a string value.
    fn set_string(&self, key: &str, etag: &str, value: &str) -> bool {
        self.set(key, etag, value.as_bytes())
    }

    /// Retrieve a JSON value, falling back to `default` on any miss.
    fn get_or<T: DeserializeOwned>(&self, key: &str, etag: &str, default: T) -> T {
        self.get_json(key, etag).unwrap_or(default)
    }
}

impl<B: CacheBucket + ?Sized> CacheBucketExt for B {}
