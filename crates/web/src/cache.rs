//! Conditional request validation.
//!
//! [`validate`] decides whether a client's cached copy of a resource is still
//! fresh, and always returns the caching headers to attach to the response,
//! computed from the same metadata snapshot:
//!
//! - `ETag`: a stable hash of path, size and modification seconds
//! - `Last-Modified`: the modification time as an HTTP date
//! - `Cache-Control: max-age=..` and `Expires` from the [`CachePolicy`]
//!
//! Freshness:
//!
//! 1. a present `If-None-Match` decides alone: fresh when equal to the entity
//!    tag byte for byte, stale otherwise
//! 2. else `If-Modified-Since` equal to the modification time, to the second
//!
//! An `If-Modified-Since` value that is not a valid HTTP date is ignored.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::time::{Duration, SystemTime};

use http::{HeaderMap, HeaderValue, header};
use tracing::{debug, warn};

use crate::store::ResourceMetadata;

/// One day, the default freshness lifetime.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(86_400);

/// How long clients may cache a served resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    max_age: Duration,
}

impl CachePolicy {
    pub fn new(max_age: Duration) -> Self {
        Self { max_age }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    fn cache_control(&self) -> String {
        format!("max-age={}", self.max_age.as_secs())
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_AGE)
    }
}

/// A quoted entity tag, compared for equality only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityTag(String);

impl EntityTag {
    /// Derives the tag from resource identity: path, size and modification seconds.
    pub fn from_metadata(metadata: &ResourceMetadata) -> Self {
        let mut hasher = DefaultHasher::new();
        metadata.path().hash(&mut hasher);
        metadata.size().hash(&mut hasher);
        metadata.modified_secs().hash(&mut hasher);
        Self(format!("\"{:016X}\"", hasher.finish()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact comparison with a received `If-None-Match` value, quotes included.
    pub fn matches(&self, value: &HeaderValue) -> bool {
        value.as_bytes() == self.0.as_bytes()
    }
}

/// Caching headers attached to every response for a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheHeaders {
    pub etag: EntityTag,
    pub last_modified: SystemTime,
    pub cache_control: String,
    pub expires: SystemTime,
}

impl CacheHeaders {
    pub fn apply_to(&self, headers: &mut HeaderMap) {
        insert(headers, header::ETAG, self.etag.as_str());
        insert(headers, header::LAST_MODIFIED, &httpdate::fmt_http_date(self.last_modified));
        insert(headers, header::CACHE_CONTROL, &self.cache_control);
        insert(headers, header::EXPIRES, &httpdate::fmt_http_date(self.expires));
    }
}

fn insert(headers: &mut HeaderMap, name: header::HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(e) => warn!(header = %name, cause = %e, "skip invalid caching header"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// The client's copy is current; answer 304 without reading the resource.
    Fresh,
    Stale,
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub headers: CacheHeaders,
    pub freshness: Freshness,
}

impl Validation {
    pub fn is_fresh(&self) -> bool {
        self.freshness == Freshness::Fresh
    }
}

/// Checks `If-None-Match` and `If-Modified-Since` against `metadata`.
pub fn validate(metadata: &ResourceMetadata, request_headers: &HeaderMap, policy: &CachePolicy, now: SystemTime) -> Validation {
    let etag = EntityTag::from_metadata(metadata);

    let freshness = match request_headers.get(header::IF_NONE_MATCH) {
        Some(value) if etag.matches(value) => {
            debug!(etag = etag.as_str(), "entity tag matches");
            Freshness::Fresh
        }
        // If-Modified-Since is ignored when If-None-Match is present (RFC 9110 section 13.1.3)
        Some(_) => Freshness::Stale,
        None if if_modified_since(request_headers).is_some_and(|since| since == metadata.modified()) => {
            debug!("modification time matches");
            Freshness::Fresh
        }
        None => Freshness::Stale,
    };

    let headers = CacheHeaders {
        etag,
        last_modified: metadata.modified(),
        cache_control: policy.cache_control(),
        expires: now + policy.max_age(),
    };
    Validation { headers, freshness }
}

fn if_modified_since(request_headers: &HeaderMap) -> Option<SystemTime> {
    let value = request_headers.get(header::IF_MODIFIED_SINCE)?;
    let parsed = value.to_str().ok().and_then(|value| httpdate::parse_http_date(value).ok());
    if parsed.is_none() {
        debug!(value = ?value, "ignore unparsable If-Modified-Since");
    }
    parsed
}
