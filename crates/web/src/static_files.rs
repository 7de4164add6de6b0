//! Static resource delivery.
//!
//! [`StaticFiles`] answers a request for a file under its root directory:
//!
//! ```text
//! metadata lookup ──> not found ──> StaticError::ResourceNotFound
//!        │
//!        └──> freshness check ──> fresh ──> 304, caching headers, no read
//!                    │
//!                    └──> content ──> valid Range ──> 206 + Content-Range
//!                                └──> otherwise ───> 200, whole resource
//! ```
//!
//! Caching headers are attached in every case. A `Range` header that does
//! not parse or does not fit the resource is ignored and the whole resource
//! is served.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use http::{HeaderMap, HeaderValue, StatusCode, header};
use strand_http::protocol::{HttpRequest, HttpResponse};
use thiserror::Error;
use tracing::{debug, trace};

use crate::cache::{self, CachePolicy};
use crate::content_type::{ExtensionTable, MimeLookup, extension_of};
use crate::range::{ByteRange, RangeSpec};
use crate::store::{LocalFs, ResourceStore};

#[derive(Debug, Error)]
pub enum StaticError {
    #[error("resource not found: {path}")]
    ResourceNotFound { path: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl StaticError {
    fn not_found(path: &str) -> Self {
        Self::ResourceNotFound { path: path.to_owned() }
    }

    fn io(path: &str, source: io::Error) -> Self {
        Self::Io { path: path.to_owned(), source }
    }
}

/// Serves files below a root directory with conditional and partial responses.
#[derive(Debug)]
pub struct StaticFiles<S = LocalFs, M = ExtensionTable> {
    root: PathBuf,
    store: S,
    mime: M,
    policy: CachePolicy,
}

impl StaticFiles {
    /// Serves files from the local file system.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_parts(root, LocalFs, ExtensionTable)
    }
}

impl<S, M> StaticFiles<S, M>
where
    S: ResourceStore,
    M: MimeLookup,
{
    pub fn with_parts(root: impl Into<PathBuf>, store: S, mime: M) -> Self {
        Self { root: root.into(), store, mime, policy: CachePolicy::default() }
    }

    #[must_use]
    pub fn cache_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn serve(&self, request: &HttpRequest) -> Result<HttpResponse, StaticError> {
        self.serve_at(request, SystemTime::now()).await
    }

    /// Like [`serve`](Self::serve) with an explicit clock for `Expires`.
    pub async fn serve_at(&self, request: &HttpRequest, now: SystemTime) -> Result<HttpResponse, StaticError> {
        let url_path = request.path();
        let local_path = self.local_path(url_path).ok_or_else(|| StaticError::not_found(url_path))?;

        let metadata = self
            .store
            .metadata(&local_path)
            .await
            .map_err(|e| StaticError::io(url_path, e))?
            .ok_or_else(|| StaticError::not_found(url_path))?;

        let validation = cache::validate(&metadata, request.headers(), &self.policy, now);
        let mut response = HttpResponse::new(StatusCode::OK);
        validation.headers.apply_to(response.headers_mut());

        if validation.is_fresh() {
            trace!(path = url_path, "resource not modified");
            response.set_status(StatusCode::NOT_MODIFIED);
            return Ok(response);
        }

        let content_type = extension_of(url_path)
            .and_then(|extension| self.mime.content_type_for(extension))
            .unwrap_or(mime::APPLICATION_OCTET_STREAM);
        if let Ok(value) = HeaderValue::from_str(content_type.as_ref()) {
            response.headers_mut().insert(header::CONTENT_TYPE, value);
        }

        match requested_range(request.headers(), metadata.size()) {
            Some(range) => {
                let body = self.store.read_range(&local_path, range).await.map_err(|e| StaticError::io(url_path, e))?;
                if let Ok(value) = HeaderValue::from_str(&range.content_range(metadata.size())) {
                    response.headers_mut().insert(header::CONTENT_RANGE, value);
                }
                response.set_status(StatusCode::PARTIAL_CONTENT);
                response.set_body(body);
            }
            None => {
                let body = self.store.read_all(&local_path).await.map_err(|e| StaticError::io(url_path, e))?;
                response.set_body(body);
            }
        }

        trace!(path = url_path, status = response.status().as_u16(), size = response.body().len(), "served resource");
        Ok(response)
    }

    /// Maps the url path onto the root; `None` when it would leave the root.
    fn local_path(&self, url_path: &str) -> Option<PathBuf> {
        let mut local_path = self.root.clone();
        for segment in url_path.split('/').filter(|segment| !segment.is_empty()) {
            let mut components = Path::new(segment).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(name)), None) => local_path.push(name),
                (Some(Component::CurDir), None) => {}
                _ => {
                    debug!(path = url_path, "reject path outside of root");
                    return None;
                }
            }
        }
        Some(local_path)
    }
}

fn requested_range(headers: &HeaderMap, size: u64) -> Option<ByteRange> {
    let value = headers.get(header::RANGE)?.to_str().ok()?;
    let spec = match value.parse::<RangeSpec>() {
        Ok(spec) => spec,
        Err(e) => {
            debug!(range = value, cause = %e, "ignore malformed range, serve full content");
            return None;
        }
    };
    match spec.resolve(size) {
        Ok(range) => Some(range),
        Err(e) => {
            debug!(cause = %e, "ignore unsatisfiable range, serve full content");
            None
        }
    }
}
