//! Per-call request parameters.

use crate::{HeaderSet, Method};
use std::collections::BTreeMap;

/// Parameters for an individual request.
///
/// Holds everything that varies per call: verb, path, query parameters, extra
/// headers and the raw body. Headers set here are applied last and win over
/// both interceptors and the default content type.
///
/// # Examples
///
/// ```
/// use hostwire::{Method, RequestMetadata};
///
/// let metadata = RequestMetadata::new(Method::DELETE, "/items/7")
///     .with_query_param("force", "true")
///     .with_header("X-Request-Id", "abc")
///     .with_body(br#"{"reason":"duplicate"}"#.to_vec());
///
/// assert_eq!(metadata.headers.get("x-request-id"), Some("abc"));
/// assert!(!metadata.body.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    /// The HTTP method.
    pub method: Method,

    /// The request path, appended to the endpoint's host and port.
    pub path: String,

    /// Additional headers for this request.
    pub headers: HeaderSet,

    /// Query parameters for this request.
    pub query_params: BTreeMap<String, String>,

    /// The request body. Ignored for GET.
    pub body: Vec<u8>,
}

impl RequestMetadata {
    /// Creates a new `RequestMetadata` with the given method and path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderSet::new(),
            query_params: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    /// Adds a header to the request, replacing any previous value.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Adds a query parameter to the request.
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(key.into(), value.into());
        self
    }

    /// Adds multiple query parameters to the request.
    pub fn with_query_params(
        mut self,
        params: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.query_params.extend(params);
        self
    }

    /// Sets the raw request body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

impl Default for RequestMetadata {
    fn default() -> Self {
        Self::new(Method::GET, "/")
    }
}
