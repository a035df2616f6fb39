//! Request construction: verbs, the target endpoint and header precedence.

use crate::{Error, HeaderSet, InterceptorChain, Result};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Header forced onto every request before caller headers are applied.
pub const CONTENT_TYPE: &str = "Content-Type";

/// Default value of [`CONTENT_TYPE`].
pub const APPLICATION_JSON: &str = "application/json";

/// Header naming the verb on requests sent through the method-override path.
pub const METHOD_OVERRIDE_HEADER: &str = "HTTP";

/// The HTTP verbs the dispatcher can send.
///
/// # Examples
///
/// ```
/// use hostwire::Method;
///
/// assert_eq!(Method::PATCH.as_str(), "PATCH");
/// assert_eq!("DELETE".parse::<Method>().unwrap(), Method::DELETE);
/// assert!("TRACE".parse::<Method>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
}

impl Method {
    /// Returns the verb name.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::PATCH => "PATCH",
            Method::DELETE => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    /// Parses an exact, upper-case verb name.
    ///
    /// # Errors
    ///
    /// Any other string is a programming error and yields
    /// [`Error::UnknownMethod`].
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "GET" => Ok(Method::GET),
            "POST" => Ok(Method::POST),
            "PUT" => Ok(Method::PUT),
            "PATCH" => Ok(Method::PATCH),
            "DELETE" => Ok(Method::DELETE),
            other => Err(Error::UnknownMethod(other.to_string())),
        }
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => http::Method::GET,
            Method::POST => http::Method::POST,
            Method::PUT => http::Method::PUT,
            Method::PATCH => http::Method::PATCH,
            Method::DELETE => http::Method::DELETE,
        }
    }
}

/// The single host a client talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub https: bool,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16, https: bool) -> Self {
        Self {
            host: host.into(),
            port,
            https,
        }
    }

    /// Returns `http` or `https` depending on the endpoint's flag.
    pub fn scheme(&self) -> &'static str {
        if self.https {
            "https"
        } else {
            "http"
        }
    }

    /// Builds the URL for `path` with `queries` percent-encoded in key order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the host or path do not form a valid URL.
    pub fn url(&self, path: &str, queries: &BTreeMap<String, String>) -> Result<Url> {
        let separator = if path.starts_with('/') { "" } else { "/" };
        let mut url = Url::parse(&format!(
            "{}://{}:{}{}{}",
            self.scheme(),
            self.host,
            self.port,
            separator,
            path
        ))?;

        if !queries.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in queries {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }
}

/// A fully assembled request, ready for the transport.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderSet,
    /// Request body; empty for requests without one.
    pub body: Vec<u8>,
    /// The client-side deadline the timeout guard enforces.
    pub timeout: Duration,
}

impl Request {
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Assembles requests for one endpoint through an interceptor chain.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    endpoint: Endpoint,
    interceptors: InterceptorChain,
}

impl RequestBuilder {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            interceptors: InterceptorChain::new(),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn interceptors(&self) -> &InterceptorChain {
        &self.interceptors
    }

    pub fn interceptors_mut(&mut self) -> &mut InterceptorChain {
        &mut self.interceptors
    }

    /// Builds a request with an empty body.
    ///
    /// Headers are layered in a fixed order: the interceptor chain first, then
    /// `Content-Type: application/json` unconditionally, then `headers`. Only
    /// caller headers can therefore change the content type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the URL cannot be formed.
    pub fn build(
        &self,
        method: Method,
        path: &str,
        queries: &BTreeMap<String, String>,
        headers: &HeaderSet,
    ) -> Result<Request> {
        let url = self.endpoint.url(path, queries)?;

        let mut assembled = HeaderSet::new();
        self.interceptors.apply(&mut assembled);
        assembled.set(CONTENT_TYPE, APPLICATION_JSON);
        assembled.overlay(headers);

        tracing::debug!(method = %method, url = %url, "Request created");

        Ok(Request {
            method,
            url,
            headers: assembled,
            body: Vec::new(),
            timeout: Duration::ZERO,
        })
    }
}
