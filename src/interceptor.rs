//! Header interceptors applied to every outgoing request.
//!
//! An [`Interceptor`] mutates the header set of a request before it is sent.
//! Interceptors run in registration order, so a later interceptor sees and may
//! overwrite what an earlier one set. Closures of the form
//! `Fn(&mut HeaderSet)` are interceptors too.

use crate::HeaderSet;
use std::sync::Arc;

/// A capability that mutates outgoing request headers.
///
/// # Examples
///
/// ```
/// use hostwire::{HeaderSet, Interceptor};
///
/// struct BearerToken(String);
///
/// impl Interceptor for BearerToken {
///     fn intercept(&self, headers: &mut HeaderSet) {
///         headers.set("Authorization", format!("Bearer {}", self.0));
///     }
/// }
///
/// let mut headers = HeaderSet::new();
/// BearerToken("secret".to_string()).intercept(&mut headers);
/// assert_eq!(headers.get("authorization"), Some("Bearer secret"));
/// ```
pub trait Interceptor: Send + Sync {
    /// Adds or overwrites headers on an outgoing request.
    fn intercept(&self, headers: &mut HeaderSet);
}

impl<F> Interceptor for F
where
    F: Fn(&mut HeaderSet) + Send + Sync,
{
    fn intercept(&self, headers: &mut HeaderSet) {
        self(headers)
    }
}

/// An append-only, ordered list of interceptors.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an interceptor to the end of the chain.
    pub fn push(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.push(interceptor);
    }

    /// Runs every interceptor over `headers`, in registration order.
    pub fn apply(&self, headers: &mut HeaderSet) {
        for interceptor in &self.interceptors {
            interceptor.intercept(headers);
        }
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}

impl std::fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("len", &self.interceptors.len())
            .finish()
    }
}
