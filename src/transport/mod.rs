//! The transport collaborator.
//!
//! The dispatcher never touches sockets itself. It hands each assembled
//! [`Request`] to a [`Transport`] primitive and receives an [`Exchange`]: a
//! handle on the in-flight operation that reports completion, exposes the
//! outcome and can be stopped early by the timeout guard.
//!
//! [`ReqwestTransport`] is the default implementation. Any other transport,
//! including scripted ones in tests, plugs in through
//! [`crate::ClientBuilder::transport`].

mod network;

pub use network::{ReqwestTransport, ReqwestTransportBuilder};

use crate::{Request, TransportError};
use std::future::Future;
use std::pin::Pin;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Performs network I/O for assembled requests.
///
/// Every primitive starts the exchange and returns immediately. `get` never
/// sends a body. `post`, `put` and `send_custom` send `request.body`. `delete`
/// is only used for body-less deletes.
pub trait Transport: Send + Sync {
    fn get(&self, request: &Request) -> Box<dyn Exchange>;

    fn post(&self, request: &Request) -> Box<dyn Exchange>;

    fn put(&self, request: &Request) -> Box<dyn Exchange>;

    fn delete(&self, request: &Request) -> Box<dyn Exchange>;

    /// Sends `request.body` with an arbitrary verb.
    fn send_custom(&self, request: &Request, verb: &str) -> Box<dyn Exchange>;
}

/// A handle on one in-flight exchange.
///
/// The outcome accessors are meaningful once [`Exchange::finished`] has
/// resolved. Dropping the handle releases whatever the transport still holds
/// for it.
pub trait Exchange: Send {
    /// Returns `true` while the exchange has not finished.
    fn is_running(&self) -> bool;

    /// Resolves once the exchange has finished, successfully or not.
    ///
    /// Resolves immediately if it already has.
    fn finished(&mut self) -> BoxFuture<'_, ()>;

    /// The transport error category of the finished exchange.
    fn error(&self) -> TransportError;

    /// The HTTP status received, or `0` if none was.
    fn status(&self) -> u16;

    /// Hard-terminates the exchange. It finishes with
    /// [`TransportError::OperationCanceled`].
    fn abort(&mut self);

    /// Stops the exchange gracefully. Data that already arrived stays readable.
    fn close(&mut self);

    /// Takes the response body received so far.
    fn read_all(&mut self) -> Vec<u8>;

    /// The raw response headers as ordered name/value pairs.
    fn raw_header_pairs(&self) -> Vec<(String, String)>;
}
