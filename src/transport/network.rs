//! Default transport backed by `reqwest`.

use super::{BoxFuture, Exchange, Transport};
use crate::{Error, Request, Result, TransportError};
use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

/// A [`Transport`] that performs requests with a shared `reqwest::Client`.
///
/// The client has no deadline of its own; the dispatcher's timeout guard is the
/// only client-side limit. Connection pooling is whatever `reqwest` does.
///
/// # Examples
///
/// ```no_run
/// use hostwire::ReqwestTransport;
///
/// # fn example() -> Result<(), hostwire::Error> {
/// let transport = ReqwestTransport::builder().build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::new()
    }

    /// Wraps an already configured `reqwest::Client`.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn start(
        &self,
        request: &Request,
        method: reqwest::Method,
        with_body: bool,
    ) -> Box<dyn Exchange> {
        let mut builder = self.client.request(method, request.url.clone());
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        if with_body {
            builder = builder.body(request.body.clone());
        }

        let (finished_tx, finished_rx) = watch::channel(false);
        let shared = Arc::new(Shared {
            outcome: Mutex::new(Outcome::default()),
            finished: finished_tx,
        });
        let close = Arc::new(Notify::new());
        let task = tokio::spawn(drive(builder, shared.clone(), close.clone()));

        Box::new(ReqwestExchange {
            shared,
            finished: finished_rx,
            close,
            task,
        })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, request: &Request) -> Box<dyn Exchange> {
        self.start(request, reqwest::Method::GET, false)
    }

    fn post(&self, request: &Request) -> Box<dyn Exchange> {
        self.start(request, reqwest::Method::POST, true)
    }

    fn put(&self, request: &Request) -> Box<dyn Exchange> {
        self.start(request, reqwest::Method::PUT, true)
    }

    fn delete(&self, request: &Request) -> Box<dyn Exchange> {
        self.start(request, reqwest::Method::DELETE, false)
    }

    fn send_custom(&self, request: &Request, verb: &str) -> Box<dyn Exchange> {
        match reqwest::Method::from_bytes(verb.as_bytes()) {
            Ok(method) => self.start(request, method, true),
            Err(_) => Box::new(FailedExchange(TransportError::ProtocolUnknown)),
        }
    }
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug)]
pub struct ReqwestTransportBuilder {
    inner: reqwest::ClientBuilder,
}

impl ReqwestTransportBuilder {
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::builder(),
        }
    }

    /// Passes an opaque TLS configuration through to `reqwest` unmodified.
    ///
    /// With the `rustls-tls` backend this is a `rustls::ClientConfig`.
    pub fn preconfigured_tls(mut self, tls: impl Any) -> Self {
        self.inner = self.inner.use_preconfigured_tls(tls);
        self
    }

    /// Builds the transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `reqwest` rejects the configuration.
    pub fn build(self) -> Result<ReqwestTransport> {
        let client = self.inner.build().map_err(|e| {
            Error::Configuration(format!("Failed to build HTTP client: {}", e))
        })?;
        Ok(ReqwestTransport { client })
    }
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
struct Outcome {
    done: bool,
    error: TransportError,
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

struct Shared {
    outcome: Mutex<Outcome>,
    finished: watch::Sender<bool>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Outcome> {
        self.outcome.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records progress unless the exchange already finished.
    fn update(&self, f: impl FnOnce(&mut Outcome)) {
        let mut outcome = self.lock();
        if !outcome.done {
            f(&mut outcome);
        }
    }

    /// Applies a final change and signals completion, once.
    fn finish(&self, f: impl FnOnce(&mut Outcome)) {
        let mut outcome = self.lock();
        if outcome.done {
            return;
        }
        f(&mut outcome);
        outcome.done = true;
        drop(outcome);
        self.finished.send_replace(true);
    }
}

async fn drive(builder: reqwest::RequestBuilder, shared: Arc<Shared>, close: Arc<Notify>) {
    let sent = tokio::select! {
        result = builder.send() => result,
        _ = close.notified() => {
            shared.finish(|outcome| outcome.error = TransportError::OperationCanceled);
            return;
        }
    };

    let mut response = match sent {
        Ok(response) => response,
        Err(e) => {
            let error = error_category(&e);
            tracing::debug!(error = %e, code = error.code(), "Transport error");
            shared.finish(|outcome| outcome.error = error);
            return;
        }
    };

    let status = response.status().as_u16();
    let headers: Vec<(String, String)> = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    shared.update(|outcome| {
        outcome.status = status;
        outcome.headers = headers;
        outcome.error = TransportError::from_status(status);
    });

    loop {
        tokio::select! {
            chunk = response.chunk() => match chunk {
                Ok(Some(bytes)) => shared.update(|outcome| outcome.body.extend_from_slice(&bytes)),
                Ok(None) => break,
                Err(e) => {
                    let error = error_category(&e);
                    shared.update(|outcome| outcome.error = error);
                    break;
                }
            },
            // Graceful stop: keep what arrived.
            _ = close.notified() => break,
        }
    }

    shared.finish(|_| {});
}

/// Maps a `reqwest` failure onto a transport error category.
fn error_category(error: &reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_builder() {
        TransportError::ProtocolInvalidOperation
    } else if error.is_connect() {
        if chain_mentions(error, &["dns error", "failed to lookup"]) {
            TransportError::HostNotFound
        } else if chain_mentions(error, &["refused"]) {
            TransportError::ConnectionRefused
        } else if chain_mentions(error, &["certificate", "tls", "handshake"]) {
            TransportError::SslHandshakeFailed
        } else {
            TransportError::UnknownNetwork
        }
    } else if error.is_body() || error.is_decode() {
        TransportError::ProtocolFailure
    } else if error.is_redirect() {
        TransportError::ProtocolUnknown
    } else {
        TransportError::UnknownNetwork
    }
}

fn chain_mentions(error: &(dyn std::error::Error + 'static), needles: &[&str]) -> bool {
    let mut current = Some(error);
    while let Some(err) = current {
        let text = err.to_string().to_ascii_lowercase();
        if needles.iter().any(|needle| text.contains(needle)) {
            return true;
        }
        current = err.source();
    }
    false
}

struct ReqwestExchange {
    shared: Arc<Shared>,
    finished: watch::Receiver<bool>,
    close: Arc<Notify>,
    task: JoinHandle<()>,
}

impl Exchange for ReqwestExchange {
    fn is_running(&self) -> bool {
        !*self.finished.borrow()
    }

    fn finished(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let _ = self.finished.wait_for(|done| *done).await.map(|_| ());
        })
    }

    fn error(&self) -> TransportError {
        self.shared.lock().error
    }

    fn status(&self) -> u16 {
        self.shared.lock().status
    }

    fn abort(&mut self) {
        self.task.abort();
        self.shared
            .finish(|outcome| outcome.error = TransportError::OperationCanceled);
    }

    fn close(&mut self) {
        self.close.notify_one();
    }

    fn read_all(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.shared.lock().body)
    }

    fn raw_header_pairs(&self) -> Vec<(String, String)> {
        self.shared.lock().headers.clone()
    }
}

impl Drop for ReqwestExchange {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// An exchange that failed before it could start.
struct FailedExchange(TransportError);

impl Exchange for FailedExchange {
    fn is_running(&self) -> bool {
        false
    }

    fn finished(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async {})
    }

    fn error(&self) -> TransportError {
        self.0
    }

    fn status(&self) -> u16 {
        0
    }

    fn abort(&mut self) {}

    fn close(&mut self) {}

    fn read_all(&mut self) -> Vec<u8> {
        Vec::new()
    }

    fn raw_header_pairs(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}
