//! Request dispatcher for a single host.
//!
//! The [`Client`] type builds each request through its interceptor chain,
//! hands it to the transport, guards it with a client-side timeout and
//! classifies the outcome. Use [`ClientBuilder`] to configure and create one.

use crate::{
    json::JsonClient,
    pending::PendingRequest,
    request::{Endpoint, RequestBuilder, METHOD_OVERRIDE_HEADER},
    transport::ReqwestTransportBuilder,
    Error, Exchange, Failure, Interceptor, Method, Request, RequestMetadata, Response, Result,
    TimeoutAction, Transport, TransportError, DEFAULT_TIMEOUT,
};
use http::StatusCode;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

/// An HTTP client bound to one host.
///
/// Every request runs through the same pipeline: build, send, guard, classify.
/// A request either completes with status 200 and no transport error, or fails
/// with a [`Failure`]. Nothing is retried.
///
/// # Examples
///
/// ```no_run
/// use hostwire::{Client, HeaderSet, Method, RequestMetadata};
///
/// # async fn example() -> Result<(), hostwire::Error> {
/// let mut client = Client::builder()
///     .host("api.example.com")
///     .https(true)
///     .build()?;
///
/// client.add_interceptor(|headers: &mut HeaderSet| headers.set("X-Client", "hostwire"));
///
/// let metadata = RequestMetadata::new(Method::POST, "/items")
///     .with_body(br#"{"name":"lamp"}"#.to_vec());
/// let response = client.call(metadata).await?;
/// println!("Created: {}", String::from_utf8_lossy(&response.data));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    requests: RequestBuilder,
    transport: Arc<dyn Transport>,
    timeout: Duration,
    timeout_action: TimeoutAction,
    runtime: Handle,
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Appends an interceptor that runs on every subsequent request.
    pub fn add_interceptor(&mut self, interceptor: impl Interceptor + 'static) {
        self.requests.interceptors_mut().push(Arc::new(interceptor));
    }

    pub fn endpoint(&self) -> &Endpoint {
        self.requests.endpoint()
    }

    /// The deadline every request is held to.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Assembles the request that `metadata` would send.
    ///
    /// GET requests never carry a body. Requests that go through the
    /// method-override path name their verb in the `HTTP` header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the path does not form a valid URL.
    pub fn prepare(&self, metadata: &RequestMetadata) -> Result<Request> {
        let body = match metadata.method {
            Method::GET => Vec::new(),
            _ => metadata.body.clone(),
        };

        let mut request = self
            .requests
            .build(
                metadata.method,
                &metadata.path,
                &metadata.query_params,
                &metadata.headers,
            )?
            .with_body(body)
            .with_timeout(self.timeout);

        if uses_method_override(request.method, &request.body) {
            request
                .headers
                .set(METHOD_OVERRIDE_HEADER, request.method.as_str());
        }

        Ok(request)
    }

    /// Sends a request and waits for its classified outcome.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] for every failure, including timeouts and
    /// statuses other than 200.
    pub async fn call(&self, metadata: RequestMetadata) -> Result<Response<Vec<u8>>> {
        Ok(self.dispatch(metadata).await?)
    }

    /// Sends a request and returns immediately.
    ///
    /// Exactly one of `on_complete` or `on_error` runs, once, on the client's
    /// runtime. `on_complete` receives the body and the raw response header
    /// pairs; `on_error` receives the classified failure.
    pub fn send_request<C, E>(&self, metadata: RequestMetadata, on_complete: C, on_error: E)
    where
        C: FnOnce(Vec<u8>, Vec<(String, String)>) + Send + 'static,
        E: FnOnce(Failure) + Send + 'static,
    {
        let outcome = self.dispatch(metadata);
        self.runtime.spawn(async move {
            match outcome.await {
                Ok(response) => on_complete(response.data, response.headers),
                Err(failure) => on_error(failure),
            }
        });
    }

    /// Builds the request now and returns the rest of the pipeline as a future.
    ///
    /// Interceptors run at call time, so a request sees exactly the chain that
    /// was registered when it was made.
    pub(crate) fn dispatch(
        &self,
        metadata: RequestMetadata,
    ) -> impl Future<Output = std::result::Result<Response<Vec<u8>>, Failure>> + Send + 'static
    {
        let prepared = self.prepare(&metadata);
        let transport = self.transport.clone();
        let action = self.timeout_action;

        async move {
            let request = match prepared {
                Ok(request) => request,
                Err(e) => {
                    tracing::warn!(error = %e, path = %metadata.path, "Failed to build request");
                    return Err(unbuildable());
                }
            };

            tracing::info!(
                method = %request.method,
                path = %metadata.path,
                "Sending request"
            );
            if matches!(request.method, Method::POST | Method::PUT) {
                tracing::debug!(data = %String::from_utf8_lossy(&request.body), "Request body");
            }

            let exchange = open(transport.as_ref(), &request);
            let pending =
                PendingRequest::start(exchange, request.url.clone(), request.timeout, action);
            let delivered = pending.settle().await?;

            Ok(Response::new(
                delivered.body,
                StatusCode::from_u16(delivered.status).unwrap_or(StatusCode::OK),
                delivered.headers,
                delivered.latency,
            ))
        }
    }

    pub(crate) fn runtime(&self) -> &Handle {
        &self.runtime
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", self.requests.endpoint())
            .field("interceptors", self.requests.interceptors())
            .field("timeout", &self.timeout)
            .field("timeout_action", &self.timeout_action)
            .finish()
    }
}

/// PATCH, and DELETE with a body, go through the transport's generic primitive.
fn uses_method_override(method: Method, body: &[u8]) -> bool {
    match method {
        Method::PATCH => true,
        Method::DELETE => !body.is_empty(),
        _ => false,
    }
}

/// Selects the transport primitive for a request.
fn open(transport: &dyn Transport, request: &Request) -> Box<dyn Exchange> {
    match request.method {
        Method::GET => transport.get(request),
        Method::POST => transport.post(request),
        Method::PUT => transport.put(request),
        Method::DELETE if request.body.is_empty() => transport.delete(request),
        Method::DELETE | Method::PATCH => transport.send_custom(request, request.method.as_str()),
    }
}

/// The failure reported for a request whose URL could not be formed.
fn unbuildable() -> Failure {
    let error = TransportError::ProtocolUnknown;
    Failure {
        error,
        status: 0,
        message: crate::classify::describe(error, 0),
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use hostwire::{ClientBuilder, HeaderSet, TimeoutAction};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), hostwire::Error> {
/// let client = ClientBuilder::new()
///     .host("api.example.com")
///     .port(8443)
///     .https(true)
///     .timeout(Duration::from_secs(10))
///     .timeout_action(TimeoutAction::Close)
///     .interceptor(|headers: &mut HeaderSet| headers.set("User-Agent", "my-app/1.0"))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    host: Option<String>,
    port: Option<u16>,
    https: bool,
    interceptors: Vec<Arc<dyn Interceptor>>,
    timeout: Duration,
    timeout_action: TimeoutAction,
    transport: Option<Arc<dyn Transport>>,
    transport_builder: ReqwestTransportBuilder,
    runtime: Option<Handle>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            host: None,
            port: None,
            https: false,
            interceptors: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            timeout_action: TimeoutAction::default(),
            transport: None,
            transport_builder: ReqwestTransportBuilder::new(),
            runtime: None,
        }
    }

    /// Sets the host all requests go to. Required.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the port. Defaults to 443 with https and 80 without.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Selects `https` instead of `http`.
    pub fn https(mut self, https: bool) -> Self {
        self.https = https;
        self
    }

    /// Passes an opaque TLS configuration to the default transport.
    ///
    /// Has no effect when a custom transport is set.
    pub fn preconfigured_tls(mut self, tls: impl std::any::Any) -> Self {
        self.transport_builder = self.transport_builder.preconfigured_tls(tls);
        self
    }

    /// Sets the deadline applied to every request. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets what happens to a request that outlives the deadline.
    pub fn timeout_action(mut self, action: TimeoutAction) -> Self {
        self.timeout_action = action;
        self
    }

    /// Appends an interceptor.
    pub fn interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Replaces the default `reqwest` transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the runtime that callbacks run on.
    ///
    /// Defaults to the runtime `build` is called from.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if no host was provided, the host does not form a
    /// valid URL, no runtime is available, or the transport cannot be built.
    pub fn build(self) -> Result<Client> {
        let host = self
            .host
            .ok_or_else(|| Error::Configuration("Host is required".to_string()))?;
        let port = self
            .port
            .unwrap_or(if self.https { 443 } else { 80 });

        let endpoint = Endpoint::new(host, port, self.https);
        endpoint.url("/", &BTreeMap::new())?;

        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|e| {
                Error::Configuration(format!("No tokio runtime available: {}", e))
            })?,
        };

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(self.transport_builder.build()?),
        };

        let mut requests = RequestBuilder::new(endpoint);
        for interceptor in self.interceptors {
            requests.interceptors_mut().push(interceptor);
        }

        Ok(Client {
            requests,
            transport,
            timeout: self.timeout,
            timeout_action: self.timeout_action,
            runtime,
        })
    }

    /// Builds a [`JsonClient`] on top of the configured `Client`.
    ///
    /// # Errors
    ///
    /// Same as [`ClientBuilder::build`].
    pub fn build_json(self) -> Result<JsonClient> {
        Ok(JsonClient::new(self.build()?))
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_builder_requires_host() {
        let result = Client::builder().build();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[tokio::test]
    async fn test_builder_defaults() {
        let client = Client::builder().host("example.com").https(true).build().unwrap();
        assert_eq!(client.endpoint().port, 443);
        assert_eq!(client.timeout(), Duration::from_millis(30_000));
    }

    #[tokio::test]
    async fn test_builder_rejects_invalid_host() {
        let result = Client::builder().host("bad host").build();
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_builder_outside_runtime() {
        let result = Client::builder().host("example.com").build();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    /// A client around an endpoint that never went through `build` validation.
    fn unvalidated_client(host: &str) -> Client {
        Client {
            requests: RequestBuilder::new(Endpoint::new(host, 80, false)),
            transport: Arc::new(crate::ReqwestTransport::new().unwrap()),
            timeout: DEFAULT_TIMEOUT,
            timeout_action: TimeoutAction::default(),
            runtime: Handle::current(),
        }
    }

    #[tokio::test]
    async fn test_unbuildable_url_fails_without_status() {
        let client = unvalidated_client("bad host");

        let failure = client
            .dispatch(RequestMetadata::new(Method::GET, "/a"))
            .await
            .unwrap_err();
        assert_eq!(failure.error, TransportError::ProtocolUnknown);
        assert_eq!(failure.status, 0);
        assert_eq!(failure.message, "Server HTTP error code: 0 (Internal code: 301)");
    }

    #[tokio::test]
    async fn test_unbuildable_url_runs_error_callback_once() {
        let client = unvalidated_client("bad host");
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let error_tx = tx.clone();

        client.send_request(
            RequestMetadata::new(Method::POST, "/a"),
            move |_, _| {
                let _ = tx.send(None);
            },
            move |failure| {
                let _ = error_tx.send(Some(failure.error));
            },
        );

        assert_eq!(rx.recv().await, Some(Some(TransportError::ProtocolUnknown)));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_prepare_drops_get_body_and_marks_overrides() {
        let client = Client::builder().host("example.com").build().unwrap();

        let get = client
            .prepare(&RequestMetadata::new(Method::GET, "/a").with_body(b"ignored".to_vec()))
            .unwrap();
        assert!(get.body.is_empty());
        assert!(!get.headers.contains(METHOD_OVERRIDE_HEADER));

        let delete = client
            .prepare(&RequestMetadata::new(Method::DELETE, "/a"))
            .unwrap();
        assert!(!delete.headers.contains(METHOD_OVERRIDE_HEADER));

        let delete_with_body = client
            .prepare(&RequestMetadata::new(Method::DELETE, "/a").with_body(b"{}".to_vec()))
            .unwrap();
        assert_eq!(
            delete_with_body.headers.get(METHOD_OVERRIDE_HEADER),
            Some("DELETE")
        );

        let patch = client
            .prepare(&RequestMetadata::new(Method::PATCH, "/a"))
            .unwrap();
        assert_eq!(patch.headers.get(METHOD_OVERRIDE_HEADER), Some("PATCH"));
        assert_eq!(patch.timeout, DEFAULT_TIMEOUT);
    }
}
