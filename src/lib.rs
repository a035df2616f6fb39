//! # Hostwire - an async HTTP client core for a single host
//!
//! Hostwire sends requests to one configured host through a fixed pipeline:
//! headers are assembled through an interceptor chain, the request is handed
//! to a transport, a client-side timeout guards it, and the outcome is
//! classified into success or a typed failure. A JSON layer on top exchanges
//! JSON objects instead of raw bytes.
//!
//! ## Quick Start
//!
//! ```no_run
//! use hostwire::{HeaderSet, JsonClient};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), hostwire::Error> {
//!     let mut client = JsonClient::builder()
//!         .host("api.example.com")
//!         .https(true)
//!         .build_json()?;
//!
//!     client.add_interceptor(|headers: &mut HeaderSet| {
//!         headers.set("Authorization", "Bearer secret");
//!     });
//!
//!     let user = client.get("/users/123").await?;
//!     println!("User: {:?}", user.data.get("name"));
//!     println!("Request took {:?}", user.latency);
//!
//!     let created = client.post("/users", &json!({"name": "Alice"})).await?;
//!     println!("Created user with ID: {:?}", created.data.get("id"));
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Interceptors** - Ordered header mutators applied to every request
//! - **Header precedence** - Interceptors, then `Content-Type`, then per-call headers
//! - **Client-side timeout** - Aborts or closes requests that outlive their deadline
//! - **Uniform classification** - Transport errors and HTTP statuses reduce to one failure triple
//! - **Exactly-once callbacks** - `send_request` runs exactly one of its two callbacks
//! - **JSON layer** - Array bodies wrapped under [`MAGIC_ARRAY_KEY`], message-only decode errors
//! - **Pluggable transport** - `reqwest` by default, any [`Transport`] in tests or custom stacks
//!
//! ## Callbacks
//!
//! Besides the async `call` methods, each client offers a callback API that
//! returns immediately:
//!
//! ```no_run
//! use hostwire::{Client, Method, RequestMetadata};
//!
//! # fn example(client: Client) {
//! client.send_request(
//!     RequestMetadata::new(Method::GET, "/ping"),
//!     |body, headers| println!("{} bytes, {} headers", body.len(), headers.len()),
//!     |failure| eprintln!("{} (HTTP {}): {}", failure.code(), failure.status, failure.message),
//! );
//! # }
//! ```
//!
//! ## Classification
//!
//! Only an exchange without a transport error and with status exactly `200` is
//! a success. `201`, `204` and every other status are failures:
//!
//! ```
//! use hostwire::{classify, TransportError};
//!
//! assert!(classify(TransportError::NoError, 200).is_success());
//! assert!(!classify(TransportError::NoError, 204).is_success());
//! ```

pub mod classify;
mod client;
mod error;
mod headers;
mod interceptor;
pub mod json;
pub mod metadata;
mod pending;
mod request;
mod response;
pub mod timeout;
pub mod transport;

pub use classify::{classify, Classification};
pub use client::{Client, ClientBuilder};
pub use error::{Error, Failure, Result, TransportError};
pub use headers::HeaderSet;
pub use interceptor::{Interceptor, InterceptorChain};
pub use json::{JsonClient, JsonObject, MAGIC_ARRAY_KEY};
pub use metadata::RequestMetadata;
pub use request::{
    Endpoint, Method, Request, RequestBuilder, APPLICATION_JSON, CONTENT_TYPE,
    METHOD_OVERRIDE_HEADER,
};
pub use response::Response;
pub use timeout::{GuardState, TimeoutAction, TimeoutGuard, DEFAULT_TIMEOUT};
pub use transport::{BoxFuture, Exchange, ReqwestTransport, ReqwestTransportBuilder, Transport};
