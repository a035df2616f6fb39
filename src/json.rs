//! JSON exchange on top of the byte-level [`Client`].
//!
//! Request data is encoded to JSON and sent as the body. A successful response
//! body is decoded into a JSON object; an array body is wrapped under
//! [`MAGIC_ARRAY_KEY`] so callers always receive an object. A body that is
//! empty or not valid JSON becomes [`Error::Decode`], which carries only a
//! message. Transport failures pass through as [`Error::Transport`] without
//! the body ever being parsed.

use crate::{Client, ClientBuilder, Error, Interceptor, Method, RequestMetadata, Response, Result};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::future::Future;

/// Key an array-rooted response body is stored under.
pub const MAGIC_ARRAY_KEY: &str = "magic_array_key";

/// A decoded JSON object.
pub type JsonObject = Map<String, Value>;

/// Encodes request data as JSON text.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if `data` cannot be represented as JSON.
pub fn encode<T: Serialize + ?Sized>(data: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(data).map_err(|e| Error::Serialization(e.to_string()))
}

/// Decodes a response body into a JSON object.
///
/// # Errors
///
/// Returns [`Error::Decode`] for an empty body, malformed JSON, or a document
/// whose root is neither an object nor an array.
///
/// # Examples
///
/// ```
/// use hostwire::json::{decode, MAGIC_ARRAY_KEY};
/// use serde_json::json;
///
/// let object = decode(b"[1,2,3]").unwrap();
/// assert_eq!(object[MAGIC_ARRAY_KEY], json!([1, 2, 3]));
///
/// assert!(decode(b"").is_err());
/// ```
pub fn decode(bytes: &[u8]) -> Result<JsonObject> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(Value::Array(items)) => {
            let mut object = Map::new();
            object.insert(MAGIC_ARRAY_KEY.to_string(), Value::Array(items));
            Ok(object)
        }
        Ok(other) => Err(Error::Decode(format!(
            "JSON root must be an object or an array, found {}",
            kind(&other)
        ))),
        Err(e) => Err(Error::Decode(e.to_string())),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A client that exchanges JSON documents instead of raw bytes.
///
/// # Examples
///
/// ```no_run
/// use hostwire::JsonClient;
/// use serde_json::json;
///
/// # async fn example() -> Result<(), hostwire::Error> {
/// let client = JsonClient::builder()
///     .host("api.example.com")
///     .https(true)
///     .build_json()?;
///
/// let created = client.post("/users", &json!({"name": "Alice"})).await?;
/// println!("Created: {:?}", created.data.get("id"));
///
/// let listed = client.get("/users").await?;
/// println!("Users: {:?}", listed.data.get(hostwire::MAGIC_ARRAY_KEY));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct JsonClient {
    client: Client,
}

impl JsonClient {
    /// Wraps a byte-level client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates a builder; finish it with [`ClientBuilder::build_json`].
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Appends an interceptor that runs on every subsequent request.
    pub fn add_interceptor(&mut self, interceptor: impl Interceptor + 'static) {
        self.client.add_interceptor(interceptor);
    }

    /// Sends `data` as the JSON body and decodes the JSON response.
    ///
    /// Any body already set on `metadata` is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the exchange failed, [`Error::Decode`]
    /// if it succeeded but the body is not a JSON object or array, and
    /// [`Error::Serialization`] if `data` cannot be encoded.
    pub async fn call<D>(&self, metadata: RequestMetadata, data: &D) -> Result<Response<JsonObject>>
    where
        D: Serialize + ?Sized,
    {
        self.dispatch(metadata, encode(data)).await
    }

    /// Sends `data` as the JSON body and returns immediately.
    ///
    /// Exactly one of `on_complete` or `on_error` runs, once, on the client's
    /// runtime. `on_error` receives either [`Error::Transport`] or a
    /// message-only [`Error::Decode`].
    pub fn send_request<D, C, E>(
        &self,
        metadata: RequestMetadata,
        data: &D,
        on_complete: C,
        on_error: E,
    ) where
        D: Serialize + ?Sized,
        C: FnOnce(JsonObject, Vec<(String, String)>) + Send + 'static,
        E: FnOnce(Error) + Send + 'static,
    {
        let outcome = self.dispatch(metadata, encode(data));
        self.client.runtime().spawn(async move {
            match outcome.await {
                Ok(response) => on_complete(response.data, response.headers),
                Err(e) => on_error(e),
            }
        });
    }

    /// Makes a GET request. The encoded empty object is not sent.
    pub async fn get(&self, path: impl Into<String>) -> Result<Response<JsonObject>> {
        self.call(RequestMetadata::new(Method::GET, path), &JsonObject::new())
            .await
    }

    /// Makes a POST request with a JSON body.
    pub async fn post<D>(&self, path: impl Into<String>, data: &D) -> Result<Response<JsonObject>>
    where
        D: Serialize + ?Sized,
    {
        self.call(RequestMetadata::new(Method::POST, path), data).await
    }

    /// Makes a PUT request with a JSON body.
    pub async fn put<D>(&self, path: impl Into<String>, data: &D) -> Result<Response<JsonObject>>
    where
        D: Serialize + ?Sized,
    {
        self.call(RequestMetadata::new(Method::PUT, path), data).await
    }

    /// Makes a PATCH request with a JSON body.
    pub async fn patch<D>(&self, path: impl Into<String>, data: &D) -> Result<Response<JsonObject>>
    where
        D: Serialize + ?Sized,
    {
        self.call(RequestMetadata::new(Method::PATCH, path), data).await
    }

    /// Makes a DELETE request with a JSON body.
    ///
    /// Even an empty object encodes to `{}`, so this always goes through the
    /// method-override path.
    pub async fn delete<D>(&self, path: impl Into<String>, data: &D) -> Result<Response<JsonObject>>
    where
        D: Serialize + ?Sized,
    {
        self.call(RequestMetadata::new(Method::DELETE, path), data).await
    }

    fn dispatch(
        &self,
        metadata: RequestMetadata,
        body: Result<Vec<u8>>,
    ) -> impl Future<Output = Result<Response<JsonObject>>> + Send + 'static {
        let outcome = body.map(|body| self.client.dispatch(metadata.with_body(body)));

        async move {
            let response = outcome?.await?;

            match decode(&response.data) {
                Ok(object) => {
                    let rendered = serde_json::Value::Object(object.clone());
                    tracing::debug!(response = %rendered, "Response in JSON");
                    Ok(response.map(|_| object))
                }
                Err(e) => {
                    tracing::warn!(
                        raw_response = %String::from_utf8_lossy(&response.data),
                        error = %e,
                        "Failed to decode response"
                    );
                    Err(e)
                }
            }
        }
    }
}

impl Response<JsonObject> {
    /// Deserializes the decoded object into a typed value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the object does not match `T`.
    pub fn parse_data<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.data.clone()))
            .map_err(|e| Error::Decode(e.to_string()))
    }
}
