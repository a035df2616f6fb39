//! Response wrapper that keeps the payload together with transport details.
//!
//! The [`Response`] type wraps the delivered data along with the status, the
//! raw response header pairs and the time the exchange took.

use http::StatusCode;
use std::time::Duration;

/// A successful response.
///
/// # Type Parameters
///
/// * `T` - The payload type: raw bytes from [`crate::Client`], a JSON object
///   from [`crate::JsonClient`].
///
/// # Examples
///
/// ```no_run
/// use hostwire::{Client, Method, RequestMetadata};
///
/// # async fn example() -> Result<(), hostwire::Error> {
/// let client = Client::builder().host("api.example.com").https(true).build()?;
///
/// let response = client.call(RequestMetadata::new(Method::GET, "/health")).await?;
///
/// println!("{} bytes in {:?}", response.data.len(), response.latency);
/// println!("Server: {:?}", response.header("server"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The delivered payload.
    pub data: T,

    /// The HTTP status code of the response.
    pub status: StatusCode,

    /// The response headers as received, in order.
    pub headers: Vec<(String, String)>,

    /// Time from dispatch until the exchange finished.
    pub latency: Duration,
}

impl<T> Response<T> {
    /// Creates a new `Response`.
    pub fn new(
        data: T,
        status: StatusCode,
        headers: Vec<(String, String)>,
        latency: Duration,
    ) -> Self {
        Self {
            data,
            status,
            headers,
            latency,
        }
    }

    /// Maps the response data to a different type using the provided function.
    ///
    /// # Examples
    ///
    /// ```
    /// # use hostwire::Response;
    /// # use http::StatusCode;
    /// # use std::time::Duration;
    /// let latency = Duration::from_millis(3);
    /// let response = Response::new(b"42".to_vec(), StatusCode::OK, Vec::new(), latency);
    ///
    /// let text = response.map(|bytes| String::from_utf8_lossy(&bytes).into_owned());
    /// assert_eq!(text.data, "42");
    /// ```
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            data: f(self.data),
            status: self.status,
            headers: self.headers,
            latency: self.latency,
        }
    }

    /// Returns the first header value with this name, compared case-insensitively.
    ///
    /// # Examples
    ///
    /// ```
    /// # use hostwire::Response;
    /// # use http::StatusCode;
    /// # use std::time::Duration;
    /// let headers = vec![("content-type".to_string(), "application/json".to_string())];
    /// let response = Response::new((), StatusCode::OK, headers, Duration::ZERO);
    ///
    /// assert_eq!(response.header("Content-Type"), Some("application/json"));
    /// ```
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl<T> AsRef<T> for Response<T> {
    fn as_ref(&self) -> &T {
        &self.data
    }
}

impl<T> std::ops::Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}
