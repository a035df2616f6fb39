//! Error types for requests made through the dispatcher and the JSON layer.
//!
//! Two failure families reach callers: [`Failure`], the transport-level triple
//! of category code, HTTP status and resolved message, and a JSON decode error
//! that carries only a message. They stay distinct in [`Error`] so callers can
//! tell a network or server problem apart from an unparseable body.

use http::StatusCode;

/// Category of a transport-level outcome.
///
/// The numeric codes are stable and grouped the same way throughout:
/// network layer (1-99), content (201-299), protocol (301-399) and
/// server side (401-499). Codes outside the table are kept verbatim in
/// [`TransportError::Other`].
///
/// # Examples
///
/// ```
/// use hostwire::TransportError;
///
/// assert_eq!(TransportError::HostNotFound.code(), 3);
/// assert_eq!(TransportError::from_code(203), TransportError::ContentNotFound);
/// assert_eq!(TransportError::from_code(9999), TransportError::Other(9999));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransportError {
    /// The exchange completed without a transport-level problem.
    #[default]
    NoError,
    ConnectionRefused,
    RemoteHostClosed,
    HostNotFound,
    /// The transport's own deadline elapsed.
    Timeout,
    /// The exchange was aborted before finishing, usually by the timeout guard.
    OperationCanceled,
    SslHandshakeFailed,
    TemporaryNetworkFailure,
    UnknownNetwork,
    ContentAccessDenied,
    ContentOperationNotPermitted,
    ContentNotFound,
    AuthenticationRequired,
    ContentConflict,
    ContentGone,
    UnknownContent,
    ProtocolUnknown,
    ProtocolInvalidOperation,
    ProtocolFailure,
    InternalServerError,
    OperationNotImplemented,
    ServiceUnavailable,
    UnknownServer,
    /// A code that has no named category.
    Other(i32),
}

impl TransportError {
    /// Returns the numeric code of this category.
    pub fn code(self) -> i32 {
        match self {
            TransportError::NoError => 0,
            TransportError::ConnectionRefused => 1,
            TransportError::RemoteHostClosed => 2,
            TransportError::HostNotFound => 3,
            TransportError::Timeout => 4,
            TransportError::OperationCanceled => 5,
            TransportError::SslHandshakeFailed => 6,
            TransportError::TemporaryNetworkFailure => 7,
            TransportError::UnknownNetwork => 99,
            TransportError::ContentAccessDenied => 201,
            TransportError::ContentOperationNotPermitted => 202,
            TransportError::ContentNotFound => 203,
            TransportError::AuthenticationRequired => 204,
            TransportError::ContentConflict => 206,
            TransportError::ContentGone => 207,
            TransportError::UnknownContent => 299,
            TransportError::ProtocolUnknown => 301,
            TransportError::ProtocolInvalidOperation => 302,
            TransportError::ProtocolFailure => 399,
            TransportError::InternalServerError => 401,
            TransportError::OperationNotImplemented => 402,
            TransportError::ServiceUnavailable => 403,
            TransportError::UnknownServer => 499,
            TransportError::Other(code) => code,
        }
    }

    /// Maps a numeric code back to its category.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => TransportError::NoError,
            1 => TransportError::ConnectionRefused,
            2 => TransportError::RemoteHostClosed,
            3 => TransportError::HostNotFound,
            4 => TransportError::Timeout,
            5 => TransportError::OperationCanceled,
            6 => TransportError::SslHandshakeFailed,
            7 => TransportError::TemporaryNetworkFailure,
            99 => TransportError::UnknownNetwork,
            201 => TransportError::ContentAccessDenied,
            202 => TransportError::ContentOperationNotPermitted,
            203 => TransportError::ContentNotFound,
            204 => TransportError::AuthenticationRequired,
            206 => TransportError::ContentConflict,
            207 => TransportError::ContentGone,
            299 => TransportError::UnknownContent,
            301 => TransportError::ProtocolUnknown,
            302 => TransportError::ProtocolInvalidOperation,
            399 => TransportError::ProtocolFailure,
            401 => TransportError::InternalServerError,
            402 => TransportError::OperationNotImplemented,
            403 => TransportError::ServiceUnavailable,
            499 => TransportError::UnknownServer,
            other => TransportError::Other(other),
        }
    }

    /// Derives the category a server-reported HTTP status implies.
    ///
    /// Informational, success and redirect statuses map to
    /// [`TransportError::NoError`]; classification still decides whether the
    /// exchange counts as a success.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => TransportError::ProtocolInvalidOperation,
            401 => TransportError::AuthenticationRequired,
            403 => TransportError::ContentAccessDenied,
            404 => TransportError::ContentNotFound,
            405 => TransportError::ContentOperationNotPermitted,
            409 => TransportError::ContentConflict,
            410 => TransportError::ContentGone,
            418 => TransportError::ProtocolInvalidOperation,
            402..=499 => TransportError::UnknownContent,
            500 => TransportError::InternalServerError,
            501 => TransportError::OperationNotImplemented,
            503 => TransportError::ServiceUnavailable,
            502..=599 => TransportError::UnknownServer,
            _ => TransportError::NoError,
        }
    }

    /// Returns `true` for [`TransportError::NoError`].
    pub fn is_none(self) -> bool {
        self == TransportError::NoError
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}

/// A classified transport-level failure.
///
/// `status` is the HTTP status received from the server, or `0` when none was
/// received. `message` is already resolved for display.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct Failure {
    /// The transport error category.
    pub error: TransportError,
    /// The HTTP status, `0` if the server never answered.
    pub status: u16,
    /// Human readable description of the failure.
    pub message: String,
}

impl Failure {
    /// Returns the numeric transport error code.
    pub fn code(&self) -> i32 {
        self.error.code()
    }

    /// Returns the HTTP status as a [`StatusCode`], if one was received.
    pub fn status_code(&self) -> Option<StatusCode> {
        StatusCode::from_u16(self.status).ok()
    }
}

/// The main error type of the crate.
///
/// # Examples
///
/// ```no_run
/// use hostwire::{Error, JsonClient, Method, RequestMetadata};
///
/// # async fn example() -> Result<(), Error> {
/// let client = JsonClient::builder().host("api.example.com").https(true).build_json()?;
///
/// match client.call(RequestMetadata::new(Method::GET, "/status"), &serde_json::Map::new()).await {
///     Ok(response) => println!("Status document: {:?}", response.data),
///     Err(Error::Transport(failure)) => {
///         eprintln!(
///             "Request failed ({}, HTTP {}): {}",
///             failure.code(),
///             failure.status,
///             failure.message
///         );
///     }
///     Err(Error::Decode(message)) => eprintln!("Unreadable body: {}", message),
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The exchange failed at the transport level or returned a non-200 status.
    #[error("{0}")]
    Transport(#[from] Failure),

    /// A successful response body could not be decoded as a JSON object or array.
    ///
    /// No transport code or HTTP status is attached because none failed.
    #[error("JSON decode error: {0}")]
    Decode(String),

    /// The request data could not be serialized to JSON.
    #[error("Failed to serialize request: {0}")]
    Serialization(String),

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The configured host or a request path produced an invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A verb name did not match any [`crate::Method`].
    #[error("Unknown HTTP method: {0}")]
    UnknownMethod(String),
}

impl Error {
    /// Returns the HTTP status for transport failures that received one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Transport(failure) => failure.status_code(),
            _ => None,
        }
    }

    /// Returns the transport error category, if this is a transport failure.
    pub fn transport_error(&self) -> Option<TransportError> {
        match self {
            Error::Transport(failure) => Some(failure.error),
            _ => None,
        }
    }

    /// Returns `true` if this is a JSON decode error.
    pub fn is_decode(&self) -> bool {
        matches!(self, Error::Decode(_))
    }
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
