//! Outcome classification.
//!
//! Every finished exchange is reduced to a [`Classification`] from two facts:
//! the transport error category and the HTTP status. Only a clean exchange
//! answered with exactly `200` is a success. Other 2xx statuses such as `201`
//! or `204` are failures.

use crate::{Failure, TransportError};

/// The single status that counts as success.
pub const SUCCESS_STATUS: u16 = 200;

/// Result of classifying a finished exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Success,
    Failure(Failure),
}

impl Classification {
    pub fn is_success(&self) -> bool {
        matches!(self, Classification::Success)
    }
}

/// Classifies a transport outcome.
///
/// # Examples
///
/// ```
/// use hostwire::{classify, Classification, TransportError};
///
/// assert!(classify(TransportError::NoError, 200).is_success());
///
/// match classify(TransportError::NoError, 201) {
///     Classification::Failure(failure) => {
///         assert_eq!(failure.message, "Server HTTP error code: 201 (Internal code: 0)");
///     }
///     Classification::Success => unreachable!(),
/// }
/// ```
pub fn classify(error: TransportError, status: u16) -> Classification {
    if error.is_none() && status == SUCCESS_STATUS {
        return Classification::Success;
    }

    Classification::Failure(Failure {
        error,
        status,
        message: describe(error, status),
    })
}

/// Resolves the display message for a failed outcome.
///
/// Known categories have a short fixed description. Anything else, including a
/// clean exchange with a non-200 status, falls back to a message embedding the
/// HTTP status and the raw category code.
pub fn describe(error: TransportError, status: u16) -> String {
    let known = match error {
        TransportError::HostNotFound => Some("Host not found"),
        TransportError::Timeout | TransportError::OperationCanceled => Some("Timeout"),
        TransportError::UnknownNetwork => Some("Connection unavailable"),
        TransportError::ContentNotFound => Some("Content not found"),
        TransportError::ProtocolInvalidOperation => Some("Protocol invalid operation"),
        TransportError::InternalServerError => Some("Internal server error"),
        _ => None,
    };

    match known {
        Some(message) => message.to_string(),
        None => format!(
            "Server HTTP error code: {} (Internal code: {})",
            status,
            error.code()
        ),
    }
}
