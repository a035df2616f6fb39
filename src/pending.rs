//! The live unit of work behind one dispatched request.

use crate::classify::{classify, Classification};
use crate::{Exchange, Failure, TimeoutAction, TimeoutGuard};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// A successfully classified exchange.
#[derive(Debug)]
pub(crate) struct Delivered {
    pub body: Vec<u8>,
    pub headers: Vec<(String, String)>,
    pub status: u16,
    pub latency: Duration,
}

/// Owns an in-flight exchange together with its timeout guard.
///
/// Both are released together when [`PendingRequest::settle`] returns, whether
/// the exchange finished on its own or the guard stopped it.
pub(crate) struct PendingRequest {
    exchange: Box<dyn Exchange>,
    guard: TimeoutGuard,
    url: Url,
    started: Instant,
}

impl PendingRequest {
    pub fn start(
        exchange: Box<dyn Exchange>,
        url: Url,
        timeout: Duration,
        action: TimeoutAction,
    ) -> Self {
        let guard = TimeoutGuard::arm(exchange.as_ref(), timeout, action);
        Self {
            exchange,
            guard,
            url,
            started: Instant::now(),
        }
    }

    /// Waits for the first terminal event and classifies the outcome.
    pub async fn settle(mut self) -> Result<Delivered, Failure> {
        let expired = {
            let finished = self.exchange.finished();
            tokio::select! {
                _ = finished => false,
                _ = self.guard.expired() => true,
            }
        };

        if expired {
            if self.guard.fire(self.exchange.as_mut()) {
                tracing::warn!(
                    url = %self.url,
                    action = ?self.guard.action(),
                    "Request timed out"
                );
            }
            self.exchange.finished().await;
        } else {
            self.guard.disarm();
        }

        let latency = self.started.elapsed();
        let error = self.exchange.error();
        let status = self.exchange.status();

        tracing::info!(
            url = %self.url,
            latency_ms = latency.as_millis(),
            status = status,
            "Received HTTP response"
        );

        match classify(error, status) {
            Classification::Success => {
                tracing::info!(url = %self.url, "Reply acquired");
                Ok(Delivered {
                    body: self.exchange.read_all(),
                    headers: self.exchange.raw_header_pairs(),
                    status,
                    latency,
                })
            }
            Classification::Failure(failure) => {
                tracing::warn!(
                    code = failure.code(),
                    status = failure.status,
                    message = %failure.message,
                    "Reply error"
                );
                Err(failure)
            }
        }
    }
}
