use std::error::Error;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use http::{Request, Response, StatusCode};
use tracing::{debug, info, warn};

use super::context::Arguments;

static NEXT_INVOCATION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier correlating the events of one executor call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[display("{_0}")]
pub struct InvocationId(u64);

impl InvocationId {
    /// Allocates the next invocation identifier.
    pub fn next() -> Self {
        Self(NEXT_INVOCATION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw identifier.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Summary of a successful call, handed to [`CallObserver::exit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSnapshot {
    /// Response status code.
    pub status: StatusCode,
    /// Server-assigned request id, if any.
    pub request_id: Option<String>,
    /// Whether a body was decoded.
    pub has_body: bool,
}

/// Observer of executor calls.
///
/// Events of one call are emitted in this order, all carrying the same [`InvocationId`]:
/// [`enter`](Self::enter), [`request_sent`](Self::request_sent),
/// [`response_received`](Self::response_received), then either [`error`](Self::error)
/// or [`exit`](Self::exit). Calls failing before dispatch skip the request/response events.
///
/// Every method defaults to a no-op, implement only what you need.
pub trait CallObserver: Debug + Send + Sync + 'static {
    /// The call starts; `arguments` is a borrowed view of the caller's arguments.
    fn enter(&self, invocation: InvocationId, operation: &str, arguments: &Arguments) {
        let _ = (invocation, operation, arguments);
    }

    /// The request is about to be handed to the transport.
    fn request_sent(&self, invocation: InvocationId, request: &Request<Bytes>) {
        let _ = (invocation, request);
    }

    /// The transport returned a response.
    fn response_received(&self, invocation: InvocationId, response: &Response<Bytes>) {
        let _ = (invocation, response);
    }

    /// The call failed.
    fn error(&self, invocation: InvocationId, error: &(dyn Error + 'static)) {
        let _ = (invocation, error);
    }

    /// The call succeeded.
    fn exit(&self, invocation: InvocationId, result: &ResultSnapshot) {
        let _ = (invocation, result);
    }
}

/// [`CallObserver`] forwarding every event to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl CallObserver for TracingObserver {
    fn enter(&self, invocation: InvocationId, operation: &str, arguments: &Arguments) {
        info!(%invocation, operation, ?arguments, "enter");
    }

    fn request_sent(&self, invocation: InvocationId, request: &Request<Bytes>) {
        debug!(%invocation, method = %request.method(), uri = %request.uri(), "request sent");
    }

    fn response_received(&self, invocation: InvocationId, response: &Response<Bytes>) {
        debug!(%invocation, status = %response.status(), "response received");
    }

    fn error(&self, invocation: InvocationId, error: &(dyn Error + 'static)) {
        warn!(%invocation, %error, "call failed");
    }

    fn exit(&self, invocation: InvocationId, result: &ResultSnapshot) {
        info!(
            %invocation,
            status = %result.status,
            request_id = ?result.request_id,
            has_body = result.has_body,
            "exit"
        );
    }
}
