//! Scripted in-memory transport for testing code built on [`ServiceClient`](crate::ServiceClient).
//!
//! [`MockTransport`] is both a stub and a spy: it answers with scripted
//! [`MockResponse`]s, in order, and records every request it receives. Clones share
//! the same script and recordings, so a test can keep one handle while the client
//! owns another.
//!
//! # Example
//!
//! ```rust
//! use http::StatusCode;
//! use restwire_core::test_transport::{MockResponse, MockTransport};
//! use restwire_core::{OperationDescriptor, ParameterBinding, RequestContext, ServiceClient};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = MockTransport::new().respond_with(MockResponse::new(StatusCode::OK));
//! let client = ServiceClient::builder()
//!     .with_transport(transport.clone())
//!     .build()?;
//!
//! let put = OperationDescriptor::put("/duration/positiveduration")
//!     .with_parameter(ParameterBinding::body("durationBody"));
//!
//! // A required body that is missing never reaches the transport
//! let result = client.execute(&put, RequestContext::new()).await;
//! assert!(result.is_err());
//! assert_eq!(transport.call_count(), 0);
//!
//! client
//!     .execute(&put, RequestContext::new().with_arg("durationBody", "PT1S"))
//!     .await?;
//! assert_eq!(transport.call_count(), 1);
//! assert_eq!(transport.requests()[0].body_text(), r#""PT1S""#);
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, Method, Request, Response, StatusCode, Uri};
use tracing::debug;

use crate::{BoxFuture, Transport, TransportError};

/// A scripted response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl MockResponse {
    /// A response with an empty body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// A JSON response.
    pub fn json(status: StatusCode, value: &serde_json::Value) -> Self {
        Self::new(status)
            .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .with_body(value.to_string())
    }

    /// A plain text response.
    pub fn text(status: StatusCode, text: impl Into<String>) -> Self {
        Self::new(status)
            .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .with_body(text.into())
    }

    /// Sets the raw body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Appends a response header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    fn into_response(self) -> Response<Bytes> {
        let mut response = Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// A request received by a [`MockTransport`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// The request method.
    pub method: Method,
    /// The full request URI.
    pub uri: Uri,
    /// The request headers, credentials included.
    pub headers: HeaderMap,
    /// The request body.
    pub body: Bytes,
}

impl RecordedRequest {
    /// The body as text, invalid UTF-8 sequences replaced.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// All values of a header, as strings.
    pub fn header_values(&self, name: &str) -> Vec<String> {
        self.headers
            .get_all(name)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .collect()
    }
}

#[derive(Debug, Clone)]
enum Scripted {
    Respond(MockResponse),
    Fail(String),
    Hang,
}

#[derive(Debug, Default)]
struct MockState {
    script: VecDeque<Scripted>,
    fallback: Option<MockResponse>,
    requests: Vec<RecordedRequest>,
}

/// In-memory [`Transport`] answering with scripted responses.
///
/// Scripted outcomes are consumed in order; once the script is exhausted the fallback
/// response is used, and without fallback the call fails with a [`TransportError`].
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Creates a transport with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues a response.
    pub fn respond_with(self, response: MockResponse) -> Self {
        self.state().script.push_back(Scripted::Respond(response));
        self
    }

    /// Queues a transport failure.
    pub fn fail_with(self, message: impl Into<String>) -> Self {
        self.state().script.push_back(Scripted::Fail(message.into()));
        self
    }

    /// Queues an exchange that never completes, to exercise cancellation.
    pub fn hang(self) -> Self {
        self.state().script.push_back(Scripted::Hang);
        self
    }

    /// Answers with this response once the script is exhausted.
    pub fn with_fallback(self, response: MockResponse) -> Self {
        self.state().fallback = Some(response);
        self
    }

    /// Number of requests received.
    pub fn call_count(&self) -> usize {
        self.state().requests.len()
    }

    /// Requests received, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state().requests.clone()
    }

    /// The last request received.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.state().requests.last().cloned()
    }

    fn record(&self, request: Request<Bytes>) -> Option<Scripted> {
        let (parts, body) = request.into_parts();
        let mut state = self.state();
        state.requests.push(RecordedRequest {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
        });
        state
            .script
            .pop_front()
            .or_else(|| state.fallback.clone().map(Scripted::Respond))
    }
}

impl Transport for MockTransport {
    fn send(&self, request: Request<Bytes>) -> BoxFuture<'_, Result<Response<Bytes>, TransportError>> {
        let scripted = self.record(request);
        Box::pin(async move {
            match scripted {
                Some(Scripted::Respond(response)) => {
                    debug!(status = %response.status, "scripted response");
                    Ok(response.into_response())
                }
                Some(Scripted::Fail(message)) => Err(TransportError::failure(message)),
                Some(Scripted::Hang) => std::future::pending().await,
                None => Err(TransportError::failure("no scripted response left")),
            }
        })
    }
}
