use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use http::{Request, Response};
use tracing::debug;

/// A boxed, sendable future, as returned by the collaborator traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors raised while sending a request through a [`Transport`].
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum TransportError {
    /// HTTP client error from the underlying reqwest library.
    ///
    /// Occurs when network requests fail, timeouts occur, or connection issues arise.
    ReqwestError(reqwest::Error),

    /// HTTP protocol error from the http crate.
    HttpError(http::Error),

    /// Failure reported by a custom transport.
    #[display("Transport failure: {message}")]
    #[from(skip)]
    Failure {
        /// Description of the failure.
        message: String,
    },
}

impl TransportError {
    /// Creates a transport failure from a message, for custom [`Transport`] implementations.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }
}

/// Transport collaborator: sends one request and returns the buffered response.
///
/// The executor treats the transport as an opaque capability. Implementations
/// own connection management, TLS, timeouts and the like.
///
/// # Example
///
/// ```rust
/// use bytes::Bytes;
/// use http::{Request, Response, StatusCode};
/// use restwire_core::{BoxFuture, Transport, TransportError};
///
/// #[derive(Debug)]
/// struct AlwaysNoContent;
///
/// impl Transport for AlwaysNoContent {
///     fn send(&self, _request: Request<Bytes>) -> BoxFuture<'_, Result<Response<Bytes>, TransportError>> {
///         Box::pin(async {
///             let mut response = Response::new(Bytes::new());
///             *response.status_mut() = StatusCode::NO_CONTENT;
///             Ok(response)
///         })
///     }
/// }
/// ```
pub trait Transport: Debug + Send + Sync + 'static {
    /// Sends the request.
    ///
    /// Dropping the returned future aborts the exchange.
    fn send(&self, request: Request<Bytes>) -> BoxFuture<'_, Result<Response<Bytes>, TransportError>>;
}

/// [`Transport`] backed by a [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Wraps an existing reqwest client, keeping its connection pool and settings.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl From<reqwest::Client> for ReqwestTransport {
    fn from(client: reqwest::Client) -> Self {
        Self::new(client)
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: Request<Bytes>) -> BoxFuture<'_, Result<Response<Bytes>, TransportError>> {
        Box::pin(async move {
            let request = reqwest::Request::try_from(request)?;
            let response = self.client.execute(request).await?;

            let status = response.status();
            let version = response.version();
            let headers = response.headers().clone();
            let body = response.bytes().await?;
            debug!(%status, length = body.len(), "response body read");

            let mut result = Response::new(body);
            *result.status_mut() = status;
            *result.version_mut() = version;
            *result.headers_mut() = headers;
            Ok(result)
        })
    }
}
