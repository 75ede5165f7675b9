use std::fmt::{self, Debug};

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use super::codec::{Codec, JsonCodec};

/// Successful outcome of an executor call.
#[derive(Debug, Clone)]
pub struct ExecutionResult<T> {
    pub(in crate::client) body: Option<T>,
    pub(in crate::client) status: StatusCode,
    pub(in crate::client) headers: HeaderMap,
    pub(in crate::client) request_id: Option<String>,
}

impl<T> ExecutionResult<T> {
    /// The decoded body; `None` when no type was declared or the body was empty or `null`.
    pub fn body(&self) -> Option<&T> {
        self.body.as_ref()
    }

    /// Consumes the result, returning the decoded body.
    pub fn into_body(self) -> Option<T> {
        self.body
    }

    /// The response status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The server-assigned request id, read from the configured response header.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }
}

/// Generic error payload: a message plus arbitrary extension fields.
///
/// ```rust
/// use restwire_core::ErrorBody;
///
/// let body: ErrorBody = serde_json::from_str(r#"{"message": "not found", "status": 404}"#)?;
/// assert_eq!(body.message.as_deref(), Some("not found"));
/// assert_eq!(body.extensions["status"], 404);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Every other field of the payload.
    #[serde(flatten)]
    pub extensions: serde_json::Map<String, serde_json::Value>,
}

/// The server answered with a status code outside of the descriptor's success set.
///
/// The raw body is always kept; the decoded body is present only when the descriptor
/// declares an error type and the body decodes into it.
#[derive(Clone)]
pub struct OperationError<E = ErrorBody> {
    pub(in crate::client) method: Method,
    pub(in crate::client) url: Url,
    pub(in crate::client) status: StatusCode,
    pub(in crate::client) headers: HeaderMap,
    pub(in crate::client) raw_body: Bytes,
    pub(in crate::client) body: Option<E>,
    pub(in crate::client) request_id: Option<String>,
}

impl<E> OperationError<E> {
    /// The response status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The method of the rejected request.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The URL of the rejected request.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The raw response body.
    pub fn raw_body(&self) -> &[u8] {
        &self.raw_body
    }

    /// The raw response body as text, invalid UTF-8 sequences replaced.
    pub fn raw_text(&self) -> String {
        String::from_utf8_lossy(&self.raw_body).into_owned()
    }

    /// The decoded error body, if it could be decoded.
    pub fn body(&self) -> Option<&E> {
        self.body.as_ref()
    }

    /// The server-assigned request id, read from the configured response header.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// The human readable message.
    pub fn message(&self) -> String {
        format!(
            "Operation returned an invalid status code '{}'",
            self.status.as_u16()
        )
    }

    /// Decodes the raw body as JSON into another type.
    ///
    /// Returns `None` when the body does not decode.
    pub fn body_as<X>(&self) -> Option<X>
    where
        X: DeserializeOwned,
    {
        JsonCodec.decode(&self.raw_body).ok()
    }
}

impl<E> Debug for OperationError<E>
where
    E: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationError")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("status", &self.status)
            .field("request_id", &self.request_id)
            .field("body", &self.body)
            .field("raw_body", &String::from_utf8_lossy(&self.raw_body))
            .finish_non_exhaustive()
    }
}

impl<E> fmt::Display for OperationError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}
