use std::error::Error;
use std::fmt::Debug;

use super::codec::CodecError;
use super::credentials::CredentialError;
use super::result::{ErrorBody, OperationError};
use super::transport::TransportError;

/// Maximum number of body bytes kept in error messages.
pub(in crate::client) const BODY_MAX_LENGTH: usize = 1024;

/// Truncates a body for diagnostics, on a character boundary.
pub(in crate::client) fn truncate_body(text: &str) -> String {
    if text.len() <= BODY_MAX_LENGTH {
        return text.to_string();
    }
    let mut end = BODY_MAX_LENGTH;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let head = text.get(..end).unwrap_or_default();
    format!("{head}... (truncated)")
}

/// Validation rules checked before any network activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum ValidationRule {
    /// A required argument is missing or `null`.
    #[display("cannot be null")]
    CannotBeNull,

    /// A path template placeholder has no parameter binding.
    #[display("is not bound to any parameter")]
    UnresolvedPlaceholder,
}

/// A required argument is missing, raised before the transport is involved.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("'{target}' {rule}")]
pub struct ValidationError {
    rule: ValidationRule,
    target: String,
}

impl ValidationError {
    pub(in crate::client) fn new(rule: ValidationRule, target: impl Into<String>) -> Self {
        Self {
            rule,
            target: target.into(),
        }
    }

    /// The violated rule.
    pub fn rule(&self) -> ValidationRule {
        self.rule
    }

    /// Name of the offending parameter or placeholder.
    pub fn target(&self) -> &str {
        &self.target
    }
}

/// The request could not be built from the descriptor and arguments.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum RequestError {
    /// URL parsing error when constructing request URLs.
    UrlError(url::ParseError),

    /// HTTP protocol error from the http crate.
    HttpError(http::Error),

    /// Invalid HTTP header name.
    InvalidHeaderName(http::header::InvalidHeaderName),

    /// Invalid HTTP header value.
    InvalidHeaderValue(http::header::InvalidHeaderValue),

    /// The request body could not be encoded.
    #[display("Unable to serialize the request body: {_0}")]
    Serialization(CodecError),

    /// An argument could not be converted to a JSON value.
    #[display("Unable to serialize argument '{name}': {message}")]
    #[from(skip)]
    InvalidArgument {
        /// Name of the argument.
        name: String,
        /// Description of the serialization failure.
        message: String,
    },

    /// Parameter value cannot be rendered in its location.
    #[display("Unsupported value for parameter '{name}': {message}. Got: {value}")]
    #[from(skip)]
    UnsupportedParameterValue {
        /// Name of the parameter.
        name: String,
        /// Specific error message describing the conversion failure.
        message: String,
        /// The value that failed to convert.
        value: serde_json::Value,
    },
}

/// The client configuration is invalid.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum ClientBuildError {
    /// Invalid base path provided during client configuration.
    #[display("Invalid base path: {error}")]
    #[from(skip)]
    InvalidBasePath {
        /// Description of why the base path is invalid.
        error: String,
    },

    /// The base URI could not be parsed.
    UrlError(url::ParseError),

    /// The base URI could not be built.
    HttpError(http::Error),

    /// Invalid default, correlation or request id header name.
    InvalidHeaderName(http::header::InvalidHeaderName),

    /// Invalid default or `accept-language` header value.
    InvalidHeaderValue(http::header::InvalidHeaderValue),
}

/// A success status was returned but the body does not decode into the declared type.
#[derive(Debug, derive_more::Display)]
#[display("Unable to deserialize the response: {source}\n{body}")]
pub struct DeserializationError {
    source: CodecError,
    body: String,
}

impl DeserializationError {
    pub(in crate::client) fn new(source: CodecError, body: &[u8]) -> Self {
        let body = truncate_body(&String::from_utf8_lossy(body));
        Self { source, body }
    }

    /// The codec error.
    pub fn codec_error(&self) -> &CodecError {
        &self.source
    }

    /// The (possibly truncated) response body that failed to decode.
    pub fn body(&self) -> &str {
        &self.body
    }
}

impl Error for DeserializationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Errors returned by [`ServiceClient::execute`](crate::ServiceClient::execute).
///
/// `E` is the type the descriptor decodes error bodies into.
///
/// # Example
///
/// ```rust
/// use restwire_core::{ServiceError, ErrorBody};
///
/// fn describe(error: &ServiceError<ErrorBody>) -> String {
///     match error {
///         ServiceError::Validation(err) => format!("bad arguments: {err}"),
///         ServiceError::Operation(err) => format!("server said no: {}", err.status()),
///         ServiceError::Cancelled => "we gave up".to_string(),
///         other => other.to_string(),
///     }
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::From)]
pub enum ServiceError<E = ErrorBody> {
    /// A required argument is missing, no request was sent.
    #[display("{_0}")]
    Validation(ValidationError),

    /// The request could not be built, no request was sent.
    #[display("{_0}")]
    InvalidRequest(RequestError),

    /// The credentials could not be applied, no request was sent.
    #[display("{_0}")]
    Credentials(CredentialError),

    /// The transport failed to send the request.
    #[display("{_0}")]
    Transport(TransportError),

    /// The server answered with a status outside of the success set.
    #[display("{_0}")]
    Operation(OperationError<E>),

    /// The server answered with a success status but the body does not decode.
    #[display("{_0}")]
    Deserialization(DeserializationError),

    /// The call was cancelled.
    #[display("The operation was cancelled")]
    #[from(skip)]
    Cancelled,
}

impl<E> ServiceError<E> {
    /// Returns the operation error if the server rejected the call.
    pub fn as_operation_error(&self) -> Option<&OperationError<E>> {
        match self {
            Self::Operation(error) => Some(error),
            _ => None,
        }
    }

    /// Checks whether the call was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl<E> From<url::ParseError> for ServiceError<E> {
    fn from(value: url::ParseError) -> Self {
        Self::InvalidRequest(RequestError::from(value))
    }
}

impl<E> From<http::Error> for ServiceError<E> {
    fn from(value: http::Error) -> Self {
        Self::InvalidRequest(RequestError::from(value))
    }
}

impl<E> From<http::header::InvalidHeaderName> for ServiceError<E> {
    fn from(value: http::header::InvalidHeaderName) -> Self {
        Self::InvalidRequest(RequestError::from(value))
    }
}

impl<E> From<http::header::InvalidHeaderValue> for ServiceError<E> {
    fn from(value: http::header::InvalidHeaderValue) -> Self {
        Self::InvalidRequest(RequestError::from(value))
    }
}

impl<E> Error for ServiceError<E>
where
    E: Debug,
{
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(error) => Some(error),
            Self::InvalidRequest(error) => Some(error),
            Self::Credentials(error) => Some(error),
            Self::Transport(error) => Some(error),
            Self::Deserialization(error) => Some(error),
            Self::Operation(_) | Self::Cancelled => None,
        }
    }
}
