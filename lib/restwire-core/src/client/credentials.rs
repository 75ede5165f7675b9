use std::fmt;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::Request;
use tokio_util::sync::CancellationToken;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::transport::BoxFuture;

/// Errors that can occur while attaching credentials to a request.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error, derive_more::Display)]
pub enum CredentialError {
    /// Credential header name is invalid.
    #[display("Invalid credential header name '{header_name}': {message}")]
    InvalidHeaderName {
        /// The invalid header name that was provided.
        header_name: String,
        /// Description of why the header name is invalid.
        message: String,
    },

    /// Credential value contains invalid characters for HTTP headers.
    #[display("Credential value contains invalid characters: {message}")]
    InvalidHeaderValue {
        /// Description of the invalid characters or format issue.
        message: String,
    },

    /// The credential provider could not produce credentials.
    #[display("Credential provider failed: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },
}

/// Secure wrapper for sensitive string data that automatically zeroes memory on drop.
///
/// This wrapper ensures that sensitive credential data is cleared from memory
/// when it's no longer needed, and never shows up in full in logs.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecureString(String);

impl SecureString {
    /// Creates a new secure string from the provided value.
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// Returns a reference to the inner string value.
    ///
    /// # Security Note
    /// The returned reference should not be stored for extended periods
    /// to minimize exposure time of sensitive data.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Masks sensitive data for display/logging purposes.
    fn mask_sensitive(value: &str) -> String {
        let prefix = value.get(..4);
        let suffix = value.len().checked_sub(4).and_then(|start| value.get(start..));
        match (prefix, suffix) {
            (Some(prefix), Some(suffix)) if value.len() > 8 => format!("{prefix}...{suffix}"),
            _ => "***".to_string(),
        }
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureString")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Self::mask_sensitive(&self.0))
    }
}

impl From<String> for SecureString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecureString {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

/// Credential collaborator.
///
/// Credentials get a scoped opportunity to mutate each outgoing request before it is
/// dispatched, typically to add an authorization header. The step is asynchronous
/// (tokens may need to be fetched) and receives the call's cancellation token.
///
/// Concrete authentication schemes live outside of this crate; [`HeaderCredentials`]
/// covers the common "static secret header" case.
pub trait Credentials: fmt::Debug + Send + Sync + 'static {
    /// Mutates the request, e.g. by inserting an `authorization` header.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] when the credentials cannot be applied.
    fn process_request<'a>(
        &'a self,
        request: &'a mut Request<Bytes>,
        cancellation: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<(), CredentialError>>;
}

/// Credentials that set a single header carrying a secret value.
///
/// # Example
///
/// ```rust
/// use restwire_core::HeaderCredentials;
///
/// let credentials = HeaderCredentials::new("authorization", "Bearer my-api-token");
/// assert_eq!(credentials.to_string(), "authorization: Bear...oken");
/// ```
#[derive(Debug, Clone)]
pub struct HeaderCredentials {
    header_name: String,
    value: SecureString,
}

impl HeaderCredentials {
    /// Creates credentials setting `header_name: value` on every request.
    pub fn new(header_name: impl Into<String>, value: impl Into<SecureString>) -> Self {
        Self {
            header_name: header_name.into(),
            value: value.into(),
        }
    }

    /// Converts the credentials into an HTTP header.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] if the header name or value contains invalid characters.
    pub fn to_header(&self) -> Result<(HeaderName, HeaderValue), CredentialError> {
        let name = HeaderName::from_bytes(self.header_name.as_bytes()).map_err(|err| {
            CredentialError::InvalidHeaderName {
                header_name: self.header_name.clone(),
                message: err.to_string(),
            }
        })?;
        let mut value = HeaderValue::from_str(self.value.as_str()).map_err(|err| {
            CredentialError::InvalidHeaderValue {
                message: err.to_string(),
            }
        })?;
        value.set_sensitive(true);
        Ok((name, value))
    }
}

impl fmt::Display for HeaderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.header_name, self.value)
    }
}

impl Credentials for HeaderCredentials {
    fn process_request<'a>(
        &'a self,
        request: &'a mut Request<Bytes>,
        _cancellation: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<(), CredentialError>> {
        Box::pin(async move {
            let (name, value) = self.to_header()?;
            request.headers_mut().insert(name, value);
            Ok(())
        })
    }
}
