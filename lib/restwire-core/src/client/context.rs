use std::fmt::{self, Debug};

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::error::RequestError;
use super::parameters::CustomHeaders;

/// Argument values supplied for one call, by parameter name.
///
/// Values are converted to JSON when inserted. A conversion failure is kept and
/// reported when the call is executed, so building a context never fails.
///
/// `None` values serialize to `null`, which the executor treats as absent.
#[derive(Clone, Default, PartialEq)]
pub struct Arguments {
    values: IndexMap<String, Result<Value, String>>,
}

impl Arguments {
    /// Creates an empty set of arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes and stores an argument, replacing a previous value with the same name.
    pub fn insert<T>(&mut self, name: impl Into<String>, value: &T)
    where
        T: Serialize + ?Sized,
    {
        let value = serde_json::to_value(value).map_err(|err| err.to_string());
        self.values.insert(name.into(), value);
    }

    /// Stores an already converted argument.
    pub fn insert_value(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), Ok(value));
    }

    /// Returns the JSON value of an argument.
    ///
    /// `None` when the argument is missing or could not be serialized.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name).and_then(|value| value.as_ref().ok())
    }

    /// Checks whether an argument was supplied, even as `null`.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Names of the supplied arguments, in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of supplied arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Checks if no argument was supplied.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Looks an argument up for the executor.
    ///
    /// Missing and `null` arguments are both `Ok(None)`; a deferred serialization
    /// failure surfaces as [`RequestError::InvalidArgument`].
    pub(in crate::client) fn lookup(&self, name: &str) -> Result<Option<&Value>, RequestError> {
        match self.values.get(name) {
            None | Some(Ok(Value::Null)) => Ok(None),
            Some(Ok(value)) => Ok(Some(value)),
            Some(Err(message)) => Err(RequestError::InvalidArgument {
                name: name.to_string(),
                message: message.clone(),
            }),
        }
    }
}

impl Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, value) in &self.values {
            match value {
                Ok(value) => map.entry(name, &format_args!("{value}")),
                Err(message) => map.entry(name, &format_args!("<invalid: {message}>")),
            };
        }
        map.finish()
    }
}

/// Per-call state handed to [`ServiceClient::execute`](crate::ServiceClient::execute).
///
/// # Example
///
/// ```rust
/// use restwire_core::RequestContext;
/// use tokio_util::sync::CancellationToken;
///
/// let token = CancellationToken::new();
/// let context = RequestContext::new()
///     .with_arg("durationBody", "P123DT22H14M12.011S")
///     .with_header("x-ms-tags", "nightly")
///     .with_cancellation(token.clone());
///
/// assert!(context.arguments().contains("durationBody"));
/// assert!(!context.cancellation().is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    arguments: Arguments,
    custom_headers: CustomHeaders,
    cancellation: CancellationToken,
    base_uri: Option<Url>,
    client_request_id: Option<String>,
}

impl RequestContext {
    /// Creates an empty context with a fresh, never cancelled, token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an argument; `None` values are treated as absent.
    pub fn with_arg<T>(mut self, name: impl Into<String>, value: T) -> Self
    where
        T: Serialize,
    {
        self.arguments.insert(name, &value);
        self
    }

    /// Replaces all arguments.
    pub fn with_arguments(mut self, arguments: Arguments) -> Self {
        self.arguments = arguments;
        self
    }

    /// Merges custom headers into the context; later headers win.
    pub fn with_custom_headers(mut self, headers: CustomHeaders) -> Self {
        self.custom_headers = self.custom_headers.merge(headers);
        self
    }

    /// Appends one custom header value.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers = self.custom_headers.add_header(name, value);
        self
    }

    /// Sets the cancellation token observed by the call.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Overrides the client base URI for this call.
    pub fn with_base_uri(mut self, base_uri: Url) -> Self {
        self.base_uri = Some(base_uri);
        self
    }

    /// Uses the given correlation id instead of generating one.
    pub fn with_client_request_id(mut self, id: impl Into<String>) -> Self {
        self.client_request_id = Some(id.into());
        self
    }

    /// The supplied arguments.
    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// The caller's custom headers.
    pub fn custom_headers(&self) -> &CustomHeaders {
        &self.custom_headers
    }

    /// The cancellation token.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// The base URI override, if any.
    pub fn base_uri(&self) -> Option<&Url> {
        self.base_uri.as_ref()
    }

    /// The caller-supplied correlation id, if any.
    pub fn client_request_id(&self) -> Option<&str> {
        self.client_request_id.as_deref()
    }
}
