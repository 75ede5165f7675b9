use http::HeaderMap;
use http::header::{HeaderName, HeaderValue};
use indexmap::IndexMap;

use crate::client::error::RequestError;

/// Caller-supplied headers for one call.
///
/// Each header name maps to an ordered sequence of values. Custom headers are applied
/// last: they replace any header with the same (case-insensitive) name set by the
/// client configuration, the correlation id, or header parameters.
///
/// # Example
///
/// ```rust
/// use restwire_core::CustomHeaders;
///
/// let headers = CustomHeaders::new()
///     .add_header("x-ms-tags", "first")
///     .add_header("x-ms-tags", "second")
///     .add_header("accept-language", "fr-FR");
///
/// assert_eq!(headers.len(), 2);
/// assert_eq!(headers.values("x-ms-tags"), Some(&["first".to_string(), "second".to_string()][..]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomHeaders {
    headers: IndexMap<String, Vec<String>>,
}

impl CustomHeaders {
    /// Creates a new empty `CustomHeaders` instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value to the header, keeping previous values of the same header.
    pub fn add_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Sets all the values of a header, replacing previous ones.
    pub fn with_values<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.headers.insert(name.into(), values);
        self
    }

    /// Merges another `CustomHeaders` instance into this one.
    ///
    /// Headers from the other instance will override headers with the same name in this instance.
    pub fn merge(mut self, other: Self) -> Self {
        for (name, values) in other.headers {
            self.headers.insert(name, values);
        }
        self
    }

    /// Returns the values of a header, as supplied.
    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.headers.get(name).map(Vec::as_slice)
    }

    /// Checks if the headers collection is empty.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Returns the number of distinct header names.
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Applies the headers to a request header map.
    ///
    /// Every custom header first removes all existing values with the same name.
    pub(in crate::client) fn apply_to(&self, target: &mut HeaderMap) -> Result<(), RequestError> {
        for (name, values) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())?;
            target.remove(&name);
            for value in values {
                target.append(name.clone(), HeaderValue::from_str(value)?);
            }
        }
        Ok(())
    }
}
