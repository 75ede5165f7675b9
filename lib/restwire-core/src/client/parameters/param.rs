use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;

use crate::client::error::RequestError;

/// Characters escaped in path segments and query components: everything but RFC 3986 unreserved.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encodes a rendered value for use in a path segment or query component.
pub(in crate::client) fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Parameter styles, following the OpenAPI 3.1 vocabulary.
///
/// These styles define how array values are rendered in strings.
///
/// # Examples
///
/// ```rust
/// use restwire_core::ParamStyle;
///
/// // Form style (query default) - arrays are repeated: ?tags=rust&tags=web
/// assert_eq!(ParamStyle::Default.query_style(), ParamStyle::Form);
///
/// // Simple style (path and header default) - arrays are comma separated: rust,web
/// assert_eq!(ParamStyle::Default.path_style(), ParamStyle::Simple);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamStyle {
    /// Default style - will use Form for query parameters and Simple for path and header parameters
    #[default]
    Default,
    /// Form style: `param=value1&param=value2` (query default)
    Form,
    /// Simple style: `value1,value2` (path default)
    Simple,
    /// Space delimited: `param=value1 value2`
    SpaceDelimited,
    /// Pipe delimited: `param=value1|value2`
    PipeDelimited,
    /// Label style: `/users/.value` (path parameter with . prefix)
    Label,
    /// Matrix style: `/users/;name=value` (path parameter with ; prefix)
    Matrix,
}

impl ParamStyle {
    /// Get the actual style to use for query parameters
    pub fn query_style(self) -> Self {
        match self {
            Self::Default => Self::Form,
            style => style,
        }
    }

    /// Get the actual style to use for path parameters
    pub fn path_style(self) -> Self {
        match self {
            Self::Default => Self::Simple,
            style => style,
        }
    }

    /// Get the actual style to use for header parameters
    pub fn header_style(self) -> Self {
        match self {
            Self::Default => Self::Simple,
            style => style,
        }
    }

    fn delimiter(self) -> &'static str {
        match self {
            Self::SpaceDelimited => " ",
            Self::PipeDelimited => "|",
            Self::Default | Self::Form | Self::Simple | Self::Label | Self::Matrix => ",",
        }
    }
}

fn scalar_to_string(name: &str, value: &Value) -> Result<String, RequestError> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => Err(RequestError::UnsupportedParameterValue {
            name: name.to_string(),
            message: "nested complex values not supported in parameters".to_string(),
            value: value.clone(),
        }),
    }
}

fn array_to_strings(name: &str, items: &[Value]) -> Result<Vec<String>, RequestError> {
    items
        .iter()
        .map(|item| scalar_to_string(name, item))
        .collect()
}

/// Renders a parameter value as a single string.
///
/// Arrays are joined with the style delimiter, objects are rejected.
pub(in crate::client) fn render_value(
    name: &str,
    value: &Value,
    style: ParamStyle,
) -> Result<String, RequestError> {
    match value {
        Value::Array(items) => Ok(array_to_strings(name, items)?.join(style.delimiter())),
        Value::Object(_) => Err(RequestError::UnsupportedParameterValue {
            name: name.to_string(),
            message: "object values not supported in parameters".to_string(),
            value: value.clone(),
        }),
        _ => scalar_to_string(name, value),
    }
}

/// Renders a query parameter value as one string per `key=value` pair.
///
/// With the form style, arrays repeat the parameter; other styles join the items.
pub(in crate::client) fn render_query_values(
    name: &str,
    value: &Value,
    style: ParamStyle,
) -> Result<Vec<String>, RequestError> {
    match (value, style.query_style()) {
        (Value::Array(items), ParamStyle::Form) => array_to_strings(name, items),
        (_, style) => render_value(name, value, style).map(|rendered| vec![rendered]),
    }
}

/// Renders a path parameter value, applying the label and matrix prefixes.
///
/// The result is percent-encoded.
pub(in crate::client) fn render_path_value(
    name: &str,
    value: &Value,
    style: ParamStyle,
) -> Result<String, RequestError> {
    let style = style.path_style();
    let rendered = encode_component(&render_value(name, value, style)?);
    let result = match style {
        ParamStyle::Label => format!(".{rendered}"),
        ParamStyle::Matrix => format!(";{name}={rendered}"),
        _ => rendered,
    };
    // URL parsing would resolve these as dot segments, even percent-encoded
    if matches!(result.as_str(), "." | "..") {
        return Err(RequestError::UnsupportedParameterValue {
            name: name.to_string(),
            message: "dot segments not supported in path parameters".to_string(),
            value: value.clone(),
        });
    }
    Ok(result)
}
