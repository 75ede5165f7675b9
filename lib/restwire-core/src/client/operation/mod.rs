//! Declarative description of one endpoint.
//!
//! An [`OperationDescriptor`] is built once per endpoint, usually in a `static` or a
//! thin generated method, and handed to [`ServiceClient::execute`](crate::ServiceClient::execute)
//! with the call arguments.

use std::borrow::Cow;
use std::fmt::{self, Debug};
use std::marker::PhantomData;

use http::Method;

use super::parameters::ParamStyle;
use super::result::ErrorBody;

mod status;
pub use self::status::ExpectedStatusCodes;

/// Where a parameter goes in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ParameterLocation {
    /// Substituted into a `{placeholder}` of the path template.
    #[display("path")]
    Path,
    /// Appended to the query string.
    #[display("query")]
    Query,
    /// Sent as a request header.
    #[display("header")]
    Header,
    /// Encoded with the client codec as the request payload.
    #[display("body")]
    Body,
}

/// Binds an argument name to a location in the request.
///
/// Path and body bindings are required by default, query and header bindings optional.
///
/// # Example
///
/// ```rust
/// use restwire_core::{ParamStyle, ParameterBinding, ParameterLocation};
///
/// let binding = ParameterBinding::query("tags")
///     .required()
///     .with_style(ParamStyle::PipeDelimited);
///
/// assert_eq!(binding.location(), ParameterLocation::Query);
/// assert!(binding.is_required());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterBinding {
    name: Cow<'static, str>,
    wire_name: Option<Cow<'static, str>>,
    location: ParameterLocation,
    required: bool,
    style: ParamStyle,
}

impl ParameterBinding {
    /// Creates a binding.
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        location: ParameterLocation,
        required: bool,
    ) -> Self {
        Self {
            name: name.into(),
            wire_name: None,
            location,
            required,
            style: ParamStyle::Default,
        }
    }

    /// A required path parameter.
    pub fn path(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(name, ParameterLocation::Path, true)
    }

    /// An optional query parameter.
    pub fn query(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(name, ParameterLocation::Query, false)
    }

    /// An optional header parameter.
    pub fn header(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(name, ParameterLocation::Header, false)
    }

    /// A required body parameter.
    pub fn body(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(name, ParameterLocation::Body, true)
    }

    /// Marks the parameter as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the parameter as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Sets the rendering style of array values.
    pub fn with_style(mut self, style: ParamStyle) -> Self {
        self.style = style;
        self
    }

    /// Uses another name on the wire, e.g. `api-version` for an `api_version` argument.
    ///
    /// Applies to query keys, header names and path placeholders.
    pub fn with_wire_name(mut self, wire_name: impl Into<Cow<'static, str>>) -> Self {
        self.wire_name = Some(wire_name.into());
        self
    }

    /// The argument name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name used in the request.
    pub fn wire_name(&self) -> &str {
        self.wire_name.as_deref().unwrap_or(&*self.name)
    }

    /// The parameter location.
    pub fn location(&self) -> ParameterLocation {
        self.location
    }

    /// Whether a missing or `null` value fails the call.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The rendering style.
    pub fn style(&self) -> ParamStyle {
        self.style
    }
}

/// Immutable description of one endpoint.
///
/// `T` is the decoded response body type (`()` when the response carries nothing of
/// interest), `E` the decoded error body type.
///
/// # Example
///
/// ```rust
/// use restwire_core::{OperationDescriptor, ParameterBinding, success_codes};
///
/// #[derive(serde::Deserialize)]
/// struct Widget {
///     id: String,
/// }
///
/// let get_widget = OperationDescriptor::get("/widgets/{widgetId}")
///     .with_name("Widgets_Get")
///     .with_parameter(ParameterBinding::path("widgetId"))
///     .with_parameter(ParameterBinding::query("api-version").required())
///     .with_success_codes(success_codes!(200, 203))
///     .returns::<Widget>();
///
/// assert_eq!(get_widget.name(), "Widgets_Get");
/// assert!(get_widget.success_codes().contains(203));
/// ```
pub struct OperationDescriptor<T = (), E = ErrorBody> {
    name: Cow<'static, str>,
    method: Method,
    path: Cow<'static, str>,
    parameters: Vec<ParameterBinding>,
    success: ExpectedStatusCodes,
    decode_response: bool,
    decode_error: bool,
    types: PhantomData<fn() -> (T, E)>,
}

impl OperationDescriptor {
    /// Creates a descriptor without response type, named after its method and path.
    pub fn new(method: Method, path: impl Into<Cow<'static, str>>) -> Self {
        let path = path.into();
        Self {
            name: Cow::Owned(format!("{method} {path}")),
            method,
            path,
            parameters: Vec::new(),
            success: ExpectedStatusCodes::default(),
            decode_response: false,
            decode_error: true,
            types: PhantomData,
        }
    }

    /// A `GET` operation.
    pub fn get(path: impl Into<Cow<'static, str>>) -> Self {
        Self::new(Method::GET, path)
    }

    /// A `PUT` operation.
    pub fn put(path: impl Into<Cow<'static, str>>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// A `POST` operation.
    pub fn post(path: impl Into<Cow<'static, str>>) -> Self {
        Self::new(Method::POST, path)
    }

    /// A `PATCH` operation.
    pub fn patch(path: impl Into<Cow<'static, str>>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// A `DELETE` operation.
    pub fn delete(path: impl Into<Cow<'static, str>>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// A `HEAD` operation.
    pub fn head(path: impl Into<Cow<'static, str>>) -> Self {
        Self::new(Method::HEAD, path)
    }
}

impl<T, E> OperationDescriptor<T, E> {
    /// Sets the operation name reported to observers and logs.
    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a parameter binding.
    ///
    /// Bindings are applied in insertion order. Only the first body binding is used.
    pub fn with_parameter(mut self, binding: ParameterBinding) -> Self {
        self.parameters.push(binding);
        self
    }

    /// Replaces the success set (defaults to `200`).
    pub fn with_success_codes(mut self, codes: impl Into<ExpectedStatusCodes>) -> Self {
        self.success = codes.into();
        self
    }

    /// Adds one status code to the success set.
    pub fn add_success_code(mut self, status: u16) -> Self {
        self.success = self.success.add_single(status);
        self
    }

    /// Declares the decoded response body type.
    pub fn returns<U>(self) -> OperationDescriptor<U, E> {
        OperationDescriptor {
            name: self.name,
            method: self.method,
            path: self.path,
            parameters: self.parameters,
            success: self.success,
            decode_response: true,
            decode_error: self.decode_error,
            types: PhantomData,
        }
    }

    /// Declares the decoded error body type.
    pub fn with_error_body<F>(self) -> OperationDescriptor<T, F> {
        OperationDescriptor {
            name: self.name,
            method: self.method,
            path: self.path,
            parameters: self.parameters,
            success: self.success,
            decode_response: self.decode_response,
            decode_error: true,
            types: PhantomData,
        }
    }

    /// Keeps error bodies raw, never decoding them.
    pub fn without_error_body(mut self) -> Self {
        self.decode_error = false;
        self
    }

    /// The operation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The path template.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The parameter bindings, in order.
    pub fn parameters(&self) -> &[ParameterBinding] {
        &self.parameters
    }

    /// The success set.
    pub fn success_codes(&self) -> &ExpectedStatusCodes {
        &self.success
    }

    /// Whether success bodies are decoded.
    pub fn decodes_response(&self) -> bool {
        self.decode_response
    }

    /// Whether error bodies are decoded.
    pub fn decodes_error(&self) -> bool {
        self.decode_error
    }

    pub(in crate::client) fn bindings_in(
        &self,
        location: ParameterLocation,
    ) -> impl Iterator<Item = &ParameterBinding> {
        self.parameters
            .iter()
            .filter(move |binding| binding.location == location)
    }

    pub(in crate::client) fn body_binding(&self) -> Option<&ParameterBinding> {
        self.bindings_in(ParameterLocation::Body).next()
    }
}

impl<T, E> Clone for OperationDescriptor<T, E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            method: self.method.clone(),
            path: self.path.clone(),
            parameters: self.parameters.clone(),
            success: self.success.clone(),
            decode_response: self.decode_response,
            decode_error: self.decode_error,
            types: PhantomData,
        }
    }
}

impl<T, E> Debug for OperationDescriptor<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationDescriptor")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("parameters", &self.parameters)
            .field("success", &self.success)
            .field("response", &std::any::type_name::<T>())
            .field("error", &std::any::type_name::<E>())
            .finish()
    }
}
