use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use headers::HeaderMapExt;
use http::header::{ACCEPT_LANGUAGE, HeaderName, HeaderValue};
use http::{HeaderMap, Request, Response};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use url::Url;
use uuid::Uuid;

use super::codec::Codec;
use super::context::{Arguments, RequestContext};
use super::error::{
    DeserializationError, RequestError, ServiceError, ValidationError, ValidationRule,
};
use super::observer::{CallObserver, InvocationId, ResultSnapshot};
use super::operation::{OperationDescriptor, ParameterLocation};
use super::parameters::{
    PathResolved, QueryPairs, placeholders, render_path_value, render_query_values, render_value,
};
use super::result::{ExecutionResult, OperationError};
use super::ServiceClient;

#[cfg(test)]
mod tests;

/// Keeps the in-flight counter up to date for the lifetime of one exchange.
struct ExchangeGuard<'a> {
    in_flight: &'a AtomicUsize,
    operation: &'a str,
}

impl<'a> ExchangeGuard<'a> {
    fn acquire(in_flight: &'a AtomicUsize, operation: &'a str) -> Self {
        in_flight.fetch_add(1, Ordering::AcqRel);
        Self {
            in_flight,
            operation,
        }
    }
}

impl Drop for ExchangeGuard<'_> {
    fn drop(&mut self) {
        let remaining = self
            .in_flight
            .fetch_sub(1, Ordering::AcqRel)
            .saturating_sub(1);
        trace!(operation = self.operation, remaining, "exchange released");
    }
}

type Invocation<'a> = Option<(&'a dyn CallObserver, InvocationId)>;

fn check_cancelled<E>(cancellation: &CancellationToken) -> Result<(), ServiceError<E>> {
    if cancellation.is_cancelled() {
        debug!("call cancelled");
        return Err(ServiceError::Cancelled);
    }
    Ok(())
}

fn is_blank(body: &[u8]) -> bool {
    body.iter().all(u8::is_ascii_whitespace)
}

fn is_present(arguments: &Arguments, name: &str) -> bool {
    !matches!(arguments.lookup(name), Ok(None))
}

/// Checks the descriptor and arguments before anything is built.
fn validate<T, E>(
    operation: &OperationDescriptor<T, E>,
    arguments: &Arguments,
) -> Result<(), ValidationError> {
    for placeholder in placeholders(operation.path()) {
        let bound = operation
            .bindings_in(ParameterLocation::Path)
            .any(|binding| binding.wire_name() == placeholder);
        if !bound {
            return Err(ValidationError::new(
                ValidationRule::UnresolvedPlaceholder,
                placeholder,
            ));
        }
    }

    for binding in operation.parameters() {
        if binding.is_required() && !is_present(arguments, binding.name()) {
            return Err(ValidationError::new(
                ValidationRule::CannotBeNull,
                binding.name(),
            ));
        }
    }

    for name in arguments.names() {
        if !operation
            .parameters()
            .iter()
            .any(|binding| binding.name() == name)
        {
            warn!(operation = operation.name(), name, "argument not bound to any parameter");
        }
    }
    Ok(())
}

impl<C> ServiceClient<C>
where
    C: Codec,
{
    /// Executes one operation.
    ///
    /// Every required argument is checked before anything goes on the wire. The
    /// response is classified against the descriptor's success set: success bodies
    /// decode into `T` (failing hard), error bodies into `E` (best effort).
    ///
    /// # Errors
    ///
    /// See [`ServiceError`] for the possible failures.
    ///
    /// # Example
    ///
    /// ```rust
    /// use http::StatusCode;
    /// use restwire_core::{OperationDescriptor, RequestContext, ServiceClient};
    /// use restwire_core::test_transport::{MockResponse, MockTransport};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let transport = MockTransport::new()
    ///     .respond_with(MockResponse::json(StatusCode::OK, &serde_json::json!("PT1H")));
    /// let client = ServiceClient::builder()
    ///     .with_transport(transport.clone())
    ///     .build()?;
    ///
    /// let get_null = OperationDescriptor::get("/duration/null").returns::<String>();
    /// let result = client.execute(&get_null, RequestContext::new()).await?;
    ///
    /// assert_eq!(result.body().map(String::as_str), Some("PT1H"));
    /// assert_eq!(transport.call_count(), 1);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn execute<T, E>(
        &self,
        operation: &OperationDescriptor<T, E>,
        context: RequestContext,
    ) -> Result<ExecutionResult<T>, ServiceError<E>>
    where
        T: DeserializeOwned,
        E: DeserializeOwned + Debug + 'static,
    {
        let config = &self.inner;
        let invocation = config.observer.as_deref().map(|observer| {
            let id = InvocationId::next();
            observer.enter(id, operation.name(), context.arguments());
            (observer, id)
        });

        let guard = ExchangeGuard::acquire(&config.in_flight, operation.name());
        let result = self.run(operation, &context, invocation).await;
        drop(guard);

        if let Some((observer, id)) = invocation {
            match &result {
                Ok(success) => observer.exit(
                    id,
                    &ResultSnapshot {
                        status: success.status,
                        request_id: success.request_id.clone(),
                        has_body: success.body.is_some(),
                    },
                ),
                Err(error) => observer.error(id, error),
            }
        }
        result
    }

    /// Builds the request an operation would send, without credentials nor dispatch.
    ///
    /// # Errors
    ///
    /// Fails with [`ServiceError::Validation`] or [`ServiceError::InvalidRequest`], exactly
    /// like [`execute`](Self::execute) would before any network activity.
    pub fn prepare_request<T, E>(
        &self,
        operation: &OperationDescriptor<T, E>,
        context: &RequestContext,
    ) -> Result<Request<Bytes>, ServiceError<E>> {
        let (_, request) = self.build_request(operation, context)?;
        Ok(request)
    }

    async fn run<T, E>(
        &self,
        operation: &OperationDescriptor<T, E>,
        context: &RequestContext,
        invocation: Invocation<'_>,
    ) -> Result<ExecutionResult<T>, ServiceError<E>>
    where
        T: DeserializeOwned,
        E: DeserializeOwned,
    {
        let config = &self.inner;
        let cancellation = context.cancellation();
        let (url, mut request) = self.build_request(operation, context)?;

        if let Some(credentials) = &config.credentials {
            check_cancelled(cancellation)?;
            tokio::select! {
                biased;
                () = cancellation.cancelled() => return Err(ServiceError::Cancelled),
                result = credentials.process_request(&mut request, cancellation) => result?,
            }
        }

        check_cancelled(cancellation)?;
        if let Some((observer, id)) = invocation {
            observer.request_sent(id, &request);
        }

        debug!(?request, "sending...");
        let response = tokio::select! {
            biased;
            () = cancellation.cancelled() => return Err(ServiceError::Cancelled),
            result = config.transport.send(request) => result?,
        };
        debug!(?response, "...receiving");

        if let Some((observer, id)) = invocation {
            observer.response_received(id, &response);
        }
        check_cancelled(cancellation)?;

        self.classify(operation, url, response)
    }

    fn build_request<T, E>(
        &self,
        operation: &OperationDescriptor<T, E>,
        context: &RequestContext,
    ) -> Result<(Url, Request<Bytes>), ServiceError<E>> {
        let arguments = context.arguments();
        validate(operation, arguments)?;

        let url = self.build_url(operation, context)?;
        let body = match operation.body_binding() {
            Some(binding) => match arguments.lookup(binding.name())? {
                Some(value) => Some(
                    self.inner
                        .codec
                        .encode(value)
                        .map_err(RequestError::Serialization)?,
                ),
                None => None,
            },
            None => None,
        };

        let has_body = body.is_some();
        let mut request = Request::builder()
            .method(operation.method().clone())
            .uri(url.as_str())
            .body(body.unwrap_or_default())?;
        self.build_headers(operation, context, has_body, request.headers_mut())?;

        Ok((url, request))
    }

    fn build_url<T, E>(
        &self,
        operation: &OperationDescriptor<T, E>,
        context: &RequestContext,
    ) -> Result<Url, ServiceError<E>> {
        let arguments = context.arguments();

        let mut path_values = IndexMap::new();
        for binding in operation.bindings_in(ParameterLocation::Path) {
            let rendered = match arguments.lookup(binding.name())? {
                Some(value) => render_path_value(binding.wire_name(), value, binding.style())?,
                None => String::new(),
            };
            path_values.insert(binding.wire_name(), rendered);
        }
        let path = PathResolved::resolve(operation.path(), &path_values)?;

        let mut query = QueryPairs::default();
        for binding in operation.bindings_in(ParameterLocation::Query) {
            let Some(value) = arguments.lookup(binding.name())? else {
                continue;
            };
            for rendered in render_query_values(binding.wire_name(), value, binding.style())? {
                query.push(binding.wire_name(), rendered);
            }
        }

        let base = context.base_uri().unwrap_or(&self.inner.base_uri);
        let mut url = Url::parse(&format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            path.path.trim_start_matches('/')
        ))?;
        if !query.is_empty() {
            url.set_query(Some(&query.to_query_string()));
        }
        Ok(url)
    }

    fn build_headers<T, E>(
        &self,
        operation: &OperationDescriptor<T, E>,
        context: &RequestContext,
        has_body: bool,
        headers: &mut HeaderMap,
    ) -> Result<(), RequestError> {
        let config = &self.inner;

        for (name, value) in &config.default_headers {
            headers.append(name.clone(), value.clone());
        }

        let client_request_id = match context.client_request_id() {
            Some(id) => Some(id.to_string()),
            None if config.generate_client_request_id => Some(Uuid::new_v4().to_string()),
            None => None,
        };
        if let Some(id) = client_request_id {
            headers.insert(
                config.client_request_id_header.clone(),
                HeaderValue::from_str(&id)?,
            );
        }

        if let Some(language) = &config.accept_language {
            headers.insert(ACCEPT_LANGUAGE, language.clone());
        }

        for binding in operation.bindings_in(ParameterLocation::Header) {
            let Some(value) = context.arguments().lookup(binding.name())? else {
                continue;
            };
            let rendered = render_value(binding.wire_name(), value, binding.style().header_style())?;
            let name = HeaderName::from_bytes(binding.wire_name().as_bytes())?;
            headers.insert(name, HeaderValue::from_str(&rendered)?);
        }

        if has_body {
            headers.typed_insert(config.codec.content_type());
        }

        context.custom_headers().apply_to(headers)
    }

    fn classify<T, E>(
        &self,
        operation: &OperationDescriptor<T, E>,
        url: Url,
        response: Response<Bytes>,
    ) -> Result<ExecutionResult<T>, ServiceError<E>>
    where
        T: DeserializeOwned,
        E: DeserializeOwned,
    {
        let config = &self.inner;
        let (parts, body) = response.into_parts();
        let request_id = parts
            .headers
            .get(&config.request_id_header)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        if !operation.success_codes().contains_status_code(parts.status) {
            let decoded = if operation.decodes_error() && !is_blank(&body) {
                config
                    .codec
                    .decode::<E>(&body)
                    .inspect_err(|error| debug!(%error, "error body kept raw"))
                    .ok()
            } else {
                None
            };
            return Err(ServiceError::Operation(OperationError {
                method: operation.method().clone(),
                url,
                status: parts.status,
                headers: parts.headers,
                raw_body: body,
                body: decoded,
                request_id,
            }));
        }

        let decoded = if operation.decodes_response() && !is_blank(&body) {
            config
                .codec
                .decode::<Option<T>>(&body)
                .map_err(|error| DeserializationError::new(error, &body))?
        } else {
            None
        };

        Ok(ExecutionResult {
            body: decoded,
            status: parts.status,
            headers: parts.headers,
            request_id,
        })
    }
}

impl<C> ServiceClient<C> {
    /// Number of exchanges currently in progress on this client and its clones.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::Acquire)
    }
}
