use std::fmt::{self, Debug};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use http::HeaderMap;
use http::header::{HeaderName, HeaderValue};
use url::Url;

mod builder;
pub use self::builder::ServiceClientBuilder;

mod codec;
pub use self::codec::{Codec, CodecError, JsonCodec};

mod context;
pub use self::context::{Arguments, RequestContext};

mod credentials;
pub use self::credentials::{CredentialError, Credentials, HeaderCredentials, SecureString};

mod error;
pub use self::error::{
    ClientBuildError, DeserializationError, RequestError, ServiceError, ValidationError,
    ValidationRule,
};

mod execution;

mod observer;
pub use self::observer::{CallObserver, InvocationId, ResultSnapshot, TracingObserver};

mod operation;
pub use self::operation::{
    ExpectedStatusCodes, OperationDescriptor, ParameterBinding, ParameterLocation,
};

mod parameters;
pub use self::parameters::{CustomHeaders, ParamStyle};

mod result;
pub use self::result::{ErrorBody, ExecutionResult, OperationError};

mod transport;
pub use self::transport::{BoxFuture, ReqwestTransport, Transport, TransportError};

/// Runtime core of a generated service client.
///
/// A `ServiceClient` carries the configuration shared by every operation of a service
/// (base URI, transport, credentials, codec, observer, default headers) and executes
/// [`OperationDescriptor`]s against it. Use [`ServiceClientBuilder`] to create instances.
///
/// Cloning is cheap: clones share the same configuration and in-flight counter, so a
/// client can be handed to many concurrent tasks.
///
/// # Example
///
/// ```rust,no_run
/// use restwire_core::{OperationDescriptor, RequestContext, ServiceClient};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ServiceClient::builder()
///     .with_host("localhost")
///     .with_port(3000)
///     .build()?;
///
/// let put_positive = OperationDescriptor::put("/duration/positiveduration")
///     .with_name("Duration_PutPositiveDuration")
///     .with_parameter(restwire_core::ParameterBinding::body("durationBody"));
///
/// let context = RequestContext::new().with_arg("durationBody", "P123DT22H14M12.011S");
/// client.execute(&put_positive, context).await?;
/// # Ok(())
/// # }
/// ```
pub struct ServiceClient<C = JsonCodec> {
    inner: Arc<ClientConfig<C>>,
}

#[derive(Debug)]
struct ClientConfig<C> {
    base_uri: Url,
    transport: Arc<dyn Transport>,
    credentials: Option<Arc<dyn Credentials>>,
    codec: C,
    observer: Option<Arc<dyn CallObserver>>,
    default_headers: HeaderMap,
    accept_language: Option<HeaderValue>,
    generate_client_request_id: bool,
    client_request_id_header: HeaderName,
    request_id_header: HeaderName,
    in_flight: AtomicUsize,
}

impl ServiceClient {
    /// Creates a builder with the default configuration and the JSON codec.
    pub fn builder() -> ServiceClientBuilder {
        ServiceClientBuilder::default()
    }
}

impl<C> ServiceClient<C> {
    /// The base URI operations are resolved against.
    pub fn base_uri(&self) -> &Url {
        &self.inner.base_uri
    }

    /// The codec used for request and response bodies.
    pub fn codec(&self) -> &C {
        &self.inner.codec
    }
}

impl<C> Clone for ServiceClient<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> Debug for ServiceClient<C>
where
    C: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceClient")
            .field("config", &self.inner)
            .finish()
    }
}
