use std::fmt::Debug;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use http::header::{HeaderName, HeaderValue};
use http::uri::{PathAndQuery, Scheme};
use http::{HeaderMap, Uri};
use url::Url;

use super::codec::{Codec, JsonCodec};
use super::credentials::Credentials;
use super::error::ClientBuildError;
use super::observer::CallObserver;
use super::transport::{ReqwestTransport, Transport};
use super::{ClientConfig, ServiceClient};

const CLIENT_REQUEST_ID_HEADER: &str = "x-ms-client-request-id";
const REQUEST_ID_HEADER: &str = "x-ms-request-id";

/// Builder for [`ServiceClient`].
///
/// # Default Configuration
///
/// - **Base URI**: `http://127.0.0.1:80/` (see `with_scheme`, `with_host`, `with_port`,
///   `with_base_path`, or `with_base_uri` to replace it entirely)
/// - **Transport**: [`ReqwestTransport`] with a default `reqwest::Client`
/// - **Codec**: [`JsonCodec`]
/// - **Credentials** and **observer**: none
/// - **Correlation id**: a fresh UUID in `x-ms-client-request-id` on every request
/// - **Server request id**: read from `x-ms-request-id`
///
/// # Example
///
/// ```rust
/// use restwire_core::{HeaderCredentials, ServiceClient, TracingObserver};
/// use http::uri::Scheme;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ServiceClient::builder()
///     .with_scheme(Scheme::HTTPS)
///     .with_host("management.example.com")
///     .with_port(443)
///     .with_base_path("/v1")?
///     .with_credentials(HeaderCredentials::new("authorization", "Bearer token"))
///     .with_accept_language("en-US")
///     .with_default_header("user-agent", "restwire/0.1")
///     .with_observer(TracingObserver)
///     .build()?;
///
/// assert_eq!(client.base_uri().as_str(), "https://management.example.com/v1");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ServiceClientBuilder<C = JsonCodec> {
    transport: Arc<dyn Transport>,
    scheme: Scheme,
    host: String,
    port: u16,
    base_path: Option<PathAndQuery>,
    base_uri: Option<Url>,
    credentials: Option<Arc<dyn Credentials>>,
    codec: C,
    observer: Option<Arc<dyn CallObserver>>,
    default_headers: Vec<(String, String)>,
    accept_language: Option<String>,
    generate_client_request_id: bool,
    client_request_id_header: String,
    request_id_header: String,
}

impl<C> ServiceClientBuilder<C>
where
    C: Codec,
{
    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Fails if the base URI cannot be built, or a configured header name or value is invalid.
    pub fn build(self) -> Result<ServiceClient<C>, ClientBuildError> {
        let Self {
            transport,
            scheme,
            host,
            port,
            base_path,
            base_uri,
            credentials,
            codec,
            observer,
            default_headers,
            accept_language,
            generate_client_request_id,
            client_request_id_header,
            request_id_header,
        } = self;

        let base_uri = match base_uri {
            Some(base_uri) => base_uri,
            None => {
                let path = base_path.as_ref().map_or("/", PathAndQuery::path);
                let uri = Uri::builder()
                    .scheme(scheme)
                    .authority(format!("{host}:{port}"))
                    .path_and_query(path)
                    .build()?;
                Url::parse(&uri.to_string())?
            }
        };

        let mut headers = HeaderMap::new();
        for (name, value) in default_headers {
            headers.append(
                HeaderName::from_bytes(name.as_bytes())?,
                HeaderValue::from_str(&value)?,
            );
        }
        let accept_language = accept_language
            .map(|language| HeaderValue::from_str(&language))
            .transpose()?;

        let config = ClientConfig {
            base_uri,
            transport,
            credentials,
            codec,
            observer,
            default_headers: headers,
            accept_language,
            generate_client_request_id,
            client_request_id_header: HeaderName::from_bytes(client_request_id_header.as_bytes())?,
            request_id_header: HeaderName::from_bytes(request_id_header.as_bytes())?,
            in_flight: AtomicUsize::new(0),
        };
        Ok(ServiceClient {
            inner: Arc::new(config),
        })
    }
}

impl<C> ServiceClientBuilder<C> {
    /// Sets the HTTP scheme (defaults to `http`).
    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Sets the host name or IP address (defaults to `127.0.0.1`).
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the port (defaults to `80`).
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the base path prepended to every operation path.
    ///
    /// # Errors
    ///
    /// Returns [`ClientBuildError::InvalidBasePath`] if the path contains invalid characters
    /// (such as spaces) or cannot be parsed as a valid URI path.
    pub fn with_base_path<P>(mut self, base_path: P) -> Result<Self, ClientBuildError>
    where
        P: TryInto<PathAndQuery>,
        P::Error: Debug + 'static,
    {
        let base_path = base_path
            .try_into()
            .map_err(|err| ClientBuildError::InvalidBasePath {
                error: format!("{err:?}"),
            })?;
        self.base_path = Some(base_path);
        Ok(self)
    }

    /// Uses a complete base URI, overriding scheme, host, port and base path.
    pub fn with_base_uri(mut self, base_uri: Url) -> Self {
        self.base_uri = Some(base_uri);
        self
    }

    /// Sends requests through a custom transport.
    pub fn with_transport(mut self, transport: impl Transport) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    /// Sends requests through an existing reqwest client.
    pub fn with_reqwest_client(self, client: reqwest::Client) -> Self {
        self.with_transport(ReqwestTransport::new(client))
    }

    /// Attaches credentials to every request.
    pub fn with_credentials(mut self, credentials: impl Credentials) -> Self {
        self.credentials = Some(Arc::new(credentials));
        self
    }

    /// Reports every call to an observer.
    pub fn with_observer(mut self, observer: impl CallObserver) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Adds a header sent with every request, before any other header.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Sends `accept-language` with every request.
    pub fn with_accept_language(mut self, language: impl Into<String>) -> Self {
        self.accept_language = Some(language.into());
        self
    }

    /// Enables or disables the generated correlation id (enabled by default).
    ///
    /// A correlation id supplied in the [`RequestContext`](crate::RequestContext) is
    /// always sent.
    pub fn with_client_request_id(mut self, enabled: bool) -> Self {
        self.generate_client_request_id = enabled;
        self
    }

    /// Changes the correlation id header name.
    pub fn with_client_request_id_header(mut self, name: impl Into<String>) -> Self {
        self.client_request_id_header = name.into();
        self
    }

    /// Changes the response header the server request id is read from.
    pub fn with_request_id_header(mut self, name: impl Into<String>) -> Self {
        self.request_id_header = name.into();
        self
    }

    /// Encodes and decodes bodies with another codec.
    pub fn with_codec<D>(self, codec: D) -> ServiceClientBuilder<D>
    where
        D: Codec,
    {
        ServiceClientBuilder {
            transport: self.transport,
            scheme: self.scheme,
            host: self.host,
            port: self.port,
            base_path: self.base_path,
            base_uri: self.base_uri,
            credentials: self.credentials,
            codec,
            observer: self.observer,
            default_headers: self.default_headers,
            accept_language: self.accept_language,
            generate_client_request_id: self.generate_client_request_id,
            client_request_id_header: self.client_request_id_header,
            request_id_header: self.request_id_header,
        }
    }
}

impl Default for ServiceClientBuilder {
    fn default() -> Self {
        Self {
            transport: Arc::new(ReqwestTransport::default()),
            scheme: Scheme::HTTP,
            host: IpAddr::V4(Ipv4Addr::LOCALHOST).to_string(),
            port: 80,
            base_path: None,
            base_uri: None,
            credentials: None,
            codec: JsonCodec,
            observer: None,
            default_headers: Vec::new(),
            accept_language: None,
            generate_client_request_id: true,
            client_request_id_header: CLIENT_REQUEST_ID_HEADER.to_string(),
            request_id_header: REQUEST_ID_HEADER.to_string(),
        }
    }
}
