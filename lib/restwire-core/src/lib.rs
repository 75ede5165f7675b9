//! # Restwire Core
//!
//! Runtime core for generated REST clients.
//!
//! Generated clients tend to repeat the same pipeline for every endpoint: build the URL,
//! copy headers, attach credentials, trace the call, branch on the status code, and
//! (de)serialize JSON. This crate provides that pipeline once, as a generic executor
//! driven by declarative [`OperationDescriptor`]s. Per-endpoint methods shrink to a
//! descriptor plus argument marshaling.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use restwire_core::{OperationDescriptor, RequestContext, ServiceClient};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ServiceClient::builder()
//!     .with_host("localhost")
//!     .with_port(3000)
//!     .build()?;
//!
//! // Usually built once, in generated code
//! let get_null = OperationDescriptor::get("/duration/null")
//!     .with_name("Duration_GetNull")
//!     .returns::<String>();
//!
//! let result = client.execute(&get_null, RequestContext::new()).await?;
//! println!("{:?} (request id {:?})", result.body(), result.request_id());
//! # Ok(())
//! # }
//! ```
//!
//! ## The pipeline
//!
//! [`ServiceClient::execute`] runs, for one descriptor and one [`RequestContext`]:
//!
//! 1. validation of the required arguments, before anything is built
//! 2. URL construction (path placeholders, query string)
//! 3. header assembly (defaults, correlation id, `accept-language`, header parameters,
//!    then custom headers, which win)
//! 4. body encoding with the client [`Codec`]
//! 5. credential attachment, racing the cancellation token
//! 6. dispatch through the [`Transport`], racing the cancellation token
//! 7. classification against the [`ExpectedStatusCodes`] success set
//! 8. decoding of the success body (fatal on failure) or the error body (best effort)
//!
//! Failures are reported as [`ServiceError`]; the server's request id is available on
//! both [`ExecutionResult`] and [`OperationError`].
//!
//! ## Collaborators
//!
//! - [`Transport`]: sends the request, [`ReqwestTransport`] by default, and
//!   [`test_transport::MockTransport`] for tests
//! - [`Credentials`]: mutates outgoing requests, e.g. [`HeaderCredentials`]
//! - [`Codec`]: body (de)serialization, [`JsonCodec`] by default
//! - [`CallObserver`]: call tracing, e.g. [`TracingObserver`]

mod client;

pub mod test_transport;

pub use self::client::{
    Arguments, BoxFuture, CallObserver, ClientBuildError, Codec, CodecError, CredentialError,
    Credentials, CustomHeaders, DeserializationError, ErrorBody, ExecutionResult,
    ExpectedStatusCodes, HeaderCredentials, InvocationId, JsonCodec, OperationDescriptor,
    OperationError, ParamStyle, ParameterBinding, ParameterLocation, RequestContext,
    RequestError, ResultSnapshot, ReqwestTransport, SecureString, ServiceClient,
    ServiceClientBuilder, ServiceError, TracingObserver, Transport, TransportError,
    ValidationError, ValidationRule,
};

/// Creates an [`ExpectedStatusCodes`] success set.
///
/// # Syntax
///
/// - Single codes: `200`, `201`, `204`
/// - Inclusive ranges: `200..=299`
/// - Exclusive ranges: `200..300`
/// - Mixed, comma separated: `200, 201..=204`
///
/// An empty invocation yields the default set (`200`).
///
/// # Examples
///
/// ```rust
/// use restwire_core::success_codes;
///
/// let codes = success_codes!(200, 201..=203, 300..302);
///
/// assert!(codes.contains(200));
/// assert!(codes.contains(202));
/// assert!(codes.contains(301));
/// assert!(!codes.contains(302));
/// assert!(!codes.contains(204));
/// ```
#[macro_export]
macro_rules! success_codes {
    () => {
        $crate::ExpectedStatusCodes::default()
    };

    (@add $codes:expr, ) => {
        $codes
    };

    (@add $codes:expr, $start:literal ..= $end:literal $(, $($rest:tt)*)?) => {
        $crate::success_codes!(@add $codes.add_inclusive_range($start..=$end), $($($rest)*)?)
    };

    (@add $codes:expr, $start:literal .. $end:literal $(, $($rest:tt)*)?) => {
        $crate::success_codes!(@add $codes.add_exclusive_range($start..$end), $($($rest)*)?)
    };

    (@add $codes:expr, $single:literal $(, $($rest:tt)*)?) => {
        $crate::success_codes!(@add $codes.add_single($single), $($($rest)*)?)
    };

    ($start:literal ..= $end:literal $(, $($rest:tt)*)?) => {
        $crate::success_codes!(
            @add $crate::ExpectedStatusCodes::from_inclusive_range($start..=$end),
            $($($rest)*)?
        )
    };

    ($start:literal .. $end:literal $(, $($rest:tt)*)?) => {
        $crate::success_codes!(
            @add $crate::ExpectedStatusCodes::from_exclusive_range($start..$end),
            $($($rest)*)?
        )
    };

    ($single:literal $(, $($rest:tt)*)?) => {
        $crate::success_codes!(
            @add $crate::ExpectedStatusCodes::from_single($single),
            $($($rest)*)?
        )
    };
}
