use std::error::Error;
use std::sync::{Arc, Mutex};

use http::header::{ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_TYPE, HeaderName};
use http::{Method, StatusCode};
use rstest::rstest;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::*;
use crate::client::credentials::{CredentialError, Credentials, HeaderCredentials};
use crate::client::operation::ParameterBinding;
use crate::client::parameters::ParamStyle;
use crate::client::result::ErrorBody;
use crate::client::transport::BoxFuture;
use crate::test_transport::{MockResponse, MockTransport};

const BASE: &str = "http://localhost:3000";

fn with_request_id(response: MockResponse, id: &'static str) -> MockResponse {
    response.with_header(
        HeaderName::from_static("x-ms-request-id"),
        http::HeaderValue::from_static(id),
    )
}

fn client(transport: &MockTransport) -> ServiceClient {
    ServiceClient::builder()
        .with_base_uri(BASE.parse().expect("valid url"))
        .with_transport(transport.clone())
        .build()
        .expect("should build client")
}

fn put_positive_duration() -> OperationDescriptor {
    OperationDescriptor::put("/duration/positiveduration")
        .with_name("Duration_PutPositiveDuration")
        .with_parameter(ParameterBinding::body("durationBody"))
}

fn get_null() -> OperationDescriptor<String> {
    OperationDescriptor::get("/duration/null")
        .with_name("Duration_GetNull")
        .returns::<String>()
}

#[derive(Debug, Default, Clone)]
struct RecordingObserver {
    events: Arc<Mutex<Vec<(InvocationId, String)>>>,
}

impl RecordingObserver {
    fn push(&self, id: InvocationId, event: String) {
        self.events.lock().expect("not poisoned").push((id, event));
    }

    fn events(&self) -> Vec<(InvocationId, String)> {
        self.events.lock().expect("not poisoned").clone()
    }

    fn names(&self) -> Vec<String> {
        self.events().into_iter().map(|(_, event)| event).collect()
    }
}

impl CallObserver for RecordingObserver {
    fn enter(&self, invocation: InvocationId, operation: &str, arguments: &Arguments) {
        self.push(invocation, format!("enter {operation} ({} args)", arguments.len()));
    }

    fn request_sent(&self, invocation: InvocationId, request: &Request<Bytes>) {
        self.push(invocation, format!("request_sent {}", request.method()));
    }

    fn response_received(&self, invocation: InvocationId, response: &Response<Bytes>) {
        self.push(
            invocation,
            format!("response_received {}", response.status().as_u16()),
        );
    }

    fn error(&self, invocation: InvocationId, error: &(dyn Error + 'static)) {
        self.push(invocation, format!("error {error}"));
    }

    fn exit(&self, invocation: InvocationId, result: &ResultSnapshot) {
        self.push(
            invocation,
            format!("exit {} body={}", result.status.as_u16(), result.has_body),
        );
    }
}

#[derive(Debug)]
struct NeverReadyCredentials;

impl Credentials for NeverReadyCredentials {
    fn process_request<'a>(
        &'a self,
        _request: &'a mut Request<Bytes>,
        _cancellation: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<(), CredentialError>> {
        Box::pin(std::future::pending())
    }
}

#[derive(Debug)]
struct FailingCredentials;

impl Credentials for FailingCredentials {
    fn process_request<'a>(
        &'a self,
        _request: &'a mut Request<Bytes>,
        _cancellation: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<(), CredentialError>> {
        Box::pin(async {
            Err(CredentialError::Unavailable {
                message: "token endpoint unreachable".to_string(),
            })
        })
    }
}

// Validation

#[rstest]
#[case::missing(RequestContext::new())]
#[case::null(RequestContext::new().with_arg("durationBody", None::<String>))]
#[tokio::test]
async fn should_not_send_when_required_body_is_absent(#[case] context: RequestContext) {
    let transport = MockTransport::new().with_fallback(MockResponse::new(StatusCode::OK));
    let client = client(&transport);

    let error = client
        .execute(&put_positive_duration(), context)
        .await
        .expect_err("validation error");

    let ServiceError::Validation(validation) = &error else {
        panic!("unexpected error: {error:?}");
    };
    assert_eq!(validation.rule(), ValidationRule::CannotBeNull);
    assert_eq!(validation.target(), "durationBody");
    assert_eq!(error.to_string(), "'durationBody' cannot be null");
    assert_eq!(transport.call_count(), 0);
    assert_eq!(client.in_flight(), 0);
}

#[tokio::test]
async fn should_not_send_when_placeholder_is_unbound() {
    let transport = MockTransport::new().with_fallback(MockResponse::new(StatusCode::OK));
    let client = client(&transport);
    let operation = OperationDescriptor::get("/items/{itemId}");

    let error = client
        .execute(&operation, RequestContext::new())
        .await
        .expect_err("validation error");

    assert!(matches!(
        &error,
        ServiceError::Validation(validation)
            if validation.rule() == ValidationRule::UnresolvedPlaceholder
    ));
    insta::assert_snapshot!(error, @"'itemId' is not bound to any parameter");
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn should_report_validation_before_invalid_arguments() {
    #[derive(Debug)]
    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S>(&self, _serializer: S) -> Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            Err(serde::ser::Error::custom("not today"))
        }
    }

    let transport = MockTransport::new().with_fallback(MockResponse::new(StatusCode::OK));
    let client = client(&transport);
    let operation = OperationDescriptor::get("/items")
        .with_parameter(ParameterBinding::query("filter"))
        .with_parameter(ParameterBinding::query("api-version").required());

    let context = RequestContext::new().with_arg("filter", Unserializable);
    let error = client
        .execute(&operation, context.clone())
        .await
        .expect_err("validation error");
    assert!(matches!(error, ServiceError::Validation(_)));

    let error = client
        .execute(&operation, context.with_arg("api-version", "2024-01-01"))
        .await
        .expect_err("invalid argument");
    insta::assert_snapshot!(error, @"Unable to serialize argument 'filter': not today");
    assert_eq!(transport.call_count(), 0);
}

// Success decoding

#[tokio::test]
async fn should_decode_success_body() {
    let transport = MockTransport::new().respond_with(with_request_id(
        MockResponse::json(StatusCode::OK, &json!("P123DT22H14M12.011S")),
        "server-1",
    ));
    let client = client(&transport);

    let result = client
        .execute(&get_null(), RequestContext::new())
        .await
        .expect("success");

    assert_eq!(result.status(), StatusCode::OK);
    assert_eq!(result.body().map(String::as_str), Some("P123DT22H14M12.011S"));
    assert_eq!(result.request_id(), Some("server-1"));
    assert_eq!(
        result.headers().get(CONTENT_TYPE).expect("content type"),
        "application/json"
    );

    let request = transport.last_request().expect("one request");
    assert_eq!(request.method, Method::GET);
    assert_eq!(request.uri, "http://localhost:3000/duration/null");
}

#[rstest]
#[case::empty("")]
#[case::whitespace(" \r\n\t ")]
#[case::null("null")]
#[tokio::test]
async fn should_return_absent_body(#[case] body: &'static str) {
    let transport = MockTransport::new()
        .respond_with(MockResponse::new(StatusCode::OK).with_body(body));
    let client = client(&transport);

    let result = client
        .execute(&get_null(), RequestContext::new())
        .await
        .expect("success");

    assert!(result.body().is_none());
    assert_eq!(result.into_body(), None);
}

#[tokio::test]
async fn should_fail_on_malformed_success_body() {
    let transport = MockTransport::new()
        .respond_with(MockResponse::text(StatusCode::OK, "123ABC"));
    let client = client(&transport);

    let error = client
        .execute(&get_null(), RequestContext::new())
        .await
        .expect_err("deserialization error");

    let ServiceError::Deserialization(deserialization) = &error else {
        panic!("unexpected error: {error:?}");
    };
    assert_eq!(deserialization.body(), "123ABC");
    assert!(error.to_string().starts_with("Unable to deserialize the response: "));
    assert!(error.source().is_some());
    assert_eq!(client.in_flight(), 0);
}

#[tokio::test]
async fn should_ignore_body_when_no_type_is_declared() {
    let transport = MockTransport::new()
        .respond_with(MockResponse::text(StatusCode::OK, "not json at all"));
    let client = client(&transport);
    let operation = OperationDescriptor::get("/duration/null");

    let result = client
        .execute(&operation, RequestContext::new())
        .await
        .expect("success");

    assert_eq!(result.body(), None);
}

#[tokio::test]
async fn should_accept_any_status_of_the_success_set() {
    let transport = MockTransport::new()
        .respond_with(MockResponse::new(StatusCode::NO_CONTENT))
        .respond_with(MockResponse::json(StatusCode::CREATED, &json!("PT0S")));
    let client = client(&transport);
    let operation = get_null().with_success_codes(crate::success_codes!(200..=201, 204));

    let first = client
        .execute(&operation, RequestContext::new())
        .await
        .expect("no content");
    assert_eq!(first.status(), StatusCode::NO_CONTENT);
    assert!(first.body().is_none());

    let second = client
        .execute(&operation, RequestContext::new())
        .await
        .expect("created");
    assert_eq!(second.body().map(String::as_str), Some("PT0S"));
}

// Error classification

#[tokio::test]
async fn should_build_operation_error_with_decoded_body() {
    let transport = MockTransport::new().respond_with(with_request_id(
        MockResponse::json(StatusCode::NOT_FOUND, &json!({"message": "nope", "status": 404})),
        "server-2",
    ));
    let client = client(&transport);

    let error = client
        .execute(&get_null(), RequestContext::new())
        .await
        .expect_err("operation error");

    insta::assert_snapshot!(error, @"Operation returned an invalid status code '404'");
    let operation_error = error.as_operation_error().expect("operation error");
    assert_eq!(operation_error.status(), StatusCode::NOT_FOUND);
    assert_eq!(operation_error.method(), Method::GET);
    assert_eq!(
        operation_error.url().as_str(),
        "http://localhost:3000/duration/null"
    );
    assert_eq!(operation_error.request_id(), Some("server-2"));
    let body = operation_error.body().expect("decoded body");
    assert_eq!(body.message.as_deref(), Some("nope"));
    assert_eq!(body.extensions["status"], 404);
}

#[rstest]
#[case::wrong_shape(MockResponse::json(StatusCode::BAD_REQUEST, &json!([1, 2, 3])), "[1,2,3]")]
#[case::not_json(MockResponse::text(StatusCode::BAD_REQUEST, "<html>bad</html>"), "<html>bad</html>")]
#[case::empty(MockResponse::new(StatusCode::BAD_REQUEST), "")]
#[tokio::test]
async fn should_keep_raw_error_body_when_not_decodable(
    #[case] response: MockResponse,
    #[case] raw: &str,
) {
    let transport = MockTransport::new().respond_with(response);
    let client = client(&transport);

    let error = client
        .execute(&get_null(), RequestContext::new())
        .await
        .expect_err("operation error");

    let operation_error = error.as_operation_error().expect("operation error");
    assert_eq!(operation_error.status(), StatusCode::BAD_REQUEST);
    assert!(operation_error.body().is_none());
    assert_eq!(operation_error.raw_text(), raw);
}

#[tokio::test]
async fn should_decode_custom_error_type() {
    #[derive(Debug, Deserialize)]
    struct CloudError {
        code: String,
    }

    let transport = MockTransport::new().respond_with(MockResponse::json(
        StatusCode::CONFLICT,
        &json!({"code": "Conflict", "message": "already exists"}),
    ));
    let client = client(&transport);
    let operation = get_null().with_error_body::<CloudError>();

    let error = client
        .execute(&operation, RequestContext::new())
        .await
        .expect_err("operation error");

    let body = error
        .as_operation_error()
        .and_then(OperationError::body)
        .expect("decoded error");
    assert_eq!(body.code, "Conflict");
}

#[tokio::test]
async fn should_not_decode_error_body_when_disabled() {
    let transport = MockTransport::new().respond_with(MockResponse::json(
        StatusCode::INTERNAL_SERVER_ERROR,
        &json!({"message": "boom"}),
    ));
    let client = client(&transport);
    let operation = get_null().without_error_body();

    let error = client
        .execute(&operation, RequestContext::new())
        .await
        .expect_err("operation error");

    let operation_error = error.as_operation_error().expect("operation error");
    assert!(operation_error.body().is_none());
    assert_eq!(
        operation_error.body_as::<ErrorBody>().and_then(|body| body.message),
        Some("boom".to_string())
    );
}

#[tokio::test]
async fn should_propagate_transport_failure() {
    let transport = MockTransport::new().fail_with("connection reset");
    let client = client(&transport);

    let error = client
        .execute(&get_null(), RequestContext::new())
        .await
        .expect_err("transport error");

    assert!(matches!(error, ServiceError::Transport(_)));
    insta::assert_snapshot!(error, @"Transport failure: connection reset");
    assert_eq!(client.in_flight(), 0);
}

// Cancellation

#[tokio::test]
async fn should_not_send_when_already_cancelled() {
    let transport = MockTransport::new().with_fallback(MockResponse::new(StatusCode::OK));
    let client = client(&transport);
    let token = CancellationToken::new();
    token.cancel();

    let error = client
        .execute(
            &put_positive_duration(),
            RequestContext::new()
                .with_arg("durationBody", "PT1S")
                .with_cancellation(token),
        )
        .await
        .expect_err("cancelled");

    assert!(error.is_cancelled());
    insta::assert_snapshot!(error, @"The operation was cancelled");
    assert_eq!(transport.call_count(), 0);
    assert_eq!(client.in_flight(), 0);
}

#[tokio::test]
async fn should_cancel_while_dispatching() {
    let transport = MockTransport::new().hang();
    let client = client(&transport);
    let token = CancellationToken::new();
    let operation = get_null();

    let call = client.execute(
        &operation,
        RequestContext::new().with_cancellation(token.clone()),
    );
    let cancel = async {
        while transport.call_count() == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(client.in_flight(), 1);
        token.cancel();
    };
    let (result, ()) = tokio::join!(call, cancel);

    assert!(result.expect_err("cancelled").is_cancelled());
    assert_eq!(transport.call_count(), 1);
    assert_eq!(client.in_flight(), 0);
}

#[tokio::test]
async fn should_cancel_while_attaching_credentials() {
    let transport = MockTransport::new().with_fallback(MockResponse::new(StatusCode::OK));
    let client = ServiceClient::builder()
        .with_base_uri(BASE.parse().expect("valid url"))
        .with_transport(transport.clone())
        .with_credentials(NeverReadyCredentials)
        .build()
        .expect("should build client");
    let token = CancellationToken::new();
    let operation = get_null();

    let call = client.execute(
        &operation,
        RequestContext::new().with_cancellation(token.clone()),
    );
    let cancel = async {
        tokio::task::yield_now().await;
        token.cancel();
    };
    let (result, ()) = tokio::join!(call, cancel);

    assert!(result.expect_err("cancelled").is_cancelled());
    assert_eq!(transport.call_count(), 0);
    assert_eq!(client.in_flight(), 0);
}

// Credentials

#[tokio::test]
async fn should_attach_credentials() {
    let transport = MockTransport::new().with_fallback(MockResponse::new(StatusCode::OK));
    let client = ServiceClient::builder()
        .with_base_uri(BASE.parse().expect("valid url"))
        .with_transport(transport.clone())
        .with_credentials(HeaderCredentials::new("authorization", "Bearer secret"))
        .build()
        .expect("should build client");

    client
        .execute(&get_null(), RequestContext::new())
        .await
        .expect("success");

    let request = transport.last_request().expect("one request");
    assert_eq!(request.header_values(AUTHORIZATION.as_str()), vec!["Bearer secret"]);
}

#[tokio::test]
async fn should_report_credential_failure_without_sending() {
    let transport = MockTransport::new().with_fallback(MockResponse::new(StatusCode::OK));
    let client = ServiceClient::builder()
        .with_base_uri(BASE.parse().expect("valid url"))
        .with_transport(transport.clone())
        .with_credentials(FailingCredentials)
        .build()
        .expect("should build client");

    let error = client
        .execute(&get_null(), RequestContext::new())
        .await
        .expect_err("credential error");

    assert!(matches!(error, ServiceError::Credentials(_)));
    assert_eq!(transport.call_count(), 0);
}

// Request building

#[tokio::test]
async fn should_encode_body_with_codec_content_type() {
    let transport = MockTransport::new().with_fallback(MockResponse::new(StatusCode::OK));
    let client = client(&transport);

    client
        .execute(
            &put_positive_duration(),
            RequestContext::new().with_arg("durationBody", "P123DT22H14M12.011S"),
        )
        .await
        .expect("success");

    let request = transport.last_request().expect("one request");
    assert_eq!(request.method, Method::PUT);
    assert_eq!(request.body_text(), r#""P123DT22H14M12.011S""#);
    assert_eq!(
        request.header_values("content-type"),
        vec!["application/json; charset=utf-8"]
    );
}

#[tokio::test]
async fn should_send_no_payload_for_absent_optional_body() {
    let transport = MockTransport::new().with_fallback(MockResponse::new(StatusCode::OK));
    let client = client(&transport);
    let operation = OperationDescriptor::patch("/widgets")
        .with_parameter(ParameterBinding::body("patch").optional());

    client
        .execute(&operation, RequestContext::new())
        .await
        .expect("success");

    let request = transport.last_request().expect("one request");
    assert!(request.body.is_empty());
    assert!(request.headers.get(CONTENT_TYPE).is_none());
}

#[tokio::test]
async fn should_build_path_and_query() {
    let transport = MockTransport::new().with_fallback(MockResponse::new(StatusCode::OK));
    let client = client(&transport);
    let operation = OperationDescriptor::get("/items/{itemId}/{section}")
        .with_parameter(ParameterBinding::path("itemId"))
        .with_parameter(ParameterBinding::path("section").optional())
        .with_parameter(ParameterBinding::query("missing"))
        .with_parameter(ParameterBinding::query("nothing"))
        .with_parameter(ParameterBinding::query("search"))
        .with_parameter(ParameterBinding::query("tags"))
        .with_parameter(
            ParameterBinding::query("ids").with_style(ParamStyle::PipeDelimited),
        )
        .with_parameter(ParameterBinding::query("api_version").with_wire_name("api-version"));

    let context = RequestContext::new()
        .with_arg("itemId", "a b/c")
        .with_arg("nothing", None::<u32>)
        .with_arg("search", "x&y=z")
        .with_arg("tags", ["rust", "web"])
        .with_arg("ids", [1, 2])
        .with_arg("api_version", "2024-01-01");
    client.execute(&operation, context).await.expect("success");

    let request = transport.last_request().expect("one request");
    insta::assert_snapshot!(
        request.uri.to_string(),
        @"http://localhost:3000/items/a%20b%2Fc/?search=x%26y%3Dz&tags=rust&tags=web&ids=1%7C2&api-version=2024-01-01"
    );
}

#[tokio::test]
async fn should_reject_object_query_values() {
    let transport = MockTransport::new().with_fallback(MockResponse::new(StatusCode::OK));
    let client = client(&transport);
    let operation = OperationDescriptor::get("/items").with_parameter(ParameterBinding::query("filter"));

    let error = client
        .execute(&operation, RequestContext::new().with_arg("filter", json!({"a": 1})))
        .await
        .expect_err("invalid request");

    assert!(matches!(
        error,
        ServiceError::InvalidRequest(RequestError::UnsupportedParameterValue { .. })
    ));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn should_substitute_hyphenated_placeholders() {
    let transport = MockTransport::new().with_fallback(MockResponse::new(StatusCode::OK));
    let client = client(&transport);
    let operation = OperationDescriptor::get("/groups/{resource-group}")
        .with_parameter(ParameterBinding::path("resourceGroup").with_wire_name("resource-group"));

    client
        .execute(&operation, RequestContext::new().with_arg("resourceGroup", "rg-1"))
        .await
        .expect("success");

    let request = transport.last_request().expect("one request");
    insta::assert_snapshot!(request.uri.to_string(), @"http://localhost:3000/groups/rg-1");
}

#[tokio::test]
async fn should_not_send_when_hyphenated_placeholder_is_unbound() {
    let transport = MockTransport::new().with_fallback(MockResponse::new(StatusCode::OK));
    let client = client(&transport);
    let operation = OperationDescriptor::get("/groups/{resource-group}")
        .with_parameter(ParameterBinding::path("resourceGroup"));

    let error = client
        .execute(&operation, RequestContext::new().with_arg("resourceGroup", "rg-1"))
        .await
        .expect_err("validation error");

    let ServiceError::Validation(validation) = &error else {
        panic!("unexpected error: {error:?}");
    };
    assert_eq!(validation.rule(), ValidationRule::UnresolvedPlaceholder);
    assert_eq!(validation.target(), "resource-group");
    assert_eq!(transport.call_count(), 0);
}

#[rstest]
#[case::parent("..")]
#[case::current(".")]
#[tokio::test]
async fn should_not_send_dot_segment_path_values(#[case] id: &str) {
    let transport = MockTransport::new().with_fallback(MockResponse::new(StatusCode::OK));
    let client = client(&transport);
    let operation = OperationDescriptor::get("/items/{id}/detail")
        .with_parameter(ParameterBinding::path("id"));

    let error = client
        .execute(&operation, RequestContext::new().with_arg("id", id))
        .await
        .expect_err("invalid request");

    assert!(matches!(
        error,
        ServiceError::InvalidRequest(RequestError::UnsupportedParameterValue { .. })
    ));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn should_keep_dots_inside_path_values() {
    let transport = MockTransport::new().with_fallback(MockResponse::new(StatusCode::OK));
    let client = client(&transport);
    let operation = OperationDescriptor::get("/items/{id}/detail")
        .with_parameter(ParameterBinding::path("id"));

    client
        .execute(&operation, RequestContext::new().with_arg("id", "v1.0..rc"))
        .await
        .expect("success");

    let request = transport.last_request().expect("one request");
    insta::assert_snapshot!(request.uri.to_string(), @"http://localhost:3000/items/v1.0..rc/detail");
}

#[rstest]
#[case::client_base_with_path("http://localhost:3000/api/", None, "http://localhost:3000/api/duration/null")]
#[case::client_base_without_slash("http://localhost:3000/api", None, "http://localhost:3000/api/duration/null")]
#[case::context_override(
    "http://localhost:3000/api",
    Some("https://other.test/v2/"),
    "https://other.test/v2/duration/null"
)]
#[tokio::test]
async fn should_join_base_uri_and_path(
    #[case] base: &str,
    #[case] override_base: Option<&str>,
    #[case] expected: &str,
) {
    let transport = MockTransport::new().with_fallback(MockResponse::new(StatusCode::OK));
    let client = ServiceClient::builder()
        .with_base_uri(base.parse().expect("valid url"))
        .with_transport(transport.clone())
        .build()
        .expect("should build client");

    let mut context = RequestContext::new();
    if let Some(override_base) = override_base {
        context = context.with_base_uri(override_base.parse().expect("valid url"));
    }
    client
        .execute(&OperationDescriptor::get("duration/null"), context)
        .await
        .expect("success");

    let request = transport.last_request().expect("one request");
    assert_eq!(request.uri.to_string(), expected);
}

#[tokio::test]
async fn should_apply_headers_in_precedence_order() {
    let transport = MockTransport::new().with_fallback(MockResponse::new(StatusCode::OK));
    let client = ServiceClient::builder()
        .with_base_uri(BASE.parse().expect("valid url"))
        .with_transport(transport.clone())
        .with_default_header("x-tenant", "default-tenant")
        .with_default_header("x-static", "static")
        .with_accept_language("en-US")
        .build()
        .expect("should build client");
    let operation = OperationDescriptor::get("/widgets")
        .with_parameter(ParameterBinding::header("tenant").with_wire_name("x-tenant"))
        .with_parameter(ParameterBinding::header("tags").with_wire_name("x-ms-tags"));

    let context = RequestContext::new()
        .with_arg("tenant", "param-tenant")
        .with_arg("tags", ["a", "b"])
        .with_header("Accept-Language", "fr-FR")
        .with_header("x-ms-tags", "second")
        .with_header("x-ms-tags", "first");
    client.execute(&operation, context).await.expect("success");

    let request = transport.last_request().expect("one request");
    assert_eq!(request.header_values("x-static"), vec!["static"]);
    assert_eq!(request.header_values("x-tenant"), vec!["param-tenant"]);
    assert_eq!(request.header_values(ACCEPT_LANGUAGE.as_str()), vec!["fr-FR"]);
    assert_eq!(request.header_values("x-ms-tags"), vec!["second", "first"]);
}

#[tokio::test]
async fn should_send_client_request_id() {
    let transport = MockTransport::new().with_fallback(MockResponse::new(StatusCode::OK));
    let client = client(&transport);

    client
        .execute(&get_null(), RequestContext::new())
        .await
        .expect("success");
    client
        .execute(&get_null(), RequestContext::new())
        .await
        .expect("success");
    client
        .execute(
            &get_null(),
            RequestContext::new().with_client_request_id("caller-id"),
        )
        .await
        .expect("success");
    client
        .execute(
            &get_null(),
            RequestContext::new().with_header("x-ms-client-request-id", "custom-wins"),
        )
        .await
        .expect("success");

    let ids: Vec<_> = transport
        .requests()
        .iter()
        .map(|request| request.header_values("x-ms-client-request-id"))
        .collect();
    assert_eq!(ids[0].len(), 1);
    assert!(uuid::Uuid::parse_str(&ids[0][0]).is_ok());
    assert_ne!(ids[0], ids[1]);
    assert_eq!(ids[2], vec!["caller-id"]);
    assert_eq!(ids[3], vec!["custom-wins"]);
}

#[tokio::test]
async fn should_skip_client_request_id_when_disabled() {
    let transport = MockTransport::new().with_fallback(
        MockResponse::new(StatusCode::OK).with_header(
            HeaderName::from_static("x-correlation"),
            http::HeaderValue::from_static("server-3"),
        ),
    );
    let client = ServiceClient::builder()
        .with_base_uri(BASE.parse().expect("valid url"))
        .with_transport(transport.clone())
        .with_client_request_id(false)
        .with_request_id_header("x-correlation")
        .build()
        .expect("should build client");

    let result = client
        .execute(&get_null(), RequestContext::new())
        .await
        .expect("success");

    let request = transport.last_request().expect("one request");
    assert!(request.header_values("x-ms-client-request-id").is_empty());
    assert_eq!(result.request_id(), Some("server-3"));
}

#[test]
fn should_prepare_request_without_sending() {
    let transport = MockTransport::new();
    let client = client(&transport);

    let request = client
        .prepare_request(
            &put_positive_duration(),
            &RequestContext::new().with_arg("durationBody", "PT1S"),
        )
        .expect("valid request");

    assert_eq!(request.method(), Method::PUT);
    assert_eq!(
        request.uri(),
        "http://localhost:3000/duration/positiveduration"
    );
    assert_eq!(request.body(), r#""PT1S""#);
    assert_eq!(transport.call_count(), 0);
}

// Observer

#[tokio::test]
async fn should_notify_observer_in_order() {
    let observer = RecordingObserver::default();
    let transport = MockTransport::new()
        .respond_with(MockResponse::json(StatusCode::OK, &json!("PT1S")))
        .respond_with(MockResponse::new(StatusCode::NOT_FOUND));
    let client = ServiceClient::builder()
        .with_base_uri(BASE.parse().expect("valid url"))
        .with_transport(transport.clone())
        .with_observer(observer.clone())
        .build()
        .expect("should build client");

    client
        .execute(&get_null(), RequestContext::new().with_arg("unused", 1))
        .await
        .expect("success");
    client
        .execute(&get_null(), RequestContext::new())
        .await
        .expect_err("not found");
    client
        .execute(&put_positive_duration(), RequestContext::new())
        .await
        .expect_err("validation");

    insta::assert_debug_snapshot!(observer.names(), @r#"
    [
        "enter Duration_GetNull (1 args)",
        "request_sent GET",
        "response_received 200",
        "exit 200 body=true",
        "enter Duration_GetNull (0 args)",
        "request_sent GET",
        "response_received 404",
        "error Operation returned an invalid status code '404'",
        "enter Duration_PutPositiveDuration (0 args)",
        "error 'durationBody' cannot be null",
    ]
    "#);

    let events = observer.events();
    let first_call = events[0].0;
    assert!(events[..4].iter().all(|(id, _)| *id == first_call));
    assert!(events[4].0 > first_call);
}

// Concurrency

#[tokio::test]
async fn should_share_client_across_concurrent_calls() {
    let transport = MockTransport::new()
        .with_fallback(MockResponse::json(StatusCode::OK, &json!("PT1S")));
    let client = client(&transport);

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let client = client.clone();
        tasks.push(tokio::spawn(async move {
            client.execute(&get_null(), RequestContext::new()).await
        }));
    }
    for task in tasks {
        let result = task.await.expect("task completes").expect("success");
        assert_eq!(result.body().map(String::as_str), Some("PT1S"));
    }

    assert_eq!(transport.call_count(), 8);
    assert_eq!(client.in_flight(), 0);
}
