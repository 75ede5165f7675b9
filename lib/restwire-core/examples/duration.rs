//! Calls the duration operations of a test server listening on `localhost:3000`.

use jiff::SignedDuration;
use restwire_core::{
    OperationDescriptor, ParameterBinding, RequestContext, ServiceClient, ServiceError,
    TracingObserver,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().pretty().init();

    let client = ServiceClient::builder()
        .with_host("localhost")
        .with_port(3000)
        .with_accept_language("en-US")
        .with_observer(TracingObserver)
        .build()?;

    // Simple get call with no parameters
    let get_null = OperationDescriptor::get("/duration/null")
        .with_name("Duration_GetNull")
        .returns::<SignedDuration>();
    let result = client.execute(&get_null, RequestContext::new()).await?;
    tracing::info!(body = ?result.body(), request_id = ?result.request_id(), "null duration");

    // Put call with a required body
    let put_positive = OperationDescriptor::put("/duration/positiveduration")
        .with_name("Duration_PutPositiveDuration")
        .with_parameter(ParameterBinding::body("durationBody"));
    let duration = SignedDuration::new(10_707_252, 11_000_000);
    let context = RequestContext::new().with_arg("durationBody", duration);
    client.execute(&put_positive, context).await?;

    // A success body that does not decode
    let get_invalid = OperationDescriptor::get("/duration/invalid")
        .with_name("Duration_GetInvalid")
        .returns::<SignedDuration>();
    match client.execute(&get_invalid, RequestContext::new()).await {
        Err(ServiceError::Deserialization(error)) => {
            tracing::warn!(body = error.body(), "invalid duration");
        }
        other => {
            other?;
        }
    }

    Ok(())
}
