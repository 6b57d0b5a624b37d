use budget_guard_core::config::GuardrailConfig;
use budget_guard_core::error::GuardrailError;
use budget_guard_lambda::adapters::aws::{
    load_sdk_config, EventBridgePublisher, OrganizationsPolicyAttacher, SnsNotifier,
    StsRoleAssumer,
};
use budget_guard_lambda::adapters::notify::{NoopNotifier, Notifier};
use budget_guard_lambda::handlers::response::{failure_response, LambdaResponse};
use budget_guard_lambda::handlers::runtime::{
    handle_runtime_event, remaining_budget, RuntimeAdapters,
};
use chrono::Utc;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

async fn handle_request(event: LambdaEvent<Value>) -> Result<LambdaResponse, Error> {
    let context = event.context;
    let span = tracing::info_span!(
        "guardrail_run",
        request_id = %context.request_id,
        function_arn = %context.invoked_function_arn,
    );

    let config = match GuardrailConfig::from_lookup(|key| std::env::var(key).ok()) {
        Ok(value) => value,
        Err(error) => {
            let error = GuardrailError::from(error);
            tracing::error!(parent: &span, component = "runtime", error = %error, "run_failed");
            return Err(Error::from(failure_response(&error).body));
        }
    };

    let timeout = remaining_budget(context.deadline, Utc::now().timestamp_millis());
    let aws_config = load_sdk_config(timeout).await;

    let role_assumer = StsRoleAssumer::new(&aws_config);
    let publisher = EventBridgePublisher::new(aws_sdk_eventbridge::Client::new(&aws_config));
    let attacher =
        OrganizationsPolicyAttacher::new(aws_sdk_organizations::Client::new(&aws_config));
    let sns_notifier = config
        .notification_topic_arn
        .as_ref()
        .map(|topic_arn| SnsNotifier::new(aws_sdk_sns::Client::new(&aws_config), topic_arn));
    let noop_notifier = NoopNotifier;

    let adapters = RuntimeAdapters {
        role_assumer: &role_assumer,
        publisher: &publisher,
        attacher: &attacher,
        notifier: sns_notifier
            .as_ref()
            .map(|value| value as &dyn Notifier)
            .unwrap_or(&noop_notifier),
    };

    handle_runtime_event(
        event.payload,
        &context.invoked_function_arn,
        &config,
        &adapters,
        &span,
    )
    .map_err(|response| Error::from(response.body))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    lambda_runtime::tracing::init_default_subscriber();
    lambda_runtime::run(service_fn(handle_request)).await
}
