//! Entry routing shared by both sides of the deployment.
//!
//! The same artifact runs in member accounts (budget signals) and in the
//! management account (centralized channel deliveries).

use std::time::Duration;

use budget_guard_core::config::GuardrailConfig;
use budget_guard_core::dispatch::Dispatch;
use budget_guard_core::error::Stage;
use budget_guard_core::signal::{decode_budget_signal, is_event_bridge_delivery};
use serde_json::{json, Value};
use tracing::Span;

use crate::adapters::identity::RoleAssumer;
use crate::adapters::notify::Notifier;
use crate::adapters::policy::PolicyAttacher;
use crate::adapters::publish::EventPublisher;
use crate::handlers::executor::{handle_channel_event, IgnoredEvent};
use crate::handlers::forwarder::handle_budget_signal;
use crate::handlers::response::{failure_response, success_response, LambdaResponse};

const MIN_OPERATION_TIMEOUT: Duration = Duration::from_secs(1);
const DEADLINE_MARGIN_MS: i64 = 500;

pub struct RuntimeAdapters<'a, R, P, A, N: ?Sized> {
    pub role_assumer: &'a R,
    pub publisher: &'a P,
    pub attacher: &'a A,
    pub notifier: &'a N,
}

/// Route one invocation. `Err` carries the structured failure so the caller
/// can fail the invocation while still reporting the body.
pub fn handle_runtime_event<R, P, A, N>(
    payload: Value,
    invoked_function_arn: &str,
    config: &GuardrailConfig,
    adapters: &RuntimeAdapters<'_, R, P, A, N>,
    span: &Span,
) -> Result<LambdaResponse, LambdaResponse>
where
    R: RoleAssumer,
    P: EventPublisher,
    A: PolicyAttacher,
    N: Notifier + ?Sized,
{
    let result = if is_event_bridge_delivery(&payload) {
        handle_channel_event(payload, config, adapters.attacher, adapters.notifier, span).map(
            |outcome| match outcome {
                Dispatch::Routed(report) => success_response(
                    200,
                    json!({
                        "status": "quarantined",
                        "report": report,
                    }),
                ),
                Dispatch::Ignored {
                    source,
                    detail_type,
                } => success_response(
                    200,
                    IgnoredEvent {
                        status: "ignored".to_string(),
                        source,
                        detail_type,
                    },
                ),
            },
        )
    } else {
        decode_budget_signal(&payload, invoked_function_arn)
            .map_err(|error| error.at(Stage::Trigger))
            .and_then(|signal| {
                handle_budget_signal(
                    &signal,
                    config,
                    adapters.role_assumer,
                    adapters.publisher,
                    span,
                )
            })
            .map(|outcome| success_response(202, outcome))
    };

    result.map_err(|error| {
        tracing::error!(
            parent: span,
            component = "runtime",
            error_code = error.code(),
            error = %error,
            "run_failed"
        );
        failure_response(&error)
    })
}

/// Per-operation timeout derived from the invocation deadline.
pub fn remaining_budget(deadline_ms: u64, now_ms: i64) -> Duration {
    let deadline_ms = i64::try_from(deadline_ms).unwrap_or(i64::MAX);
    let remaining_ms = deadline_ms
        .saturating_sub(now_ms)
        .saturating_sub(DEADLINE_MARGIN_MS);
    u64::try_from(remaining_ms)
        .map(Duration::from_millis)
        .unwrap_or(MIN_OPERATION_TIMEOUT)
        .max(MIN_OPERATION_TIMEOUT)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use budget_guard_core::arn::RoleArn;
    use budget_guard_core::contract::QuarantineEvent;
    use budget_guard_core::resolver::{OrganizationDirectory, Page};

    use super::*;
    use crate::adapters::notify::NoopNotifier;
    use crate::adapters::policy::AttachStatus;
    use crate::adapters::publish::DeliveryAck;

    const FUNCTION_ARN: &str = "arn:aws:lambda:us-east-1:111111111111:function:guardrail";
    const MANAGEMENT_FUNCTION_ARN: &str =
        "arn:aws:lambda:us-east-1:999999999999:function:guardrail";

    struct OneOuDirectory;

    impl OrganizationDirectory for OneOuDirectory {
        fn list_child_ous(
            &self,
            parent_id: &str,
            _next_token: Option<&str>,
        ) -> Result<Page, String> {
            Ok(Page {
                ids: if parent_id == "r-abc" {
                    vec!["ou-finance".to_string()]
                } else {
                    Vec::new()
                },
                next_token: None,
            })
        }

        fn list_accounts(
            &self,
            parent_id: &str,
            _next_token: Option<&str>,
        ) -> Result<Page, String> {
            Ok(Page {
                ids: if parent_id == "ou-finance" {
                    vec!["111111111111".to_string()]
                } else {
                    Vec::new()
                },
                next_token: None,
            })
        }
    }

    struct Fakes {
        denied: bool,
        assumed: Mutex<Vec<String>>,
        published: Mutex<Vec<QuarantineEvent>>,
        attached: Mutex<Vec<String>>,
    }

    impl Fakes {
        fn new(denied: bool) -> Self {
            Self {
                denied,
                assumed: Mutex::new(Vec::new()),
                published: Mutex::new(Vec::new()),
                attached: Mutex::new(Vec::new()),
            }
        }
    }

    impl RoleAssumer for Fakes {
        type Session = OneOuDirectory;

        fn assume_role(
            &self,
            _role_arn: &RoleArn,
            session_name: &str,
        ) -> Result<OneOuDirectory, String> {
            self.assumed
                .lock()
                .expect("poisoned mutex")
                .push(session_name.to_string());
            if self.denied {
                Err("AccessDenied: role is not trusted".to_string())
            } else {
                Ok(OneOuDirectory)
            }
        }
    }

    impl EventPublisher for Fakes {
        fn publish(&self, event: &QuarantineEvent) -> Result<DeliveryAck, String> {
            self.published
                .lock()
                .expect("poisoned mutex")
                .push(event.clone());
            Ok(DeliveryAck { event_id: None })
        }
    }

    impl PolicyAttacher for Fakes {
        fn attach_policy(&self, _policy_id: &str, target_id: &str) -> Result<AttachStatus, String> {
            self.attached
                .lock()
                .expect("poisoned mutex")
                .push(target_id.to_string());
            Ok(AttachStatus::Attached)
        }
    }

    fn config() -> GuardrailConfig {
        GuardrailConfig {
            deny_all_policy_id: "p-denyall".to_string(),
            cross_account_role_arn: RoleArn::parse("arn:aws:iam::999999999999:role/OrgReadOnly")
                .expect("valid role arn"),
            central_channel_ref: "central-bus".to_string(),
            org_root_id: "r-abc".to_string(),
            session_name: "BudgetAlertForwarderSession".to_string(),
            notification_topic_arn: None,
        }
    }

    fn run(fakes: &Fakes, payload: Value) -> Result<LambdaResponse, LambdaResponse> {
        run_in(fakes, FUNCTION_ARN, payload)
    }

    fn run_in(
        fakes: &Fakes,
        function_arn: &str,
        payload: Value,
    ) -> Result<LambdaResponse, LambdaResponse> {
        let adapters = RuntimeAdapters {
            role_assumer: fakes,
            publisher: fakes,
            attacher: fakes,
            notifier: &NoopNotifier,
        };
        handle_runtime_event(payload, function_arn, &config(), &adapters, &Span::none())
    }

    #[test]
    fn sns_budget_signal_is_forwarded() {
        let fakes = Fakes::new(false);

        let response = run(
            &fakes,
            json!({"Records": [{"EventSource": "aws:sns", "Sns": {"Message": "budget exceeded"}}]}),
        )
        .expect("signal should be forwarded");

        assert_eq!(response.status_code, 202);
        assert_eq!(response.body_json()["source_ou_id"], "ou-finance");
        assert_eq!(fakes.published.lock().expect("poisoned mutex").len(), 1);
        assert!(fakes.attached.lock().expect("poisoned mutex").is_empty());
    }

    #[test]
    fn channel_delivery_is_quarantined() {
        let fakes = Fakes::new(false);

        let response = run(
            &fakes,
            json!({
                "source": "lambda.BudgetAlertForwarder",
                "detail-type": "Budget Alert",
                "detail": {"account_id": "111111111111", "source_ou_id": "ou-finance"}
            }),
        )
        .expect("delivery should be quarantined");

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body_json()["status"], "quarantined");
        assert_eq!(
            *fakes.attached.lock().expect("poisoned mutex"),
            vec!["ou-finance".to_string()]
        );
    }

    #[test]
    fn auth_failure_is_structured_and_stops_the_run() {
        let fakes = Fakes::new(true);

        let response = run(&fakes, json!({})).expect_err("denied role should fail the run");

        assert_eq!(response.status_code, 403);
        assert_eq!(response.body_json()["error"], "auth_error");
        assert!(fakes.published.lock().expect("poisoned mutex").is_empty());
    }

    #[test]
    fn role_in_the_function_account_is_refused() {
        let fakes = Fakes::new(false);

        let response = run_in(&fakes, MANAGEMENT_FUNCTION_ARN, json!({}))
            .expect_err("same-account role should fail the run");

        assert_eq!(response.status_code, 403);
        assert_eq!(response.body_json()["error"], "auth_error");
        assert_eq!(response.body_json()["stage"], "identity");
        assert!(fakes.assumed.lock().expect("poisoned mutex").is_empty());
        assert!(fakes.published.lock().expect("poisoned mutex").is_empty());
    }

    #[test]
    fn explicit_account_cannot_differ_from_the_function_account() {
        let fakes = Fakes::new(false);

        let response = run_in(
            &fakes,
            MANAGEMENT_FUNCTION_ARN,
            json!({"account_id": "111111111111"}),
        )
        .expect_err("foreign account should be rejected");

        assert_eq!(response.status_code, 400);
        assert_eq!(response.body_json()["error"], "validation_error");
        assert_eq!(response.body_json()["stage"], "trigger");
        assert!(fakes.assumed.lock().expect("poisoned mutex").is_empty());
        assert!(fakes.published.lock().expect("poisoned mutex").is_empty());
    }

    #[test]
    fn malformed_trigger_is_reported_at_trigger_stage() {
        let fakes = Fakes::new(false);

        let response =
            run(&fakes, json!({"account_id": "12345"})).expect_err("short id should be rejected");

        assert_eq!(response.status_code, 400);
        assert_eq!(response.body_json()["stage"], "trigger");
        assert!(!response.is_success());
    }

    #[test]
    fn ignored_event_is_distinguishable_from_quarantine() {
        let fakes = Fakes::new(false);

        let response = run(
            &fakes,
            json!({"source": "aws.ec2", "detail-type": "EC2 Instance State-change Notification"}),
        )
        .expect("foreign event should not fail");

        assert_eq!(response.body_json()["status"], "ignored");
        assert!(fakes.attached.lock().expect("poisoned mutex").is_empty());
    }

    #[test]
    fn remaining_budget_respects_margin_and_floor() {
        assert_eq!(remaining_budget(10_000, 2_000), Duration::from_millis(7_500));
        assert_eq!(remaining_budget(1_000, 2_000), MIN_OPERATION_TIMEOUT);
        assert!(remaining_budget(u64::MAX, 0) > MIN_OPERATION_TIMEOUT);
    }
}
