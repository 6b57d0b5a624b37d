//! Decoding of the upstream budget-exceeded trigger.

use serde_json::Value;

use crate::arn::{account_id_from_arn, validate_account_id};
use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetSignal {
    /// The account the receiving function runs in.
    pub account_id: String,
    /// Free text of the notification, kept for the audit trail.
    pub message: Option<String>,
}

/// Decode a budget signal from an SNS notification, a direct invocation with
/// an `account_id`, or an empty payload.
///
/// The account always comes from the invoking function's ARN. An explicit
/// `account_id` is accepted only when it names that same account, so a direct
/// invoker cannot quarantine some other account.
pub fn decode_budget_signal(
    payload: &Value,
    invoked_function_arn: &str,
) -> Result<BudgetSignal, ValidationError> {
    let invoking_account = account_id_from_arn(invoked_function_arn).ok_or_else(|| {
        ValidationError::new(format!(
            "cannot derive account id from function ARN '{invoked_function_arn}'"
        ))
    })?;
    validate_account_id(invoking_account)?;

    let explicit_account = payload
        .get("account_id")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if let Some(requested) = explicit_account {
        validate_account_id(requested)?;
        if requested != invoking_account {
            return Err(ValidationError::new(format!(
                "account_id {requested} does not match invoking account {invoking_account}"
            )));
        }
    }

    Ok(BudgetSignal {
        account_id: invoking_account.to_string(),
        message: sns_message(payload),
    })
}

/// EventBridge deliveries carry both `source` and `detail-type`.
pub fn is_event_bridge_delivery(payload: &Value) -> bool {
    payload.get("source").and_then(Value::as_str).is_some()
        && payload.get("detail-type").and_then(Value::as_str).is_some()
}

fn sns_message(payload: &Value) -> Option<String> {
    payload
        .get("Records")
        .and_then(Value::as_array)?
        .iter()
        .filter(|record| {
            record
                .get("EventSource")
                .and_then(Value::as_str)
                .map(|source| source == "aws:sns")
                .unwrap_or(false)
        })
        .find_map(|record| {
            record
                .get("Sns")
                .and_then(|sns| sns.get("Message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const FUNCTION_ARN: &str = "arn:aws:lambda:us-east-1:111111111111:function:budget-forwarder";

    #[test]
    fn sns_notification_uses_invoking_account() {
        let payload = json!({
            "Records": [{
                "EventSource": "aws:sns",
                "Sns": {"Message": "AWS Budget Notification: actual spend exceeded 100%"}
            }]
        });

        let signal = decode_budget_signal(&payload, FUNCTION_ARN).expect("signal should decode");
        assert_eq!(signal.account_id, "111111111111");
        assert_eq!(
            signal.message.as_deref(),
            Some("AWS Budget Notification: actual spend exceeded 100%")
        );
    }

    #[test]
    fn explicit_account_must_match_invoking_account() {
        let signal = decode_budget_signal(&json!({"account_id": "111111111111"}), FUNCTION_ARN)
            .expect("matching account should decode");
        assert_eq!(signal.account_id, "111111111111");
        assert_eq!(signal.message, None);

        let error = decode_budget_signal(&json!({"account_id": "333333333333"}), FUNCTION_ARN)
            .expect_err("foreign account should be rejected");
        assert!(error.message().contains("does not match invoking account 111111111111"));
    }

    #[test]
    fn rejects_malformed_account_ids() {
        let payload = json!({"account_id": "12345"});
        let error = decode_budget_signal(&payload, FUNCTION_ARN).expect_err("short id should fail");
        assert!(error.message().contains("12 digits"));

        let error = decode_budget_signal(&json!({}), "budget-forwarder")
            .expect_err("missing arn account should fail");
        assert!(error.message().contains("cannot derive account id"));

        let error = decode_budget_signal(&json!({"account_id": "111111111111"}), "budget-forwarder")
            .expect_err("explicit account without arn account should fail");
        assert!(error.message().contains("cannot derive account id"));
    }

    #[test]
    fn detects_eventbridge_delivery_shape() {
        assert!(is_event_bridge_delivery(&json!({
            "source": "lambda.BudgetAlertForwarder",
            "detail-type": "Budget Alert",
            "detail": {}
        })));
        assert!(!is_event_bridge_delivery(&json!({"Records": []})));
        assert!(!is_event_bridge_delivery(&json!({"source": "aws.budgets"})));
    }
}
