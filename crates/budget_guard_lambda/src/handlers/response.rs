use budget_guard_core::error::GuardrailError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LambdaResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
}

pub fn success_response(status_code: u16, payload: impl Serialize) -> LambdaResponse {
    LambdaResponse {
        status_code,
        headers: json!({"Content-Type": "application/json"}),
        body: serde_json::to_string(&payload).expect("response payload should serialize"),
    }
}

/// Structured failure body distinguishing the stage that failed.
pub fn failure_response(error: &GuardrailError) -> LambdaResponse {
    error_response(
        error.status_code(),
        json!({
            "status": "failed",
            "error": error.code(),
            "stage": error.stage().as_str(),
            "message": error.to_string(),
        }),
    )
}

fn error_response(status_code: u16, payload: Value) -> LambdaResponse {
    LambdaResponse {
        status_code,
        headers: json!({"Content-Type": "application/json"}),
        body: payload.to_string(),
    }
}

#[cfg(test)]
impl LambdaResponse {
    pub(crate) fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub(crate) fn body_json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use budget_guard_core::error::{Stage, ValidationError};

    use super::*;

    #[test]
    fn failure_body_names_error_kind_and_message() {
        let response = failure_response(&GuardrailError::NotFound {
            account_id: "111111111111".to_string(),
            root_id: "r-abc".to_string(),
        });

        assert_eq!(response.status_code, 404);
        assert!(!response.is_success());
        let body = response.body_json();
        assert_eq!(body["status"], "failed");
        assert_eq!(body["error"], "not_found");
        assert_eq!(body["stage"], "resolve");
        assert_eq!(
            body["message"],
            "no organizational unit under r-abc contains account 111111111111"
        );
    }

    #[test]
    fn validation_failures_are_client_errors() {
        let error = ValidationError::new("detail must be a JSON object").at(Stage::Dispatch);
        let response = failure_response(&error);
        assert_eq!(response.status_code, 400);
        assert_eq!(response.body_json()["error"], "validation_error");
    }

    #[test]
    fn serializes_lambda_proxy_shape() {
        let response = success_response(200, json!({"status": "ignored"}));
        let value = serde_json::to_value(&response).expect("response should serialize");

        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["headers"]["Content-Type"], "application/json");
        assert_eq!(value["body"], r#"{"status":"ignored"}"#);
    }
}
