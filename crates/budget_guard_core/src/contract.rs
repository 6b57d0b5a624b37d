use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::ValidationError;

/// Fixed tag identifying the member-account forwarder.
pub const EVENT_SOURCE: &str = "lambda.BudgetAlertForwarder";
pub const DETAIL_TYPE: &str = "Budget Alert";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuarantineDetail {
    pub account_id: String,
    pub source_ou_id: String,
}

impl QuarantineDetail {
    pub fn new(
        account_id: impl Into<String>,
        source_ou_id: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let account_id = account_id.into();
        let source_ou_id = source_ou_id.into();
        let account_id = require_field("detail.account_id", Some(&account_id))?;
        let source_ou_id = require_field("detail.source_ou_id", Some(&source_ou_id))?;
        Ok(Self {
            account_id,
            source_ou_id,
        })
    }

    /// Decode the `detail` object of an inbound delivery. Missing, non-string
    /// and blank fields are all rejected.
    pub fn from_value(detail: &Value) -> Result<Self, ValidationError> {
        let Some(object) = detail.as_object() else {
            return Err(ValidationError::new("detail must be a JSON object"));
        };
        let account_id = require_field(
            "detail.account_id",
            object.get("account_id").and_then(Value::as_str),
        )?;
        let source_ou_id = require_field(
            "detail.source_ou_id",
            object.get("source_ou_id").and_then(Value::as_str),
        )?;
        Ok(Self {
            account_id,
            source_ou_id,
        })
    }
}

/// The event the forwarder publishes on the centralized channel.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct QuarantineEvent {
    pub source: String,
    #[serde(rename = "detail-type")]
    pub detail_type: String,
    pub detail: QuarantineDetail,
    pub channel: String,
}

impl QuarantineEvent {
    pub fn new(
        detail: QuarantineDetail,
        channel: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let channel = channel.into();
        let channel = require_field("channel", Some(&channel))?;
        Ok(Self {
            source: EVENT_SOURCE.to_string(),
            detail_type: DETAIL_TYPE.to_string(),
            detail,
            channel,
        })
    }

    pub fn detail_json(&self) -> String {
        stable_contract_json(&self.detail)
    }

    /// Content hash used to correlate the publish and the attach in logs.
    pub fn fingerprint(&self) -> String {
        detail_fingerprint(&self.detail)
    }
}

/// A delivery as seen by the target on the management side.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct InboundEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
    pub source: String,
    #[serde(rename = "detail-type")]
    pub detail_type: String,
    #[serde(default)]
    pub detail: Value,
}

pub fn detail_fingerprint(detail: &QuarantineDetail) -> String {
    let mut hasher = Sha256::new();
    hasher.update(EVENT_SOURCE);
    hasher.update(DETAIL_TYPE);
    hasher.update(stable_contract_json(detail));
    format!("{:x}", hasher.finalize())
}

pub fn stable_contract_json(value: impl Serialize) -> String {
    serde_json::to_string(&value).expect("serialization of contract value should not fail")
}

fn require_field(name: &str, value: Option<&str>) -> Result<String, ValidationError> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(ValidationError::new(format!("{name} is required"))),
    }
}
