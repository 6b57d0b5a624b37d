use crate::arn::RoleArn;
use crate::error::ConfigError;

pub const DENY_ALL_POLICY_ID_VAR: &str = "DENY_ALL_POLICY_ID";
pub const CROSS_ACCOUNT_ROLE_ARN_VAR: &str = "CROSS_ACCOUNT_ROLE_ARN";
pub const CENTRAL_CHANNEL_VAR: &str = "CENTRAL_EVENT_BUS_ARN";
pub const ORG_ROOT_ID_VAR: &str = "ORG_ROOT_ID";
pub const SESSION_NAME_VAR: &str = "ASSUME_ROLE_SESSION_NAME";
pub const NOTIFICATION_TOPIC_VAR: &str = "NOTIFICATION_TOPIC_ARN";

pub const DEFAULT_SESSION_NAME: &str = "BudgetAlertForwarderSession";

/// Deployment settings handed to each component when it is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardrailConfig {
    pub deny_all_policy_id: String,
    pub cross_account_role_arn: RoleArn,
    pub central_channel_ref: String,
    pub org_root_id: String,
    pub session_name: String,
    pub notification_topic_arn: Option<String>,
}

impl GuardrailConfig {
    /// Build the config from a key lookup, normally `std::env::var`.
    /// Blank values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let require = |key: &'static str| read(key).ok_or(ConfigError::Missing(key));

        let role_arn_raw = require(CROSS_ACCOUNT_ROLE_ARN_VAR)?;
        let cross_account_role_arn =
            RoleArn::parse(&role_arn_raw).map_err(|error| ConfigError::Invalid {
                var: CROSS_ACCOUNT_ROLE_ARN_VAR,
                message: error.message().to_string(),
            })?;

        Ok(Self {
            deny_all_policy_id: require(DENY_ALL_POLICY_ID_VAR)?,
            cross_account_role_arn,
            central_channel_ref: require(CENTRAL_CHANNEL_VAR)?,
            org_root_id: require(ORG_ROOT_ID_VAR)?,
            session_name: read(SESSION_NAME_VAR)
                .unwrap_or_else(|| DEFAULT_SESSION_NAME.to_string()),
            notification_topic_arn: read(NOTIFICATION_TOPIC_VAR),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| values.get(key).cloned()
    }

    fn complete() -> Vec<(&'static str, &'static str)> {
        vec![
            (DENY_ALL_POLICY_ID_VAR, "p-denyall"),
            (
                CROSS_ACCOUNT_ROLE_ARN_VAR,
                "arn:aws:iam::999999999999:role/OrgReadOnly",
            ),
            (
                CENTRAL_CHANNEL_VAR,
                "arn:aws:events:us-east-1:999999999999:event-bus/central",
            ),
            (ORG_ROOT_ID_VAR, "r-abc"),
        ]
    }

    #[test]
    fn loads_required_values_and_defaults() {
        let config = GuardrailConfig::from_lookup(lookup_from(&complete()))
            .expect("config should load");

        assert_eq!(config.deny_all_policy_id, "p-denyall");
        assert_eq!(config.cross_account_role_arn.account_id(), "999999999999");
        assert_eq!(config.org_root_id, "r-abc");
        assert_eq!(config.session_name, DEFAULT_SESSION_NAME);
        assert_eq!(config.notification_topic_arn, None);
    }

    #[test]
    fn blank_values_count_as_missing() {
        let mut pairs = complete();
        pairs.retain(|(key, _)| *key != ORG_ROOT_ID_VAR);
        pairs.push((ORG_ROOT_ID_VAR, "   "));

        let error =
            GuardrailConfig::from_lookup(lookup_from(&pairs)).expect_err("blank root should fail");
        assert_eq!(error, ConfigError::Missing(ORG_ROOT_ID_VAR));
    }

    #[test]
    fn rejects_malformed_role_arn() {
        let mut pairs = complete();
        pairs.retain(|(key, _)| *key != CROSS_ACCOUNT_ROLE_ARN_VAR);
        pairs.push((CROSS_ACCOUNT_ROLE_ARN_VAR, "OrgReadOnly"));

        let error =
            GuardrailConfig::from_lookup(lookup_from(&pairs)).expect_err("bad arn should fail");
        assert!(matches!(
            error,
            ConfigError::Invalid {
                var: CROSS_ACCOUNT_ROLE_ARN_VAR,
                ..
            }
        ));
    }

    #[test]
    fn optional_values_are_picked_up() {
        let mut pairs = complete();
        pairs.push((SESSION_NAME_VAR, "quarantine-audit"));
        pairs.push((
            NOTIFICATION_TOPIC_VAR,
            "arn:aws:sns:us-east-1:999999999999:budget-quarantine",
        ));

        let config = GuardrailConfig::from_lookup(lookup_from(&pairs)).expect("config should load");
        assert_eq!(config.session_name, "quarantine-audit");
        assert!(config.notification_topic_arn.is_some());
    }
}
