use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Attribute the rejection to the stage that made it.
    pub fn at(self, stage: Stage) -> GuardrailError {
        GuardrailError::Validation { stage, error: self }
    }
}

/// Component of a run, used to tell failures apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Trigger,
    Identity,
    Resolve,
    Forward,
    Dispatch,
    Execute,
    Config,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trigger => "trigger",
            Self::Identity => "identity",
            Self::Resolve => "resolve",
            Self::Forward => "forward",
            Self::Dispatch => "dispatch",
            Self::Execute => "execute",
            Self::Config => "config",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),
    #[error("{var} is invalid: {message}")]
    Invalid { var: &'static str, message: String },
}

/// Failure of one stage of a quarantine run.
///
/// Every variant is fatal for the run that produced it. Retrying, alerting and
/// dead-lettering belong to whatever invoked the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardrailError {
    #[error("failed to assume role {role_arn}: {message}")]
    Auth { role_arn: String, message: String },
    #[error("no organizational unit under {root_id} contains account {account_id}")]
    NotFound { account_id: String, root_id: String },
    #[error("failed to list organization directory under {parent_id}: {message}")]
    Directory { parent_id: String, message: String },
    #[error("invalid quarantine payload: {error}")]
    Validation { stage: Stage, error: ValidationError },
    #[error("failed to publish quarantine event to {channel}: {message}")]
    Delivery { channel: String, message: String },
    #[error("failed to attach policy {policy_id} to {target_id}: {cause}")]
    Attach {
        policy_id: String,
        target_id: String,
        cause: String,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl GuardrailError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Auth { .. } => "auth_error",
            Self::NotFound { .. } => "not_found",
            Self::Directory { .. } => "directory_error",
            Self::Validation { .. } => "validation_error",
            Self::Delivery { .. } => "delivery_error",
            Self::Attach { .. } => "attach_error",
            Self::Config(_) => "misconfiguration",
        }
    }

    /// Component of the run that produced the failure.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Auth { .. } => Stage::Identity,
            Self::NotFound { .. } | Self::Directory { .. } => Stage::Resolve,
            Self::Validation { stage, .. } => *stage,
            Self::Delivery { .. } => Stage::Forward,
            Self::Attach { .. } => Stage::Execute,
            Self::Config(_) => Stage::Config,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Auth { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::Validation { .. } => 400,
            Self::Directory { .. } | Self::Delivery { .. } | Self::Attach { .. } => 502,
            Self::Config(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_keeps_message_and_stage() {
        let error = ValidationError::new("detail.account_id is required").at(Stage::Dispatch);

        assert_eq!(error.code(), "validation_error");
        assert_eq!(error.stage(), Stage::Dispatch);
        assert_eq!(error.status_code(), 400);
        assert_eq!(
            error.to_string(),
            "invalid quarantine payload: detail.account_id is required"
        );
    }

    #[test]
    fn attach_error_preserves_underlying_cause() {
        let error = GuardrailError::Attach {
            policy_id: "p-denyall".to_string(),
            target_id: "ou-finance".to_string(),
            cause: "PolicyNotFoundException: no such policy".to_string(),
        };

        assert_eq!(error.status_code(), 502);
        assert_eq!(error.stage(), Stage::Execute);
        assert!(error.to_string().contains("PolicyNotFoundException"));
    }

    #[test]
    fn missing_config_reads_like_the_runtime_message() {
        let error = GuardrailError::from(ConfigError::Missing("ORG_ROOT_ID"));

        assert_eq!(error.code(), "misconfiguration");
        assert_eq!(error.to_string(), "ORG_ROOT_ID must be configured");
    }

    #[test]
    fn producer_and_consumer_rejections_report_different_stages() {
        let producer = ValidationError::new("detail.source_ou_id is required").at(Stage::Forward);
        let consumer = ValidationError::new("detail.source_ou_id is required").at(Stage::Dispatch);

        assert_eq!(producer.code(), consumer.code());
        assert_eq!(producer.stage().as_str(), "forward");
        assert_eq!(consumer.stage().as_str(), "dispatch");
    }
}
