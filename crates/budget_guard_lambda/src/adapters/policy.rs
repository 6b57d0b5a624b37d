use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachStatus {
    Attached,
    AlreadyAttached,
}

/// Implementations must report an existing attachment as
/// [`AttachStatus::AlreadyAttached`] rather than an error.
pub trait PolicyAttacher {
    fn attach_policy(&self, policy_id: &str, target_id: &str) -> Result<AttachStatus, String>;
}
