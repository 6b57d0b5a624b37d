//! ARN and account-id parsing used at the trust boundary.

use std::fmt;

use crate::error::ValidationError;

pub const ACCOUNT_ID_LEN: usize = 12;
const MAX_SESSION_NAME_LEN: usize = 64;
const MIN_SESSION_NAME_LEN: usize = 2;

/// An IAM role ARN of the form `arn:<partition>:iam::<account>:role/<name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleArn {
    raw: String,
    partition: String,
    account_id: String,
    role_name: String,
}

impl RoleArn {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        let parts: Vec<&str> = raw.splitn(6, ':').collect();
        if parts.len() != 6 || parts[0] != "arn" {
            return Err(ValidationError::new(format!("'{raw}' is not an ARN")));
        }

        let (partition, service, region, account_id, resource) =
            (parts[1], parts[2], parts[3], parts[4], parts[5]);
        if partition.is_empty() {
            return Err(ValidationError::new("role ARN partition cannot be empty"));
        }
        if service != "iam" || !region.is_empty() {
            return Err(ValidationError::new(format!("'{raw}' is not a global IAM ARN")));
        }
        validate_account_id(account_id)?;

        let Some(path_and_name) = resource.strip_prefix("role/") else {
            return Err(ValidationError::new(format!("'{raw}' does not reference a role")));
        };
        let role_name = path_and_name.rsplit('/').next().unwrap_or_default();
        if role_name.is_empty() {
            return Err(ValidationError::new("role name cannot be empty"));
        }

        Ok(Self {
            raw: raw.to_string(),
            partition: partition.to_string(),
            account_id: account_id.to_string(),
            role_name: role_name.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn partition(&self) -> &str {
        &self.partition
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn role_name(&self) -> &str {
        &self.role_name
    }
}

impl fmt::Display for RoleArn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

pub fn validate_account_id(value: &str) -> Result<(), ValidationError> {
    if value.len() == ACCOUNT_ID_LEN && value.bytes().all(|byte| byte.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new(format!(
            "account id '{value}' must be {ACCOUNT_ID_LEN} digits"
        )))
    }
}

/// Account segment of any ARN, e.g. the invoking account of a function ARN.
pub fn account_id_from_arn(arn: &str) -> Option<&str> {
    let mut parts = arn.split(':');
    if parts.next()? != "arn" {
        return None;
    }
    parts.nth(3).filter(|account| !account.is_empty())
}

/// Clamp a free-form label to the characters and length STS accepts for
/// `RoleSessionName`.
pub fn sanitize_session_name(label: &str) -> String {
    let mut name: String = label
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || "=,.@_-".contains(ch) {
                ch
            } else {
                '-'
            }
        })
        .take(MAX_SESSION_NAME_LEN)
        .collect();
    while name.len() < MIN_SESSION_NAME_LEN {
        name.push('_');
    }
    name
}
