use budget_guard_core::arn::{sanitize_session_name, RoleArn};
use budget_guard_core::error::GuardrailError;
use tracing::Span;

use crate::adapters::identity::RoleAssumer;

/// Obtains delegated credentials for the management account's directory.
///
/// Failures are never retried here: repeated failed assumptions would hide a
/// misconfigured trust boundary.
pub struct IdentityBroker<'a, R> {
    assumer: &'a R,
    invoking_account: String,
    span: Span,
}

impl<'a, R> IdentityBroker<'a, R>
where
    R: RoleAssumer,
{
    pub fn new(assumer: &'a R, invoking_account: impl Into<String>, span: Span) -> Self {
        Self {
            assumer,
            invoking_account: invoking_account.into(),
            span,
        }
    }

    pub fn assume_role(
        &self,
        role_arn: &RoleArn,
        session_name: &str,
    ) -> Result<R::Session, GuardrailError> {
        if role_arn.account_id() == self.invoking_account {
            tracing::error!(
                parent: &self.span,
                component = "identity_broker",
                role_arn = %role_arn,
                "same_account_role_rejected"
            );
            return Err(GuardrailError::Auth {
                role_arn: role_arn.to_string(),
                message: "role must belong to a different, pre-trusted account".to_string(),
            });
        }

        let session_name = sanitize_session_name(session_name);
        match self.assumer.assume_role(role_arn, &session_name) {
            Ok(session) => {
                tracing::info!(
                    parent: &self.span,
                    component = "identity_broker",
                    role_arn = %role_arn,
                    session_name = %session_name,
                    "role_assumed"
                );
                Ok(session)
            }
            Err(message) => {
                tracing::error!(
                    parent: &self.span,
                    component = "identity_broker",
                    role_arn = %role_arn,
                    error = %message,
                    "role_assumption_failed"
                );
                Err(GuardrailError::Auth {
                    role_arn: role_arn.to_string(),
                    message,
                })
            }
        }
    }
}
