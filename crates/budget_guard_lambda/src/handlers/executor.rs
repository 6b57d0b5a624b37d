use budget_guard_core::config::GuardrailConfig;
use budget_guard_core::contract::{detail_fingerprint, InboundEvent, QuarantineDetail};
use budget_guard_core::dispatch::{Dispatch, Dispatcher, EventRule, EventTarget};
use budget_guard_core::error::{GuardrailError, Stage, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::Span;

use crate::adapters::notify::Notifier;
use crate::adapters::policy::{AttachStatus, PolicyAttacher};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AttachResult {
    pub policy_id: String,
    pub target_id: String,
    pub status: AttachStatus,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct QuarantineReport {
    pub account_id: String,
    pub source_ou_id: String,
    pub fingerprint: String,
    pub attachment: AttachResult,
}

/// Attaches the deny-all policy to an OU in the management account.
///
/// An existing attachment is success. Any other failure is reported once and
/// never re-attempted, since a misrouted quarantine locks out unrelated
/// accounts.
pub struct QuarantineExecutor<'a, A> {
    attacher: &'a A,
    deny_all_policy_id: String,
    span: Span,
}

impl<'a, A> QuarantineExecutor<'a, A>
where
    A: PolicyAttacher,
{
    pub fn new(attacher: &'a A, deny_all_policy_id: impl Into<String>, span: Span) -> Self {
        Self {
            attacher,
            deny_all_policy_id: deny_all_policy_id.into(),
            span,
        }
    }

    pub fn quarantine(&self, ou_id: &str, policy_id: &str) -> Result<AttachResult, GuardrailError> {
        let ou_id = ou_id.trim();
        if ou_id.is_empty() {
            return Err(ValidationError::new("source_ou_id is required").at(Stage::Execute));
        }
        let policy_id = policy_id.trim();
        if policy_id.is_empty() {
            return Err(ValidationError::new("deny-all policy id is required").at(Stage::Execute));
        }

        match self.attacher.attach_policy(policy_id, ou_id) {
            Ok(status) => {
                let event = match status {
                    AttachStatus::Attached => "policy_attached",
                    AttachStatus::AlreadyAttached => "policy_already_attached",
                };
                tracing::info!(
                    parent: &self.span,
                    component = "executor",
                    policy_id,
                    ou_id,
                    event,
                    "quarantine_applied"
                );
                Ok(AttachResult {
                    policy_id: policy_id.to_string(),
                    target_id: ou_id.to_string(),
                    status,
                })
            }
            Err(cause) => {
                tracing::error!(
                    parent: &self.span,
                    component = "executor",
                    policy_id,
                    ou_id,
                    error = %cause,
                    "policy_attach_failed"
                );
                Err(GuardrailError::Attach {
                    policy_id: policy_id.to_string(),
                    target_id: ou_id.to_string(),
                    cause,
                })
            }
        }
    }
}

impl<A> EventTarget for QuarantineExecutor<'_, A>
where
    A: PolicyAttacher,
{
    type Output = QuarantineReport;

    fn handle(&self, event: &InboundEvent) -> Result<QuarantineReport, GuardrailError> {
        let detail = QuarantineDetail::from_value(&event.detail).map_err(|error| {
            tracing::error!(
                parent: &self.span,
                component = "executor",
                event_id = event.id.as_deref().unwrap_or("unknown"),
                error = %error,
                "event_rejected"
            );
            error.at(Stage::Dispatch)
        })?;
        let attachment = self.quarantine(&detail.source_ou_id, &self.deny_all_policy_id)?;

        Ok(QuarantineReport {
            fingerprint: detail_fingerprint(&detail),
            account_id: detail.account_id,
            source_ou_id: detail.source_ou_id,
            attachment,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IgnoredEvent {
    pub status: String,
    pub source: String,
    pub detail_type: String,
}

/// Management-account side of a run: decode the delivery, route it through
/// the dispatcher and tell the notification channel how it went.
pub fn handle_channel_event<A, N>(
    payload: Value,
    config: &GuardrailConfig,
    attacher: &A,
    notifier: &N,
    span: &Span,
) -> Result<Dispatch<QuarantineReport>, GuardrailError>
where
    A: PolicyAttacher,
    N: Notifier + ?Sized,
{
    let event: InboundEvent = serde_json::from_value(payload).map_err(|error| {
        ValidationError::new(format!("malformed event envelope: {error}")).at(Stage::Dispatch)
    })?;

    let executor =
        QuarantineExecutor::new(attacher, config.deny_all_policy_id.as_str(), span.clone());
    let dispatcher = Dispatcher::new(span.clone()).register(EventRule::budget_alert(), &executor);
    let outcome = dispatcher.dispatch(&event);

    match &outcome {
        Ok(Dispatch::Routed(report)) => notify_best_effort(
            notifier,
            &format!("Account {} quarantined", report.account_id),
            &format!(
                "Policy {} is attached to OU {} ({}) after account {} exceeded its budget.",
                report.attachment.policy_id,
                report.source_ou_id,
                match report.attachment.status {
                    AttachStatus::Attached => "newly attached",
                    AttachStatus::AlreadyAttached => "already attached",
                },
                report.account_id
            ),
            span,
        ),
        Ok(Dispatch::Ignored { .. }) => {}
        Err(error) => notify_best_effort(
            notifier,
            "Budget quarantine failed",
            &format!(
                "Quarantine request {} failed: {error}",
                event.id.as_deref().unwrap_or("unknown")
            ),
            span,
        ),
    }

    outcome
}

fn notify_best_effort<N>(notifier: &N, subject: &str, message: &str, span: &Span)
where
    N: Notifier + ?Sized,
{
    if let Err(error) = notifier.notify(subject, message) {
        tracing::warn!(
            parent: span,
            component = "notifier",
            error = %error,
            "notification_failed"
        );
    }
}
