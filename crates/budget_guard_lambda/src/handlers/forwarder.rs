use budget_guard_core::config::GuardrailConfig;
use budget_guard_core::contract::{QuarantineDetail, QuarantineEvent};
use budget_guard_core::error::{GuardrailError, Stage};
use budget_guard_core::resolver::OuResolver;
use budget_guard_core::signal::BudgetSignal;
use serde::{Deserialize, Serialize};
use tracing::Span;

use crate::adapters::identity::RoleAssumer;
use crate::adapters::publish::{DeliveryAck, EventPublisher};
use crate::handlers::identity::IdentityBroker;

/// Publishes quarantine requests onto the centralized channel.
///
/// Exactly one publish attempt is made per call; transient failures go back
/// to the trigger's own retry policy.
pub struct QuarantineForwarder<'a, P> {
    publisher: &'a P,
    channel: String,
    span: Span,
}

impl<'a, P> QuarantineForwarder<'a, P>
where
    P: EventPublisher,
{
    pub fn new(publisher: &'a P, channel: impl Into<String>, span: Span) -> Self {
        Self {
            publisher,
            channel: channel.into(),
            span,
        }
    }

    pub fn forward(
        &self,
        account_id: &str,
        ou_id: &str,
    ) -> Result<(QuarantineEvent, DeliveryAck), GuardrailError> {
        let detail = QuarantineDetail::new(account_id, ou_id).map_err(|error| {
            tracing::error!(
                parent: &self.span,
                component = "forwarder",
                error = %error,
                "event_rejected"
            );
            error.at(Stage::Forward)
        })?;
        let event = QuarantineEvent::new(detail, self.channel.as_str())
            .map_err(|error| error.at(Stage::Forward))?;

        match self.publisher.publish(&event) {
            Ok(ack) => {
                tracing::info!(
                    parent: &self.span,
                    component = "forwarder",
                    account_id = %event.detail.account_id,
                    source_ou_id = %event.detail.source_ou_id,
                    channel = %event.channel,
                    event_id = ack.event_id.as_deref().unwrap_or("unknown"),
                    fingerprint = %event.fingerprint(),
                    "event_forwarded"
                );
                Ok((event, ack))
            }
            Err(message) => {
                tracing::error!(
                    parent: &self.span,
                    component = "forwarder",
                    channel = %event.channel,
                    error = %message,
                    "event_delivery_failed"
                );
                Err(GuardrailError::Delivery {
                    channel: event.channel,
                    message,
                })
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForwardOutcome {
    pub status: String,
    pub account_id: String,
    pub source_ou_id: String,
    pub channel: String,
    pub event_id: Option<String>,
    pub fingerprint: String,
}

/// Member-account side of a run: assume the cross-account role, resolve the
/// account's OU, then forward the quarantine request.
pub fn handle_budget_signal<R, P>(
    signal: &BudgetSignal,
    config: &GuardrailConfig,
    role_assumer: &R,
    publisher: &P,
    span: &Span,
) -> Result<ForwardOutcome, GuardrailError>
where
    R: RoleAssumer,
    P: EventPublisher,
{
    tracing::info!(
        parent: span,
        component = "forwarder",
        account_id = %signal.account_id,
        "budget_signal_received"
    );

    let broker = IdentityBroker::new(role_assumer, signal.account_id.as_str(), span.clone());
    let session_name = format!("{}-{}", config.session_name, signal.account_id);
    let session = broker.assume_role(&config.cross_account_role_arn, &session_name)?;

    let source_ou_id = OuResolver::new(&session, span.clone())
        .resolve(&signal.account_id, &config.org_root_id)?;
    drop(session);

    let forwarder =
        QuarantineForwarder::new(publisher, config.central_channel_ref.as_str(), span.clone());
    let (event, ack) = forwarder.forward(&signal.account_id, &source_ou_id)?;

    Ok(ForwardOutcome {
        status: "forwarded".to_string(),
        fingerprint: event.fingerprint(),
        account_id: event.detail.account_id,
        source_ou_id: event.detail.source_ou_id,
        channel: event.channel,
        event_id: ack.event_id,
    })
}
