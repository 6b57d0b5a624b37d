//! Rule-matching router for events arriving on the centralized channel.
//!
//! Any organization member may publish to the channel. Only an exact
//! `source`/`detail-type` match reaches a target, and the target still
//! validates the payload it is handed.

use tracing::Span;

use crate::contract::{InboundEvent, DETAIL_TYPE, EVENT_SOURCE};
use crate::error::GuardrailError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRule {
    pub source: String,
    pub detail_type: String,
}

impl EventRule {
    pub fn new(source: impl Into<String>, detail_type: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            detail_type: detail_type.into(),
        }
    }

    /// The single rule that may trigger a quarantine.
    pub fn budget_alert() -> Self {
        Self::new(EVENT_SOURCE, DETAIL_TYPE)
    }

    pub fn matches(&self, event: &InboundEvent) -> bool {
        self.source == event.source && self.detail_type == event.detail_type
    }
}

/// Downstream handler invoked for events matching its rule.
pub trait EventTarget {
    type Output;

    fn handle(&self, event: &InboundEvent) -> Result<Self::Output, GuardrailError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch<T> {
    Routed(T),
    Ignored { source: String, detail_type: String },
}

pub struct Dispatcher<'a, T> {
    routes: Vec<(EventRule, &'a T)>,
    span: Span,
}

impl<'a, T> Dispatcher<'a, T>
where
    T: EventTarget,
{
    pub fn new(span: Span) -> Self {
        Self {
            routes: Vec::new(),
            span,
        }
    }

    pub fn register(mut self, rule: EventRule, target: &'a T) -> Self {
        self.routes.push((rule, target));
        self
    }

    /// Route to the first target whose rule matches; unmatched events are
    /// dropped and reported as [`Dispatch::Ignored`].
    pub fn dispatch(&self, event: &InboundEvent) -> Result<Dispatch<T::Output>, GuardrailError> {
        let Some((rule, target)) = self.routes.iter().find(|(rule, _)| rule.matches(event)) else {
            tracing::warn!(
                parent: &self.span,
                component = "dispatcher",
                source = %event.source,
                detail_type = %event.detail_type,
                publisher_account = event.account.as_deref().unwrap_or("unknown"),
                "event_ignored"
            );
            return Ok(Dispatch::Ignored {
                source: event.source.clone(),
                detail_type: event.detail_type.clone(),
            });
        };

        tracing::info!(
            parent: &self.span,
            component = "dispatcher",
            source = %rule.source,
            detail_type = %rule.detail_type,
            event_id = event.id.as_deref().unwrap_or("unknown"),
            "event_routed"
        );
        target.handle(event).map(Dispatch::Routed)
    }
}
