use budget_guard_core::contract::QuarantineEvent;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryAck {
    pub event_id: Option<String>,
}

/// Single publish attempt onto the centralized channel named by the event.
pub trait EventPublisher {
    fn publish(&self, event: &QuarantineEvent) -> Result<DeliveryAck, String>;
}
