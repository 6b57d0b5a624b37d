use aws_sdk_eventbridge::error::DisplayErrorContext;
use aws_sdk_eventbridge::types::PutEventsRequestEntry;
use budget_guard_core::contract::QuarantineEvent;

use super::block_on_sdk;
use crate::adapters::publish::{DeliveryAck, EventPublisher};

#[derive(Clone)]
pub struct EventBridgePublisher {
    client: aws_sdk_eventbridge::Client,
}

impl EventBridgePublisher {
    pub fn new(client: aws_sdk_eventbridge::Client) -> Self {
        Self { client }
    }
}

impl EventPublisher for EventBridgePublisher {
    fn publish(&self, event: &QuarantineEvent) -> Result<DeliveryAck, String> {
        let entry = PutEventsRequestEntry::builder()
            .source(event.source.as_str())
            .detail_type(event.detail_type.as_str())
            .detail(event.detail_json())
            .event_bus_name(event.channel.as_str())
            .build();
        let client = self.client.clone();

        let output =
            block_on_sdk(async move { client.put_events().entries(entry).send().await })
                .map_err(|error| {
                    format!("events:PutEvents failed: {}", DisplayErrorContext(&error))
                })?;

        // PutEvents reports per-entry rejections inside a successful response.
        if let Some(rejected) = output
            .entries()
            .iter()
            .find(|entry| entry.error_code().is_some())
        {
            return Err(format!(
                "events:PutEvents rejected entry: {} {}",
                rejected.error_code().unwrap_or_default(),
                rejected.error_message().unwrap_or_default()
            ));
        }

        Ok(DeliveryAck {
            event_id: output
                .entries()
                .first()
                .and_then(|entry| entry.event_id())
                .map(str::to_string),
        })
    }
}
