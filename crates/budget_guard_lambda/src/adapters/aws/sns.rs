use aws_sdk_sns::error::DisplayErrorContext;

use super::block_on_sdk;
use crate::adapters::notify::Notifier;

const MAX_SUBJECT_LEN: usize = 100;

#[derive(Clone)]
pub struct SnsNotifier {
    client: aws_sdk_sns::Client,
    topic_arn: String,
}

impl SnsNotifier {
    pub fn new(client: aws_sdk_sns::Client, topic_arn: impl Into<String>) -> Self {
        Self {
            client,
            topic_arn: topic_arn.into(),
        }
    }
}

impl Notifier for SnsNotifier {
    fn notify(&self, subject: &str, message: &str) -> Result<(), String> {
        let client = self.client.clone();
        let topic_arn = self.topic_arn.clone();
        let subject: String = subject.chars().take(MAX_SUBJECT_LEN).collect();
        let message = message.to_string();

        block_on_sdk(async move {
            client
                .publish()
                .topic_arn(topic_arn)
                .subject(subject)
                .message(message)
                .send()
                .await
        })
        .map(|_| ())
        .map_err(|error| format!("sns:Publish failed: {}", DisplayErrorContext(&error)))
    }
}
