pub trait Notifier {
    fn notify(&self, subject: &str, message: &str) -> Result<(), String>;
}

/// Used when no notification topic is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _subject: &str, _message: &str) -> Result<(), String> {
        Ok(())
    }
}
