/// User-facing notifications (toasts in a browser storefront).
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Emits notifications as log events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        tracing::info!(notification = "success", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::warn!(notification = "error", "{message}");
    }
}
