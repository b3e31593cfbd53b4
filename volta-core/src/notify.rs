use async_trait::async_trait;

use crate::order::Order;

#[derive(Debug, thiserror::Error)]
#[error("sms dispatch failed: {0}")]
pub struct NotifyError(pub String);

/// Fire-and-forget customer notification seam. Callers log and swallow
/// failures; a notification must never block order processing.
#[async_trait]
pub trait SmsNotifier: Send + Sync {
    async fn order_update(&self, order: &Order) -> Result<(), NotifyError>;
}

/// Default notifier: writes the notification to the log instead of an SMS
/// gateway. Useful in development and as a stand-in until a gateway
/// integration is configured.
pub struct LogSmsNotifier;

#[async_trait]
impl SmsNotifier for LogSmsNotifier {
    async fn order_update(&self, order: &Order) -> Result<(), NotifyError> {
        tracing::info!(
            phone = %order.customer_phone,
            order = %order.short_id,
            status = %order.status,
            "sms notification"
        );
        Ok(())
    }
}
