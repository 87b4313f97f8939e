use std::collections::HashMap;

use async_trait::async_trait;

use stayclose_models::user::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryResult {
    Delivered,
    Failed(String),
}

/// Transport seam. The delivery outcome never feeds back into trigger state:
/// the scheduler guarantees at most one trigger decision per occurrence, not
/// delivery, and retries are the transport's concern.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn send(&self, user_id: UserId, notification: &Notification) -> DeliveryResult;
}
