//! Notification Dispatcher
//!
//! Pushes events to the user they concern. Delivery is a single best-effort
//! attempt: a failed send is logged and dropped, never retried and never
//! reported back to whoever caused the event.

use std::sync::Arc;

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

use crate::{disappointment::Disappointment, id::ExternalId, users::User};

#[derive(Error, Diagnostic, Debug)]
#[error("Failed to notify {recipient}")]
#[diagnostic(code(disappointments::notify::delivery_failed))]
pub struct NotifyError {
    pub recipient: ExternalId,
    #[source]
    pub cause: Box<dyn std::error::Error + Send + Sync>,
}

impl NotifyError {
    pub fn new(
        recipient: ExternalId,
        cause: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            recipient,
            cause: cause.into(),
        }
    }
}

/// Outbound side of the transport used for unsolicited messages
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Tell `disappointment.to_user` that a new entry was recorded about them
    async fn new_disappointment(
        &self,
        disappointment: &Disappointment,
    ) -> std::result::Result<(), NotifyError>;

    /// Tell `disappointment.to_user` that an entry about them was removed
    async fn disappointment_deleted(
        &self,
        disappointment: &Disappointment,
    ) -> std::result::Result<(), NotifyError>;
}

/// A notifier that drops everything, for offline maintenance commands
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

#[async_trait]
impl Notifier for SilentNotifier {
    async fn new_disappointment(&self, _: &Disappointment) -> std::result::Result<(), NotifyError> {
        Ok(())
    }

    async fn disappointment_deleted(
        &self,
        _: &Disappointment,
    ) -> std::result::Result<(), NotifyError> {
        Ok(())
    }
}

/// Fire-and-forget wrapper around a [`Notifier`]
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    pub async fn notify_new_disappointment(&self, disappointment: &Disappointment) {
        match self.notifier.new_disappointment(disappointment).await {
            Ok(()) => tracing::debug!(
                "Notified {} about disappointment {}",
                disappointment.to_user.name,
                disappointment.id
            ),
            Err(e) => discard(&disappointment.to_user, e),
        }
    }

    pub async fn notify_deleted(&self, disappointment: &Disappointment) {
        match self.notifier.disappointment_deleted(disappointment).await {
            Ok(()) => tracing::debug!(
                "Notified {} about deletion of {}",
                disappointment.to_user.name,
                disappointment.id
            ),
            Err(e) => discard(&disappointment.to_user, e),
        }
    }
}

fn discard(recipient: &User, error: NotifyError) {
    tracing::warn!(
        "Dropping notification for {} ({}): {}",
        recipient.name,
        recipient.external_id,
        error.cause
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{DisappointmentId, UserId};
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Unreachable {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl Notifier for Unreachable {
        async fn new_disappointment(
            &self,
            d: &Disappointment,
        ) -> std::result::Result<(), NotifyError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(NotifyError::new(d.to_user.external_id, "user blocked the bot"))
        }

        async fn disappointment_deleted(
            &self,
            d: &Disappointment,
        ) -> std::result::Result<(), NotifyError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(NotifyError::new(d.to_user.external_id, "user blocked the bot"))
        }
    }

    fn sample() -> Disappointment {
        let user = |name: &str, external| User {
            id: UserId::generate(),
            name: name.to_string(),
            external_id: ExternalId(external),
            quota: 3,
        };
        Disappointment {
            id: DisappointmentId::generate(),
            reason: "late again".to_string(),
            from_user: user("Eldos", 1),
            to_user: user("Rustam", 2),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_failures_are_swallowed_after_one_attempt() {
        let notifier = Arc::new(Unreachable {
            attempts: AtomicUsize::new(0),
        });
        let dispatcher = NotificationDispatcher::new(notifier.clone());

        dispatcher.notify_new_disappointment(&sample()).await;
        dispatcher.notify_deleted(&sample()).await;

        assert_eq!(notifier.attempts.load(Ordering::SeqCst), 2);
    }
}
