//! Submission Workflow
//!
//! The two-step exchange that records a new disappointment:
//!
//! ```text
//! idle --new disappointment, quota > 0--> awaiting target
//! awaiting target --user picked--> awaiting reason
//! awaiting reason --valid reason, quota debited--> idle
//! ```
//!
//! Top-level menu navigation resets a requester to idle at any point.

use std::sync::Arc;

use crate::{
    CoreError, Result,
    disappointment::{Disappointment, MAX_REASON_CHARS},
    id::{ExternalId, UserId},
    ledger::Ledger,
    notify::NotificationDispatcher,
    quota::QuotaPolicy,
    registry::UserRegistry,
    session::{SessionStore, SubmissionState},
    users::User,
};

/// Trim a reason and check it fits the ledger
pub fn validate_reason(raw: &str) -> Result<String> {
    let reason = raw.trim();
    if reason.is_empty() {
        return Err(CoreError::InvalidReason {
            reason: "it is empty",
        });
    }
    if reason.chars().count() > MAX_REASON_CHARS {
        return Err(CoreError::InvalidReason {
            reason: "it is longer than 255 characters",
        });
    }
    Ok(reason.to_string())
}

#[derive(Clone)]
pub struct SubmissionWorkflow {
    registry: UserRegistry,
    ledger: Ledger,
    quota: QuotaPolicy,
    notifications: NotificationDispatcher,
    sessions: Arc<SessionStore>,
}

impl SubmissionWorkflow {
    pub fn new(
        registry: UserRegistry,
        ledger: Ledger,
        quota: QuotaPolicy,
        notifications: NotificationDispatcher,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            registry,
            ledger,
            quota,
            notifications,
            sessions,
        }
    }

    pub fn state(&self, requester: ExternalId) -> SubmissionState {
        self.sessions.state(requester)
    }

    /// Drop any submission in progress
    pub fn cancel(&self, requester: ExternalId) {
        if self.sessions.state(requester) != SubmissionState::Idle {
            tracing::debug!("Submission by {} cancelled", requester);
        }
        self.sessions.reset(requester);
    }

    /// Start a submission, returning the users that can be picked as target.
    ///
    /// Fails with `InsufficientQuota` without touching the session.
    pub async fn begin(&self, requester: &User) -> Result<Vec<User>> {
        self.quota.check(requester)?;
        let targets = self.registry.all().await?;
        self.sessions
            .set(requester.external_id, SubmissionState::AwaitingTarget);
        Ok(targets)
    }

    /// Record the picked target. Returns `false` when the requester isn't
    /// choosing a target right now, in which case nothing changes.
    pub fn choose_target(&self, requester: &User, target: UserId) -> bool {
        if self.sessions.state(requester.external_id) != SubmissionState::AwaitingTarget {
            return false;
        }
        if target == requester.id {
            tracing::debug!("{} is disappointed in themselves", requester.name);
        }
        self.sessions.set(
            requester.external_id,
            SubmissionState::AwaitingReason { target },
        );
        true
    }

    /// Finish a submission with the given reason.
    ///
    /// Returns `Ok(None)` when the requester isn't expected to send a reason.
    /// An invalid reason or exhausted quota leaves the session waiting for
    /// another reason; a target that disappeared ends the submission.
    pub async fn submit_reason(
        &self,
        requester: &User,
        raw_reason: &str,
    ) -> Result<Option<Disappointment>> {
        let SubmissionState::AwaitingReason { target } =
            self.sessions.state(requester.external_id)
        else {
            return Ok(None);
        };

        let reason = validate_reason(raw_reason)?;
        self.quota.check(requester)?;

        let to_user = match self.registry.get(target).await {
            Ok(user) => user,
            Err(e) => {
                self.sessions.reset(requester.external_id);
                return Err(e);
            }
        };

        let remaining = self.quota.spend(requester.id).await?;
        let from_user = User {
            quota: remaining,
            ..requester.clone()
        };

        let disappointment = match self.ledger.create(&from_user, &to_user, &reason).await {
            Ok(d) => d,
            Err(e) => {
                if let Err(refund) = self.quota.refund(requester.id).await {
                    tracing::error!(
                        "Failed to refund {} after a failed submission: {:?}",
                        requester.name,
                        refund
                    );
                }
                return Err(e);
            }
        };

        self.sessions.reset(requester.external_id);
        tracing::info!(
            "{} added disappointment {} to {} ({} points left)",
            from_user.name,
            disappointment.id,
            to_user.name,
            remaining
        );

        self.notifications
            .notify_new_disappointment(&disappointment)
            .await;

        Ok(Some(disappointment))
    }
}
