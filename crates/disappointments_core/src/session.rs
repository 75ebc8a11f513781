//! Conversation sessions
//!
//! Transient per-requester state for the submission workflow. Nothing here is
//! persisted: a restart drops every session back to idle. Sessions that have
//! not been touched for the idle timeout are treated as idle and dropped the
//! next time they are looked at.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use crate::id::{ExternalId, UserId};

/// Where a requester is in the two-step submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    AwaitingTarget,
    AwaitingReason {
        target: UserId,
    },
}

#[derive(Debug)]
struct Session {
    state: SubmissionState,
    touched: Instant,
}

#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<ExternalId, Session>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            idle_timeout,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Current state, with expired sessions reported (and dropped) as idle
    pub fn state(&self, key: ExternalId) -> SubmissionState {
        let expired = match self.sessions.get(&key) {
            Some(session) if !self.is_expired(&session) => return session.state,
            Some(_) => true,
            None => false,
        };

        if expired {
            self.sessions.remove(&key);
            tracing::debug!("Session for {} expired", key);
        }
        SubmissionState::Idle
    }

    /// Move a requester to `state`; idle removes the session entirely
    pub fn set(&self, key: ExternalId, state: SubmissionState) {
        if state == SubmissionState::Idle {
            self.sessions.remove(&key);
            return;
        }

        self.sessions.insert(
            key,
            Session {
                state,
                touched: Instant::now(),
            },
        );
    }

    pub fn reset(&self, key: ExternalId) {
        self.sessions.remove(&key);
    }

    /// Drop every expired session, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| session.touched.elapsed() < self.idle_timeout);
        before - self.sessions.len()
    }

    /// Number of sessions that are not idle, expired ones included
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn is_expired(&self, session: &Session) -> bool {
        session.touched.elapsed() >= self.idle_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: ExternalId = ExternalId(1);
    const BOB: ExternalId = ExternalId(2);

    #[tokio::test]
    async fn test_sessions_are_per_requester() {
        let store = SessionStore::new(Duration::from_secs(60));
        let target = UserId::generate();

        store.set(ALICE, SubmissionState::AwaitingTarget);
        store.set(BOB, SubmissionState::AwaitingReason { target });

        assert_eq!(store.state(ALICE), SubmissionState::AwaitingTarget);
        assert_eq!(store.state(BOB), SubmissionState::AwaitingReason { target });
        assert_eq!(store.state(ExternalId(3)), SubmissionState::Idle);
    }

    #[tokio::test]
    async fn test_idle_removes_session() {
        let store = SessionStore::new(Duration::from_secs(60));
        store.set(ALICE, SubmissionState::AwaitingTarget);
        store.set(ALICE, SubmissionState::Idle);
        assert!(store.is_empty());

        store.set(ALICE, SubmissionState::AwaitingTarget);
        store.reset(ALICE);
        assert_eq!(store.state(ALICE), SubmissionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sessions_expire_after_idle_timeout() {
        let store = SessionStore::new(Duration::from_secs(60));
        store.set(ALICE, SubmissionState::AwaitingTarget);

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(store.state(ALICE), SubmissionState::AwaitingTarget);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(store.state(ALICE), SubmissionState::Idle);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let store = SessionStore::new(Duration::from_secs(10));
        store.set(ALICE, SubmissionState::AwaitingTarget);
        tokio::time::advance(Duration::from_secs(11)).await;
        store.set(BOB, SubmissionState::AwaitingTarget);

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.state(BOB), SubmissionState::AwaitingTarget);
    }

    #[tokio::test]
    async fn test_zero_timeout_always_expires() {
        let store = SessionStore::new(Duration::ZERO);
        store.set(ALICE, SubmissionState::AwaitingTarget);
        assert_eq!(store.state(ALICE), SubmissionState::Idle);
    }
}
