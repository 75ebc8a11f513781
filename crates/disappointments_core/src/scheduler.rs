//! Periodic quota reset
//!
//! Resets fire on UTC hour boundaries whose hour is a multiple of the
//! configured interval (0:00, 3:00, 6:00, ... for the default of three
//! hours), so the cadence survives restarts without drifting.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, Timelike, Utc};
use tokio::task::JoinHandle;

use crate::{quota::QuotaPolicy, session::SessionStore};

/// First reset boundary strictly after `now`
pub fn next_reset_after(now: DateTime<Utc>, interval_hours: u32) -> DateTime<Utc> {
    let interval = interval_hours.clamp(1, 24);
    let midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    let next_hour = (now.hour() / interval + 1) * interval;

    if next_hour < 24 {
        midnight + Duration::hours(next_hour as i64)
    } else {
        midnight + Duration::days(1)
    }
}

/// Spawn the background task that resets every quota on schedule.
///
/// Expired conversation sessions are swept on the same tick.
pub fn spawn_quota_resets(
    policy: QuotaPolicy,
    sessions: Arc<SessionStore>,
    interval_hours: u32,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(
            "Quota reset scheduled every {} hours to {} points",
            interval_hours,
            policy.reset_amount()
        );

        loop {
            let now = Utc::now();
            let next = next_reset_after(now, interval_hours);
            tracing::debug!("Next quota reset at {}", next);

            let wait = (next - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            run_reset_tick(&policy, &sessions).await;
        }
    })
}

/// One scheduled tick: reset every quota, then sweep expired sessions.
///
/// A failed reset is logged and the sweep still runs. Returns how many
/// sessions were purged.
pub async fn run_reset_tick(policy: &QuotaPolicy, sessions: &SessionStore) -> usize {
    if let Err(e) = policy.reset_all().await {
        tracing::error!("Scheduled quota reset failed: {:?}", e);
    }

    let purged = sessions.purge_expired();
    if purged > 0 {
        tracing::debug!("Purged {} expired sessions", purged);
    }
    purged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_three_hour_boundaries() {
        assert_eq!(next_reset_after(at(1, 0, 0), 3), at(1, 3, 0));
        assert_eq!(next_reset_after(at(1, 4, 59), 3), at(1, 6, 0));
        assert_eq!(next_reset_after(at(1, 5, 59), 3), at(1, 6, 0));
        assert_eq!(next_reset_after(at(1, 21, 0), 3), at(2, 0, 0));
        assert_eq!(next_reset_after(at(1, 23, 30), 3), at(2, 0, 0));
    }

    #[test]
    fn test_uneven_interval_restarts_at_midnight() {
        assert_eq!(next_reset_after(at(1, 20, 10), 5), at(2, 0, 0));
        assert_eq!(next_reset_after(at(1, 19, 10), 5), at(1, 20, 0));
    }

    #[tokio::test]
    async fn test_tick_resets_quotas_and_sweeps_sessions() {
        use crate::{
            db::client, id::ExternalId, registry::UserRegistry, session::SubmissionState,
            users::RosterEntry,
        };
        use std::time::Duration as StdDuration;

        let db = client::create_test_db().await.unwrap();
        let registry = UserRegistry::load(db.clone(), 0).await.unwrap();
        registry
            .seed(&[
                RosterEntry::new("Rustam", 756995300),
                RosterEntry::new("Eldos", 896678539),
            ])
            .await
            .unwrap();
        let policy = QuotaPolicy::new(db, 3);

        // A zero timeout makes every session stale by the time the tick runs
        let sessions = SessionStore::new(StdDuration::ZERO);
        sessions.set(ExternalId(756995300), SubmissionState::AwaitingTarget);
        sessions.set(ExternalId(896678539), SubmissionState::AwaitingTarget);

        assert_eq!(run_reset_tick(&policy, &sessions).await, 2);
        assert!(sessions.is_empty());
        assert!(registry.all().await.unwrap().iter().all(|u| u.quota == 3));

        // Nothing left to sweep, quotas stay put
        assert_eq!(run_reset_tick(&policy, &sessions).await, 0);
        assert!(registry.all().await.unwrap().iter().all(|u| u.quota == 3));
    }

    #[test]
    fn test_degenerate_intervals() {
        assert_eq!(next_reset_after(at(1, 7, 15), 0), at(1, 8, 0));
        assert_eq!(next_reset_after(at(1, 7, 15), 48), at(2, 0, 0));
    }
}
