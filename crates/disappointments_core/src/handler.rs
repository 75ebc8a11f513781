//! Interaction routing
//!
//! Turns one inbound [`Interaction`] into the replies the transport should
//! deliver. Recoverable failures become plain messages here; anything else is
//! logged and answered with a generic apology so one broken interaction never
//! affects the rest.

use std::sync::Arc;

use crate::{
    CoreError, Result,
    config::BotConfig,
    db::Db,
    format,
    intent::{ChatContext, Intent, Interaction, Origin},
    ledger::Ledger,
    notify::{NotificationDispatcher, Notifier},
    quota::QuotaPolicy,
    registry::UserRegistry,
    reply::{Markup, Reply},
    report::ReportExporter,
    session::SessionStore,
    users::User,
    workflow::SubmissionWorkflow,
};

#[derive(Clone)]
pub struct InteractionHandler {
    registry: UserRegistry,
    ledger: Ledger,
    quota: QuotaPolicy,
    workflow: SubmissionWorkflow,
    notifications: NotificationDispatcher,
    exporter: ReportExporter,
    sessions: Arc<SessionStore>,
    reset_interval_hours: u32,
    utc_offset: chrono::Duration,
}

impl InteractionHandler {
    /// Wire every component from configuration.
    ///
    /// Loads the registry cache but does not seed the roster.
    pub async fn from_config(
        db: Db,
        config: &BotConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let registry = UserRegistry::load(db.clone(), config.quota.default_quota).await?;
        let ledger = Ledger::new(db.clone());
        let quota = QuotaPolicy::new(db, config.quota.reset_amount);
        let notifications = NotificationDispatcher::new(notifier);
        let sessions = Arc::new(SessionStore::new(config.session.idle_timeout()));
        let workflow = SubmissionWorkflow::new(
            registry.clone(),
            ledger.clone(),
            quota.clone(),
            notifications.clone(),
            sessions.clone(),
        );
        let exporter = ReportExporter::new(&config.report.path, config.report.utc_offset());

        Ok(Self {
            registry,
            ledger,
            quota,
            workflow,
            notifications,
            exporter,
            sessions,
            reset_interval_hours: config.quota.reset_interval_hours,
            utc_offset: config.report.utc_offset(),
        })
    }

    pub fn registry(&self) -> &UserRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn quota(&self) -> &QuotaPolicy {
        &self.quota
    }

    pub fn workflow(&self) -> &SubmissionWorkflow {
        &self.workflow
    }

    pub fn exporter(&self) -> &ReportExporter {
        &self.exporter
    }

    pub fn sessions(&self) -> Arc<SessionStore> {
        self.sessions.clone()
    }

    pub async fn handle(&self, interaction: &Interaction) -> Vec<Reply> {
        if interaction.context == ChatContext::Group {
            tracing::warn!("Rejected group interaction from {}", interaction.sender);
            return acknowledged(interaction.origin, vec![Reply::text(format::GROUP_NOT_ALLOWED)]);
        }

        if !self.registry.is_known(interaction.sender) {
            tracing::debug!("Ignoring unknown identity {}", interaction.sender);
            return acknowledged(interaction.origin, vec![Reply::text(format::UNKNOWN_USER)]);
        }

        tracing::debug!(
            "Routing {:?} from {} via {:?}",
            interaction.intent,
            interaction.sender,
            interaction.origin
        );

        let replies = match self.dispatch(interaction).await {
            Ok(replies) => replies,
            Err(e) => self.recover(interaction, e),
        };
        acknowledged(interaction.origin, replies)
    }

    async fn dispatch(&self, interaction: &Interaction) -> Result<Vec<Reply>> {
        let requester = self.registry.get_by_external(interaction.sender).await?;

        if interaction.intent.is_top_level() {
            self.workflow.cancel(requester.external_id);
        }

        let replies = match &interaction.intent {
            Intent::Profile => {
                let received = self.ledger.count_received(requester.id).await?;
                vec![Reply::with_markup(
                    format::profile(&requester, received),
                    Markup::ProfileMenu,
                )]
            }
            Intent::AllDisappointments => vec![Reply::with_markup(
                format::ALL_DISAPPOINTMENTS,
                Markup::DownloadReport,
            )],
            Intent::NewDisappointment => {
                let targets = self.workflow.begin(&requester).await?;
                vec![Reply::with_markup(
                    format::CHOOSE_TARGET,
                    Markup::TargetList(targets),
                )]
            }
            Intent::MyDisappointments => vec![Reply::with_markup(
                format::USER_DISAPPOINTMENTS_MENU,
                Markup::UserDisappointmentsMenu,
            )],
            Intent::FromMe => {
                let entries = self.ledger.get_by_requester(requester.id).await?;
                pages(format::requester_listing(&entries))
            }
            Intent::ToMe => {
                let entries = self.ledger.get_by_recipient(requester.id).await?;
                pages(format::recipient_listing(&entries))
            }
            Intent::DownloadReport => {
                let entries = self.ledger.get_all().await?;
                let path = self.exporter.export(&entries)?;
                vec![Reply::Document { path }]
            }
            Intent::SelectTarget(target) => {
                if self.workflow.choose_target(&requester, *target) {
                    vec![Reply::text(format::REASON_PROMPT)]
                } else {
                    vec![]
                }
            }
            Intent::ViewDisappointment(id) => {
                let disappointment = self.ledger.get_by_id(*id).await?;
                let content = format::detail(&disappointment, self.utc_offset);
                if disappointment.is_authored_by(&requester) {
                    vec![Reply::with_markup(content, Markup::DeleteButton(*id))]
                } else {
                    vec![Reply::text(content)]
                }
            }
            Intent::DeleteDisappointment(id) => {
                self.delete(&requester, *id).await?;
                vec![Reply::Alert(format::DELETED.to_string()), Reply::RemoveOrigin]
            }
            Intent::MalformedReference(reference) => {
                tracing::debug!("Malformed disappointment reference {:?}", reference);
                vec![not_found(interaction.origin)]
            }
            Intent::Text(text) => match self.workflow.submit_reason(&requester, text).await? {
                Some(disappointment) => vec![Reply::text(format::submitted(&disappointment))],
                None => vec![Reply::with_markup(format::MAIN_MENU, Markup::MainMenu)],
            },
            Intent::Unknown(data) => {
                tracing::debug!("Unknown button payload {:?}", data);
                vec![]
            }
        };

        Ok(replies)
    }

    async fn delete(&self, requester: &User, id: crate::id::DisappointmentId) -> Result<()> {
        let disappointment = self.ledger.get_by_id(id).await?;
        if !disappointment.is_authored_by(requester) {
            return Err(CoreError::NotAuthor { id });
        }

        let deleted = self.ledger.delete(id).await?;
        self.notifications.notify_deleted(&deleted).await;
        Ok(())
    }

    fn recover(&self, interaction: &Interaction, error: CoreError) -> Vec<Reply> {
        match error {
            CoreError::UserNotFound { reference } => {
                tracing::debug!("User not found: {}", reference);
                vec![answer(interaction.origin, format::USER_NOT_FOUND)]
            }
            e if e.is_not_found() => {
                tracing::debug!("{}", e);
                vec![not_found(interaction.origin)]
            }
            CoreError::InsufficientQuota { .. } => {
                vec![Reply::text(format::no_quota(self.reset_interval_hours))]
            }
            CoreError::InvalidReason { reason } => {
                vec![Reply::text(format::invalid_reason(reason))]
            }
            CoreError::NotAuthor { .. } => vec![answer(interaction.origin, format::NOT_AUTHOR)],
            other => {
                tracing::error!(
                    "Interaction {:?} from {} failed: {:?}",
                    interaction.intent,
                    interaction.sender,
                    other
                );
                vec![Reply::text(format::SOMETHING_WENT_WRONG)]
            }
        }
    }
}

/// Missing entries are a popup on buttons and a message otherwise
fn not_found(origin: Origin) -> Reply {
    answer(origin, format::NOT_FOUND)
}

fn answer(origin: Origin, content: &str) -> Reply {
    match origin {
        Origin::Callback => Reply::Alert(content.to_string()),
        Origin::Message => Reply::text(content),
    }
}

fn pages(pages: Vec<String>) -> Vec<Reply> {
    if pages.is_empty() {
        return vec![Reply::text(format::NOTHING_YET)];
    }
    pages.into_iter().map(Reply::text).collect()
}

/// Every button press gets exactly one answer: an alert if there is one,
/// otherwise a silent acknowledgement
fn acknowledged(origin: Origin, mut replies: Vec<Reply>) -> Vec<Reply> {
    if origin == Origin::Callback
        && !replies
            .iter()
            .any(|r| matches!(r, Reply::Alert(_) | Reply::Ack))
    {
        replies.push(Reply::Ack);
    }
    replies
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callbacks_are_always_answered() {
        let replies = acknowledged(Origin::Callback, vec![Reply::text("hi")]);
        assert_eq!(replies.last(), Some(&Reply::Ack));

        let replies = acknowledged(Origin::Callback, vec![Reply::Alert("x".to_string())]);
        assert_eq!(replies.len(), 1);

        let replies = acknowledged(Origin::Message, vec![Reply::text("hi")]);
        assert_eq!(replies.len(), 1);
    }

    #[test]
    fn test_empty_listing() {
        assert_eq!(pages(vec![]), vec![Reply::text(format::NOTHING_YET)]);
    }
}
