//! Disappointments Core - ledger, quotas and the submission workflow
//!
//! This crate holds everything the bot does that doesn't depend on the chat
//! transport: the user registry, the disappointment ledger and its listing
//! queries, the quota policy with its reset schedule, the two-step
//! submission workflow, text rendering and the spreadsheet report.

pub mod config;
pub mod db;
pub mod disappointment;
pub mod error;
pub mod format;
pub mod handler;
pub mod id;
pub mod intent;
pub mod ledger;
pub mod notify;
pub mod quota;
pub mod registry;
pub mod reply;
pub mod report;
pub mod scheduler;
pub mod session;
pub mod users;
pub mod workflow;

pub use config::BotConfig;
pub use disappointment::Disappointment;
pub use error::{CoreError, Result};
pub use handler::InteractionHandler;
pub use id::{DisappointmentId, ExternalId, Id, IdType, UserId};
pub use intent::{ChatContext, Intent, Interaction, Origin};
pub use ledger::Ledger;
pub use notify::{NotificationDispatcher, Notifier, NotifyError};
pub use quota::QuotaPolicy;
pub use registry::UserRegistry;
pub use reply::{Button, Markup, Reply};
pub use report::ReportExporter;
pub use session::{SessionStore, SubmissionState};
pub use users::{RosterEntry, User};
pub use workflow::SubmissionWorkflow;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        BotConfig, Button, ChatContext, CoreError, Disappointment, DisappointmentId, ExternalId,
        Intent, Interaction, InteractionHandler, Ledger, Markup, Notifier, NotifyError, Origin,
        QuotaPolicy, Reply, Result, RosterEntry, User, UserId, UserRegistry,
    };
}
