//! Disappointments Discord - chat transport
//!
//! Runs the bot over the Discord gateway: direct messages and button presses
//! go into the core router, replies come back out as messages, components,
//! attachments and interaction responses. Notifications are sent as DMs.

pub mod bot;
pub mod components;
pub mod endpoints;
pub mod error;

pub use bot::{DisappointmentsBot, create_client, run};
pub use endpoints::DiscordNotifier;
pub use error::{DiscordError, Result};

// Re-export serenity for convenience
pub use serenity;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{DisappointmentsBot, DiscordError, DiscordNotifier, Result, create_client, run};
}
