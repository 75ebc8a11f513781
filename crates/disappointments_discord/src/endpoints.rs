//! Unsolicited direct messages to roster members

use std::sync::Arc;

use async_trait::async_trait;
use disappointments_core::{Disappointment, ExternalId, Markup, Notifier, NotifyError, format};
use serenity::all::{CreateMessage, Http, UserId as DiscordUserId};
use tracing::info;

use crate::{
    components::action_rows,
    error::{DiscordError, Result},
};

/// Sends notifications as DMs through its own HTTP client
#[derive(Clone)]
pub struct DiscordNotifier {
    http: Arc<Http>,
}

impl DiscordNotifier {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    pub fn from_token(token: &str) -> Self {
        Self::new(Arc::new(Http::new(token)))
    }

    async fn send_dm(&self, recipient: ExternalId, message: CreateMessage) -> Result<()> {
        let user_id = discord_user(recipient)?;

        let dm_channel = user_id
            .create_dm_channel(&self.http)
            .await
            .map_err(|cause| DiscordError::MessageSendFailed {
                destination: format!("DM with {}", user_id),
                cause,
            })?;

        dm_channel
            .send_message(&self.http, message)
            .await
            .map_err(|cause| DiscordError::MessageSendFailed {
                destination: format!("DM with {}", user_id),
                cause,
            })?;

        info!("Sent DM to Discord user {}", user_id);
        Ok(())
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn new_disappointment(
        &self,
        disappointment: &Disappointment,
    ) -> std::result::Result<(), NotifyError> {
        let recipient = disappointment.to_user.external_id;
        let message = CreateMessage::new()
            .content(format::NEW_DISAPPOINTMENT_NOTICE)
            .components(action_rows(&Markup::ViewButton(disappointment.id)));

        self.send_dm(recipient, message)
            .await
            .map_err(|e| NotifyError::new(recipient, e))
    }

    async fn disappointment_deleted(
        &self,
        disappointment: &Disappointment,
    ) -> std::result::Result<(), NotifyError> {
        let recipient = disappointment.to_user.external_id;
        let message = CreateMessage::new().content(format::deleted_notice(disappointment));

        self.send_dm(recipient, message)
            .await
            .map_err(|e| NotifyError::new(recipient, e))
    }
}

/// Roster ids are Discord snowflakes stored as signed integers
pub fn discord_user(external_id: ExternalId) -> Result<DiscordUserId> {
    if external_id.0 <= 0 {
        return Err(DiscordError::InvalidRecipient {
            external_id: external_id.0,
        });
    }
    Ok(DiscordUserId::new(external_id.0 as u64))
}

/// The inverse of [`discord_user`]
pub fn external_id(user_id: DiscordUserId) -> ExternalId {
    ExternalId(user_id.get() as i64)
}
