//! Gateway event handling
//!
//! Direct messages and button presses are translated into core interactions;
//! the replies coming back are rendered as Discord messages, attachments and
//! interaction responses.

use std::path::Path;

use async_trait::async_trait;
use disappointments_core::{
    ChatContext, InteractionHandler, Reply, intent::Interaction as Inbound,
};
use parking_lot::RwLock;
use serenity::all::{
    ChannelId, Client, ComponentInteraction, Context, CreateAttachment,
    CreateInteractionResponse, CreateInteractionResponseMessage, CreateMessage, EventHandler,
    GatewayIntents, GuildId, Interaction, Message, Ready, UserId as DiscordUserId,
};
use tracing::{debug, error, info};

use crate::{
    components::action_rows,
    endpoints::external_id,
    error::{DiscordError, Result, token_preview},
};

/// Discord's per-message character limit
pub const MESSAGE_LIMIT: usize = 2000;

pub fn intents() -> GatewayIntents {
    GatewayIntents::DIRECT_MESSAGES | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT
}

/// Guild channels are groups; everything else is a direct conversation
pub fn chat_context(guild_id: Option<GuildId>) -> ChatContext {
    match guild_id {
        Some(_) => ChatContext::Group,
        None => ChatContext::Direct,
    }
}

pub struct DisappointmentsBot {
    handler: InteractionHandler,
    /// Our own user, known once the gateway is ready
    me: RwLock<Option<DiscordUserId>>,
}

impl DisappointmentsBot {
    pub fn new(handler: InteractionHandler) -> Self {
        Self {
            handler,
            me: RwLock::new(None),
        }
    }

    /// In guilds only messages addressed to the bot get the refusal
    fn is_addressed(&self, msg: &Message) -> bool {
        if msg.guild_id.is_none() {
            return true;
        }
        match *self.me.read() {
            Some(me) => msg.mentions_user_id(me),
            None => false,
        }
    }

    async fn deliver_to_channel(&self, ctx: &Context, channel: ChannelId, reply: Reply) -> Result<()> {
        match reply {
            Reply::Text { content, markup } => {
                let chunks = split_message(&content, MESSAGE_LIMIT);
                let last = chunks.len().saturating_sub(1);
                for (i, chunk) in chunks.into_iter().enumerate() {
                    let mut message = CreateMessage::new().content(chunk);
                    if i == last {
                        if let Some(markup) = &markup {
                            message = message.components(action_rows(markup));
                        }
                    }
                    send(ctx, channel, message).await?;
                }
            }
            Reply::Alert(content) => {
                send(ctx, channel, CreateMessage::new().content(content)).await?;
            }
            Reply::Document { path } => {
                let attachment = attach(&path).await?;
                send(ctx, channel, CreateMessage::new().add_file(attachment)).await?;
            }
            Reply::Ack | Reply::RemoveOrigin => {}
        }
        Ok(())
    }

    async fn handle_component(&self, ctx: &Context, component: &ComponentInteraction) {
        let inbound = Inbound::callback(
            external_id(component.user.id),
            chat_context(component.guild_id),
            &component.data.custom_id,
        );
        debug!(
            "Button {} pressed by {}",
            component.data.custom_id, component.user.name
        );

        let replies = self.handler.handle(&inbound).await;

        // Discord expects the interaction response before anything else
        let (responses, rest): (Vec<Reply>, Vec<Reply>) = replies
            .into_iter()
            .partition(|r| matches!(r, Reply::Alert(_) | Reply::Ack));

        for response in responses {
            if let Err(e) = respond(ctx, component, response).await {
                error!("Failed to answer interaction: {:?}", e);
            }
        }

        for reply in rest {
            let result = match reply {
                Reply::RemoveOrigin => component.message.delete(ctx).await.map_err(|cause| {
                    DiscordError::InteractionFailed {
                        interaction_id: component.id.to_string(),
                        user_id: component.user.id.to_string(),
                        cause,
                    }
                }),
                other => self.deliver_to_channel(ctx, component.channel_id, other).await,
            };
            if let Err(e) = result {
                error!("Failed to deliver reply: {:?}", e);
            }
        }
    }
}

#[async_trait]
impl EventHandler for DisappointmentsBot {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);
        *self.me.write() = Some(ready.user.id);
    }

    async fn message(&self, ctx: Context, msg: Message) {
        // Ignore bots, ourselves included
        if msg.author.bot || !self.is_addressed(&msg) {
            return;
        }

        let inbound = Inbound::message(
            external_id(msg.author.id),
            chat_context(msg.guild_id),
            &msg.content,
        );
        debug!("Message from {} ({:?})", msg.author.name, inbound.context);

        for reply in self.handler.handle(&inbound).await {
            if let Err(e) = self.deliver_to_channel(&ctx, msg.channel_id, reply).await {
                error!("Failed to deliver reply: {:?}", e);
            }
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Component(component) = interaction {
            self.handle_component(&ctx, &component).await;
        }
    }
}

async fn send(ctx: &Context, channel: ChannelId, message: CreateMessage) -> Result<()> {
    channel
        .send_message(&ctx.http, message)
        .await
        .map(|_| ())
        .map_err(|cause| DiscordError::MessageSendFailed {
            destination: format!("channel {}", channel),
            cause,
        })
}

async fn attach(path: &Path) -> Result<CreateAttachment> {
    CreateAttachment::path(path)
        .await
        .map_err(|cause| DiscordError::AttachmentError {
            filename: path.display().to_string(),
            cause,
        })
}

async fn respond(ctx: &Context, component: &ComponentInteraction, reply: Reply) -> Result<()> {
    let response = match reply {
        Reply::Alert(content) => CreateInteractionResponse::Message(
            CreateInteractionResponseMessage::new()
                .content(content)
                .ephemeral(true),
        ),
        _ => CreateInteractionResponse::Acknowledge,
    };

    component
        .create_response(&ctx.http, response)
        .await
        .map_err(|cause| DiscordError::InteractionFailed {
            interaction_id: component.id.to_string(),
            user_id: component.user.id.to_string(),
            cause,
        })
}

/// Split a message on line boundaries so each piece fits `max_chars`
pub fn split_message(content: &str, max_chars: usize) -> Vec<String> {
    if content.chars().count() <= max_chars {
        return vec![content.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in content.lines() {
        let line_len = line.chars().count();
        if current_len + line_len + 1 > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }

            // A single line that is too long is cut into pieces
            if line_len > max_chars {
                for piece in line.chars().collect::<Vec<_>>().chunks(max_chars) {
                    chunks.push(piece.iter().collect());
                }
            } else {
                current = line.to_string();
                current_len = line_len;
            }
        } else {
            if !current.is_empty() {
                current.push('\n');
                current_len += 1;
            }
            current.push_str(line);
            current_len += line_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Create the Discord client (without starting it)
pub async fn create_client(token: &str, handler: InteractionHandler) -> Result<Client> {
    if token.is_empty() {
        return Err(DiscordError::MissingToken);
    }

    Client::builder(token, intents())
        .event_handler(DisappointmentsBot::new(handler))
        .await
        .map_err(|cause| DiscordError::ClientBuild {
            cause,
            token_preview: token_preview(token),
        })
}

/// Run the client until the gateway connection ends
pub async fn run(client: &mut Client) -> Result<()> {
    info!("Starting Discord bot...");
    client
        .start()
        .await
        .map_err(|cause| DiscordError::ClientFailed { cause })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_short_messages_are_untouched() {
        assert_eq!(split_message("hello", 2000), vec!["hello".to_string()]);
    }

    #[test]
    fn test_split_on_lines() {
        let content = "aaaa\nbbbb\ncccc";
        assert_eq!(split_message(content, 9), vec!["aaaa\nbbbb", "cccc"]);
    }

    #[test]
    fn test_long_line_is_cut() {
        let content = "ab\n".to_string() + &"x".repeat(12);
        let chunks = split_message(&content, 5);
        assert_eq!(chunks, vec!["ab", "xxxxx", "xxxxx", "xx"]);
    }

    #[test]
    fn test_limit_counts_characters() {
        let content = "ы".repeat(10);
        assert_eq!(split_message(&content, 10).len(), 1);
    }

    #[test]
    fn test_chat_context() {
        assert_eq!(chat_context(None), ChatContext::Direct);
        assert_eq!(chat_context(Some(GuildId::new(1))), ChatContext::Group);
    }
}
