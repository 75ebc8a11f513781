use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum DiscordError {
    #[error("No Discord token configured")]
    #[diagnostic(
        code(disappointments::discord::missing_token),
        help("Set DISCORD_TOKEN or the token field of the [discord] section")
    )]
    MissingToken,

    #[error("Discord client could not be created")]
    #[diagnostic(
        code(disappointments::discord::client_build_failed),
        help("Check that your Discord bot token ({token_preview}) is valid and has not been regenerated")
    )]
    ClientBuild {
        #[source]
        cause: serenity::Error,
        token_preview: String,
    },

    #[error("Discord client stopped")]
    #[diagnostic(
        code(disappointments::discord::client_failed),
        help("Enable the Message Content intent in the Discord Developer Portal")
    )]
    ClientFailed {
        #[source]
        cause: serenity::Error,
    },

    #[error("Message send failed")]
    #[diagnostic(
        code(disappointments::discord::message_send_failed),
        help("Failed to send message to {destination}")
    )]
    MessageSendFailed {
        destination: String,
        #[source]
        cause: serenity::Error,
    },

    #[error("Attachment error")]
    #[diagnostic(
        code(disappointments::discord::attachment_error),
        help("Failed to attach '{filename}'")
    )]
    AttachmentError {
        filename: String,
        #[source]
        cause: serenity::Error,
    },

    #[error("Interaction failed")]
    #[diagnostic(
        code(disappointments::discord::interaction_failed),
        help("Failed to answer interaction {interaction_id} from user {user_id}")
    )]
    InteractionFailed {
        interaction_id: String,
        user_id: String,
        #[source]
        cause: serenity::Error,
    },

    #[error("Invalid recipient {external_id}")]
    #[diagnostic(
        code(disappointments::discord::invalid_recipient),
        help("Roster external ids must be Discord user ids")
    )]
    InvalidRecipient { external_id: i64 },
}

pub type Result<T> = std::result::Result<T, DiscordError>;

/// First and last few characters of a token, safe to log
pub fn token_preview(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 10 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
