//! Inbound intents
//!
//! The transport hands the core two kinds of input: free text typed by the
//! user, and short payloads attached to buttons. Both are parsed here so that
//! the payload format stays in one place; buttons are rendered from
//! [`Intent::callback_data`] and parsed back with [`Intent::from_callback`].

use crate::id::{DisappointmentId, ExternalId, UserId};

pub const PROFILE_LABEL: &str = "😺 Profile";
pub const ALL_DISAPPOINTMENTS_LABEL: &str = "😈 All disappointments";
pub const NEW_DISAPPOINTMENT_LABEL: &str = "👎 New disappointment";

/// Prefix of the text command that opens a single disappointment
pub const VIEW_COMMAND_PREFIX: &str = "/disappointment_";

const SELECT_USER: &str = "select-user";
const VIEW_DISAPPOINTMENT: &str = "view-disappointment";
const DELETE_DISAPPOINTMENT: &str = "delete-disappointment";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    // Top-level menu; each of these resets any submission in progress
    Profile,
    AllDisappointments,
    NewDisappointment,

    // Profile sub-menus
    MyDisappointments,
    FromMe,
    ToMe,
    DownloadReport,

    /// A target picked from the user list during a submission
    SelectTarget(UserId),
    ViewDisappointment(DisappointmentId),
    DeleteDisappointment(DisappointmentId),

    /// A view command whose id could not be parsed
    MalformedReference(String),

    /// Anything else typed by the user
    Text(String),

    /// A button payload this version doesn't understand
    Unknown(String),
}

impl Intent {
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        match trimmed {
            PROFILE_LABEL => return Self::Profile,
            ALL_DISAPPOINTMENTS_LABEL => return Self::AllDisappointments,
            NEW_DISAPPOINTMENT_LABEL => return Self::NewDisappointment,
            _ => {}
        }

        if let Some(reference) = trimmed.strip_prefix(VIEW_COMMAND_PREFIX) {
            return match DisappointmentId::parse(reference) {
                Ok(id) => Self::ViewDisappointment(id),
                Err(_) => Self::MalformedReference(reference.to_string()),
            };
        }

        Self::Text(text.to_string())
    }

    pub fn from_callback(data: &str) -> Self {
        match data {
            "menu-profile" => return Self::Profile,
            "menu-all-disappointments" => return Self::AllDisappointments,
            "menu-new-disappointment" => return Self::NewDisappointment,
            "user-disappointments" => return Self::MyDisappointments,
            "from-user-disappointments" => return Self::FromMe,
            "to-user-disappointments" => return Self::ToMe,
            "download-as-excel" => return Self::DownloadReport,
            _ => {}
        }

        let Some((kind, reference)) = data.split_once(':') else {
            return Self::Unknown(data.to_string());
        };

        let parsed = match kind {
            SELECT_USER => UserId::parse(reference).ok().map(Self::SelectTarget),
            VIEW_DISAPPOINTMENT => DisappointmentId::parse(reference)
                .ok()
                .map(Self::ViewDisappointment),
            DELETE_DISAPPOINTMENT => DisappointmentId::parse(reference)
                .ok()
                .map(Self::DeleteDisappointment),
            _ => None,
        };

        parsed.unwrap_or_else(|| Self::Unknown(data.to_string()))
    }

    /// Button payload for intents that can be attached to a button
    pub fn callback_data(&self) -> Option<String> {
        let data = match self {
            Self::Profile => "menu-profile".to_string(),
            Self::AllDisappointments => "menu-all-disappointments".to_string(),
            Self::NewDisappointment => "menu-new-disappointment".to_string(),
            Self::MyDisappointments => "user-disappointments".to_string(),
            Self::FromMe => "from-user-disappointments".to_string(),
            Self::ToMe => "to-user-disappointments".to_string(),
            Self::DownloadReport => "download-as-excel".to_string(),
            Self::SelectTarget(id) => format!("{SELECT_USER}:{id}"),
            Self::ViewDisappointment(id) => format!("{VIEW_DISAPPOINTMENT}:{id}"),
            Self::DeleteDisappointment(id) => format!("{DELETE_DISAPPOINTMENT}:{id}"),
            Self::MalformedReference(_) | Self::Text(_) | Self::Unknown(_) => return None,
        };
        Some(data)
    }

    /// Whether this intent navigates to a top-level menu
    pub fn is_top_level(&self) -> bool {
        matches!(
            self,
            Self::Profile | Self::AllDisappointments | Self::NewDisappointment
        )
    }
}

/// Where an interaction came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatContext {
    /// One-to-one conversation with the bot
    Direct,
    /// Shared channel; the bot refuses to work here
    Group,
}

/// How the interaction reached the bot, which decides how replies are shaped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Message,
    Callback,
}

/// A parsed inbound interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    pub sender: ExternalId,
    pub context: ChatContext,
    pub origin: Origin,
    pub intent: Intent,
}

impl Interaction {
    pub fn message(sender: ExternalId, context: ChatContext, text: &str) -> Self {
        Self {
            sender,
            context,
            origin: Origin::Message,
            intent: Intent::from_text(text),
        }
    }

    pub fn callback(sender: ExternalId, context: ChatContext, data: &str) -> Self {
        Self {
            sender,
            context,
            origin: Origin::Callback,
            intent: Intent::from_callback(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_menu_labels() {
        assert_eq!(Intent::from_text("😺 Profile"), Intent::Profile);
        assert_eq!(
            Intent::from_text("  👎 New disappointment "),
            Intent::NewDisappointment
        );
        assert_eq!(
            Intent::from_text("😈 All disappointments"),
            Intent::AllDisappointments
        );
    }

    #[test]
    fn test_view_command() {
        let id = DisappointmentId::generate();
        assert_eq!(
            Intent::from_text(&format!("/disappointment_{id}")),
            Intent::ViewDisappointment(id)
        );
        assert_eq!(
            Intent::from_text("/disappointment_12"),
            Intent::MalformedReference("12".to_string())
        );
    }

    #[test]
    fn test_free_text_is_kept_verbatim() {
        assert_eq!(
            Intent::from_text("  late again "),
            Intent::Text("  late again ".to_string())
        );
    }

    #[test]
    fn test_button_payloads_parse_back() {
        let user = UserId::generate();
        let entry = DisappointmentId::generate();
        for intent in [
            Intent::Profile,
            Intent::MyDisappointments,
            Intent::DownloadReport,
            Intent::SelectTarget(user),
            Intent::DeleteDisappointment(entry),
        ] {
            let data = intent.callback_data().unwrap();
            assert!(data.len() <= 100, "{data} exceeds the button payload limit");
            assert_eq!(Intent::from_callback(&data), intent);
        }
    }

    #[test]
    fn test_delete_payload_format() {
        let id = DisappointmentId::generate();
        assert_eq!(
            Intent::DeleteDisappointment(id).callback_data().unwrap(),
            format!("delete-disappointment:{}", id.key())
        );
    }

    #[test]
    fn test_unknown_payloads() {
        assert_eq!(
            Intent::from_callback("view-disappointment:nope"),
            Intent::Unknown("view-disappointment:nope".to_string())
        );
        assert_eq!(
            Intent::from_callback("something-else"),
            Intent::Unknown("something-else".to_string())
        );
        assert_eq!(Intent::Text("x".to_string()).callback_data(), None);
    }
}
