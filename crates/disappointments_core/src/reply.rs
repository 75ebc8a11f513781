//! Outbound replies
//!
//! Transport-neutral description of what the bot answers with. The transport
//! decides how a [`Markup`] looks; the core only decides which buttons exist
//! and what they carry.

use std::path::PathBuf;

use crate::{
    id::DisappointmentId,
    intent::{ALL_DISAPPOINTMENTS_LABEL, Intent, NEW_DISAPPOINTMENT_LABEL, PROFILE_LABEL},
    users::User,
};

/// A single button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub intent: Intent,
}

impl Button {
    pub fn new(label: impl Into<String>, intent: Intent) -> Self {
        Self {
            label: label.into(),
            intent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Markup {
    /// The three top-level entries
    MainMenu,
    /// One button per registered user, for picking a target
    TargetList(Vec<User>),
    ProfileMenu,
    /// "From me" / "To me"
    UserDisappointmentsMenu,
    DownloadReport,
    /// Shown with a detail view to the author
    DeleteButton(DisappointmentId),
    /// Attached to a notification so the recipient can open the entry
    ViewButton(DisappointmentId),
}

impl Markup {
    /// Buttons in display order, one inner vector per row
    pub fn rows(&self) -> Vec<Vec<Button>> {
        match self {
            Markup::MainMenu => vec![
                vec![Button::new(PROFILE_LABEL, Intent::Profile)],
                vec![
                    Button::new(ALL_DISAPPOINTMENTS_LABEL, Intent::AllDisappointments),
                    Button::new(NEW_DISAPPOINTMENT_LABEL, Intent::NewDisappointment),
                ],
            ],
            Markup::TargetList(users) => users
                .iter()
                .map(|u| vec![Button::new(u.name.clone(), Intent::SelectTarget(u.id))])
                .collect(),
            Markup::ProfileMenu => vec![vec![Button::new(
                "My disappointments",
                Intent::MyDisappointments,
            )]],
            Markup::UserDisappointmentsMenu => vec![vec![
                Button::new("From me", Intent::FromMe),
                Button::new("To me", Intent::ToMe),
            ]],
            Markup::DownloadReport => vec![vec![Button::new(
                "💾 Download as excel",
                Intent::DownloadReport,
            )]],
            Markup::DeleteButton(id) => {
                vec![vec![Button::new("❌ Delete", Intent::DeleteDisappointment(*id))]]
            }
            Markup::ViewButton(id) => {
                vec![vec![Button::new("Take a look", Intent::ViewDisappointment(*id))]]
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A message in the requester's conversation
    Text {
        content: String,
        markup: Option<Markup>,
    },
    /// A file sent as an attachment
    Document { path: PathBuf },
    /// Short popup answering a button press; plain text for typed messages
    Alert(String),
    /// Silent acknowledgement of a button press
    Ack,
    /// Remove the message whose button was pressed
    RemoveOrigin,
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Reply::Text {
            content: content.into(),
            markup: None,
        }
    }

    pub fn with_markup(content: impl Into<String>, markup: Markup) -> Self {
        Reply::Text {
            content: content.into(),
            markup: Some(markup),
        }
    }

    /// Text content, if this reply carries any
    pub fn content(&self) -> Option<&str> {
        match self {
            Reply::Text { content, .. } | Reply::Alert(content) => Some(content),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{ExternalId, UserId};

    #[test]
    fn test_target_list_has_a_row_per_user() {
        let users: Vec<User> = ["Dinaiym", "Eldos", "Rustam"]
            .iter()
            .enumerate()
            .map(|(i, name)| User {
                id: UserId::generate(),
                name: name.to_string(),
                external_id: ExternalId(i as i64),
                quota: 3,
            })
            .collect();

        let rows = Markup::TargetList(users.clone()).rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][0].label, "Eldos");
        assert_eq!(rows[1][0].intent, Intent::SelectTarget(users[1].id));
    }

    #[test]
    fn test_main_menu_buttons_parse_as_text_too() {
        for button in Markup::MainMenu.rows().into_iter().flatten() {
            assert_eq!(Intent::from_text(&button.label), button.intent);
        }
    }
}
