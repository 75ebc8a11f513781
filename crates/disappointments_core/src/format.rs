//! User-facing text
//!
//! Messages use Discord-flavoured markdown. Anything typed by users (names,
//! reasons) is escaped before it is embedded.

use chrono::Duration;

use crate::{disappointment::Disappointment, intent::VIEW_COMMAND_PREFIX, users::User};

/// Entries per listing message
pub const LISTING_PAGE_SIZE: usize = 10;

pub const MAIN_MENU: &str = "Main menu is always with you ☺️";
pub const UNKNOWN_USER: &str = "I don't know you";
pub const GROUP_NOT_ALLOWED: &str = "This bot is not allowed for using in groups";
pub const NOT_FOUND: &str = "This disappointment does not exist";
pub const USER_NOT_FOUND: &str = "This user does not exist anymore";
pub const CHOOSE_TARGET: &str = "Who do you wanna add disappointment to?";
pub const REASON_PROMPT: &str = "Your reason 👇";
pub const ALL_DISAPPOINTMENTS: &str = "Disappointments";
pub const USER_DISAPPOINTMENTS_MENU: &str =
    "Do you wanna show disappointments that **are from you** or **to you**";
pub const NEW_DISAPPOINTMENT_NOTICE: &str = "⚡️ You got new disappointment";
pub const DELETED: &str = "Deleted";
pub const NOT_AUTHOR: &str = "Only the author can delete this disappointment";
pub const NOTHING_YET: &str = "No disappointments yet";
pub const SOMETHING_WENT_WRONG: &str = "Something went wrong, please try again later";

const SEPARATOR: &str = "➖➖➖➖➖➖➖➖➖➖";

pub fn no_quota(reset_interval_hours: u32) -> String {
    format!(
        "You have no points to add disappointment point. \
         They are updated once in {reset_interval_hours} hours, so please wait"
    )
}

pub fn invalid_reason(problem: &str) -> String {
    format!("That reason won't do: {problem}. Try again 👇")
}

/// Escape markdown control characters in user-supplied text
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '_' | '~' | '`' | '|' | '>' | '#' | '[' | ']') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Upper-case the first character and lower-case the rest
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

pub fn profile(user: &User, received: usize) -> String {
    format!(
        "{SEPARATOR}\n\
         👤 Name: **{}**\n\
         ⭐️ Points left: **{}**\n\
         👎 Disappointments from other people: **{received}**\n\
         {SEPARATOR}",
        escape_markdown(&user.name),
        user.quota,
    )
}

/// Full view of one entry; `utc_offset` shifts the stored UTC timestamp
pub fn detail(disappointment: &Disappointment, utc_offset: Duration) -> String {
    let created_at = (disappointment.created_at + utc_offset).format("%H:%M %d.%m.%Y");
    format!(
        "💩 From user: **{}**\n\
         😺 To user: **{}**\n\
         📅 Created at: **{created_at}**\n\
         💬 Reason: *{}*",
        escape_markdown(&disappointment.from_user.name),
        escape_markdown(&disappointment.to_user.name),
        escape_markdown(&disappointment.reason),
    )
}

pub fn submitted(disappointment: &Disappointment) -> String {
    format!(
        "You added new disappointment to user **{}**\nReason: *{}*",
        escape_markdown(&disappointment.to_user.name),
        escape_markdown(&disappointment.reason),
    )
}

pub fn deleted_notice(disappointment: &Disappointment) -> String {
    format!(
        "Disappointment from user **{}** with reason *{}* has been deleted",
        escape_markdown(&disappointment.from_user.name),
        escape_markdown(&disappointment.reason),
    )
}

/// Pages listing what `entries`' author submitted, one message per page
pub fn requester_listing(entries: &[Disappointment]) -> Vec<String> {
    listing("Disappointments by you:", entries, |d| {
        format!("To {}:", escape_markdown(&d.to_user.name))
    })
}

/// Pages listing what others submitted about the requester
pub fn recipient_listing(entries: &[Disappointment]) -> Vec<String> {
    listing("Disappointments about you:", entries, |d| {
        format!("From {}:", escape_markdown(&d.from_user.name))
    })
}

fn listing(
    title: &str,
    entries: &[Disappointment],
    counterpart: impl Fn(&Disappointment) -> String,
) -> Vec<String> {
    entries
        .chunks(LISTING_PAGE_SIZE)
        .map(|page| {
            let mut lines = vec![title.to_string()];
            for entry in page {
                lines.push(format!(
                    "**{}** *{}*",
                    counterpart(entry),
                    escape_markdown(&capitalize(&entry.reason))
                ));
                lines.push(format!("{VIEW_COMMAND_PREFIX}{}", entry.id));
                lines.push(String::new());
            }
            lines.join("\n")
        })
        .collect()
}
