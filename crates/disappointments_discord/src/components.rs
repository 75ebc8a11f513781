//! Rendering core markup as Discord message components

use disappointments_core::{Button, Intent, Markup};
use serenity::all::{ButtonStyle, CreateActionRow, CreateButton};

/// Discord allows five buttons per action row
pub const MAX_BUTTONS_PER_ROW: usize = 5;
/// and five action rows per message
pub const MAX_ROWS: usize = 5;

const MAX_LABEL_CHARS: usize = 80;
const MAX_CUSTOM_ID_CHARS: usize = 100;

/// Fit markup rows into Discord's limits.
///
/// Rows that already fit are kept as they are. Otherwise every button is
/// repacked five to a row; anything beyond the last row is dropped.
pub fn layout(markup: &Markup) -> Vec<Vec<Button>> {
    let rows = markup.rows();
    let fits = rows.len() <= MAX_ROWS && rows.iter().all(|r| r.len() <= MAX_BUTTONS_PER_ROW);
    if fits {
        return rows;
    }

    let buttons: Vec<Button> = rows.into_iter().flatten().collect();
    let total = buttons.len();
    let packed: Vec<Vec<Button>> = buttons
        .chunks(MAX_BUTTONS_PER_ROW)
        .take(MAX_ROWS)
        .map(<[Button]>::to_vec)
        .collect();

    let kept: usize = packed.iter().map(Vec::len).sum();
    if kept < total {
        tracing::warn!("Dropping {} buttons that don't fit in one message", total - kept);
    }
    packed
}

pub fn action_rows(markup: &Markup) -> Vec<CreateActionRow> {
    layout(markup)
        .iter()
        .map(|row| CreateActionRow::Buttons(row.iter().filter_map(button).collect()))
        .collect()
}

fn button(button: &Button) -> Option<CreateButton> {
    let custom_id = button.intent.callback_data()?;
    if custom_id.chars().count() > MAX_CUSTOM_ID_CHARS {
        tracing::warn!("Button payload {} is too long for Discord", custom_id);
        return None;
    }

    let label: String = button.label.chars().take(MAX_LABEL_CHARS).collect();
    Some(CreateButton::new(custom_id).label(label).style(style(&button.intent)))
}

fn style(intent: &Intent) -> ButtonStyle {
    match intent {
        Intent::DeleteDisappointment(_) => ButtonStyle::Danger,
        Intent::Profile | Intent::AllDisappointments | Intent::NewDisappointment => {
            ButtonStyle::Primary
        }
        _ => ButtonStyle::Secondary,
    }
}
