//! Turns booking view state into text for Discord embeds.

use super::calculator::weekday_for_column;
use super::models::{BookingSelection, MonthGrid};
use super::view::{BookedStatus, Stage, ViewState};
use crate::error::BotResult;
use crate::utils::i18n::{month_name, weekday_name, weekday_short};
use chrono::Datelike;
use rust_i18n::t;

/// Month title such as `May 2024`
pub fn month_title(view: &ViewState) -> String {
    format!("{} {}", month_name(view.cursor.month), view.cursor.year)
}

/// The visible month as a monospace block
///
/// Bookable days show their number, the selected day is bracketed and days
/// that cannot be booked show `··`.
pub fn render_month(view: &ViewState) -> BotResult<String> {
    let grid = view.month_grid()?;
    let selected_day = view
        .selected_date
        .filter(|date| date.year() == grid.cursor.year && date.month0() == grid.cursor.month)
        .map(|date| date.day());

    Ok(format!("```\n{}```", grid_lines(&grid, selected_day)))
}

fn grid_lines(grid: &MonthGrid, selected_day: Option<u32>) -> String {
    let mut out = String::new();

    let header: Vec<String> = (0..7)
        .map(|column| {
            let name = weekday_short(weekday_for_column(column));
            format!("{:>4}", name.chars().take(2).collect::<String>())
        })
        .collect();
    out.push_str(header.join("").trim_end());
    out.push('\n');

    for row in grid.rows() {
        // Skip rows that are entirely padding
        if row.iter().all(|cell| cell.is_padding()) {
            continue;
        }
        let line: String = row
            .iter()
            .map(|cell| match cell.day_of_month {
                None => "    ".to_string(),
                Some(day) if Some(day) == selected_day => format!("[{:>2}]", day),
                Some(day) if cell.selectable => format!("{:>4}", day),
                Some(_) => "  ··".to_string(),
            })
            .collect();
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Numbered list of time slots for the selected date
pub fn render_slots(view: &ViewState) -> String {
    if view.slots.is_empty() {
        return t!("booking_no_slots").to_string();
    }

    let mut out = String::new();
    match &view.booked_status {
        BookedStatus::Pending => {
            out.push_str(&t!("booking_checking_slots"));
            out.push('\n');
        }
        BookedStatus::Failed(_) => {
            out.push_str(&t!("booking_lookup_failed"));
            out.push('\n');
        }
        BookedStatus::Idle | BookedStatus::Loaded => {}
    }

    for slot in &view.slots {
        let number = slot.index + 1;
        let line = if slot.booked {
            format!("~~`{:>2}.` {}~~ {}", number, slot.display, t!("booking_slot_taken"))
        } else if view.selected_slot == Some(slot.index) {
            format!("**`{:>2}.` {}** ◀", number, slot.display)
        } else {
            format!("`{:>2}.` {}", number, slot.display)
        };
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// One line telling the facilitator what to do next
pub fn status_line(view: &ViewState) -> String {
    match view.stage {
        Stage::Browsing => t!("booking_pick_date").to_string(),
        Stage::DateSelected => match view.selected_date {
            Some(date) => t!(
                "booking_pick_time",
                date = format!("{} {}", weekday_name(date.weekday()), date.format("%Y-%m-%d"))
            )
            .to_string(),
            None => t!("booking_pick_date").to_string(),
        },
        Stage::SlotSelected => match (view.selected_date, view.selected_time_slot()) {
            (Some(date), Some(slot)) => t!(
                "booking_ready_to_confirm",
                date = date.format("%Y-%m-%d").to_string(),
                time = slot.display.as_str()
            )
            .to_string(),
            _ => t!("booking_pick_date").to_string(),
        },
        Stage::Confirming => t!("booking_confirmed_status").to_string(),
    }
}

/// Summary of a confirmed selection
pub fn render_selection(selection: &BookingSelection) -> String {
    let mut out = format!(
        "{} {} ({})",
        weekday_name(selection.date.weekday()),
        selection.date.format("%Y-%m-%d"),
        selection.display
    );
    if let Some(name) = &selection.event_name {
        out = format!("**{}**\n{}", name, out);
    }
    if let Some(meeting_type) = &selection.meeting_type {
        out.push('\n');
        out.push_str(&t!("booking_meeting_type", meeting_type = meeting_type.to_string()));
    }
    out
}
