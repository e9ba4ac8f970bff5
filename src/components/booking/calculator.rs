//! Pure availability calculations: slot counts, slot labels and month grids.
//!
//! Nothing in here touches Discord or the network, so every function can be
//! called with plain values and tested directly.

use super::models::{
    BookedTimes, CalendarCursor, DateCell, EventContainerAvailability, MonthGrid, TimeSlot,
};
use crate::config::ClockFormat;
use crate::error::{BotResult, Error};
use crate::utils::time::{format_ampm, minutes_to_label, time_to_minutes, MINUTES_PER_DAY};
use chrono::{Datelike, Months, NaiveDate, Weekday};

/// Number of whole slots of `duration_minutes` between `start_time` and
/// `end_time`; a trailing partial slot is dropped and an empty or inverted
/// window yields zero.
pub fn compute_slot_count(start_time: &str, end_time: &str, duration_minutes: u32) -> BotResult<u32> {
    if duration_minutes == 0 {
        return Err(Error::InvalidDuration("0".to_string()));
    }
    let start = time_to_minutes(start_time)?;
    let end = time_to_minutes(end_time)?;
    Ok(end.saturating_sub(start) / duration_minutes)
}

/// Build `count` slots starting at `start_time`, `duration_minutes` apart.
///
/// Slot 0 keeps `start_time` as given; later labels are derived from minutes.
/// The last slot is never stretched to the end of the window. Every slot must
/// start before midnight.
pub fn generate_slot_labels(
    count: u32,
    start_time: &str,
    duration_minutes: u32,
    clock: ClockFormat,
) -> BotResult<Vec<TimeSlot>> {
    let start = time_to_minutes(start_time)?;
    if count > 1 && duration_minutes == 0 {
        return Err(Error::InvalidDuration("0".to_string()));
    }
    if count > 0 {
        duration_minutes
            .checked_mul(count - 1)
            .and_then(|offset| offset.checked_add(start))
            .filter(|last| *last < MINUTES_PER_DAY)
            .ok_or_else(|| {
                Error::InvalidDuration(format!(
                    "{} min x {} slots from {} runs past midnight",
                    duration_minutes, count, start_time
                ))
            })?;
    }

    let slots = (0..count)
        .map(|i| {
            let start_minutes = start + duration_minutes * i;
            let label = if i == 0 {
                start_time.trim().to_string()
            } else {
                minutes_to_label(start_minutes)
            };
            TimeSlot {
                index: i as usize,
                label,
                display: display_time(start_minutes, clock),
                start_minutes,
                booked: false,
            }
        })
        .collect();

    Ok(slots)
}

/// All slots of a container's daily window
pub fn slots_for(availability: &EventContainerAvailability, clock: ClockFormat) -> BotResult<Vec<TimeSlot>> {
    let count = compute_slot_count(
        &availability.start_time,
        &availability.end_time,
        availability.duration_minutes,
    )?;
    generate_slot_labels(count, &availability.start_time, availability.duration_minutes, clock)
}

/// Mark every slot whose start time appears in `booked`; returns how many
/// slots ended up booked
pub fn mark_booked(slots: &mut [TimeSlot], booked: &BookedTimes) -> usize {
    let mut count = 0;
    for slot in slots.iter_mut() {
        slot.booked = booked.contains(slot.start_minutes);
        if slot.booked {
            count += 1;
        }
    }
    count
}

/// Clear all booked marks
pub fn clear_booked(slots: &mut [TimeSlot]) {
    for slot in slots.iter_mut() {
        slot.booked = false;
    }
}

fn display_time(minutes: u32, clock: ClockFormat) -> String {
    match clock {
        ClockFormat::TwentyFourHour => minutes_to_label(minutes),
        ClockFormat::TwelveHour => format_ampm(minutes),
    }
}

/// Number of days in the month under `cursor`
pub fn days_in_month(cursor: CalendarCursor) -> Option<u32> {
    let first = cursor.first_day()?;
    let next = first.checked_add_months(Months::new(1))?;
    Some(next.signed_duration_since(first).num_days() as u32)
}

/// Lay out the month under `cursor` as a 6 x 7 Sunday-first grid.
///
/// Cells before `today` are past and never selectable; other days are
/// selectable when their weekday is one of the container's available days.
pub fn render_month_grid(
    cursor: CalendarCursor,
    availability: &EventContainerAvailability,
    today: NaiveDate,
) -> BotResult<MonthGrid> {
    let first = cursor.first_day().ok_or_else(|| {
        Error::Selection(format!("No such month: {}-{:02}", cursor.year, cursor.month + 1))
    })?;
    let days = days_in_month(cursor).ok_or_else(|| {
        Error::Selection(format!("No such month: {}-{:02}", cursor.year, cursor.month + 1))
    })?;
    let leading = first.weekday().num_days_from_sunday();
    let total = (MonthGrid::ROWS * MonthGrid::COLUMNS) as u32;
    // 6 leading blanks + 31 days is the worst case, well inside 42 cells
    let trailing = total - leading - days;

    let cells = (0..total)
        .map(|position| {
            let weekday_index = position % 7;
            let day = position as i64 - leading as i64 + 1;
            if day < 1 || day > days as i64 {
                return DateCell {
                    day_of_month: None,
                    weekday_index,
                    selectable: false,
                    is_past: false,
                };
            }

            let day = day as u32;
            let date = first + chrono::Days::new(u64::from(day - 1));
            let is_past = date < today;
            let selectable = !is_past && availability.is_available_on(date.weekday());

            DateCell {
                day_of_month: Some(day),
                weekday_index,
                selectable,
                is_past,
            }
        })
        .collect();

    Ok(MonthGrid {
        cursor,
        cells,
        leading_blanks: leading,
        trailing_blanks: trailing,
        days_in_month: days,
    })
}

/// Weekday for a Sunday-first column index
pub fn weekday_for_column(column: u32) -> Weekday {
    match column % 7 {
        0 => Weekday::Sun,
        1 => Weekday::Mon,
        2 => Weekday::Tue,
        3 => Weekday::Wed,
        4 => Weekday::Thu,
        5 => Weekday::Fri,
        _ => Weekday::Sat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn availability(days: &[Weekday], start: &str, end: &str, duration: u32) -> EventContainerAvailability {
        EventContainerAvailability {
            available_days: days.iter().copied().collect::<HashSet<_>>(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            duration_minutes: duration,
            time_zone: chrono_tz::UTC,
            meeting_type: None,
            event_name: None,
        }
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_compute_slot_count() {
        assert_eq!(compute_slot_count("09:00", "12:00", 60).unwrap(), 3);
        assert_eq!(compute_slot_count("09:00", "12:00", 90).unwrap(), 2);
        // Trailing partial slot is dropped
        assert_eq!(compute_slot_count("09:00", "10:45", 30).unwrap(), 3);
        assert_eq!(compute_slot_count("09:00", "09:20", 30).unwrap(), 0);
    }

    #[test]
    fn test_compute_slot_count_never_negative() {
        assert_eq!(compute_slot_count("12:00", "09:00", 30).unwrap(), 0);
        assert_eq!(compute_slot_count("09:00", "09:00", 30).unwrap(), 0);
    }

    #[test]
    fn test_compute_slot_count_matches_floor() {
        for start in (0..600).step_by(35) {
            for end in (start..1440).step_by(47) {
                for duration in [15, 20, 30, 45, 60, 90, 120] {
                    let count = compute_slot_count(
                        &minutes_to_label(start),
                        &minutes_to_label(end),
                        duration,
                    )
                    .unwrap();
                    assert_eq!(count, (end - start) / duration);
                }
            }
        }
    }

    #[test]
    fn test_compute_slot_count_rejects_bad_input() {
        assert!(matches!(compute_slot_count("09:00", "12:00", 0), Err(Error::InvalidDuration(_))));
        assert!(matches!(compute_slot_count("9am", "12:00", 30), Err(Error::InvalidTime(_))));
    }

    #[test]
    fn test_generate_slot_labels_scenario() {
        let slots = generate_slot_labels(3, "09:00", 60, ClockFormat::TwentyFourHour).unwrap();
        let labels: Vec<_> = slots.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["09:00", "10:00", "11:00"]);
        assert!(slots.iter().enumerate().all(|(i, s)| s.index == i && !s.booked));
    }

    #[test]
    fn test_first_label_is_start_time_verbatim() {
        let slots = generate_slot_labels(2, "9:00", 45, ClockFormat::TwentyFourHour).unwrap();
        assert_eq!(slots[0].label, "9:00");
        assert_eq!(slots[0].display, "09:00");
        assert_eq!(slots[1].label, "09:45");

        let slots = generate_slot_labels(1, "08:30:00", 30, ClockFormat::TwentyFourHour).unwrap();
        assert_eq!(slots[0].label, "08:30:00");
    }

    #[test]
    fn test_slots_must_start_before_midnight() {
        // 23:00, 23:30 fit; a third slot would start at 24:00
        let slots = generate_slot_labels(2, "23:00", 30, ClockFormat::TwentyFourHour).unwrap();
        assert_eq!(slots[1].label, "23:30");
        assert_eq!(time_to_minutes(&slots[1].label).unwrap(), slots[1].start_minutes);

        assert!(matches!(
            generate_slot_labels(3, "23:00", 30, ClockFormat::TwentyFourHour),
            Err(Error::InvalidDuration(_))
        ));
        assert!(matches!(
            generate_slot_labels(u32::MAX, "09:00", u32::MAX, ClockFormat::TwentyFourHour),
            Err(Error::InvalidDuration(_))
        ));
        assert!(matches!(
            generate_slot_labels(2, "09:00", 0, ClockFormat::TwentyFourHour),
            Err(Error::InvalidDuration(_))
        ));
        assert!(generate_slot_labels(0, "09:00", 60, ClockFormat::TwentyFourHour)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_last_slot_is_not_forced_to_end_time() {
        let availability = availability(&[Weekday::Mon], "09:00", "10:45", 30);
        let slots = slots_for(&availability, ClockFormat::TwentyFourHour).unwrap();
        assert_eq!(slots.len(), 3);
        assert_eq!(slots[2].label, "10:00");
    }

    #[test]
    fn test_labels_round_trip() {
        let slots = generate_slot_labels(20, "07:15", 25, ClockFormat::TwelveHour).unwrap();
        for slot in &slots {
            assert_eq!(time_to_minutes(&slot.label).unwrap(), slot.start_minutes);
        }
        assert_eq!(slots[0].display, "7:15 AM");
        assert_eq!(slots[11].display, "11:50 AM");
        assert_eq!(slots[12].display, "12:15 PM");
    }

    #[test]
    fn test_mark_booked() {
        let mut slots = generate_slot_labels(3, "09:00", 60, ClockFormat::TwentyFourHour).unwrap();
        let booked = BookedTimes::from_labels(&["10:00"]);
        assert_eq!(mark_booked(&mut slots, &booked), 1);
        assert!(!slots[0].booked);
        assert!(slots[1].booked);
        assert!(!slots[2].booked);

        // 12 hour labels from the server match the same slot
        let booked = BookedTimes::from_labels(&["11:00 AM"]);
        assert_eq!(mark_booked(&mut slots, &booked), 1);
        assert!(!slots[1].booked);
        assert!(slots[2].booked);

        clear_booked(&mut slots);
        assert!(slots.iter().all(|s| !s.booked));
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(CalendarCursor::new(2024, 1)), Some(29));
        assert_eq!(days_in_month(CalendarCursor::new(2023, 1)), Some(28));
        assert_eq!(days_in_month(CalendarCursor::new(2024, 3)), Some(30));
        assert_eq!(days_in_month(CalendarCursor::new(2024, 11)), Some(31));
    }

    #[test]
    fn test_month_starting_on_sunday_has_no_leading_blanks() {
        // September 2024 starts on a Sunday
        let availability = availability(&[Weekday::Mon], "09:00", "12:00", 60);
        let grid = render_month_grid(CalendarCursor::new(2024, 8), &availability, date(2024, 1, 1)).unwrap();
        assert_eq!(grid.leading_blanks, 0);
        assert_eq!(grid.days_in_month, 30);
        assert_eq!(grid.trailing_blanks, 12);
        assert_eq!(grid.cells[0].day_of_month, Some(1));
    }

    #[test]
    fn test_pad_counts_for_every_month() {
        let availability = availability(&[Weekday::Mon], "09:00", "12:00", 60);
        for year in [2023, 2024, 2025] {
            for month in 0..12 {
                let cursor = CalendarCursor::new(year, month);
                let grid = render_month_grid(cursor, &availability, date(2000, 1, 1)).unwrap();
                assert_eq!(grid.cells.len(), 42);
                assert_eq!(grid.rows().count(), 6);
                assert_eq!(
                    grid.trailing_blanks,
                    42 - grid.leading_blanks - grid.days_in_month
                );
                let padding = grid.cells.iter().filter(|c| c.is_padding()).count() as u32;
                assert_eq!(padding, grid.leading_blanks + grid.trailing_blanks);
                assert!(grid.cells[..grid.leading_blanks as usize].iter().all(|c| c.is_padding()));
            }
        }
    }

    #[test]
    fn test_31_day_month_starting_saturday_fits() {
        // March 2025 starts on a Saturday and has 31 days
        let availability = availability(&[Weekday::Mon], "09:00", "12:00", 60);
        let grid = render_month_grid(CalendarCursor::new(2025, 2), &availability, date(2000, 1, 1)).unwrap();
        assert_eq!(grid.leading_blanks, 6);
        assert_eq!(grid.trailing_blanks, 5);
        assert_eq!(grid.cells[36].day_of_month, Some(31));
    }

    #[test]
    fn test_selectability_rules() {
        let availability = availability(&[Weekday::Mon, Weekday::Wed], "09:00", "12:00", 60);
        // Today is Wednesday 2024-05-15
        let today = date(2024, 5, 15);
        let grid = render_month_grid(CalendarCursor::new(2024, 4), &availability, today).unwrap();

        // Monday the 13th is past
        let past = grid.cell_for_day(13).unwrap();
        assert!(past.is_past && !past.selectable);

        // Today is selectable
        let wednesday = grid.cell_for_day(15).unwrap();
        assert!(!wednesday.is_past && wednesday.selectable);

        // Thursday is not an available day
        let thursday = grid.cell_for_day(16).unwrap();
        assert!(!thursday.is_past && !thursday.selectable);

        // Monday the 20th is bookable
        assert!(grid.cell_for_day(20).unwrap().selectable);

        for cell in &grid.cells {
            if let Some(day) = cell.day_of_month {
                let weekday = date(2024, 5, day).weekday();
                assert_eq!(weekday_for_column(cell.weekday_index), weekday);
            }
        }
    }

    #[test]
    fn test_earlier_month_is_past_even_for_later_day_numbers() {
        let availability = availability(&[Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri], "09:00", "12:00", 60);
        let today = date(2024, 5, 10);
        let grid = render_month_grid(CalendarCursor::new(2024, 3), &availability, today).unwrap();
        assert!(grid.cells.iter().all(|c| !c.selectable));
        assert!(grid.cell_for_day(30).unwrap().is_past);

        let last_year = render_month_grid(CalendarCursor::new(2023, 11), &availability, today).unwrap();
        assert!(last_year.cells.iter().all(|c| !c.selectable));
    }

    #[test]
    fn test_render_month_grid_is_idempotent() {
        let availability = availability(&[Weekday::Tue, Weekday::Sat], "09:00", "12:00", 60);
        let today = date(2024, 2, 10);
        let cursor = CalendarCursor::new(2024, 1);
        let first = render_month_grid(cursor, &availability, today).unwrap();
        let second = render_month_grid(cursor, &availability, today).unwrap();
        assert_eq!(first, second);
    }
}
