use super::calculator::{clear_booked, mark_booked, render_month_grid, slots_for};
use super::models::{
    BookedTimes, BookingSelection, CalendarCursor, EventContainerAvailability, MonthGrid, TimeSlot,
};
use crate::config::ClockFormat;
use crate::error::{selection_error, BotResult};
use crate::utils::time::date_key;
use chrono::{Datelike, NaiveDate};
use tracing::{debug, warn};

/// Where the facilitator is in the booking flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Browsing,
    DateSelected,
    SlotSelected,
    Confirming,
}

/// State of the booked-times lookup for the selected date
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookedStatus {
    /// No date selected
    Idle,
    /// Waiting for the booking server
    Pending,
    /// Booked slots are marked
    Loaded,
    /// Lookup failed; every slot stays selectable
    Failed(String),
}

/// A booked-times lookup tagged with the selection it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookedTimesRequest {
    pub generation: u64,
    pub date: NaiveDate,
}

impl BookedTimesRequest {
    /// `YYYY-MM-DD` key sent to the booking server
    pub fn date_key(&self) -> String {
        date_key(self.date)
    }
}

/// Everything one facilitator sees while booking against one event container
#[derive(Debug, Clone)]
pub struct ViewState {
    pub event_id: String,
    pub availability: EventContainerAvailability,
    pub cursor: CalendarCursor,
    pub today: NaiveDate,
    pub stage: Stage,
    pub selected_date: Option<NaiveDate>,
    pub selected_slot: Option<usize>,
    pub slots: Vec<TimeSlot>,
    pub booked_status: BookedStatus,
    /// Bumped on every selection or navigation change
    pub generation: u64,
    year_window: i32,
}

impl ViewState {
    /// Open a view on the month containing `today`
    pub fn new(
        event_id: impl Into<String>,
        availability: EventContainerAvailability,
        today: NaiveDate,
        clock: ClockFormat,
        year_window: i32,
    ) -> BotResult<Self> {
        let slots = slots_for(&availability, clock)?;
        Ok(Self {
            event_id: event_id.into(),
            availability,
            cursor: CalendarCursor::containing(today),
            today,
            stage: Stage::Browsing,
            selected_date: None,
            selected_slot: None,
            slots,
            booked_status: BookedStatus::Idle,
            generation: 0,
            year_window: year_window.max(0),
        })
    }

    /// Grid for the visible month
    pub fn month_grid(&self) -> BotResult<MonthGrid> {
        render_month_grid(self.cursor, &self.availability, self.today)
    }

    /// Move the day used for past-date checks
    pub fn set_today(&mut self, today: NaiveDate) {
        self.today = today;
    }

    /// Move the calendar by whole months
    pub fn shift_months(&mut self, offset: i32) -> CalendarCursor {
        self.set_cursor(self.cursor.shifted_months(offset))
    }

    /// Move the calendar by whole years
    pub fn shift_years(&mut self, offset: i32) -> CalendarCursor {
        self.set_cursor(self.cursor.shifted_years(offset))
    }

    /// Show a month, clamped to the allowed year window
    ///
    /// Changing the visible month drops any date or slot selection.
    pub fn set_cursor(&mut self, cursor: CalendarCursor) -> CalendarCursor {
        let min = CalendarCursor::new(self.today.year() - self.year_window, 0);
        let max = CalendarCursor::new(self.today.year() + self.year_window, 11);
        let cursor = cursor.clamp(min, max);

        if cursor != self.cursor {
            self.cursor = cursor;
            self.reset_selection();
        }
        self.cursor
    }

    /// Select a day of the visible month
    ///
    /// Returns the lookup the caller must run to mark booked slots.
    pub fn select_date(&mut self, day: u32) -> BotResult<BookedTimesRequest> {
        if self.stage == Stage::Confirming {
            return Err(selection_error("Booking is waiting for confirmation"));
        }

        let grid = self.month_grid()?;
        let cell = grid
            .cell_for_day(day)
            .ok_or_else(|| selection_error(&format!("Day {} is not in this month", day)))?;
        if !cell.selectable {
            return Err(selection_error(&format!("Day {} cannot be booked", day)));
        }

        let date = self
            .cursor
            .first_day()
            .and_then(|first| first.with_day(day))
            .ok_or_else(|| selection_error(&format!("Day {} is not in this month", day)))?;

        self.generation += 1;
        self.selected_date = Some(date);
        self.selected_slot = None;
        self.stage = Stage::DateSelected;
        self.booked_status = BookedStatus::Pending;
        clear_booked(&mut self.slots);

        Ok(BookedTimesRequest {
            generation: self.generation,
            date,
        })
    }

    /// Apply a finished booked-times lookup
    ///
    /// Results for anything but the current selection are dropped and `false`
    /// is returned. A failed lookup leaves every slot selectable.
    pub fn apply_booked_times(
        &mut self,
        request: BookedTimesRequest,
        result: BotResult<BookedTimes>,
    ) -> bool {
        if request.generation != self.generation || self.selected_date != Some(request.date) {
            debug!(
                "Discarding booked times for {} (generation {}, current {})",
                request.date_key(),
                request.generation,
                self.generation
            );
            return false;
        }

        match result {
            Ok(booked) => {
                if !booked.unreadable.is_empty() {
                    warn!(
                        "Ignoring unreadable booked times for {}: {:?}",
                        request.date_key(),
                        booked.unreadable
                    );
                }
                let count = mark_booked(&mut self.slots, &booked);
                debug!("{} slots booked on {}", count, request.date_key());

                if let Some(index) = self.selected_slot {
                    if self.slots.get(index).map(|s| s.booked).unwrap_or(true) {
                        self.selected_slot = None;
                        if self.stage == Stage::SlotSelected {
                            self.stage = Stage::DateSelected;
                        }
                    }
                }
                self.booked_status = BookedStatus::Loaded;
            }
            Err(e) => {
                warn!(
                    "Failed to fetch booked times for {}, leaving all slots open: {}",
                    request.date_key(),
                    e
                );
                clear_booked(&mut self.slots);
                self.booked_status = BookedStatus::Failed(e.to_string());
            }
        }
        true
    }

    /// Select a slot by index
    pub fn select_slot(&mut self, index: usize) -> BotResult<&TimeSlot> {
        match self.stage {
            Stage::Browsing => return Err(selection_error("Select a date first")),
            Stage::Confirming => return Err(selection_error("Booking is waiting for confirmation")),
            Stage::DateSelected | Stage::SlotSelected => {}
        }

        let slot = self
            .slots
            .get(index)
            .ok_or_else(|| selection_error(&format!("No time slot {}", index + 1)))?;
        if slot.booked {
            return Err(selection_error(&format!("{} is already booked", slot.display)));
        }

        self.selected_slot = Some(index);
        self.stage = Stage::SlotSelected;
        Ok(&self.slots[index])
    }

    /// Lock in the selection and produce the handoff for booking submission
    pub fn confirm(&mut self) -> BotResult<BookingSelection> {
        if self.stage != Stage::SlotSelected && self.stage != Stage::Confirming {
            return Err(selection_error("Select a date and a time first"));
        }
        let date = self
            .selected_date
            .ok_or_else(|| selection_error("Select a date first"))?;
        let slot = self
            .selected_slot
            .and_then(|index| self.slots.get(index))
            .ok_or_else(|| selection_error("Select a time first"))?;

        let selection = BookingSelection {
            event_id: self.event_id.clone(),
            date,
            time: crate::utils::time::minutes_to_label(slot.start_minutes),
            display: slot.display.clone(),
            meeting_type: self.availability.meeting_type.clone(),
            event_name: self.availability.event_name.clone(),
        };
        self.stage = Stage::Confirming;
        Ok(selection)
    }

    /// Step back from confirmation to slot selection
    pub fn back(&mut self) -> BotResult<()> {
        if self.stage != Stage::Confirming {
            return Err(selection_error("Nothing to go back from"));
        }
        self.stage = Stage::SlotSelected;
        Ok(())
    }

    /// Currently selected slot, if any
    pub fn selected_time_slot(&self) -> Option<&TimeSlot> {
        self.selected_slot.and_then(|index| self.slots.get(index))
    }

    fn reset_selection(&mut self) {
        self.generation += 1;
        self.selected_date = None;
        self.selected_slot = None;
        self.stage = Stage::Browsing;
        self.booked_status = BookedStatus::Idle;
        clear_booked(&mut self.slots);
    }
}
