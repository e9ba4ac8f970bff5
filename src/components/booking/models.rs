use super::time::{parse_duration, parse_time_zone, parse_weekday, weekday_range};
use crate::error::{BotResult, Error};
use crate::utils::time::time_to_minutes;
use chrono::{NaiveDate, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Meeting duration as sent by the booking server: legacy text or plain minutes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDuration {
    Minutes(u32),
    Text(String),
}

impl RawDuration {
    /// Duration in whole minutes
    pub fn minutes(&self) -> BotResult<u32> {
        match self {
            RawDuration::Minutes(0) => Err(Error::InvalidDuration("0".to_string())),
            RawDuration::Minutes(minutes) => Ok(*minutes),
            RawDuration::Text(text) => parse_duration(text),
        }
    }
}

/// Event container metadata as returned by `get-event-info`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInfo {
    pub fetched_start_time: String,
    pub fetched_end_time: String,
    pub fetched_duration: RawDuration,
    #[serde(default)]
    pub fetched_available_days: Vec<String>,
    #[serde(default)]
    pub fetched_day_from: Option<String>,
    #[serde(default)]
    pub fetched_day_to: Option<String>,
    #[serde(default)]
    pub fetched_time_zone: Option<String>,
    #[serde(default)]
    pub fetched_meeting_type: Option<String>,
    #[serde(default)]
    pub fetched_event_name: Option<String>,
}

/// How the meeting is held
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeetingType {
    Zoom,
    Teams,
    Phone,
    Other(String),
}

impl From<&str> for MeetingType {
    fn from(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "zoom" => MeetingType::Zoom,
            "teams" => MeetingType::Teams,
            "phone" => MeetingType::Phone,
            _ => MeetingType::Other(value.trim().to_string()),
        }
    }
}

impl fmt::Display for MeetingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeetingType::Zoom => write!(f, "Zoom"),
            MeetingType::Teams => write!(f, "Teams"),
            MeetingType::Phone => write!(f, "Phone"),
            MeetingType::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Bookable availability of one event container
#[derive(Debug, Clone, PartialEq)]
pub struct EventContainerAvailability {
    pub available_days: HashSet<Weekday>,
    /// Start of the daily window as configured by the admin
    pub start_time: String,
    /// End of the daily window as configured by the admin
    pub end_time: String,
    pub duration_minutes: u32,
    pub time_zone: Tz,
    pub meeting_type: Option<MeetingType>,
    pub event_name: Option<String>,
}

impl EventContainerAvailability {
    /// Validate server metadata into a typed availability
    ///
    /// `default_tz` is used when the container does not name a time zone.
    pub fn from_event_info(info: &EventInfo, default_tz: Tz) -> BotResult<Self> {
        // Times are validated up front so a broken container fails on open
        time_to_minutes(&info.fetched_start_time)?;
        time_to_minutes(&info.fetched_end_time)?;
        let duration_minutes = info.fetched_duration.minutes()?;

        let mut available_days = info
            .fetched_available_days
            .iter()
            .map(|day| parse_weekday(day))
            .collect::<BotResult<HashSet<_>>>()?;

        if let (Some(from), Some(to)) = (&info.fetched_day_from, &info.fetched_day_to) {
            available_days.extend(weekday_range(parse_weekday(from)?, parse_weekday(to)?));
        }

        let time_zone = match &info.fetched_time_zone {
            Some(name) if !name.trim().is_empty() => parse_time_zone(name)?,
            _ => default_tz,
        };

        Ok(Self {
            available_days,
            start_time: info.fetched_start_time.trim().to_string(),
            end_time: info.fetched_end_time.trim().to_string(),
            duration_minutes,
            time_zone,
            meeting_type: info
                .fetched_meeting_type
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .map(MeetingType::from),
            event_name: info.fetched_event_name.clone(),
        })
    }

    /// Whether meetings may be booked on this weekday
    pub fn is_available_on(&self, weekday: Weekday) -> bool {
        self.available_days.contains(&weekday)
    }
}

/// Year and 0-based month shown by the calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CalendarCursor {
    pub year: i32,
    /// 0 = January, 11 = December
    pub month: u32,
}

impl CalendarCursor {
    pub fn new(year: i32, month: u32) -> Self {
        Self {
            year,
            month: month.min(11),
        }
    }

    /// Cursor for the month containing `date`
    pub fn containing(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self::new(date.year(), date.month0())
    }

    /// Move by whole months, wrapping across year boundaries
    pub fn shifted_months(self, offset: i32) -> Self {
        let total = self.year as i64 * 12 + self.month as i64 + offset as i64;
        Self {
            year: total.div_euclid(12) as i32,
            month: total.rem_euclid(12) as u32,
        }
    }

    /// Move by whole years
    pub fn shifted_years(self, offset: i32) -> Self {
        Self {
            year: self.year.saturating_add(offset),
            month: self.month,
        }
    }

    /// First day of the month
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)
    }
}

/// One cell of the month grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateCell {
    /// `None` for padding before day 1 and after the last day
    pub day_of_month: Option<u32>,
    /// 0 = Sunday .. 6 = Saturday
    pub weekday_index: u32,
    pub selectable: bool,
    pub is_past: bool,
}

impl DateCell {
    pub fn is_padding(&self) -> bool {
        self.day_of_month.is_none()
    }
}

/// A 6 x 7 Sunday-first month grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    pub cursor: CalendarCursor,
    pub cells: Vec<DateCell>,
    pub leading_blanks: u32,
    pub trailing_blanks: u32,
    pub days_in_month: u32,
}

impl MonthGrid {
    pub const ROWS: usize = 6;
    pub const COLUMNS: usize = 7;

    /// Rows of the grid, first calendar week first
    pub fn rows(&self) -> impl Iterator<Item = &[DateCell]> {
        self.cells.chunks(Self::COLUMNS)
    }

    /// The cell for a given day of the month
    pub fn cell_for_day(&self, day: u32) -> Option<&DateCell> {
        self.cells.iter().find(|cell| cell.day_of_month == Some(day))
    }
}

/// One bookable time slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSlot {
    pub index: usize,
    /// `HH:MM` label; slot 0 carries the configured start time verbatim
    pub label: String,
    /// Label as shown to the facilitator
    pub display: String,
    pub start_minutes: u32,
    pub booked: bool,
}

/// Times already booked on one date, as minutes since midnight
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BookedTimes {
    pub times: BTreeSet<u32>,
    /// Labels the server sent that could not be read as a time
    pub unreadable: Vec<String>,
}

impl BookedTimes {
    /// Read the server's labels, accepting `HH:MM` and `h:MM AM/PM`
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Self {
        let mut booked = Self::default();
        for label in labels {
            match crate::utils::time::parse_display_time(label.as_ref()) {
                Some(minutes) => {
                    booked.times.insert(minutes);
                }
                None => booked.unreadable.push(label.as_ref().to_string()),
            }
        }
        booked
    }

    pub fn contains(&self, minutes: u32) -> bool {
        self.times.contains(&minutes)
    }
}

/// The confirmed choice handed to the booking submission flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingSelection {
    pub event_id: String,
    pub date: NaiveDate,
    /// `HH:MM`
    pub time: String,
    pub display: String,
    pub meeting_type: Option<MeetingType>,
    pub event_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_info() -> EventInfo {
        serde_json::from_str(
            r#"{
                "fetchedStartTime": "09:00",
                "fetchedEndTime": "12:00",
                "fetchedDuration": "1h 30 min",
                "fetchedAvailableDays": ["Monday", "Wednesday"],
                "fetchedTimeZone": "Central Time Zone",
                "fetchedMeetingType": "Zoom"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_availability_from_event_info() {
        let availability =
            EventContainerAvailability::from_event_info(&event_info(), chrono_tz::UTC).unwrap();
        assert_eq!(availability.duration_minutes, 90);
        assert!(availability.is_available_on(Weekday::Mon));
        assert!(availability.is_available_on(Weekday::Wed));
        assert!(!availability.is_available_on(Weekday::Tue));
        assert_eq!(availability.time_zone, chrono_tz::America::Chicago);
        assert_eq!(availability.meeting_type, Some(MeetingType::Zoom));
    }

    #[test]
    fn test_availability_day_range_and_numeric_duration() {
        let info: EventInfo = serde_json::from_str(
            r#"{
                "fetchedStartTime": "08:00:00",
                "fetchedEndTime": "16:00:00",
                "fetchedDuration": 30,
                "fetchedDayFrom": "Friday",
                "fetchedDayTo": "Monday"
            }"#,
        )
        .unwrap();
        let availability =
            EventContainerAvailability::from_event_info(&info, chrono_tz::Europe::Helsinki).unwrap();
        assert_eq!(availability.duration_minutes, 30);
        assert_eq!(availability.available_days.len(), 4);
        assert!(availability.is_available_on(Weekday::Sun));
        assert!(!availability.is_available_on(Weekday::Wed));
        assert_eq!(availability.time_zone, chrono_tz::Europe::Helsinki);
        assert_eq!(availability.meeting_type, None);
    }

    #[test]
    fn test_availability_rejects_bad_metadata() {
        let mut info = event_info();
        info.fetched_duration = RawDuration::Text("forever".to_string());
        assert!(matches!(
            EventContainerAvailability::from_event_info(&info, chrono_tz::UTC),
            Err(Error::InvalidDuration(_))
        ));

        let mut info = event_info();
        info.fetched_end_time = "noon".to_string();
        assert!(matches!(
            EventContainerAvailability::from_event_info(&info, chrono_tz::UTC),
            Err(Error::InvalidTime(_))
        ));

        let mut info = event_info();
        info.fetched_available_days.push("Caturday".to_string());
        assert!(matches!(
            EventContainerAvailability::from_event_info(&info, chrono_tz::UTC),
            Err(Error::InvalidWeekday(_))
        ));
    }

    #[test]
    fn test_cursor_shifting() {
        let december = CalendarCursor::new(2024, 11);
        assert_eq!(december.shifted_months(1), CalendarCursor::new(2025, 0));
        assert_eq!(december.shifted_months(-12), CalendarCursor::new(2023, 11));

        let january = CalendarCursor::new(2024, 0);
        assert_eq!(january.shifted_months(-1), CalendarCursor::new(2023, 11));
        assert_eq!(january.shifted_months(25), CalendarCursor::new(2026, 1));
        assert_eq!(january.shifted_years(-3), CalendarCursor::new(2021, 0));
    }

    #[test]
    fn test_booked_times_from_labels() {
        let booked = BookedTimes::from_labels(&["10:00", "1:30 PM", "soon"]);
        assert!(booked.contains(600));
        assert!(booked.contains(810));
        assert_eq!(booked.times.len(), 2);
        assert_eq!(booked.unreadable, vec!["soon".to_string()]);
    }

    #[test]
    fn test_meeting_type() {
        assert_eq!(MeetingType::from("teams"), MeetingType::Teams);
        assert_eq!(MeetingType::from(" In person "), MeetingType::Other("In person".to_string()));
        assert_eq!(MeetingType::Phone.to_string(), "Phone");
    }
}
