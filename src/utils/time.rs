use crate::error::{BotResult, Error};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

/// Minutes in a day
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Parse time string in HH:MM format
///
/// A trailing `:SS` part is accepted and ignored, since the booking server
/// hands out database TIME columns as `HH:MM:SS`.
pub fn parse_time(time_str: &str) -> Option<(u32, u32)> {
    let parts: Vec<&str> = time_str.trim().split(':').collect();
    if parts.len() != 2 && parts.len() != 3 {
        return None;
    }
    if parts.len() == 3 && parts[2].parse::<u32>().ok()? > 59 {
        return None;
    }
    if parts[0].is_empty() || parts[0].len() > 2 || parts[1].len() != 2 {
        return None;
    }
    let hour = parts[0].parse::<u32>().ok()?;
    let minute = parts[1].parse::<u32>().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some((hour, minute))
}

/// Convert an `HH:MM` time to minutes since midnight
pub fn time_to_minutes(time_str: &str) -> BotResult<u32> {
    let (hour, minute) =
        parse_time(time_str).ok_or_else(|| Error::InvalidTime(time_str.to_string()))?;
    Ok(hour * 60 + minute)
}

/// Format minutes since midnight as zero padded `HH:MM`
pub fn minutes_to_label(minutes: u32) -> String {
    let minutes = minutes % MINUTES_PER_DAY;
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Format minutes since midnight as `h:MM AM/PM`
pub fn format_ampm(minutes: u32) -> String {
    let minutes = minutes % MINUTES_PER_DAY;
    let hour = minutes / 60;
    let suffix = if hour < 12 { "AM" } else { "PM" };
    let hour12 = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02} {}", hour12, minutes % 60, suffix)
}

/// Parse a time label in either `HH:MM` or `h:MM AM/PM` form
pub fn parse_display_time(label: &str) -> Option<u32> {
    let label = label.trim();
    let upper = label.to_uppercase();

    let (clock, is_pm) = if let Some(clock) = upper.strip_suffix("AM") {
        (clock.trim(), false)
    } else if let Some(clock) = upper.strip_suffix("PM") {
        (clock.trim(), true)
    } else {
        let (hour, minute) = parse_time(label)?;
        return Some(hour * 60 + minute);
    };

    let (hour, minute) = parse_time(clock)?;
    if hour == 0 || hour > 12 {
        return None;
    }
    let hour24 = match (hour, is_pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, false) => h,
        (h, true) => h + 12,
    };
    Some(hour24 * 60 + minute)
}

/// Format a date as the `YYYY-MM-DD` key used by the booking server
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Current calendar date in the given time zone
pub fn today_in(tz: &Tz) -> NaiveDate {
    Utc::now().with_timezone(tz).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time() {
        // Valid cases
        assert_eq!(parse_time("00:00"), Some((0, 0)));
        assert_eq!(parse_time("12:30"), Some((12, 30)));
        assert_eq!(parse_time("23:59"), Some((23, 59)));
        assert_eq!(parse_time("9:05"), Some((9, 5)));
        assert_eq!(parse_time("09:00:00"), Some((9, 0)));

        // Invalid cases
        assert_eq!(parse_time("24:00"), None); // Hour out of range
        assert_eq!(parse_time("12:60"), None); // Minute out of range
        assert_eq!(parse_time("12:30:75"), None); // Second out of range
        assert_eq!(parse_time("12"), None); // Too few parts
        assert_eq!(parse_time("12:5"), None); // Unpadded minute
        assert_eq!(parse_time("12:ab"), None); // Invalid minute
        assert_eq!(parse_time("ab:30"), None); // Invalid hour
    }

    #[test]
    fn test_time_to_minutes() {
        assert_eq!(time_to_minutes("09:00").unwrap(), 540);
        assert_eq!(time_to_minutes("13:45").unwrap(), 825);
        assert!(matches!(time_to_minutes("nine"), Err(Error::InvalidTime(_))));
    }

    #[test]
    fn test_minutes_to_label() {
        assert_eq!(minutes_to_label(0), "00:00");
        assert_eq!(minutes_to_label(540), "09:00");
        assert_eq!(minutes_to_label(825), "13:45");
    }

    #[test]
    fn test_format_ampm() {
        assert_eq!(format_ampm(0), "12:00 AM");
        assert_eq!(format_ampm(540), "9:00 AM");
        assert_eq!(format_ampm(720), "12:00 PM");
        assert_eq!(format_ampm(810), "1:30 PM");
        assert_eq!(format_ampm(1439), "11:59 PM");
    }

    #[test]
    fn test_parse_display_time() {
        assert_eq!(parse_display_time("10:00"), Some(600));
        assert_eq!(parse_display_time("10:00 AM"), Some(600));
        assert_eq!(parse_display_time("1:30 PM"), Some(810));
        assert_eq!(parse_display_time("12:00 AM"), Some(0));
        assert_eq!(parse_display_time("12:15 pm"), Some(735));
        assert_eq!(parse_display_time("13:00 PM"), None);
        assert_eq!(parse_display_time("noon"), None);

        // Every formatted value reads back to the same minute
        for minutes in (0..MINUTES_PER_DAY).step_by(15) {
            assert_eq!(parse_display_time(&format_ampm(minutes)), Some(minutes));
            assert_eq!(parse_display_time(&minutes_to_label(minutes)), Some(minutes));
        }
    }

    #[test]
    fn test_date_key() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(date_key(date), "2024-03-07");
    }
}
