use crate::error::{BotResult, Error};
use chrono::Weekday;
use chrono_tz::Tz;
use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    /// Time zone names offered by the event container form
    static ref TIME_ZONE_ALIASES: HashMap<&'static str, Tz> = {
        let mut aliases = HashMap::new();
        aliases.insert("eastern time zone", chrono_tz::America::New_York);
        aliases.insert("central time zone", chrono_tz::America::Chicago);
        aliases.insert("mountain time zone", chrono_tz::America::Denver);
        aliases.insert("pacific time zone", chrono_tz::America::Los_Angeles);
        aliases
    };
}

/// Parse the legacy duration format into whole minutes
///
/// Accepted shapes are `"30"`, `"30 min"`, `"1h"` and `"1h 30 min"`.
pub fn parse_duration(raw: &str) -> BotResult<u32> {
    let invalid = || Error::InvalidDuration(raw.to_string());
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();

    let (hours, rest) = match compact.split_once('h') {
        Some((hours, rest)) => (Some(parse_number(hours).ok_or_else(invalid)?), rest),
        None => (None, compact.as_str()),
    };

    let minutes = if rest.is_empty() {
        None
    } else {
        let digits = rest
            .strip_suffix("mins")
            .or_else(|| rest.strip_suffix("min"))
            .or_else(|| rest.strip_suffix('m'))
            .unwrap_or(rest);
        // "1h 30" without a unit is ambiguous
        if hours.is_some() && digits.len() == rest.len() {
            return Err(invalid());
        }
        Some(parse_number(digits).ok_or_else(invalid)?)
    };

    let total = match (hours, minutes) {
        (Some(h), Some(m)) if m < 60 => h.checked_mul(60).and_then(|h| h.checked_add(m)),
        (Some(_), Some(_)) => None,
        (Some(h), None) => h.checked_mul(60),
        (None, Some(m)) => Some(m),
        (None, None) => None,
    }
    .ok_or_else(invalid)?;

    if total == 0 {
        return Err(invalid());
    }
    Ok(total)
}

fn parse_number(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Parse a weekday name such as `Monday` or `mon`
pub fn parse_weekday(name: &str) -> BotResult<Weekday> {
    name.trim()
        .parse::<Weekday>()
        .map_err(|_| Error::InvalidWeekday(name.to_string()))
}

/// Expand an inclusive weekday range, wrapping past Sunday
pub fn weekday_range(from: Weekday, to: Weekday) -> Vec<Weekday> {
    let mut days = vec![from];
    let mut day = from;
    while day != to {
        day = day.succ();
        days.push(day);
    }
    days
}

/// Resolve a container time zone from its form label or an IANA name
pub fn parse_time_zone(name: &str) -> BotResult<Tz> {
    let trimmed = name.trim();
    if let Some(tz) = TIME_ZONE_ALIASES.get(trimmed.to_lowercase().as_str()) {
        return Ok(*tz);
    }
    trimmed
        .parse::<Tz>()
        .map_err(|_| Error::InvalidTimeZone(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30 min").unwrap(), 30);
        assert_eq!(parse_duration("45").unwrap(), 45);
        assert_eq!(parse_duration("1h").unwrap(), 60);
        assert_eq!(parse_duration("2h").unwrap(), 120);
        assert_eq!(parse_duration("1h 30 min").unwrap(), 90);
        assert_eq!(parse_duration("1h30min").unwrap(), 90);
        assert_eq!(parse_duration(" 1H 15 mins ").unwrap(), 75);
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        for raw in ["", "min", "h", "abc", "0", "0 min", "1h 30", "1h 75 min", "-5 min", "1.5h"] {
            assert!(
                matches!(parse_duration(raw), Err(Error::InvalidDuration(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_weekday() {
        assert_eq!(parse_weekday("Monday").unwrap(), Weekday::Mon);
        assert_eq!(parse_weekday(" sunday ").unwrap(), Weekday::Sun);
        assert_eq!(parse_weekday("Wed").unwrap(), Weekday::Wed);
        assert!(matches!(parse_weekday("Funday"), Err(Error::InvalidWeekday(_))));
    }

    #[test]
    fn test_weekday_range() {
        assert_eq!(
            weekday_range(Weekday::Mon, Weekday::Fri),
            vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri]
        );
        assert_eq!(
            weekday_range(Weekday::Fri, Weekday::Mon),
            vec![Weekday::Fri, Weekday::Sat, Weekday::Sun, Weekday::Mon]
        );
        assert_eq!(weekday_range(Weekday::Wed, Weekday::Wed), vec![Weekday::Wed]);
    }

    #[test]
    fn test_parse_time_zone() {
        assert_eq!(parse_time_zone("Central Time Zone").unwrap(), chrono_tz::America::Chicago);
        assert_eq!(parse_time_zone("pacific time zone").unwrap(), chrono_tz::America::Los_Angeles);
        assert_eq!(parse_time_zone("Europe/Helsinki").unwrap(), chrono_tz::Europe::Helsinki);
        assert!(matches!(parse_time_zone("Moon Time"), Err(Error::InvalidTimeZone(_))));
    }
}
