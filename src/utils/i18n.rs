use chrono::Weekday;
use rust_i18n::t;
use tracing::warn;

/// Locales shipped in `locales/`
pub const AVAILABLE_LOCALES: [&str; 2] = ["en", "fi"];

/// Set the locale used for bot messages, falling back to English
pub fn set_locale(locale: &str) {
    let language = locale.split(['-', '_']).next().unwrap_or("en");
    if AVAILABLE_LOCALES.contains(&language) {
        rust_i18n::set_locale(language);
    } else {
        warn!("Unsupported locale '{}', using English", locale);
        rust_i18n::set_locale("en");
    }
}

/// Localized month name for a 0-based month
pub fn month_name(month0: u32) -> String {
    match month0 {
        0 => t!("month_january"),
        1 => t!("month_february"),
        2 => t!("month_march"),
        3 => t!("month_april"),
        4 => t!("month_may"),
        5 => t!("month_june"),
        6 => t!("month_july"),
        7 => t!("month_august"),
        8 => t!("month_september"),
        9 => t!("month_october"),
        10 => t!("month_november"),
        _ => t!("month_december"),
    }
    .to_string()
}

/// Localized two letter weekday abbreviation
pub fn weekday_short(weekday: Weekday) -> String {
    match weekday {
        Weekday::Mon => t!("day_short_monday"),
        Weekday::Tue => t!("day_short_tuesday"),
        Weekday::Wed => t!("day_short_wednesday"),
        Weekday::Thu => t!("day_short_thursday"),
        Weekday::Fri => t!("day_short_friday"),
        Weekday::Sat => t!("day_short_saturday"),
        Weekday::Sun => t!("day_short_sunday"),
    }
    .to_string()
}

/// Localized full weekday name
pub fn weekday_name(weekday: Weekday) -> String {
    match weekday {
        Weekday::Mon => t!("day_monday"),
        Weekday::Tue => t!("day_tuesday"),
        Weekday::Wed => t!("day_wednesday"),
        Weekday::Thu => t!("day_thursday"),
        Weekday::Fri => t!("day_friday"),
        Weekday::Sat => t!("day_saturday"),
        Weekday::Sun => t!("day_sunday"),
    }
    .to_string()
}
