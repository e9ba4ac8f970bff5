use crate::error::{config_error, env_error, BotResult};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::str::FromStr;

/// Default activity text for the bot
pub const DEFAULT_ACTIVITY: &str = "Varaa aika";

/// Default number of years the calendar may be moved away from today
pub const DEFAULT_YEAR_WINDOW: i32 = 10;

/// Default timeout for booking server requests, in seconds
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 10;

/// How slot times are shown to facilitators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClockFormat {
    /// 09:30
    #[default]
    TwentyFourHour,
    /// 9:30 AM
    TwelveHour,
}

impl FromStr for ClockFormat {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "24h" | "24" => Ok(ClockFormat::TwentyFourHour),
            "12h" | "12" | "ampm" => Ok(ClockFormat::TwelveHour),
            other => Err(config_error(&format!("Unknown clock format: {}", other))),
        }
    }
}

/// Main configuration structure for the bot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Discord bot token
    pub discord_token: String,
    /// Base URL of the booking server (event info and scheduled meetings)
    pub booking_api_url: String,
    /// Timeout for a single booking server request, in seconds
    pub request_timeout_secs: u64,
    /// Map of component names to their enabled status
    pub components: HashMap<String, bool>,
    /// Fallback timezone when an event container has none
    pub timezone: String,
    /// Bot activity status text
    pub activity: String,
    /// Locale for bot messages
    pub bot_locale: String,
    /// Slot time display format
    pub clock_format: ClockFormat,
    /// How many years the calendar may move away from the current year
    pub year_window: i32,
}

impl Default for Config {
    fn default() -> Self {
        let mut components = HashMap::new();
        components.insert("booking".to_string(), true);

        Self {
            discord_token: String::new(),
            booking_api_url: "http://127.0.0.1:8080".to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT,
            components,
            timezone: "UTC".to_string(),
            activity: DEFAULT_ACTIVITY.to_string(),
            bot_locale: "en".to_string(),
            clock_format: ClockFormat::default(),
            year_window: DEFAULT_YEAR_WINDOW,
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> BotResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let discord_token = env::var("DISCORD_TOKEN").map_err(|_| env_error("DISCORD_TOKEN"))?;
        let booking_api_url =
            env::var("BOOKING_API_URL").map_err(|_| env_error("BOOKING_API_URL"))?;

        // Reject obviously broken URLs at startup instead of on the first request
        url::Url::parse(&booking_api_url)
            .map_err(|e| config_error(&format!("Invalid BOOKING_API_URL: {}", e)))?;

        let request_timeout_secs = match env::var("BOOKING_REQUEST_TIMEOUT") {
            Ok(value) => value
                .parse::<u64>()
                .map_err(|_| env_error("Invalid BOOKING_REQUEST_TIMEOUT format"))?,
            Err(_) => DEFAULT_REQUEST_TIMEOUT,
        };

        let year_window = match env::var("BOOKING_YEAR_WINDOW") {
            Ok(value) => value
                .parse::<i32>()
                .ok()
                .filter(|years| *years >= 0)
                .ok_or_else(|| env_error("Invalid BOOKING_YEAR_WINDOW format"))?,
            Err(_) => DEFAULT_YEAR_WINDOW,
        };

        let clock_format = match env::var("BOOKING_CLOCK_FORMAT") {
            Ok(value) => value.parse()?,
            Err(_) => ClockFormat::default(),
        };

        let timezone = env::var("TIMEZONE").unwrap_or_else(|_| String::from("UTC"));
        let activity =
            env::var("BOT_ACTIVITY").unwrap_or_else(|_| String::from(DEFAULT_ACTIVITY));
        let bot_locale = env::var("BOT_LOCALE").unwrap_or_else(|_| String::from("en"));

        let mut config = Config {
            discord_token,
            booking_api_url,
            request_timeout_secs,
            timezone,
            activity,
            bot_locale,
            clock_format,
            year_window,
            ..Default::default()
        };

        // Load components configuration from file if it exists
        if let Ok(content) = fs::read_to_string("config/components.toml") {
            config.merge_components(&content)?;
        }

        Ok(config)
    }

    /// Merge component toggles from a TOML table of `name = bool`
    pub fn merge_components(&mut self, content: &str) -> BotResult<()> {
        let file_components = toml::from_str::<HashMap<String, bool>>(content)?;
        for (key, value) in file_components {
            self.components.insert(key, value);
        }
        Ok(())
    }

    /// Check if a component is enabled
    pub fn is_component_enabled(&self, name: &str) -> bool {
        *self.components.get(name).unwrap_or(&false)
    }
}
