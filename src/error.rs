use miette::Diagnostic;
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Discord API error: {0}")]
    #[diagnostic(code(varausbotti::discord_api))]
    DiscordApi(#[from] serenity::Error),

    #[error("Poise framework error: {0}")]
    #[diagnostic(code(varausbotti::poise))]
    Poise(#[from] Box<dyn std::error::Error + Send + Sync>),

    #[error("Environment error: {0}")]
    #[diagnostic(code(varausbotti::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(varausbotti::config))]
    Config(String),

    #[error("Booking server error: {0}")]
    #[diagnostic(code(varausbotti::booking_server))]
    Booking(String),

    #[error("Invalid time '{0}', expected HH:MM")]
    #[diagnostic(code(varausbotti::invalid_time))]
    InvalidTime(String),

    #[error("Invalid meeting duration '{0}'")]
    #[diagnostic(
        code(varausbotti::invalid_duration),
        help("Durations look like '30 min', '1h' or '1h 30 min'")
    )]
    InvalidDuration(String),

    #[error("Invalid weekday '{0}'")]
    #[diagnostic(code(varausbotti::invalid_weekday))]
    InvalidWeekday(String),

    #[error("Unknown time zone '{0}'")]
    #[diagnostic(code(varausbotti::invalid_time_zone))]
    InvalidTimeZone(String),

    #[error("Selection error: {0}")]
    #[diagnostic(code(varausbotti::selection))]
    Selection(String),

    #[error("Component error: {0}")]
    #[diagnostic(code(varausbotti::component))]
    Component(String),

    #[error(transparent)]
    #[diagnostic(code(varausbotti::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(varausbotti::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(varausbotti::other))]
    Other(String),
}

// Implement From for TOML deserialization errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type BotResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create component errors
pub fn component_error(message: &str) -> Error {
    Error::Component(message.to_string())
}

/// Helper to create booking server errors
pub fn booking_error(message: &str) -> Error {
    Error::Booking(message.to_string())
}

/// Helper to create selection errors
pub fn selection_error(message: &str) -> Error {
    Error::Selection(message.to_string())
}

impl Error {
    /// Errors caused by a badly configured event container rather than by the
    /// facilitator or the network
    pub fn is_container_misconfiguration(&self) -> bool {
        matches!(
            self,
            Error::InvalidTime(_)
                | Error::InvalidDuration(_)
                | Error::InvalidWeekday(_)
                | Error::InvalidTimeZone(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_misconfiguration() {
        assert!(Error::InvalidDuration("abc".to_string()).is_container_misconfiguration());
        assert!(Error::InvalidTime("25:00".to_string()).is_container_misconfiguration());
        assert!(!booking_error("HTTP 500").is_container_misconfiguration());
        assert!(!selection_error("no date").is_container_misconfiguration());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            env_error("DISCORD_TOKEN").to_string(),
            "Environment error: Missing environment variable: DISCORD_TOKEN"
        );
        assert_eq!(
            Error::InvalidTime("9-00".to_string()).to_string(),
            "Invalid time '9-00', expected HH:MM"
        );
    }
}
