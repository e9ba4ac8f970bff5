use super::models::EventInfo;
use crate::config::Config;
use crate::error::{booking_error, config_error, BotResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Endpoint returning an event container's availability metadata
pub const EVENT_INFO_ENDPOINT: &str = "get-event-info";
/// Endpoint returning the times already booked on a date
pub const SCHEDULED_MEETINGS_ENDPOINT: &str = "scheduled-meetings-by-date";

/// Source of event container metadata and existing bookings
#[async_trait]
pub trait BookingSource: Send + Sync + 'static {
    /// Fetch availability metadata for an event container
    async fn event_info(&self, event_id: &str) -> BotResult<EventInfo>;

    /// Fetch the time labels already booked on `date`
    async fn booked_times(&self, event_id: &str, date: NaiveDate) -> BotResult<Vec<String>>;
}

/// Booking server client over HTTP
#[derive(Debug, Clone)]
pub struct HttpBookingSource {
    client: Client,
    base_url: Url,
}

impl HttpBookingSource {
    /// Create a client for the booking server at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> BotResult<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| config_error(&format!("Invalid booking server URL: {}", e)))?;
        // Endpoints are joined relative to the base, which needs a trailing slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| config_error(&format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// Create a client from the bot configuration
    pub fn from_config(config: &Config) -> BotResult<Self> {
        Self::new(
            &config.booking_api_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Build an endpoint URL with query parameters
    pub fn endpoint(&self, endpoint: &str, query: &[(&str, &str)]) -> BotResult<Url> {
        let mut url = self
            .base_url
            .join(endpoint)
            .map_err(|e| booking_error(&format!("Failed to build URL: {}", e)))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> BotResult<T> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| booking_error(&format!("Request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(booking_error(&format!(
                "Request to {} failed: HTTP {} - {}",
                url, status, error_body
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| booking_error(&format!("Failed to parse response from {}: {}", url, e)))
    }
}

#[async_trait]
impl BookingSource for HttpBookingSource {
    async fn event_info(&self, event_id: &str) -> BotResult<EventInfo> {
        let url = self.endpoint(EVENT_INFO_ENDPOINT, &[("eventId", event_id)])?;
        self.get_json(url).await
    }

    async fn booked_times(&self, event_id: &str, date: NaiveDate) -> BotResult<Vec<String>> {
        let date = crate::utils::time::date_key(date);
        let url = self.endpoint(
            SCHEDULED_MEETINGS_ENDPOINT,
            &[("eventId", event_id), ("date", date.as_str())],
        )?;
        self.get_json(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_urls() {
        let source = HttpBookingSource::new("https://booking.example.com/api", Duration::from_secs(5)).unwrap();
        let url = source
            .endpoint(SCHEDULED_MEETINGS_ENDPOINT, &[("eventId", "7"), ("date", "2024-05-20")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://booking.example.com/api/scheduled-meetings-by-date?eventId=7&date=2024-05-20"
        );

        let url = source.endpoint(EVENT_INFO_ENDPOINT, &[("eventId", "a b")]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://booking.example.com/api/get-event-info?eventId=a+b"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(HttpBookingSource::new("not a url", Duration::from_secs(5)).is_err());
    }
}
