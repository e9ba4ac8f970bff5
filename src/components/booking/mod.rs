mod actor;
pub mod calculator;
pub mod client;
mod handle;
pub mod models;
pub mod render;
pub mod time;
pub mod view;

pub use actor::Navigation;
pub use client::{BookingSource, HttpBookingSource};
pub use handle::BookingHandle;
pub use models::{BookingSelection, EventContainerAvailability, EventInfo};
pub use view::{Stage, ViewState};

use crate::config::Config;
use crate::error::BotResult;
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Booking component letting facilitators book event container slots
#[derive(Default)]
pub struct Booking {
    handle: RwLock<Option<BookingHandle>>,
}

impl Booking {
    /// Create a new Booking component
    pub fn new() -> Self {
        Self {
            handle: RwLock::new(None),
        }
    }

    /// Get the handle if it exists
    pub async fn get_handle(&self) -> Option<BookingHandle> {
        let handle_lock = self.handle.read().await;
        handle_lock.clone()
    }
}

/// Create a standalone handle talking to the configured booking server
pub async fn connect(config: Arc<RwLock<Config>>) -> BotResult<BookingHandle> {
    let source = {
        let config_read = config.read().await;
        HttpBookingSource::from_config(&config_read)?
    };
    Ok(BookingHandle::new(config, Arc::new(source)))
}

#[async_trait]
impl super::Component for Booking {
    fn name(&self) -> &'static str {
        "booking"
    }

    async fn init(&self, _ctx: &serenity::Context, config: Arc<RwLock<Config>>) -> BotResult<()> {
        // Create a new handle if one doesn't exist
        let mut handle_lock = self.handle.write().await;
        if handle_lock.is_none() {
            let booking_api_url = config.read().await.booking_api_url.clone();
            info!("Connecting booking component to {}", booking_api_url);
            *handle_lock = Some(connect(config).await?);
        }
        Ok(())
    }

    async fn shutdown(&self) -> BotResult<()> {
        // Shutdown the handle if it exists
        let handle_lock = self.handle.read().await;
        if let Some(handle) = &*handle_lock {
            handle.shutdown().await?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
