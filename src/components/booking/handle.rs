use super::actor::{BookingActor, BookingActorHandle, Navigation};
use super::client::BookingSource;
use super::models::BookingSelection;
use super::view::ViewState;
use crate::config::Config;
use crate::error::BotResult;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Handle for interacting with the booking actor
#[derive(Clone)]
pub struct BookingHandle {
    actor_handle: BookingActorHandle,
    _actor_task: Arc<JoinHandle<()>>,
}

impl BookingHandle {
    /// Create a new BookingHandle and spawn the actor
    pub fn new(config: Arc<RwLock<Config>>, source: Arc<dyn BookingSource>) -> Self {
        // Create the actor and get its handle
        let (mut actor, handle) = BookingActor::new(config, source);

        // Spawn a task to run the actor
        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Self {
            actor_handle: handle,
            _actor_task: Arc::new(actor_task),
        }
    }

    /// Start booking against an event container
    pub async fn open(&self, user_id: u64, event_id: impl Into<String>) -> BotResult<ViewState> {
        self.actor_handle.open(user_id, event_id).await
    }

    /// Move the calendar by whole months
    pub async fn shift_months(&self, user_id: u64, offset: i32) -> BotResult<ViewState> {
        self.actor_handle
            .navigate(user_id, Navigation::Months(offset))
            .await
    }

    /// Move the calendar by whole years
    pub async fn shift_years(&self, user_id: u64, offset: i32) -> BotResult<ViewState> {
        self.actor_handle
            .navigate(user_id, Navigation::Years(offset))
            .await
    }

    /// Select a day of the visible month
    pub async fn select_date(&self, user_id: u64, day: u32) -> BotResult<ViewState> {
        self.actor_handle.select_date(user_id, day).await
    }

    /// Select a time slot by its 0-based index
    pub async fn select_slot(&self, user_id: u64, index: usize) -> BotResult<ViewState> {
        self.actor_handle.select_slot(user_id, index).await
    }

    /// Confirm and hand off the selected date and time
    pub async fn confirm(&self, user_id: u64) -> BotResult<(BookingSelection, ViewState)> {
        self.actor_handle.confirm(user_id).await
    }

    /// Go back from confirmation to time selection
    pub async fn back(&self, user_id: u64) -> BotResult<ViewState> {
        self.actor_handle.back(user_id).await
    }

    /// Current view of a booking
    pub async fn view(&self, user_id: u64) -> BotResult<ViewState> {
        self.actor_handle.view(user_id).await
    }

    /// Cancel a booking in progress
    pub async fn close(&self, user_id: u64) -> BotResult<()> {
        self.actor_handle.close(user_id).await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> BotResult<()> {
        self.actor_handle.shutdown().await
    }
}
