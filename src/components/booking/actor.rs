use super::client::BookingSource;
use super::models::{BookedTimes, BookingSelection, EventContainerAvailability, EventInfo};
use super::view::{BookedTimesRequest, ViewState};
use crate::config::Config;
use crate::error::{component_error, selection_error, BotResult, Error};
use crate::utils::time::today_in;
use chrono_tz::Tz;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Calendar navigation requested by a facilitator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Months(i32),
    Years(i32),
}

type Respond<T> = mpsc::Sender<BotResult<T>>;

/// Commands that can be sent to the booking actor
pub enum BookingCommand {
    Open(u64, String, Respond<ViewState>),
    Navigate(u64, Navigation, Respond<ViewState>),
    SelectDate(u64, u32, Respond<ViewState>),
    SelectSlot(u64, usize, Respond<ViewState>),
    Confirm(u64, Respond<(BookingSelection, ViewState)>),
    Back(u64, Respond<ViewState>),
    View(u64, Respond<ViewState>),
    Close(u64, Respond<()>),
    /// Metadata fetch for `Open` finished, tagged with the user's open counter
    EventInfoLoaded(u64, String, u64, BotResult<EventInfo>, Respond<ViewState>),
    /// Booked-times fetch for `SelectDate` finished
    BookedTimesLoaded(u64, BookedTimesRequest, BotResult<Vec<String>>),
    Shutdown,
}

/// Handle for communicating with the booking actor
#[derive(Clone)]
pub struct BookingActorHandle {
    command_tx: mpsc::Sender<BookingCommand>,
}

impl BookingActorHandle {
    async fn request<T>(&self, command: impl FnOnce(Respond<T>) -> BookingCommand) -> BotResult<T> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(command(response_tx))
            .await
            .map_err(|e| component_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| component_error("Response channel closed"))?
    }

    /// Start a booking session for an event container
    ///
    /// An existing session is only replaced once the new one has loaded.
    pub async fn open(&self, user_id: u64, event_id: impl Into<String>) -> BotResult<ViewState> {
        let event_id = event_id.into();
        self.request(|tx| BookingCommand::Open(user_id, event_id, tx)).await
    }

    /// Move the visible month
    pub async fn navigate(&self, user_id: u64, navigation: Navigation) -> BotResult<ViewState> {
        self.request(|tx| BookingCommand::Navigate(user_id, navigation, tx)).await
    }

    /// Select a day and wait until booked slots for the latest selection are known
    pub async fn select_date(&self, user_id: u64, day: u32) -> BotResult<ViewState> {
        self.request(|tx| BookingCommand::SelectDate(user_id, day, tx)).await
    }

    /// Select a time slot by index
    pub async fn select_slot(&self, user_id: u64, index: usize) -> BotResult<ViewState> {
        self.request(|tx| BookingCommand::SelectSlot(user_id, index, tx)).await
    }

    /// Confirm the selection and get the booking handoff
    pub async fn confirm(&self, user_id: u64) -> BotResult<(BookingSelection, ViewState)> {
        self.request(|tx| BookingCommand::Confirm(user_id, tx)).await
    }

    /// Step back from confirmation
    pub async fn back(&self, user_id: u64) -> BotResult<ViewState> {
        self.request(|tx| BookingCommand::Back(user_id, tx)).await
    }

    /// Current view of a session
    pub async fn view(&self, user_id: u64) -> BotResult<ViewState> {
        self.request(|tx| BookingCommand::View(user_id, tx)).await
    }

    /// End a session
    pub async fn close(&self, user_id: u64) -> BotResult<()> {
        self.request(|tx| BookingCommand::Close(user_id, tx)).await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> BotResult<()> {
        let _ = self.command_tx.send(BookingCommand::Shutdown).await;
        Ok(())
    }
}

/// One facilitator's booking in progress
struct Session {
    view: ViewState,
    in_flight: Option<CancellationToken>,
    /// Callers waiting for the booked times of the current selection
    waiters: Vec<Respond<ViewState>>,
}

impl Session {
    fn new(view: ViewState) -> Self {
        Self {
            view,
            in_flight: None,
            waiters: Vec::new(),
        }
    }

    fn cancel_in_flight(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }

    /// Answer every parked caller with the current view
    async fn release_waiters(&mut self) {
        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(Ok(self.view.clone())).await;
        }
    }

    async fn fail_waiters(&mut self, message: &str) {
        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(Err(selection_error(message))).await;
        }
    }
}

/// The booking actor owning every facilitator's view state
pub struct BookingActor {
    config: Arc<RwLock<Config>>,
    source: Arc<dyn BookingSource>,
    sessions: HashMap<u64, Session>,
    /// Latest `Open` request per user
    opens: HashMap<u64, u64>,
    mailbox: mpsc::WeakSender<BookingCommand>,
    command_rx: mpsc::Receiver<BookingCommand>,
}

impl BookingActor {
    /// Create a new actor and return its handle
    pub fn new(
        config: Arc<RwLock<Config>>,
        source: Arc<dyn BookingSource>,
    ) -> (Self, BookingActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);

        let actor = Self {
            config,
            source,
            sessions: HashMap::new(),
            opens: HashMap::new(),
            mailbox: command_tx.downgrade(),
            command_rx,
        };

        let handle = BookingActorHandle { command_tx };

        (actor, handle)
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Booking actor started");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                BookingCommand::Open(user_id, event_id, response_tx) => {
                    self.open(user_id, event_id, response_tx);
                }
                BookingCommand::EventInfoLoaded(user_id, event_id, open_id, result, response_tx) => {
                    let result = self
                        .event_info_loaded(user_id, event_id, open_id, result)
                        .await;
                    let _ = response_tx.send(result).await;
                }
                BookingCommand::Navigate(user_id, navigation, response_tx) => {
                    let result = self.navigate(user_id, navigation).await;
                    let _ = response_tx.send(result).await;
                }
                BookingCommand::SelectDate(user_id, day, response_tx) => {
                    if let Err(e) = self.select_date(user_id, day, response_tx.clone()) {
                        let _ = response_tx.send(Err(e)).await;
                    }
                }
                BookingCommand::BookedTimesLoaded(user_id, request, result) => {
                    self.booked_times_loaded(user_id, request, result).await;
                }
                BookingCommand::SelectSlot(user_id, index, response_tx) => {
                    let result = self.with_session(user_id, |view| {
                        view.select_slot(index)?;
                        Ok(view.clone())
                    });
                    let _ = response_tx.send(result).await;
                }
                BookingCommand::Confirm(user_id, response_tx) => {
                    let result = self.with_session(user_id, |view| {
                        let selection = view.confirm()?;
                        info!(
                            "User {} confirmed {} {} for event {}",
                            user_id, selection.date, selection.time, selection.event_id
                        );
                        Ok((selection, view.clone()))
                    });
                    let _ = response_tx.send(result).await;
                }
                BookingCommand::Back(user_id, response_tx) => {
                    let result = self.with_session(user_id, |view| {
                        view.back()?;
                        Ok(view.clone())
                    });
                    let _ = response_tx.send(result).await;
                }
                BookingCommand::View(user_id, response_tx) => {
                    let result = self.with_session(user_id, |view| Ok(view.clone()));
                    let _ = response_tx.send(result).await;
                }
                BookingCommand::Close(user_id, response_tx) => {
                    // A pending open must not bring the session back
                    if let Some(counter) = self.opens.get_mut(&user_id) {
                        *counter += 1;
                    }
                    if let Some(mut session) = self.sessions.remove(&user_id) {
                        session.cancel_in_flight();
                        session.fail_waiters("Booking was cancelled").await;
                        debug!("Closed booking session for user {}", user_id);
                    }
                    let _ = response_tx.send(Ok(())).await;
                }
                BookingCommand::Shutdown => {
                    info!("Booking actor shutting down");
                    break;
                }
            }
        }

        for session in self.sessions.values_mut() {
            session.cancel_in_flight();
        }

        info!("Booking actor shut down");
    }

    /// Spawn the metadata fetch for a new session, tagged so only the latest
    /// open of a user can take effect
    fn open(&mut self, user_id: u64, event_id: String, response_tx: Respond<ViewState>) {
        let open_id = {
            let counter = self.opens.entry(user_id).or_insert(0);
            *counter += 1;
            *counter
        };
        debug!("User {} opening event {} (open {})", user_id, event_id, open_id);

        let source = Arc::clone(&self.source);
        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            let result = source.event_info(&event_id).await;
            if let Some(tx) = mailbox.upgrade() {
                let _ = tx
                    .send(BookingCommand::EventInfoLoaded(
                        user_id,
                        event_id,
                        open_id,
                        result,
                        response_tx,
                    ))
                    .await;
            }
        });
    }

    async fn event_info_loaded(
        &mut self,
        user_id: u64,
        event_id: String,
        open_id: u64,
        result: BotResult<EventInfo>,
    ) -> BotResult<ViewState> {
        if self.opens.get(&user_id) != Some(&open_id) {
            debug!(
                "Discarding event info for {} (open {} superseded)",
                event_id, open_id
            );
            return Err(selection_error("Another booking was opened or this one was cancelled"));
        }

        let info = result.map_err(|e| {
            warn!("Failed to fetch event info for {}: {}", event_id, e);
            e
        })?;

        let (default_tz, clock, year_window) = {
            let config = self.config.read().await;
            let default_tz = config.timezone.parse::<Tz>().unwrap_or_else(|_| {
                warn!("Invalid TIMEZONE '{}', using UTC", config.timezone);
                chrono_tz::UTC
            });
            (default_tz, config.clock_format, config.year_window)
        };

        let view = EventContainerAvailability::from_event_info(&info, default_tz)
            .and_then(|availability| {
                let today = today_in(&availability.time_zone);
                ViewState::new(event_id.clone(), availability, today, clock, year_window)
            })
            .map_err(|e| {
                if e.is_container_misconfiguration() {
                    error!("Event container {} is misconfigured: {}", event_id, e);
                }
                e
            })?;

        info!(
            "Opened booking session for user {} on event {} ({} slots per day)",
            user_id,
            event_id,
            view.slots.len()
        );
        // The previous session stays usable until the new one is valid
        if let Some(mut previous) = self.sessions.insert(user_id, Session::new(view.clone())) {
            previous.cancel_in_flight();
            previous.fail_waiters("Another booking was opened").await;
        }
        Ok(view)
    }

    async fn navigate(&mut self, user_id: u64, navigation: Navigation) -> BotResult<ViewState> {
        let session = self
            .sessions
            .get_mut(&user_id)
            .ok_or_else(no_session)?;

        session.view.set_today(today_in(&session.view.availability.time_zone));
        let before = session.view.generation;
        match navigation {
            Navigation::Months(offset) => session.view.shift_months(offset),
            Navigation::Years(offset) => session.view.shift_years(offset),
        };

        if session.view.generation != before {
            // The selected date left the screen
            session.cancel_in_flight();
            session.release_waiters().await;
        }
        Ok(session.view.clone())
    }

    /// Select a date, park the caller and spawn the tagged booked-times fetch
    fn select_date(&mut self, user_id: u64, day: u32, response_tx: Respond<ViewState>) -> BotResult<()> {
        let session = self
            .sessions
            .get_mut(&user_id)
            .ok_or_else(no_session)?;

        session.view.set_today(today_in(&session.view.availability.time_zone));
        let request = session.view.select_date(day)?;

        session.cancel_in_flight();
        let token = CancellationToken::new();
        session.in_flight = Some(token.clone());
        session.waiters.push(response_tx);

        debug!(
            "User {} selected {} (generation {})",
            user_id,
            request.date_key(),
            request.generation
        );

        let source = Arc::clone(&self.source);
        let mailbox = self.mailbox.clone();
        let event_id = session.view.event_id.clone();
        tokio::spawn(async move {
            let result = tokio::select! {
                _ = token.cancelled() => {
                    debug!("Booked times fetch for {} cancelled", request.date_key());
                    return;
                }
                result = source.booked_times(&event_id, request.date) => result,
            };
            if let Some(tx) = mailbox.upgrade() {
                let _ = tx
                    .send(BookingCommand::BookedTimesLoaded(user_id, request, result))
                    .await;
            }
        });

        Ok(())
    }

    async fn booked_times_loaded(
        &mut self,
        user_id: u64,
        request: BookedTimesRequest,
        result: BotResult<Vec<String>>,
    ) {
        let Some(session) = self.sessions.get_mut(&user_id) else {
            debug!("Booked times for closed session of user {}", user_id);
            return;
        };

        let booked = result.map(|labels| BookedTimes::from_labels(&labels));
        if session.view.apply_booked_times(request, booked) {
            session.in_flight = None;
            session.release_waiters().await;
        }
    }

    fn with_session<T>(
        &mut self,
        user_id: u64,
        f: impl FnOnce(&mut ViewState) -> BotResult<T>,
    ) -> BotResult<T> {
        let session = self
            .sessions
            .get_mut(&user_id)
            .ok_or_else(no_session)?;
        f(&mut session.view)
    }
}

fn no_session() -> Error {
    selection_error("No booking in progress, open one first")
}
