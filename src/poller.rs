//! Background connect / refresh task
//!
//! The poller owns a `ReadingSource`, connects once (with injected latency),
//! then refreshes every `refresh_interval_minutes` until shut down. State is
//! published on a watch channel; lifecycle events go out on an mpsc channel.
//! Shutting down cancels whatever is pending: the connect delay, a refresh
//! delay or the wait for the next tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local};
use log::{debug, info, warn};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};

use crate::archive::ReadingStore;
use crate::config::Settings;
use crate::error::GlucoseError;
use crate::source::ReadingSource;

/// Simulated round-trip delays of the upstream feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latency {
    pub connect: Duration,
    pub refresh: Duration,
}

impl Default for Latency {
    fn default() -> Self {
        Self {
            connect: Duration::from_millis(2000),
            refresh: Duration::from_millis(1500),
        }
    }
}

/// What the screens render from
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub store: Arc<ReadingStore>,
    pub connected: bool,
    pub loading: bool,
    pub last_updated: Option<DateTime<FixedOffset>>,
}

/// Message from the poller task to the front end
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    Connecting,
    Connected { readings: usize },
    Refreshed { readings: usize },
    Failed(String),
}

pub struct Poller<S> {
    source: S,
    settings: Settings,
    latency: Latency,
}

impl<S: ReadingSource + 'static> Poller<S> {
    pub fn new(source: S, settings: Settings) -> Self {
        Self { source, settings, latency: Latency::default() }
    }

    pub fn with_latency(mut self, latency: Latency) -> Self {
        self.latency = latency;
        self
    }

    /// Start the task on the current tokio runtime
    pub fn spawn(self) -> PollerHandle {
        let (state_tx, state_rx) = watch::channel(DashboardState::default());
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (refresh_tx, refresh_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(self.run(state_tx, event_tx, refresh_rx, shutdown_rx));

        PollerHandle {
            state: state_rx,
            events: event_rx,
            refresh: refresh_tx,
            shutdown: shutdown_tx,
            task,
        }
    }

    async fn run(
        mut self,
        state: watch::Sender<DashboardState>,
        events: mpsc::UnboundedSender<PollEvent>,
        mut refresh_requests: mpsc::Receiver<()>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), GlucoseError> {
        let period = self.settings.refresh_interval();
        info!(
            "Connecting to {} source, refresh every {} min",
            self.source.name(),
            self.settings.refresh_interval_minutes
        );

        // Connect, retrying once per refresh period until it works
        loop {
            let _ = events.send(PollEvent::Connecting);
            state.send_modify(|s| s.loading = true);

            if !wait(&mut shutdown, self.latency.connect).await {
                return Ok(());
            }
            match self.fetch_into(&state) {
                Ok(readings) => {
                    state.send_modify(|s| s.connected = true);
                    let _ = events.send(PollEvent::Connected { readings });
                    break;
                }
                Err(e) => {
                    warn!("Connect to {} source failed: {}", self.source.name(), e);
                    state.send_modify(|s| s.loading = false);
                    let _ = events.send(PollEvent::Failed(e.to_string()));
                    if !wait(&mut shutdown, period).await {
                        return Ok(());
                    }
                }
            }
        }

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancelled(&mut shutdown) => break,
                _ = ticker.tick() => debug!("Scheduled refresh"),
                Some(()) = refresh_requests.recv() => debug!("Manual refresh"),
            }

            state.send_modify(|s| s.loading = true);
            if !wait(&mut shutdown, self.latency.refresh).await {
                break;
            }
            match self.fetch_into(&state) {
                Ok(readings) => {
                    let _ = events.send(PollEvent::Refreshed { readings });
                }
                Err(e) => {
                    warn!("Refresh from {} source failed: {}", self.source.name(), e);
                    state.send_modify(|s| s.loading = false);
                    let _ = events.send(PollEvent::Failed(e.to_string()));
                }
            }
        }

        info!("Poller stopped");
        Ok(())
    }

    /// Fetch and publish a snapshot; returns today's reading count
    fn fetch_into(&mut self, state: &watch::Sender<DashboardState>) -> Result<usize, GlucoseError> {
        let now = Local::now().fixed_offset();
        let store = self.source.fetch(now)?;
        let readings = store.today.len();

        state.send_modify(|s| {
            s.store = Arc::new(store);
            s.loading = false;
            s.last_updated = Some(now);
        });
        Ok(readings)
    }
}

/// Resolves once shutdown is requested or the handle is gone
async fn cancelled(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

/// Sleep unless cancelled first; false means stop
async fn wait(shutdown: &mut watch::Receiver<bool>, duration: Duration) -> bool {
    tokio::select! {
        _ = cancelled(shutdown) => false,
        _ = sleep(duration) => true,
    }
}

/// Front-end side of a running poller
pub struct PollerHandle {
    state: watch::Receiver<DashboardState>,
    events: mpsc::UnboundedReceiver<PollEvent>,
    refresh: mpsc::Sender<()>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<Result<(), GlucoseError>>,
}

impl PollerHandle {
    /// Latest published state
    pub fn state(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    #[allow(dead_code)]
    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.clone()
    }

    pub async fn next_event(&mut self) -> Option<PollEvent> {
        self.events.recv().await
    }

    /// Ask for an immediate refresh; ignored while one is already queued
    pub fn request_refresh(&self) -> Result<(), GlucoseError> {
        match self.refresh.try_send(()) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(())) => Ok(()),
            Err(mpsc::error::TrySendError::Closed(())) => Err(GlucoseError::Cancelled),
        }
    }

    /// Cancel anything pending and wait for the task to finish
    pub async fn shutdown(self) -> Result<(), GlucoseError> {
        let _ = self.shutdown.send(true);
        self.task
            .await
            .map_err(|e| GlucoseError::Connection(format!("poller task failed: {}", e)))?
    }
}
