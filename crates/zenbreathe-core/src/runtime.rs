//! Async driver that ticks a [`SessionPlayer`] on a tokio interval.
//!
//! There is never more than one ticker task. Spawning always aborts the
//! previous handle first, and pause, stop and close tear the ticker down.
//! Every event the player produces, from commands or ticks, is forwarded on
//! an unbounded channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::debug;

use crate::breath::{Clock, SystemClock};
use crate::events::Event;
use crate::session::SessionPlayer;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Clock driven by tokio's monotonic time, anchored to the epoch at creation.
///
/// It follows tokio's paused test clock.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    anchor: Instant,
    anchor_ms: u64,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            anchor: Instant::now(),
            anchor_ms: SystemClock.now_ms(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now_ms(&self) -> u64 {
        self.anchor_ms + Instant::now().duration_since(self.anchor).as_millis() as u64
    }
}

pub struct SessionDriver {
    player: Arc<Mutex<SessionPlayer>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    tick_interval: Duration,
    events: mpsc::UnboundedSender<Event>,
}

impl SessionDriver {
    pub fn new(
        player: SessionPlayer,
        tick_interval: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let tick_interval = if tick_interval.is_zero() {
            DEFAULT_TICK_INTERVAL
        } else {
            tick_interval
        };
        let driver = Self {
            player: Arc::new(Mutex::new(player)),
            ticker: Mutex::new(None),
            tick_interval,
            events: tx,
        };
        (driver, rx)
    }

    pub fn player(&self) -> Arc<Mutex<SessionPlayer>> {
        Arc::clone(&self.player)
    }

    /// Whether a ticker task is alive.
    pub async fn is_ticking(&self) -> bool {
        self.ticker
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub async fn snapshot(&self) -> Event {
        self.player.lock().await.snapshot()
    }

    pub async fn start(&self) {
        let events = self.player.lock().await.begin();
        self.forward(events);
        self.spawn_ticker().await;
    }

    pub async fn pause(&self) {
        self.cancel_ticker().await;
        let event = self.player.lock().await.pause();
        self.forward(event);
    }

    pub async fn resume(&self) {
        let event = self.player.lock().await.resume();
        let resumed = event.is_some();
        self.forward(event);
        if resumed {
            self.spawn_ticker().await;
        }
    }

    pub async fn stop(&self) {
        self.cancel_ticker().await;
        let event = self.player.lock().await.stop();
        self.forward(event);
    }

    pub async fn close(&self) {
        self.cancel_ticker().await;
        let events = self.player.lock().await.close();
        self.forward(events);
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let player = Arc::clone(&self.player);
        let tx = self.events.clone();
        let period = self.tick_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let (events, active) = {
                    let mut player = player.lock().await;
                    let events = player.tick();
                    (events, player.is_active())
                };
                for event in events {
                    if tx.send(event).is_err() {
                        return;
                    }
                }
                if !active {
                    debug!("session inactive, ticker exiting");
                    break;
                }
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }

    fn forward(&self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            if self.events.send(event).is_err() {
                debug!("event receiver dropped");
                return;
            }
        }
    }
}
