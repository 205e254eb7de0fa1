//! Progress channel between the executor worker and its caller.
//!
//! One producer, one consumer, bounded. Log lines and the terminal event are
//! sent with back-pressure and never dropped; progress, status and transform
//! fraction events are best effort and are coalesced away when the channel
//! is full. A buffered sender collects events in memory instead, for runs on
//! the caller's own thread.

use crate::models::outcome::TerminalEvent;
use crate::utils::format::format_eta;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, error::TrySendError};

/// Number of samples in the items-per-second moving average.
const RATE_WINDOW: usize = 20;

/// Event emitted by a running batch.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Timestamped, human-readable line for one operation.
    Log(String),
    /// Periodic progress.
    Progress {
        completed: usize,
        total: usize,
        percent: u8,
        eta: Option<Duration>,
    },
    /// Periodic status text.
    Status(String),
    /// Fraction reported by a long-running transform, forwarded as is.
    ItemFraction { index: usize, fraction: f32 },
    /// The run ended. Sent exactly once.
    Done(Box<TerminalEvent>),
}

/// Create a progress channel.
pub fn channel(capacity: usize) -> (ProgressSender, ProgressReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        ProgressSender {
            outlet: Outlet::Channel(tx),
            coalesced: 0,
        },
        ProgressReceiver { rx },
    )
}

/// Where a sender delivers events.
#[derive(Debug)]
enum Outlet {
    Channel(mpsc::Sender<ProgressEvent>),
    /// Kept in memory for a run whose caller reads events afterwards.
    Buffer(Vec<ProgressEvent>),
}

/// Producing half, owned by the worker.
#[derive(Debug)]
pub struct ProgressSender {
    outlet: Outlet,
    coalesced: usize,
}

impl ProgressSender {
    /// A sender that never blocks and keeps every event.
    pub fn buffered() -> Self {
        Self {
            outlet: Outlet::Buffer(Vec::new()),
            coalesced: 0,
        }
    }

    /// Send a log line, waiting for room if needed.
    pub fn log(&mut self, line: String) {
        match &mut self.outlet {
            Outlet::Channel(tx) => {
                if tx.blocking_send(ProgressEvent::Log(line)).is_err() {
                    tracing::debug!("Progress receiver closed, log line not delivered");
                }
            }
            Outlet::Buffer(events) => events.push(ProgressEvent::Log(line)),
        }
    }

    /// Send a best-effort event, dropping it if the channel is full.
    fn offer(&mut self, event: ProgressEvent) {
        match &mut self.outlet {
            Outlet::Channel(tx) => match tx.try_send(event) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => self.coalesced += 1,
                Err(TrySendError::Closed(_)) => {}
            },
            Outlet::Buffer(events) => events.push(event),
        }
    }

    pub fn progress(&mut self, update: &ProgressUpdate) {
        self.offer(ProgressEvent::Progress {
            completed: update.completed,
            total: update.total,
            percent: update.percent,
            eta: update.eta,
        });
        self.offer(ProgressEvent::Status(update.status_text()));
    }

    pub fn fraction(&mut self, index: usize, fraction: f32) {
        self.offer(ProgressEvent::ItemFraction {
            index,
            fraction: fraction.clamp(0.0, 1.0),
        });
    }

    /// Number of best-effort events dropped so far.
    pub fn coalesced(&self) -> usize {
        self.coalesced
    }

    /// Send the terminal event. Consumes the sender so it happens once.
    ///
    /// Returns everything a buffered sender collected, ending with the
    /// terminal event. A channel sender returns nothing.
    pub fn done(self, event: TerminalEvent) -> Vec<ProgressEvent> {
        let done = ProgressEvent::Done(Box::new(event));
        match self.outlet {
            Outlet::Channel(tx) => {
                if tx.blocking_send(done).is_err() {
                    tracing::warn!("Progress receiver closed before the terminal event");
                }
                Vec::new()
            }
            Outlet::Buffer(mut events) => {
                events.push(done);
                events
            }
        }
    }
}

/// Consuming half, owned by the caller.
#[derive(Debug)]
pub struct ProgressReceiver {
    rx: mpsc::Receiver<ProgressEvent>,
}

impl ProgressReceiver {
    /// Poll for the next event without waiting.
    pub fn try_next(&mut self) -> Option<ProgressEvent> {
        self.rx.try_recv().ok()
    }

    /// Take every event currently queued.
    pub fn drain(&mut self) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_next() {
            events.push(event);
        }
        events
    }

    /// Wait for the next event from synchronous code.
    ///
    /// Returns `None` once the worker is gone and the channel is empty.
    pub fn next_blocking(&mut self) -> Option<ProgressEvent> {
        self.rx.blocking_recv()
    }

    /// Wait for the next event from async code.
    pub async fn next(&mut self) -> Option<ProgressEvent> {
        self.rx.recv().await
    }
}

/// Snapshot produced by [`ProgressTracker`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
    pub eta: Option<Duration>,
}

impl ProgressUpdate {
    pub fn status_text(&self) -> String {
        let remaining = self.total.saturating_sub(self.completed);
        match self.eta {
            Some(eta) => format!(
                "Processing... ({}/{}, {} remaining, about {} left)",
                self.completed,
                self.total,
                remaining,
                format_eta(eta)
            ),
            None => format!(
                "Processing... ({}/{}, {} remaining)",
                self.completed, self.total, remaining
            ),
        }
    }
}

/// Time-gated progress with a moving-average remaining-time estimate.
#[derive(Debug)]
pub struct ProgressTracker {
    total: usize,
    interval: Duration,
    last_emit: Option<Instant>,
    samples: VecDeque<(Instant, usize)>,
}

impl ProgressTracker {
    pub fn new(total: usize, interval: Duration, start: Instant) -> Self {
        let mut samples = VecDeque::with_capacity(RATE_WINDOW + 1);
        samples.push_back((start, 0));
        Self {
            total,
            interval,
            last_emit: None,
            samples,
        }
    }

    /// Record progress; returns an update when the interval has elapsed or
    /// the batch is complete.
    pub fn update(&mut self, completed: usize, now: Instant) -> Option<ProgressUpdate> {
        self.samples.push_back((now, completed));
        while self.samples.len() > RATE_WINDOW {
            self.samples.pop_front();
        }

        let due = match self.last_emit {
            None => true,
            Some(last) => now.duration_since(last) >= self.interval,
        };
        if !due && completed < self.total {
            return None;
        }
        self.last_emit = Some(now);
        Some(self.snapshot(completed))
    }

    /// Current state regardless of the interval.
    pub fn snapshot(&self, completed: usize) -> ProgressUpdate {
        let percent = if self.total == 0 {
            100
        } else {
            (completed.min(self.total) * 100 / self.total) as u8
        };
        ProgressUpdate {
            completed,
            total: self.total,
            percent,
            eta: self.eta(completed),
        }
    }

    /// Items per second over the sample window.
    pub fn rate(&self) -> Option<f64> {
        let (t0, c0) = *self.samples.front()?;
        let (t1, c1) = *self.samples.back()?;
        let secs = t1.duration_since(t0).as_secs_f64();
        if secs <= 0.0 || c1 <= c0 {
            return None;
        }
        Some((c1 - c0) as f64 / secs)
    }

    fn eta(&self, completed: usize) -> Option<Duration> {
        let rate = self.rate()?;
        let remaining = self.total.saturating_sub(completed) as f64;
        Some(Duration::from_secs_f64(remaining / rate))
    }
}
