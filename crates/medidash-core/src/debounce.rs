//! Input debouncing for free-text search.
//!
//! A value is committed only after `delay` has passed without another input;
//! every input restarts the wait, so intermediate values are never published.
//!
//! [`Debounce`] is the clock-driven state machine used by table state.
//! [`spawn_debounced`] wraps the same rule in a tokio task for push-style
//! consumers.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

/// Delay applied to search boxes.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Pending/committed pair driven by explicit timestamps.
#[derive(Debug, Clone)]
pub struct Debounce<T> {
    delay: Duration,
    raw: T,
    committed: T,
    deadline: Option<Instant>,
}

impl<T: Clone + PartialEq> Debounce<T> {
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            delay,
            raw: initial.clone(),
            committed: initial,
            deadline: None,
        }
    }

    /// Records a new raw value at `now`, restarting the quiet period.
    pub fn input(&mut self, value: T, now: Instant) {
        self.raw = value;
        self.deadline = Some(now + self.delay);
    }

    /// Commits the raw value if the quiet period is over.
    ///
    /// Returns the newly committed value only when it differs from the
    /// previous one.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        self.deadline = None;
        if self.raw == self.committed {
            return None;
        }
        self.committed = self.raw.clone();
        Some(self.committed.clone())
    }

    /// When the pending value will commit, if one is pending.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Latest input, as typed.
    pub fn raw(&self) -> &T {
        &self.raw
    }

    /// Last committed value.
    pub fn current(&self) -> &T {
        &self.committed
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// Sending half of a spawned debouncer.
#[derive(Debug, Clone)]
pub struct DebounceInput<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T> DebounceInput<T> {
    /// Feeds a raw value. Returns `false` once the debouncer task has stopped.
    pub fn send(&self, value: T) -> bool {
        self.tx.send(value).is_ok()
    }
}

/// Spawns a task that republishes inputs on the returned watch channel after
/// `delay` of quiet.
///
/// Dropping every [`DebounceInput`] ends the task. A value still pending at
/// that point is published when its quiet period would have elapsed, never
/// earlier.
pub fn spawn_debounced<T>(initial: T, delay: Duration) -> (DebounceInput<T>, watch::Receiver<T>)
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<T>();
    let (out_tx, out_rx) = watch::channel(initial.clone());

    tokio::spawn(async move {
        let mut state = Debounce::new(initial, delay);

        loop {
            let sleep_until = state.deadline();
            tokio::select! {
                received = rx.recv() => match received {
                    Some(value) => state.input(value, Instant::now()),
                    None => {
                        // No more input can restart the wait, so the pending
                        // value commits once its quiet period runs out.
                        if let Some(deadline) = state.deadline() {
                            tokio::time::sleep_until(deadline).await;
                            if let Some(value) = state.poll(deadline) {
                                out_tx.send_replace(value);
                            }
                        }
                        tracing::trace!("Debounce input closed");
                        break;
                    }
                },
                _ = async {
                    match sleep_until {
                        Some(deadline) => tokio::time::sleep_until(deadline).await,
                        None => std::future::pending::<()>().await,
                    }
                } => {
                    if let Some(value) = state.poll(Instant::now()) {
                        out_tx.send_replace(value);
                    }
                }
            }
        }
    });

    (DebounceInput { tx }, out_rx)
}
