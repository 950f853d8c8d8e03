//! Silence watchdog
//!
//! A single cancelable countdown. The remaining-seconds readout ticks once a
//! second for display; expiry is scheduled independently at the full timeout
//! and fires at most once per arm.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

const TICK: Duration = Duration::from_secs(1);

/// Deadline offset used when `start + timeout` does not fit in an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Cancelable silence countdown with a live seconds-remaining readout
pub struct SilenceWatchdog {
    remaining: Arc<watch::Sender<Option<u32>>>,
    generation: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl SilenceWatchdog {
    #[must_use]
    pub fn new() -> Self {
        let (remaining, _) = watch::channel(None);
        Self {
            remaining: Arc::new(remaining),
            generation: Arc::new(AtomicU64::new(0)),
            task: None,
        }
    }

    /// Follow the seconds remaining; `None` while disarmed
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<u32>> {
        self.remaining.subscribe()
    }

    #[must_use]
    pub fn remaining(&self) -> Option<u32> {
        *self.remaining.borrow()
    }

    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.task.is_some()
    }

    /// Whether `generation` belongs to the live arm
    #[must_use]
    pub fn is_current(&self, generation: u64) -> bool {
        self.task.is_some() && self.generation.load(Ordering::SeqCst) == generation
    }

    /// Start a fresh countdown, cancelling any previous one
    ///
    /// `on_expire` receives the arm's generation and runs only if the
    /// watchdog is still on that generation when `timeout` elapses.
    pub fn arm<F>(&mut self, timeout: Duration, on_expire: F) -> u64
    where
        F: FnOnce(u64) + Send + 'static,
    {
        self.disarm();

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let seconds = u32::try_from(timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0))
            .unwrap_or(u32::MAX);
        self.remaining.send_replace(Some(seconds));

        let remaining = Arc::clone(&self.remaining);
        let current = Arc::clone(&self.generation);

        self.task = Some(tokio::spawn(async move {
            let start = Instant::now();
            let deadline = start
                .checked_add(timeout)
                .unwrap_or_else(|| start + FAR_FUTURE);
            let mut ticks = tokio::time::interval_at(start + TICK, TICK);

            loop {
                tokio::select! {
                    biased;
                    () = tokio::time::sleep_until(deadline) => break,
                    _ = ticks.tick() => {
                        remaining.send_if_modified(|left| {
                            if current.load(Ordering::SeqCst) != generation {
                                return false;
                            }
                            match left {
                                Some(s) if *s > 0 => {
                                    *s -= 1;
                                    true
                                }
                                _ => false,
                            }
                        });
                    }
                }
            }

            if current.load(Ordering::SeqCst) == generation {
                remaining.send_if_modified(|left| {
                    let changed = *left != Some(0);
                    *left = Some(0);
                    changed
                });
                tracing::debug!(generation, "silence watchdog expired");
                on_expire(generation);
            }
        }));

        tracing::trace!(generation, seconds, "silence watchdog armed");
        generation
    }

    /// Cancel the countdown; idempotent
    pub fn disarm(&mut self) {
        if let Some(task) = self.task.take() {
            self.generation.fetch_add(1, Ordering::SeqCst);
            task.abort();
            tracing::trace!("silence watchdog disarmed");
        }
        self.remaining.send_if_modified(|left| left.take().is_some());
    }
}

impl Default for SilenceWatchdog {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SilenceWatchdog {
    fn drop(&mut self) {
        self.disarm();
    }
}
