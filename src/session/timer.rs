//! Whole-session countdown

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

const TICK: Duration = Duration::from_secs(1);

/// Seconds remaining in the session, counting down once a second
pub struct SessionTimer {
    remaining: Arc<watch::Sender<u32>>,
    task: Option<JoinHandle<()>>,
}

impl SessionTimer {
    /// A stopped timer showing `duration`, rounded up to whole seconds
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        let seconds = u32::try_from(duration.as_secs() + u64::from(duration.subsec_nanos() > 0))
            .unwrap_or(u32::MAX);
        let (remaining, _) = watch::channel(seconds);
        Self {
            remaining: Arc::new(remaining),
            task: None,
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u32> {
        self.remaining.subscribe()
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        *self.remaining.borrow()
    }

    /// Start counting down; `on_expire` runs once when zero is reached
    pub fn start<F>(&mut self, on_expire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.stop();

        let remaining = Arc::clone(&self.remaining);
        self.task = Some(tokio::spawn(async move {
            let mut ticks = tokio::time::interval_at(Instant::now() + TICK, TICK);
            while *remaining.borrow() > 0 {
                ticks.tick().await;
                remaining.send_modify(|s| *s = s.saturating_sub(1));
            }
            tracing::info!("session timer expired");
            on_expire();
        }));
    }

    /// Freeze the countdown; idempotent
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::oneshot;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn counts_down_and_expires() {
        let mut timer = SessionTimer::new(Duration::from_secs(3));
        let (tx, rx) = oneshot::channel();

        timer.start(move || {
            let _ = tx.send(());
        });

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(timer.remaining(), 2);

        rx.await.unwrap();
        assert_eq!(timer.remaining(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_freezes_countdown() {
        let mut timer = SessionTimer::new(Duration::from_millis(2500));
        assert_eq!(timer.remaining(), 3);

        let (tx, rx) = oneshot::channel::<()>();
        timer.start(move || {
            let _ = tx.send(());
        });

        tokio::time::sleep(Duration::from_millis(1100)).await;
        timer.stop();
        timer.stop();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(timer.remaining(), 2);
        assert!(rx.await.is_err());
    }
}
