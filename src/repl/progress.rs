//! Startup loading indicator
//!
//! A background task ticks a spinner while the caller awaits slow startup
//! work. The only shared state is the stop signal, and the task is always
//! joined before the caller continues.

use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

/// Spinner refresh interval
pub const TICK_INTERVAL: Duration = Duration::from_millis(300);

/// Running spinner task
pub struct LoadingIndicator {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<u64>,
}

impl LoadingIndicator {
    /// Start ticking `message`
    pub fn start(message: &str) -> Self {
        Self::start_with(message, spinner())
    }

    /// Start ticking on a given bar (hidden bars in tests)
    pub fn start_with(message: &str, bar: ProgressBar) -> Self {
        bar.set_message(message.to_string());
        let (stop, mut stopped) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            let mut ticks = 0u64;
            loop {
                tokio::select! {
                    // a dropped sender counts as a stop
                    _ = &mut stopped => break,
                    _ = interval.tick() => {
                        bar.tick();
                        ticks += 1;
                    }
                }
            }
            bar.finish_and_clear();
            ticks
        });

        Self { stop, handle }
    }

    /// Signal the task and wait for it; returns the number of ticks drawn
    pub async fn stop(self) -> u64 {
        let _ = self.stop.send(());
        match self.handle.await {
            Ok(ticks) => ticks,
            Err(e) => {
                debug!("loading indicator task failed: {}", e);
                0
            }
        }
    }
}

/// Run `work` with a spinner, stopping it whether `work` succeeds or fails
pub async fn with_loading<F, T>(message: &str, work: F) -> T
where
    F: Future<Output = T>,
{
    let indicator = LoadingIndicator::start(message);
    let output = work.await;
    indicator.stop().await;
    output
}

fn spinner() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar
}
