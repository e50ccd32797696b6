use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Interval used for live badge repaints while a run is in flight.
pub const TICK_PERIOD: Duration = Duration::from_millis(100);

pub type RepaintFn = dyn Fn() + Send + Sync;

/// Seam between the lifecycle controller and the periodic repaint task.
/// `stop` must tolerate being called without a prior `start`.
pub trait Ticker: Send {
    fn start(&mut self);
    fn stop(&mut self);
}

/// Ticker that never ticks; used where no live repaint is wanted.
#[derive(Debug, Default)]
pub struct NullTicker;

impl Ticker for NullTicker {
    fn start(&mut self) {}
    fn stop(&mut self) {}
}

/// Periodic repaint request task. It performs no state mutation; the
/// repaint callback only asks the host to redraw live counters.
pub struct RepaintTick {
    repaint: Arc<RepaintFn>,
    period: Duration,
    task_handle: Option<JoinHandle<()>>,
}

impl RepaintTick {
    pub fn new<F>(repaint: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::with_period(repaint, TICK_PERIOD)
    }

    pub fn with_period<F>(repaint: F, period: Duration) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            repaint: Arc::new(repaint),
            period,
            task_handle: None,
        }
    }
}

impl Ticker for RepaintTick {
    /// Starting again replaces the running task, so a new run implicitly
    /// cancels the previous run's tick.
    fn start(&mut self) {
        self.stop();

        let repaint = self.repaint.clone();
        let period = self.period;
        self.task_handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                (repaint)();
            }
        }));
    }

    fn stop(&mut self) {
        if let Some(task_handle) = self.task_handle.take() {
            task_handle.abort();
        }
    }
}

impl Drop for RepaintTick {
    fn drop(&mut self) {
        self.stop();
    }
}
