use std::time::Duration;

use gloo_timers::callback::Interval;
use langpref_core::{ScheduledTask, Scheduler};

use super::defer_drop;

/// `setInterval` via gloo.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntervalScheduler;

impl Scheduler for IntervalScheduler {
    fn every(&self, period: Duration, tick: Box<dyn FnMut()>) -> Box<dyn ScheduledTask> {
        let millis = u32::try_from(period.as_millis()).unwrap_or(u32::MAX).max(1);
        Box::new(IntervalTask { interval: Some(Interval::new(millis, tick)) })
    }
}

struct IntervalTask {
    interval: Option<Interval>,
}

impl ScheduledTask for IntervalTask {
    fn cancel(&mut self) {
        if let Some(interval) = self.interval.take() {
            // Clears the timer now; the callback may still be on the stack
            defer_drop(interval.cancel());
        }
    }

    fn is_active(&self) -> bool {
        self.interval.is_some()
    }
}

impl Drop for IntervalTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
