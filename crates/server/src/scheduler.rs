use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use slotwatch_core::config::SchedulerConfig;
use slotwatch_core::cycle::CycleTrigger;

use crate::cycle::CycleRunner;

/// Interval trigger loop. Ticks are spaced by `period` regardless of how long
/// a cycle takes; a late tick is delayed rather than bursted.
pub struct IntervalScheduler {
    runner: Arc<CycleRunner>,
    period: Duration,
    run_on_startup: bool,
}

impl IntervalScheduler {
    pub fn new(runner: Arc<CycleRunner>, period: Duration, run_on_startup: bool) -> Self {
        Self { runner, period, run_on_startup }
    }

    pub fn from_config(runner: Arc<CycleRunner>, config: &SchedulerConfig) -> Self {
        Self::new(runner, Duration::from_secs(config.interval_hours * 3_600), config.run_on_startup)
    }

    pub async fn run(&self) {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately.
        interval.tick().await;

        info!(
            event_name = "scheduler.started",
            period_secs = self.period.as_secs(),
            run_on_startup = self.run_on_startup,
            "interval scheduler started"
        );

        if self.run_on_startup {
            self.fire(CycleTrigger::Startup).await;
        }

        loop {
            interval.tick().await;
            self.fire(CycleTrigger::Interval).await;
        }
    }

    /// Runs one triggered cycle on its own task. Cancelling the scheduler
    /// leaves that task running; shutdown waits for it through the gate.
    async fn fire(&self, trigger: CycleTrigger) {
        let runner = self.runner.clone();
        let cycle = tokio::spawn(async move { runner.trigger(trigger).await });
        if let Err(err) = cycle.await {
            warn!(
                event_name = "scheduler.cycle_aborted",
                trigger = trigger.as_str(),
                error = %err,
                "scheduled cycle task ended abnormally"
            );
        }
    }
}
