//! Synthesis scheduling.
//!
//! Due-ness is decided from the injected clock so tests drive passes by
//! advancing a `ManualClock`. `run_synthesis_loop` is the wall-clock driver
//! for hosts that want periodic passes without polling `tick()` themselves.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::engine::ContextEngine;

/// How often the driver asks the engine whether a pass is due (1 second).
/// The configured interval decides whether anything actually runs.
pub const POLL_INTERVAL: StdDuration = StdDuration::from_secs(1);

#[derive(Debug, Clone)]
pub struct SynthesisSchedule {
    interval: Duration,
    last_run: Option<DateTime<Utc>>,
}

impl SynthesisSchedule {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
        }
    }

    /// Due when nothing has run yet or a full interval has elapsed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_run {
            None => true,
            Some(last) => now - last >= self.interval,
        }
    }

    /// Any pass (periodic or change-triggered) resets the interval.
    pub fn mark_run(&mut self, now: DateTime<Utc>) {
        self.last_run = Some(now);
    }

    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        self.last_run
    }
}

/// Tick the engine until `shutdown` flips to true or its sender is dropped.
///
/// The engine lock is held only for the synchronous pass, never across an
/// await point.
pub async fn run_synthesis_loop(
    engine: Arc<Mutex<ContextEngine>>,
    poll: StdDuration,
    mut shutdown: watch::Receiver<bool>,
) {
    log::info!("Synthesis loop started (poll every {:?})", poll);

    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(poll) => {
                let report = engine.lock().tick();
                if let Some(report) = report {
                    log::debug!(
                        "Periodic synthesis: {} transitions considered, insight={:?}",
                        report.transitions_considered,
                        report.insight_id
                    );
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    log::info!("Synthesis loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::EngineConfig;
    use chrono::TimeZone;

    #[test]
    fn test_first_check_is_due() {
        let schedule = SynthesisSchedule::new(Duration::seconds(30));
        assert!(schedule.is_due(Utc::now()));
    }

    #[test]
    fn test_due_after_full_interval() {
        let start = Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap();
        let mut schedule = SynthesisSchedule::new(Duration::seconds(30));
        schedule.mark_run(start);

        assert!(!schedule.is_due(start + Duration::seconds(29)));
        assert!(schedule.is_due(start + Duration::seconds(30)));
        assert_eq!(schedule.last_run(), Some(start));
    }

    #[tokio::test]
    async fn test_loop_ticks_and_stops_on_shutdown() {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap()));
        let engine = ContextEngine::builder(EngineConfig::default())
            .clock(clock)
            .build()
            .unwrap();
        let engine = Arc::new(Mutex::new(engine));
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(run_synthesis_loop(
            Arc::clone(&engine),
            StdDuration::from_millis(5),
            rx,
        ));

        tokio::time::sleep(StdDuration::from_millis(50)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert!(engine.lock().last_synthesis().is_some());
    }
}
