//! Scheduler
//!
//! Drives a [`CollectionEngine`] on a fixed interval until cancelled, or for a
//! single cycle.
//!
//! Cancellation is observed at the interval tick only. A cycle that already
//! began always runs to completion, including its write, before the engine is
//! stopped.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::engine::{CollectionEngine, CycleReport, EngineError};
use crate::hardware::HardwareSource;
use crate::sink::BatchSink;

/// Shortest supported collection interval (100 milliseconds).
pub const MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Totals for one continuous run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    /// Cycles whose write failed or that could not run.
    pub failed_cycles: u64,
}

/// Clamp `interval` to [`MIN_INTERVAL`], warning when it was too short.
pub fn clamp_interval(interval: Duration) -> Duration {
    if interval < MIN_INTERVAL {
        tracing::warn!(
            requested = ?interval,
            minimum = ?MIN_INTERVAL,
            "Collection interval below minimum, clamping"
        );
        MIN_INTERVAL
    } else {
        interval
    }
}

/// Owns an engine and the token that stops it.
pub struct Runner<H, S> {
    engine: CollectionEngine<H, S>,
    cancel: CancellationToken,
}

impl<H, S> std::fmt::Debug for Runner<H, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("engine", &self.engine)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl<H: HardwareSource, S: BatchSink> Runner<H, S> {
    pub fn new(engine: CollectionEngine<H, S>, cancel: CancellationToken) -> Self {
        Self { engine, cancel }
    }

    pub fn engine(&self) -> &CollectionEngine<H, S> {
        &self.engine
    }

    pub fn into_engine(self) -> CollectionEngine<H, S> {
        self.engine
    }

    /// Start the engine and collect every `interval` until cancelled.
    ///
    /// The first cycle runs immediately. Missed ticks are delayed, never
    /// bursted. The engine is stopped before returning.
    pub async fn run_continuous(&mut self, interval: Duration) -> Result<RunSummary, EngineError> {
        let interval = clamp_interval(interval);
        let mut summary = RunSummary::default();

        if self.cancel.is_cancelled() {
            return Ok(summary);
        }

        tokio::select! {
            started = self.engine.start() => started?,
            _ = self.cancel.cancelled() => {
                tracing::info!("Shutdown requested during startup");
                self.engine.stop().await;
                return Ok(summary);
            }
        }

        tracing::info!(interval = ?interval, "Continuous collection started");

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            summary.cycles += 1;
            match self.engine.collect_and_store_all().await {
                Ok(report) if !report.is_clean() => {
                    tracing::warn!(
                        cycle = summary.cycles,
                        points = report.points,
                        failed_sources = ?report.failed_sources,
                        "Cycle completed with failed sources"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    summary.failed_cycles += 1;
                    tracing::warn!(cycle = summary.cycles, error = %e, "Collection cycle failed");
                }
            }
        }

        tracing::info!(
            cycles = summary.cycles,
            failed_cycles = summary.failed_cycles,
            "Shutdown requested, stopping collection"
        );
        self.engine.stop().await;
        Ok(summary)
    }

    /// Start, run exactly one cycle, stop.
    pub async fn run_single_cycle(&mut self) -> Result<CycleReport, EngineError> {
        self.engine.start().await?;
        let result = self.engine.collect_and_store_all().await;
        self.engine.stop().await;
        result
    }
}
