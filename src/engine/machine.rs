//! The collection engine state machine.

use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;

use super::{CollectionStats, CycleReport, EngineState, EngineStatus, SubSource};
use crate::hardware::{HardwareError, HardwareSource};
use crate::reading::{Reading, SystemMetric};
use crate::sink::{BatchSink, SinkError};

/// Default `host` tag for system metrics.
pub const DEFAULT_HOST: &str = "pumptech_system";
/// Default number of sink connection attempts on start.
pub const DEFAULT_CONNECT_RETRIES: u32 = 30;
/// Default pause between sink connection attempts (2 seconds).
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(2);

const HARDWARE_COMPONENT: &str = "hardware";
const COLLECTOR_COMPONENT: &str = "data_collector";

/// Errors surfaced by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Hardware source refused to connect during start.
    #[error("hardware connection failed: {0}")]
    HardwareConnect(#[source] HardwareError),

    /// Sink stayed unreachable through the whole retry budget.
    #[error("sink not reachable after {attempts} attempts")]
    SinkConnect { attempts: u32 },

    /// Cycle requested outside the `Running` state.
    #[error("engine is not running (state: {0})")]
    NotRunning(EngineState),

    /// The sink rejected the cycle's batch.
    #[error("batch write failed: {0}")]
    Write(#[from] SinkError),
}

/// Engine parameters resolved from configuration.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// `host` tag on emitted system metrics.
    pub host: String,
    /// Pumps to poll. `None` asks the source via [`HardwareSource::pump_ids`].
    pub pump_ids: Option<Vec<String>>,
    pub connect_retries: u32,
    pub retry_interval: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            pump_ids: None,
            connect_retries: DEFAULT_CONNECT_RETRIES,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}

impl EngineSettings {
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    #[must_use]
    pub fn with_pump_ids(mut self, pump_ids: Vec<String>) -> Self {
        self.pump_ids = Some(pump_ids);
        self
    }

    #[must_use]
    pub fn with_connect_retry(mut self, retries: u32, interval: Duration) -> Self {
        self.connect_retries = retries;
        self.retry_interval = interval;
        self
    }
}

/// Orchestrates collection cycles from one hardware source into one sink.
///
/// The engine owns both endpoints exclusively. Cycles take `&mut self`, so two
/// cycles can never overlap on the same engine and the sink never sees
/// concurrent writes.
///
/// # Error Handling Philosophy
///
/// Steady-state failures are counted, never fatal:
///
/// - A failing sub-collection (sensors, pumps, metrics, alarms) adds one to
///   `error_count` and contributes nothing; the rest of the batch is still
///   written.
/// - A failed write adds one to `error_count` and is returned as
///   [`EngineError::Write`]. The batch is dropped, not retried.
/// - `collection_count` counts every cycle that ran, regardless of outcome.
///
/// Only [`start`](Self::start) fails hard, when either endpoint is unreachable.
pub struct CollectionEngine<H, S> {
    hardware: H,
    sink: S,
    settings: EngineSettings,
    state: EngineState,
    stats: CollectionStats,
    status_tx: watch::Sender<EngineStatus>,
}

impl<H, S> std::fmt::Debug for CollectionEngine<H, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionEngine")
            .field("state", &self.state)
            .field("stats", &self.stats)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<H: HardwareSource, S: BatchSink> CollectionEngine<H, S> {
    pub fn new(hardware: H, sink: S, settings: EngineSettings) -> Self {
        let (status_tx, _) = watch::channel(EngineStatus::default());
        let engine = Self {
            hardware,
            sink,
            settings,
            state: EngineState::Stopped,
            stats: CollectionStats::default(),
            status_tx,
        };
        engine.publish();
        engine
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn stats(&self) -> &CollectionStats {
        &self.stats
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    /// Mutable access to the source, e.g. for pump control between cycles.
    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Current status snapshot.
    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            state: self.state,
            running: self.state.is_running(),
            hardware_connected: self.hardware.is_connected(),
            database_connected: self.sink.is_connected(),
            collection_count: self.stats.collection_count,
            error_count: self.stats.error_count,
            sink_write_errors: self.sink.write_errors(),
            last_collection_time: self.stats.last_collection_time,
        }
    }

    /// Receiver updated after every state change and every cycle.
    pub fn subscribe(&self) -> watch::Receiver<EngineStatus> {
        self.status_tx.subscribe()
    }

    /// Connect the hardware, then wait for the sink.
    ///
    /// Calling this while already `Running` is a no-op.
    pub async fn start(&mut self) -> Result<(), EngineError> {
        if self.state.is_running() {
            tracing::debug!("Collection engine already running");
            return Ok(());
        }

        self.set_state(EngineState::Starting);
        tracing::info!("Starting collection engine");

        if let Err(e) = self.hardware.connect().await {
            tracing::error!(error = %e, "Hardware connection failed");
            self.set_state(EngineState::Stopped);
            return Err(EngineError::HardwareConnect(e));
        }

        let attempts = self.settings.connect_retries;
        if !self
            .sink
            .wait_for_connection(attempts, self.settings.retry_interval)
            .await
        {
            tracing::error!(attempts, "Sink connection failed");
            self.hardware.disconnect().await;
            self.set_state(EngineState::Stopped);
            return Err(EngineError::SinkConnect { attempts });
        }

        self.set_state(EngineState::Running);
        tracing::info!("Collection engine running");
        Ok(())
    }

    /// Disconnect both endpoints. No-op when already stopped.
    pub async fn stop(&mut self) {
        if self.state == EngineState::Stopped {
            return;
        }

        self.set_state(EngineState::Stopping);
        tracing::info!("Stopping collection engine");

        self.hardware.disconnect().await;
        self.sink.disconnect().await;

        self.set_state(EngineState::Stopped);
        tracing::info!(
            collection_count = self.stats.collection_count,
            error_count = self.stats.error_count,
            "Collection engine stopped"
        );
    }

    /// Run one full cycle: gather every sub-collection, then write one batch.
    pub async fn collect_and_store_all(&mut self) -> Result<CycleReport, EngineError> {
        if !self.state.is_running() {
            return Err(EngineError::NotRunning(self.state));
        }

        let started = Instant::now();
        let mut batch: Vec<Reading> = Vec::new();
        let mut failed_sources = Vec::new();

        match self.hardware.read_all_sensors().await {
            Ok(sensors) => batch.extend(sensors.into_iter().map(Reading::from)),
            Err(e) => source_failed(SubSource::Sensors, &e, &mut failed_sources),
        }

        let (pumps, pump_error) = self.collect_pumps().await;
        batch.extend(pumps);
        if let Some(e) = pump_error {
            source_failed(SubSource::Pumps, &e, &mut failed_sources);
        }

        match self.collect_metrics().await {
            Ok(metrics) => batch.extend(metrics.into_iter().map(Reading::from)),
            Err(e) => source_failed(SubSource::Metrics, &e, &mut failed_sources),
        }

        match self.hardware.get_alarms().await {
            Ok(alarms) => batch.extend(alarms.into_iter().map(Reading::from)),
            Err(e) => source_failed(SubSource::Alarms, &e, &mut failed_sources),
        }

        self.stats.record_errors(failed_sources.len() as u64);

        let points = batch.len();
        let written = self.sink.write_batch(batch).await;
        self.stats.record_cycle(Utc::now());

        let outcome = match written {
            Ok(()) => {
                let report = CycleReport {
                    points,
                    failed_sources,
                    elapsed: started.elapsed(),
                };
                tracing::debug!(
                    points,
                    failed = report.failed_sources.len(),
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    collection_count = self.stats.collection_count,
                    "Collection cycle complete"
                );
                Ok(report)
            }
            Err(e) => {
                self.stats.record_errors(1);
                tracing::error!(
                    points,
                    error = %e,
                    error_count = self.stats.error_count,
                    "Failed to store collected data"
                );
                Err(EngineError::Write(e))
            }
        };

        self.publish();
        outcome
    }

    /// Poll every configured pump. Returns the readings that succeeded and
    /// the first failure, if any.
    async fn collect_pumps(&mut self) -> (Vec<Reading>, Option<HardwareError>) {
        let pump_ids = match &self.settings.pump_ids {
            Some(ids) => ids.clone(),
            None => self.hardware.pump_ids(),
        };

        let mut readings = Vec::with_capacity(pump_ids.len());
        let mut first_error = None;

        for pump_id in &pump_ids {
            match self.hardware.get_pump_data(pump_id).await {
                Ok(Some(reading)) => readings.push(reading.into()),
                Ok(None) => tracing::debug!(pump = %pump_id, "No data for pump"),
                Err(e) => {
                    tracing::warn!(pump = %pump_id, error = %e, "Pump read failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        (readings, first_error)
    }

    async fn collect_metrics(&mut self) -> Result<Vec<SystemMetric>, HardwareError> {
        let status = self.hardware.get_system_status().await?;
        let host = self.settings.host.as_str();
        let now = Utc::now();

        Ok(vec![
            SystemMetric::new(
                host,
                HARDWARE_COMPONENT,
                "sensors_healthy",
                f64::from(status.sensors.healthy),
                "count",
            )
            .with_timestamp(now)
            .with_field("total_sensors", status.sensors.total)
            .with_field("unhealthy_sensors", status.sensors.unhealthy),
            SystemMetric::new(
                host,
                HARDWARE_COMPONENT,
                "pumps_running",
                f64::from(status.pumps.running),
                "count",
            )
            .with_timestamp(now)
            .with_field("total_pumps", status.pumps.total)
            .with_field("stopped_pumps", status.pumps.stopped),
            SystemMetric::new(
                host,
                COLLECTOR_COMPONENT,
                "collection_count",
                self.stats.collection_count as f64,
                "count",
            )
            .with_timestamp(now)
            .with_field("error_count", self.stats.error_count)
            .with_field("running", self.state.is_running()),
        ])
    }

    fn set_state(&mut self, state: EngineState) {
        if self.state != state {
            tracing::debug!(from = %self.state, to = %state, "Engine state change");
            self.state = state;
        }
        self.publish();
    }

    fn publish(&self) {
        self.status_tx.send_replace(self.status());
    }
}

fn source_failed(source: SubSource, error: &HardwareError, failed: &mut Vec<SubSource>) {
    tracing::warn!(source = %source, error = %error, "Sub-collection failed");
    failed.push(source);
}
