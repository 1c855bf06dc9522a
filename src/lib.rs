//! pumptech - Pump Station Telemetry Collection
//!
//! Continuously polls a hardware source (sensors, pumps, derived metrics and
//! alarms), batches every cycle into one write and persists it to a
//! time-series sink. It can be embedded as a library or run with the
//! `pumptech` binary.
//!
//! # Architecture
//!
//! - **Reading**: typed records and their line-protocol wire form
//! - **Hardware**: source abstraction plus a simulated pump station
//! - **Sink**: batched persistence (InfluxDB v2, stdout)
//! - **Engine**: per-cycle collection state machine with fault isolation
//! - **Scheduler**: fixed-interval runner with cancellation
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use pumptech::{
//!     CancellationToken, CollectionEngine, EngineSettings, Runner, SimulatedHardware,
//!     SimulationConfig, StdoutSink,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let hw = SimulatedHardware::new(SimulationConfig::default());
//!     let engine = CollectionEngine::new(hw, StdoutSink::new(), EngineSettings::default());
//!
//!     let cancel = CancellationToken::new();
//!     let mut runner = Runner::new(engine, cancel.clone());
//!     let summary = runner.run_continuous(Duration::from_secs(1)).await?;
//!     println!("{} cycles", summary.cycles);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod hardware;
pub mod logging;
pub mod reading;
pub mod scheduler;
pub mod server;
pub mod sink;

pub use engine::{CollectionEngine, EngineError, EngineSettings, EngineState, EngineStatus};
pub use hardware::{HardwareError, HardwareSource, SimulatedHardware, SimulationConfig};
pub use reading::Reading;
pub use scheduler::{RunSummary, Runner};
pub use sink::{BatchSink, InfluxConfig, InfluxSink, SinkError, StdoutSink};
pub use tokio_util::sync::CancellationToken;
