//! Collection Engine
//!
//! Runs collection cycles: read every sub-collection from a
//! [`HardwareSource`](crate::hardware::HardwareSource), merge them into one
//! ordered batch (sensors, pumps, metrics, alarms) and hand it to a
//! [`BatchSink`](crate::sink::BatchSink).
//!
//! - [`CollectionEngine`]: lifecycle state machine and cycle logic
//! - [`EngineStatus`]: snapshot for monitoring, also published on a watch channel
//! - [`CollectionStats`]: cumulative counters
//!
//! # Example
//!
//! ```rust,no_run
//! use pumptech::engine::{CollectionEngine, EngineSettings};
//! use pumptech::hardware::{SimulatedHardware, SimulationConfig};
//! use pumptech::sink::StdoutSink;
//!
//! # async fn demo() -> Result<(), pumptech::engine::EngineError> {
//! let hw = SimulatedHardware::new(SimulationConfig::default());
//! let mut engine = CollectionEngine::new(hw, StdoutSink::new(), EngineSettings::default());
//!
//! engine.start().await?;
//! let report = engine.collect_and_store_all().await?;
//! println!("wrote {} points", report.points);
//! engine.stop().await;
//! # Ok(())
//! # }
//! ```

mod machine;
mod state;
mod stats;

pub use machine::{
    CollectionEngine, DEFAULT_CONNECT_RETRIES, DEFAULT_HOST, DEFAULT_RETRY_INTERVAL, EngineError,
    EngineSettings,
};
pub use state::EngineState;
pub use stats::{CollectionStats, CycleReport, EngineStatus, SubSource};
