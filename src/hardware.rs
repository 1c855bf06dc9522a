//! Hardware Source Layer
//!
//! Capability interface for anything that produces readings: real device
//! adapters or the built-in simulation.
//!
//! - [`HardwareSource`]: core trait implemented by every source
//! - [`SimulatedHardware`]: simulated pump station with sensors, pumps and alarms
//!
//! # Example
//!
//! ```rust,no_run
//! use pumptech::hardware::{HardwareSource, SimulatedHardware, SimulationConfig};
//!
//! # async fn demo() -> Result<(), pumptech::hardware::HardwareError> {
//! let mut hw = SimulatedHardware::new(SimulationConfig::default());
//! hw.connect().await?;
//! let readings = hw.read_all_sensors().await?;
//! assert_eq!(readings.len(), 6);
//! # Ok(())
//! # }
//! ```

pub mod simulated;
mod traits;

pub use simulated::{SimulatedHardware, SimulatedPump, SimulatedSensor, SimulationConfig};
pub use traits::{
    AlarmCounts, HardwareError, HardwareSource, PumpCommand, PumpCounts, SensorCounts,
    SystemStatus,
};
