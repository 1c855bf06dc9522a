//! Reading Model
//!
//! Typed, immutable data points produced by hardware sources and consumed
//! by sinks.
//!
//! - [`Reading`]: sum type over the four reading kinds
//! - [`Point`]: measurement / tags / fields / timestamp wire form
//!
//! # Example
//!
//! ```
//! use pumptech::reading::{Reading, SensorFields, SensorReading};
//!
//! let reading: Reading =
//!     SensorReading::new(SensorFields::new("temp_001", "temperature", "inlet", 22.0, "°C")).into();
//! let line = reading.to_point().to_line_protocol();
//! assert!(line.starts_with("sensors,location=inlet,sensor_id=temp_001,sensor_type=temperature "));
//! ```

mod point;
mod types;

pub use point::{FieldSet, FieldValue, Point, TagSet};
pub use types::{
    ALARM_MEASUREMENT, AlarmEvent, AlarmSeverity, METRIC_MEASUREMENT, PUMP_MEASUREMENT,
    PUMP_SENSOR_TYPE, PumpFields, PumpReading, Quality, Reading, SENSOR_MEASUREMENT,
    SensorFields, SensorReading, SystemMetric,
};
