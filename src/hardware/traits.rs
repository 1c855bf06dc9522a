//! Core hardware source trait and types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reading::{AlarmEvent, PumpReading, SensorReading};

/// Errors raised by hardware sources.
#[derive(Debug, Error)]
pub enum HardwareError {
    /// Operation requires a connected source.
    #[error("hardware not connected")]
    NotConnected,

    /// Connecting to the hardware failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// A device (sensor, pump, bus) failed to respond.
    #[error("device '{id}' failed: {message}")]
    Device { id: String, message: String },

    /// No pump with the given identifier.
    #[error("unknown pump: {0}")]
    UnknownPump(String),

    /// Command rejected before reaching the device.
    #[error("invalid command: {0}")]
    InvalidCommand(String),
}

/// Pump control operations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PumpCommand {
    Start,
    Stop,
    /// Target speed in percent (0-100).
    SetSpeed(f64),
    EmergencyStop,
}

/// Sensor health counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorCounts {
    pub total: u32,
    pub healthy: u32,
    pub unhealthy: u32,
}

/// Pump run-state counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PumpCounts {
    pub total: u32,
    pub running: u32,
    pub stopped: u32,
}

/// Alarm counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmCounts {
    pub total: u32,
    pub unacknowledged: u32,
}

/// Point-in-time status of a hardware source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub connected: bool,
    pub sensors: SensorCounts,
    pub pumps: PumpCounts,
    pub alarms: AlarmCounts,
    /// True for simulated sources.
    pub simulated: bool,
}

/// Capability interface implemented by every hardware source.
///
/// The collection engine owns its source exclusively, so all operations take
/// `&mut self` and no internal locking is required.
///
/// # Error Handling
///
/// Read operations are best-effort:
///
/// - A **disconnected** source returns empty results (`Ok(vec![])`, `Ok(None)`),
///   never an error.
/// - A failing **item** (one unhealthy sensor) is dropped from the result.
/// - An `Err` means the whole sub-collection failed and nothing usable was read.
///
/// Only `connect` reports connection problems as errors.
#[async_trait::async_trait]
pub trait HardwareSource: Send + 'static {
    /// Connect to the hardware.
    async fn connect(&mut self) -> Result<(), HardwareError>;

    /// Disconnect from the hardware. Idempotent.
    async fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    /// Read a single sensor. `Ok(None)` if the id is unknown or the sensor
    /// produced no sample.
    async fn read_sensor(&mut self, sensor_id: &str)
    -> Result<Option<SensorReading>, HardwareError>;

    /// Read every available sensor, skipping those that fail.
    async fn read_all_sensors(&mut self) -> Result<Vec<SensorReading>, HardwareError>;

    /// Identifiers of the pumps this source knows about.
    fn pump_ids(&self) -> Vec<String>;

    /// Read pump telemetry. `Ok(None)` if the id is unknown.
    async fn get_pump_data(&mut self, pump_id: &str) -> Result<Option<PumpReading>, HardwareError>;

    /// Send a control command to a pump.
    async fn control_pump(
        &mut self,
        pump_id: &str,
        command: PumpCommand,
    ) -> Result<(), HardwareError>;

    async fn get_system_status(&mut self) -> Result<SystemStatus, HardwareError>;

    /// Alarms raised since the previous call, acknowledged or not.
    async fn get_alarms(&mut self) -> Result<Vec<AlarmEvent>, HardwareError>;

    /// Acknowledge an alarm by code. Returns `false` if no such alarm exists.
    async fn acknowledge_alarm(&mut self, alarm_code: &str) -> bool;

    /// Last error message recorded by the source, if any.
    fn last_error(&self) -> Option<&str> {
        None
    }
}
