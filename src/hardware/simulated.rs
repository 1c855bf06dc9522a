//! Simulated hardware source.
//!
//! Generates plausible sensor and pump telemetry without any devices
//! attached. Used for development, demos and tests.

use std::collections::{BTreeMap, VecDeque};
use std::f64::consts::PI;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::hardware::{
    AlarmCounts, HardwareError, HardwareSource, PumpCommand, PumpCounts, SensorCounts,
    SystemStatus,
};
use crate::reading::{
    AlarmEvent, AlarmSeverity, PumpFields, PumpReading, SensorFields, SensorReading,
};

/// Chance per sensor read of an out-of-pattern spike.
const SPIKE_PROBABILITY: f64 = 0.05;

/// Default chance per alarm poll of raising a new alarm.
const DEFAULT_ALARM_PROBABILITY: f64 = 0.01;

/// Source tag for generated alarms.
const ALARM_SOURCE: &str = "simulated_system";

/// Alarms kept for acknowledgement and status counts; older ones are dropped.
pub const MAX_ALARM_HISTORY: usize = 100;

/// Fraction of the speed gap closed on each pump poll.
const SPEED_RAMP: f64 = 0.1;

/// Full-speed reference values for pump telemetry.
const MAX_FLOW_LPM: f64 = 100.0;
const MAX_PRESSURE_BAR: f64 = 5.0;
const AMBIENT_TEMP_C: f64 = 25.0;
const MAX_TEMP_RISE_C: f64 = 15.0;
const MAX_POWER_W: f64 = 1000.0;
const MAX_RPM: f64 = 3000.0;
const BASE_VIBRATION: f64 = 0.1;

fn default_alarm_probability() -> f64 {
    DEFAULT_ALARM_PROBABILITY
}

/// Tuning knobs for the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// RNG seed for reproducible output (default: entropy).
    #[serde(default)]
    pub seed: Option<u64>,
    /// Start every pump at this speed percent on construction.
    #[serde(default)]
    pub pump_autostart_speed: Option<f64>,
    /// Chance per alarm poll of raising a random alarm (default: 0.01).
    #[serde(default = "default_alarm_probability")]
    pub alarm_probability: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            pump_autostart_speed: None,
            alarm_probability: DEFAULT_ALARM_PROBABILITY,
        }
    }
}

impl SimulationConfig {
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_alarm_probability(mut self, probability: f64) -> Self {
        self.alarm_probability = probability;
        self
    }

    #[must_use]
    pub fn with_pump_autostart(mut self, speed_percent: f64) -> Self {
        self.pump_autostart_speed = Some(speed_percent);
        self
    }
}

/// A simulated analog sensor.
#[derive(Debug, Clone)]
pub struct SimulatedSensor {
    pub sensor_id: String,
    pub sensor_type: String,
    pub location: String,
    pub base_value: f64,
    /// Peak deviation of normal readings; output is clamped to base ± 2×variation.
    pub variation: f64,
    pub unit: String,
    healthy: bool,
}

impl SimulatedSensor {
    pub fn new(
        sensor_id: impl Into<String>,
        sensor_type: impl Into<String>,
        location: impl Into<String>,
        base_value: f64,
        variation: f64,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            sensor_type: sensor_type.into(),
            location: location.into(),
            base_value,
            variation,
            unit: unit.into(),
            healthy: true,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy
    }

    fn sample(&self, rng: &mut StdRng, elapsed_secs: f64) -> f64 {
        let var = self.variation.abs();
        let sine = (elapsed_secs / 60.0 * 2.0 * PI).sin() * var * 0.3;
        let noise = jitter(rng, var * 0.2);
        let spike = if rng.gen_bool(SPIKE_PROBABILITY) {
            jitter(rng, var)
        } else {
            0.0
        };

        let value = (self.base_value + sine + noise + spike)
            .clamp(self.base_value - var * 2.0, self.base_value + var * 2.0);
        round_to(value, 2)
    }
}

/// A simulated variable-speed pump.
#[derive(Debug, Clone)]
pub struct SimulatedPump {
    pub pump_id: String,
    pub location: String,
    running: bool,
    target_speed: f64,
    actual_speed: f64,
    healthy: bool,
}

impl SimulatedPump {
    pub fn new(pump_id: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            pump_id: pump_id.into(),
            location: location.into(),
            running: false,
            target_speed: 0.0,
            actual_speed: 0.0,
            healthy: true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn actual_speed(&self) -> f64 {
        self.actual_speed
    }

    fn apply(&mut self, command: PumpCommand) -> Result<(), HardwareError> {
        match command {
            PumpCommand::Start => {
                if !self.healthy {
                    return Err(HardwareError::Device {
                        id: self.pump_id.clone(),
                        message: "pump is not healthy".into(),
                    });
                }
                self.running = true;
                if self.target_speed == 0.0 {
                    self.target_speed = 50.0;
                }
            }
            PumpCommand::Stop => {
                self.running = false;
                self.target_speed = 0.0;
            }
            PumpCommand::SetSpeed(speed) => {
                if !(0.0..=100.0).contains(&speed) {
                    return Err(HardwareError::InvalidCommand(format!(
                        "speed must be between 0 and 100 percent, got {speed}"
                    )));
                }
                self.target_speed = speed;
                self.running = speed > 0.0;
            }
            PumpCommand::EmergencyStop => {
                self.running = false;
                self.target_speed = 0.0;
                self.actual_speed = 0.0;
            }
        }
        Ok(())
    }

    /// Move the actual speed toward the target.
    fn ramp(&mut self) {
        let target = if self.running { self.target_speed } else { 0.0 };
        let diff = target - self.actual_speed;
        if diff.abs() > 1.0 {
            self.actual_speed += diff * SPEED_RAMP;
        } else {
            self.actual_speed = target;
        }
    }

    fn sample(&mut self, rng: &mut StdRng) -> Result<PumpReading, HardwareError> {
        if !self.healthy {
            return Err(HardwareError::Device {
                id: self.pump_id.clone(),
                message: "pump is not healthy".into(),
            });
        }
        self.ramp();

        let f = self.actual_speed / 100.0;
        let fields = PumpFields {
            flow_rate: round_to((MAX_FLOW_LPM * f + jitter(rng, 2.0)).max(0.0), 1),
            pressure: round_to((MAX_PRESSURE_BAR * f + jitter(rng, 0.2)).max(0.0), 2),
            temperature: round_to(AMBIENT_TEMP_C + MAX_TEMP_RISE_C * f + jitter(rng, 1.0), 2),
            power_consumption: round_to((MAX_POWER_W * f * f + jitter(rng, 20.0)).max(0.0), 0),
            rpm: round_to((MAX_RPM * f + jitter(rng, 50.0)).max(0.0), 0),
            vibration: round_to((BASE_VIBRATION + 0.5 * f + jitter(rng, 0.05)).max(0.0), 3),
        };

        Ok(PumpReading::new(self.pump_id.clone(), self.location.clone(), fields)
            .with_metadata("simulated", true)
            .with_metadata("target_speed", self.target_speed)
            .with_metadata("actual_speed", round_to(self.actual_speed, 1))
            .with_metadata("is_running", self.running))
    }
}

/// Hardware source backed by simulated sensors and pumps.
pub struct SimulatedHardware {
    sensors: BTreeMap<String, SimulatedSensor>,
    pumps: BTreeMap<String, SimulatedPump>,
    alarms: VecDeque<AlarmEvent>,
    /// Trailing entries of `alarms` not yet handed out by `get_alarms`.
    unreported: usize,
    connected: bool,
    alarm_probability: f64,
    rng: StdRng,
    started: Instant,
    last_error: Option<String>,
}

impl std::fmt::Debug for SimulatedHardware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedHardware")
            .field("sensors", &self.sensors.len())
            .field("pumps", &self.pumps.len())
            .field("alarms", &self.alarms.len())
            .field("connected", &self.connected)
            .finish_non_exhaustive()
    }
}

impl SimulatedHardware {
    /// Create a station with the default sensor and pump set.
    pub fn new(config: SimulationConfig) -> Self {
        let mut hw = Self::empty(config.clone());

        hw.add_sensor(SimulatedSensor::new("temp_001", "temperature", "inlet", 22.0, 3.0, "°C"));
        hw.add_sensor(SimulatedSensor::new("temp_002", "temperature", "outlet", 25.0, 2.0, "°C"));
        hw.add_sensor(SimulatedSensor::new("press_001", "pressure", "inlet", 2.5, 0.5, "bar"));
        hw.add_sensor(SimulatedSensor::new("press_002", "pressure", "outlet", 4.0, 0.8, "bar"));
        hw.add_sensor(SimulatedSensor::new("flow_001", "flow", "main_line", 75.0, 10.0, "L/min"));
        hw.add_sensor(SimulatedSensor::new("level_001", "level", "tank_1", 60.0, 15.0, "%"));

        hw.add_pump(SimulatedPump::new("pump_001", "main_station"));
        hw.add_pump(SimulatedPump::new("pump_002", "backup_station"));

        if let Some(speed) = config.pump_autostart_speed {
            for pump in hw.pumps.values_mut() {
                if let Err(e) = pump.apply(PumpCommand::SetSpeed(speed)) {
                    tracing::warn!(pump = %pump.pump_id, error = %e, "Pump autostart rejected");
                }
            }
        }

        hw
    }

    /// Create a station with no sensors or pumps.
    pub fn empty(config: SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            sensors: BTreeMap::new(),
            pumps: BTreeMap::new(),
            alarms: VecDeque::new(),
            unreported: 0,
            connected: false,
            alarm_probability: config.alarm_probability.clamp(0.0, 1.0),
            rng,
            started: Instant::now(),
            last_error: None,
        }
    }

    pub fn add_sensor(&mut self, sensor: SimulatedSensor) {
        self.sensors.insert(sensor.sensor_id.clone(), sensor);
    }

    pub fn add_pump(&mut self, pump: SimulatedPump) {
        self.pumps.insert(pump.pump_id.clone(), pump);
    }

    /// Raise an alarm as if the hardware had reported it.
    pub fn raise_alarm(&mut self, alarm: AlarmEvent) {
        self.alarms.push_back(alarm);
        self.unreported += 1;
        while self.alarms.len() > MAX_ALARM_HISTORY {
            self.alarms.pop_front();
        }
        self.unreported = self.unreported.min(self.alarms.len());
    }

    /// Mark a sensor unhealthy; it stops producing samples.
    pub fn simulate_sensor_failure(&mut self, sensor_id: &str) {
        if let Some(sensor) = self.sensors.get_mut(sensor_id) {
            sensor.healthy = false;
        }
    }

    /// Mark a pump unhealthy; reads and starts fail.
    pub fn simulate_pump_failure(&mut self, pump_id: &str) {
        if let Some(pump) = self.pumps.get_mut(pump_id) {
            pump.healthy = false;
        }
    }

    fn set_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(error = %message, "Simulated hardware error");
        self.last_error = Some(message);
    }

    fn sample_sensor(&mut self, sensor_id: &str) -> Option<SensorReading> {
        let elapsed = self.started.elapsed().as_secs_f64();
        let sensor = self.sensors.get(sensor_id)?;
        if !sensor.healthy {
            let msg = format!("sensor {sensor_id} is not healthy");
            self.set_error(msg);
            return None;
        }

        let value = sensor.sample(&mut self.rng, elapsed);
        let fields = SensorFields::new(
            sensor.sensor_id.clone(),
            sensor.sensor_type.clone(),
            sensor.location.clone(),
            value,
            sensor.unit.clone(),
        );
        let (base, variation) = (sensor.base_value, sensor.variation);

        Some(
            SensorReading::new(fields)
                .with_metadata("simulated", true)
                .with_metadata("base_value", base)
                .with_metadata("variation", variation),
        )
    }

    fn maybe_raise_random_alarm(&mut self) {
        if !self.rng.gen_bool(self.alarm_probability) {
            return;
        }
        let severity = *[AlarmSeverity::Info, AlarmSeverity::Warning, AlarmSeverity::Error]
            .choose(&mut self.rng)
            .unwrap_or(&AlarmSeverity::Info);
        let code = format!("SIM_{}", self.rng.gen_range(1000..=9999));
        let alarm = AlarmEvent::new(
            ALARM_SOURCE,
            severity,
            code.clone(),
            format!("Simulated alarm {code}"),
        );
        tracing::debug!(code = %code, severity = %severity, "Simulated alarm raised");
        self.raise_alarm(alarm);
    }
}

#[async_trait::async_trait]
impl HardwareSource for SimulatedHardware {
    async fn connect(&mut self) -> Result<(), HardwareError> {
        self.connected = true;
        self.last_error = None;
        tracing::info!(
            sensors = self.sensors.len(),
            pumps = self.pumps.len(),
            "Simulated hardware connected"
        );
        Ok(())
    }

    async fn disconnect(&mut self) {
        if self.connected {
            tracing::info!("Simulated hardware disconnected");
        }
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn read_sensor(
        &mut self,
        sensor_id: &str,
    ) -> Result<Option<SensorReading>, HardwareError> {
        if !self.connected {
            self.set_error("hardware not connected");
            return Ok(None);
        }
        if !self.sensors.contains_key(sensor_id) {
            self.set_error(format!("sensor {sensor_id} not found"));
            return Ok(None);
        }
        Ok(self.sample_sensor(sensor_id))
    }

    async fn read_all_sensors(&mut self) -> Result<Vec<SensorReading>, HardwareError> {
        if !self.connected {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = self.sensors.keys().cloned().collect();
        Ok(ids.iter().filter_map(|id| self.sample_sensor(id)).collect())
    }

    fn pump_ids(&self) -> Vec<String> {
        self.pumps.keys().cloned().collect()
    }

    async fn get_pump_data(&mut self, pump_id: &str) -> Result<Option<PumpReading>, HardwareError> {
        if !self.connected {
            self.set_error("hardware not connected");
            return Ok(None);
        }
        let Some(pump) = self.pumps.get_mut(pump_id) else {
            self.set_error(format!("pump {pump_id} not found"));
            return Ok(None);
        };
        match pump.sample(&mut self.rng) {
            Ok(reading) => Ok(Some(reading)),
            Err(e) => {
                self.set_error(e.to_string());
                Err(e)
            }
        }
    }

    async fn control_pump(
        &mut self,
        pump_id: &str,
        command: PumpCommand,
    ) -> Result<(), HardwareError> {
        if !self.connected {
            return Err(HardwareError::NotConnected);
        }
        let pump = self
            .pumps
            .get_mut(pump_id)
            .ok_or_else(|| HardwareError::UnknownPump(pump_id.to_string()))?;
        pump.apply(command)?;
        tracing::info!(pump = %pump_id, ?command, "Pump command applied");
        Ok(())
    }

    async fn get_system_status(&mut self) -> Result<SystemStatus, HardwareError> {
        let total_sensors = self.sensors.len() as u32;
        let healthy = self.sensors.values().filter(|s| s.healthy).count() as u32;
        let total_pumps = self.pumps.len() as u32;
        let running = self.pumps.values().filter(|p| p.running).count() as u32;
        let unacknowledged = self.alarms.iter().filter(|a| !a.acknowledged).count() as u32;

        Ok(SystemStatus {
            connected: self.connected,
            sensors: SensorCounts {
                total: total_sensors,
                healthy,
                unhealthy: total_sensors - healthy,
            },
            pumps: PumpCounts {
                total: total_pumps,
                running,
                stopped: total_pumps - running,
            },
            alarms: AlarmCounts {
                total: self.alarms.len() as u32,
                unacknowledged,
            },
            simulated: true,
        })
    }

    async fn get_alarms(&mut self) -> Result<Vec<AlarmEvent>, HardwareError> {
        if !self.connected {
            return Ok(Vec::new());
        }
        self.maybe_raise_random_alarm();
        let first = self.alarms.len() - self.unreported;
        self.unreported = 0;
        Ok(self.alarms.range(first..).cloned().collect())
    }

    async fn acknowledge_alarm(&mut self, alarm_code: &str) -> bool {
        match self.alarms.iter_mut().find(|a| a.alarm_code == alarm_code) {
            Some(alarm) => {
                alarm.acknowledged = true;
                true
            }
            None => false,
        }
    }

    fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

/// Uniform noise in `[-amplitude, amplitude]`; zero for non-positive amplitude.
fn jitter(rng: &mut StdRng, amplitude: f64) -> f64 {
    if amplitude > 0.0 {
        rng.gen_range(-amplitude..=amplitude)
    } else {
        0.0
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> SimulationConfig {
        SimulationConfig::default()
            .with_seed(7)
            .with_alarm_probability(0.0)
    }

    #[tokio::test]
    async fn test_disconnected_reads_are_empty() {
        let mut hw = SimulatedHardware::new(quiet());
        assert!(!hw.is_connected());
        assert!(hw.read_all_sensors().await.unwrap().is_empty());
        assert!(hw.get_pump_data("pump_001").await.unwrap().is_none());
        assert!(hw.get_alarms().await.unwrap().is_empty());
        assert!(hw.read_sensor("temp_001").await.unwrap().is_none());
        assert_eq!(hw.last_error(), Some("hardware not connected"));
    }

    #[tokio::test]
    async fn test_default_station_layout() {
        let mut hw = SimulatedHardware::new(quiet());
        hw.connect().await.unwrap();

        let readings = hw.read_all_sensors().await.unwrap();
        assert_eq!(readings.len(), 6);
        assert_eq!(hw.pump_ids(), vec!["pump_001", "pump_002"]);

        for reading in &readings {
            let sensor = &hw.sensors[&reading.sensor.sensor_id];
            let lo = sensor.base_value - sensor.variation * 2.0;
            let hi = sensor.base_value + sensor.variation * 2.0;
            assert!(
                (lo..=hi).contains(&reading.sensor.value),
                "{} out of bounds",
                reading.sensor.sensor_id
            );
        }
    }

    #[tokio::test]
    async fn test_zero_variation_sensor_is_exact() {
        let mut hw = SimulatedHardware::empty(quiet());
        hw.add_sensor(SimulatedSensor::new("t", "temperature", "inlet", 22.0, 0.0, "°C"));
        hw.connect().await.unwrap();

        let reading = hw.read_sensor("t").await.unwrap().unwrap();
        assert_eq!(reading.sensor.value, 22.0);
    }

    #[tokio::test]
    async fn test_unhealthy_sensor_is_skipped() {
        let mut hw = SimulatedHardware::new(quiet());
        hw.connect().await.unwrap();
        hw.simulate_sensor_failure("temp_001");

        let readings = hw.read_all_sensors().await.unwrap();
        assert_eq!(readings.len(), 5);
        assert!(readings.iter().all(|r| r.sensor.sensor_id != "temp_001"));

        let status = hw.get_system_status().await.unwrap();
        assert_eq!(status.sensors.healthy, 5);
        assert_eq!(status.sensors.unhealthy, 1);
    }

    #[tokio::test]
    async fn test_pump_unknown_and_failed() {
        let mut hw = SimulatedHardware::new(quiet());
        hw.connect().await.unwrap();

        assert!(hw.get_pump_data("pump_999").await.unwrap().is_none());

        hw.simulate_pump_failure("pump_002");
        let err = hw.get_pump_data("pump_002").await.unwrap_err();
        assert!(matches!(err, HardwareError::Device { .. }));
        assert!(hw.get_pump_data("pump_001").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_pump_ramps_toward_target() {
        let mut hw = SimulatedHardware::new(quiet());
        hw.connect().await.unwrap();
        hw.control_pump("pump_001", PumpCommand::SetSpeed(80.0))
            .await
            .unwrap();

        let first = hw.get_pump_data("pump_001").await.unwrap().unwrap();
        for _ in 0..100 {
            hw.get_pump_data("pump_001").await.unwrap();
        }
        let settled = hw.get_pump_data("pump_001").await.unwrap().unwrap();

        assert!(first.pump.rpm < settled.pump.rpm);
        assert_eq!(hw.pumps["pump_001"].actual_speed(), 80.0);

        let status = hw.get_system_status().await.unwrap();
        assert_eq!(status.pumps.running, 1);
        assert_eq!(status.pumps.stopped, 1);
    }

    #[tokio::test]
    async fn test_pump_commands_validate() {
        let mut hw = SimulatedHardware::new(quiet());
        assert!(matches!(
            hw.control_pump("pump_001", PumpCommand::Start).await,
            Err(HardwareError::NotConnected)
        ));

        hw.connect().await.unwrap();
        assert!(matches!(
            hw.control_pump("pump_001", PumpCommand::SetSpeed(120.0)).await,
            Err(HardwareError::InvalidCommand(_))
        ));
        assert!(matches!(
            hw.control_pump("nope", PumpCommand::Start).await,
            Err(HardwareError::UnknownPump(_))
        ));

        hw.control_pump("pump_001", PumpCommand::Start).await.unwrap();
        assert!(hw.pumps["pump_001"].is_running());
        hw.control_pump("pump_001", PumpCommand::EmergencyStop)
            .await
            .unwrap();
        assert!(!hw.pumps["pump_001"].is_running());
        assert_eq!(hw.pumps["pump_001"].actual_speed(), 0.0);
    }

    #[tokio::test]
    async fn test_autostart_runs_all_pumps() {
        let mut hw = SimulatedHardware::new(quiet().with_pump_autostart(60.0));
        let status = hw.get_system_status().await.unwrap();
        assert_eq!(status.pumps.running, 2);
    }

    #[tokio::test]
    async fn test_alarm_acknowledgement() {
        let mut hw = SimulatedHardware::new(quiet());
        hw.connect().await.unwrap();
        hw.raise_alarm(AlarmEvent::new("test", AlarmSeverity::Error, "A1", "boom"));

        assert!(hw.acknowledge_alarm("A1").await);
        assert!(!hw.acknowledge_alarm("A2").await);

        let alarms = hw.get_alarms().await.unwrap();
        assert_eq!(alarms.len(), 1);
        assert!(alarms[0].acknowledged);
        let status = hw.get_system_status().await.unwrap();
        assert_eq!(status.alarms.unacknowledged, 0);
    }

    #[tokio::test]
    async fn test_certain_alarm_probability_raises_alarm() {
        let mut hw = SimulatedHardware::new(quiet().with_alarm_probability(1.0));
        hw.connect().await.unwrap();
        let alarms = hw.get_alarms().await.unwrap();
        assert_eq!(alarms.len(), 1);
        assert!(alarms[0].alarm_code.starts_with("SIM_"));
    }

    #[tokio::test]
    async fn test_alarms_are_reported_once() {
        let mut hw = SimulatedHardware::new(quiet().with_alarm_probability(1.0));
        hw.connect().await.unwrap();

        for _ in 0..5 {
            assert_eq!(hw.get_alarms().await.unwrap().len(), 1);
        }

        let status = hw.get_system_status().await.unwrap();
        assert_eq!(status.alarms.total, 5);
        assert_eq!(status.alarms.unacknowledged, 5);
    }

    #[tokio::test]
    async fn test_alarm_history_is_bounded() {
        let mut hw = SimulatedHardware::new(quiet());
        hw.connect().await.unwrap();
        for i in 0..MAX_ALARM_HISTORY + 10 {
            hw.raise_alarm(AlarmEvent::new("test", AlarmSeverity::Info, format!("A{i}"), "x"));
        }

        let alarms = hw.get_alarms().await.unwrap();
        assert_eq!(alarms.len(), MAX_ALARM_HISTORY);
        assert_eq!(alarms[0].alarm_code, "A10");
        assert!(hw.get_alarms().await.unwrap().is_empty());

        // Already reported alarms can still be acknowledged.
        assert!(hw.acknowledge_alarm("A50").await);
        assert!(!hw.acknowledge_alarm("A0").await);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(1499.6, 0), 1500.0);
    }
}
