//! Typed reading records.
//!
//! - [`SensorReading`]: a single sensor sample (`sensors` measurement)
//! - [`PumpReading`]: sensor fields plus pump telemetry (`pump_data` measurement)
//! - [`SystemMetric`]: a derived health/counter metric (`system_metrics` measurement)
//! - [`AlarmEvent`]: an alarm raised by a source (`alarms` measurement)
//!
//! Readings are immutable once built. Each one converts to a [`Point`] with a
//! fixed tag key set per measurement and at least one field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use super::point::{FieldSet, FieldValue, Point, TagSet};

/// Measurement name for plain sensor readings.
pub const SENSOR_MEASUREMENT: &str = "sensors";
/// Measurement name for pump readings.
pub const PUMP_MEASUREMENT: &str = "pump_data";
/// Measurement name for system metrics.
pub const METRIC_MEASUREMENT: &str = "system_metrics";
/// Measurement name for alarm events.
pub const ALARM_MEASUREMENT: &str = "alarms";

/// Sensor type reported by pump readings.
pub const PUMP_SENSOR_TYPE: &str = "pump";

/// Signal quality of a sensor sample.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Quality {
    #[default]
    Good,
    Bad,
    Uncertain,
}

/// Alarm severity.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AlarmSeverity {
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

/// Identity and primary value shared by sensor and pump readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorFields {
    pub location: String,
    pub sensor_id: String,
    pub sensor_type: String,
    pub value: f64,
    pub unit: String,
    pub quality: Quality,
}

impl SensorFields {
    /// Create sensor fields with `good` quality.
    pub fn new(
        sensor_id: impl Into<String>,
        sensor_type: impl Into<String>,
        location: impl Into<String>,
        value: f64,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into(),
            sensor_id: sensor_id.into(),
            sensor_type: sensor_type.into(),
            value,
            unit: unit.into(),
            quality: Quality::Good,
        }
    }

    fn tags(&self) -> TagSet {
        TagSet::from([
            ("location".to_string(), self.location.clone()),
            ("sensor_id".to_string(), self.sensor_id.clone()),
            ("sensor_type".to_string(), self.sensor_type.clone()),
        ])
    }

    fn write_fields(&self, fields: &mut FieldSet) {
        fields.insert("value".into(), self.value.into());
        fields.insert("unit".into(), self.unit.as_str().into());
        fields.insert("quality".into(), self.quality.as_ref().into());
    }
}

/// Pump-specific telemetry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PumpFields {
    /// Flow rate (L/min).
    pub flow_rate: f64,
    /// Discharge pressure (bar).
    pub pressure: f64,
    /// Housing temperature (°C).
    pub temperature: f64,
    /// Electrical power draw (W).
    pub power_consumption: f64,
    pub rpm: f64,
    /// Vibration amplitude (mm/s).
    pub vibration: f64,
}

impl PumpFields {
    fn write_fields(&self, fields: &mut FieldSet) {
        fields.insert("flow_rate".into(), self.flow_rate.into());
        fields.insert("pressure".into(), self.pressure.into());
        fields.insert("temperature".into(), self.temperature.into());
        fields.insert("power_consumption".into(), self.power_consumption.into());
        fields.insert("rpm".into(), self.rpm.into());
        fields.insert("vibration".into(), self.vibration.into());
    }
}

/// A single sensor sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub sensor: SensorFields,
    pub timestamp: DateTime<Utc>,
    /// Extra fields merged into the point; core fields win on collision.
    pub metadata: FieldSet,
}

impl SensorReading {
    /// Create a reading stamped with the current time.
    pub fn new(sensor: SensorFields) -> Self {
        Self {
            sensor,
            timestamp: Utc::now(),
            metadata: FieldSet::new(),
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    #[must_use]
    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.sensor.quality = quality;
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn to_point(&self) -> Point {
        let mut fields = self.metadata.clone();
        self.sensor.write_fields(&mut fields);
        Point {
            measurement: SENSOR_MEASUREMENT.to_string(),
            tags: self.sensor.tags(),
            fields,
            timestamp: self.timestamp,
        }
    }
}

/// Pump telemetry: base sensor fields composed with pump fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PumpReading {
    pub base: SensorFields,
    pub pump: PumpFields,
    pub timestamp: DateTime<Utc>,
    pub metadata: FieldSet,
}

impl PumpReading {
    /// Create a pump reading. The primary value is the flow rate in L/min.
    pub fn new(pump_id: impl Into<String>, location: impl Into<String>, pump: PumpFields) -> Self {
        let base = SensorFields::new(pump_id, PUMP_SENSOR_TYPE, location, pump.flow_rate, "L/min");
        Self {
            base,
            pump,
            timestamp: Utc::now(),
            metadata: FieldSet::new(),
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn pump_id(&self) -> &str {
        &self.base.sensor_id
    }

    /// Fields are the concatenation of the base and pump field maps.
    pub fn to_point(&self) -> Point {
        let mut fields = self.metadata.clone();
        self.base.write_fields(&mut fields);
        self.pump.write_fields(&mut fields);
        Point {
            measurement: PUMP_MEASUREMENT.to_string(),
            tags: self.base.tags(),
            fields,
            timestamp: self.timestamp,
        }
    }
}

/// A derived system metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMetric {
    pub host: String,
    pub component: String,
    pub metric_name: String,
    pub metric_value: f64,
    pub metric_unit: String,
    pub timestamp: DateTime<Utc>,
    pub additional_fields: FieldSet,
}

impl SystemMetric {
    pub fn new(
        host: impl Into<String>,
        component: impl Into<String>,
        metric_name: impl Into<String>,
        metric_value: f64,
        metric_unit: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            component: component.into(),
            metric_name: metric_name.into(),
            metric_value,
            metric_unit: metric_unit.into(),
            timestamp: Utc::now(),
            additional_fields: FieldSet::new(),
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.additional_fields.insert(key.into(), value.into());
        self
    }

    pub fn to_point(&self) -> Point {
        let mut fields = self.additional_fields.clone();
        fields.insert("metric_name".into(), self.metric_name.as_str().into());
        fields.insert("metric_value".into(), self.metric_value.into());
        fields.insert("metric_unit".into(), self.metric_unit.as_str().into());
        Point {
            measurement: METRIC_MEASUREMENT.to_string(),
            tags: TagSet::from([
                ("host".to_string(), self.host.clone()),
                ("component".to_string(), self.component.clone()),
            ]),
            fields,
            timestamp: self.timestamp,
        }
    }
}

/// An alarm raised by a hardware source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmEvent {
    pub source: String,
    pub severity: AlarmSeverity,
    pub category: String,
    pub message: String,
    /// Identifier used for acknowledgement.
    pub alarm_code: String,
    pub acknowledged: bool,
    pub timestamp: DateTime<Utc>,
    pub context: FieldSet,
}

impl AlarmEvent {
    pub fn new(
        source: impl Into<String>,
        severity: AlarmSeverity,
        alarm_code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            severity,
            category: "system".to_string(),
            message: message.into(),
            alarm_code: alarm_code.into(),
            acknowledged: false,
            timestamp: Utc::now(),
            context: FieldSet::new(),
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn to_point(&self) -> Point {
        let mut fields = self.context.clone();
        fields.insert("message".into(), self.message.as_str().into());
        fields.insert("alarm_code".into(), self.alarm_code.as_str().into());
        fields.insert("acknowledged".into(), self.acknowledged.into());
        Point {
            measurement: ALARM_MEASUREMENT.to_string(),
            tags: TagSet::from([
                ("source".to_string(), self.source.clone()),
                ("severity".to_string(), self.severity.as_ref().to_string()),
                ("category".to_string(), self.category.clone()),
            ]),
            fields,
            timestamp: self.timestamp,
        }
    }
}

/// Any reading the engine can hand to a sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reading {
    Sensor(SensorReading),
    Pump(PumpReading),
    Metric(SystemMetric),
    Alarm(AlarmEvent),
}

impl Reading {
    pub fn measurement(&self) -> &'static str {
        match self {
            Self::Sensor(_) => SENSOR_MEASUREMENT,
            Self::Pump(_) => PUMP_MEASUREMENT,
            Self::Metric(_) => METRIC_MEASUREMENT,
            Self::Alarm(_) => ALARM_MEASUREMENT,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Sensor(r) => r.timestamp,
            Self::Pump(r) => r.timestamp,
            Self::Metric(r) => r.timestamp,
            Self::Alarm(r) => r.timestamp,
        }
    }

    pub fn to_point(&self) -> Point {
        match self {
            Self::Sensor(r) => r.to_point(),
            Self::Pump(r) => r.to_point(),
            Self::Metric(r) => r.to_point(),
            Self::Alarm(r) => r.to_point(),
        }
    }
}

impl From<SensorReading> for Reading {
    fn from(r: SensorReading) -> Self {
        Self::Sensor(r)
    }
}

impl From<PumpReading> for Reading {
    fn from(r: PumpReading) -> Self {
        Self::Pump(r)
    }
}

impl From<SystemMetric> for Reading {
    fn from(r: SystemMetric) -> Self {
        Self::Metric(r)
    }
}

impl From<AlarmEvent> for Reading {
    fn from(r: AlarmEvent) -> Self {
        Self::Alarm(r)
    }
}
