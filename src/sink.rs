//! Sink Layer
//!
//! Batched persistence of readings into external time-series storage.
//!
//! - [`BatchSink`]: core trait with connection lifecycle and bounded retry
//! - [`InfluxSink`]: InfluxDB v2 HTTP write API
//! - [`StdoutSink`]: line protocol to stdout, for dry runs

pub mod influx;
pub mod stdout;
mod traits;

pub use influx::{InfluxConfig, InfluxSink};
pub use stdout::StdoutSink;
pub use traits::{BatchSink, SinkError};
