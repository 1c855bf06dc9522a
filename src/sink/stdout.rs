//! Line-protocol sink writing to stdout or any writer.
//!
//! Useful for dry runs without a database.

use std::io::Write;

use crate::reading::Reading;
use crate::sink::{BatchSink, SinkError};

/// Sink printing one line-protocol line per reading.
pub struct StdoutSink {
    writer: Box<dyn Write + Send>,
    connected: bool,
    write_errors: u64,
    points_written: u64,
}

impl std::fmt::Debug for StdoutSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdoutSink")
            .field("connected", &self.connected)
            .field("points_written", &self.points_written)
            .finish_non_exhaustive()
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl StdoutSink {
    pub fn new() -> Self {
        Self::with_writer(std::io::stdout())
    }

    /// Write to an arbitrary writer instead of stdout.
    pub fn with_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Box::new(writer),
            connected: false,
            write_errors: 0,
            points_written: 0,
        }
    }

    pub fn points_written(&self) -> u64 {
        self.points_written
    }

    fn write_lines(&mut self, readings: &[Reading]) -> std::io::Result<()> {
        let mut out = String::new();
        for reading in readings {
            out.push_str(&reading.to_point().to_line_protocol());
            out.push('\n');
        }
        self.writer.write_all(out.as_bytes())?;
        self.writer.flush()
    }
}

#[async_trait::async_trait]
impl BatchSink for StdoutSink {
    async fn connect(&mut self) -> Result<(), SinkError> {
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) {
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn write_batch(&mut self, readings: Vec<Reading>) -> Result<(), SinkError> {
        if readings.is_empty() {
            return Ok(());
        }
        if !self.connected {
            self.write_errors += 1;
            return Err(SinkError::NotConnected);
        }

        match self.write_lines(&readings) {
            Ok(()) => {
                self.points_written += readings.len() as u64;
                Ok(())
            }
            Err(e) => {
                self.write_errors += 1;
                Err(e.into())
            }
        }
    }

    fn write_errors(&self) -> u64 {
        self.write_errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::{AlarmEvent, AlarmSeverity, SensorFields, SensorReading};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Accepts a single write call, then fails.
    #[derive(Default)]
    struct OneShotWriter {
        calls: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl Write for OneShotWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let mut calls = self.calls.lock().unwrap();
            if !calls.is_empty() {
                return Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"));
            }
            calls.push(buf.to_vec());
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_batch_is_written_in_one_call() {
        let writer = OneShotWriter::default();
        let calls = Arc::clone(&writer.calls);
        let mut sink = StdoutSink::with_writer(writer);
        sink.connect().await.unwrap();

        sink.write_batch(vec![
            SensorReading::new(SensorFields::new("t1", "temperature", "inlet", 1.0, "C")).into(),
            SensorReading::new(SensorFields::new("t2", "temperature", "outlet", 2.0, "C")).into(),
            AlarmEvent::new("sim", AlarmSeverity::Error, "E1", "fault").into(),
        ])
        .await
        .unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(String::from_utf8_lossy(&calls[0]).lines().count(), 3);
        assert_eq!(sink.points_written(), 3);
        assert_eq!(sink.write_errors(), 0);
    }

    #[tokio::test]
    async fn test_writes_one_line_per_reading() {
        let buf = SharedBuf::default();
        let mut sink = StdoutSink::with_writer(buf.clone());
        sink.connect().await.unwrap();

        sink.write_batch(vec![
            SensorReading::new(SensorFields::new("t1", "temperature", "inlet", 1.0, "C")).into(),
            AlarmEvent::new("sim", AlarmSeverity::Error, "E1", "fault").into(),
        ])
        .await
        .unwrap();

        let out = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("sensors,"));
        assert!(lines[1].starts_with("alarms,"));
        assert_eq!(sink.points_written(), 2);
    }

    #[tokio::test]
    async fn test_io_failure_counts_error() {
        let mut sink = StdoutSink::with_writer(BrokenPipe);
        sink.connect().await.unwrap();

        let result = sink
            .write_batch(vec![
                SensorReading::new(SensorFields::new("t1", "x", "y", 1.0, "")).into(),
            ])
            .await;
        assert!(matches!(result, Err(SinkError::Io(_))));
        assert_eq!(sink.write_errors(), 1);

        assert!(sink.write_batch(Vec::new()).await.is_ok());
        assert_eq!(sink.write_errors(), 1);
    }
}
