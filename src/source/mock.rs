//! Mock line source for testing without hardware.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::source::LineSource;
use crate::{Record, TransportError};

enum MockStep {
    Line(Vec<u8>),
    Error(String),
    Silence,
}

/// A scripted line source that replays lines, errors and silence.
///
/// Once the script runs out the source behaves like a device that never
/// sends anything: every read waits out its timeout and returns `Ok(None)`.
/// This allows testing the full pipeline without hardware, making it
/// suitable for CI environments.
///
/// # Example
///
/// ```
/// use serial_window::{LineSource, MockSource};
/// use std::time::Duration;
///
/// let mut mock = MockSource::new()
///     .line("10,20")
///     .comment("header")
///     .transport_error("framing error")
///     .silence();
///
/// // Generate 3 records of the form "k,k" for k = 0..3
/// mock.generate_ramp(3, 2);
///
/// let first = mock.try_read_line(Duration::from_millis(1)).unwrap();
/// assert_eq!(first.as_deref(), Some(&b"10,20"[..]));
/// ```
pub struct MockSource {
    name: String,
    steps: VecDeque<MockStep>,
    writes: MockWrites,
    fail_writes: bool,
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSource {
    /// Creates an empty mock source.
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            steps: VecDeque::new(),
            writes: MockWrites::default(),
            fail_writes: false,
        }
    }

    /// Creates a mock source that never returns data.
    pub fn silent() -> Self {
        Self::new().with_name("silent")
    }

    /// Creates a mock source that replays the given lines in order.
    pub fn from_lines<I, L>(lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Vec<u8>>,
    {
        let mut mock = Self::new();
        for line in lines {
            mock.push_line(line);
        }
        mock
    }

    /// Sets a custom name used in logs.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Appends a raw line.
    #[must_use]
    pub fn line(mut self, line: impl Into<Vec<u8>>) -> Self {
        self.push_line(line);
        self
    }

    /// Appends a `#` comment line.
    #[must_use]
    pub fn comment(self, text: &str) -> Self {
        self.line(format!("# {text}"))
    }

    /// Appends a read that fails with a transport error.
    #[must_use]
    pub fn transport_error(mut self, message: impl Into<String>) -> Self {
        self.steps.push_back(MockStep::Error(message.into()));
        self
    }

    /// Appends a read that times out with no data.
    #[must_use]
    pub fn silence(mut self) -> Self {
        self.steps.push_back(MockStep::Silence);
        self
    }

    /// Makes every outbound write fail.
    #[must_use]
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Appends a raw line.
    pub fn push_line(&mut self, line: impl Into<Vec<u8>>) {
        self.steps.push_back(MockStep::Line(line.into()));
    }

    /// Appends one line per record, formatted as comma-separated text.
    pub fn push_records(&mut self, records: &[Record]) {
        for record in records {
            self.push_line(format!("{record}\n"));
        }
    }

    /// Appends `count` lines where every field of line `k` is `k`.
    pub fn generate_ramp(&mut self, count: usize, channels: usize) {
        for k in 0..count {
            let line = vec![k.to_string(); channels].join(",");
            self.push_line(format!("{line}\n"));
        }
    }

    /// Returns the number of scripted steps not yet consumed.
    pub fn remaining(&self) -> usize {
        self.steps.len()
    }

    /// Returns a handle to the writes this source receives.
    ///
    /// Take the handle before moving the source into a worker.
    pub fn writes(&self) -> MockWrites {
        self.writes.clone()
    }
}

impl LineSource for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn try_read_line(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, TransportError> {
        match self.steps.pop_front() {
            Some(MockStep::Line(line)) => Ok(Some(line)),
            Some(MockStep::Error(message)) => Err(TransportError::Custom(message)),
            Some(MockStep::Silence) | None => {
                std::thread::sleep(timeout);
                Ok(None)
            }
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if self.fail_writes {
            return Err(TransportError::custom("mock write failure"));
        }
        self.writes.0.lock().push(bytes.to_vec());
        Ok(())
    }
}

/// Shared record of the bytes written to a [`MockSource`].
#[derive(Debug, Clone, Default)]
pub struct MockWrites(Arc<Mutex<Vec<Vec<u8>>>>);

impl MockWrites {
    /// Returns the number of writes received so far.
    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    /// Takes all writes received so far, clearing the record.
    pub fn take(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut *self.0.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(1);

    #[test]
    fn test_mock_replays_script() {
        let mut mock = MockSource::new()
            .line("1,2")
            .transport_error("glitch")
            .silence()
            .comment("done");

        assert_eq!(mock.remaining(), 4);
        assert_eq!(mock.try_read_line(TICK).unwrap(), Some(b"1,2".to_vec()));
        assert_eq!(mock.try_read_line(TICK).unwrap_err().to_string(), "glitch");
        assert_eq!(mock.try_read_line(TICK).unwrap(), None);
        assert_eq!(mock.try_read_line(TICK).unwrap(), Some(b"# done".to_vec()));
        assert_eq!(mock.remaining(), 0);
    }

    #[test]
    fn test_mock_idles_after_script() {
        let mut mock = MockSource::silent();
        let started = std::time::Instant::now();
        assert_eq!(mock.try_read_line(Duration::from_millis(20)).unwrap(), None);
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_mock_ramp() {
        let mut mock = MockSource::new();
        mock.generate_ramp(3, 2);

        let lines: Vec<_> = (0..3)
            .map(|_| mock.try_read_line(TICK).unwrap().unwrap())
            .collect();
        assert_eq!(lines, vec![b"0,0\n".to_vec(), b"1,1\n".to_vec(), b"2,2\n".to_vec()]);
    }

    #[test]
    fn test_mock_records() {
        let mut mock = MockSource::new();
        mock.push_records(&[Record::new(vec![1.5, -2.0])]);
        assert_eq!(
            mock.try_read_line(TICK).unwrap(),
            Some(b"1.5,-2\n".to_vec())
        );
    }

    #[test]
    fn test_mock_from_lines() {
        let mut mock = MockSource::from_lines(["a", "b"]);
        assert_eq!(mock.remaining(), 2);
        assert_eq!(mock.try_read_line(TICK).unwrap(), Some(b"a".to_vec()));
    }

    #[test]
    fn test_mock_writes() {
        let mut mock = MockSource::new();
        let writes = mock.writes();
        assert!(writes.is_empty());

        mock.write(b"hello").unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes.take(), vec![b"hello".to_vec()]);
        assert!(writes.is_empty());
    }

    #[test]
    fn test_mock_failing_writes() {
        let mut mock = MockSource::new().failing_writes();
        assert!(mock.write(b"x").is_err());
        assert!(mock.writes().is_empty());
    }
}
