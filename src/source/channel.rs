//! Queue handoff between an external transport thread and the worker.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::source::LineSource;
use crate::TransportError;

/// A source fed through a channel by some other thread.
///
/// This is the way to plug a transport that is not a plain `Read` into the
/// worker: whoever owns the transport pushes lines into the paired
/// [`LineFeeder`], and the worker pops them with a bounded wait. Outbound
/// writes travel the other way and are picked up from the feeder.
///
/// When every feeder has been dropped, queued lines are still delivered;
/// after that each read waits out its timeout and reports
/// [`TransportError::Disconnected`].
///
/// # Example
///
/// ```
/// use serial_window::{ChannelSource, LineSource};
/// use std::time::Duration;
///
/// let (mut source, feeder) = ChannelSource::new();
/// feeder.feed("1.0,2.0").unwrap();
///
/// let line = source.try_read_line(Duration::from_millis(10)).unwrap();
/// assert_eq!(line.as_deref(), Some(&b"1.0,2.0"[..]));
/// ```
pub struct ChannelSource {
    name: String,
    lines: Receiver<Result<Vec<u8>, TransportError>>,
    writes: Sender<Vec<u8>>,
}

impl ChannelSource {
    /// Creates an unbounded source and its feeder.
    pub fn new() -> (Self, LineFeeder) {
        let (line_tx, line_rx) = crossbeam_channel::unbounded();
        Self::from_parts(line_tx, line_rx)
    }

    /// Creates a source whose queue holds at most `capacity` pending lines.
    ///
    /// [`LineFeeder::feed`] blocks while the queue is full.
    pub fn with_capacity(capacity: usize) -> (Self, LineFeeder) {
        let (line_tx, line_rx) = crossbeam_channel::bounded(capacity);
        Self::from_parts(line_tx, line_rx)
    }

    fn from_parts(
        line_tx: Sender<Result<Vec<u8>, TransportError>>,
        line_rx: Receiver<Result<Vec<u8>, TransportError>>,
    ) -> (Self, LineFeeder) {
        let (write_tx, write_rx) = crossbeam_channel::unbounded();
        let source = Self {
            name: "channel".to_string(),
            lines: line_rx,
            writes: write_tx,
        };
        let feeder = LineFeeder {
            lines: line_tx,
            writes: write_rx,
        };
        (source, feeder)
    }

    /// Sets a custom name used in logs.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl LineSource for ChannelSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn try_read_line(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, TransportError> {
        match self.lines.recv_timeout(timeout) {
            Ok(Ok(line)) => Ok(Some(line)),
            Ok(Err(error)) => Err(error),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                // Hold the caller for the full timeout so a dead feeder does
                // not turn the read loop into a spin.
                std::thread::sleep(timeout);
                Err(TransportError::Disconnected)
            }
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.writes
            .send(bytes.to_vec())
            .map_err(|_| TransportError::Disconnected)
    }
}

/// The producing half of a [`ChannelSource`].
///
/// Cloneable; the source reports a disconnect once every clone is dropped.
#[derive(Clone)]
pub struct LineFeeder {
    lines: Sender<Result<Vec<u8>, TransportError>>,
    writes: Receiver<Vec<u8>>,
}

impl LineFeeder {
    /// Queues one raw line for the worker.
    pub fn feed(&self, line: impl Into<Vec<u8>>) -> Result<(), TransportError> {
        self.lines
            .send(Ok(line.into()))
            .map_err(|_| TransportError::Disconnected)
    }

    /// Queues a transport error, delivered to the worker in order with lines.
    pub fn feed_error(&self, error: TransportError) -> Result<(), TransportError> {
        self.lines
            .send(Err(error))
            .map_err(|_| TransportError::Disconnected)
    }

    /// Returns the next outbound write without waiting.
    pub fn try_recv_write(&self) -> Option<Vec<u8>> {
        self.writes.try_recv().ok()
    }

    /// Waits up to `timeout` for the next outbound write.
    pub fn recv_write_timeout(&self, timeout: Duration) -> Option<Vec<u8>> {
        self.writes.recv_timeout(timeout).ok()
    }

    /// Returns the number of lines waiting to be read.
    pub fn pending(&self) -> usize {
        self.lines.len()
    }
}
