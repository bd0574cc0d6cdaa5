//! Device and stream wrapper for blocking transports.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use std::path::Path;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::source::{ChannelSource, LineFeeder, LineSource};
use crate::{SerialWindowError, TransportError};

/// A source backed by a blocking reader, such as a serial device node.
///
/// Blocking reads cannot honor a timeout on their own, so a dedicated pump
/// thread reads newline-terminated lines and hands them to an internal
/// [`ChannelSource`]. The worker's reads are then bounded by the read
/// timeout no matter what the device does.
///
/// The pump thread ends at end-of-input or on a non-retryable read error;
/// the source then reports [`TransportError::Disconnected`] on every read.
///
/// # Example
///
/// ```no_run
/// use serial_window::DeviceSource;
///
/// // The port must already be configured (baud rate etc.), e.g. with `stty`.
/// let source = DeviceSource::open("/dev/ttyACM0")?;
/// # Ok::<(), serial_window::SerialWindowError>(())
/// ```
pub struct DeviceSource {
    name: String,
    lines: ChannelSource,
    writer: Option<Box<dyn Write + Send>>,
    pump: Option<JoinHandle<()>>,
}

impl DeviceSource {
    /// Opens a device or file for reading and writing.
    ///
    /// # Errors
    ///
    /// Returns `TransportOpen` if the path cannot be opened or its handle
    /// cannot be duplicated, and `WorkerSpawn` if the pump thread fails to start.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SerialWindowError> {
        let path = path.as_ref();
        let open_error = |source| SerialWindowError::TransportOpen {
            path: path.to_path_buf(),
            source,
        };

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(open_error)?;
        let writer = file.try_clone().map_err(open_error)?;

        Self::from_io(path.display().to_string(), file, Some(writer))
    }

    /// Opens a device or file for reading only.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self, SerialWindowError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .open(path)
            .map_err(|source| SerialWindowError::TransportOpen {
                path: path.to_path_buf(),
                source,
            })?;

        Self::from_io::<_, std::fs::File>(path.display().to_string(), file, None)
    }

    /// Wraps an arbitrary reader and optional writer.
    pub fn from_io<R, W>(
        name: impl Into<String>,
        reader: R,
        writer: Option<W>,
    ) -> Result<Self, SerialWindowError>
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        let name = name.into();
        let (lines, feeder) = ChannelSource::new();
        let lines = lines.with_name(name.clone());

        let pump = std::thread::Builder::new()
            .name(format!("serial-window-pump:{name}"))
            .spawn(move || pump_lines(reader, &feeder))
            .map_err(SerialWindowError::WorkerSpawn)?;

        Ok(Self {
            name,
            lines,
            writer: writer.map(|w| Box::new(w) as Box<dyn Write + Send>),
            pump: Some(pump),
        })
    }

    /// Returns `true` while the pump thread is still reading.
    pub fn is_reading(&self) -> bool {
        self.pump.as_ref().is_some_and(|pump| !pump.is_finished())
    }
}

impl LineSource for DeviceSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn try_read_line(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, TransportError> {
        self.lines.try_read_line(timeout)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let writer = self.writer.as_mut().ok_or(TransportError::Unsupported)?;
        writer.write_all(bytes)?;
        writer.flush()?;
        Ok(())
    }
}

impl Drop for DeviceSource {
    fn drop(&mut self) {
        // The pump may be parked in a blocking read; it exits on its own at
        // the next line or end-of-input once its feeder send fails.
        if let Some(pump) = self.pump.take() {
            if pump.is_finished() {
                let _ = pump.join();
            }
        }
    }
}

/// Reads lines until end-of-input, a fatal error, or the source is dropped.
fn pump_lines<R: Read>(reader: R, feeder: &LineFeeder) {
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => {
                tracing::debug!("line pump reached end of input");
                return;
            }
            Ok(_) => {
                if feeder.feed(line.clone()).is_err() {
                    return;
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => {
                // Devices opened with a read timeout report it as an error; just retry.
            }
            Err(e) => {
                tracing::warn!("line pump read error: {}", e);
                let _ = feeder.feed_error(TransportError::Io(e));
                return;
            }
        }
    }
}
