//! Line source abstraction and built-in transports.
//!
//! A [`LineSource`] is whatever the ingestion worker reads lines from: a
//! serial device, a pipe, a queue fed by another thread. The worker owns
//! its source exclusively and calls it from a single thread.

mod channel;
mod device;
mod mock;

pub use channel::{ChannelSource, LineFeeder};
pub use device::DeviceSource;
pub use mock::{MockSource, MockWrites};

use std::time::Duration;

use crate::TransportError;

/// A line-oriented transport.
///
/// # Implementation Notes
///
/// - `try_read_line` must return within roughly `timeout`; the worker only
///   checks for stop requests between reads
/// - Returning `Ok(None)` means "nothing yet" and is not an error
/// - Errors are reported and the worker keeps polling, so a permanently
///   broken source should still honor `timeout` instead of failing instantly
/// - Line terminators may be included in the returned bytes; the worker
///   trims them
///
/// # Example
///
/// ```
/// use serial_window::{LineSource, TransportError};
/// use std::time::Duration;
///
/// struct Counter(u32);
///
/// impl LineSource for Counter {
///     fn try_read_line(&mut self, _timeout: Duration) -> Result<Option<Vec<u8>>, TransportError> {
///         self.0 += 1;
///         Ok(Some(format!("{},{}", self.0, self.0 * 2).into_bytes()))
///     }
/// }
/// ```
pub trait LineSource: Send {
    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "line-source"
    }

    /// Waits up to `timeout` for the next line.
    fn try_read_line(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, TransportError>;

    /// Sends bytes to the other end of the transport.
    ///
    /// Default implementation reports [`TransportError::Unsupported`].
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let _ = bytes;
        Err(TransportError::Unsupported)
    }
}

impl<S: LineSource + ?Sized> LineSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn try_read_line(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, TransportError> {
        (**self).try_read_line(timeout)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ReadOnly;

    impl LineSource for ReadOnly {
        fn try_read_line(&mut self, _timeout: Duration) -> Result<Option<Vec<u8>>, TransportError> {
            Ok(None)
        }
    }

    #[test]
    fn test_default_write_unsupported() {
        let mut source = ReadOnly;
        assert!(matches!(
            source.write(b"ping"),
            Err(TransportError::Unsupported)
        ));
        assert_eq!(source.name(), "line-source");
    }

    #[test]
    fn test_boxed_source_delegates() {
        let mut source: Box<dyn LineSource> = Box::new(ReadOnly);
        assert!(source.try_read_line(Duration::ZERO).unwrap().is_none());
    }

    #[test]
    fn test_source_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Box<dyn LineSource>>();
    }
}
