//! Error types for serial-window.
//!
//! Errors are split into two categories:
//! - **Fatal errors** ([`SerialWindowError`]): Prevent the worker or session from starting
//! - **Recoverable errors** ([`TransportError`], [`ParseError`], [`RenderError`]): Handled
//!   inside the pipeline and surfaced via [`EventCallback`](crate::EventCallback)

use std::path::PathBuf;

use crate::pipeline::WorkerState;

/// Fatal errors that prevent ingestion from starting.
///
/// These errors are returned from [`IngestionWorker::start()`] and
/// [`SerialWindowBuilder::start()`]. Runtime issues (malformed lines, flaky
/// transports) never end up here; they are reported via the event callback.
///
/// [`IngestionWorker::start()`]: crate::IngestionWorker::start
/// [`SerialWindowBuilder::start()`]: crate::SerialWindowBuilder::start
#[derive(Debug, thiserror::Error)]
pub enum SerialWindowError {
    /// The configuration failed validation.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What was wrong with the configuration.
        reason: String,
    },

    /// No line source was configured before starting.
    #[error("no line source configured - call source() before start()")]
    NoSourceConfigured,

    /// The transport could not be opened.
    #[error("failed to open transport {path}: {source}")]
    TransportOpen {
        /// Path of the device or file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The operation is not allowed in the worker's current state.
    #[error("operation not allowed while worker is {state:?}")]
    InvalidState {
        /// The state the worker was in.
        state: WorkerState,
    },

    /// The ingestion thread could not be spawned.
    #[error("failed to spawn ingestion thread: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    /// The ingestion thread panicked.
    #[error("ingestion thread panicked")]
    WorkerPanicked,

    /// The worker no longer accepts outbound writes.
    #[error("worker is not accepting writes")]
    WorkerClosed,

    /// A renderer failed during initialization.
    #[error("renderer '{renderer_name}' failed to start: {reason}")]
    RendererStartFailed {
        /// Name of the renderer that failed.
        renderer_name: String,
        /// Why the renderer failed to start.
        reason: String,
    },
}

impl SerialWindowError {
    /// Creates an invalid configuration error with the given reason.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

/// Errors reported by a [`LineSource`](crate::LineSource).
///
/// Transport errors are never fatal to the worker: the read loop reports
/// them and keeps polling until the source recovers or the worker stops.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// I/O error from the underlying device.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The producing side of the transport has gone away.
    #[error("transport disconnected")]
    Disconnected,

    /// The source does not support the requested operation.
    #[error("operation not supported by this source")]
    Unsupported,

    /// Custom error for user-implemented sources.
    #[error("{0}")]
    Custom(String),
}

impl TransportError {
    /// Creates a custom transport error with the given message.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}

/// A line that could not be turned into a record.
///
/// Always carries the offending raw text so it can be logged verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// A field did not parse as a floating-point value.
    #[error("non-numeric field {field:?} in line {raw:?}")]
    NonNumeric {
        /// The field that failed to parse.
        field: String,
        /// The full line.
        raw: String,
    },

    /// The line had the wrong number of fields.
    #[error("arity mismatch: expected {expected} fields, found {found} in line {raw:?}")]
    ArityMismatch {
        /// Configured number of channels.
        expected: usize,
        /// Number of fields in the line.
        found: usize,
        /// The full line.
        raw: String,
    },

    /// The line was not valid UTF-8.
    #[error("line is not valid UTF-8: {raw:?}")]
    InvalidUtf8 {
        /// Lossy rendering of the bytes received.
        raw: String,
    },
}

impl ParseError {
    /// Returns the offending raw line.
    pub fn raw(&self) -> &str {
        match self {
            Self::NonNumeric { raw, .. }
            | Self::ArityMismatch { raw, .. }
            | Self::InvalidUtf8 { raw } => raw,
        }
    }

    /// Returns a short, stable description of the failure.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NonNumeric { .. } => "non-numeric field",
            Self::ArityMismatch { .. } => "arity mismatch",
            Self::InvalidUtf8 { .. } => "invalid utf-8",
        }
    }
}

/// A record was handed to the buffer with the wrong number of values.
///
/// This is a programmer error: the parser guarantees arity before a record
/// reaches the buffer. The buffer refuses the commit instead of corrupting
/// its layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommitError {
    /// Record length differs from the buffer's channel count.
    #[error("record has {found} values but buffer has {expected} channels")]
    ArityMismatch {
        /// Channel count of the buffer.
        expected: usize,
        /// Length of the rejected record.
        found: usize,
    },
}

/// Errors that can occur within a [`Renderer`](crate::Renderer) implementation.
///
/// Renderer errors are recoverable - the render loop emits a
/// [`WindowEvent::RendererError`] and tries again on the next tick.
///
/// [`WindowEvent::RendererError`]: crate::WindowEvent::RendererError
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The receiving channel was closed.
    #[error("channel closed")]
    ChannelClosed,

    /// Custom error for user-implemented renderers.
    #[error("{0}")]
    Custom(String),
}

impl RenderError {
    /// Creates a custom render error with the given message.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_display() {
        let err = SerialWindowError::invalid_config("n_points must be positive");
        assert_eq!(
            err.to_string(),
            "invalid configuration: n_points must be positive"
        );
    }

    #[test]
    fn test_transport_open_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such device");
        let err = SerialWindowError::TransportOpen {
            path: "/dev/ttyACM9".into(),
            source: io_err,
        };
        assert!(err.to_string().contains("/dev/ttyACM9"));
    }

    #[test]
    fn test_parse_error_accessors() {
        let err = ParseError::NonNumeric {
            field: "x".to_string(),
            raw: "1,2,x".to_string(),
        };
        assert_eq!(err.raw(), "1,2,x");
        assert_eq!(err.reason(), "non-numeric field");

        let err = ParseError::ArityMismatch {
            expected: 3,
            found: 2,
            raw: "1,2".to_string(),
        };
        assert_eq!(err.raw(), "1,2");
        assert_eq!(err.reason(), "arity mismatch");
    }

    #[test]
    fn test_transport_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow");
        let err: TransportError = io_err.into();
        assert!(matches!(err, TransportError::Io(_)));
    }

    #[test]
    fn test_render_error_custom() {
        let err = RenderError::custom("display gone");
        assert_eq!(err.to_string(), "display gone");
    }
}
