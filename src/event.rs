//! Runtime events for monitoring ingestion health.
//!
//! Events are non-fatal notifications about pipeline behavior. Ingestion
//! continues after events are emitted - they're for logging/metrics,
//! not error handling.

use std::sync::Arc;

use crate::ParseError;

/// Runtime events emitted by the ingestion worker and render loop.
///
/// These are informational events, not errors. The worker keeps running
/// after any event is emitted. Use the [`EventCallback`] to log these or
/// update metrics.
///
/// # Example
///
/// ```
/// use serial_window::WindowEvent;
///
/// fn handle_event(event: WindowEvent) {
///     match event {
///         WindowEvent::WorkerStarted => eprintln!("ingestion started"),
///         WindowEvent::WorkerStopped { records_committed } => {
///             eprintln!("ingestion stopped after {records_committed} records");
///         }
///         WindowEvent::LineReceived { line } => eprintln!("{line}"),
///         WindowEvent::ParseFailed { error } => {
///             eprintln!("skipped {:?}: {}", error.raw(), error.reason());
///         }
///         WindowEvent::TransportFailed { error } => eprintln!("transport: {error}"),
///         WindowEvent::WriteFailed { error } => eprintln!("write: {error}"),
///         WindowEvent::RendererError { renderer_name, error } => {
///             eprintln!("renderer '{renderer_name}': {error}");
///         }
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub enum WindowEvent {
    /// The ingestion thread entered its read loop.
    WorkerStarted,

    /// The ingestion thread left its read loop.
    WorkerStopped {
        /// Total records committed over the worker's lifetime.
        records_committed: u64,
    },

    /// A non-empty line arrived from the source.
    ///
    /// Emitted for every decoded line, including comments, before parsing.
    LineReceived {
        /// The trimmed line.
        line: String,
    },

    /// A line was malformed and skipped. The window was not modified.
    ParseFailed {
        /// What was wrong, including the offending line.
        error: ParseError,
    },

    /// Reading from the source failed.
    ///
    /// The worker keeps polling; this event repeats until the source
    /// recovers or the worker is stopped.
    TransportFailed {
        /// Description of the error.
        error: String,
    },

    /// An outbound write to the source failed.
    WriteFailed {
        /// Description of the error.
        error: String,
    },

    /// A renderer returned an error for one frame.
    RendererError {
        /// Name of the renderer that errored.
        renderer_name: String,
        /// Description of the error.
        error: String,
    },
}

/// Callback type for receiving runtime events.
///
/// Register an event callback via [`SerialWindowBuilder::on_event()`] or
/// [`IngestionWorker::with_event_callback()`].
///
/// [`SerialWindowBuilder::on_event()`]: crate::SerialWindowBuilder::on_event
/// [`IngestionWorker::with_event_callback()`]: crate::IngestionWorker::with_event_callback
///
/// # Example
///
/// ```ignore
/// use serial_window::{SerialWindow, WindowEvent};
///
/// let session = SerialWindow::builder()
///     .source(source)
///     .on_event(|event| {
///         tracing::warn!(?event, "window event");
///     })
///     .start()
///     .await?;
/// ```
pub type EventCallback = Arc<dyn Fn(WindowEvent) + Send + Sync>;

/// Creates an [`EventCallback`] from a closure.
///
/// # Example
///
/// ```
/// use serial_window::{event_callback, WindowEvent};
///
/// let callback = event_callback(|event| {
///     println!("Got event: {:?}", event);
/// });
/// callback(WindowEvent::WorkerStarted);
/// ```
pub fn event_callback<F>(f: F) -> EventCallback
where
    F: Fn(WindowEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_event_debug() {
        let event = WindowEvent::WorkerStopped {
            records_committed: 42,
        };
        let debug = format!("{event:?}");
        assert!(debug.contains("WorkerStopped"));
        assert!(debug.contains("42"));
    }

    #[test]
    fn test_window_event_clone() {
        let event = WindowEvent::ParseFailed {
            error: ParseError::ArityMismatch {
                expected: 2,
                found: 1,
                raw: "5".to_string(),
            },
        };
        if let WindowEvent::ParseFailed { error } = event.clone() {
            assert_eq!(error.raw(), "5");
        } else {
            panic!("Expected ParseFailed variant");
        }
    }

    #[test]
    fn test_event_callback_helper() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let called = Arc::new(AtomicBool::new(false));
        let called_clone = called.clone();

        let callback = event_callback(move |_| {
            called_clone.store(true, Ordering::SeqCst);
        });

        callback(WindowEvent::WorkerStarted);
        assert!(called.load(Ordering::SeqCst));
    }
}
