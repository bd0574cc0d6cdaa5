//! Ingestion worker - reads lines from the source, parses them, commits records.
//!
//! The worker owns its [`LineSource`] and runs on a dedicated thread:
//! - Reading one line at a time with a bounded wait
//! - Decoding and parsing outside of any lock
//! - Committing records into the shared [`WindowBuffer`]
//! - Forwarding queued outbound writes to the source
//! - Reporting malformed lines and transport failures without stopping

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

use crate::event::EventCallback;
use crate::format::{decode_line, LineParser, ParsedLine};
use crate::pipeline::WindowBuffer;
use crate::source::LineSource;
use crate::{
    ParseError, Record, SerialWindowError, Snapshot, TransportError, WindowConfig, WindowEvent,
};

/// Name given to the ingestion thread.
const INGEST_THREAD_NAME: &str = "serial-window-ingest";

/// Lifecycle of an [`IngestionWorker`].
///
/// `Idle → Running → Stopping → Stopped`. `Stopped` is terminal; build a
/// new worker to resume ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// Created, not started.
    Idle,
    /// The read loop is active.
    Running,
    /// Stop requested; the loop exits within one read timeout.
    Stopping,
    /// The read loop has exited (or the worker was stopped before starting).
    Stopped,
}

impl WorkerState {
    fn to_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Running => 1,
            Self::Stopping => 2,
            Self::Stopped => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Running,
            2 => Self::Stopping,
            _ => Self::Stopped,
        }
    }
}

/// Counters describing what the worker has seen so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Lines read and fully handled, including blank and comment lines.
    ///
    /// A line is counted after it has been committed, skipped or rejected,
    /// so once this reaches `n` the first `n` lines are reflected in the window.
    pub lines_received: u64,
    /// Records committed to the window.
    pub records_committed: u64,
    /// Blank and comment lines ignored.
    pub comments_skipped: u64,
    /// Lines rejected as malformed.
    pub parse_errors: u64,
    /// Failed read attempts.
    pub transport_errors: u64,
    /// Outbound writes delivered to the source.
    pub writes_sent: u64,
    /// Outbound writes the source rejected.
    pub write_failures: u64,
}

/// State shared between the worker handle, its thread and readers.
pub(crate) struct WorkerShared {
    state: AtomicU8,
    buffer: WindowBuffer,
    lines_received: AtomicU64,
    comments_skipped: AtomicU64,
    parse_errors: AtomicU64,
    transport_errors: AtomicU64,
    writes_sent: AtomicU64,
    write_failures: AtomicU64,
}

impl WorkerShared {
    fn new(buffer: WindowBuffer) -> Self {
        Self {
            state: AtomicU8::new(WorkerState::Idle.to_u8()),
            buffer,
            lines_received: AtomicU64::new(0),
            comments_skipped: AtomicU64::new(0),
            parse_errors: AtomicU64::new(0),
            transport_errors: AtomicU64::new(0),
            writes_sent: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
        }
    }

    fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: WorkerState) {
        self.state.store(state.to_u8(), Ordering::SeqCst);
    }

    fn transition(&self, from: WorkerState, to: WorkerState) -> Result<(), WorkerState> {
        self.state
            .compare_exchange(from.to_u8(), to.to_u8(), Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(WorkerState::from_u8)
    }

    /// Moves to `Stopping` (or straight to `Stopped` if never started).
    ///
    /// Runs under the buffer lock, and commits re-check the state under the
    /// same lock, so no commit lands after this returns.
    fn request_stop(&self) {
        self.buffer.fence(|| {
            if self
                .transition(WorkerState::Running, WorkerState::Stopping)
                .is_err()
            {
                let _ = self.transition(WorkerState::Idle, WorkerState::Stopped);
            }
        });
    }

    fn stats(&self) -> WorkerStats {
        WorkerStats {
            lines_received: self.lines_received.load(Ordering::SeqCst),
            records_committed: self.buffer.sequence(),
            comments_skipped: self.comments_skipped.load(Ordering::SeqCst),
            parse_errors: self.parse_errors.load(Ordering::SeqCst),
            transport_errors: self.transport_errors.load(Ordering::SeqCst),
            writes_sent: self.writes_sent.load(Ordering::SeqCst),
            write_failures: self.write_failures.load(Ordering::SeqCst),
        }
    }
}

/// Read-only handle to a worker's window.
///
/// Cheap to clone and safe to use from any thread. Readers can take
/// snapshots and observe the lifecycle, but cannot mutate the window or
/// control the worker.
#[derive(Clone)]
pub struct WindowReader {
    shared: Arc<WorkerShared>,
}

impl WindowReader {
    /// Takes an independent copy of the current window.
    pub fn snapshot(&self) -> Snapshot {
        self.shared.buffer.snapshot()
    }

    /// Returns the worker's current lifecycle state.
    pub fn state(&self) -> WorkerState {
        self.shared.state()
    }

    /// Returns current counters.
    pub fn stats(&self) -> WorkerStats {
        self.shared.stats()
    }

    /// Returns the total number of records committed so far.
    pub fn sequence(&self) -> u64 {
        self.shared.buffer.sequence()
    }

    /// Returns the number of channels.
    pub fn n_channels(&self) -> usize {
        self.shared.buffer.n_channels()
    }

    /// Returns the window length.
    pub fn n_points(&self) -> usize {
        self.shared.buffer.n_points()
    }
}

impl std::fmt::Debug for WindowReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowReader")
            .field("state", &self.state())
            .field("buffer", &self.shared.buffer)
            .finish()
    }
}

/// Owns a line source and keeps the window up to date from it.
///
/// # Lifecycle
///
/// 1. Created `Idle` by [`new()`](Self::new)
/// 2. [`start()`](Self::start) spawns the ingestion thread (`Running`)
/// 3. [`stop()`](Self::stop) requests shutdown (`Stopping`); from this point
///    no further records are committed
/// 4. [`join()`](Self::join) waits for the thread to leave its loop
///    (`Stopped`), which takes at most about one read timeout
///
/// Dropping a running worker requests a stop but does not wait for it.
///
/// # Example
///
/// ```
/// use serial_window::{IngestionWorker, MockSource, WindowConfig, WorkerState};
/// use std::time::Duration;
///
/// let source = MockSource::new().line("1,2").line("3,4");
/// let config = WindowConfig {
///     n_points: 4,
///     read_timeout: Duration::from_millis(5),
///     ..Default::default()
/// };
///
/// let mut worker = IngestionWorker::new(source, config)?;
/// worker.start()?;
/// while worker.stats().records_committed < 2 {
///     std::thread::sleep(Duration::from_millis(1));
/// }
/// worker.shutdown()?;
///
/// assert_eq!(worker.state(), WorkerState::Stopped);
/// assert_eq!(worker.snapshot().channel(0)[2..], [1.0, 3.0]);
/// # Ok::<(), serial_window::SerialWindowError>(())
/// ```
pub struct IngestionWorker {
    shared: Arc<WorkerShared>,
    config: WindowConfig,
    source: Option<Box<dyn LineSource>>,
    event_callback: Option<EventCallback>,
    write_tx: Sender<Vec<u8>>,
    write_rx: Option<Receiver<Vec<u8>>>,
    handle: Option<JoinHandle<()>>,
}

impl IngestionWorker {
    /// Creates an idle worker reading from `source`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration fails validation.
    pub fn new(
        source: impl LineSource + 'static,
        config: WindowConfig,
    ) -> Result<Self, SerialWindowError> {
        let buffer = WindowBuffer::from_config(&config)?;
        let (write_tx, write_rx) = crossbeam_channel::unbounded();

        Ok(Self {
            shared: Arc::new(WorkerShared::new(buffer)),
            config,
            source: Some(Box::new(source)),
            event_callback: None,
            write_tx,
            write_rx: Some(write_rx),
            handle: None,
        })
    }

    /// Sets the callback that receives runtime events.
    #[must_use]
    pub fn with_event_callback(mut self, callback: EventCallback) -> Self {
        self.event_callback = Some(callback);
        self
    }

    /// Returns the configuration this worker was built with.
    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Spawns the ingestion thread.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the worker is `Idle`, and `WorkerSpawn`
    /// if the thread cannot be created (the worker is then `Stopped`).
    pub fn start(&mut self) -> Result<(), SerialWindowError> {
        self.shared
            .transition(WorkerState::Idle, WorkerState::Running)
            .map_err(|state| SerialWindowError::InvalidState { state })?;

        let (Some(source), Some(writes)) = (self.source.take(), self.write_rx.take()) else {
            self.shared.set_state(WorkerState::Stopped);
            return Err(SerialWindowError::InvalidState {
                state: WorkerState::Stopped,
            });
        };

        let ingest = IngestLoop {
            shared: Arc::clone(&self.shared),
            source,
            parser: LineParser::new(self.config.n_channels),
            read_timeout: self.config.read_timeout,
            writes,
            event_callback: self.event_callback.clone(),
        };

        let handle = std::thread::Builder::new()
            .name(INGEST_THREAD_NAME.to_string())
            .spawn(move || ingest.run())
            .map_err(|e| {
                self.shared.set_state(WorkerState::Stopped);
                SerialWindowError::WorkerSpawn(e)
            })?;

        self.handle = Some(handle);
        Ok(())
    }

    /// Requests the read loop to stop.
    ///
    /// Does not interrupt a read in progress; the loop notices within one
    /// read timeout. Once this returns, no further records are committed.
    /// Stopping an idle worker moves it straight to `Stopped`.
    pub fn stop(&self) {
        self.shared.request_stop();
    }

    /// Waits for the ingestion thread to exit and returns final counters.
    ///
    /// Call [`stop()`](Self::stop) first; otherwise this waits until the
    /// worker is stopped from elsewhere. Returns immediately if the worker
    /// was never started or has already been joined.
    ///
    /// # Errors
    ///
    /// Returns `WorkerPanicked` if the ingestion thread panicked.
    pub fn join(&mut self) -> Result<WorkerStats, SerialWindowError> {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                self.shared.set_state(WorkerState::Stopped);
                tracing::error!("ingestion thread panicked");
                return Err(SerialWindowError::WorkerPanicked);
            }
        }
        Ok(self.shared.stats())
    }

    /// Stops the worker and waits for the ingestion thread to exit.
    pub fn shutdown(&mut self) -> Result<WorkerStats, SerialWindowError> {
        self.stop();
        self.join()
    }

    /// Queues bytes to be written to the source.
    ///
    /// Writes are forwarded by the ingestion thread between reads, so
    /// delivery may lag by up to one read timeout. Delivery failures are
    /// reported as [`WindowEvent::WriteFailed`].
    ///
    /// # Errors
    ///
    /// Returns `WorkerClosed` once the worker is stopping or stopped.
    pub fn write(&self, bytes: impl Into<Vec<u8>>) -> Result<(), SerialWindowError> {
        match self.shared.state() {
            WorkerState::Idle | WorkerState::Running => self
                .write_tx
                .send(bytes.into())
                .map_err(|_| SerialWindowError::WorkerClosed),
            WorkerState::Stopping | WorkerState::Stopped => Err(SerialWindowError::WorkerClosed),
        }
    }

    /// Takes an independent copy of the current window.
    pub fn snapshot(&self) -> Snapshot {
        self.shared.buffer.snapshot()
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> WorkerState {
        self.shared.state()
    }

    /// Returns current counters.
    pub fn stats(&self) -> WorkerStats {
        self.shared.stats()
    }

    /// Returns a read-only handle for consumers on other threads.
    pub fn reader(&self) -> WindowReader {
        WindowReader {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Returns `true` if the ingestion thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for IngestionWorker {
    fn drop(&mut self) {
        if self.handle.is_some() {
            // Worker dropped without shutdown() - let the thread wind down on its own
            self.shared.request_stop();
        }
    }
}

/// The state moved onto the ingestion thread.
struct IngestLoop {
    shared: Arc<WorkerShared>,
    source: Box<dyn LineSource>,
    parser: LineParser,
    read_timeout: Duration,
    writes: Receiver<Vec<u8>>,
    event_callback: Option<EventCallback>,
}

impl IngestLoop {
    fn run(mut self) {
        tracing::info!(
            source = self.source.name(),
            n_channels = self.parser.arity(),
            read_timeout = ?self.read_timeout,
            "ingestion worker started"
        );
        self.emit_event(WindowEvent::WorkerStarted);

        while self.shared.state() == WorkerState::Running {
            self.forward_writes();

            match self.source.try_read_line(self.read_timeout) {
                Ok(None) => {}
                Ok(Some(bytes)) => self.handle_line(&bytes),
                Err(e) => self.handle_transport_error(&e),
            }
        }

        self.shared.set_state(WorkerState::Stopped);

        let records_committed = self.shared.buffer.sequence();
        tracing::info!(
            source = self.source.name(),
            records_committed,
            "ingestion worker stopped"
        );
        self.emit_event(WindowEvent::WorkerStopped { records_committed });
    }

    fn emit_event(&self, event: WindowEvent) {
        if let Some(ref callback) = self.event_callback {
            callback(event);
        }
    }

    fn forward_writes(&mut self) {
        while let Ok(bytes) = self.writes.try_recv() {
            match self.source.write(&bytes) {
                Ok(()) => {
                    self.shared.writes_sent.fetch_add(1, Ordering::SeqCst);
                }
                Err(e) => {
                    self.shared.write_failures.fetch_add(1, Ordering::SeqCst);
                    tracing::warn!(source = self.source.name(), "write failed: {}", e);
                    self.emit_event(WindowEvent::WriteFailed {
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    fn handle_transport_error(&self, error: &TransportError) {
        self.shared.transport_errors.fetch_add(1, Ordering::SeqCst);
        tracing::warn!(source = self.source.name(), "transport error: {}", error);
        self.emit_event(WindowEvent::TransportFailed {
            error: error.to_string(),
        });
    }

    /// Counts the line only once it has been committed, skipped or rejected.
    fn handle_line(&self, bytes: &[u8]) {
        self.process_line(bytes);
        self.shared.lines_received.fetch_add(1, Ordering::SeqCst);
    }

    fn process_line(&self, bytes: &[u8]) {
        let line = match decode_line(bytes) {
            Ok(line) => line,
            Err(e) => return self.handle_parse_error(e),
        };
        if line.is_empty() {
            self.shared.comments_skipped.fetch_add(1, Ordering::SeqCst);
            return;
        }

        tracing::debug!(line, "line received");
        self.emit_event(WindowEvent::LineReceived {
            line: line.to_string(),
        });

        match self.parser.parse(line) {
            Ok(ParsedLine::Record(record)) => self.commit(&record),
            Ok(ParsedLine::CommentOrBlank) => {
                self.shared.comments_skipped.fetch_add(1, Ordering::SeqCst);
            }
            Err(e) => self.handle_parse_error(e),
        }
    }

    fn handle_parse_error(&self, error: ParseError) {
        self.shared.parse_errors.fetch_add(1, Ordering::SeqCst);
        tracing::warn!(raw = error.raw(), "skipping line: {}", error.reason());
        self.emit_event(WindowEvent::ParseFailed { error });
    }

    fn commit(&self, record: &Record) {
        let shared = &self.shared;
        match shared
            .buffer
            .commit_gated(record, || shared.state() == WorkerState::Running)
        {
            Ok(true) => {}
            Ok(false) => tracing::debug!("stop requested, dropping record"),
            Err(e) => tracing::error!("record refused by window: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ChannelSource, MockSource};
    use crate::event_callback;
    use parking_lot::Mutex;
    use std::time::Instant;

    const TICK: Duration = Duration::from_millis(5);

    fn config(n_channels: usize, n_points: usize) -> WindowConfig {
        WindowConfig {
            n_channels,
            n_points,
            fill_value: f64::NAN,
            read_timeout: TICK,
            poll_interval: TICK,
        }
    }

    fn wait_until(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_worker_state_round_trip() {
        for state in [
            WorkerState::Idle,
            WorkerState::Running,
            WorkerState::Stopping,
            WorkerState::Stopped,
        ] {
            assert_eq!(WorkerState::from_u8(state.to_u8()), state);
        }
    }

    #[test]
    fn test_end_to_end_scenario() {
        let source = MockSource::from_lines(["10,20", "# comment", "30,40", "", "50,60", "70,80"]);
        let mut worker = IngestionWorker::new(source, config(2, 3)).unwrap();
        assert_eq!(worker.state(), WorkerState::Idle);

        worker.start().unwrap();
        assert_eq!(worker.state(), WorkerState::Running);
        wait_until(|| worker.stats().lines_received == 6);
        let stats = worker.shutdown().unwrap();

        let snapshot = worker.snapshot();
        assert_eq!(snapshot.channel(0), &[30.0, 50.0, 70.0]);
        assert_eq!(snapshot.channel(1), &[40.0, 60.0, 80.0]);
        assert_eq!(stats.records_committed, 4);
        assert_eq!(stats.comments_skipped, 2);
        assert_eq!(stats.parse_errors, 0);
        assert_eq!(worker.state(), WorkerState::Stopped);
    }

    #[test]
    fn test_partial_window_keeps_fill() {
        let source = MockSource::from_lines(["1,2", "3,4"]);
        let mut worker = IngestionWorker::new(source, config(2, 5)).unwrap();
        worker.start().unwrap();
        wait_until(|| worker.stats().records_committed == 2);
        worker.shutdown().unwrap();

        let snapshot = worker.snapshot();
        assert!(snapshot.channel(0)[..3].iter().all(|v| v.is_nan()));
        assert_eq!(&snapshot.channel(0)[3..], &[1.0, 3.0]);
        assert_eq!(&snapshot.channel(1)[3..], &[2.0, 4.0]);
    }

    #[test]
    fn test_malformed_lines_do_not_mutate() {
        let source = MockSource::from_lines(["1,2,3", "1,2,x", "1,2", "4,5,6"]);
        let mut worker = IngestionWorker::new(source, config(3, 2)).unwrap();
        worker.start().unwrap();
        wait_until(|| worker.stats().lines_received == 4);
        let stats = worker.shutdown().unwrap();

        assert_eq!(stats.parse_errors, 2);
        assert_eq!(stats.records_committed, 2);
        let snapshot = worker.snapshot();
        assert_eq!(snapshot.channel(0), &[1.0, 4.0]);
        assert_eq!(snapshot.channel(2), &[3.0, 6.0]);
    }

    #[test]
    fn test_transport_errors_are_not_fatal() {
        let source = MockSource::new()
            .transport_error("unplugged")
            .transport_error("unplugged")
            .line("7,8");
        let mut worker = IngestionWorker::new(source, config(2, 2)).unwrap();
        worker.start().unwrap();
        wait_until(|| worker.stats().records_committed == 1);

        assert_eq!(worker.state(), WorkerState::Running);
        let stats = worker.shutdown().unwrap();
        assert_eq!(stats.transport_errors, 2);
        assert_eq!(worker.snapshot().latest(), Some(vec![7.0, 8.0]));
    }

    #[test]
    fn test_invalid_utf8_is_a_parse_error() {
        let source = MockSource::new().line(vec![0xff, b',', b'1']).line("1,2");
        let mut worker = IngestionWorker::new(source, config(2, 2)).unwrap();
        worker.start().unwrap();
        wait_until(|| worker.stats().lines_received == 2);
        let stats = worker.shutdown().unwrap();

        assert_eq!(stats.parse_errors, 1);
        assert_eq!(stats.records_committed, 1);
    }

    #[test]
    fn test_line_counted_after_commit() {
        // A slow subscriber holds the last line between receipt and commit
        let callback = event_callback(|event| {
            if matches!(event, WindowEvent::LineReceived { ref line } if line == "70,80") {
                std::thread::sleep(Duration::from_millis(50));
            }
        });
        let source = MockSource::from_lines(["10,20", "# comment", "30,40", "", "50,60", "70,80"]);
        let mut worker = IngestionWorker::new(source, config(2, 3))
            .unwrap()
            .with_event_callback(callback);
        worker.start().unwrap();

        wait_until(|| worker.stats().lines_received == 6);
        let stats = worker.shutdown().unwrap();

        assert_eq!(stats.records_committed, 4);
        assert_eq!(worker.snapshot().channel(0), &[30.0, 50.0, 70.0]);
        assert_eq!(worker.snapshot().channel(1), &[40.0, 60.0, 80.0]);
    }

    #[test]
    fn test_events_are_reported() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&events);
        let callback = event_callback(move |event| seen.lock().push(event));

        let source = MockSource::new()
            .line("1,2")
            .line("oops")
            .transport_error("glitch");
        let mut worker = IngestionWorker::new(source, config(2, 2))
            .unwrap()
            .with_event_callback(callback);
        worker.start().unwrap();
        wait_until(|| worker.stats().transport_errors == 1);
        worker.shutdown().unwrap();

        let events = events.lock();
        assert!(matches!(events.first(), Some(WindowEvent::WorkerStarted)));
        assert!(events
            .iter()
            .any(|e| matches!(e, WindowEvent::LineReceived { line } if line == "1,2")));
        assert!(events.iter().any(
            |e| matches!(e, WindowEvent::ParseFailed { error } if error.raw() == "oops")
        ));
        assert!(events
            .iter()
            .any(|e| matches!(e, WindowEvent::TransportFailed { error } if error == "glitch")));
        assert!(matches!(
            events.last(),
            Some(WindowEvent::WorkerStopped {
                records_committed: 1
            })
        ));
    }

    #[test]
    fn test_stop_latency_with_silent_source() {
        let config = WindowConfig {
            read_timeout: Duration::from_millis(50),
            ..config(2, 2)
        };
        let mut worker = IngestionWorker::new(MockSource::silent(), config).unwrap();
        worker.start().unwrap();
        std::thread::sleep(Duration::from_millis(20));

        let started = Instant::now();
        worker.stop();
        assert_ne!(worker.state(), WorkerState::Running);
        worker.join().unwrap();

        assert_eq!(worker.state(), WorkerState::Stopped);
        assert!(started.elapsed() < Duration::from_millis(50) * 10);
    }

    #[test]
    fn test_no_commits_after_stop() {
        let (source, feeder) = ChannelSource::new();
        let mut worker = IngestionWorker::new(source, config(1, 4)).unwrap();
        worker.start().unwrap();

        feeder.feed("1").unwrap();
        wait_until(|| worker.stats().records_committed == 1);

        worker.stop();
        let frozen = worker.snapshot().sequence();
        for _ in 0..20 {
            let _ = feeder.feed("2");
        }
        worker.join().unwrap();

        assert_eq!(worker.snapshot().sequence(), frozen);
        assert_eq!(worker.snapshot().latest(), Some(vec![1.0]));
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let mut worker = IngestionWorker::new(MockSource::silent(), config(1, 1)).unwrap();
        worker.start().unwrap();
        assert!(matches!(
            worker.start(),
            Err(SerialWindowError::InvalidState {
                state: WorkerState::Running
            })
        ));
        worker.shutdown().unwrap();

        assert!(matches!(
            worker.start(),
            Err(SerialWindowError::InvalidState {
                state: WorkerState::Stopped
            })
        ));
    }

    #[test]
    fn test_stop_before_start() {
        let mut worker = IngestionWorker::new(MockSource::silent(), config(1, 1)).unwrap();
        worker.stop();
        assert_eq!(worker.state(), WorkerState::Stopped);
        assert!(worker.start().is_err());
        assert!(worker.join().is_ok());
        assert!(worker.is_finished());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = IngestionWorker::new(MockSource::silent(), config(0, 1));
        assert!(matches!(
            result,
            Err(SerialWindowError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_writes_are_forwarded() {
        let source = MockSource::new();
        let written = source.writes();
        let mut worker = IngestionWorker::new(source, config(1, 1)).unwrap();

        worker.write("queued before start\n").unwrap();
        worker.start().unwrap();
        worker.write(b"ping\n".to_vec()).unwrap();
        wait_until(|| worker.stats().writes_sent == 2);
        worker.shutdown().unwrap();

        assert_eq!(
            written.take(),
            vec![b"queued before start\n".to_vec(), b"ping\n".to_vec()]
        );
        assert!(matches!(
            worker.write("late"),
            Err(SerialWindowError::WorkerClosed)
        ));
    }

    #[test]
    fn test_write_failures_are_counted() {
        let source = MockSource::new().failing_writes();
        let mut worker = IngestionWorker::new(source, config(1, 1)).unwrap();
        worker.start().unwrap();
        worker.write("x").unwrap();
        wait_until(|| worker.stats().write_failures == 1);

        assert_eq!(worker.state(), WorkerState::Running);
        worker.shutdown().unwrap();
    }

    #[test]
    fn test_reader_sees_live_window() {
        let (source, feeder) = ChannelSource::new();
        let mut worker = IngestionWorker::new(source, config(2, 3)).unwrap();
        let reader = worker.reader();
        assert_eq!(reader.n_channels(), 2);
        assert_eq!(reader.n_points(), 3);
        assert_eq!(reader.state(), WorkerState::Idle);

        worker.start().unwrap();
        feeder.feed("5,6").unwrap();
        wait_until(|| reader.sequence() == 1);

        let snapshot = std::thread::spawn(move || reader.snapshot())
            .join()
            .unwrap();
        assert_eq!(snapshot.latest(), Some(vec![5.0, 6.0]));
        worker.shutdown().unwrap();
    }
}
