//! Running session management.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::pipeline::{IngestionWorker, RenderCommand, WindowReader, WorkerState, WorkerStats};
use crate::{SerialWindowError, Snapshot, WindowConfig};

/// Handle to a running ingestion session.
///
/// The `Session` is returned by [`SerialWindowBuilder::start()`] and owns the
/// ingestion thread and the render task. Both run until `stop()` is called
/// or the `Session` is dropped.
///
/// # Lifecycle
///
/// 1. Created by [`SerialWindowBuilder::start()`]
/// 2. Lines are ingested on a background thread, frames rendered on a tokio task
/// 3. Call [`stop()`](Session::stop) for graceful shutdown
/// 4. Dropping the `Session` also stops ingestion (but prefer explicit `stop()`)
///
/// # Example
///
/// ```
/// use serial_window::{MockSource, SerialWindow};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), serial_window::SerialWindowError> {
/// let session = SerialWindow::builder()
///     .source(MockSource::from_lines(["1,2", "3,4"]))
///     .start()
///     .await?;
///
/// let snapshot = session.snapshot();
/// assert_eq!(snapshot.n_channels(), 2);
///
/// session.stop().await?;
/// # Ok(())
/// # }
/// ```
///
/// [`SerialWindowBuilder::start()`]: crate::SerialWindowBuilder::start
pub struct Session {
    worker: Option<IngestionWorker>,
    reader: WindowReader,
    config: WindowConfig,
    render_cmd_tx: Option<mpsc::Sender<RenderCommand>>,
    render_handle: Option<JoinHandle<()>>,
}

impl Session {
    pub(crate) fn new(
        worker: IngestionWorker,
        render_cmd_tx: Option<mpsc::Sender<RenderCommand>>,
        render_handle: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            reader: worker.reader(),
            config: worker.config().clone(),
            worker: Some(worker),
            render_cmd_tx,
            render_handle,
        }
    }

    /// Returns `true` while the ingestion worker is running.
    pub fn is_running(&self) -> bool {
        self.reader.state() == WorkerState::Running
    }

    /// Returns the ingestion worker's lifecycle state.
    pub fn state(&self) -> WorkerState {
        self.reader.state()
    }

    /// Returns current counters.
    pub fn stats(&self) -> WorkerStats {
        self.reader.stats()
    }

    /// Takes an independent copy of the current window.
    pub fn snapshot(&self) -> Snapshot {
        self.reader.snapshot()
    }

    /// Returns a read-only handle that outlives borrows of the session.
    pub fn reader(&self) -> WindowReader {
        self.reader.clone()
    }

    /// Returns the configuration the session was started with.
    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Queues bytes to be written to the source.
    ///
    /// # Errors
    ///
    /// Returns `WorkerClosed` once the session is stopping.
    pub fn write(&self, bytes: impl Into<Vec<u8>>) -> Result<(), SerialWindowError> {
        match self.worker {
            Some(ref worker) => worker.write(bytes),
            None => Err(SerialWindowError::WorkerClosed),
        }
    }

    /// Gracefully stops the session.
    ///
    /// This will:
    /// 1. Stop the ingestion worker (no records are committed afterwards)
    /// 2. Wait for the ingestion thread to exit
    /// 3. Render one final frame and call `on_stop()` on all renderers
    ///
    /// Returns the worker's final counters.
    ///
    /// # Errors
    ///
    /// Returns `WorkerPanicked` if the ingestion thread panicked.
    pub async fn stop(mut self) -> Result<WorkerStats, SerialWindowError> {
        self.stop_internal().await
    }

    async fn stop_internal(&mut self) -> Result<WorkerStats, SerialWindowError> {
        let Some(mut worker) = self.worker.take() else {
            // Already stopped
            return Ok(self.reader.stats());
        };

        worker.stop();
        let joined = tokio::task::spawn_blocking(move || worker.join())
            .await
            .map_err(|_| SerialWindowError::WorkerPanicked)
            .and_then(|result| result);

        if let Some(tx) = self.render_cmd_tx.take() {
            let _ = tx.send(RenderCommand::Stop).await;
        }
        if let Some(handle) = self.render_handle.take() {
            let _ = handle.await;
        }

        let stats = joined?;
        tracing::info!(
            records_committed = stats.records_committed,
            parse_errors = stats.parse_errors,
            "session stopped"
        );
        Ok(stats)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            // Session dropped without explicit stop() - let background work wind down
            worker.stop();
            if let Some(tx) = self.render_cmd_tx.take() {
                let _ = tx.try_send(RenderCommand::Stop);
            }
        }
    }
}
