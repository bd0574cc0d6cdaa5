//! Builder pattern for `SerialWindow`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::pipeline::{IngestionWorker, RenderLoop};
use crate::renderer::Renderer;
use crate::session::Session;
use crate::source::LineSource;
use crate::{event_callback, EventCallback, SerialWindowError, WindowConfig, WindowEvent};

/// Channel capacity for render loop commands.
/// Only need 1 since commands are rare (just Stop).
const COMMAND_CHANNEL_CAPACITY: usize = 1;

/// Builder for configuring and starting a session.
///
/// Use [`SerialWindow::builder()`] to create a new builder.
///
/// # Example
///
/// ```no_run
/// use serial_window::{DeviceSource, SerialWindow, WatchRenderer};
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), serial_window::SerialWindowError> {
/// let display = WatchRenderer::new();
/// let mut frames = display.subscribe();
///
/// let session = SerialWindow::builder()
///     .source(DeviceSource::open("/dev/ttyACM0")?)
///     .channels(3)
///     .points(1000)
///     .poll_interval(Duration::from_millis(100))
///     .add_renderer(display)
///     .on_event(|e| tracing::warn!(?e, "window event"))
///     .start()
///     .await?;
///
/// while frames.changed().await.is_ok() {
///     // Redraw from frames.borrow()
/// }
///
/// session.stop().await?;
/// # Ok(())
/// # }
/// ```
///
/// [`SerialWindow::builder()`]: crate::SerialWindow::builder
#[must_use]
pub struct SerialWindowBuilder {
    /// Line source to ingest from.
    source: Option<Box<dyn LineSource>>,
    /// Configured renderers.
    renderers: Vec<Arc<dyn Renderer>>,
    /// Event callback.
    event_callback: Option<EventCallback>,
    /// Window configuration.
    config: WindowConfig,
}

impl Default for SerialWindowBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialWindowBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            source: None,
            renderers: Vec::new(),
            event_callback: None,
            config: WindowConfig::default(),
        }
    }

    /// Set the line source. Required.
    pub fn source<S: LineSource + 'static>(mut self, source: S) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Set the number of values per line.
    pub fn channels(mut self, n_channels: usize) -> Self {
        self.config.n_channels = n_channels;
        self
    }

    /// Set the number of records retained per channel.
    pub fn points(mut self, n_points: usize) -> Self {
        self.config.n_points = n_points;
        self
    }

    /// Set the value of cells that have not been written yet.
    pub fn fill_value(mut self, fill_value: f64) -> Self {
        self.config.fill_value = fill_value;
        self
    }

    /// Set how long one read attempt may wait for input.
    pub fn read_timeout(mut self, read_timeout: Duration) -> Self {
        self.config.read_timeout = read_timeout;
        self
    }

    /// Set how often renderers receive a frame.
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.config.poll_interval = poll_interval;
        self
    }

    /// Apply `key=value` options on top of the current configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an unknown key or a malformed value.
    pub fn options<I, S>(mut self, options: I) -> Result<Self, SerialWindowError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for option in options {
            self.config.apply_option(option.as_ref())?;
        }
        Ok(self)
    }

    /// Set custom window configuration.
    pub fn with_config(mut self, config: WindowConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a renderer that receives a frame every poll interval.
    pub fn add_renderer<R: Renderer + 'static>(mut self, renderer: R) -> Self {
        self.renderers.push(Arc::new(renderer));
        self
    }

    /// Add a renderer that is also kept by the caller.
    pub fn add_shared_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderers.push(renderer);
        self
    }

    /// Set a callback to receive runtime events.
    ///
    /// Events include raw lines, malformed lines, transport failures and
    /// renderer errors.
    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(WindowEvent) + Send + Sync + 'static,
    {
        self.event_callback = Some(event_callback(callback));
        self
    }

    /// Returns the configuration the session would start with.
    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Validates the builder configuration.
    fn validate(&self) -> Result<(), SerialWindowError> {
        if self.source.is_none() {
            return Err(SerialWindowError::NoSourceConfigured);
        }
        self.config.validate()
    }

    /// Start ingesting.
    ///
    /// Renderers are started first; the ingestion thread is spawned only
    /// once every renderer is ready. The render task is spawned only if at
    /// least one renderer is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No source is configured
    /// - The configuration is invalid
    /// - Any renderer fails to start
    /// - The ingestion thread cannot be spawned
    pub async fn start(mut self) -> Result<Session, SerialWindowError> {
        self.validate()?;
        let source = self
            .source
            .take()
            .ok_or(SerialWindowError::NoSourceConfigured)?;

        let mut worker = IngestionWorker::new(source, self.config.clone())?;
        if let Some(callback) = self.event_callback.clone() {
            worker = worker.with_event_callback(callback);
        }

        let mut render_loop = RenderLoop::new(
            std::mem::take(&mut self.renderers),
            worker.reader(),
            self.config.poll_interval,
        );
        if let Some(callback) = self.event_callback.clone() {
            render_loop = render_loop.with_event_callback(callback);
        }
        render_loop.start_renderers().await?;

        if let Err(e) = worker.start() {
            render_loop.stop_renderers().await;
            return Err(e);
        }

        let (render_cmd_tx, render_handle) = if render_loop.renderer_count() == 0 {
            (None, None)
        } else {
            let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
            let handle = tokio::spawn(async move {
                render_loop.run(cmd_rx).await;
            });
            (Some(cmd_tx), Some(handle))
        };

        tracing::info!(
            n_channels = self.config.n_channels,
            n_points = self.config.n_points,
            poll_interval = ?self.config.poll_interval,
            "session started"
        );

        Ok(Session::new(worker, render_cmd_tx, render_handle))
    }
}

/// Main entry point for serial-window.
///
/// Use [`SerialWindow::builder()`] to start configuring a session.
pub struct SerialWindow;

impl SerialWindow {
    /// Creates a new builder for configuring a session.
    pub fn builder() -> SerialWindowBuilder {
        SerialWindowBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChannelRenderer, MockSource, WatchRenderer};

    #[test]
    fn test_builder_default() {
        let builder = SerialWindowBuilder::new();
        assert!(builder.source.is_none());
        assert!(builder.renderers.is_empty());
        assert_eq!(builder.config().n_channels, 2);
    }

    #[test]
    fn test_builder_setters() {
        let builder = SerialWindow::builder()
            .channels(4)
            .points(10)
            .fill_value(0.0)
            .read_timeout(Duration::from_millis(20))
            .poll_interval(Duration::from_millis(30));

        let config = builder.config();
        assert_eq!(config.n_channels, 4);
        assert_eq!(config.n_points, 10);
        assert_eq!(config.fill_value, 0.0);
        assert_eq!(config.read_timeout, Duration::from_millis(20));
        assert_eq!(config.poll_interval, Duration::from_millis(30));
    }

    #[test]
    fn test_builder_options() {
        let builder = SerialWindow::builder()
            .options(["n_channels=3", "read_timeout=250ms"])
            .unwrap();
        assert_eq!(builder.config().n_channels, 3);
        assert_eq!(builder.config().read_timeout, Duration::from_millis(250));

        assert!(SerialWindow::builder().options(["colour=blue"]).is_err());
    }

    #[test]
    fn test_builder_renderers() {
        let builder = SerialWindow::builder()
            .add_renderer(WatchRenderer::new())
            .add_renderer(ChannelRenderer::new(mpsc::channel(1).0))
            .add_shared_renderer(Arc::new(WatchRenderer::new()));
        assert_eq!(builder.renderers.len(), 3);
    }

    #[test]
    fn test_builder_rejects_no_source() {
        let result = SerialWindow::builder().validate();
        assert!(matches!(result, Err(SerialWindowError::NoSourceConfigured)));
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let result = SerialWindow::builder()
            .source(MockSource::new())
            .points(0)
            .validate();
        assert!(matches!(
            result,
            Err(SerialWindowError::InvalidConfig { .. })
        ));
    }

    #[tokio::test]
    async fn test_builder_starts_without_renderers() {
        let session = SerialWindow::builder()
            .source(MockSource::from_lines(["1,2"]))
            .read_timeout(Duration::from_millis(5))
            .start()
            .await
            .unwrap();

        while session.stats().records_committed == 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        let stats = session.stop().await.unwrap();
        assert_eq!(stats.records_committed, 1);
    }
}
