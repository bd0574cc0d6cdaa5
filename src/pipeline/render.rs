//! Render loop task that fans out window snapshots to renderers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::pipeline::WindowReader;
use crate::renderer::Renderer;
use crate::{EventCallback, SerialWindowError, Snapshot, WindowEvent};

/// Command sent to the render loop task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderCommand {
    /// Render one final frame and stop.
    Stop,
}

/// Periodically snapshots the window and hands each frame to every renderer.
///
/// One snapshot is taken per tick and shared by all renderers, which run
/// concurrently. A failing renderer is reported and called again on the
/// next tick; it never holds up the others beyond its own `render` call.
pub struct RenderLoop {
    renderers: Vec<Arc<dyn Renderer>>,
    reader: WindowReader,
    poll_interval: Duration,
    event_callback: Option<EventCallback>,
}

impl RenderLoop {
    /// Creates a render loop over the given window.
    pub fn new(
        renderers: Vec<Arc<dyn Renderer>>,
        reader: WindowReader,
        poll_interval: Duration,
    ) -> Self {
        Self {
            renderers,
            reader,
            poll_interval,
            event_callback: None,
        }
    }

    /// Sets the event callback.
    #[must_use]
    pub fn with_event_callback(mut self, callback: EventCallback) -> Self {
        self.event_callback = Some(callback);
        self
    }

    /// Returns the number of registered renderers.
    pub fn renderer_count(&self) -> usize {
        self.renderers.len()
    }

    fn emit_event(&self, event: WindowEvent) {
        if let Some(ref callback) = self.event_callback {
            callback(event);
        }
    }

    async fn render_to(&self, renderer: &Arc<dyn Renderer>, snapshot: &Snapshot) {
        if let Err(e) = renderer.render(snapshot).await {
            tracing::warn!(renderer = renderer.name(), "render failed: {}", e);
            self.emit_event(WindowEvent::RendererError {
                renderer_name: renderer.name().to_string(),
                error: e.to_string(),
            });
        }
    }

    /// Takes one snapshot and renders it on all renderers concurrently.
    pub async fn render_frame(&self) -> Snapshot {
        let snapshot = self.reader.snapshot();
        let futures: Vec<_> = self
            .renderers
            .iter()
            .map(|renderer| self.render_to(renderer, &snapshot))
            .collect();

        futures::future::join_all(futures).await;
        snapshot
    }

    /// Starts all renderers.
    ///
    /// Returns an error if any renderer fails to start.
    pub async fn start_renderers(&self) -> Result<(), SerialWindowError> {
        for renderer in &self.renderers {
            renderer
                .on_start()
                .await
                .map_err(|e| SerialWindowError::RendererStartFailed {
                    renderer_name: renderer.name().to_string(),
                    reason: e.to_string(),
                })?;
        }
        Ok(())
    }

    /// Stops all renderers.
    pub async fn stop_renderers(&self) {
        for renderer in &self.renderers {
            if let Err(e) = renderer.on_stop().await {
                self.emit_event(WindowEvent::RendererError {
                    renderer_name: renderer.name().to_string(),
                    error: format!("Error during shutdown: {e}"),
                });
            }
        }
    }

    /// Runs the loop until a stop command arrives or the command channel closes.
    ///
    /// This is the main entry point for the render task.
    pub async fn run(self, mut cmd_rx: mpsc::Receiver<RenderCommand>) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.render_frame().await;
                }
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(RenderCommand::Stop) | None => {
                            // Show whatever the worker committed last
                            self.render_frame().await;
                            break;
                        }
                    }
                }
            }
        }

        self.stop_renderers().await;
    }
}
