//! Every-frame renderer backed by a bounded tokio mpsc channel.

use crate::renderer::Renderer;
use crate::{RenderError, Snapshot};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// A renderer that queues every frame for a consumer task.
///
/// Use this when each tick matters, e.g. recording the window at a fixed
/// cadence or computing per-frame statistics. For a display that only needs
/// the newest window, [`WatchRenderer`](crate::WatchRenderer) is cheaper.
///
/// The queue is bounded: when the consumer falls behind, `render` waits for
/// room, which stretches the render tick instead of growing memory. The
/// ingestion thread never waits on it, so the window keeps advancing and the
/// next frame the consumer sees may have skipped ahead by several records
/// (compare [`Snapshot::sequence`] across frames to detect that).
///
/// Frames share their sample storage with the other renderers, so queueing
/// one is a reference-count bump, not a copy of the window.
///
/// # Example
///
/// ```
/// use serial_window::ChannelRenderer;
///
/// // Room for one second of frames at the default 50 ms poll interval
/// let (renderer, mut frames) = ChannelRenderer::bounded(20);
///
/// // Use renderer with SerialWindow builder...
/// // Then consume frames:
/// // while let Some(frame) = frames.recv().await { ... }
/// ```
pub struct ChannelRenderer {
    name: String,
    sender: mpsc::Sender<Snapshot>,
}

impl ChannelRenderer {
    /// Wraps an existing sender.
    pub fn new(sender: mpsc::Sender<Snapshot>) -> Self {
        Self {
            name: "channel".to_string(),
            sender,
        }
    }

    /// Creates a renderer and the receiver for its frames.
    ///
    /// `capacity` is the number of frames the consumer may lag behind before
    /// the render tick starts waiting on it.
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<Snapshot>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self::new(sender), receiver)
    }

    /// Wraps an existing sender under a custom name.
    pub fn with_name(name: impl Into<String>, sender: mpsc::Sender<Snapshot>) -> Self {
        Self {
            name: name.into(),
            sender,
        }
    }

    /// Returns how many more frames fit before `render` starts waiting.
    pub fn free_slots(&self) -> usize {
        self.sender.capacity()
    }
}

#[async_trait]
impl Renderer for ChannelRenderer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn render(&self, snapshot: &Snapshot) -> Result<(), RenderError> {
        self.sender
            .send(snapshot.clone())
            .await
            .map_err(|_| RenderError::ChannelClosed)
    }
}
