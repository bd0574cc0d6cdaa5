//! Latest-frame renderer backed by a tokio watch channel.

use crate::renderer::Renderer;
use crate::{RenderError, Snapshot};
use async_trait::async_trait;
use tokio::sync::watch;

/// A renderer that keeps only the most recent frame.
///
/// Subscribers always see the newest window and never queue up stale
/// frames. Frames whose sequence number has not changed since the last
/// publish are not re-sent, so `changed()` fires only when new records
/// arrived.
///
/// # Example
///
/// ```
/// use serial_window::WatchRenderer;
///
/// let renderer = WatchRenderer::new();
/// let mut frames = renderer.subscribe();
/// assert!(frames.borrow().is_none());
/// ```
pub struct WatchRenderer {
    name: String,
    sender: watch::Sender<Option<Snapshot>>,
}

impl Default for WatchRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchRenderer {
    /// Creates a renderer with no frame published yet.
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            name: "watch".to_string(),
            sender,
        }
    }

    /// Sets a custom name used in logs and events.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns a receiver that observes published frames.
    pub fn subscribe(&self) -> watch::Receiver<Option<Snapshot>> {
        self.sender.subscribe()
    }

    /// Returns the most recently published frame.
    pub fn latest(&self) -> Option<Snapshot> {
        self.sender.borrow().clone()
    }
}

#[async_trait]
impl Renderer for WatchRenderer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn render(&self, snapshot: &Snapshot) -> Result<(), RenderError> {
        self.sender.send_if_modified(|current| {
            let stale = current
                .as_ref()
                .is_some_and(|frame| frame.sequence() == snapshot.sequence());
            if !stale {
                *current = Some(snapshot.clone());
            }
            !stale
        });
        Ok(())
    }
}
