//! Renderer trait and implementations for window consumers.
//!
//! A [`Renderer`] is anything that wants to see the window on a schedule:
//! a plot, a terminal dashboard, a network publisher. The crate provides two
//! built-in renderers:
//!
//! - [`ChannelRenderer`]: Sends every frame to a tokio mpsc channel
//! - [`WatchRenderer`]: Publishes only the latest frame through a tokio watch channel
//!
//! Implement the [`Renderer`] trait for custom displays.

mod channel;
mod watch;

pub use channel::ChannelRenderer;
pub use watch::WatchRenderer;

use crate::{RenderError, Snapshot};
use async_trait::async_trait;

/// A consumer of periodic window snapshots.
///
/// # Implementation Notes
///
/// - Methods take `&self` - use interior mutability (`Mutex`, `RwLock`) if needed
/// - All methods are async and run on the tokio runtime
/// - `on_start` is called before the first frame; open resources here
/// - `render` receives one [`Snapshot`] per tick; the snapshot is shared with
///   the other renderers, so clone it (cheap) if you need to keep it
/// - `on_stop` is called during graceful shutdown
///
/// # Example
///
/// ```
/// use serial_window::{RenderError, Renderer, Snapshot};
/// use async_trait::async_trait;
///
/// struct PrintLatest;
///
/// #[async_trait]
/// impl Renderer for PrintLatest {
///     fn name(&self) -> &str {
///         "print-latest"
///     }
///
///     async fn render(&self, snapshot: &Snapshot) -> Result<(), RenderError> {
///         if let Some(column) = snapshot.latest() {
///             println!("{column:?}");
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Human-readable name for logging and error messages.
    fn name(&self) -> &str;

    /// Called once before the first frame.
    ///
    /// Errors here are fatal and prevent the session from starting.
    ///
    /// Default implementation does nothing.
    async fn on_start(&self) -> Result<(), RenderError> {
        Ok(())
    }

    /// Draws one frame.
    ///
    /// Errors are recoverable - the render loop emits a
    /// [`WindowEvent::RendererError`] and calls again on the next tick.
    ///
    /// [`WindowEvent::RendererError`]: crate::WindowEvent::RendererError
    async fn render(&self, snapshot: &Snapshot) -> Result<(), RenderError>;

    /// Called during graceful shutdown, even if rendering failed.
    ///
    /// Default implementation does nothing.
    async fn on_stop(&self) -> Result<(), RenderError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::WindowBuffer;
    use crate::Record;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    struct SequenceRenderer {
        last_sequence: AtomicU64,
    }

    #[async_trait]
    impl Renderer for SequenceRenderer {
        fn name(&self) -> &str {
            "sequence"
        }

        async fn render(&self, snapshot: &Snapshot) -> Result<(), RenderError> {
            self.last_sequence
                .store(snapshot.sequence(), Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_renderer_lifecycle() {
        let renderer = SequenceRenderer {
            last_sequence: AtomicU64::new(0),
        };
        let buffer = WindowBuffer::new(1, 2, 0.0);
        buffer.commit(&Record::new(vec![1.0])).unwrap();
        buffer.commit(&Record::new(vec![2.0])).unwrap();

        renderer.on_start().await.unwrap();
        renderer.render(&buffer.snapshot()).await.unwrap();
        renderer.on_stop().await.unwrap();

        assert_eq!(renderer.last_sequence.load(Ordering::SeqCst), 2);
        assert_eq!(renderer.name(), "sequence");
    }

    #[test]
    fn test_renderer_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Arc<dyn Renderer>>();
    }
}
