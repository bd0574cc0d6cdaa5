//! Window pipeline components.
//!
//! The pipeline connects a line source to renderers through the window:
//!
//! ```text
//! LineSource → Ingestion Thread → WindowBuffer ← Render Task → Renderers
//! ```
//!
//! - **Ingestion worker**: Reads, parses and commits records on its own thread
//! - **Window buffer**: Fixed-size multi-channel history with atomic snapshots
//! - **Render loop**: Snapshots the window every poll interval and fans out
//!
//! The worker and the render loop never wait on each other; the buffer lock
//! is held only for in-memory copies.

mod ingest;
mod render;
mod ring_buffer;

pub use ingest::{IngestionWorker, WindowReader, WorkerState, WorkerStats};
pub use render::{RenderCommand, RenderLoop};
pub use ring_buffer::WindowBuffer;
