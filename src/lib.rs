//! # serial-window
//!
//! **Note:** This crate is under active development. The API may change before 1.0.
//!
//! Live multi-channel time series from line-oriented text streams.
//!
//! `serial-window` reads newline-delimited records of comma-separated
//! numbers (as printed by a microcontroller over a serial link), keeps the
//! most recent `n_points` records per channel in a fixed-size window, and
//! hands consistent snapshots of that window to any number of renderers.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use serial_window::{DeviceSource, SerialWindow, WatchRenderer};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), serial_window::SerialWindowError> {
//! let display = WatchRenderer::new();
//! let mut frames = display.subscribe();
//!
//! let session = SerialWindow::builder()
//!     .source(DeviceSource::open("/dev/ttyACM0")?)
//!     .channels(2)
//!     .points(500)
//!     .add_renderer(display)
//!     .on_event(|e| tracing::debug!(?e, "window event"))
//!     .start()
//!     .await?;
//!
//! while frames.changed().await.is_ok() {
//!     if let Some(frame) = frames.borrow().as_ref() {
//!         println!("latest: {:?}", frame.latest());
//!     }
//! }
//!
//! session.stop().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The crate maintains a strict thread boundary:
//!
//! - **Ingestion Thread**: Owns the source; reads, parses and commits one line at a time
//! - **Window Buffer**: Mutex-guarded ring holding `n_channels × n_points` values
//! - **Tokio Runtime**: Render task snapshots the window and fans out to renderers
//!
//! The buffer lock covers only in-memory copies, so a slow renderer never
//! delays ingestion and a stalled device never delays rendering.
//!
//! ## Input Format
//!
//! ```text
//! # lines starting with '#' are ignored, as are blank lines
//! 0.12, 3.4
//! 0.13, 3.5
//! ```
//!
//! Every data line must carry exactly `n_channels` values. Malformed lines
//! are reported through [`WindowEvent::ParseFailed`] and skipped.

#![warn(missing_docs)]
// unwrap/expect allowed in tests only
#![allow(clippy::unwrap_used)]
// These doc lints are too strict for internal implementation details
#![allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]

mod builder;
mod config;
mod error;
mod event;
pub mod format;
mod pipeline;
mod record;
mod renderer;
mod session;
mod snapshot;
pub mod source;

pub use builder::{SerialWindow, SerialWindowBuilder};
pub use config::WindowConfig;
pub use error::{CommitError, ParseError, RenderError, SerialWindowError, TransportError};
pub use event::{event_callback, EventCallback, WindowEvent};
pub use pipeline::{
    IngestionWorker, RenderCommand, RenderLoop, WindowBuffer, WindowReader, WorkerState,
    WorkerStats,
};
pub use record::Record;
pub use renderer::{ChannelRenderer, Renderer, WatchRenderer};
pub use session::Session;
pub use snapshot::Snapshot;
pub use source::{ChannelSource, DeviceSource, LineFeeder, LineSource, MockSource, MockWrites};
