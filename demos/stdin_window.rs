//! Live window over standard input.
//!
//! Reads comma-separated lines from stdin and prints the newest values of
//! every channel whenever new records arrive. Options are passed as
//! `key=value` pairs.
//!
//! Run with:
//!
//! ```text
//! cat /dev/ttyACM0 | cargo run --example stdin_window -- n_channels=3 n_points=200
//! ```
//!
//! Stops on Ctrl+C or when the input ends.

use serial_window::{DeviceSource, SerialWindow, Snapshot, WatchRenderer, WindowEvent};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

fn describe(frame: &Snapshot) -> String {
    let channels: Vec<String> = frame
        .channels()
        .enumerate()
        .map(|(c, row)| {
            let present: Vec<f64> = row.iter().copied().filter(|v| !v.is_nan()).collect();
            let min = present.iter().copied().fold(f64::INFINITY, f64::min);
            let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            match present.last() {
                Some(last) => format!("ch{c}={last:.3} [{min:.3}..{max:.3}]"),
                None => format!("ch{c}=-"),
            }
        })
        .collect();
    format!(
        "#{:<6} {}/{} {}",
        frame.sequence(),
        frame.filled(),
        frame.n_points(),
        channels.join("  ")
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout stays a clean stream of frames
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let display = WatchRenderer::new().with_name("stdout");
    let mut frames = display.subscribe();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let source = DeviceSource::from_io::<_, std::io::Sink>("stdin", std::io::stdin(), None)?;
    let session = SerialWindow::builder()
        .options(std::env::args().skip(1))?
        .source(source)
        .add_renderer(display)
        .on_event(move |event| {
            let _ = event_tx.send(event);
        })
        .start()
        .await?;

    eprintln!("Reading {} channels from stdin. Press Ctrl+C to stop.", session.config().n_channels);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(frame) = frames.borrow_and_update().as_ref() {
                    println!("{}", describe(frame));
                }
            }
            Some(event) = event_rx.recv() => {
                match event {
                    WindowEvent::ParseFailed { error } => eprintln!("skipped: {error}"),
                    // stdin only fails once it is closed
                    WindowEvent::TransportFailed { .. } => break,
                    _ => {}
                }
            }
        }
    }

    let stats = session.stop().await?;
    eprintln!("Stats: {stats:?}");

    Ok(())
}
