//! Point-in-time copy of the retained window.

use std::sync::Arc;

/// An immutable copy of the full window at one commit boundary.
///
/// `Snapshot` is the unit handed to renderers. It never aliases the live
/// buffer: later commits do not change it.
///
/// Values are stored channel-major in an `Arc<[f64]>` so that cloning a
/// snapshot for several renderers is cheap. Within a channel, index `0` is
/// the oldest retained point and index `n_points - 1` the newest. Cells that
/// have never been written hold the buffer's fill value.
///
/// # Example
///
/// ```
/// use serial_window::{Record, WindowBuffer};
///
/// let buffer = WindowBuffer::new(2, 3, f64::NAN);
/// buffer.commit(&Record::new(vec![1.0, 2.0])).unwrap();
///
/// let snapshot = buffer.snapshot();
/// assert_eq!(snapshot.filled(), 1);
/// assert_eq!(snapshot.channel(0)[2], 1.0);
/// assert!(snapshot.channel(1)[0].is_nan());
/// ```
#[derive(Debug, Clone)]
pub struct Snapshot {
    values: Arc<[f64]>,
    n_channels: usize,
    n_points: usize,
    filled: usize,
    sequence: u64,
}

impl Snapshot {
    /// Creates a snapshot from channel-major values.
    pub(crate) fn new(
        values: Vec<f64>,
        n_channels: usize,
        n_points: usize,
        filled: usize,
        sequence: u64,
    ) -> Self {
        debug_assert_eq!(values.len(), n_channels * n_points);
        Self {
            values: values.into(),
            n_channels,
            n_points,
            filled,
            sequence,
        }
    }

    /// Returns the number of channels (rows).
    pub fn n_channels(&self) -> usize {
        self.n_channels
    }

    /// Returns the window length (columns).
    pub fn n_points(&self) -> usize {
        self.n_points
    }

    /// Returns how many columns hold committed records.
    ///
    /// The filled columns are always the rightmost ones.
    pub fn filled(&self) -> usize {
        self.filled
    }

    /// Returns the total number of records committed when this snapshot was taken.
    ///
    /// Two snapshots with the same sequence hold identical data.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns one channel's values, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= n_channels()`.
    pub fn channel(&self, channel: usize) -> &[f64] {
        assert!(
            channel < self.n_channels,
            "channel {channel} out of range (n_channels = {})",
            self.n_channels
        );
        let start = channel * self.n_points;
        &self.values[start..start + self.n_points]
    }

    /// Iterates over all channels in order.
    pub fn channels(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.values.chunks_exact(self.n_points)
    }

    /// Returns the values of one time step across all channels.
    ///
    /// Returns `None` if `index >= n_points()`.
    pub fn column(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.n_points {
            return None;
        }
        Some(self.channels().map(|row| row[index]).collect())
    }

    /// Returns the newest committed time step, if any record has been committed.
    pub fn latest(&self) -> Option<Vec<f64>> {
        if self.filled == 0 {
            return None;
        }
        self.column(self.n_points - 1)
    }

    /// Returns all values channel-major.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}
