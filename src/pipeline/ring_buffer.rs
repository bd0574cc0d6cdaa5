//! Fixed-capacity multi-channel window with atomic snapshots.

use parking_lot::Mutex;
use ringbuf::traits::{Consumer, Observer, RingBuffer};
use ringbuf::HeapRb;

use crate::{CommitError, Record, SerialWindowError, Snapshot, WindowConfig};

/// The most recent `n_points` records of an `n_channels`-wide stream.
///
/// Logically this is an `n_channels × n_points` matrix where each commit
/// shifts every column one step to the left and writes the new record into
/// the rightmost column. Internally the values live in a wrap-around ring of
/// `n_channels * n_points` cells so a commit costs `O(n_channels)` instead
/// of a full shift; [`snapshot()`](Self::snapshot) reorders them into the
/// shifted layout.
///
/// Commits and snapshots are serialized by one mutex. The critical section
/// only covers the in-memory overwrite or the in-memory copy, so readers
/// never see a partially applied commit and never hold the writer up for
/// longer than a copy.
///
/// # Example
///
/// ```
/// use serial_window::{Record, WindowBuffer};
///
/// let buffer = WindowBuffer::new(2, 3, f64::NAN);
/// for values in [[10.0, 20.0], [30.0, 40.0], [50.0, 60.0], [70.0, 80.0]] {
///     buffer.commit(&Record::new(values.to_vec())).unwrap();
/// }
///
/// let snapshot = buffer.snapshot();
/// assert_eq!(snapshot.channel(0), &[30.0, 50.0, 70.0]);
/// assert_eq!(snapshot.channel(1), &[40.0, 60.0, 80.0]);
/// ```
pub struct WindowBuffer {
    state: Mutex<WindowState>,
    n_channels: usize,
    n_points: usize,
    fill_value: f64,
}

struct WindowState {
    /// Interleaved records, oldest first. Always holds a multiple of `n_channels` values.
    ring: HeapRb<f64>,
    /// Total records committed since creation.
    sequence: u64,
}

impl WindowBuffer {
    /// Creates a window with every cell set to `fill_value`.
    ///
    /// # Panics
    ///
    /// Panics if `n_channels` or `n_points` is zero. Use
    /// [`from_config()`](Self::from_config) to validate untrusted sizes.
    pub fn new(n_channels: usize, n_points: usize, fill_value: f64) -> Self {
        assert!(n_channels > 0, "n_channels must be positive");
        assert!(n_points > 0, "n_points must be positive");

        Self {
            state: Mutex::new(WindowState {
                ring: HeapRb::new(n_channels * n_points),
                sequence: 0,
            }),
            n_channels,
            n_points,
            fill_value,
        }
    }

    /// Creates a window sized by a validated configuration.
    pub fn from_config(config: &WindowConfig) -> Result<Self, SerialWindowError> {
        config.validate()?;
        Ok(Self::new(
            config.n_channels,
            config.n_points,
            config.fill_value,
        ))
    }

    /// Returns the number of channels.
    pub fn n_channels(&self) -> usize {
        self.n_channels
    }

    /// Returns the window length.
    pub fn n_points(&self) -> usize {
        self.n_points
    }

    /// Returns the value of never-written cells.
    pub fn fill_value(&self) -> f64 {
        self.fill_value
    }

    /// Returns how many records the window currently holds.
    pub fn len(&self) -> usize {
        self.state.lock().ring.occupied_len() / self.n_channels
    }

    /// Returns `true` if nothing has been committed yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the total number of records committed since creation.
    pub fn sequence(&self) -> u64 {
        self.state.lock().sequence
    }

    /// Appends a record as the newest column, evicting the oldest if full.
    ///
    /// A record whose length differs from the channel count is refused and
    /// the window is left untouched.
    pub fn commit(&self, record: &Record) -> Result<(), CommitError> {
        self.commit_gated(record, || true).map(|_| ())
    }

    /// Commits only if `admit` returns `true` while the lock is held.
    ///
    /// Returns whether the record was committed.
    pub(crate) fn commit_gated(
        &self,
        record: &Record,
        admit: impl FnOnce() -> bool,
    ) -> Result<bool, CommitError> {
        if record.len() != self.n_channels {
            return Err(CommitError::ArityMismatch {
                expected: self.n_channels,
                found: record.len(),
            });
        }

        let mut state = self.state.lock();
        if !admit() {
            return Ok(false);
        }
        for &value in record.values() {
            state.ring.push_overwrite(value);
        }
        state.sequence += 1;
        Ok(true)
    }

    /// Runs `f` while no commit or snapshot is in progress.
    pub(crate) fn fence<R>(&self, f: impl FnOnce() -> R) -> R {
        let _state = self.state.lock();
        f()
    }

    /// Takes an independent copy of the whole window.
    ///
    /// The lock is held only while copying the raw values out; reordering
    /// into channel rows happens afterwards.
    pub fn snapshot(&self) -> Snapshot {
        let (interleaved, sequence) = {
            let state = self.state.lock();
            let interleaved: Vec<f64> = state.ring.iter().copied().collect();
            (interleaved, state.sequence)
        };

        let filled = interleaved.len() / self.n_channels;
        let padding = self.n_points - filled;
        let mut values = vec![self.fill_value; self.n_channels * self.n_points];

        for (column, record) in interleaved.chunks_exact(self.n_channels).enumerate() {
            for (channel, &value) in record.iter().enumerate() {
                values[channel * self.n_points + padding + column] = value;
            }
        }

        Snapshot::new(values, self.n_channels, self.n_points, filled, sequence)
    }

}

impl std::fmt::Debug for WindowBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowBuffer")
            .field("n_channels", &self.n_channels)
            .field("n_points", &self.n_points)
            .field("fill_value", &self.fill_value)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
