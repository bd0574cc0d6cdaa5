//! A single parsed sample line.

use std::fmt;

/// One fixed-arity tuple of values parsed from a single input line.
///
/// The value at index `i` belongs to channel `i`. Formatting a record with
/// [`Display`](fmt::Display) yields comma-separated text that parses back
/// to an equal record.
///
/// # Example
///
/// ```
/// use serial_window::Record;
///
/// let record = Record::new(vec![10.0, 20.5]);
/// assert_eq!(record.len(), 2);
/// assert_eq!(record.to_string(), "10,20.5");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    values: Vec<f64>,
}

impl Record {
    /// Creates a record from the given channel values.
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Returns the channel values in order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns the number of channels in this record.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if this record holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consumes the record and returns its values.
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

impl From<Vec<f64>> for Record {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_display() {
        let record = Record::new(vec![1.0, -2.5, 1e-7]);
        assert_eq!(record.to_string(), "1,-2.5,0.0000001");
    }

    #[test]
    fn test_record_len() {
        let record = Record::from(vec![0.0; 4]);
        assert_eq!(record.len(), 4);
        assert!(!record.is_empty());
        assert!(Record::default().is_empty());
    }

    #[test]
    fn test_record_into_values() {
        let record = Record::new(vec![3.0, 4.0]);
        assert_eq!(record.into_values(), vec![3.0, 4.0]);
    }
}
