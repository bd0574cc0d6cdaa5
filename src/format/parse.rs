//! Line parsing into fixed-arity records.

use crate::{ParseError, Record};

/// Default field separator.
pub const DEFAULT_DELIMITER: char = ',';

/// Default marker for comment lines.
pub const DEFAULT_COMMENT_MARKER: char = '#';

/// Outcome of parsing a line that is not malformed.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    /// A complete record with the expected number of values.
    Record(Record),
    /// An empty, whitespace-only or comment line. Carries no data.
    CommentOrBlank,
}

/// Parses a line with the default delimiter and comment marker.
///
/// Returns [`ParsedLine::CommentOrBlank`] for empty, whitespace-only and
/// `#` lines. Otherwise every comma-separated field must be a float and the
/// field count must equal `expected_arity`.
///
/// # Example
///
/// ```
/// use serial_window::format::{parse_line, ParsedLine};
///
/// let parsed = parse_line("10, 20", 2).unwrap();
/// assert!(matches!(parsed, ParsedLine::Record(r) if r.values() == [10.0, 20.0]));
///
/// assert_eq!(parse_line("# header", 2).unwrap(), ParsedLine::CommentOrBlank);
/// assert!(parse_line("1,2,3", 2).is_err());
/// ```
pub fn parse_line(line: &str, expected_arity: usize) -> Result<ParsedLine, ParseError> {
    LineParser::new(expected_arity).parse(line)
}

/// A reusable parser for one line dialect.
///
/// The parser is pure: it holds no state between lines and never panics on
/// malformed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineParser {
    arity: usize,
    delimiter: char,
    comment_marker: char,
}

impl LineParser {
    /// Creates a parser expecting `arity` fields per line.
    pub fn new(arity: usize) -> Self {
        Self {
            arity,
            delimiter: DEFAULT_DELIMITER,
            comment_marker: DEFAULT_COMMENT_MARKER,
        }
    }

    /// Uses a different field separator.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Uses a different comment marker.
    #[must_use]
    pub fn with_comment_marker(mut self, marker: char) -> Self {
        self.comment_marker = marker;
        self
    }

    /// Returns the expected number of fields.
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Parses one line.
    pub fn parse(&self, line: &str) -> Result<ParsedLine, ParseError> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(self.comment_marker) {
            return Ok(ParsedLine::CommentOrBlank);
        }

        let mut values = Vec::with_capacity(self.arity);
        for field in trimmed.split(self.delimiter) {
            let field = field.trim();
            let value: f64 = field.parse().map_err(|_| ParseError::NonNumeric {
                field: field.to_string(),
                raw: trimmed.to_string(),
            })?;
            values.push(value);
        }

        if values.len() != self.arity {
            return Err(ParseError::ArityMismatch {
                expected: self.arity,
                found: values.len(),
                raw: trimmed.to_string(),
            });
        }

        Ok(ParsedLine::Record(Record::new(values)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(line: &str, arity: usize) -> Record {
        match parse_line(line, arity) {
            Ok(ParsedLine::Record(record)) => record,
            other => panic!("expected record, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_lines() {
        assert_eq!(parse_line("", 3).unwrap(), ParsedLine::CommentOrBlank);
        assert_eq!(parse_line("   ", 3).unwrap(), ParsedLine::CommentOrBlank);
        assert_eq!(parse_line("\t\r\n", 3).unwrap(), ParsedLine::CommentOrBlank);
    }

    #[test]
    fn test_comment_lines() {
        assert_eq!(parse_line("# note", 3).unwrap(), ParsedLine::CommentOrBlank);
        assert_eq!(parse_line("   #1,2,3", 3).unwrap(), ParsedLine::CommentOrBlank);
    }

    #[test]
    fn test_valid_record() {
        let r = record("1.5,-2,3e2", 3);
        assert_eq!(r.values(), &[1.5, -2.0, 300.0]);
    }

    #[test]
    fn test_fields_are_trimmed() {
        let r = record("  10 , 20  ", 2);
        assert_eq!(r.values(), &[10.0, 20.0]);
    }

    #[test]
    fn test_non_numeric_field() {
        let err = parse_line("1,2,x", 3).unwrap_err();
        assert_eq!(
            err,
            ParseError::NonNumeric {
                field: "x".to_string(),
                raw: "1,2,x".to_string(),
            }
        );
        assert_eq!(err.reason(), "non-numeric field");
    }

    #[test]
    fn test_empty_field_is_non_numeric() {
        let err = parse_line("1,,3", 3).unwrap_err();
        assert!(matches!(err, ParseError::NonNumeric { .. }));
    }

    #[test]
    fn test_arity_mismatch() {
        let err = parse_line("1,2", 3).unwrap_err();
        assert_eq!(
            err,
            ParseError::ArityMismatch {
                expected: 3,
                found: 2,
                raw: "1,2".to_string(),
            }
        );

        let err = parse_line("1,2,3,4", 3).unwrap_err();
        assert_eq!(err.reason(), "arity mismatch");
    }

    #[test]
    fn test_non_numeric_reported_before_arity() {
        let err = parse_line("1,x", 3).unwrap_err();
        assert!(matches!(err, ParseError::NonNumeric { .. }));
    }

    #[test]
    fn test_display_round_trip() {
        let originals = [
            Record::new(vec![0.0]),
            Record::new(vec![1.0, -2.5, 3.25]),
            Record::new(vec![123_456.789, 1e-12, -0.1]),
            Record::new(vec![f64::MAX, f64::MIN_POSITIVE]),
        ];
        for original in originals {
            let text = original.to_string();
            assert_eq!(record(&text, original.len()), original);
        }
    }

    #[test]
    fn test_custom_dialect() {
        let parser = LineParser::new(2)
            .with_delimiter(';')
            .with_comment_marker('%');
        assert_eq!(parser.arity(), 2);
        assert_eq!(parser.parse("% header").unwrap(), ParsedLine::CommentOrBlank);
        assert_eq!(
            parser.parse("4;5").unwrap(),
            ParsedLine::Record(Record::new(vec![4.0, 5.0]))
        );
        assert!(parser.parse("4,5").is_err());
    }

    #[test]
    fn test_garbage_never_panics() {
        for line in [",", ",,,", "\u{feff}1,2", "NaN,", "1,2\0", "😀,1"] {
            let _ = parse_line(line, 2);
        }
    }
}
