//! Raw byte to text decoding.

use crate::ParseError;

/// Decodes a raw line as UTF-8 and trims surrounding whitespace.
///
/// Line terminators (`\n`, `\r\n`) are part of the trimmed whitespace.
/// Bytes that are not valid UTF-8 produce [`ParseError::InvalidUtf8`] with a
/// lossy rendering of the input, so the line can still be reported.
///
/// # Example
///
/// ```
/// use serial_window::format::decode_line;
///
/// assert_eq!(decode_line(b" 1,2\r\n").unwrap(), "1,2");
/// assert!(decode_line(&[0xff, b'1']).is_err());
/// ```
pub fn decode_line(bytes: &[u8]) -> Result<&str, ParseError> {
    std::str::from_utf8(bytes)
        .map(str::trim)
        .map_err(|_| ParseError::InvalidUtf8 {
            raw: String::from_utf8_lossy(bytes).trim().to_string(),
        })
}
