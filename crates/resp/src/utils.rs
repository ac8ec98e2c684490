//! Utility functions and constants for RESP protocol.

use crate::error::ParseError;

/// CRLF line ending
pub const CRLF: &[u8] = b"\r\n";

/// Type markers for RESP2
pub const SIMPLE_STRING: u8 = b'+';
pub const ERROR: u8 = b'-';
pub const INTEGER: u8 = b':';
pub const BULK_STRING: u8 = b'$';
pub const ARRAY: u8 = b'*';

/// Find the position of the first contiguous CRLF in a byte slice.
///
/// A lone `\r` or `\n` is skipped; only the pair terminates a line.
#[inline]
pub fn find_crlf(buf: &[u8]) -> Option<usize> {
	memchr::memchr_iter(b'\r', buf).find(|&pos| buf.get(pos + 1) == Some(&b'\n'))
}

/// Parse a signed base-10 integer from a byte slice
#[inline]
pub fn parse_integer(buf: &[u8]) -> Result<i64, ParseError> {
	let s = std::str::from_utf8(buf)?;
	s.parse::<i64>()
		.map_err(|e| ParseError::InvalidInteger(format!("{:?}: {}", s, e)))
}
