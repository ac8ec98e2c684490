//! Error types for RESP decoding.

use thiserror::Error;

/// Errors that can occur while decoding a RESP reply.
///
/// Every variant is fatal to the value being decoded; the decoder never
/// retries or skips over malformed input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
	/// Input ended before a complete value was available
	#[error("Unexpected end of input")]
	UnexpectedEOF,

	/// Leading byte is not one of `- + : $ *`
	#[error("invalid response from server: unknown type marker 0x{0:02X}")]
	InvalidTypeMarker(u8),

	/// Structural problem inside an otherwise well-typed value
	#[error("Invalid format: {0}")]
	InvalidFormat(String),

	/// Integer reply or length header is not a base-10 i64
	#[error("Invalid integer: {0}")]
	InvalidInteger(String),

	/// Bulk string length below -1
	#[error("Invalid bulk string length: {0}")]
	InvalidBulkStringLength(i64),

	/// Array count below -1
	#[error("Invalid array length: {0}")]
	InvalidArrayLength(i64),

	/// Declared bulk length exceeds the configured ceiling
	#[error("Bulk string length {0} exceeds the configured maximum")]
	BulkStringTooLarge(usize),

	/// Arrays nested deeper than the configured ceiling
	#[error("Array nesting exceeds maximum depth of {0}")]
	NestingTooDeep(usize),

	/// Header line longer than the configured ceiling
	#[error("Protocol line exceeds the configured maximum of {0} bytes")]
	LineTooLong(usize),
}

impl From<std::str::Utf8Error> for ParseError {
	fn from(e: std::str::Utf8Error) -> Self {
		ParseError::InvalidInteger(e.to_string())
	}
}

impl From<std::num::ParseIntError> for ParseError {
	fn from(e: std::num::ParseIntError) -> Self {
		ParseError::InvalidInteger(e.to_string())
	}
}

/// An application-level `-KIND message` reply, lifted out of the value model
/// by [`RespValue::into_result`](crate::RespValue::into_result).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} {message}")]
pub struct ServerError {
	pub kind: String,
	pub message: String,
}
