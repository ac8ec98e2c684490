//! Resumable RESP reply decoder.
//!
//! Arrays are decoded with an explicit frame stack instead of call-stack
//! recursion, so a reply that is split across many socket reads, or nested
//! very deeply, never holds more than one native stack frame per call. When
//! the buffer runs dry mid-value the partial state stays in the decoder and
//! the next [`RespDecoder::decode`] call picks up where the last one stopped.

use log::trace;

use crate::buffer::ReadBuffer;
use crate::error::ParseError;
use crate::types::RespValue;
use crate::utils::*;

/// Default ceiling on nested array depth.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Default ceiling on a single bulk string, matching Redis'
/// `proto-max-bulk-len`.
pub const DEFAULT_MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Default ceiling on a `+ - : $ *` line, matching Redis'
/// `PROTO_INLINE_MAX_SIZE`.
pub const DEFAULT_MAX_LINE_LEN: usize = 64 * 1024;

// Upper bound on capacity reserved up front for a declared array count.
const MAX_PREALLOC: usize = 1024;

/// Result of a decoding attempt.
#[derive(Debug)]
pub enum DecodeResult {
	/// A complete RESP value was decoded.
	Complete(RespValue),
	/// The buffer does not contain enough data yet; refill and call again.
	Incomplete,
	/// The input is malformed. The decoder has been reset.
	Error(ParseError),
}

/// Guards against pathological lengths from an untrusted peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
	pub max_depth: usize,
	pub max_bulk_len: usize,
	pub max_line_len: usize,
}

impl Default for DecodeLimits {
	fn default() -> Self {
		Self {
			max_depth: DEFAULT_MAX_DEPTH,
			max_bulk_len: DEFAULT_MAX_BULK_LEN,
			max_line_len: DEFAULT_MAX_LINE_LEN,
		}
	}
}

/// A stateful RESP decoder that supports streaming.
#[derive(Debug, Default)]
pub struct RespDecoder {
	limits: DecodeLimits,
	frames: Vec<ArrayFrame>,
	// Declared length of a bulk string whose header was consumed but whose
	// payload has not fully arrived.
	pending_bulk: Option<usize>,
}

#[derive(Debug)]
struct ArrayFrame {
	expected: usize,
	elements: Vec<RespValue>,
}

enum Step {
	Value(RespValue),
	FramePushed,
}

impl RespDecoder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_limits(limits: DecodeLimits) -> Self {
		Self {
			limits,
			..Self::default()
		}
	}

	pub fn limits(&self) -> DecodeLimits {
		self.limits
	}

	/// True when no value is partially decoded.
	pub fn is_idle(&self) -> bool {
		self.frames.is_empty() && self.pending_bulk.is_none()
	}

	/// Drop any partially decoded value.
	pub fn reset(&mut self) {
		self.frames.clear();
		self.pending_bulk = None;
	}

	/// Decode one value from `buf`.
	///
	/// Consumed bytes are only those belonging to the returned value (or to
	/// the partial value held in the decoder), so back-to-back replies never
	/// share bytes.
	pub fn decode(&mut self, buf: &mut ReadBuffer) -> DecodeResult {
		loop {
			match self.step(buf) {
				Ok(Some(Step::FramePushed)) => continue,
				Ok(Some(Step::Value(value))) => {
					if let Some(done) = self.absorb(value) {
						return DecodeResult::Complete(done);
					}
				}
				Ok(None) => return DecodeResult::Incomplete,
				Err(e) => {
					self.reset();
					return DecodeResult::Error(e);
				}
			}
		}
	}

	// Feed a finished value into the innermost open array. Returns the root
	// value once it is complete.
	fn absorb(&mut self, mut value: RespValue) -> Option<RespValue> {
		loop {
			let Some(frame) = self.frames.last_mut() else {
				return Some(value);
			};

			// An error element aborts every enclosing array; the remaining
			// declared siblings are left unread in the buffer.
			if value.is_error() {
				trace!(
					"error element inside array at depth {}, short-circuiting",
					self.frames.len()
				);
				self.frames.clear();
				return Some(value);
			}

			frame.elements.push(value);
			if frame.elements.len() < frame.expected {
				return None;
			}
			let elements = std::mem::take(&mut frame.elements);
			self.frames.pop();
			value = RespValue::Array(Some(elements));
		}
	}

	fn step(&mut self, buf: &mut ReadBuffer) -> Result<Option<Step>, ParseError> {
		if let Some(length) = self.pending_bulk {
			return self.finish_bulk(buf, length);
		}

		let Some(line) = buf.peek_line() else {
			// Everything past the cursor belongs to the unterminated line
			if buf.available() > self.limits.max_line_len {
				return Err(ParseError::LineTooLong(self.limits.max_line_len));
			}
			return Ok(None);
		};
		if line.len() > self.limits.max_line_len {
			return Err(ParseError::LineTooLong(self.limits.max_line_len));
		}
		let Some((&marker, rest)) = line.split_first() else {
			return Err(ParseError::InvalidFormat(
				"empty line where a type marker was expected".to_string(),
			));
		};

		match marker {
			ERROR => Ok(Some(Step::Value(RespValue::error_from_line(rest)))),
			SIMPLE_STRING => Ok(Some(Step::Value(RespValue::SimpleString(
				String::from_utf8_lossy(rest).into_owned(),
			)))),
			INTEGER => Ok(Some(Step::Value(RespValue::Integer(parse_integer(rest)?)))),
			BULK_STRING => self.start_bulk(buf, rest),
			ARRAY => self.start_array(rest),
			other => Err(ParseError::InvalidTypeMarker(other)),
		}
	}

	fn start_bulk(&mut self, buf: &mut ReadBuffer, header: &[u8]) -> Result<Option<Step>, ParseError> {
		let length = parse_integer(header)?;
		if length == -1 {
			return Ok(Some(Step::Value(RespValue::BulkString(None))));
		}
		let length = usize::try_from(length).map_err(|_| ParseError::InvalidBulkStringLength(length))?;
		if length > self.limits.max_bulk_len {
			return Err(ParseError::BulkStringTooLarge(length));
		}

		self.pending_bulk = Some(length);
		self.finish_bulk(buf, length)
	}

	fn finish_bulk(&mut self, buf: &mut ReadBuffer, length: usize) -> Result<Option<Step>, ParseError> {
		// Payload plus the trailing CRLF
		let Some(mut data) = buf.take_exact(length + 2) else {
			trace!(
				"bulk string of {} bytes incomplete, {} buffered",
				length,
				buf.available()
			);
			return Ok(None);
		};
		self.pending_bulk = None;

		if &data[length..] != CRLF {
			return Err(ParseError::InvalidFormat(
				"Missing CRLF after bulk string".to_string(),
			));
		}
		data.truncate(length);
		Ok(Some(Step::Value(RespValue::BulkString(Some(data)))))
	}

	fn start_array(&mut self, header: &[u8]) -> Result<Option<Step>, ParseError> {
		let count = parse_integer(header)?;
		if count == -1 {
			return Ok(Some(Step::Value(RespValue::Array(None))));
		}
		let count = usize::try_from(count).map_err(|_| ParseError::InvalidArrayLength(count))?;
		if count == 0 {
			return Ok(Some(Step::Value(RespValue::Array(Some(Vec::new())))));
		}
		if self.frames.len() >= self.limits.max_depth {
			return Err(ParseError::NestingTooDeep(self.limits.max_depth));
		}

		self.frames.push(ArrayFrame {
			expected: count,
			elements: Vec::with_capacity(count.min(MAX_PREALLOC)),
		});
		Ok(Some(Step::FramePushed))
	}
}

/// Convenience function for one-off decoding of a complete input.
/// If streaming is needed, use `RespDecoder` with a `ReadBuffer` directly.
pub fn parse(input: &[u8]) -> Result<RespValue, ParseError> {
	let mut buf = ReadBuffer::new();
	buf.append(input);
	match RespDecoder::new().decode(&mut buf) {
		DecodeResult::Complete(value) => Ok(value),
		DecodeResult::Incomplete => Err(ParseError::UnexpectedEOF),
		DecodeResult::Error(e) => Err(e),
	}
}
