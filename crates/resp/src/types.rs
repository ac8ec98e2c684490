//! RESP data types and value representation.

use std::fmt;

use bytes::Bytes;

use crate::error::ServerError;

/// Generic error code used when an error line carries no `KIND` prefix.
pub const GENERIC_ERROR_KIND: &str = "ERR";

/// Represents a RESP2 protocol value.
///
/// Null bulk strings and null arrays are kept apart from their empty
/// counterparts: `$-1` decodes to `BulkString(None)` while `$0\r\n\r\n`
/// decodes to `BulkString(Some(b""))`, and likewise `*-1` / `*0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RespValue {
	/// Error: `-ERR message\r\n`
	Error { kind: String, message: String },

	/// Simple string: `+OK\r\n`
	SimpleString(String),

	/// Bulk string: `$6\r\nfoobar\r\n`, or `$-1\r\n` for null
	BulkString(Option<Bytes>),

	/// Integer: `:1000\r\n`
	Integer(i64),

	/// Array: `*2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n`, or `*-1\r\n` for null
	Array(Option<Vec<RespValue>>),
}

impl RespValue {
	/// Check if the value is an error
	pub fn is_error(&self) -> bool {
		matches!(self, RespValue::Error { .. })
	}

	/// Check if the value is a null bulk string or a null array
	pub fn is_null(&self) -> bool {
		matches!(self, RespValue::BulkString(None) | RespValue::Array(None))
	}

	/// True for the standard `+OK` acknowledgement
	pub fn is_simple_ok(&self) -> bool {
		matches!(self, RespValue::SimpleString(s) if s == "OK")
	}

	/// Try to convert to a string slice
	pub fn as_str(&self) -> Option<&str> {
		match self {
			RespValue::SimpleString(s) => Some(s),
			RespValue::BulkString(Some(b)) => std::str::from_utf8(b).ok(),
			_ => None,
		}
	}

	/// Try to convert to bytes
	pub fn as_bytes(&self) -> Option<&[u8]> {
		match self {
			RespValue::SimpleString(s) => Some(s.as_bytes()),
			RespValue::BulkString(Some(b)) => Some(b),
			_ => None,
		}
	}

	/// Try to convert to integer
	pub fn as_integer(&self) -> Option<i64> {
		match self {
			RespValue::Integer(i) => Some(*i),
			_ => None,
		}
	}

	/// Try to convert to a slice of elements. Null arrays yield `None`.
	pub fn as_array(&self) -> Option<&[RespValue]> {
		match self {
			RespValue::Array(Some(a)) => Some(a),
			_ => None,
		}
	}

	/// Convert to String with lossy UTF-8 conversion
	pub fn to_string_lossy(&self) -> Option<String> {
		match self {
			RespValue::SimpleString(s) => Some(s.clone()),
			RespValue::BulkString(Some(b)) => Some(String::from_utf8_lossy(b).into_owned()),
			_ => None,
		}
	}

	/// Try to consume and convert to Vec<RespValue>
	pub fn into_array(self) -> Option<Vec<RespValue>> {
		match self {
			RespValue::Array(a) => a,
			_ => None,
		}
	}

	/// Lift an error reply into `Err`, passing every other value through.
	///
	/// The decoder never does this on its own; callers opt in when an
	/// application error should abort their flow.
	pub fn into_result(self) -> Result<RespValue, ServerError> {
		match self {
			RespValue::Error { kind, message } => Err(ServerError { kind, message }),
			other => Ok(other),
		}
	}

	/// Build an error from the text of a `-` line (marker already stripped).
	///
	/// The line is split on the first space only, so the message keeps any
	/// embedded spaces. Without a space the whole line is the message and the
	/// kind falls back to [`GENERIC_ERROR_KIND`].
	pub fn error_from_line(line: &[u8]) -> Self {
		let text = String::from_utf8_lossy(line);
		match text.split_once(' ') {
			Some((kind, message)) => RespValue::Error {
				kind: kind.to_string(),
				message: message.to_string(),
			},
			None => RespValue::Error {
				kind: GENERIC_ERROR_KIND.to_string(),
				message: text.into_owned(),
			},
		}
	}

	// Convenience constructors

	/// Create a simple string value
	pub fn simple_string(s: impl Into<String>) -> Self {
		RespValue::SimpleString(s.into())
	}

	/// Create a bulk string value
	pub fn bulk_string(s: impl Into<Bytes>) -> Self {
		RespValue::BulkString(Some(s.into()))
	}

	/// Create a null bulk string
	pub fn null_bulk() -> Self {
		RespValue::BulkString(None)
	}

	/// Create an error value
	pub fn error(kind: impl Into<String>, message: impl Into<String>) -> Self {
		RespValue::Error {
			kind: kind.into(),
			message: message.into(),
		}
	}

	/// Create an integer value
	pub fn integer(i: i64) -> Self {
		RespValue::Integer(i)
	}

	/// Create an array value from an iterator
	pub fn array(items: impl IntoIterator<Item = RespValue>) -> Self {
		RespValue::Array(Some(items.into_iter().collect()))
	}

	/// Create a null array
	pub fn null_array() -> Self {
		RespValue::Array(None)
	}

	fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
		match self {
			RespValue::Error { kind, message } => write!(f, "(error) {} {}", kind, message),
			RespValue::SimpleString(s) => write!(f, "{}", s),
			RespValue::BulkString(Some(b)) => write!(f, "\"{}\"", b.escape_ascii()),
			RespValue::BulkString(None) | RespValue::Array(None) => write!(f, "(nil)"),
			RespValue::Integer(i) => write!(f, "(integer) {}", i),
			RespValue::Array(Some(items)) if items.is_empty() => write!(f, "(empty array)"),
			RespValue::Array(Some(items)) => {
				let width = items.len().to_string().len();
				for (idx, item) in items.iter().enumerate() {
					if idx > 0 {
						writeln!(f)?;
						write!(f, "{:indent$}", "")?;
					}
					let prefix = format!("{:>width$}) ", idx + 1);
					write!(f, "{}", prefix)?;
					item.fmt_indented(f, indent + prefix.len())?;
				}
				Ok(())
			}
		}
	}
}

/// Renders replies the way `redis-cli` prints them.
impl fmt::Display for RespValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.fmt_indented(f, 0)
	}
}

// Convenient From implementations
impl From<&str> for RespValue {
	fn from(s: &str) -> Self {
		RespValue::BulkString(Some(Bytes::copy_from_slice(s.as_bytes())))
	}
}

impl From<String> for RespValue {
	fn from(s: String) -> Self {
		RespValue::BulkString(Some(Bytes::from(s)))
	}
}

impl From<&[u8]> for RespValue {
	fn from(b: &[u8]) -> Self {
		RespValue::BulkString(Some(Bytes::copy_from_slice(b)))
	}
}

impl From<Bytes> for RespValue {
	fn from(b: Bytes) -> Self {
		RespValue::BulkString(Some(b))
	}
}

impl From<i64> for RespValue {
	fn from(i: i64) -> Self {
		RespValue::Integer(i)
	}
}

impl<T: Into<RespValue>> From<Vec<T>> for RespValue {
	fn from(v: Vec<T>) -> Self {
		RespValue::Array(Some(v.into_iter().map(|x| x.into()).collect()))
	}
}

/// One argument of an outbound command.
///
/// Text and binary arguments encode identically in multi-bulk form; they only
/// differ in their inline display form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandArg {
	Text(String),
	Binary(Bytes),
}

impl CommandArg {
	/// Raw bytes sent in the multi-bulk form
	pub fn as_bytes(&self) -> &[u8] {
		match self {
			CommandArg::Text(s) => s.as_bytes(),
			CommandArg::Binary(b) => b,
		}
	}

	/// Inline form: `"text"` for strings, `"\xHH..."` for binary payloads.
	pub fn display_form(&self) -> String {
		match self {
			CommandArg::Text(s) => format!("\"{}\"", s),
			CommandArg::Binary(b) => {
				let mut out = String::with_capacity(b.len() * 4 + 2);
				out.push('"');
				for byte in b.iter() {
					out.push_str(&format!("\\x{:02X}", byte));
				}
				out.push('"');
				out
			}
		}
	}
}

impl From<&str> for CommandArg {
	fn from(s: &str) -> Self {
		CommandArg::Text(s.to_string())
	}
}

impl From<String> for CommandArg {
	fn from(s: String) -> Self {
		CommandArg::Text(s)
	}
}

impl From<&String> for CommandArg {
	fn from(s: &String) -> Self {
		CommandArg::Text(s.clone())
	}
}

impl From<&[u8]> for CommandArg {
	fn from(b: &[u8]) -> Self {
		CommandArg::Binary(Bytes::copy_from_slice(b))
	}
}

impl From<Vec<u8>> for CommandArg {
	fn from(b: Vec<u8>) -> Self {
		CommandArg::Binary(Bytes::from(b))
	}
}

impl From<Bytes> for CommandArg {
	fn from(b: Bytes) -> Self {
		CommandArg::Binary(b)
	}
}

impl From<i64> for CommandArg {
	fn from(i: i64) -> Self {
		CommandArg::Text(i.to_string())
	}
}
