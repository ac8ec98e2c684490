//! RESP encoding for values and outbound commands.

use bytes::BufMut;
use bytes::Bytes;
use bytes::BytesMut;

use crate::types::CommandArg;
use crate::types::RespValue;
use crate::utils::*;

/// Trait for encoding RESP values.
pub trait RespEncoder {
	fn encode_to(&self, buf: &mut BytesMut);

	fn encode(&self) -> Bytes {
		let mut buf = BytesMut::new();
		self.encode_to(&mut buf);
		buf.freeze()
	}
}

impl RespEncoder for RespValue {
	fn encode_to(&self, buf: &mut BytesMut) {
		match self {
			RespValue::Error { kind, message } => encode_error(buf, kind, message),
			RespValue::SimpleString(s) => encode_simple_string(buf, s),
			RespValue::BulkString(Some(b)) => encode_bulk_string(buf, b),
			RespValue::BulkString(None) => encode_null(buf, BULK_STRING),
			RespValue::Integer(i) => encode_integer(buf, *i),
			RespValue::Array(Some(arr)) => encode_array(buf, arr),
			RespValue::Array(None) => encode_null(buf, ARRAY),
		}
	}
}

/// Encode a command in the multi-bulk form: an array of bulk strings with
/// the command name first. Binary safe for every argument.
pub fn encode_command<A: Into<CommandArg> + Clone>(name: &str, args: &[A]) -> Bytes {
	let args: Vec<CommandArg> = args.iter().cloned().map(Into::into).collect();
	let mut buf = BytesMut::with_capacity(
		16 + name.len() + args.iter().map(|a| a.as_bytes().len() + 16).sum::<usize>(),
	);
	encode_length(&mut buf, ARRAY, args.len() + 1);
	encode_bulk_string(&mut buf, name.as_bytes());
	for arg in &args {
		encode_bulk_string(&mut buf, arg.as_bytes());
	}
	buf.freeze()
}

/// Encode a command in the inline form: `NAME "arg1" "arg2"\r\n`.
///
/// Arguments are rendered through [`CommandArg::display_form`]. The inline
/// form cannot carry arbitrary bytes faithfully; prefer [`encode_command`].
pub fn encode_inline<A: Into<CommandArg> + Clone>(name: &str, args: &[A]) -> Bytes {
	let mut buf = BytesMut::with_capacity(name.len() + 2);
	buf.put_slice(name.as_bytes());
	for arg in args {
		let arg: CommandArg = arg.clone().into();
		buf.put_u8(b' ');
		buf.put_slice(arg.display_form().as_bytes());
	}
	buf.put_slice(CRLF);
	buf.freeze()
}

#[inline]
fn encode_simple_string(buf: &mut BytesMut, s: &str) {
	buf.put_u8(SIMPLE_STRING);
	buf.put_slice(s.as_bytes());
	buf.put_slice(CRLF);
}

#[inline]
fn encode_error(buf: &mut BytesMut, kind: &str, message: &str) {
	buf.put_u8(ERROR);
	buf.put_slice(kind.as_bytes());
	buf.put_u8(b' ');
	buf.put_slice(message.as_bytes());
	buf.put_slice(CRLF);
}

#[inline]
fn encode_integer(buf: &mut BytesMut, i: i64) {
	buf.put_u8(INTEGER);
	buf.put_slice(i.to_string().as_bytes());
	buf.put_slice(CRLF);
}

#[inline]
fn encode_length(buf: &mut BytesMut, marker: u8, length: usize) {
	buf.put_u8(marker);
	buf.put_slice(length.to_string().as_bytes());
	buf.put_slice(CRLF);
}

#[inline]
fn encode_null(buf: &mut BytesMut, marker: u8) {
	buf.put_u8(marker);
	buf.put_slice(b"-1");
	buf.put_slice(CRLF);
}

#[inline]
fn encode_bulk_string(buf: &mut BytesMut, s: &[u8]) {
	encode_length(buf, BULK_STRING, s.len());
	buf.put_slice(s);
	buf.put_slice(CRLF);
}

fn encode_array(buf: &mut BytesMut, arr: &[RespValue]) {
	encode_length(buf, ARRAY, arr.len());
	for value in arr {
		value.encode_to(buf);
	}
}
