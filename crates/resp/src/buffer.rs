//! Accumulating read buffer with a logical read cursor.

use bytes::Buf;
use bytes::Bytes;
use bytes::BytesMut;

use crate::utils::find_crlf;

/// Bytes received from the peer but not yet consumed by the decoder.
///
/// Everything before `cursor` has been consumed and is only kept until the
/// next [`append`](ReadBuffer::append), which compacts it away.
#[derive(Debug, Default)]
pub struct ReadBuffer {
	buf: BytesMut,
	cursor: usize,
	// Bytes past the cursor already searched for CRLF without a match.
	scanned: usize,
}

impl ReadBuffer {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			buf: BytesMut::with_capacity(capacity),
			cursor: 0,
			scanned: 0,
		}
	}

	/// Append freshly received bytes, compacting the consumed prefix first.
	pub fn append(&mut self, bytes: &[u8]) {
		self.compact();
		self.buf.extend_from_slice(bytes);
	}

	/// Number of bytes between the cursor and the end of the buffer
	#[inline]
	pub fn available(&self) -> usize {
		self.buf.len() - self.cursor
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.available() == 0
	}

	/// The unconsumed bytes, without moving the cursor
	pub fn unconsumed(&self) -> &[u8] {
		&self.buf[self.cursor..]
	}

	/// Take the next CRLF-terminated line, without its terminator.
	///
	/// Returns `None` and leaves the cursor untouched when no complete line
	/// is buffered yet. A failed search is remembered, so the next call only
	/// looks at newly appended bytes.
	pub fn peek_line(&mut self) -> Option<Bytes> {
		// Step back one byte: a CR at the old end may pair with a new LF
		let from = self.scanned.saturating_sub(1);
		let Some(pos) = find_crlf(&self.unconsumed()[from..]) else {
			self.scanned = self.available();
			return None;
		};
		let end = self.cursor + from + pos;
		let line = Bytes::copy_from_slice(&self.buf[self.cursor..end]);
		self.cursor = end + 2;
		self.scanned = 0;
		Some(line)
	}

	/// Take exactly `n` bytes, or nothing if fewer are buffered.
	pub fn take_exact(&mut self, n: usize) -> Option<Bytes> {
		if self.available() < n {
			return None;
		}
		let data = Bytes::copy_from_slice(&self.buf[self.cursor..self.cursor + n]);
		self.cursor += n;
		self.scanned = 0;
		Some(data)
	}

	/// Drop every byte before the cursor.
	pub fn compact(&mut self) {
		if self.cursor > 0 {
			self.buf.advance(self.cursor);
			self.cursor = 0;
		}
	}

	/// Discard all buffered bytes, consumed or not.
	pub fn clear(&mut self) {
		self.buf.clear();
		self.cursor = 0;
		self.scanned = 0;
	}
}
