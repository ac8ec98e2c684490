//! Async request/reply session over a single byte stream.

use std::io;
use std::time::Duration;

use log::debug;
use log::trace;
use log::warn;
use resp::CommandArg;
use resp::DecodeLimits;
use resp::DecodeResult;
use resp::ReadBuffer;
use resp::RespDecoder;
use resp::RespValue;
use resp::encode_command;
use resp::encode_inline;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;

use crate::connector::BoxedStream;
use crate::connector::ConnectionIdentifier;
use crate::error::ClientError;
use crate::error::ClientResult;

pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Size of a single socket read.
const READ_CHUNK: usize = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
	/// Applies to each individual socket read, not to a whole reply
	pub read_timeout: Duration,
	pub connect_timeout: Duration,
	pub limits: DecodeLimits,
}

impl Default for ClientOptions {
	fn default() -> Self {
		Self {
			read_timeout: DEFAULT_READ_TIMEOUT,
			connect_timeout: DEFAULT_CONNECT_TIMEOUT,
			limits: DecodeLimits::default(),
		}
	}
}

/// A single request/reply session over a byte stream.
///
/// Exactly one reply is read per command sent. Out-of-band messages such as
/// pub/sub deliveries are pulled with [`Client::read_next`].
pub struct Client<S = BoxedStream> {
	stream: S,
	buffer: ReadBuffer,
	decoder: RespDecoder,
	read_timeout: Duration,
	scratch: Box<[u8]>,
}

impl Client<BoxedStream> {
	/// Connect through the identifier's connector and authenticate if it
	/// carries a password.
	pub async fn connect(id: &ConnectionIdentifier, options: ClientOptions) -> ClientResult<Self> {
		debug!("Connecting to {}", id);
		let connecting = id.connector().connect(id.host(), id.port());
		let stream = match timeout(options.connect_timeout, connecting).await {
			Ok(Ok(stream)) => stream,
			Ok(Err(source)) => {
				return Err(ClientError::Unavailable {
					host: id.host().to_string(),
					port: id.port(),
					source,
				});
			}
			Err(_) => {
				return Err(ClientError::Unavailable {
					host: id.host().to_string(),
					port: id.port(),
					source: io::Error::new(
						io::ErrorKind::TimedOut,
						format!("connect timed out after {:?}", options.connect_timeout),
					),
				});
			}
		};

		let mut client = Client::from_stream(stream, options);
		if let Some(password) = id.password() {
			let reply = client.auth(password).await?;
			if !reply.is_simple_ok() {
				warn!("Authentication against {} rejected: {}", id, reply);
				return Err(ClientError::NotAuthorized(reply));
			}
			debug!("Authenticated against {}", id);
		}
		Ok(client)
	}
}

impl<S> Client<S>
where
	S: AsyncRead + AsyncWrite + Unpin + Send,
{
	/// Wrap an already connected stream. No handshake is performed.
	pub fn from_stream(stream: S, options: ClientOptions) -> Self {
		Self {
			stream,
			buffer: ReadBuffer::with_capacity(READ_CHUNK * 2),
			decoder: RespDecoder::with_limits(options.limits),
			read_timeout: options.read_timeout,
			scratch: vec![0u8; READ_CHUNK].into_boxed_slice(),
		}
	}

	pub fn read_timeout(&self) -> Duration {
		self.read_timeout
	}

	pub fn set_read_timeout(&mut self, read_timeout: Duration) {
		self.read_timeout = read_timeout;
	}

	/// Send a command in multi-bulk form and wait for its reply.
	pub async fn send_command<A>(&mut self, name: &str, args: &[A]) -> ClientResult<RespValue>
	where
		A: Into<CommandArg> + Clone,
	{
		let bytes = encode_command(name, args);
		self.send_raw(&bytes).await
	}

	/// Send a command as a single inline line and wait for its reply.
	pub async fn send_inline<A>(&mut self, name: &str, args: &[A]) -> ClientResult<RespValue>
	where
		A: Into<CommandArg> + Clone,
	{
		let bytes = encode_inline(name, args);
		self.send_raw(&bytes).await
	}

	/// Write pre-encoded bytes and wait for exactly one reply.
	///
	/// Error replies from the server are returned as `Ok(RespValue::Error)`.
	pub async fn send_raw(&mut self, bytes: &[u8]) -> ClientResult<RespValue> {
		let written = self.write_fully(bytes).await?;
		if written != bytes.len() {
			return Err(ClientError::IncompleteWrite {
				written,
				expected: bytes.len(),
			});
		}
		trace!("Sent {} bytes", written);
		self.read_reply(self.read_timeout).await
	}

	/// Read the next value without sending anything first.
	pub async fn read_next(&mut self) -> ClientResult<RespValue> {
		self.read_reply(self.read_timeout).await
	}

	/// Like [`Client::read_next`] with a one-off per-read timeout.
	pub async fn read_next_timeout(&mut self, read_timeout: Duration) -> ClientResult<RespValue> {
		self.read_reply(read_timeout).await
	}

	/// Bytes received but not yet decoded into a value.
	pub fn buffered(&self) -> usize {
		self.buffer.available()
	}

	pub async fn close(mut self) -> ClientResult<()> {
		self.stream.shutdown().await?;
		debug!("Connection closed");
		Ok(())
	}

	async fn write_fully(&mut self, bytes: &[u8]) -> io::Result<usize> {
		let mut written = 0;
		while written < bytes.len() {
			let n = self.stream.write(&bytes[written..]).await?;
			if n == 0 {
				break;
			}
			written += n;
		}
		self.stream.flush().await?;
		Ok(written)
	}

	async fn read_reply(&mut self, read_timeout: Duration) -> ClientResult<RespValue> {
		loop {
			match self.decoder.decode(&mut self.buffer) {
				DecodeResult::Complete(value) => return Ok(value),
				DecodeResult::Incomplete => self.fill_buffer(read_timeout).await?,
				DecodeResult::Error(e) => {
					warn!("Malformed reply from server: {}", e);
					return Err(ClientError::Protocol(e));
				}
			}
		}
	}

	/// One socket read into the buffer. Timing out on a read leaves any
	/// partially decoded value in place.
	async fn fill_buffer(&mut self, read_timeout: Duration) -> ClientResult<()> {
		let n = match timeout(read_timeout, self.stream.read(&mut self.scratch)).await {
			Ok(read) => read?,
			Err(_) => return Err(ClientError::ReadTimeout(read_timeout)),
		};
		if n == 0 {
			debug!(
				"Server closed the connection with {} undecoded bytes",
				self.buffer.available()
			);
			return Err(ClientError::ConnectionClosed);
		}
		trace!("Read {} bytes from socket", n);
		self.buffer.append(&self.scratch[..n]);
		Ok(())
	}
}
