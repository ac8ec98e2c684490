//! Error types surfaced by the client session.

use std::time::Duration;

use resp::ParseError;
use resp::RespValue;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by the client.
///
/// Application error replies (`-KIND message`) are not represented here;
/// they arrive as [`RespValue::Error`] values. Every variant below leaves the
/// connection in an unknown state and the session should be closed.
#[derive(Error, Debug)]
pub enum ClientError {
	/// Malformed reply from the server
	#[error("protocol error: {0}")]
	Protocol(#[from] ParseError),

	/// Network failure while reading or writing
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),

	/// The sink stopped accepting bytes before the whole command was written
	#[error("failed to write all bytes: wrote {written} of {expected}")]
	IncompleteWrite { written: usize, expected: usize },

	/// No bytes arrived within the per-read timeout
	#[error("no reply from server within {0:?}")]
	ReadTimeout(Duration),

	/// The server closed the connection, possibly mid-reply
	#[error("connection closed by server")]
	ConnectionClosed,

	/// Connecting failed or timed out
	#[error("server {host}:{port} was not available: {source}")]
	Unavailable {
		host: String,
		port: u16,
		source: std::io::Error,
	},

	/// The password handshake was answered with something other than `+OK`
	#[error("not authorized: {0}")]
	NotAuthorized(RespValue),

	/// The worker thread behind a blocking client has exited
	#[error("client worker is no longer running")]
	WorkerGone,
}

impl ClientError {
	/// True for failures of the transport rather than of the reply grammar.
	pub fn is_connection_error(&self) -> bool {
		matches!(
			self,
			ClientError::Io(_)
				| ClientError::IncompleteWrite { .. }
				| ClientError::ReadTimeout(_)
				| ClientError::ConnectionClosed
				| ClientError::Unavailable { .. }
		)
	}
}
