//! Transport seam and connection identity.

use std::fmt;
use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use tokio::io::AsyncRead;
use tokio::io::AsyncWrite;
use tokio::net::TcpStream;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 6379;

/// Any duplex byte stream a session can run over.
pub trait ByteStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> ByteStream for T {}

/// Transport used by a session.
pub type BoxedStream = Box<dyn ByteStream>;

/// Opens the byte stream for a session.
///
/// Implement this to run the client over something other than plain TCP,
/// e.g. a TLS wrapper or an in-memory pipe in tests.
#[async_trait]
pub trait Connector: Send + Sync {
	async fn connect(&self, host: &str, port: u16) -> io::Result<BoxedStream>;
}

/// Plain TCP with Nagle disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
	async fn connect(&self, host: &str, port: u16) -> io::Result<BoxedStream> {
		let stream = TcpStream::connect((host, port)).await?;
		stream.set_nodelay(true)?;
		debug!("Connected to {}:{} from {}", host, port, stream.local_addr()?);
		Ok(Box::new(stream))
	}
}

/// Where to connect and how to authenticate.
#[derive(Clone)]
pub struct ConnectionIdentifier {
	host: String,
	port: u16,
	password: Option<String>,
	connector: Arc<dyn Connector>,
}

impl ConnectionIdentifier {
	pub fn new(host: impl Into<String>, port: u16) -> Self {
		Self {
			host: host.into(),
			port,
			password: None,
			connector: Arc::new(TcpConnector),
		}
	}

	/// Send `AUTH <password>` right after connecting.
	pub fn with_password(mut self, password: impl Into<String>) -> Self {
		self.password = Some(password.into());
		self
	}

	pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
		self.connector = connector;
		self
	}

	pub fn host(&self) -> &str {
		&self.host
	}

	pub fn port(&self) -> u16 {
		self.port
	}

	pub fn password(&self) -> Option<&str> {
		self.password.as_deref()
	}

	pub fn connector(&self) -> &Arc<dyn Connector> {
		&self.connector
	}
}

impl Default for ConnectionIdentifier {
	fn default() -> Self {
		Self::new(DEFAULT_HOST, DEFAULT_PORT)
	}
}

impl fmt::Debug for ConnectionIdentifier {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ConnectionIdentifier")
			.field("host", &self.host)
			.field("port", &self.port)
			.field("password", &self.password.as_ref().map(|_| "<redacted>"))
			.finish_non_exhaustive()
	}
}

impl fmt::Display for ConnectionIdentifier {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.host, self.port)
	}
}
