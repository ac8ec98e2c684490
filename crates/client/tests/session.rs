use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::Mutex;
use std::task::Context;
use std::task::Poll;
use std::time::Duration;

use async_trait::async_trait;
use client::BoxedStream;
use client::Client;
use client::ClientError;
use client::ClientOptions;
use client::ConnectionIdentifier;
use client::Connector;
use resp::DecodeLimits;
use resp::DecodeResult;
use resp::ParseError;
use resp::ReadBuffer;
use resp::RespDecoder;
use resp::RespValue;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::io::DuplexStream;
use tokio::io::ReadBuf;
use tokio::io::duplex;
use tokio::time::sleep;

/// The far end of an in-memory connection, decoding whatever the client sends.
struct FakeServer {
	stream: DuplexStream,
	buf: ReadBuffer,
	decoder: RespDecoder,
}

impl FakeServer {
	fn new(stream: DuplexStream) -> Self {
		Self {
			stream,
			buf: ReadBuffer::new(),
			decoder: RespDecoder::new(),
		}
	}

	async fn next_command(&mut self) -> Vec<String> {
		loop {
			match self.decoder.decode(&mut self.buf) {
				DecodeResult::Complete(value) => {
					return value
						.into_array()
						.expect("command is an array")
						.iter()
						.map(|arg| arg.to_string_lossy().expect("bulk argument"))
						.collect();
				}
				DecodeResult::Incomplete => self.fill().await,
				DecodeResult::Error(e) => panic!("client sent malformed command: {}", e),
			}
		}
	}

	async fn next_line(&mut self) -> Vec<u8> {
		loop {
			if let Some(line) = self.buf.peek_line() {
				return line.to_vec();
			}
			self.fill().await;
		}
	}

	async fn fill(&mut self) {
		let mut chunk = [0u8; 512];
		let n = self.stream.read(&mut chunk).await.unwrap();
		assert!(n > 0, "client hung up");
		self.buf.append(&chunk[..n]);
	}

	async fn reply(&mut self, bytes: &[u8]) {
		self.stream.write_all(bytes).await.unwrap();
	}
}

fn pipe(read_timeout: Duration) -> (Client<DuplexStream>, FakeServer) {
	let (near, far) = duplex(4096);
	let options = ClientOptions {
		read_timeout,
		..ClientOptions::default()
	};
	(Client::from_stream(near, options), FakeServer::new(far))
}

/// Hands out a single prepared stream.
struct PipeConnector {
	stream: Mutex<Option<DuplexStream>>,
}

impl PipeConnector {
	fn new(stream: DuplexStream) -> Arc<Self> {
		Arc::new(Self {
			stream: Mutex::new(Some(stream)),
		})
	}
}

#[async_trait]
impl Connector for PipeConnector {
	async fn connect(&self, _host: &str, _port: u16) -> io::Result<BoxedStream> {
		let stream = self.stream.lock().unwrap().take();
		match stream {
			Some(s) => Ok(Box::new(s)),
			None => Err(io::Error::new(io::ErrorKind::ConnectionRefused, "pipe already used")),
		}
	}
}

/// Never finishes connecting.
struct BlackholeConnector;

#[async_trait]
impl Connector for BlackholeConnector {
	async fn connect(&self, _host: &str, _port: u16) -> io::Result<BoxedStream> {
		std::future::pending().await
	}
}

/// Accepts `accept` bytes in total and then refuses further writes.
struct StalledSink {
	accept: usize,
}

impl AsyncWrite for StalledSink {
	fn poll_write(
		mut self: Pin<&mut Self>,
		_cx: &mut Context<'_>,
		buf: &[u8],
	) -> Poll<io::Result<usize>> {
		let n = buf.len().min(self.accept);
		self.accept -= n;
		Poll::Ready(Ok(n))
	}

	fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
		Poll::Ready(Ok(()))
	}

	fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
		Poll::Ready(Ok(()))
	}
}

impl AsyncRead for StalledSink {
	fn poll_read(
		self: Pin<&mut Self>,
		_cx: &mut Context<'_>,
		_buf: &mut ReadBuf<'_>,
	) -> Poll<io::Result<()>> {
		Poll::Ready(Ok(()))
	}
}

#[tokio::test]
async fn test_command_round_trip() {
	let (mut client, mut server) = pipe(Duration::from_secs(1));
	let handle = tokio::spawn(async move {
		assert_eq!(server.next_command().await, vec!["SET", "key", "value"]);
		server.reply(b"+OK\r\n").await;
		assert_eq!(server.next_command().await, vec!["GET", "key"]);
		server.reply(b"$5\r\nvalue\r\n").await;
	});

	assert!(client.send_command("SET", &["key", "value"]).await.unwrap().is_simple_ok());
	assert_eq!(
		client.send_command("GET", &["key"]).await.unwrap(),
		RespValue::bulk_string("value")
	);
	handle.await.unwrap();
}

#[tokio::test]
async fn test_error_reply_is_a_value() {
	let (mut client, mut server) = pipe(Duration::from_secs(1));
	let handle = tokio::spawn(async move {
		server.next_command().await;
		server.reply(b"-ERR unknown command 'FOO'\r\n").await;
	});

	let reply = client.send_command("FOO", &["bar"]).await.unwrap();
	assert_eq!(reply, RespValue::error("ERR", "unknown command 'FOO'"));
	handle.await.unwrap();
}

#[tokio::test]
async fn test_inline_command_wire_form() {
	let (mut client, mut server) = pipe(Duration::from_secs(1));
	let handle = tokio::spawn(async move {
		assert_eq!(server.next_line().await, b"SET \"k\" \"v\"".to_vec());
		server.reply(b"+OK\r\n").await;
	});

	assert!(client.send_inline("SET", &["k", "v"]).await.unwrap().is_simple_ok());
	handle.await.unwrap();
}

#[tokio::test]
async fn test_reply_trickling_in_resets_timeout_per_read() {
	let (mut client, mut server) = pipe(Duration::from_millis(150));
	let handle = tokio::spawn(async move {
		server.next_command().await;
		for piece in [&b"$10\r\n"[..], b"hello", b"world", b"\r\n"] {
			sleep(Duration::from_millis(50)).await;
			server.reply(piece).await;
		}
	});

	let reply = client.send_command("GET", &["greeting"]).await.unwrap();
	assert_eq!(reply, RespValue::bulk_string("helloworld"));
	handle.await.unwrap();
}

#[tokio::test]
async fn test_silent_server_times_out() {
	let (mut client, mut server) = pipe(Duration::from_millis(50));
	let handle = tokio::spawn(async move {
		server.next_command().await;
		// Keep the connection open without answering
		sleep(Duration::from_millis(300)).await;
	});

	match client.send_command("BLPOP", &["queue", "0"]).await {
		Err(ClientError::ReadTimeout(d)) => assert_eq!(d, Duration::from_millis(50)),
		other => panic!("Expected ReadTimeout, got {:?}", other),
	}
	handle.await.unwrap();
}

#[tokio::test]
async fn test_close_mid_bulk_is_connection_closed() {
	let (mut client, mut server) = pipe(Duration::from_secs(1));
	let handle = tokio::spawn(async move {
		server.next_command().await;
		server.reply(b"$10\r\nhello").await;
		// Dropping the server closes the pipe
	});

	let result = client.send_command("GET", &["k"]).await;
	handle.await.unwrap();
	assert!(matches!(result, Err(ClientError::ConnectionClosed)));
}

#[tokio::test]
async fn test_unknown_marker_is_protocol_error() {
	let (mut client, mut server) = pipe(Duration::from_secs(1));
	let handle = tokio::spawn(async move {
		server.next_command().await;
		server.reply(b"!boom\r\n").await;
	});

	let err = client.ping().await.unwrap_err();
	assert!(matches!(
		err,
		ClientError::Protocol(ParseError::InvalidTypeMarker(b'!'))
	));
	assert!(!err.is_connection_error());
	handle.await.unwrap();
}

#[tokio::test]
async fn test_endless_status_line_is_protocol_error() {
	let (near, far) = duplex(4096);
	let options = ClientOptions {
		limits: DecodeLimits {
			max_line_len: 1024,
			..DecodeLimits::default()
		},
		..ClientOptions::default()
	};
	let mut client = Client::from_stream(near, options);
	let mut server = FakeServer::new(far);
	let handle = tokio::spawn(async move {
		server.next_command().await;
		server.reply(b"+").await;
		// Keep streaming without a terminator until the client hangs up
		for _ in 0..256 {
			if server.stream.write_all(&[b'A'; 512]).await.is_err() {
				break;
			}
		}
	});

	let err = client.ping().await.unwrap_err();
	assert!(matches!(
		err,
		ClientError::Protocol(ParseError::LineTooLong(1024))
	));
	assert!(client.buffered() <= 1024 + 2048);
	drop(client);
	handle.await.unwrap();
}

#[tokio::test]
async fn test_short_write_is_reported() {
	let mut client = Client::from_stream(StalledSink { accept: 5 }, ClientOptions::default());

	match client.ping().await {
		Err(ClientError::IncompleteWrite { written, expected }) => {
			assert_eq!(written, 5);
			assert_eq!(expected, b"*1\r\n$4\r\nPING\r\n".len());
		}
		other => panic!("Expected IncompleteWrite, got {:?}", other),
	}
}

#[tokio::test]
async fn test_subscription_deliveries_via_read_next() {
	let (mut client, mut server) = pipe(Duration::from_secs(1));
	let handle = tokio::spawn(async move {
		assert_eq!(server.next_command().await, vec!["SUBSCRIBE", "news", "weather"]);
		server
			.reply(b"*3\r\n$9\r\nsubscribe\r\n$4\r\nnews\r\n:1\r\n*3\r\n$9\r\nsubscribe\r\n$7\r\nweather\r\n:2\r\n")
			.await;
		sleep(Duration::from_millis(20)).await;
		server
			.reply(b"*3\r\n$7\r\nmessage\r\n$4\r\nnews\r\n$5\r\nhello\r\n")
			.await;
	});

	let first = client.subscribe(&["news", "weather"]).await.unwrap();
	assert_eq!(
		first,
		RespValue::array(vec![
			RespValue::bulk_string("subscribe"),
			RespValue::bulk_string("news"),
			RespValue::Integer(1),
		])
	);

	let second = client.read_next().await.unwrap();
	assert_eq!(second.as_array().map(|a| a.len()), Some(3));
	assert_eq!(second.as_array().unwrap()[2], RespValue::Integer(2));

	let message = client.read_published(Duration::from_secs(1)).await.unwrap();
	assert_eq!(
		message,
		RespValue::array(vec![
			RespValue::bulk_string("message"),
			RespValue::bulk_string("news"),
			RespValue::bulk_string("hello"),
		])
	);
	handle.await.unwrap();
}

#[tokio::test]
async fn test_connect_authenticates() {
	let (near, far) = duplex(1024);
	let handle = tokio::spawn(async move {
		let mut server = FakeServer::new(far);
		assert_eq!(server.next_command().await, vec!["AUTH", "secret"]);
		server.reply(b"+OK\r\n").await;
		assert_eq!(server.next_command().await, vec!["PING"]);
		server.reply(b"+PONG\r\n").await;
	});

	let id = ConnectionIdentifier::new("pipe", 6379)
		.with_password("secret")
		.with_connector(PipeConnector::new(near));
	let mut client = Client::connect(&id, ClientOptions::default()).await.unwrap();
	assert_eq!(client.ping().await.unwrap(), RespValue::simple_string("PONG"));
	handle.await.unwrap();
}

#[tokio::test]
async fn test_connect_rejected_password() {
	let (near, far) = duplex(1024);
	let handle = tokio::spawn(async move {
		let mut server = FakeServer::new(far);
		server.next_command().await;
		server
			.reply(b"-WRONGPASS invalid username-password pair\r\n")
			.await;
	});

	let id = ConnectionIdentifier::new("pipe", 6379)
		.with_password("nope")
		.with_connector(PipeConnector::new(near));
	match Client::connect(&id, ClientOptions::default()).await {
		Err(ClientError::NotAuthorized(reply)) => {
			assert_eq!(
				reply,
				RespValue::error("WRONGPASS", "invalid username-password pair")
			);
		}
		Err(other) => panic!("Expected NotAuthorized, got {:?}", other),
		Ok(_) => panic!("Expected NotAuthorized, got a session"),
	}
	handle.await.unwrap();
}

#[tokio::test]
async fn test_connect_refused_is_unavailable() {
	let port = {
		let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
		listener.local_addr().unwrap().port()
	};

	let id = ConnectionIdentifier::new("127.0.0.1", port);
	match Client::connect(&id, ClientOptions::default()).await {
		Err(ClientError::Unavailable { host, port: p, .. }) => {
			assert_eq!(host, "127.0.0.1");
			assert_eq!(p, port);
		}
		Err(other) => panic!("Expected Unavailable, got {:?}", other),
		Ok(_) => panic!("Expected Unavailable, got a session"),
	}
}

#[tokio::test]
async fn test_connect_timeout_is_unavailable() {
	let id = ConnectionIdentifier::new("blackhole", 1).with_connector(Arc::new(BlackholeConnector));
	let options = ClientOptions {
		connect_timeout: Duration::from_millis(30),
		..ClientOptions::default()
	};

	match Client::connect(&id, options).await {
		Err(ClientError::Unavailable { source, .. }) => {
			assert_eq!(source.kind(), io::ErrorKind::TimedOut);
		}
		Err(other) => panic!("Expected Unavailable, got {:?}", other),
		Ok(_) => panic!("Expected Unavailable, got a session"),
	}
}

#[tokio::test]
async fn test_tcp_session_end_to_end() {
	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
	let port = listener.local_addr().unwrap().port();
	let handle = tokio::spawn(async move {
		let (mut socket, _) = listener.accept().await.unwrap();
		let expected = b"*2\r\n$4\r\nECHO\r\n$3\r\nhey\r\n";
		let mut buf = vec![0u8; expected.len()];
		socket.read_exact(&mut buf).await.unwrap();
		assert_eq!(&buf[..], &expected[..]);
		socket.write_all(b"$3\r\nhey\r\n").await.unwrap();
	});

	let id = ConnectionIdentifier::new("127.0.0.1", port);
	let mut client = Client::connect(&id, ClientOptions::default()).await.unwrap();
	assert_eq!(client.echo("hey").await.unwrap().as_str(), Some("hey"));
	client.close().await.unwrap();
	handle.await.unwrap();
}
