//! Client session for RESP servers.
//!
//! [`Client`] is the async session: it writes encoded commands, then reads the
//! socket in small chunks and feeds a resumable [`resp::RespDecoder`] until
//! one reply is complete. [`BlockingClient`] runs the same session on a
//! worker thread for synchronous callers.

mod client;
mod commands;
mod connector;
mod error;
mod worker;

pub use client::Client;
pub use client::ClientOptions;
pub use client::DEFAULT_CONNECT_TIMEOUT;
pub use client::DEFAULT_READ_TIMEOUT;
pub use connector::BoxedStream;
pub use connector::ByteStream;
pub use connector::ConnectionIdentifier;
pub use connector::Connector;
pub use connector::DEFAULT_HOST;
pub use connector::DEFAULT_PORT;
pub use connector::TcpConnector;
pub use error::ClientError;
pub use error::ClientResult;
pub use worker::BlockingClient;
