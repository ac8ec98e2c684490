//! # RESP - Redis Serialization Protocol engine
//!
//! Client-side RESP2 support: an accumulating [`ReadBuffer`], a resumable
//! [`RespDecoder`] that turns buffered bytes into [`RespValue`]s, and the
//! multi-bulk and inline command encoders.
//!
//! The crate performs no I/O. Callers append whatever bytes arrived from the
//! socket and call [`RespDecoder::decode`] until it stops reporting
//! [`DecodeResult::Incomplete`].
//!
//! ## Example
//!
//! ```rust
//! use resp::DecodeResult;
//! use resp::ReadBuffer;
//! use resp::RespDecoder;
//! use resp::RespValue;
//!
//! let mut buf = ReadBuffer::new();
//! let mut decoder = RespDecoder::new();
//!
//! buf.append(b"$5\r\nhel");
//! assert!(matches!(decoder.decode(&mut buf), DecodeResult::Incomplete));
//!
//! buf.append(b"lo\r\n");
//! match decoder.decode(&mut buf) {
//!     DecodeResult::Complete(value) => assert_eq!(value, RespValue::bulk_string("hello")),
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

mod buffer;
mod encode;
mod error;
mod parser;
mod types;
mod utils;

pub use buffer::ReadBuffer;
pub use encode::RespEncoder;
pub use encode::encode_command;
pub use encode::encode_inline;
pub use error::ParseError;
pub use error::ServerError;
pub use parser::DEFAULT_MAX_BULK_LEN;
pub use parser::DEFAULT_MAX_DEPTH;
pub use parser::DEFAULT_MAX_LINE_LEN;
pub use parser::DecodeLimits;
pub use parser::DecodeResult;
pub use parser::RespDecoder;
pub use parser::parse;
pub use types::CommandArg;
pub use types::GENERIC_ERROR_KIND;
pub use types::RespValue;
