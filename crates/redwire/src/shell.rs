//! Interactive shell and one-shot command execution.

use std::time::Duration;

use client::Client;
use client::ClientError;
use log::debug;
use resp::CommandArg;
use resp::RespValue;
use thiserror::Error;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncRead;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;

/// How long a subscribed shell waits for a delivery before polling again.
const SUBSCRIBE_POLL: Duration = Duration::from_secs(60);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SplitError {
	#[error("unbalanced quotes in request")]
	UnbalancedQuotes,

	#[error("closing quote must be followed by a space")]
	TrailingAfterQuote,
}

#[derive(Error, Debug)]
pub enum ShellError {
	#[error(transparent)]
	Client(#[from] ClientError),

	#[error("terminal io error: {0}")]
	Terminal(#[from] std::io::Error),

	#[error("no command given")]
	EmptyCommand,
}

/// Split a shell line into words.
///
/// Words are separated by whitespace. Double-quoted words understand the
/// escapes `\n`, `\r`, `\t`, `\"`, `\\` and `\xHH`; single-quoted words are
/// taken literally except for `\'`.
pub fn split_line(line: &str) -> Result<Vec<Vec<u8>>, SplitError> {
	let bytes = line.as_bytes();
	let mut words = Vec::new();
	let mut i = 0;

	loop {
		while i < bytes.len() && bytes[i].is_ascii_whitespace() {
			i += 1;
		}
		if i >= bytes.len() {
			return Ok(words);
		}

		let mut word = Vec::new();
		let mut in_double = false;
		let mut in_single = false;
		loop {
			let Some(&c) = bytes.get(i) else {
				if in_double || in_single {
					return Err(SplitError::UnbalancedQuotes);
				}
				break;
			};

			if in_double {
				match c {
					b'\\' if bytes.get(i + 1) == Some(&b'x') && hex_pair(bytes, i + 2).is_some() => {
						word.extend(hex_pair(bytes, i + 2));
						i += 3;
					}
					b'\\' if i + 1 < bytes.len() => {
						i += 1;
						word.push(match bytes[i] {
							b'n' => b'\n',
							b'r' => b'\r',
							b't' => b'\t',
							b'b' => 0x08,
							b'a' => 0x07,
							other => other,
						});
					}
					b'"' => {
						if bytes.get(i + 1).is_some_and(|b| !b.is_ascii_whitespace()) {
							return Err(SplitError::TrailingAfterQuote);
						}
						i += 1;
						break;
					}
					_ => word.push(c),
				}
			} else if in_single {
				match c {
					b'\\' if bytes.get(i + 1) == Some(&b'\'') => {
						word.push(b'\'');
						i += 1;
					}
					b'\'' => {
						if bytes.get(i + 1).is_some_and(|b| !b.is_ascii_whitespace()) {
							return Err(SplitError::TrailingAfterQuote);
						}
						i += 1;
						break;
					}
					_ => word.push(c),
				}
			} else {
				match c {
					b' ' | b'\n' | b'\r' | b'\t' | 0x0b | 0x0c => break,
					b'"' => in_double = true,
					b'\'' => in_single = true,
					_ => word.push(c),
				}
			}
			i += 1;
		}
		words.push(word);
	}
}

fn hex_pair(bytes: &[u8], at: usize) -> Option<u8> {
	let hi = (*bytes.get(at)? as char).to_digit(16)?;
	let lo = (*bytes.get(at + 1)? as char).to_digit(16)?;
	Some((hi * 16 + lo) as u8)
}

fn to_arg(word: Vec<u8>) -> CommandArg {
	match String::from_utf8(word) {
		Ok(text) => CommandArg::Text(text),
		Err(e) => CommandArg::Binary(e.into_bytes().into()),
	}
}

/// Send one already split command. The first word is the command name.
pub async fn execute<S>(
	client: &mut Client<S>,
	words: Vec<Vec<u8>>,
	inline: bool,
) -> Result<RespValue, ShellError>
where
	S: AsyncRead + AsyncWrite + Unpin + Send,
{
	let mut words = words.into_iter();
	let Some(name) = words.next() else {
		return Err(ShellError::EmptyCommand);
	};
	let name = String::from_utf8_lossy(&name).into_owned();
	let args: Vec<CommandArg> = words.map(to_arg).collect();

	debug!("Sending {} with {} argument(s)", name, args.len());
	let reply = if inline {
		client.send_inline(&name, &args).await?
	} else {
		client.send_command(&name, &args).await?
	};
	Ok(reply)
}

fn is_quit(word: &[u8]) -> bool {
	word.eq_ignore_ascii_case(b"quit") || word.eq_ignore_ascii_case(b"exit")
}

fn enters_subscription(name: &[u8]) -> bool {
	name.eq_ignore_ascii_case(b"subscribe") || name.eq_ignore_ascii_case(b"psubscribe")
}

/// Read commands from `input` until EOF or `quit`, printing each reply.
///
/// After a successful `SUBSCRIBE` or `PSUBSCRIBE` the shell only prints
/// deliveries until the connection ends, as `redis-cli` does.
pub async fn run_repl<S, R, W>(
	client: &mut Client<S>,
	input: R,
	output: &mut W,
	prompt: &str,
	inline: bool,
) -> Result<(), ShellError>
where
	S: AsyncRead + AsyncWrite + Unpin + Send,
	R: AsyncBufRead + Unpin,
	W: AsyncWrite + Unpin,
{
	let mut lines = input.lines();

	loop {
		output.write_all(prompt.as_bytes()).await?;
		output.flush().await?;

		let Some(line) = lines.next_line().await? else {
			break;
		};
		let words = match split_line(&line) {
			Ok(words) if words.is_empty() => continue,
			Ok(words) => words,
			Err(e) => {
				output.write_all(format!("Invalid argument(s): {}\n", e).as_bytes()).await?;
				continue;
			}
		};
		if words.len() == 1 && is_quit(&words[0]) {
			break;
		}

		let subscribing = enters_subscription(&words[0]);
		let reply = execute(client, words, inline).await?;
		output.write_all(format!("{}\n", reply).as_bytes()).await?;

		if subscribing && !reply.is_error() {
			output
				.write_all(b"Reading messages... (press Ctrl-C to quit)\n")
				.await?;
			return follow_subscription(client, output).await;
		}
	}
	Ok(())
}

async fn follow_subscription<S, W>(client: &mut Client<S>, output: &mut W) -> Result<(), ShellError>
where
	S: AsyncRead + AsyncWrite + Unpin + Send,
	W: AsyncWrite + Unpin,
{
	loop {
		match client.read_published(SUBSCRIBE_POLL).await {
			Ok(message) => {
				output.write_all(format!("{}\n", message).as_bytes()).await?;
				output.flush().await?;
			}
			Err(ClientError::ReadTimeout(_)) => continue,
			Err(e) => return Err(e.into()),
		}
	}
}
