//! Thin wrappers over `send_command` for the commands the session itself
//! cares about: liveness, auth, database selection, pub/sub and
//! transactions.

use std::time::Duration;

use log::debug;
use log::warn;
use resp::CommandArg;
use resp::RespValue;
use tokio::io::AsyncRead;
use tokio::io::AsyncWrite;

use crate::client::Client;
use crate::error::ClientResult;

const NO_ARGS: &[&str] = &[];

impl<S> Client<S>
where
	S: AsyncRead + AsyncWrite + Unpin + Send,
{
	pub async fn ping(&mut self) -> ClientResult<RespValue> {
		self.send_command("PING", NO_ARGS).await
	}

	pub async fn echo(&mut self, message: impl Into<CommandArg>) -> ClientResult<RespValue> {
		let message: CommandArg = message.into();
		self.send_command("ECHO", &[message]).await
	}

	pub async fn auth(&mut self, password: &str) -> ClientResult<RespValue> {
		self.send_command("AUTH", &[password]).await
	}

	pub async fn select(&mut self, db: i64) -> ClientResult<RespValue> {
		self.send_command("SELECT", &[db]).await
	}

	pub async fn publish(
		&mut self,
		channel: &str,
		message: impl Into<CommandArg>,
	) -> ClientResult<RespValue> {
		self.send_command("PUBLISH", &[CommandArg::from(channel), message.into()])
			.await
	}

	/// Subscribe and return the confirmation for the first channel. Servers
	/// send one confirmation per channel; the rest arrive via
	/// [`Client::read_next`].
	pub async fn subscribe(&mut self, channels: &[&str]) -> ClientResult<RespValue> {
		self.send_command("SUBSCRIBE", channels).await
	}

	pub async fn psubscribe(&mut self, patterns: &[&str]) -> ClientResult<RespValue> {
		self.send_command("PSUBSCRIBE", patterns).await
	}

	/// An empty slice unsubscribes from every channel.
	pub async fn unsubscribe(&mut self, channels: &[&str]) -> ClientResult<RespValue> {
		self.send_command("UNSUBSCRIBE", channels).await
	}

	pub async fn punsubscribe(&mut self, patterns: &[&str]) -> ClientResult<RespValue> {
		self.send_command("PUNSUBSCRIBE", patterns).await
	}

	/// Wait for the next pub/sub delivery.
	pub async fn read_published(&mut self, wait: Duration) -> ClientResult<RespValue> {
		self.read_next_timeout(wait).await
	}

	pub async fn multi(&mut self) -> ClientResult<RespValue> {
		self.send_command("MULTI", NO_ARGS).await
	}

	pub async fn exec(&mut self) -> ClientResult<RespValue> {
		self.send_command("EXEC", NO_ARGS).await
	}

	pub async fn discard(&mut self) -> ClientResult<RespValue> {
		self.send_command("DISCARD", NO_ARGS).await
	}

	pub async fn watch(&mut self, keys: &[&str]) -> ClientResult<RespValue> {
		self.send_command("WATCH", keys).await
	}

	pub async fn unwatch(&mut self) -> ClientResult<RespValue> {
		self.send_command("UNWATCH", NO_ARGS).await
	}

	/// Run `body` between `MULTI` and `EXEC`.
	///
	/// Returns the `EXEC` reply: an array of results, or a null array when a
	/// watched key changed. If `MULTI` itself is refused its error reply is
	/// returned and `body` never runs. If `body` fails, `DISCARD` is sent and
	/// the body's error is returned.
	pub async fn transaction<F>(&mut self, body: F) -> ClientResult<RespValue>
	where
		F: AsyncFnOnce(&mut Self) -> ClientResult<()>,
	{
		let started = self.multi().await?;
		if started.is_error() {
			return Ok(started);
		}

		match body(&mut *self).await {
			Ok(()) => self.exec().await,
			Err(e) => {
				debug!("Transaction body failed, discarding: {}", e);
				if let Err(discard_err) = self.discard().await {
					warn!("DISCARD after failed transaction body also failed: {}", discard_err);
				}
				Err(e)
			}
		}
	}
}
