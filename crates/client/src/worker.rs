//! A synchronous facade over [`Client`].
//!
//! The session lives on a dedicated thread running a current-thread runtime.
//! Callers hand it requests over a channel; each request carries a completion
//! callback that the worker invokes with the outcome. The blocking methods are
//! adapters that park the caller on a oneshot until that callback fires.

use std::thread;
use std::time::Duration;

use bytes::Bytes;
use log::debug;
use log::error;
use resp::CommandArg;
use resp::RespValue;
use resp::encode_command;
use resp::encode_inline;
use tokio::sync::mpsc;
use tokio::sync::oneshot;

use crate::client::Client;
use crate::client::ClientOptions;
use crate::connector::ConnectionIdentifier;
use crate::error::ClientError;
use crate::error::ClientResult;

type ReplyCallback = Box<dyn FnOnce(ClientResult<RespValue>) + Send + 'static>;
type CloseCallback = Box<dyn FnOnce(ClientResult<()>) + Send + 'static>;

enum WorkerRequest {
	Send {
		bytes: Bytes,
		callback: ReplyCallback,
	},
	ReadNext {
		read_timeout: Option<Duration>,
		callback: ReplyCallback,
	},
	SetReadTimeout(Duration),
	Close(CloseCallback),
}

impl WorkerRequest {
	/// Complete the request without a worker to run it.
	fn abandon(self) {
		match self {
			WorkerRequest::Send { callback, .. } | WorkerRequest::ReadNext { callback, .. } => {
				callback(Err(ClientError::WorkerGone))
			}
			WorkerRequest::Close(callback) => callback(Err(ClientError::WorkerGone)),
			WorkerRequest::SetReadTimeout(_) => {}
		}
	}
}

/// A client usable from synchronous code.
///
/// Requests are executed strictly in submission order. Callbacks run on the
/// worker thread, so they must not call the blocking methods of the same
/// client. Dropping the handle stops the worker once queued requests finish.
pub struct BlockingClient {
	tx: mpsc::UnboundedSender<WorkerRequest>,
	thread_handle: Option<thread::JoinHandle<()>>,
}

impl BlockingClient {
	/// Connect on a fresh worker thread and wait for the handshake to finish.
	pub fn connect(id: &ConnectionIdentifier, options: ClientOptions) -> ClientResult<Self> {
		let (tx, rx) = mpsc::unbounded_channel();
		let (ready_tx, ready_rx) = oneshot::channel();
		let id = id.clone();

		let thread_handle = thread::Builder::new()
			.name(format!("redwire-{}", id))
			.spawn(move || {
				let rt = match tokio::runtime::Builder::new_current_thread()
					.enable_all()
					.build()
				{
					Ok(rt) => rt,
					Err(e) => {
						let _ = ready_tx.send(Err(ClientError::Io(e)));
						return;
					}
				};

				let id_ref = &id;
				rt.block_on(async move {
					match Client::connect(id_ref, options).await {
						Ok(client) => {
							if ready_tx.send(Ok(())).is_ok() {
								serve(client, rx).await;
							}
						}
						Err(e) => {
							let _ = ready_tx.send(Err(e));
						}
					}
				});
				debug!("Worker for {} stopped", id);
			})?;

		match ready_rx.blocking_recv() {
			Ok(Ok(())) => Ok(Self {
				tx,
				thread_handle: Some(thread_handle),
			}),
			Ok(Err(e)) => {
				let _ = thread_handle.join();
				Err(e)
			}
			Err(_) => {
				let _ = thread_handle.join();
				Err(ClientError::WorkerGone)
			}
		}
	}

	/// Queue a multi-bulk command; `callback` receives its reply.
	pub fn send_command_with<A, F>(&self, name: &str, args: &[A], callback: F)
	where
		A: Into<CommandArg> + Clone,
		F: FnOnce(ClientResult<RespValue>) + Send + 'static,
	{
		self.send_raw_with(encode_command(name, args), callback);
	}

	pub fn send_inline_with<A, F>(&self, name: &str, args: &[A], callback: F)
	where
		A: Into<CommandArg> + Clone,
		F: FnOnce(ClientResult<RespValue>) + Send + 'static,
	{
		self.send_raw_with(encode_inline(name, args), callback);
	}

	pub fn send_raw_with<F>(&self, bytes: Bytes, callback: F)
	where
		F: FnOnce(ClientResult<RespValue>) + Send + 'static,
	{
		self.submit(WorkerRequest::Send {
			bytes,
			callback: Box::new(callback),
		});
	}

	/// Queue a read of the next unsolicited value. `None` uses the session's
	/// read timeout.
	pub fn read_next_with<F>(&self, read_timeout: Option<Duration>, callback: F)
	where
		F: FnOnce(ClientResult<RespValue>) + Send + 'static,
	{
		self.submit(WorkerRequest::ReadNext {
			read_timeout,
			callback: Box::new(callback),
		});
	}

	/// Must not be called from inside an async runtime.
	pub fn send_command<A>(&self, name: &str, args: &[A]) -> ClientResult<RespValue>
	where
		A: Into<CommandArg> + Clone,
	{
		let bytes = encode_command(name, args);
		self.wait(|callback| self.send_raw_with(bytes, callback))
	}

	pub fn send_inline<A>(&self, name: &str, args: &[A]) -> ClientResult<RespValue>
	where
		A: Into<CommandArg> + Clone,
	{
		let bytes = encode_inline(name, args);
		self.wait(|callback| self.send_raw_with(bytes, callback))
	}

	pub fn read_next(&self, read_timeout: Option<Duration>) -> ClientResult<RespValue> {
		self.wait(|callback| self.read_next_with(read_timeout, callback))
	}

	/// Applies to requests queued after this call.
	pub fn set_read_timeout(&self, read_timeout: Duration) {
		self.submit(WorkerRequest::SetReadTimeout(read_timeout));
	}

	/// Shut down the connection and join the worker.
	pub fn close(mut self) -> ClientResult<()> {
		let (done_tx, done_rx) = oneshot::channel();
		self.submit(WorkerRequest::Close(Box::new(move |result| {
			let _ = done_tx.send(result);
		})));
		let result = done_rx.blocking_recv().unwrap_or(Err(ClientError::WorkerGone));

		if let Some(handle) = self.thread_handle.take() {
			if handle.join().is_err() {
				error!("Client worker thread panicked");
			}
		}
		result
	}

	fn submit(&self, request: WorkerRequest) {
		if let Err(mpsc::error::SendError(request)) = self.tx.send(request) {
			request.abandon();
		}
	}

	fn wait<F>(&self, enqueue: F) -> ClientResult<RespValue>
	where
		F: FnOnce(ReplyCallback),
	{
		let (reply_tx, reply_rx) = oneshot::channel();
		enqueue(Box::new(move |result| {
			let _ = reply_tx.send(result);
		}));
		// A callback dropped without running means the worker died mid-request
		reply_rx.blocking_recv().unwrap_or(Err(ClientError::WorkerGone))
	}
}

async fn serve(mut client: Client, mut rx: mpsc::UnboundedReceiver<WorkerRequest>) {
	while let Some(request) = rx.recv().await {
		match request {
			WorkerRequest::Send { bytes, callback } => callback(client.send_raw(&bytes).await),
			WorkerRequest::ReadNext {
				read_timeout,
				callback,
			} => {
				let result = match read_timeout {
					Some(t) => client.read_next_timeout(t).await,
					None => client.read_next().await,
				};
				callback(result);
			}
			WorkerRequest::SetReadTimeout(t) => client.set_read_timeout(t),
			WorkerRequest::Close(callback) => {
				callback(client.close().await);
				return;
			}
		}
	}

	if let Err(e) = client.close().await {
		debug!("Closing connection after handle dropped: {}", e);
	}
}
