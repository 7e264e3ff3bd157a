//! Minimal JSON-over-UDS transport for the router
//!
//! Each line a client writes is a [`RequestFrame`]; each line written back is
//! the matching [`ReplyFrame`]. Requests on one connection are answered in
//! order, connections are served concurrently. A line longer than the frame
//! limit is answered with a `JSON` error and the connection is closed.

use super::{ReplyFrame, RequestFrame, Router};
use crate::gateway::ErrorDescriptor;
use std::{
	io,
	path::PathBuf,
	sync::{
		atomic::{AtomicUsize, Ordering},
		Arc,
	},
};
use tokio::{
	io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader},
	net::UnixListener,
	sync::mpsc,
};
use tracing::{debug, error, info, warn};

/// Default upper bound on a single request line, in bytes
pub const DEFAULT_MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Stops a running [`RpcServer`]
#[derive(Debug, Clone)]
pub struct ShutdownHandle(mpsc::Sender<()>);

impl ShutdownHandle {
	pub async fn shutdown(&self) {
		// Already stopped when the receiver is gone
		let _ = self.0.send(()).await;
	}
}

pub struct RpcServer {
	socket_path: PathBuf,
	router: Arc<Router>,
	shutdown_tx: mpsc::Sender<()>,
	shutdown_rx: mpsc::Receiver<()>,
	/// Connection counter for the connection limit
	connection_count: Arc<AtomicUsize>,
	/// Maximum number of concurrent connections
	max_connections: usize,
	max_frame_bytes: usize,
}

impl RpcServer {
	pub fn new(socket_path: PathBuf, router: Arc<Router>, max_connections: usize) -> Self {
		let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
		Self {
			socket_path,
			router,
			shutdown_tx,
			shutdown_rx,
			connection_count: Arc::new(AtomicUsize::new(0)),
			max_connections,
			max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
		}
	}

	/// Limit the size of one request line
	pub fn with_max_frame_bytes(mut self, max_frame_bytes: usize) -> Self {
		self.max_frame_bytes = max_frame_bytes;
		self
	}

	pub fn shutdown_handle(&self) -> ShutdownHandle {
		ShutdownHandle(self.shutdown_tx.clone())
	}

	/// Accept connections until a shutdown is requested
	pub async fn start(&mut self) -> io::Result<()> {
		if self.socket_path.exists() {
			std::fs::remove_file(&self.socket_path)?;
		}
		if let Some(parent) = self.socket_path.parent() {
			std::fs::create_dir_all(parent)?;
		}

		let listener = UnixListener::bind(&self.socket_path)?;
		info!("RPC server bound to socket: {:?}", self.socket_path);

		loop {
			tokio::select! {
				result = listener.accept() => {
					let mut stream = match result {
						Ok((stream, _addr)) => stream,
						Err(e) => {
							error!(error = %e, "Accepting connection failed");
							continue;
						}
					};

					let current = self.connection_count.load(Ordering::Relaxed);
					if current >= self.max_connections {
						warn!(
							"Connection limit reached ({}), rejecting new connection",
							self.max_connections
						);
						let _ = stream.shutdown().await;
						continue;
					}

					let router = Arc::clone(&self.router);
					let max_frame_bytes = self.max_frame_bytes;
					let connection_count = Arc::clone(&self.connection_count);
					connection_count.fetch_add(1, Ordering::Relaxed);

					tokio::spawn(async move {
						if let Err(e) = serve_connection(stream, router, max_frame_bytes).await {
							warn!(error = %e, "Connection closed with error");
						}
						connection_count.fetch_sub(1, Ordering::Relaxed);
					});
				}

				_ = self.shutdown_rx.recv() => {
					info!("Shutdown signal received, stopping RPC server");
					break;
				}
			}
		}

		if let Err(e) = std::fs::remove_file(&self.socket_path) {
			debug!(error = %e, "Removing socket file failed");
		}

		Ok(())
	}
}

/// Answer request frames on one stream until the peer closes it
pub async fn serve_connection<T>(
	stream: T,
	router: Arc<Router>,
	max_frame_bytes: usize,
) -> io::Result<()>
where
	T: AsyncRead + AsyncWrite + Unpin,
{
	let (reader, mut writer) = tokio::io::split(stream);
	let mut reader = BufReader::new(reader);
	let limit = u64::try_from(max_frame_bytes).unwrap_or(u64::MAX).saturating_add(1);

	loop {
		let mut line = Vec::new();
		let read = (&mut reader).take(limit).read_until(b'\n', &mut line).await?;
		if read == 0 {
			break;
		}

		let terminated = line.last() == Some(&b'\n');
		if !terminated && line.len() > max_frame_bytes {
			warn!(limit = max_frame_bytes, "Request frame too large, closing connection");
			let reply = ReplyFrame {
				subject: String::new(),
				reply: ErrorDescriptor::json(format!(
					"request frame exceeds {max_frame_bytes} bytes"
				))
				.to_value(),
			};
			write_frame(&mut writer, &reply).await?;
			break;
		}

		let frame = line.trim_ascii();
		if frame.is_empty() {
			continue;
		}

		let reply = answer(&router, frame).await;
		write_frame(&mut writer, &reply).await?;
	}

	Ok(())
}

async fn write_frame<W>(writer: &mut W, reply: &ReplyFrame) -> io::Result<()>
where
	W: AsyncWrite + Unpin,
{
	let mut encoded = serde_json::to_vec(reply).map_err(io::Error::other)?;
	encoded.push(b'\n');

	writer.write_all(&encoded).await?;
	writer.flush().await
}

async fn answer(router: &Router, line: &[u8]) -> ReplyFrame {
	let frame = match serde_json::from_slice::<RequestFrame>(line) {
		Ok(frame) => frame,
		Err(e) => {
			warn!(error = %e, "Malformed request frame");
			return ReplyFrame {
				subject: String::new(),
				reply: ErrorDescriptor::from(e).to_value(),
			};
		}
	};

	let reply = match serde_json::to_vec(&frame.payload) {
		Ok(payload) => router.dispatch(&frame.subject, &payload).await,
		Err(e) => Some(ErrorDescriptor::from(e).to_value()),
	};

	ReplyFrame {
		reply: reply.unwrap_or_else(|| {
			warn!(subject = %frame.subject, "No route for subject");
			ErrorDescriptor::generic(format!("no route for subject {}", frame.subject)).to_value()
		}),
		subject: frame.subject,
	}
}
