// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Reconnecting event channel.
//!
//! A [`TransportChannel`] keeps one logical connection to an event source
//! open through a [`Connector`]. Inbound frames are decoded into
//! [`ServerEvent`]s and handed to a single [`TransportHandler`]. When the link
//! drops without [`TransportChannel::disconnect`] being called, the channel
//! reconnects with linear backoff until the attempt budget runs out.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use cadence_core::{decode_server_frame, encode_client_frame, ClientMessage, ServerEvent};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::TransportConfig;
use crate::error::TransportError;
use crate::link::{Connector, Link};

const CLIENT_DISCONNECT_REASON: &str = "Client disconnected";
const PEER_CLOSED_REASON: &str = "Connection closed";

/// Connection state of a [`TransportChannel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
	Disconnected,
	Connecting,
	Connected,
}

impl std::fmt::Display for ConnectionState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ConnectionState::Disconnected => write!(f, "disconnected"),
			ConnectionState::Connecting => write!(f, "connecting"),
			ConnectionState::Connected => write!(f, "connected"),
		}
	}
}

/// Receives everything the channel observes.
pub trait TransportHandler: Send + Sync {
	fn on_connect(&self) {}

	fn on_disconnect(&self, _reason: Option<&str>) {}

	fn on_error(&self, _error: &TransportError) {}

	fn on_event(&self, event: ServerEvent);
}

struct Supervisor {
	shutdown: CancellationToken,
	handle: JoinHandle<()>,
}

struct Inner {
	config: TransportConfig,
	connector: Arc<dyn Connector>,
	handler: Arc<dyn TransportHandler>,
	state: Mutex<ConnectionState>,
	reconnect_attempts: AtomicU32,
	exhausted: AtomicBool,
	outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
}

impl Inner {
	fn set_state(&self, state: ConnectionState) {
		*self.state.lock() = state;
	}

	fn dispatch(&self, frame: &str) {
		match decode_server_frame(frame) {
			Ok(event) => {
				debug!(event_type = event.event_type(), "Inbound event");
				self.handler.on_event(event);
			}
			Err(e) => {
				warn!(error = %e, "Dropping malformed frame");
				self.handler.on_error(&TransportError::from(e));
			}
		}
	}
}

enum Closed {
	ByPeer,
	Intentionally,
}

/// Client end of the event transport.
pub struct TransportChannel {
	inner: Arc<Inner>,
	supervisor: Mutex<Option<Supervisor>>,
}

impl TransportChannel {
	pub fn new(
		config: TransportConfig,
		connector: Arc<dyn Connector>,
		handler: Arc<dyn TransportHandler>,
	) -> Self {
		Self {
			inner: Arc::new(Inner {
				config,
				connector,
				handler,
				state: Mutex::new(ConnectionState::Disconnected),
				reconnect_attempts: AtomicU32::new(0),
				exhausted: AtomicBool::new(false),
				outbound: Mutex::new(None),
			}),
			supervisor: Mutex::new(None),
		}
	}

	/// Starts connecting in the background.
	///
	/// No-op while connected or while a connect/reconnect cycle is running.
	/// Must be called from within a tokio runtime.
	pub fn connect(&self) {
		let mut supervisor = self.supervisor.lock();
		if let Some(running) = supervisor.as_ref() {
			if !running.handle.is_finished() {
				debug!(state = %self.state(), "Transport already active");
				return;
			}
		}

		self.inner.exhausted.store(false, Ordering::SeqCst);
		self.inner.reconnect_attempts.store(0, Ordering::SeqCst);
		self.inner.set_state(ConnectionState::Connecting);

		let shutdown = CancellationToken::new();
		let handle = tokio::spawn(run_supervisor(Arc::clone(&self.inner), shutdown.clone()));
		*supervisor = Some(Supervisor { shutdown, handle });
	}

	/// Sends a client message. Returns `false` (and logs) when not connected.
	///
	/// Encoding failures and a link that closed underneath the send are also
	/// reported to the handler.
	pub fn send(&self, message: &ClientMessage) -> bool {
		match self.try_send(message) {
			Ok(()) => true,
			Err(None) => false,
			Err(Some(e)) => {
				self.inner.handler.on_error(&e);
				false
			}
		}
	}

	fn try_send(&self, message: &ClientMessage) -> Result<(), Option<TransportError>> {
		let Some(tx) = self.inner.outbound.lock().clone() else {
			warn!(
				message_type = message.message_type(),
				generation_id = %message.generation_id(),
				"Transport not connected, message dropped"
			);
			return Err(None);
		};

		let frame = encode_client_frame(message).map_err(|e| {
			error!(error = %e, "Failed to encode client message");
			Some(TransportError::from(e))
		})?;

		tx.send(frame).map_err(|_| {
			warn!(
				message_type = message.message_type(),
				"Link closed while sending"
			);
			Some(TransportError::Closed)
		})
	}

	/// Closes the channel on purpose. Pending reconnects are cancelled and no
	/// new attempts are made until [`connect`](Self::connect) is called again.
	pub async fn disconnect(&self) {
		let supervisor = self.supervisor.lock().take();
		let Some(supervisor) = supervisor else {
			debug!("Transport already disconnected");
			return;
		};

		supervisor.shutdown.cancel();
		let _ = supervisor.handle.await;

		*self.inner.outbound.lock() = None;
		self.inner.set_state(ConnectionState::Disconnected);
		self.inner.reconnect_attempts.store(0, Ordering::SeqCst);
		info!("Transport disconnected");
		self.inner.handler.on_disconnect(Some(CLIENT_DISCONNECT_REASON));
	}

	pub fn state(&self) -> ConnectionState {
		*self.inner.state.lock()
	}

	pub fn is_connected(&self) -> bool {
		self.state() == ConnectionState::Connected
	}

	/// Reconnect attempts since the last successful connect.
	pub fn reconnect_attempts(&self) -> u32 {
		self.inner.reconnect_attempts.load(Ordering::SeqCst)
	}

	/// True once reconnection gave up. Cleared by the next `connect()`.
	pub fn is_exhausted(&self) -> bool {
		self.inner.exhausted.load(Ordering::SeqCst)
	}
}

impl Drop for TransportChannel {
	fn drop(&mut self) {
		if let Some(supervisor) = self.supervisor.get_mut().take() {
			supervisor.shutdown.cancel();
			supervisor.handle.abort();
		}
	}
}

/// Connect, pump frames, and reconnect until shut down or out of attempts.
async fn run_supervisor(inner: Arc<Inner>, shutdown: CancellationToken) {
	loop {
		inner.set_state(ConnectionState::Connecting);

		let attempt = tokio::select! {
			result = inner.connector.connect() => result,
			_ = shutdown.cancelled() => break,
		};

		match attempt {
			Ok(link) => {
				inner.reconnect_attempts.store(0, Ordering::SeqCst);
				let Link {
					outbound,
					mut inbound,
				} = link;
				*inner.outbound.lock() = Some(outbound);
				inner.set_state(ConnectionState::Connected);
				info!("Transport connected");
				inner.handler.on_connect();

				let closed = pump(&inner, &mut inbound, &shutdown).await;

				*inner.outbound.lock() = None;
				inner.set_state(ConnectionState::Disconnected);
				match closed {
					Closed::Intentionally => break,
					Closed::ByPeer => {
						warn!("Transport closed by peer");
						inner.handler.on_disconnect(Some(PEER_CLOSED_REASON));
					}
				}
			}
			Err(e) => {
				inner.set_state(ConnectionState::Disconnected);
				error!(error = %e, "Transport connection error");
				inner.handler.on_error(&e);
			}
		}

		let attempts_so_far = inner.reconnect_attempts.load(Ordering::SeqCst);
		if attempts_so_far >= inner.config.max_reconnect_attempts {
			inner.exhausted.store(true, Ordering::SeqCst);
			inner.set_state(ConnectionState::Disconnected);
			error!(
				attempts = attempts_so_far,
				"Max reconnection attempts reached, giving up"
			);
			inner.handler.on_error(&TransportError::RetriesExhausted {
				attempts: attempts_so_far,
			});
			break;
		}

		let attempt = inner.reconnect_attempts.fetch_add(1, Ordering::SeqCst) + 1;
		let delay = inner.config.backoff_delay(attempt);
		warn!(
			attempt,
			max_attempts = inner.config.max_reconnect_attempts,
			delay_ms = delay.as_millis() as u64,
			"Reconnecting"
		);

		tokio::select! {
			_ = tokio::time::sleep(delay) => {}
			_ = shutdown.cancelled() => {
				debug!("Shutdown during reconnect wait");
				break;
			}
		}
	}
}

async fn pump(
	inner: &Inner,
	inbound: &mut mpsc::UnboundedReceiver<String>,
	shutdown: &CancellationToken,
) -> Closed {
	loop {
		tokio::select! {
			frame = inbound.recv() => match frame {
				Some(frame) => inner.dispatch(&frame),
				None => return Closed::ByPeer,
			},
			_ = shutdown.cancelled() => return Closed::Intentionally,
		}
	}
}
