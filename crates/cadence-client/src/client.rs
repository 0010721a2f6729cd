// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cadence_core::{
	ClientMessage, GenerationId, GenerationSession, GenerationStatus, ServerEvent, SessionRegistry,
	SubscriptionId,
};
use cadence_transport::{ConnectionState, Connector, TransportChannel, TransportConfig};
use tracing::{debug, info, instrument, warn};

use crate::dispatcher::ClientDispatcher;

/// Settings for a [`GenerationClient`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientConfig {
	pub transport: TransportConfig,
}

/// Application-level handle on generation sessions.
///
/// Owns the session registry and the transport channel that feeds it. Build
/// one at the application root with [`GenerationClient::init`] and pass it
/// (or an `Arc` of it) to whatever needs it.
pub struct GenerationClient {
	registry: Arc<SessionRegistry>,
	channel: TransportChannel,
	shut_down: AtomicBool,
}

impl GenerationClient {
	/// Creates the client and starts connecting in the background.
	///
	/// Must be called from within a tokio runtime.
	pub fn init(connector: Arc<dyn Connector>, config: ClientConfig) -> Self {
		let registry = Arc::new(SessionRegistry::new());
		let dispatcher = Arc::new(ClientDispatcher::new(Arc::clone(&registry)));
		let channel = TransportChannel::new(config.transport, connector, dispatcher);
		channel.connect();
		info!("Generation client initialized");

		Self {
			registry,
			channel,
			shut_down: AtomicBool::new(false),
		}
	}

	/// Closes the transport. Session records stay readable.
	pub async fn shutdown(&self) {
		if self.shut_down.swap(true, Ordering::SeqCst) {
			debug!("Generation client already shut down");
			return;
		}
		self.channel.disconnect().await;
		info!("Generation client shut down");
	}

	/// Records a queued session for `prompt` without contacting the server.
	#[instrument(skip(self, prompt))]
	pub fn submit(&self, prompt: impl Into<String>) -> GenerationId {
		self.registry.create(prompt)
	}

	/// Asks the server to start generating `id`. Returns `false` if `id` is
	/// unknown, no longer queued, or the message could not be sent.
	#[instrument(skip(self, prompt), fields(generation_id = %id))]
	pub fn start_generation(&self, id: &GenerationId, prompt: impl Into<String>) -> bool {
		match self.registry.get(id).map(|session| session.status) {
			Some(GenerationStatus::Queued) => {}
			Some(status) => {
				warn!(%status, "Refusing to start a generation that is not queued");
				return false;
			}
			None => {
				warn!("Refusing to start an unknown generation");
				return false;
			}
		}
		self.channel.send(&ClientMessage::start(id.clone(), prompt))
	}

	/// Submits `prompt` and starts it.
	pub fn generate(&self, prompt: impl Into<String>) -> GenerationId {
		let prompt = prompt.into();
		let id = self.submit(prompt.clone());
		if !self.start_generation(&id, prompt) {
			warn!(generation_id = %id, "Generation queued but not sent");
		}
		id
	}

	/// Fails the session locally and tells the server to stop.
	///
	/// Returns `false` when the session is unknown or already terminal, in
	/// which case nothing is sent.
	#[instrument(skip(self), fields(generation_id = %id))]
	pub fn cancel_generation(&self, id: &GenerationId) -> bool {
		if !self.registry.cancel(id) {
			debug!("Nothing to cancel");
			return false;
		}
		if !self.channel.send(&ClientMessage::cancel(id.clone())) {
			debug!("Cancel recorded locally only");
		}
		true
	}

	/// Every session in submission order.
	pub fn sessions(&self) -> Vec<GenerationSession> {
		self.registry.list()
	}

	pub fn session(&self, id: &GenerationId) -> Option<GenerationSession> {
		self.registry.get(id)
	}

	pub fn current_generation(&self) -> Option<GenerationId> {
		self.registry.current_generation()
	}

	pub fn remove(&self, id: &GenerationId) -> Option<GenerationSession> {
		self.registry.remove(id)
	}

	pub fn clear(&self) {
		self.registry.clear();
	}

	pub fn is_connected(&self) -> bool {
		self.channel.is_connected()
	}

	pub fn connection_state(&self) -> ConnectionState {
		self.channel.state()
	}

	pub fn reconnect_attempts(&self) -> u32 {
		self.channel.reconnect_attempts()
	}

	/// True once the transport stopped retrying. `Disconnected` alone also
	/// covers the wait between reconnect attempts.
	pub fn is_exhausted(&self) -> bool {
		self.channel.is_exhausted()
	}

	/// Registers `observer` for every event the client accepts, including
	/// connection events.
	pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
	where
		F: Fn(&ServerEvent) + Send + Sync + 'static,
	{
		self.registry.subscribe(observer)
	}

	pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
		self.registry.unsubscribe(id)
	}
}
