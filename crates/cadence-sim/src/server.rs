// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process server reachable through [`LocalConnector`].

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use cadence_core::{encode_server_frame, ClientId, ServerEvent};
use cadence_transport::{Connector, Link, Result, TransportError};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::config::SimulationConfig;
use crate::engine::SimulationEngine;
use crate::error::SimulationError;

/// Opens links to a simulated server running on the current runtime.
///
/// Every accepted link gets its own [`SimulationEngine`]; closing the link
/// from either side stops that engine's pending generations.
pub struct LocalConnector {
	config: SimulationConfig,
	pending_failures: AtomicU32,
	accepted: AtomicU32,
	severed: Mutex<CancellationToken>,
}

impl LocalConnector {
	pub fn new(config: SimulationConfig) -> std::result::Result<Self, SimulationError> {
		config.validate()?;
		Ok(Self {
			config,
			pending_failures: AtomicU32::new(0),
			accepted: AtomicU32::new(0),
			severed: Mutex::new(CancellationToken::new()),
		})
	}

	/// Makes the next `count` connects fail.
	pub fn fail_next(&self, count: u32) {
		self.pending_failures.store(count, Ordering::SeqCst);
	}

	/// Closes every live link from the server side.
	pub fn sever(&self) {
		let previous = std::mem::replace(&mut *self.severed.lock(), CancellationToken::new());
		previous.cancel();
		info!("Severed all local links");
	}

	/// Links opened so far.
	pub fn connections_accepted(&self) -> u32 {
		self.accepted.load(Ordering::SeqCst)
	}

	fn take_failure(&self) -> bool {
		self.pending_failures
			.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
			.is_ok()
	}
}

#[async_trait]
impl Connector for LocalConnector {
	async fn connect(&self) -> Result<Link> {
		tokio::time::sleep(self.config.connect_latency).await;

		if self.take_failure() {
			warn!("Injected connect failure");
			return Err(TransportError::ConnectFailed(
				"simulated connection failure".to_string(),
			));
		}

		let (tx, events) = mpsc::unbounded_channel();
		let engine = SimulationEngine::new(self.config.clone(), tx)
			.map_err(|e| TransportError::ConnectFailed(e.to_string()))?;

		let (client, server) = Link::pair();
		let severed = self.severed.lock().clone();
		let client_id = ClientId::generate();
		self.accepted.fetch_add(1, Ordering::SeqCst);
		info!(client_id = %client_id, "Accepted local connection");

		tokio::spawn(serve(engine, events, server, severed, client_id));
		Ok(client)
	}
}

#[instrument(skip_all, fields(client_id = %client_id))]
async fn serve(
	engine: SimulationEngine,
	mut events: mpsc::UnboundedReceiver<ServerEvent>,
	link: Link,
	severed: CancellationToken,
	client_id: ClientId,
) {
	let Link {
		outbound,
		mut inbound,
	} = link;

	if !forward(&outbound, &ServerEvent::connect(client_id)) {
		return;
	}

	loop {
		tokio::select! {
			frame = inbound.recv() => match frame {
				Some(frame) => engine.handle_frame(&frame),
				None => {
					debug!("Client closed link");
					break;
				}
			},
			Some(event) = events.recv() => {
				if !forward(&outbound, &event) {
					break;
				}
			}
			_ = severed.cancelled() => {
				debug!("Link severed");
				break;
			}
		}
	}

	let stopped = engine.cancel_all();
	info!(stopped, "Local connection closed");
}

fn forward(outbound: &mpsc::UnboundedSender<String>, event: &ServerEvent) -> bool {
	let frame = match encode_server_frame(event) {
		Ok(frame) => frame,
		Err(e) => {
			error!(error = %e, "Failed to encode server event");
			return true;
		}
	};
	outbound.send(frame).is_ok()
}
