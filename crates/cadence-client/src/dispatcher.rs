// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use cadence_core::{ApplyOutcome, ServerEvent, SessionRegistry};
use cadence_transport::{TransportError, TransportHandler};
use tracing::{debug, error, info, warn};

/// Routes transport notifications into the session registry.
pub(crate) struct ClientDispatcher {
	registry: Arc<SessionRegistry>,
}

impl ClientDispatcher {
	pub fn new(registry: Arc<SessionRegistry>) -> Self {
		Self { registry }
	}
}

impl TransportHandler for ClientDispatcher {
	fn on_connect(&self) {
		debug!("Link open, awaiting server greeting");
	}

	/// Observers learn about closures through a synthesized `disconnect`
	/// event. Sessions keep their last known state.
	fn on_disconnect(&self, reason: Option<&str>) {
		info!(reason = reason.unwrap_or("unknown"), "Disconnected from server");
		self.registry
			.apply_event(&ServerEvent::disconnect(reason.map(str::to_string)));
	}

	/// Giving up is published as a final `disconnect` carrying the reason.
	fn on_error(&self, error: &TransportError) {
		match error {
			TransportError::RetriesExhausted { attempts } => {
				error!(attempts, "Giving up on the server");
				self.registry
					.apply_event(&ServerEvent::disconnect(Some(error.to_string())));
			}
			other => warn!(error = %other, "Transport error"),
		}
	}

	fn on_event(&self, event: ServerEvent) {
		match &event {
			ServerEvent::Connect(data) => {
				info!(client_id = %data.client_id, "Connected to server");
			}
			ServerEvent::Disconnect(data) => {
				info!(reason = ?data.reason, "Server announced disconnect");
			}
			ServerEvent::Error(data) => {
				warn!(code = %data.error, message = %data.message, "Server reported an error");
			}
			ServerEvent::GenerationStart(data) => {
				debug!(generation_id = %data.generation_id, "Generation started");
			}
			ServerEvent::GenerationProgress(data) => {
				debug!(
					generation_id = %data.generation_id,
					progress = data.progress,
					stage = %data.stage,
					"Generation progress"
				);
			}
			ServerEvent::GenerationComplete(data) => {
				info!(
					generation_id = %data.generation_id,
					duration = data.duration,
					"Generation completed"
				);
			}
			ServerEvent::GenerationFailed(data) => {
				info!(
					generation_id = %data.generation_id,
					message = %data.message,
					"Generation failed"
				);
			}
		}

		if self.registry.apply_event(&event) == ApplyOutcome::Ignored {
			debug!(event_type = event.event_type(), "Event not applied");
		}
	}
}
