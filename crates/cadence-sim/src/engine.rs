// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Scripted generation engine.
//!
//! Each started generation gets one driver task that sleeps until fixed
//! deadlines measured from the start: stage `i` fires at
//! `step_interval * (i + 1)` and the outcome at `step_interval * (N + 1)`.
//! Emission and cancellation both happen under the timer table lock, so a
//! cancelled generation never emits again.

use std::sync::Arc;

use cadence_core::{
	decode_client_frame, ClientMessage, GenerationId, ServerEvent, CANCELLED_MESSAGE,
	GENERATION_ACTIVE, SERVER_ERROR,
};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::SimulationConfig;
use crate::error::SimulationError;
use crate::outcome::Outcome;
use crate::timers::TimerTable;

pub const INVALID_MESSAGE: &str = "Invalid message format";

struct Shared {
	config: SimulationConfig,
	sink: mpsc::UnboundedSender<ServerEvent>,
	timers: Mutex<TimerTable>,
	rng: Mutex<StdRng>,
}

impl Shared {
	fn emit(&self, event: ServerEvent) {
		let event_type = event.event_type();
		if self.sink.send(event).is_err() {
			debug!(event_type, "Event sink closed, dropping event");
		}
	}

	/// Emits `event` only while `token` is live.
	fn emit_if_live(&self, token: &CancellationToken, event: ServerEvent) -> bool {
		let _timers = self.timers.lock();
		if token.is_cancelled() {
			return false;
		}
		self.emit(event);
		true
	}

	/// Emits the terminal event and retires the generation.
	fn finish(&self, id: &GenerationId, token: &CancellationToken, event: ServerEvent) -> bool {
		let mut timers = self.timers.lock();
		if token.is_cancelled() {
			return false;
		}
		timers.release(id);
		self.emit(event);
		true
	}
}

/// Runs simulated generations and reports them as [`ServerEvent`]s on a sink.
pub struct SimulationEngine {
	shared: Arc<Shared>,
}

impl SimulationEngine {
	pub fn new(
		config: SimulationConfig,
		sink: mpsc::UnboundedSender<ServerEvent>,
	) -> Result<Self, SimulationError> {
		config.validate()?;
		let rng = match config.seed {
			Some(seed) => StdRng::seed_from_u64(seed),
			None => StdRng::from_entropy(),
		};
		Ok(Self {
			shared: Arc::new(Shared {
				config,
				sink,
				timers: Mutex::new(TimerTable::default()),
				rng: Mutex::new(rng),
			}),
		})
	}

	pub fn config(&self) -> &SimulationConfig {
		&self.shared.config
	}

	/// Handles one raw client frame. Undecodable frames are answered with a
	/// `SERVER_ERROR` error event.
	pub fn handle_frame(&self, frame: &str) {
		match decode_client_frame(frame) {
			Ok(message) => self.handle_message(message),
			Err(e) => {
				warn!(error = %e, "Rejecting malformed client frame");
				self.shared
					.emit(ServerEvent::error(SERVER_ERROR, INVALID_MESSAGE));
			}
		}
	}

	pub fn handle_message(&self, message: ClientMessage) {
		debug!(
			message_type = message.message_type(),
			generation_id = %message.generation_id(),
			"Received client message"
		);
		match message {
			ClientMessage::StartGeneration(start) => {
				self.start(start.id, start.prompt);
			}
			ClientMessage::CancelGeneration(cancel) => {
				self.cancel(&cancel.id);
			}
		}
	}

	/// Starts simulating `id`. Returns `false` if `id` is already running, in
	/// which case a `GENERATION_ACTIVE` error event is emitted instead.
	///
	/// Must be called from within a tokio runtime.
	#[instrument(skip(self, prompt), fields(generation_id = %id))]
	pub fn start(&self, id: GenerationId, prompt: String) -> bool {
		let mut timers = self.shared.timers.lock();
		if timers.contains(&id) {
			warn!("Generation already active");
			self.shared.emit(ServerEvent::error(
				GENERATION_ACTIVE,
				format!("Generation {id} is already in progress"),
			));
			return false;
		}

		info!(stages = self.shared.config.stages.len(), "Starting generation");
		self.shared
			.emit(ServerEvent::generation_start(id.clone(), prompt));

		let token = CancellationToken::new();
		let handle = tokio::spawn(drive(
			Arc::clone(&self.shared),
			id.clone(),
			token.clone(),
			Instant::now(),
		));
		timers.insert(id, token, handle);
		true
	}

	/// Cancels `id` and emits its cancellation failure. Unknown or finished
	/// ids are ignored and return `false`.
	#[instrument(skip(self), fields(generation_id = %id))]
	pub fn cancel(&self, id: &GenerationId) -> bool {
		let mut timers = self.shared.timers.lock();
		if !timers.cancel(id) {
			debug!("Cancel for inactive generation ignored");
			return false;
		}
		info!("Generation cancelled");
		self.shared
			.emit(ServerEvent::generation_failed(id.clone(), CANCELLED_MESSAGE));
		true
	}

	/// Stops every running generation without emitting anything. Returns how
	/// many were stopped.
	pub fn cancel_all(&self) -> usize {
		let cancelled = self.shared.timers.lock().cancel_all();
		if !cancelled.is_empty() {
			info!(count = cancelled.len(), "Cancelled all active generations");
		}
		cancelled.len()
	}

	pub fn active_generations(&self) -> Vec<GenerationId> {
		self.shared.timers.lock().ids()
	}

	pub fn active_count(&self) -> usize {
		self.shared.timers.lock().len()
	}

	pub fn is_active(&self, id: &GenerationId) -> bool {
		self.shared.timers.lock().contains(id)
	}
}

impl Drop for SimulationEngine {
	fn drop(&mut self) {
		self.shared.timers.lock().abort_all();
	}
}

#[instrument(skip(shared, token, started), fields(generation_id = %id))]
async fn drive(
	shared: Arc<Shared>,
	id: GenerationId,
	token: CancellationToken,
	started: Instant,
) {
	let interval = shared.config.step_interval;
	let total = shared.config.stages.len();

	for (index, stage) in shared.config.stages.iter().enumerate() {
		let step = index as u32 + 1;
		tokio::select! {
			_ = tokio::time::sleep_until(started + interval.saturating_mul(step)) => {}
			_ = token.cancelled() => return,
		}

		let progress = (step as usize * 100) as f64 / total as f64;
		debug!(progress, stage = %stage, "Stage reached");
		let event = ServerEvent::generation_progress(id.clone(), progress, stage.clone());
		if !shared.emit_if_live(&token, event) {
			return;
		}
	}

	tokio::select! {
		_ = tokio::time::sleep_until(started + interval.saturating_mul(total as u32 + 1)) => {}
		_ = token.cancelled() => return,
	}

	let outcome = {
		let mut rng = shared.rng.lock();
		Outcome::roll(&shared.config, &mut *rng, &id)
	};
	let succeeded = matches!(outcome, Outcome::Completed { .. });
	if shared.finish(&id, &token, outcome.into_event(id.clone())) {
		info!(succeeded, "Generation finished");
	}
}
