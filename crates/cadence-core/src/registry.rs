// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory store of generation sessions.
//!
//! The registry owns every [`GenerationSession`], routes inbound
//! [`ServerEvent`]s to the matching state-machine transition and notifies
//! subscribed observers. It never owns timers: cancelling scheduled work is
//! the server's job, the registry only records the outcome.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::TransitionError;
use crate::id::GenerationId;
use crate::protocol::ServerEvent;
use crate::session::{GenerationResult, GenerationSession, CANCELLED_MESSAGE};

/// Callback invoked for every event the registry accepts.
pub type Observer = Arc<dyn Fn(&ServerEvent) + Send + Sync>;

/// Handle returned by [`SessionRegistry::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// What [`SessionRegistry::apply_event`] did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
	/// A session transition was applied.
	Applied,
	/// Unknown id or a transition the session's status does not allow.
	Ignored,
	/// Connection-level event; no session is affected.
	NotApplicable,
}

#[derive(Default)]
struct RegistryState {
	sessions: HashMap<GenerationId, GenerationSession>,
	/// Creation order
	order: Vec<GenerationId>,
	/// Every id ever issued, including removed ones
	issued: HashSet<GenerationId>,
	/// Most recently started generation that is still running
	current: Option<GenerationId>,
}

/// Keyed record store for generation sessions.
pub struct SessionRegistry {
	state: RwLock<RegistryState>,
	observers: RwLock<Vec<(SubscriptionId, Observer)>>,
	next_subscription: AtomicU64,
}

impl SessionRegistry {
	pub fn new() -> Self {
		Self {
			state: RwLock::new(RegistryState::default()),
			observers: RwLock::new(Vec::new()),
			next_subscription: AtomicU64::new(1),
		}
	}

	/// Inserts a queued session for `prompt` and returns its fresh id.
	pub fn create(&self, prompt: impl Into<String>) -> GenerationId {
		let mut state = self.state.write();
		let id = loop {
			let candidate = GenerationId::generate();
			if state.issued.insert(candidate.clone()) {
				break candidate;
			}
		};
		let session = GenerationSession::new(id.clone(), prompt, Utc::now());
		debug!(generation_id = %id, tags = ?session.tags, "Session created");
		state.sessions.insert(id.clone(), session);
		state.order.push(id.clone());
		id
	}

	/// Applies an inbound event and notifies observers unless it was ignored.
	pub fn apply_event(&self, event: &ServerEvent) -> ApplyOutcome {
		let outcome = {
			let mut state = self.state.write();
			match event {
				ServerEvent::Connect(_) | ServerEvent::Disconnect(_) | ServerEvent::Error(_) => {
					ApplyOutcome::NotApplicable
				}
				ServerEvent::GenerationStart(data) => {
					let id = &data.generation_id;
					let outcome = transition(&mut state, id, event, |s| s.begin());
					if outcome == ApplyOutcome::Applied {
						state.current = Some(id.clone());
					}
					outcome
				}
				ServerEvent::GenerationProgress(data) => {
					transition(&mut state, &data.generation_id, event, |s| {
						s.record_progress(data.progress, data.stage.clone())
					})
				}
				ServerEvent::GenerationComplete(data) => {
					let result = GenerationResult {
						audio_url: data.audio_url.clone(),
						duration: data.duration,
						waveform: data.waveform.clone(),
					};
					transition(&mut state, &data.generation_id, event, |s| {
						s.complete(result, Utc::now())
					})
				}
				ServerEvent::GenerationFailed(data) => {
					transition(&mut state, &data.generation_id, event, |s| {
						s.fail(data.message.clone(), Utc::now())
					})
				}
			}
		};

		if outcome != ApplyOutcome::Ignored {
			self.notify(event);
		}
		outcome
	}

	/// Fails a queued or generating session with the cancellation message.
	///
	/// Returns `false` for unknown or already terminal sessions.
	pub fn cancel(&self, id: &GenerationId) -> bool {
		let event = ServerEvent::generation_failed(id.clone(), CANCELLED_MESSAGE);
		let outcome = {
			let mut state = self.state.write();
			transition(&mut state, id, &event, |s| s.cancel(Utc::now()))
		};
		if outcome == ApplyOutcome::Applied {
			self.notify(&event);
			true
		} else {
			false
		}
	}

	pub fn get(&self, id: &GenerationId) -> Option<GenerationSession> {
		self.state.read().sessions.get(id).cloned()
	}

	/// All sessions in creation order.
	pub fn list(&self) -> Vec<GenerationSession> {
		let state = self.state.read();
		state
			.order
			.iter()
			.filter_map(|id| state.sessions.get(id))
			.cloned()
			.collect()
	}

	pub fn current_generation(&self) -> Option<GenerationId> {
		self.state.read().current.clone()
	}

	pub fn len(&self) -> usize {
		self.state.read().sessions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn remove(&self, id: &GenerationId) -> Option<GenerationSession> {
		let mut state = self.state.write();
		let removed = state.sessions.remove(id)?;
		state.order.retain(|existing| existing != id);
		if state.current.as_ref() == Some(id) {
			state.current = None;
		}
		Some(removed)
	}

	/// Drops every record. Issued ids stay reserved.
	pub fn clear(&self) {
		let mut state = self.state.write();
		state.sessions.clear();
		state.order.clear();
		state.current = None;
	}

	pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
	where
		F: Fn(&ServerEvent) + Send + Sync + 'static,
	{
		let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
		self.observers.write().push((id, Arc::new(observer)));
		id
	}

	/// Removes an observer. Unknown or already removed ids return `false`.
	pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
		let mut observers = self.observers.write();
		let before = observers.len();
		observers.retain(|(existing, _)| *existing != id);
		observers.len() != before
	}

	fn notify(&self, event: &ServerEvent) {
		// Observers may call back into the registry, so run them unlocked.
		let observers: Vec<Observer> = self
			.observers
			.read()
			.iter()
			.map(|(_, observer)| Arc::clone(observer))
			.collect();
		for observer in observers {
			observer(event);
		}
	}
}

impl Default for SessionRegistry {
	fn default() -> Self {
		Self::new()
	}
}

fn transition<F>(
	state: &mut RegistryState,
	id: &GenerationId,
	event: &ServerEvent,
	apply: F,
) -> ApplyOutcome
where
	F: FnOnce(&mut GenerationSession) -> Result<(), TransitionError>,
{
	let Some(session) = state.sessions.get_mut(id) else {
		warn!(
			generation_id = %id,
			event_type = event.event_type(),
			"Event for unknown generation ignored"
		);
		return ApplyOutcome::Ignored;
	};

	match apply(session) {
		Ok(()) => {
			let terminal = session.is_terminal();
			debug!(
				generation_id = %id,
				event_type = event.event_type(),
				status = %session.status,
				"Session updated"
			);
			if terminal && state.current.as_ref() == Some(id) {
				state.current = None;
			}
			ApplyOutcome::Applied
		}
		Err(e) => {
			warn!(
				generation_id = %id,
				event_type = event.event_type(),
				error = %e,
				"Event rejected"
			);
			ApplyOutcome::Ignored
		}
	}
}
