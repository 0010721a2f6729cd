// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashMap;

use cadence_core::GenerationId;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct Timer {
	token: CancellationToken,
	handle: JoinHandle<()>,
}

/// Scheduled work per active generation.
#[derive(Default)]
pub(crate) struct TimerTable {
	timers: HashMap<GenerationId, Timer>,
}

impl TimerTable {
	pub fn contains(&self, id: &GenerationId) -> bool {
		self.timers.contains_key(id)
	}

	pub fn insert(&mut self, id: GenerationId, token: CancellationToken, handle: JoinHandle<()>) {
		self.timers.insert(id, Timer { token, handle });
	}

	/// Drops the entry without cancelling it. Used by a driver that has
	/// reached its terminal event.
	pub fn release(&mut self, id: &GenerationId) -> bool {
		self.timers.remove(id).is_some()
	}

	/// Cancels and drops the entry. Returns whether one existed.
	pub fn cancel(&mut self, id: &GenerationId) -> bool {
		match self.timers.remove(id) {
			Some(timer) => {
				timer.token.cancel();
				true
			}
			None => false,
		}
	}

	pub fn cancel_all(&mut self) -> Vec<GenerationId> {
		self.timers
			.drain()
			.map(|(id, timer)| {
				timer.token.cancel();
				id
			})
			.collect()
	}

	pub fn ids(&self) -> Vec<GenerationId> {
		self.timers.keys().cloned().collect()
	}

	pub fn len(&self) -> usize {
		self.timers.len()
	}

	/// Aborts every driver outright. Only used on drop.
	pub fn abort_all(&mut self) {
		for (_, timer) in self.timers.drain() {
			timer.token.cancel();
			timer.handle.abort();
		}
	}
}
