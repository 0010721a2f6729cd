// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

/// Reconnection behavior of a [`TransportChannel`](crate::TransportChannel).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
	/// Base delay; attempt `n` waits `n × reconnect_interval`.
	pub reconnect_interval: Duration,
	/// Reconnect attempts before giving up.
	pub max_reconnect_attempts: u32,
}

impl TransportConfig {
	/// Linear backoff delay before reconnect attempt `attempt` (1-based).
	pub fn backoff_delay(&self, attempt: u32) -> Duration {
		self.reconnect_interval.saturating_mul(attempt)
	}
}

impl Default for TransportConfig {
	fn default() -> Self {
		Self {
			reconnect_interval: Duration::from_millis(3000),
			max_reconnect_attempts: 5,
		}
	}
}
