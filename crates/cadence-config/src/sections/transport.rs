// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Transport configuration section.

use std::time::Duration;

use cadence_transport::TransportConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TransportConfigLayer {
	pub reconnect_interval_ms: Option<u64>,
	pub max_reconnect_attempts: Option<u32>,
}

impl TransportConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.reconnect_interval_ms.is_some() {
			self.reconnect_interval_ms = other.reconnect_interval_ms;
		}
		if other.max_reconnect_attempts.is_some() {
			self.max_reconnect_attempts = other.max_reconnect_attempts;
		}
	}

	pub fn finalize(self) -> TransportSettings {
		TransportSettings {
			reconnect_interval_ms: self.reconnect_interval_ms.unwrap_or(3000),
			max_reconnect_attempts: self.max_reconnect_attempts.unwrap_or(5),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransportSettings {
	pub reconnect_interval_ms: u64,
	pub max_reconnect_attempts: u32,
}

impl TransportSettings {
	pub fn to_transport_config(&self) -> TransportConfig {
		TransportConfig {
			reconnect_interval: Duration::from_millis(self.reconnect_interval_ms),
			max_reconnect_attempts: self.max_reconnect_attempts,
		}
	}
}

impl Default for TransportSettings {
	fn default() -> Self {
		Self {
			reconnect_interval_ms: 3000,
			max_reconnect_attempts: 5,
		}
	}
}
