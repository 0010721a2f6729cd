// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Simulation configuration section.

use std::time::Duration;

use cadence_sim::{SimulationConfig, DEFAULT_FAILURE_REASONS, DEFAULT_STAGES};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_stages() -> Vec<String> {
	DEFAULT_STAGES.iter().map(|s| s.to_string()).collect()
}

fn default_failure_reasons() -> Vec<String> {
	DEFAULT_FAILURE_REASONS.iter().map(|s| s.to_string()).collect()
}

fn default_audio_url_base() -> String {
	cadence_sim::config::DEFAULT_AUDIO_URL_BASE.to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SimulationConfigLayer {
	pub stages: Option<Vec<String>>,
	pub step_interval_ms: Option<u64>,
	pub success_probability: Option<f64>,
	pub duration_min_secs: Option<u32>,
	pub duration_max_secs: Option<u32>,
	pub failure_reasons: Option<Vec<String>>,
	pub audio_url_base: Option<String>,
	pub connect_latency_ms: Option<u64>,
	pub seed: Option<u64>,
}

impl SimulationConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.stages.is_some() {
			self.stages = other.stages;
		}
		if other.step_interval_ms.is_some() {
			self.step_interval_ms = other.step_interval_ms;
		}
		if other.success_probability.is_some() {
			self.success_probability = other.success_probability;
		}
		if other.duration_min_secs.is_some() {
			self.duration_min_secs = other.duration_min_secs;
		}
		if other.duration_max_secs.is_some() {
			self.duration_max_secs = other.duration_max_secs;
		}
		if other.failure_reasons.is_some() {
			self.failure_reasons = other.failure_reasons;
		}
		if other.audio_url_base.is_some() {
			self.audio_url_base = other.audio_url_base;
		}
		if other.connect_latency_ms.is_some() {
			self.connect_latency_ms = other.connect_latency_ms;
		}
		if other.seed.is_some() {
			self.seed = other.seed;
		}
	}

	pub fn finalize(self) -> SimulationSettings {
		SimulationSettings {
			stages: self.stages.unwrap_or_else(default_stages),
			step_interval_ms: self.step_interval_ms.unwrap_or(1000),
			success_probability: self.success_probability.unwrap_or(0.8),
			duration_min_secs: self.duration_min_secs.unwrap_or(60),
			duration_max_secs: self.duration_max_secs.unwrap_or(240),
			failure_reasons: self.failure_reasons.unwrap_or_else(default_failure_reasons),
			audio_url_base: self.audio_url_base.unwrap_or_else(default_audio_url_base),
			connect_latency_ms: self.connect_latency_ms.unwrap_or(100),
			seed: self.seed,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationSettings {
	pub stages: Vec<String>,
	pub step_interval_ms: u64,
	pub success_probability: f64,
	pub duration_min_secs: u32,
	pub duration_max_secs: u32,
	pub failure_reasons: Vec<String>,
	pub audio_url_base: String,
	pub connect_latency_ms: u64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub seed: Option<u64>,
}

impl SimulationSettings {
	/// Builds the engine config, rejecting values the engine cannot run with.
	pub fn to_simulation_config(&self) -> Result<SimulationConfig, ConfigError> {
		let config = SimulationConfig {
			stages: self.stages.clone(),
			step_interval: Duration::from_millis(self.step_interval_ms),
			success_probability: self.success_probability,
			duration_min_secs: self.duration_min_secs,
			duration_max_secs: self.duration_max_secs,
			failure_reasons: self.failure_reasons.clone(),
			audio_url_base: self.audio_url_base.clone(),
			connect_latency: Duration::from_millis(self.connect_latency_ms),
			seed: self.seed,
		};
		config
			.validate()
			.map_err(|e| ConfigError::Validation(format!("simulation: {e}")))?;
		Ok(config)
	}
}

impl Default for SimulationSettings {
	fn default() -> Self {
		SimulationConfigLayer::default().finalize()
	}
}
