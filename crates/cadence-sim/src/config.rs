// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Simulation settings.

use std::time::Duration;

use crate::error::SimulationError;

pub const DEFAULT_STAGES: &[&str] = &[
	"Analyzing prompt",
	"Generating melody",
	"Adding harmony",
	"Mixing audio",
	"Finalizing",
];

pub const DEFAULT_FAILURE_REASONS: &[&str] = &[
	"Server timeout - please try again",
	"Content policy violation detected",
	"Insufficient resources - please retry",
	"Generation quality below threshold",
];

pub const DEFAULT_AUDIO_URL_BASE: &str = "https://example.com/audio";

/// Everything the engine needs to script a generation.
///
/// Tests force deterministic runs with `success_probability` of 0 or 1, a
/// single-value duration range and a fixed `seed`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
	/// Stage labels, emitted in order
	pub stages: Vec<String>,
	/// Gap between consecutive stages, and between the last stage and the outcome
	pub step_interval: Duration,
	pub success_probability: f64,
	/// Inclusive bounds, seconds
	pub duration_min_secs: u32,
	pub duration_max_secs: u32,
	pub failure_reasons: Vec<String>,
	/// Result URLs are `<audio_url_base>/<id>.mp3`
	pub audio_url_base: String,
	/// Delay before an in-process link opens
	pub connect_latency: Duration,
	/// Fixed RNG seed; `None` seeds from entropy
	pub seed: Option<u64>,
}

impl SimulationConfig {
	pub fn validate(&self) -> Result<(), SimulationError> {
		if self.stages.is_empty() {
			return Err(SimulationError::NoStages);
		}
		if !(0.0..=1.0).contains(&self.success_probability) {
			return Err(SimulationError::InvalidProbability(self.success_probability));
		}
		if self.duration_min_secs > self.duration_max_secs {
			return Err(SimulationError::InvalidDurationRange {
				min: self.duration_min_secs,
				max: self.duration_max_secs,
			});
		}
		if self.failure_reasons.is_empty() {
			return Err(SimulationError::NoFailureReasons);
		}
		Ok(())
	}

	pub fn with_stages<I, S>(mut self, stages: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.stages = stages.into_iter().map(Into::into).collect();
		self
	}

	pub fn with_step_interval(mut self, interval: Duration) -> Self {
		self.step_interval = interval;
		self
	}

	pub fn with_success_probability(mut self, probability: f64) -> Self {
		self.success_probability = probability;
		self
	}

	pub fn with_duration_range(mut self, min_secs: u32, max_secs: u32) -> Self {
		self.duration_min_secs = min_secs;
		self.duration_max_secs = max_secs;
		self
	}

	pub fn with_connect_latency(mut self, latency: Duration) -> Self {
		self.connect_latency = latency;
		self
	}

	pub fn with_seed(mut self, seed: u64) -> Self {
		self.seed = Some(seed);
		self
	}

	pub fn audio_url(&self, id: &str) -> String {
		format!("{}/{id}.mp3", self.audio_url_base.trim_end_matches('/'))
	}
}

impl Default for SimulationConfig {
	fn default() -> Self {
		Self {
			stages: DEFAULT_STAGES.iter().map(|s| s.to_string()).collect(),
			step_interval: Duration::from_secs(1),
			success_probability: 0.8,
			duration_min_secs: 60,
			duration_max_secs: 240,
			failure_reasons: DEFAULT_FAILURE_REASONS.iter().map(|s| s.to_string()).collect(),
			audio_url_base: DEFAULT_AUDIO_URL_BASE.to_string(),
			connect_latency: Duration::from_millis(100),
			seed: None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults_are_valid() {
		let config = SimulationConfig::default();
		assert_eq!(config.stages.len(), 5);
		assert_eq!(config.step_interval, Duration::from_secs(1));
		assert_eq!(config.success_probability, 0.8);
		assert_eq!((config.duration_min_secs, config.duration_max_secs), (60, 240));
		assert!(config.validate().is_ok());
	}

	#[test]
	fn test_validation_errors() {
		let base = SimulationConfig::default();

		let no_stages = base.clone().with_stages(Vec::<String>::new());
		assert_eq!(no_stages.validate(), Err(SimulationError::NoStages));

		let bad_p = base.clone().with_success_probability(1.5);
		assert_eq!(bad_p.validate(), Err(SimulationError::InvalidProbability(1.5)));

		let nan_p = base.clone().with_success_probability(f64::NAN);
		assert!(nan_p.validate().is_err());

		let bad_range = base.clone().with_duration_range(200, 100);
		assert_eq!(
			bad_range.validate(),
			Err(SimulationError::InvalidDurationRange { min: 200, max: 100 })
		);

		let no_reasons = SimulationConfig {
			failure_reasons: Vec::new(),
			..base
		};
		assert_eq!(no_reasons.validate(), Err(SimulationError::NoFailureReasons));
	}

	#[test]
	fn test_audio_url() {
		let config = SimulationConfig {
			audio_url_base: "https://cdn.test/audio/".to_string(),
			..Default::default()
		};
		assert_eq!(config.audio_url("gen-1"), "https://cdn.test/audio/gen-1.mp3");
	}
}
