// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Terminal outcome of a simulated generation.

use cadence_core::{GenerationId, ServerEvent};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::SimulationConfig;

pub const WAVEFORM_SAMPLES: usize = 100;
const WAVEFORM_MIN: f32 = 0.1;
const WAVEFORM_MAX: f32 = 0.9;
const FALLBACK_FAILURE: &str = "Generation failed";

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
	Completed {
		audio_url: String,
		duration: u32,
		waveform: Vec<f32>,
	},
	Failed {
		reason: String,
	},
}

impl Outcome {
	/// Draws the outcome for `id`.
	pub fn roll<R: Rng + ?Sized>(config: &SimulationConfig, rng: &mut R, id: &GenerationId) -> Self {
		if rng.gen_bool(config.success_probability) {
			Outcome::Completed {
				audio_url: config.audio_url(id.as_str()),
				duration: rng.gen_range(config.duration_min_secs..=config.duration_max_secs),
				waveform: mock_waveform(rng),
			}
		} else {
			let reason = config
				.failure_reasons
				.choose(rng)
				.cloned()
				.unwrap_or_else(|| FALLBACK_FAILURE.to_string());
			Outcome::Failed { reason }
		}
	}

	pub fn into_event(self, id: GenerationId) -> ServerEvent {
		match self {
			Outcome::Completed {
				audio_url,
				duration,
				waveform,
			} => ServerEvent::generation_complete(id, audio_url, duration, Some(waveform)),
			Outcome::Failed { reason } => ServerEvent::generation_failed(id, reason),
		}
	}
}

/// Random amplitudes for a waveform preview.
pub fn mock_waveform<R: Rng + ?Sized>(rng: &mut R) -> Vec<f32> {
	(0..WAVEFORM_SAMPLES)
		.map(|_| rng.gen_range(WAVEFORM_MIN..=WAVEFORM_MAX))
		.collect()
}
