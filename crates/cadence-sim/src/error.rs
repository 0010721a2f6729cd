// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Invalid simulation settings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
	#[error("at least one stage is required")]
	NoStages,

	#[error("success probability must be within 0.0..=1.0, got {0}")]
	InvalidProbability(f64),

	#[error("duration range {min}..={max} is empty")]
	InvalidDurationRange { min: u32, max: u32 },

	#[error("at least one failure reason is required")]
	NoFailureReasons,
}
