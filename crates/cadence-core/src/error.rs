// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the session model and wire protocol.

use thiserror::Error;

use crate::session::GenerationStatus;

/// A state-machine transition that was rejected.
///
/// Rejections are never fatal: the registry logs them and leaves the session
/// untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransitionError {
	/// The event is not accepted in the session's current status.
	#[error("cannot apply {event} to a {from} session")]
	InvalidTransition {
		from: GenerationStatus,
		event: &'static str,
	},

	/// Progress outside 0..=100 (or NaN).
	#[error("progress {0} is outside 0..=100")]
	ProgressOutOfRange(f64),

	/// Progress lower than the value already recorded.
	#[error("stale progress {received} (current {current})")]
	StaleProgress { current: f64, received: f64 },
}

/// Errors encoding or decoding wire frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
	#[error("malformed frame: {0}")]
	Decode(#[source] serde_json::Error),

	#[error("failed to encode frame: {0}")]
	Encode(#[source] serde_json::Error),
}

/// A status string that does not name a [`GenerationStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid generation status: {0}")]
pub struct InvalidStatus(pub String);
