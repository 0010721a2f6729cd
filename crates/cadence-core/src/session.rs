// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Generation session record and its lifecycle.
//!
//! ```text
//! queued ──start──▶ generating ──complete──▶ completed
//!    │                  │
//!    └──────failed──────┴──────failed───────▶ failed
//! ```
//!
//! `completed` and `failed` are terminal: once reached, every further
//! transition is rejected and the record is frozen.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{InvalidStatus, TransitionError};
use crate::id::GenerationId;
use crate::tags::extract_tags;

/// Message recorded when the user cancels a generation.
pub const CANCELLED_MESSAGE: &str = "Generation cancelled by user";

/// Lifecycle status of a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
	/// Submitted, waiting for the server to start it
	Queued,
	/// Server is emitting progress
	Generating,
	/// Finished with a result
	Completed,
	/// Finished with an error (including user cancellation)
	Failed,
}

impl GenerationStatus {
	#[must_use]
	pub fn is_terminal(self) -> bool {
		matches!(self, GenerationStatus::Completed | GenerationStatus::Failed)
	}
}

impl std::fmt::Display for GenerationStatus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			GenerationStatus::Queued => write!(f, "queued"),
			GenerationStatus::Generating => write!(f, "generating"),
			GenerationStatus::Completed => write!(f, "completed"),
			GenerationStatus::Failed => write!(f, "failed"),
		}
	}
}

impl std::str::FromStr for GenerationStatus {
	type Err = InvalidStatus;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"queued" => Ok(GenerationStatus::Queued),
			"generating" => Ok(GenerationStatus::Generating),
			"completed" => Ok(GenerationStatus::Completed),
			"failed" => Ok(GenerationStatus::Failed),
			other => Err(InvalidStatus(other.to_string())),
		}
	}
}

/// Result payload delivered with a successful generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
	pub audio_url: String,
	/// Track length in seconds
	pub duration: u32,
	pub waveform: Option<Vec<f32>>,
}

/// One prompt's journey from submission to outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSession {
	pub id: GenerationId,
	pub prompt: String,
	pub status: GenerationStatus,
	/// 0-100, `None` until the session starts generating
	pub progress: Option<f64>,
	/// Present only while generating
	pub stage: Option<String>,
	pub audio_url: Option<String>,
	/// Seconds
	pub result_duration: Option<u32>,
	pub waveform: Option<Vec<f32>>,
	pub error_message: Option<String>,
	pub tags: Vec<String>,
	pub created_at: DateTime<Utc>,
	pub completed_at: Option<DateTime<Utc>>,
}

impl GenerationSession {
	/// Creates a queued session for `prompt`.
	pub fn new(id: GenerationId, prompt: impl Into<String>, created_at: DateTime<Utc>) -> Self {
		let prompt = prompt.into();
		let tags = extract_tags(&prompt);
		Self {
			id,
			prompt,
			status: GenerationStatus::Queued,
			progress: None,
			stage: None,
			audio_url: None,
			result_duration: None,
			waveform: None,
			error_message: None,
			tags,
			created_at,
			completed_at: None,
		}
	}

	#[must_use]
	pub fn is_terminal(&self) -> bool {
		self.status.is_terminal()
	}

	/// `queued → generating`.
	pub fn begin(&mut self) -> Result<(), TransitionError> {
		self.expect_status(&[GenerationStatus::Queued], "start")?;
		self.status = GenerationStatus::Generating;
		self.progress = Some(0.0);
		self.stage = None;
		Ok(())
	}

	/// Records a progress step. Values lower than the current one are rejected
	/// so that progress never moves backwards.
	pub fn record_progress(
		&mut self,
		progress: f64,
		stage: impl Into<String>,
	) -> Result<(), TransitionError> {
		self.expect_status(&[GenerationStatus::Generating], "progress")?;
		if !(0.0..=100.0).contains(&progress) {
			return Err(TransitionError::ProgressOutOfRange(progress));
		}
		let current = self.progress.unwrap_or(0.0);
		if progress < current {
			return Err(TransitionError::StaleProgress {
				current,
				received: progress,
			});
		}
		self.progress = Some(progress);
		self.stage = Some(stage.into());
		Ok(())
	}

	/// `generating → completed`.
	pub fn complete(
		&mut self,
		result: GenerationResult,
		at: DateTime<Utc>,
	) -> Result<(), TransitionError> {
		self.expect_status(&[GenerationStatus::Generating], "complete")?;
		self.status = GenerationStatus::Completed;
		self.audio_url = Some(result.audio_url);
		self.result_duration = Some(result.duration);
		self.waveform = result.waveform;
		self.stage = None;
		self.completed_at = Some(at);
		Ok(())
	}

	/// `queued | generating → failed`.
	pub fn fail(
		&mut self,
		message: impl Into<String>,
		at: DateTime<Utc>,
	) -> Result<(), TransitionError> {
		self.expect_status(
			&[GenerationStatus::Queued, GenerationStatus::Generating],
			"failed",
		)?;
		self.status = GenerationStatus::Failed;
		self.error_message = Some(message.into());
		self.stage = None;
		self.completed_at = Some(at);
		Ok(())
	}

	/// Fails the session with [`CANCELLED_MESSAGE`].
	pub fn cancel(&mut self, at: DateTime<Utc>) -> Result<(), TransitionError> {
		self.fail(CANCELLED_MESSAGE, at)
	}

	fn expect_status(
		&self,
		allowed: &[GenerationStatus],
		event: &'static str,
	) -> Result<(), TransitionError> {
		if allowed.contains(&self.status) {
			Ok(())
		} else {
			Err(TransitionError::InvalidTransition {
				from: self.status,
				event,
			})
		}
	}
}
