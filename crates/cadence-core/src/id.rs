// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identifier types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a generation session.
///
/// Ids are opaque on the wire; the server echoes whatever the client sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationId(String);

impl GenerationId {
	/// Mints a fresh id of the form `gen-<uuid>`.
	#[must_use]
	pub fn generate() -> Self {
		Self(format!("gen-{}", Uuid::new_v4().simple()))
	}

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Display for GenerationId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<String> for GenerationId {
	fn from(value: String) -> Self {
		Self(value)
	}
}

impl From<&str> for GenerationId {
	fn from(value: &str) -> Self {
		Self(value.to_string())
	}
}

/// Identifier the server assigns to a connected client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
	#[must_use]
	pub fn generate() -> Self {
		Self(format!("client-{}", Uuid::new_v4().simple()))
	}

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Display for ClientId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for ClientId {
	fn from(value: &str) -> Self {
		Self(value.to_string())
	}
}
