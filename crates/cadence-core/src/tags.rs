// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Genre and mood tags derived from a prompt.

/// Recognized tags, in the order they are reported.
pub const TAG_VOCABULARY: &[&str] = &[
	"ambient",
	"electronic",
	"jazz",
	"rock",
	"classical",
	"pop",
	"upbeat",
	"relaxing",
	"energetic",
	"melancholic",
];

/// Maximum number of tags attached to one prompt.
pub const MAX_TAGS: usize = 3;

/// Returns up to [`MAX_TAGS`] vocabulary tags contained in `prompt`.
///
/// Matching is a case-insensitive substring match, so "Jazzy" yields `jazz`.
pub fn extract_tags(prompt: &str) -> Vec<String> {
	let lowered = prompt.to_lowercase();
	TAG_VOCABULARY
		.iter()
		.filter(|tag| lowered.contains(*tag))
		.take(MAX_TAGS)
		.map(|tag| tag.to_string())
		.collect()
}
