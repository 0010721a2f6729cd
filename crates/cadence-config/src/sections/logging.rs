// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Logging configuration section.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

fn default_level() -> String {
	"info".to_string()
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	#[default]
	Pretty,
	Json,
}

impl FromStr for LogFormat {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"pretty" | "text" => Ok(LogFormat::Pretty),
			"json" => Ok(LogFormat::Json),
			other => Err(format!("unknown log format '{other}'")),
		}
	}
}

impl std::fmt::Display for LogFormat {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			LogFormat::Pretty => write!(f, "pretty"),
			LogFormat::Json => write!(f, "json"),
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfigLayer {
	pub level: Option<String>,
	pub format: Option<LogFormat>,
}

impl LoggingConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.level.is_some() {
			self.level = other.level;
		}
		if other.format.is_some() {
			self.format = other.format;
		}
	}

	pub fn finalize(self) -> LoggingSettings {
		LoggingSettings {
			level: self.level.unwrap_or_else(default_level),
			format: self.format.unwrap_or_default(),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
	/// `EnvFilter` directive used when `RUST_LOG` is unset
	pub level: String,
	pub format: LogFormat,
}

impl Default for LoggingSettings {
	fn default() -> Self {
		Self {
			level: default_level(),
			format: LogFormat::Pretty,
		}
	}
}
