// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: defaults, TOML files, environment variables and
//! command-line overrides.

use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::CadenceConfigLayer;
use crate::sections::{
	LogFormat, LoggingConfigLayer, SimulationConfigLayer, TransportConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
	CommandLine = 90,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<CadenceConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<CadenceConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(CadenceConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file yields an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// `cadence.toml` in the working directory.
	pub fn local() -> Self {
		Self::new("cadence.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<CadenceConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(CadenceConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: CadenceConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: CADENCE_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<CadenceConfigLayer, ConfigError> {
		debug!("loading environment variables");
		layer_from_lookup(|name| std::env::var(name).ok())
	}
}

/// A pre-built layer, typically parsed from command-line flags.
pub struct OverrideSource {
	layer: CadenceConfigLayer,
}

impl OverrideSource {
	pub fn new(layer: CadenceConfigLayer) -> Self {
		Self { layer }
	}
}

impl ConfigSource for OverrideSource {
	fn name(&self) -> &'static str {
		"overrides"
	}

	fn precedence(&self) -> Precedence {
		Precedence::CommandLine
	}

	fn load(&self) -> Result<CadenceConfigLayer, ConfigError> {
		Ok(self.layer.clone())
	}
}

struct Env<F> {
	lookup: F,
}

impl<F> Env<F>
where
	F: Fn(&str) -> Option<String>,
{
	fn var(&self, name: &str) -> Option<String> {
		(self.lookup)(name).filter(|s| !s.is_empty())
	}

	fn parse<T: FromStr>(&self, name: &str, kind: &str) -> Result<Option<T>, ConfigError> {
		match self.var(name) {
			Some(v) => v.trim().parse().map(Some).map_err(|_| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("invalid {kind} value '{v}'"),
			}),
			None => Ok(None),
		}
	}

	fn u32(&self, name: &str) -> Result<Option<u32>, ConfigError> {
		self.parse(name, "u32")
	}

	fn u64(&self, name: &str) -> Result<Option<u64>, ConfigError> {
		self.parse(name, "u64")
	}

	fn f64(&self, name: &str) -> Result<Option<f64>, ConfigError> {
		self.parse(name, "f64")
	}

	fn list(&self, name: &str) -> Option<Vec<String>> {
		self.var(name).map(|s| {
			s.split(',')
				.map(|s| s.trim().to_string())
				.filter(|s| !s.is_empty())
				.collect()
		})
	}
}

fn layer_from_lookup<F>(lookup: F) -> Result<CadenceConfigLayer, ConfigError>
where
	F: Fn(&str) -> Option<String>,
{
	let env = Env { lookup };
	Ok(CadenceConfigLayer {
		simulation: Some(load_simulation_from_env(&env)?),
		transport: Some(load_transport_from_env(&env)?),
		logging: Some(load_logging_from_env(&env)?),
	})
}

fn load_simulation_from_env<F>(env: &Env<F>) -> Result<SimulationConfigLayer, ConfigError>
where
	F: Fn(&str) -> Option<String>,
{
	Ok(SimulationConfigLayer {
		stages: env.list("CADENCE_SIM_STAGES"),
		step_interval_ms: env.u64("CADENCE_SIM_STEP_INTERVAL_MS")?,
		success_probability: env.f64("CADENCE_SIM_SUCCESS_PROBABILITY")?,
		duration_min_secs: env.u32("CADENCE_SIM_DURATION_MIN_SECS")?,
		duration_max_secs: env.u32("CADENCE_SIM_DURATION_MAX_SECS")?,
		failure_reasons: env.list("CADENCE_SIM_FAILURE_REASONS"),
		audio_url_base: env.var("CADENCE_SIM_AUDIO_URL_BASE"),
		connect_latency_ms: env.u64("CADENCE_SIM_CONNECT_LATENCY_MS")?,
		seed: env.u64("CADENCE_SIM_SEED")?,
	})
}

fn load_transport_from_env<F>(env: &Env<F>) -> Result<TransportConfigLayer, ConfigError>
where
	F: Fn(&str) -> Option<String>,
{
	Ok(TransportConfigLayer {
		reconnect_interval_ms: env.u64("CADENCE_TRANSPORT_RECONNECT_INTERVAL_MS")?,
		max_reconnect_attempts: env.u32("CADENCE_TRANSPORT_MAX_RECONNECT_ATTEMPTS")?,
	})
}

fn load_logging_from_env<F>(env: &Env<F>) -> Result<LoggingConfigLayer, ConfigError>
where
	F: Fn(&str) -> Option<String>,
{
	let format = match env.var("CADENCE_LOG_FORMAT") {
		Some(v) => Some(
			v.parse::<LogFormat>()
				.map_err(|message| ConfigError::InvalidValue {
					key: "CADENCE_LOG_FORMAT".to_string(),
					message,
				})?,
		),
		None => None,
	};

	Ok(LoggingConfigLayer {
		level: env.var("CADENCE_LOG_LEVEL"),
		format,
	})
}
