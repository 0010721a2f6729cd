// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration management for cadence.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file,
//!   environment, command-line overrides)
//! - Validation against what the simulation engine accepts
//! - Consistent environment variable naming (`CADENCE_*`)
//!
//! # Usage
//!
//! ```ignore
//! use cadence_config::load_config;
//!
//! let config = load_config()?;
//! let engine_config = config.simulation.to_simulation_config()?;
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::CadenceConfigLayer;
pub use sections::*;
pub use sources::{
	ConfigSource, DefaultsSource, EnvSource, OverrideSource, Precedence, TomlSource,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Fully resolved configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CadenceConfig {
	pub simulation: SimulationSettings,
	pub transport: TransportSettings,
	pub logging: LoggingSettings,
}

impl CadenceConfig {
	/// Renders the configuration as TOML.
	pub fn to_toml(&self) -> Result<String, ConfigError> {
		Ok(toml::to_string_pretty(self)?)
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`CADENCE_*`)
/// 2. Config file (`./cadence.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<CadenceConfig, ConfigError> {
	load_config_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::local()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<CadenceConfig, ConfigError> {
	load_config_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Load configuration from explicit sources, applied in precedence order.
pub fn load_config_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<CadenceConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = CadenceConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: CadenceConfigLayer) -> Result<CadenceConfig, ConfigError> {
	let simulation = layer.simulation.unwrap_or_default().finalize();
	let transport = layer.transport.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	simulation.to_simulation_config()?;

	info!(
		stages = simulation.stages.len(),
		step_interval_ms = simulation.step_interval_ms,
		success_probability = simulation.success_probability,
		seeded = simulation.seed.is_some(),
		reconnect_interval_ms = transport.reconnect_interval_ms,
		max_reconnect_attempts = transport.max_reconnect_attempts,
		"Configuration loaded"
	);

	Ok(CadenceConfig {
		simulation,
		transport,
		logging,
	})
}
