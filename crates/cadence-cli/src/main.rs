// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `cadence` binary: drives the generation client against the in-process
//! simulator.

mod args;
mod generate;

use std::time::Duration;

use anyhow::{bail, Result};
use cadence_config::{
	load_config_from_sources, CadenceConfig, ConfigSource, DefaultsSource, EnvSource, LogFormat,
	LoggingSettings, OverrideSource, TomlSource,
};
use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use args::{Args, Command};
use generate::GenerateOptions;

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();

	let toml = match &args.config {
		Some(path) if !path.exists() => bail!("config file {} not found", path.display()),
		Some(path) => TomlSource::new(path),
		None => TomlSource::local(),
	};
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(toml),
		Box::new(EnvSource),
		Box::new(OverrideSource::new(args.overrides())),
	];
	let config: CadenceConfig = load_config_from_sources(sources)?;

	init_tracing(&config.logging);
	tracing::debug!(command = ?args.command, "starting cadence");

	match args.command {
		Command::Generate {
			prompts,
			cancel_after_ms,
			json,
		} => {
			generate::run(
				&config,
				GenerateOptions {
					prompts,
					cancel_after: cancel_after_ms.map(Duration::from_millis),
					json,
				},
			)
			.await
		}
		Command::Config => {
			print!("{}", config.to_toml()?);
			Ok(())
		}
	}
}

/// Logs go to stderr so stdout carries only command output.
fn init_tracing(logging: &LoggingSettings) {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

	match logging.format {
		LogFormat::Json => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().json().with_writer(std::io::stderr))
				.init();
		}
		LogFormat::Pretty => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().with_writer(std::io::stderr))
				.init();
		}
	}
}
