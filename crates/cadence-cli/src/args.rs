// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use cadence_config::{CadenceConfigLayer, SimulationConfigLayer};
use clap::{Parser, Subcommand};

/// Cadence - simulated AI music generation
#[derive(Parser, Debug)]
#[command(name = "cadence", version)]
pub struct Args {
	/// TOML config file (defaults to ./cadence.toml when present)
	#[arg(long, global = true, env = "CADENCE_CONFIG")]
	pub config: Option<PathBuf>,

	/// Fixed RNG seed for reproducible outcomes
	#[arg(long, global = true)]
	pub seed: Option<u64>,

	/// Chance that a generation completes, 0.0 to 1.0
	#[arg(long, global = true)]
	pub success_probability: Option<f64>,

	/// Milliseconds between stages
	#[arg(long, global = true)]
	pub step_interval_ms: Option<u64>,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Run prompts through the simulator and print their events
	Generate {
		/// One session is created per prompt
		#[arg(required = true)]
		prompts: Vec<String>,

		/// Cancel every session still running after this many milliseconds
		#[arg(long)]
		cancel_after_ms: Option<u64>,

		/// Print final sessions as JSON
		#[arg(long)]
		json: bool,
	},

	/// Print the resolved configuration as TOML
	Config,
}

impl Args {
	/// Flag values as a config layer. Unset flags leave lower layers alone.
	pub fn overrides(&self) -> CadenceConfigLayer {
		let simulation = SimulationConfigLayer {
			seed: self.seed,
			success_probability: self.success_probability,
			step_interval_ms: self.step_interval_ms,
			..Default::default()
		};
		CadenceConfigLayer {
			simulation: Some(simulation),
			..Default::default()
		}
	}
}
