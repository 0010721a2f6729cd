// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::sections::{LoggingConfigLayer, SimulationConfigLayer, TransportConfigLayer};

/// All fields optional so layers can be stacked.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CadenceConfigLayer {
	#[serde(default)]
	pub simulation: Option<SimulationConfigLayer>,
	#[serde(default)]
	pub transport: Option<TransportConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl CadenceConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: CadenceConfigLayer) {
		merge_option(
			&mut self.simulation,
			other.simulation,
			SimulationConfigLayer::merge,
		);
		merge_option(
			&mut self.transport,
			other.transport,
			TransportConfigLayer::merge,
		);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_option<T>(target: &mut Option<T>, other: Option<T>, merge: fn(&mut T, T)) {
	match (target.as_mut(), other) {
		(Some(existing), Some(incoming)) => merge(existing, incoming),
		(None, Some(incoming)) => *target = Some(incoming),
		(_, None) => {}
	}
}
