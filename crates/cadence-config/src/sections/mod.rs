// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

mod logging;
mod simulation;
mod transport;

pub use logging::{LogFormat, LoggingConfigLayer, LoggingSettings};
pub use simulation::{SimulationConfigLayer, SimulationSettings};
pub use transport::{TransportConfigLayer, TransportSettings};
