// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Simulated music generation server.
//!
//! [`SimulationEngine`] scripts the lifecycle of each requested generation
//! (start, staged progress, one terminal outcome) and [`LocalConnector`]
//! serves it over in-process links so the client stack can be exercised
//! without a network.

pub mod config;
pub mod engine;
pub mod error;
pub mod outcome;
pub mod server;
mod timers;

pub use config::{SimulationConfig, DEFAULT_FAILURE_REASONS, DEFAULT_STAGES};
pub use engine::{SimulationEngine, INVALID_MESSAGE};
pub use error::SimulationError;
pub use outcome::{mock_waveform, Outcome};
pub use server::LocalConnector;
