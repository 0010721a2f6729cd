// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client side of cadence.
//!
//! [`GenerationClient`] ties a [`cadence_core::SessionRegistry`] to a
//! [`cadence_transport::TransportChannel`]: prompts become queued sessions,
//! start and cancel requests go out over the channel, and server events flow
//! back into the registry and on to subscribers.

mod client;
mod dispatcher;

pub use client::{ClientConfig, GenerationClient};
