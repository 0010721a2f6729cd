// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Event transport for cadence clients.
//!
//! [`TransportChannel`] carries [`cadence_core::ClientMessage`]s out and
//! [`cadence_core::ServerEvent`]s in over links opened by a [`Connector`],
//! reconnecting with linear backoff after unintentional closures.

pub mod channel;
pub mod config;
pub mod error;
pub mod link;

pub use channel::{ConnectionState, TransportChannel, TransportHandler};
pub use config::TransportConfig;
pub use error::{Result, TransportError};
pub use link::{Connector, Link};
