// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use cadence_core::ProtocolError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors surfaced by the transport.
///
/// None of these are fatal; the channel reports them to its handler and keeps
/// going (or stops reconnecting, for [`TransportError::RetriesExhausted`]).
#[derive(Debug, Error)]
pub enum TransportError {
	/// The connector could not open a link.
	#[error("connection failed: {0}")]
	ConnectFailed(String),

	/// The link closed while sending.
	#[error("connection closed")]
	Closed,

	/// Reconnection gave up after the configured number of attempts.
	#[error("max reconnection attempts reached ({attempts})")]
	RetriesExhausted { attempts: u32 },

	#[error(transparent)]
	Protocol(#[from] ProtocolError),
}
