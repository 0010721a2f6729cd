// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for simulated music generation.
//!
//! This crate provides:
//! - [`GenerationSession`] and its `queued → generating → completed | failed`
//!   state machine
//! - The JSON wire protocol ([`ClientMessage`], [`ServerEvent`])
//! - [`SessionRegistry`], the keyed session store with an observer list

pub mod error;
pub mod id;
pub mod protocol;
pub mod registry;
pub mod session;
pub mod tags;

pub use error::{InvalidStatus, ProtocolError, TransitionError};
pub use id::{ClientId, GenerationId};
pub use protocol::{
	decode_client_frame, decode_server_frame, encode_client_frame, encode_server_frame,
	ClientMessage, ServerEvent, GENERATION_ACTIVE, SERVER_ERROR,
};
pub use registry::{ApplyOutcome, Observer, SessionRegistry, SubscriptionId};
pub use session::{GenerationResult, GenerationSession, GenerationStatus, CANCELLED_MESSAGE};
pub use tags::extract_tags;
