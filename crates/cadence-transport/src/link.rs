// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Connection seam between the channel and whatever carries the frames.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;

/// One established connection: text frames out, text frames in.
///
/// The inbound receiver yielding `None` means the peer closed the link.
/// Dropping the outbound sender closes the link from this side.
#[derive(Debug)]
pub struct Link {
	pub outbound: mpsc::UnboundedSender<String>,
	pub inbound: mpsc::UnboundedReceiver<String>,
}

impl Link {
	/// Creates two connected ends. Frames sent on one arrive on the other.
	pub fn pair() -> (Link, Link) {
		let (a_tx, a_rx) = mpsc::unbounded_channel();
		let (b_tx, b_rx) = mpsc::unbounded_channel();
		(
			Link {
				outbound: a_tx,
				inbound: b_rx,
			},
			Link {
				outbound: b_tx,
				inbound: a_rx,
			},
		)
	}
}

/// Opens links to an event source.
#[async_trait]
pub trait Connector: Send + Sync {
	async fn connect(&self) -> Result<Link>;
}
