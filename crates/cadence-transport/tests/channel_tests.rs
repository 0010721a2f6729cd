// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cadence_core::{decode_client_frame, encode_server_frame, ClientMessage, ServerEvent};
use cadence_transport::{
	ConnectionState, Connector, Link, Result, TransportChannel, TransportConfig, TransportError,
	TransportHandler,
};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Fails the first `failures` connects, then hands out fresh links and
/// forwards their server ends to the test.
struct ScriptedConnector {
	failures_left: AtomicU32,
	attempts: Mutex<Vec<Instant>>,
	servers: mpsc::UnboundedSender<Link>,
}

impl ScriptedConnector {
	fn new(failures: u32) -> (Arc<Self>, mpsc::UnboundedReceiver<Link>) {
		let (servers, rx) = mpsc::unbounded_channel();
		let connector = Arc::new(Self {
			failures_left: AtomicU32::new(failures),
			attempts: Mutex::new(Vec::new()),
			servers,
		});
		(connector, rx)
	}

	fn attempts(&self) -> Vec<Instant> {
		self.attempts.lock().clone()
	}
}

#[async_trait]
impl Connector for ScriptedConnector {
	async fn connect(&self) -> Result<Link> {
		self.attempts.lock().push(Instant::now());
		if self.failures_left.load(Ordering::SeqCst) > 0 {
			self.failures_left.fetch_sub(1, Ordering::SeqCst);
			return Err(TransportError::ConnectFailed("scripted failure".to_string()));
		}
		let (client, server) = Link::pair();
		let _ = self.servers.send(server);
		Ok(client)
	}
}

#[derive(Debug, Clone, PartialEq)]
enum Notice {
	Connected,
	Disconnected(Option<String>),
	Error(String),
	Event(ServerEvent),
}

struct RecordingHandler {
	tx: mpsc::UnboundedSender<Notice>,
}

impl RecordingHandler {
	fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Notice>) {
		let (tx, rx) = mpsc::unbounded_channel();
		(Arc::new(Self { tx }), rx)
	}
}

impl TransportHandler for RecordingHandler {
	fn on_connect(&self) {
		let _ = self.tx.send(Notice::Connected);
	}

	fn on_disconnect(&self, reason: Option<&str>) {
		let _ = self.tx.send(Notice::Disconnected(reason.map(str::to_string)));
	}

	fn on_error(&self, error: &TransportError) {
		let _ = self.tx.send(Notice::Error(error.to_string()));
	}

	fn on_event(&self, event: ServerEvent) {
		let _ = self.tx.send(Notice::Event(event));
	}
}

fn fast_config(max_reconnect_attempts: u32) -> TransportConfig {
	TransportConfig {
		reconnect_interval: Duration::from_millis(10),
		max_reconnect_attempts,
	}
}

async fn next(notices: &mut mpsc::UnboundedReceiver<Notice>) -> Notice {
	tokio::time::timeout(Duration::from_secs(5), notices.recv())
		.await
		.expect("timed out waiting for a transport notice")
		.expect("handler dropped")
}

fn assert_between(actual: Duration, low_ms: u64, high_ms: u64) {
	assert!(
		actual >= Duration::from_millis(low_ms) && actual < Duration::from_millis(high_ms),
		"expected {low_ms}..{high_ms}ms, got {actual:?}"
	);
}

#[tokio::test(start_paused = true)]
async fn reconnects_with_linear_backoff_then_resets_attempts() {
	let (connector, mut servers) = ScriptedConnector::new(2);
	let (handler, mut notices) = RecordingHandler::new();
	let channel = TransportChannel::new(fast_config(3), connector.clone(), handler);

	channel.connect();

	assert!(matches!(next(&mut notices).await, Notice::Error(_)));
	assert!(matches!(next(&mut notices).await, Notice::Error(_)));
	assert_eq!(next(&mut notices).await, Notice::Connected);
	let _server = servers.recv().await.unwrap();

	let attempts = connector.attempts();
	assert_eq!(attempts.len(), 3);
	assert_between(attempts[1] - attempts[0], 10, 15);
	assert_between(attempts[2] - attempts[1], 20, 25);

	assert_eq!(channel.state(), ConnectionState::Connected);
	assert_eq!(channel.reconnect_attempts(), 0);
	assert!(!channel.is_exhausted());
}

#[tokio::test(start_paused = true)]
async fn stops_after_max_attempts() {
	let (connector, _servers) = ScriptedConnector::new(u32::MAX);
	let (handler, mut notices) = RecordingHandler::new();
	let channel = TransportChannel::new(fast_config(2), connector.clone(), handler);

	channel.connect();

	for _ in 0..3 {
		match next(&mut notices).await {
			Notice::Error(message) => assert!(message.contains("scripted failure")),
			other => panic!("unexpected notice {other:?}"),
		}
	}
	match next(&mut notices).await {
		Notice::Error(message) => assert!(message.contains("max reconnection attempts")),
		other => panic!("unexpected notice {other:?}"),
	}

	tokio::time::sleep(Duration::from_secs(1)).await;
	assert_eq!(connector.attempts().len(), 3);
	assert_eq!(channel.state(), ConnectionState::Disconnected);
	assert!(channel.is_exhausted());
	assert_eq!(channel.reconnect_attempts(), 2);
}

#[tokio::test(start_paused = true)]
async fn malformed_frames_are_reported_not_dispatched() {
	let (connector, mut servers) = ScriptedConnector::new(0);
	let (handler, mut notices) = RecordingHandler::new();
	let channel = TransportChannel::new(fast_config(3), connector, handler);

	channel.connect();
	assert_eq!(next(&mut notices).await, Notice::Connected);
	let server = servers.recv().await.unwrap();

	let valid = ServerEvent::generation_start("gen-1".into(), "jazz");
	server.outbound.send("{not json".to_string()).unwrap();
	server
		.outbound
		.send(r#"{"type":"mystery","timestamp":1}"#.to_string())
		.unwrap();
	server
		.outbound
		.send(encode_server_frame(&valid).unwrap())
		.unwrap();

	for _ in 0..2 {
		match next(&mut notices).await {
			Notice::Error(message) => assert!(message.starts_with("malformed frame")),
			other => panic!("unexpected notice {other:?}"),
		}
	}
	assert_eq!(next(&mut notices).await, Notice::Event(valid));
	assert!(channel.is_connected());
}

#[tokio::test(start_paused = true)]
async fn send_into_closed_link_reports_closed() {
	let (connector, mut servers) = ScriptedConnector::new(0);
	let (handler, mut notices) = RecordingHandler::new();
	let channel = TransportChannel::new(fast_config(3), connector, handler);

	channel.connect();
	assert_eq!(next(&mut notices).await, Notice::Connected);
	let Link {
		outbound: _server_outbound,
		inbound,
	} = servers.recv().await.unwrap();
	drop(inbound);

	assert!(!channel.send(&ClientMessage::cancel("gen-1".into())));
	assert_eq!(
		next(&mut notices).await,
		Notice::Error(TransportError::Closed.to_string())
	);
}

#[tokio::test(start_paused = true)]
async fn send_requires_connection() {
	let (connector, mut servers) = ScriptedConnector::new(0);
	let (handler, mut notices) = RecordingHandler::new();
	let channel = TransportChannel::new(fast_config(3), connector, handler);

	let message = ClientMessage::start("gen-7".into(), "Create a happy song");
	assert!(!channel.send(&message));

	channel.connect();
	assert_eq!(next(&mut notices).await, Notice::Connected);
	let mut server = servers.recv().await.unwrap();

	assert!(channel.send(&message));
	let frame = server.inbound.recv().await.unwrap();
	assert_eq!(decode_client_frame(&frame).unwrap(), message);
}

#[tokio::test(start_paused = true)]
async fn connect_is_idempotent() {
	let (connector, mut servers) = ScriptedConnector::new(0);
	let (handler, mut notices) = RecordingHandler::new();
	let channel = TransportChannel::new(fast_config(3), connector.clone(), handler);

	channel.connect();
	channel.connect();
	assert_eq!(next(&mut notices).await, Notice::Connected);
	let _server = servers.recv().await.unwrap();
	channel.connect();

	tokio::time::sleep(Duration::from_millis(100)).await;
	assert_eq!(connector.attempts().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn peer_close_triggers_reconnect() {
	let (connector, mut servers) = ScriptedConnector::new(0);
	let (handler, mut notices) = RecordingHandler::new();
	let channel = TransportChannel::new(fast_config(3), connector.clone(), handler);

	channel.connect();
	assert_eq!(next(&mut notices).await, Notice::Connected);
	let server = servers.recv().await.unwrap();
	drop(server);

	assert_eq!(
		next(&mut notices).await,
		Notice::Disconnected(Some("Connection closed".to_string()))
	);
	assert_eq!(next(&mut notices).await, Notice::Connected);
	let _server = servers.recv().await.unwrap();

	let attempts = connector.attempts();
	assert_eq!(attempts.len(), 2);
	assert_between(attempts[1] - attempts[0], 10, 15);
	assert_eq!(channel.reconnect_attempts(), 0);
}

#[tokio::test(start_paused = true)]
async fn intentional_disconnect_does_not_reconnect() {
	let (connector, mut servers) = ScriptedConnector::new(0);
	let (handler, mut notices) = RecordingHandler::new();
	let channel = TransportChannel::new(fast_config(3), connector.clone(), handler);

	channel.connect();
	assert_eq!(next(&mut notices).await, Notice::Connected);
	let mut server = servers.recv().await.unwrap();

	channel.disconnect().await;
	assert_eq!(
		next(&mut notices).await,
		Notice::Disconnected(Some("Client disconnected".to_string()))
	);
	assert!(server.inbound.recv().await.is_none());

	tokio::time::sleep(Duration::from_secs(1)).await;
	assert_eq!(connector.attempts().len(), 1);
	assert!(notices.try_recv().is_err());
	assert_eq!(channel.state(), ConnectionState::Disconnected);
	assert!(!channel.send(&ClientMessage::cancel("gen-1".into())));
}

#[tokio::test(start_paused = true)]
async fn disconnect_cancels_pending_reconnect_wait() {
	let (connector, _servers) = ScriptedConnector::new(1);
	let (handler, mut notices) = RecordingHandler::new();
	let channel = TransportChannel::new(fast_config(3), connector.clone(), handler);

	channel.connect();
	assert!(matches!(next(&mut notices).await, Notice::Error(_)));
	assert_eq!(channel.reconnect_attempts(), 1);
	assert_eq!(channel.state(), ConnectionState::Disconnected);

	channel.disconnect().await;
	assert_eq!(
		next(&mut notices).await,
		Notice::Disconnected(Some("Client disconnected".to_string()))
	);

	tokio::time::sleep(Duration::from_secs(2)).await;
	assert_eq!(connector.attempts().len(), 1);
	assert!(notices.try_recv().is_err());
	assert_eq!(channel.state(), ConnectionState::Disconnected);
	assert!(!channel.is_exhausted());
}
