// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire protocol between the generation client and server.
//!
//! Frames are JSON text. Client messages are sent bare; server events are
//! sent wrapped in an `{"event": ...}` envelope, and the decoder also accepts
//! bare events.
//!
//! # Client → server
//!
//! - `start-generation` - begin simulating a generation
//! - `cancel-generation` - stop a running generation
//!
//! # Server → client
//!
//! - `connect` / `disconnect` / `error` - connection level
//! - `generation_start` / `generation_progress` - lifecycle updates
//! - `generation_complete` / `generation_failed` - terminal outcomes

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::id::{ClientId, GenerationId};

// Error codes carried in `error` events
pub const SERVER_ERROR: &str = "SERVER_ERROR";
pub const GENERATION_ACTIVE: &str = "GENERATION_ACTIVE";

/// Current time as epoch milliseconds.
pub fn now_millis() -> i64 {
	Utc::now().timestamp_millis()
}

/// Client → server message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
	#[serde(rename = "start-generation")]
	StartGeneration(StartGeneration),

	#[serde(rename = "cancel-generation")]
	CancelGeneration(CancelGeneration),
}

impl ClientMessage {
	pub fn start(id: GenerationId, prompt: impl Into<String>) -> Self {
		ClientMessage::StartGeneration(StartGeneration {
			id,
			prompt: prompt.into(),
		})
	}

	pub fn cancel(id: GenerationId) -> Self {
		ClientMessage::CancelGeneration(CancelGeneration { id })
	}

	pub fn message_type(&self) -> &'static str {
		match self {
			ClientMessage::StartGeneration(_) => "start-generation",
			ClientMessage::CancelGeneration(_) => "cancel-generation",
		}
	}

	pub fn generation_id(&self) -> &GenerationId {
		match self {
			ClientMessage::StartGeneration(m) => &m.id,
			ClientMessage::CancelGeneration(m) => &m.id,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartGeneration {
	pub id: GenerationId,
	pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelGeneration {
	pub id: GenerationId,
}

/// Server → client event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
	Connect(ConnectData),
	Disconnect(DisconnectData),
	Error(ErrorData),
	GenerationStart(GenerationStartData),
	GenerationProgress(GenerationProgressData),
	GenerationComplete(GenerationCompleteData),
	GenerationFailed(GenerationFailedData),
}

impl ServerEvent {
	/// Returns the wire `type` of this event.
	pub fn event_type(&self) -> &'static str {
		match self {
			ServerEvent::Connect(_) => "connect",
			ServerEvent::Disconnect(_) => "disconnect",
			ServerEvent::Error(_) => "error",
			ServerEvent::GenerationStart(_) => "generation_start",
			ServerEvent::GenerationProgress(_) => "generation_progress",
			ServerEvent::GenerationComplete(_) => "generation_complete",
			ServerEvent::GenerationFailed(_) => "generation_failed",
		}
	}

	/// The generation this event refers to, if any.
	pub fn generation_id(&self) -> Option<&GenerationId> {
		match self {
			ServerEvent::Connect(_) | ServerEvent::Disconnect(_) | ServerEvent::Error(_) => None,
			ServerEvent::GenerationStart(d) => Some(&d.generation_id),
			ServerEvent::GenerationProgress(d) => Some(&d.generation_id),
			ServerEvent::GenerationComplete(d) => Some(&d.generation_id),
			ServerEvent::GenerationFailed(d) => Some(&d.generation_id),
		}
	}

	pub fn timestamp(&self) -> i64 {
		match self {
			ServerEvent::Connect(d) => d.timestamp,
			ServerEvent::Disconnect(d) => d.timestamp,
			ServerEvent::Error(d) => d.timestamp,
			ServerEvent::GenerationStart(d) => d.timestamp,
			ServerEvent::GenerationProgress(d) => d.timestamp,
			ServerEvent::GenerationComplete(d) => d.timestamp,
			ServerEvent::GenerationFailed(d) => d.timestamp,
		}
	}

	pub fn is_terminal(&self) -> bool {
		matches!(
			self,
			ServerEvent::GenerationComplete(_) | ServerEvent::GenerationFailed(_)
		)
	}

	pub fn connect(client_id: ClientId) -> Self {
		ServerEvent::Connect(ConnectData {
			client_id,
			timestamp: now_millis(),
		})
	}

	pub fn disconnect(reason: Option<String>) -> Self {
		ServerEvent::Disconnect(DisconnectData {
			reason,
			timestamp: now_millis(),
		})
	}

	pub fn error(error: impl Into<String>, message: impl Into<String>) -> Self {
		ServerEvent::Error(ErrorData {
			error: error.into(),
			message: message.into(),
			timestamp: now_millis(),
		})
	}

	pub fn generation_start(generation_id: GenerationId, prompt: impl Into<String>) -> Self {
		ServerEvent::GenerationStart(GenerationStartData {
			generation_id,
			prompt: prompt.into(),
			timestamp: now_millis(),
		})
	}

	pub fn generation_progress(
		generation_id: GenerationId,
		progress: f64,
		stage: impl Into<String>,
	) -> Self {
		ServerEvent::GenerationProgress(GenerationProgressData {
			generation_id,
			progress,
			stage: stage.into(),
			timestamp: now_millis(),
		})
	}

	pub fn generation_complete(
		generation_id: GenerationId,
		audio_url: impl Into<String>,
		duration: u32,
		waveform: Option<Vec<f32>>,
	) -> Self {
		ServerEvent::GenerationComplete(GenerationCompleteData {
			generation_id,
			audio_url: audio_url.into(),
			duration,
			waveform,
			timestamp: now_millis(),
		})
	}

	/// Failure events carry the same text in `error` and `message`.
	pub fn generation_failed(generation_id: GenerationId, message: impl Into<String>) -> Self {
		let message = message.into();
		ServerEvent::GenerationFailed(GenerationFailedData {
			generation_id,
			error: message.clone(),
			message,
			timestamp: now_millis(),
		})
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectData {
	pub client_id: ClientId,
	pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectData {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub reason: Option<String>,
	pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorData {
	pub error: String,
	pub message: String,
	pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationStartData {
	pub generation_id: GenerationId,
	pub prompt: String,
	pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationProgressData {
	pub generation_id: GenerationId,
	/// 0-100
	pub progress: f64,
	pub stage: String,
	pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationCompleteData {
	pub generation_id: GenerationId,
	pub audio_url: String,
	/// Seconds
	pub duration: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub waveform: Option<Vec<f32>>,
	pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationFailedData {
	pub generation_id: GenerationId,
	pub error: String,
	pub message: String,
	pub timestamp: i64,
}

#[derive(Serialize)]
struct OutboundEnvelope<'a> {
	event: &'a ServerEvent,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum InboundFrame {
	Envelope { event: ServerEvent },
	Bare(ServerEvent),
}

/// Encodes a server event as an enveloped text frame.
pub fn encode_server_frame(event: &ServerEvent) -> Result<String, ProtocolError> {
	serde_json::to_string(&OutboundEnvelope { event }).map_err(ProtocolError::Encode)
}

/// Decodes a server frame, enveloped or bare.
pub fn decode_server_frame(text: &str) -> Result<ServerEvent, ProtocolError> {
	match serde_json::from_str::<InboundFrame>(text).map_err(ProtocolError::Decode)? {
		InboundFrame::Envelope { event } => Ok(event),
		InboundFrame::Bare(event) => Ok(event),
	}
}

pub fn encode_client_frame(message: &ClientMessage) -> Result<String, ProtocolError> {
	serde_json::to_string(message).map_err(ProtocolError::Encode)
}

pub fn decode_client_frame(text: &str) -> Result<ClientMessage, ProtocolError> {
	serde_json::from_str(text).map_err(ProtocolError::Decode)
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_error_codes_at_crate_root() {
		let event = ServerEvent::error(crate::GENERATION_ACTIVE, "already running");
		let value: serde_json::Value =
			serde_json::from_str(&encode_server_frame(&event).unwrap()).unwrap();
		assert_eq!(value["event"]["error"], json!("GENERATION_ACTIVE"));
		assert_eq!(crate::SERVER_ERROR, "SERVER_ERROR");
	}

	#[test]
	fn test_client_message_shape() {
		let msg = ClientMessage::start(GenerationId::from("gen-1"), "Happy song");
		let value = serde_json::to_value(&msg).unwrap();
		assert_eq!(
			value,
			json!({"type": "start-generation", "id": "gen-1", "prompt": "Happy song"})
		);

		let cancel = ClientMessage::cancel(GenerationId::from("gen-1"));
		let value = serde_json::to_value(&cancel).unwrap();
		assert_eq!(value, json!({"type": "cancel-generation", "id": "gen-1"}));
	}

	#[test]
	fn test_progress_event_shape() {
		let event = ServerEvent::GenerationProgress(GenerationProgressData {
			generation_id: GenerationId::from("gen-1"),
			progress: 40.0,
			stage: "Generating melody".to_string(),
			timestamp: 1_700_000_000_000,
		});
		let value = serde_json::to_value(&event).unwrap();
		assert_eq!(
			value,
			json!({
				"type": "generation_progress",
				"generationId": "gen-1",
				"progress": 40.0,
				"stage": "Generating melody",
				"timestamp": 1_700_000_000_000i64,
			})
		);
	}

	#[test]
	fn test_disconnect_reason_is_optional() {
		let event: ServerEvent =
			serde_json::from_value(json!({"type": "disconnect", "timestamp": 5})).unwrap();
		assert_eq!(
			event,
			ServerEvent::Disconnect(DisconnectData {
				reason: None,
				timestamp: 5,
			})
		);
	}

	#[test]
	fn test_complete_without_waveform_decodes() {
		let event = decode_server_frame(
			r#"{"type":"generation_complete","generationId":"gen-9","audioUrl":"https://example.com/audio/gen-9.mp3","duration":180,"timestamp":1}"#,
		)
		.unwrap();
		match event {
			ServerEvent::GenerationComplete(data) => {
				assert_eq!(data.duration, 180);
				assert!(data.waveform.is_none());
			}
			other => panic!("unexpected event {other:?}"),
		}
	}

	#[test]
	fn test_decode_accepts_envelope_and_bare() {
		let event = ServerEvent::generation_start(GenerationId::from("gen-2"), "jazz");
		let enveloped = encode_server_frame(&event).unwrap();
		assert!(enveloped.starts_with("{\"event\":"));
		assert_eq!(decode_server_frame(&enveloped).unwrap(), event);

		let bare = serde_json::to_string(&event).unwrap();
		assert_eq!(decode_server_frame(&bare).unwrap(), event);
	}

	#[test]
	fn test_decode_rejects_malformed() {
		assert!(decode_server_frame("not json").is_err());
		assert!(decode_server_frame(r#"{"type":"generation_unknown","timestamp":1}"#).is_err());
		assert!(
			decode_server_frame(r#"{"type":"generation_progress","generationId":"g"}"#).is_err()
		);
		assert!(decode_client_frame(r#"{"type":"pause-generation","id":"g"}"#).is_err());
	}

	#[test]
	fn test_failed_event_mirrors_message() {
		let event = ServerEvent::generation_failed(GenerationId::from("gen-3"), "Server timeout");
		match &event {
			ServerEvent::GenerationFailed(data) => {
				assert_eq!(data.error, data.message);
			}
			other => panic!("unexpected event {other:?}"),
		}
		assert!(event.is_terminal());
		assert_eq!(event.generation_id().map(|id| id.as_str()), Some("gen-3"));
	}
}
