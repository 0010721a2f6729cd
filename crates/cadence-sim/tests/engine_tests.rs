// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use cadence_core::{
	encode_client_frame, ClientMessage, GenerationId, ServerEvent, CANCELLED_MESSAGE,
	GENERATION_ACTIVE, SERVER_ERROR,
};
use cadence_sim::{SimulationConfig, SimulationEngine, DEFAULT_FAILURE_REASONS, INVALID_MESSAGE};
use tokio::sync::mpsc;
use tokio::time::Instant;

fn config(stages: &[&str], success_probability: f64) -> SimulationConfig {
	SimulationConfig::default()
		.with_stages(stages.iter().copied())
		.with_step_interval(Duration::from_millis(10))
		.with_success_probability(success_probability)
}

fn engine(config: SimulationConfig) -> (SimulationEngine, mpsc::UnboundedReceiver<ServerEvent>) {
	let (tx, rx) = mpsc::unbounded_channel();
	(SimulationEngine::new(config, tx).unwrap(), rx)
}

async fn next(events: &mut mpsc::UnboundedReceiver<ServerEvent>) -> ServerEvent {
	tokio::time::timeout(Duration::from_secs(5), events.recv())
		.await
		.expect("timed out waiting for an event")
		.expect("engine dropped")
}

/// Collects events for `id` up to and including its terminal event.
async fn run_to_end(
	events: &mut mpsc::UnboundedReceiver<ServerEvent>,
	id: &GenerationId,
) -> Vec<ServerEvent> {
	let mut seen = Vec::new();
	loop {
		let event = next(events).await;
		if event.generation_id() != Some(id) {
			continue;
		}
		let terminal = event.is_terminal();
		seen.push(event);
		if terminal {
			return seen;
		}
	}
}

#[tokio::test(start_paused = true)]
async fn progress_rises_through_every_stage() {
	let stages = ["a", "b", "c", "d", "e"];
	let (engine, mut events) = engine(config(&stages, 1.0));
	let id = GenerationId::from("gen-1");

	engine.start(id.clone(), "upbeat jazz".to_string());
	let seen = run_to_end(&mut events, &id).await;

	assert!(matches!(seen[0], ServerEvent::GenerationStart(_)));
	let progress: Vec<(f64, String)> = seen
		.iter()
		.filter_map(|event| match event {
			ServerEvent::GenerationProgress(data) => Some((data.progress, data.stage.clone())),
			_ => None,
		})
		.collect();
	assert_eq!(
		progress,
		vec![
			(20.0, "a".to_string()),
			(40.0, "b".to_string()),
			(60.0, "c".to_string()),
			(80.0, "d".to_string()),
			(100.0, "e".to_string()),
		]
	);
	assert!(matches!(seen.last(), Some(ServerEvent::GenerationComplete(_))));
	assert_eq!(seen.iter().filter(|e| e.is_terminal()).count(), 1);
}

#[tokio::test(start_paused = true)]
async fn stages_follow_the_step_interval() {
	let (engine, mut events) = engine(config(&["step1", "step2"], 1.0));
	let id = GenerationId::from("gen-timing");
	let started = Instant::now();

	engine.start(id.clone(), "Create a happy song".to_string());
	let mut stamps = Vec::new();
	for _ in 0..4 {
		next(&mut events).await;
		stamps.push(started.elapsed());
	}

	assert_eq!(stamps[0], Duration::ZERO);
	assert!(stamps[1] >= Duration::from_millis(10));
	assert!(stamps[2] >= Duration::from_millis(20));
	assert!(stamps[3] >= Duration::from_millis(30));
}

#[tokio::test(start_paused = true)]
async fn certain_success_stays_within_duration_bounds() {
	let (engine, mut events) = engine(config(&["only"], 1.0));

	for n in 0..100 {
		let id = GenerationId::from(format!("gen-{n}"));
		engine.start(id.clone(), "relaxing ambient".to_string());
		let seen = run_to_end(&mut events, &id).await;
		match seen.last() {
			Some(ServerEvent::GenerationComplete(data)) => {
				assert!((60..=240).contains(&data.duration), "duration {}", data.duration);
				assert_eq!(data.audio_url, format!("https://example.com/audio/{id}.mp3"));
				assert_eq!(data.waveform.as_ref().map(Vec::len), Some(100));
			}
			other => panic!("expected completion, got {other:?}"),
		}
	}
}

#[tokio::test(start_paused = true)]
async fn certain_failure_uses_canned_reasons() {
	let (engine, mut events) = engine(config(&["only"], 0.0));

	for n in 0..20 {
		let id = GenerationId::from(format!("gen-{n}"));
		engine.start(id.clone(), "rock".to_string());
		let seen = run_to_end(&mut events, &id).await;
		match seen.last() {
			Some(ServerEvent::GenerationFailed(data)) => {
				assert!(DEFAULT_FAILURE_REASONS.contains(&data.message.as_str()));
				assert_eq!(data.error, data.message);
			}
			other => panic!("expected failure, got {other:?}"),
		}
	}
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_further_events() {
	let (engine, mut events) = engine(config(&["a", "b", "c"], 1.0));
	let id = GenerationId::from("gen-cancel");

	engine.start(id.clone(), "classical".to_string());
	assert!(matches!(next(&mut events).await, ServerEvent::GenerationStart(_)));
	assert!(matches!(
		next(&mut events).await,
		ServerEvent::GenerationProgress(_)
	));

	assert!(engine.cancel(&id));
	match next(&mut events).await {
		ServerEvent::GenerationFailed(data) => {
			assert_eq!(data.generation_id, id);
			assert_eq!(data.message, CANCELLED_MESSAGE);
		}
		other => panic!("expected cancellation, got {other:?}"),
	}

	tokio::time::sleep(Duration::from_secs(1)).await;
	assert!(events.try_recv().is_err());
	assert!(!engine.is_active(&id));
	assert!(!engine.cancel(&id));
}

#[tokio::test(start_paused = true)]
async fn cancel_of_unknown_id_is_silent() {
	let (engine, mut events) = engine(config(&["a"], 1.0));
	assert!(!engine.cancel(&GenerationId::from("nope")));
	tokio::time::sleep(Duration::from_millis(100)).await;
	assert!(events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn duplicate_start_is_rejected() {
	let (engine, mut events) = engine(config(&["a", "b"], 1.0));
	let id = GenerationId::from("gen-dup");

	assert!(engine.start(id.clone(), "pop".to_string()));
	assert!(matches!(next(&mut events).await, ServerEvent::GenerationStart(_)));
	assert!(!engine.start(id.clone(), "pop".to_string()));

	match next(&mut events).await {
		ServerEvent::Error(data) => assert_eq!(data.error, GENERATION_ACTIVE),
		other => panic!("expected error, got {other:?}"),
	}

	let rest = run_to_end(&mut events, &id).await;
	assert_eq!(
		rest.iter()
			.filter(|e| matches!(e, ServerEvent::GenerationProgress(_)))
			.count(),
		2
	);
}

#[tokio::test(start_paused = true)]
async fn malformed_frame_yields_server_error() {
	let (engine, mut events) = engine(config(&["a"], 1.0));

	engine.handle_frame("{\"type\":\"start-generation\"");
	match next(&mut events).await {
		ServerEvent::Error(data) => {
			assert_eq!(data.error, SERVER_ERROR);
			assert_eq!(data.message, INVALID_MESSAGE);
		}
		other => panic!("expected error, got {other:?}"),
	}
}

#[tokio::test(start_paused = true)]
async fn frames_drive_start_and_cancel() {
	let (engine, mut events) = engine(config(&["a", "b"], 1.0));
	let id = GenerationId::from("gen-frame");

	let start = encode_client_frame(&ClientMessage::start(id.clone(), "electronic")).unwrap();
	engine.handle_frame(&start);
	assert!(matches!(next(&mut events).await, ServerEvent::GenerationStart(_)));

	let cancel = encode_client_frame(&ClientMessage::cancel(id.clone())).unwrap();
	engine.handle_frame(&cancel);
	assert!(matches!(
		next(&mut events).await,
		ServerEvent::GenerationFailed(_)
	));
}

#[tokio::test(start_paused = true)]
async fn cancel_all_is_silent_and_total() {
	let (engine, mut events) = engine(config(&["a", "b"], 1.0));
	for n in 0..3 {
		engine.start(GenerationId::from(format!("gen-{n}")), "jazz".to_string());
	}
	for _ in 0..3 {
		next(&mut events).await;
	}

	assert_eq!(engine.cancel_all(), 3);
	assert_eq!(engine.active_count(), 0);
	tokio::time::sleep(Duration::from_secs(1)).await;
	assert!(events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn seeded_engines_agree() {
	async fn outcome(seed: u64) -> ServerEvent {
		let (engine, mut events) = engine(config(&["a"], 0.5).with_seed(seed));
		let id = GenerationId::from("gen-seeded");
		engine.start(id.clone(), "melancholic".to_string());
		let mut seen = run_to_end(&mut events, &id).await;
		seen.pop().unwrap()
	}

	fn strip(event: ServerEvent) -> ServerEvent {
		match event {
			ServerEvent::GenerationComplete(mut data) => {
				data.timestamp = 0;
				ServerEvent::GenerationComplete(data)
			}
			ServerEvent::GenerationFailed(mut data) => {
				data.timestamp = 0;
				ServerEvent::GenerationFailed(data)
			}
			other => other,
		}
	}

	assert_eq!(strip(outcome(42).await), strip(outcome(42).await));
}
