// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use cadence_client::{ClientConfig, GenerationClient};
use cadence_config::CadenceConfig;
use cadence_core::{GenerationId, GenerationSession, GenerationStatus, ServerEvent};
use cadence_sim::LocalConnector;
use tokio::sync::mpsc;
use tracing::{info, instrument};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct GenerateOptions {
	pub prompts: Vec<String>,
	pub cancel_after: Option<Duration>,
	pub json: bool,
}

/// Runs every prompt to a terminal state against the in-process simulator.
#[instrument(skip_all, fields(prompts = options.prompts.len()))]
pub async fn run(config: &CadenceConfig, options: GenerateOptions) -> Result<()> {
	let simulation = config
		.simulation
		.to_simulation_config()
		.context("invalid simulation settings")?;
	let connector = Arc::new(LocalConnector::new(simulation)?);
	let client = GenerationClient::init(
		connector,
		ClientConfig {
			transport: config.transport.to_transport_config(),
		},
	);

	let (tx, mut events) = mpsc::unbounded_channel();
	let subscription = client.subscribe(move |event| {
		let _ = tx.send(event.clone());
	});

	tokio::time::timeout(CONNECT_TIMEOUT, wait_for_connect(&mut events))
		.await
		.context("timed out connecting to the simulator")??;

	let ids: Vec<GenerationId> = options
		.prompts
		.iter()
		.map(|prompt| client.generate(prompt.as_str()))
		.collect();

	let cancel_timer = async {
		match options.cancel_after {
			Some(delay) => tokio::time::sleep(delay).await,
			None => std::future::pending().await,
		}
	};
	tokio::pin!(cancel_timer);
	let mut cancel_pending = options.cancel_after.is_some();

	while !all_terminal(&client, &ids) {
		tokio::select! {
			event = events.recv() => match event {
				Some(event) => println!("{}", describe(&event)),
				None => bail!("event stream ended unexpectedly"),
			},
			_ = &mut cancel_timer, if cancel_pending => {
				cancel_pending = false;
				let cancelled = ids.iter().filter(|id| client.cancel_generation(id)).count();
				info!(cancelled, "Cancel timer fired");
			}
		}
	}

	while let Ok(event) = events.try_recv() {
		println!("{}", describe(&event));
	}
	client.unsubscribe(subscription);

	let sessions: Vec<GenerationSession> = ids.iter().filter_map(|id| client.session(id)).collect();
	client.shutdown().await;

	if options.json {
		println!("{}", serde_json::to_string_pretty(&sessions)?);
	} else {
		println!();
		for session in &sessions {
			println!("{}", summarize(session));
		}
	}
	Ok(())
}

async fn wait_for_connect(events: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Result<()> {
	while let Some(event) = events.recv().await {
		let connected = matches!(event, ServerEvent::Connect(_));
		println!("{}", describe(&event));
		if connected {
			return Ok(());
		}
	}
	bail!("event stream ended before connecting")
}

fn all_terminal(client: &GenerationClient, ids: &[GenerationId]) -> bool {
	ids.iter().all(|id| {
		client
			.session(id)
			.map(|session| session.is_terminal())
			.unwrap_or(true)
	})
}

/// One line per event.
pub fn describe(event: &ServerEvent) -> String {
	match event {
		ServerEvent::Connect(data) => format!("connected as {}", data.client_id),
		ServerEvent::Disconnect(data) => match &data.reason {
			Some(reason) => format!("disconnected: {reason}"),
			None => "disconnected".to_string(),
		},
		ServerEvent::Error(data) => format!("server error {}: {}", data.error, data.message),
		ServerEvent::GenerationStart(data) => {
			format!("[{}] started: {:?}", data.generation_id, data.prompt)
		}
		ServerEvent::GenerationProgress(data) => {
			format!(
				"[{}] {:>5.1}% {}",
				data.generation_id, data.progress, data.stage
			)
		}
		ServerEvent::GenerationComplete(data) => format!(
			"[{}] completed: {} ({}s)",
			data.generation_id, data.audio_url, data.duration
		),
		ServerEvent::GenerationFailed(data) => {
			format!("[{}] failed: {}", data.generation_id, data.message)
		}
	}
}

/// Final one-line state of a session.
pub fn summarize(session: &GenerationSession) -> String {
	let detail = match session.status {
		GenerationStatus::Completed => format!(
			"{} ({}s)",
			session.audio_url.as_deref().unwrap_or("-"),
			session.result_duration.unwrap_or_default()
		),
		GenerationStatus::Failed => session.error_message.clone().unwrap_or_default(),
		GenerationStatus::Queued | GenerationStatus::Generating => session
			.stage
			.clone()
			.unwrap_or_else(|| "waiting".to_string()),
	};
	let tags = if session.tags.is_empty() {
		String::new()
	} else {
		format!(" [{}]", session.tags.join(", "))
	};
	format!(
		"{}  {:<10} {}{}",
		session.id,
		session.status.to_string(),
		detail,
		tags
	)
}
