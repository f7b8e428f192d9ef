// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant onboarding server binary.

use std::path::PathBuf;

use axum::http::HeaderValue;
use clap::{Parser, Subcommand};
use onboard_server::{create_app_state, create_router};
use onboard_server_config::{LogFormat, ServerConfig};
use tower_http::{
	cors::{Any, CorsLayer},
	trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod version;

/// Onboard server - tenant onboarding and provisioning.
#[derive(Parser, Debug)]
#[command(name = "onboard-server", about = "Tenant onboarding server", version)]
struct Args {
	/// Config file; defaults to /etc/onboard/server.toml when present.
	#[arg(long, env = "ONBOARD_SERVER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Run the HTTP server (default)
	Serve,
	/// Show version and build information
	Version,
}

fn init_tracing(config: &ServerConfig) {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| config.logging.level.clone().into());
	let registry = tracing_subscriber::registry().with(filter);

	match config.logging.format {
		LogFormat::Json => registry
			.with(tracing_subscriber::fmt::layer().json())
			.init(),
		LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
	}
}

fn cors_layer(origins: &[String]) -> CorsLayer {
	if origins.is_empty() {
		return CorsLayer::new()
			.allow_origin(Any)
			.allow_methods(Any)
			.allow_headers(Any);
	}

	let origins: Vec<HeaderValue> = origins
		.iter()
		.filter_map(|origin| match origin.parse() {
			Ok(value) => Some(value),
			Err(_) => {
				tracing::warn!(%origin, "ignoring invalid CORS origin");
				None
			}
		})
		.collect();
	CorsLayer::new()
		.allow_origin(origins)
		.allow_methods(Any)
		.allow_headers(Any)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("{}", version::format_version_info());
		return Ok(());
	}

	// Load .env file if present
	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => onboard_server_config::load_config_with_file(path)?,
		None => onboard_server_config::load_config()?,
	};

	init_tracing(&config);

	tracing::info!(
		environment = %config.environment,
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		"starting onboard-server"
	);

	let pool = onboard_server_db::create_pool(&config.database.url).await?;
	onboard_server_db::run_migrations(&pool).await?;

	let state = create_app_state(pool, &config).await;

	let app = create_router(state)
		.layer(TraceLayer::new_for_http())
		.layer(cors_layer(&config.http.cors_origins));

	let addr = config.socket_addr();
	tracing::info!("listening on {}", addr);

	let listener = tokio::net::TcpListener::bind(&addr).await?;

	tokio::select! {
		result = axum::serve(listener, app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "Server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Received shutdown signal");
		}
	}

	tracing::info!("Server shutdown complete");
	Ok(())
}
