// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use onboard_server_api::HealthResponse;
use std::time::Duration;
use tokio::time::timeout;

use crate::api::AppState;

const DATABASE_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Server and database are reachable", body = HealthResponse),
        (status = 503, description = "Database is unreachable", body = HealthResponse)
    ),
    tag = "health"
)]
/// GET /health - Liveness plus a database round trip.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
	let database_ok = matches!(
		timeout(
			DATABASE_CHECK_TIMEOUT,
			sqlx::query("SELECT 1").execute(&state.pool)
		)
		.await,
		Ok(Ok(_))
	);

	let (status, label, database) = if database_ok {
		(StatusCode::OK, "healthy", "ok")
	} else {
		tracing::warn!("health check: database unreachable");
		(StatusCode::SERVICE_UNAVAILABLE, "unhealthy", "unavailable")
	};

	(
		status,
		Json(HealthResponse {
			status: label.to_string(),
			database: database.to_string(),
			version: env!("CARGO_PKG_VERSION").to_string(),
		}),
	)
}
