// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{
	extract::{Path, State},
	http::StatusCode,
	Json,
};
use onboard_server_api::{
	CreateOnboardingRequest, CreateOnboardingResponse, ErrorResponse, OnboardingStatusResponse,
};

use crate::{api::AppState, error::ServerError, routes::parse_request_id};

#[utoipa::path(
    post,
    path = "/api/onboarding",
    request_body = CreateOnboardingRequest,
    responses(
        (status = 201, description = "Onboarding request created", body = CreateOnboardingResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "onboarding"
)]
#[tracing::instrument(skip_all)]
pub async fn create_onboarding_request(
	State(state): State<AppState>,
	Json(payload): Json<CreateOnboardingRequest>,
) -> Result<(StatusCode, Json<CreateOnboardingResponse>), ServerError> {
	let request = state.orchestrator.create_request(payload.into()).await?;
	Ok((
		StatusCode::CREATED,
		Json(CreateOnboardingResponse::from(&request)),
	))
}

#[utoipa::path(
    get,
    path = "/api/onboarding/{id}/status",
    params(
        ("id" = String, Path, description = "Onboarding request ID")
    ),
    responses(
        (status = 200, description = "Current status", body = OnboardingStatusResponse),
        (status = 400, description = "Invalid request ID", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse)
    ),
    tag = "onboarding"
)]
#[tracing::instrument(skip(state))]
pub async fn get_onboarding_status(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<OnboardingStatusResponse>, ServerError> {
	let id = parse_request_id(&id)?;
	let status = state.orchestrator.get_status(&id).await?;
	Ok(Json(status.into()))
}
