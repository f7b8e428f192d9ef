// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Setup link landing. Tokens travel in request bodies, never in logs.

use axum::{extract::State, http::StatusCode, Json};
use onboard_common_core::{UserId, ValidationError};
use onboard_common_secret::SecretString;
use onboard_server_api::{
	CompleteSetupRequest, CompleteSetupResponse, ErrorResponse, VerifyTokenRequest,
	VerifyTokenResponse,
};
use onboard_server_provisioning::ProvisioningError;

use crate::{api::AppState, error::ServerError};

fn token_from(raw: String) -> Result<SecretString, ServerError> {
	let token = raw.trim();
	if token.is_empty() {
		return Err(ProvisioningError::from(ValidationError::Missing("token")).into());
	}
	Ok(SecretString::from(token))
}

#[utoipa::path(
    post,
    path = "/api/setup/verify-token",
    request_body = VerifyTokenRequest,
    responses(
        (status = 200, description = "Token is valid", body = VerifyTokenResponse),
        (status = 400, description = "Missing token", body = ErrorResponse),
        (status = 404, description = "Unknown token or organization", body = ErrorResponse),
        (status = 409, description = "Token already used", body = ErrorResponse),
        (status = 410, description = "Token expired", body = ErrorResponse)
    ),
    tag = "setup"
)]
#[tracing::instrument(skip_all)]
pub async fn verify_token(
	State(state): State<AppState>,
	Json(payload): Json<VerifyTokenRequest>,
) -> Result<Json<VerifyTokenResponse>, ServerError> {
	let token = token_from(payload.token)?;
	let context = state.setup.verify_token(&token).await?;
	Ok(Json(context.into()))
}

#[utoipa::path(
    post,
    path = "/api/setup/complete",
    request_body = CompleteSetupRequest,
    responses(
        (status = 201, description = "Owner membership created", body = CompleteSetupResponse),
        (status = 400, description = "Invalid request or email mismatch", body = ErrorResponse),
        (status = 404, description = "Unknown token or organization", body = ErrorResponse),
        (status = 409, description = "Token already used or already a member", body = ErrorResponse),
        (status = 410, description = "Token expired", body = ErrorResponse)
    ),
    tag = "setup"
)]
#[tracing::instrument(skip_all)]
pub async fn complete_setup(
	State(state): State<AppState>,
	Json(payload): Json<CompleteSetupRequest>,
) -> Result<(StatusCode, Json<CompleteSetupResponse>), ServerError> {
	let token = token_from(payload.token)?;
	let user_id: UserId = payload
		.user_id
		.trim()
		.parse()
		.map_err(|_| ServerError::BadRequest("invalid user id".to_string()))?;
	if payload.email.trim().is_empty() {
		return Err(ProvisioningError::from(ValidationError::Missing("email")).into());
	}

	let membership = state
		.setup
		.complete(&token, &payload.email, user_id)
		.await?;
	Ok((StatusCode::CREATED, Json(membership.into())))
}
