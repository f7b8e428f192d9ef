// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Admin control surface for onboarding requests.

use axum::{
	extract::{Path, Query, State},
	Json,
};
use onboard_server_api::{
	AdminRequestResponse, ErrorResponse, ListPaymentsResponse, ListRequestsParams,
	ListRequestsResponse, ResendEmailResponse,
};

use crate::{
	api::AppState, auth_middleware::RequireAdmin, error::ServerError, routes::parse_request_id,
};

#[utoipa::path(
    get,
    path = "/api/admin/onboarding",
    params(ListRequestsParams),
    responses(
        (status = 200, description = "Newest requests first, at most 200", body = ListRequestsResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not authorized", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
#[tracing::instrument(skip(state, principal), fields(subject = %principal.subject))]
pub async fn list_requests(
	State(state): State<AppState>,
	RequireAdmin(principal): RequireAdmin,
	Query(params): Query<ListRequestsParams>,
) -> Result<Json<ListRequestsResponse>, ServerError> {
	let requests = state.admin.list(&principal, params.limit).await?;
	Ok(Json(requests.into()))
}

#[utoipa::path(
    get,
    path = "/api/admin/onboarding/{id}",
    params(
        ("id" = String, Path, description = "Onboarding request ID")
    ),
    responses(
        (status = 200, description = "Request details", body = AdminRequestResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not authorized", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
#[tracing::instrument(skip(state, principal), fields(subject = %principal.subject))]
pub async fn get_request(
	State(state): State<AppState>,
	RequireAdmin(principal): RequireAdmin,
	Path(id): Path<String>,
) -> Result<Json<AdminRequestResponse>, ServerError> {
	let id = parse_request_id(&id)?;
	let view = state.admin.view(&principal, &id).await?;
	Ok(Json(view.into()))
}

#[utoipa::path(
    post,
    path = "/api/admin/onboarding/{id}/advance",
    params(
        ("id" = String, Path, description = "Onboarding request ID")
    ),
    responses(
        (status = 200, description = "Provisioning completed", body = AdminRequestResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not authorized", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse),
        (status = 409, description = "Request is not pending", body = ErrorResponse),
        (status = 502, description = "A provisioning step failed", body = ErrorResponse),
        (status = 504, description = "A provisioning step timed out", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
#[tracing::instrument(skip(state, principal), fields(subject = %principal.subject))]
pub async fn advance_request(
	State(state): State<AppState>,
	RequireAdmin(principal): RequireAdmin,
	Path(id): Path<String>,
) -> Result<Json<AdminRequestResponse>, ServerError> {
	let id = parse_request_id(&id)?;
	let view = state.admin.advance(&principal, &id).await?;
	Ok(Json(view.into()))
}

#[utoipa::path(
    post,
    path = "/api/admin/onboarding/{id}/reset",
    params(
        ("id" = String, Path, description = "Onboarding request ID")
    ),
    responses(
        (status = 200, description = "Request is pending", body = AdminRequestResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not authorized", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
#[tracing::instrument(skip(state, principal), fields(subject = %principal.subject))]
pub async fn reset_request(
	State(state): State<AppState>,
	RequireAdmin(principal): RequireAdmin,
	Path(id): Path<String>,
) -> Result<Json<AdminRequestResponse>, ServerError> {
	let id = parse_request_id(&id)?;
	let view = state.admin.reset(&principal, &id).await?;
	Ok(Json(view.into()))
}

#[utoipa::path(
    post,
    path = "/api/admin/onboarding/{id}/resend-email",
    params(
        ("id" = String, Path, description = "Onboarding request ID")
    ),
    responses(
        (status = 200, description = "Setup email sent again", body = ResendEmailResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not authorized", body = ErrorResponse),
        (status = 404, description = "Request, organization or unused link not found", body = ErrorResponse),
        (status = 410, description = "Latest link has expired", body = ErrorResponse),
        (status = 502, description = "Email delivery failed", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
#[tracing::instrument(skip(state, principal), fields(subject = %principal.subject))]
pub async fn resend_email(
	State(state): State<AppState>,
	RequireAdmin(principal): RequireAdmin,
	Path(id): Path<String>,
) -> Result<Json<ResendEmailResponse>, ServerError> {
	let id = parse_request_id(&id)?;
	let receipt = state.admin.resend_email(&principal, &id).await?;
	Ok(Json(ResendEmailResponse {
		sent: true,
		email: receipt.email,
		link_expires_at: receipt.expires_at,
	}))
}

#[utoipa::path(
    get,
    path = "/api/admin/payments",
    params(ListRequestsParams),
    responses(
        (status = 200, description = "Newest checkout orders first, at most 200", body = ListPaymentsResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not authorized", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
#[tracing::instrument(skip(state, principal), fields(subject = %principal.subject))]
pub async fn list_payments(
	State(state): State<AppState>,
	RequireAdmin(principal): RequireAdmin,
	Query(params): Query<ListRequestsParams>,
) -> Result<Json<ListPaymentsResponse>, ServerError> {
	let orders = state.orders.list(&principal, params.limit).await?;
	Ok(Json(orders.into()))
}
