// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Server error types and HTTP response conversions.

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use onboard_common_core::PUBLIC_FAILURE_MESSAGE;
use onboard_server_api::ErrorResponse;
use onboard_server_db::DbError;
use onboard_server_payment::PaymentError;
use onboard_server_provisioning::ProvisioningError;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	#[error(transparent)]
	Provisioning(#[from] ProvisioningError),

	#[error(transparent)]
	Payment(#[from] PaymentError),

	#[error("Database error: {0}")]
	Database(#[from] DbError),

	#[error("Invalid request: {0}")]
	BadRequest(String),

	/// No usable bearer credential.
	#[error("Unauthorized")]
	Unauthorized,

	/// A payment or webhook signature did not verify.
	#[error("Invalid signature")]
	InvalidSignature,

	#[error("{0} is not configured")]
	NotConfigured(&'static str),
}

fn body(error: &str, message: impl Into<String>, correlation_id: Option<Uuid>) -> ErrorResponse {
	ErrorResponse {
		error: error.to_string(),
		message: message.into(),
		correlation_id,
	}
}

fn database_error(e: &DbError) -> (StatusCode, ErrorResponse) {
	tracing::error!(error = %e, "database error");
	(
		StatusCode::INTERNAL_SERVER_ERROR,
		body("database_error", "A database error occurred", None),
	)
}

fn provisioning_response(err: &ProvisioningError) -> (StatusCode, ErrorResponse) {
	match err {
		ProvisioningError::Validation(e) => (
			StatusCode::BAD_REQUEST,
			body("validation_error", e.to_string(), None),
		),
		ProvisioningError::NotFound(what) => (
			StatusCode::NOT_FOUND,
			body("not_found", format!("{what} not found"), None),
		),
		ProvisioningError::Expired => (
			StatusCode::GONE,
			body("expired", "This link has expired", None),
		),
		ProvisioningError::AlreadyUsed => (
			StatusCode::CONFLICT,
			body("already_used", "This link has already been used", None),
		),
		ProvisioningError::Duplicate { existing } => (
			StatusCode::CONFLICT,
			body(
				"duplicate",
				format!("An onboarding request for this payment already exists: {existing}"),
				None,
			),
		),
		ProvisioningError::InvalidTransition { from } => (
			StatusCode::CONFLICT,
			body(
				"invalid_transition",
				format!("Cannot advance a request in status {from}"),
				None,
			),
		),
		ProvisioningError::AlreadyMember => (
			StatusCode::CONFLICT,
			body("already_member", "Already a member of this organization", None),
		),
		ProvisioningError::Upstream {
			step,
			correlation_id,
			message,
		} => {
			tracing::warn!(%step, %correlation_id, error = %message, "upstream error");
			(
				StatusCode::BAD_GATEWAY,
				body("upstream_error", PUBLIC_FAILURE_MESSAGE, Some(*correlation_id)),
			)
		}
		ProvisioningError::Timeout {
			step,
			correlation_id,
		} => {
			tracing::warn!(%step, %correlation_id, "upstream timeout");
			(
				StatusCode::GATEWAY_TIMEOUT,
				body("upstream_timeout", PUBLIC_FAILURE_MESSAGE, Some(*correlation_id)),
			)
		}
		ProvisioningError::PaymentGateway {
			correlation_id,
			timed_out,
			message,
		} => {
			tracing::warn!(%correlation_id, error = %message, "payment processor error");
			if *timed_out {
				(
					StatusCode::GATEWAY_TIMEOUT,
					body("upstream_timeout", PUBLIC_FAILURE_MESSAGE, Some(*correlation_id)),
				)
			} else {
				(
					StatusCode::BAD_GATEWAY,
					body("upstream_error", PUBLIC_FAILURE_MESSAGE, Some(*correlation_id)),
				)
			}
		}
		ProvisioningError::NotConfigured(what) => {
			tracing::warn!(component = what, "request needs an unconfigured component");
			(
				StatusCode::SERVICE_UNAVAILABLE,
				body("service_unavailable", format!("{what} is not configured"), None),
			)
		}
		ProvisioningError::Forbidden { .. } => (
			StatusCode::FORBIDDEN,
			body("forbidden", "Not allowed", None),
		),
		ProvisioningError::Database(e) => database_error(e),
	}
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		let (status, error_response) = match &self {
			ServerError::Provisioning(e) => provisioning_response(e),
			ServerError::Payment(e) => (
				StatusCode::BAD_REQUEST,
				body("bad_request", e.to_string(), None),
			),
			ServerError::Database(e) => database_error(e),
			ServerError::BadRequest(msg) => (
				StatusCode::BAD_REQUEST,
				body("bad_request", msg.clone(), None),
			),
			ServerError::Unauthorized => (
				StatusCode::UNAUTHORIZED,
				body("unauthorized", "Authentication required", None),
			),
			ServerError::InvalidSignature => (
				StatusCode::UNAUTHORIZED,
				body("invalid_signature", "Signature verification failed", None),
			),
			ServerError::NotConfigured(what) => {
				tracing::warn!(component = what, "request needs an unconfigured component");
				(
					StatusCode::SERVICE_UNAVAILABLE,
					body(
						"service_unavailable",
						format!("{what} is not configured"),
						None,
					),
				)
			}
		};

		(status, Json(error_response)).into_response()
	}
}
