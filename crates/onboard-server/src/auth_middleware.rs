// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bearer authentication for admin routes.
//!
//! The extractor only establishes *who* is calling. Whether that principal
//! may perform a given action is decided by
//! [`onboard_server_auth::is_allowed`] inside the admin service, so a known
//! principal without the right role gets 403 rather than 401.
//!
//! ```ignore
//! async fn handler(RequireAdmin(principal): RequireAdmin) -> impl IntoResponse {
//!     format!("Hello, {}!", principal.subject)
//! }
//! ```

use axum::{
	extract::FromRequestParts,
	http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use onboard_common_secret::SecretString;
use onboard_server_auth::Principal;
use tracing::instrument;

use crate::{api::AppState, error::ServerError};

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<SecretString> {
	let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
	let (scheme, token) = value.split_once(' ')?;
	if !scheme.eq_ignore_ascii_case("bearer") {
		return None;
	}
	let token = token.trim();
	if token.is_empty() {
		return None;
	}
	Some(SecretString::from(token))
}

/// Extractor that requires a configured admin credential.
pub struct RequireAdmin(pub Principal);

impl FromRequestParts<AppState> for RequireAdmin {
	type Rejection = ServerError;

	#[instrument(name = "RequireAdmin::from_request_parts", skip_all)]
	async fn from_request_parts(
		parts: &mut Parts,
		state: &AppState,
	) -> Result<Self, Self::Rejection> {
		let Some(token) = extract_bearer_token(&parts.headers) else {
			tracing::warn!(
				target: "onboard::security",
				path = %parts.uri.path(),
				"admin request without bearer credential"
			);
			return Err(ServerError::Unauthorized);
		};

		match state.credentials.authenticate(&token) {
			Some(principal) => {
				tracing::debug!(subject = %principal.subject, "admin authenticated");
				Ok(RequireAdmin(principal))
			}
			None => {
				tracing::warn!(
					target: "onboard::security",
					path = %parts.uri.path(),
					"admin request with unknown credential"
				);
				Err(ServerError::Unauthorized)
			}
		}
	}
}
