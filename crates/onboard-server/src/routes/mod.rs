// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP route handlers organized by concern.

pub mod admin;
pub mod docs;
pub mod health;
pub mod onboarding;
pub mod payment;
pub mod setup;

use onboard_common_core::RequestId;

use crate::error::ServerError;

pub(crate) fn parse_request_id(raw: &str) -> Result<RequestId, ServerError> {
	raw
		.parse()
		.map_err(|_| ServerError::BadRequest(format!("invalid request id: {raw}")))
}
