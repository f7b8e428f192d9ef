// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use onboard_common_core::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
	#[error("missing required field: {0}")]
	MissingField(&'static str),

	#[error("malformed webhook payload: {0}")]
	MalformedPayload(#[from] serde_json::Error),

	#[error("amount paid ({actual}) is below the plan price ({expected})")]
	AmountMismatch { expected: u64, actual: u64 },

	#[error(transparent)]
	Validation(#[from] ValidationError),

	#[error("payment is for order {actual}, not {expected}")]
	OrderMismatch { expected: String, actual: String },

	#[error("HMAC key was rejected")]
	InvalidKey,
}
