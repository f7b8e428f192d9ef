// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use onboard_common_core::{OnboardingStatus, ProvisioningStep, RequestId, ValidationError};
use onboard_server_auth::AdminAction;
use onboard_server_db::DbError;
use onboard_server_magiclink::MagicLinkError;
use onboard_server_payment::OrderError;
use uuid::Uuid;

/// Errors surfaced by the onboarding services.
///
/// `Upstream` and `Timeout` carry the correlation id that was logged and
/// recorded in the request metadata; their `message` is for operators only.
#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
	#[error(transparent)]
	Validation(#[from] ValidationError),

	#[error("{0} not found")]
	NotFound(&'static str),

	#[error("magic link has expired")]
	Expired,

	#[error("magic link has already been used")]
	AlreadyUsed,

	#[error("an onboarding request for this payment already exists: {existing}")]
	Duplicate { existing: RequestId },

	#[error("cannot advance a request in status {from}")]
	InvalidTransition { from: OnboardingStatus },

	#[error("user is already a member of this organization")]
	AlreadyMember,

	#[error("{step} failed ({correlation_id}): {message}")]
	Upstream {
		step: ProvisioningStep,
		correlation_id: Uuid,
		message: String,
	},

	#[error("{step} timed out ({correlation_id})")]
	Timeout {
		step: ProvisioningStep,
		correlation_id: Uuid,
	},

	/// The payment processor failed to create a checkout order.
	#[error("payment processor call failed ({correlation_id}): {message}")]
	PaymentGateway {
		correlation_id: Uuid,
		timed_out: bool,
		message: String,
	},

	#[error("{0} is not configured")]
	NotConfigured(&'static str),

	#[error("not allowed to {action:?}")]
	Forbidden { action: AdminAction },

	#[error("database error: {0}")]
	Database(#[from] DbError),
}

impl From<MagicLinkError> for ProvisioningError {
	fn from(err: MagicLinkError) -> Self {
		match err {
			MagicLinkError::NotFound => ProvisioningError::NotFound("magic link"),
			MagicLinkError::Expired => ProvisioningError::Expired,
			MagicLinkError::AlreadyUsed => ProvisioningError::AlreadyUsed,
		}
	}
}

impl From<OrderError> for ProvisioningError {
	fn from(err: OrderError) -> Self {
		match err {
			OrderError::NotConfigured => ProvisioningError::NotConfigured("payment processor"),
			other => {
				let correlation_id = Uuid::new_v4();
				tracing::error!(%correlation_id, error = %other, "checkout order creation failed");
				ProvisioningError::PaymentGateway {
					correlation_id,
					timed_out: matches!(other, OrderError::Timeout),
					message: other.to_string(),
				}
			}
		}
	}
}

pub type Result<T> = std::result::Result<T, ProvisioningError>;
