// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Onboarding requests and their status state machine.
//!
//! ```text
//! pending ──> provisioning ──> completed
//!    ^              │
//!    │              └────────> failed
//!    └──────── admin reset ──────┘
//! ```
//!
//! Reset is the only way back to `pending`; it is applied by the admin
//! surface and is not a state machine transition.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::ids::RequestId;
use crate::metadata::ProvisioningMetadata;

/// Upper bound for every free-text field on a request.
pub const MAX_FIELD_LEN: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum OnboardingStatus {
	Pending,
	Provisioning,
	Completed,
	Failed,
}

impl OnboardingStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			OnboardingStatus::Pending => "pending",
			OnboardingStatus::Provisioning => "provisioning",
			OnboardingStatus::Completed => "completed",
			OnboardingStatus::Failed => "failed",
		}
	}

	/// Whether the orchestrator may move a request from `self` to `next`.
	pub fn can_transition_to(self, next: OnboardingStatus) -> bool {
		matches!(
			(self, next),
			(OnboardingStatus::Pending, OnboardingStatus::Provisioning)
				| (OnboardingStatus::Provisioning, OnboardingStatus::Completed)
				| (OnboardingStatus::Provisioning, OnboardingStatus::Failed)
		)
	}

	pub fn is_terminal(self) -> bool {
		matches!(self, OnboardingStatus::Completed | OnboardingStatus::Failed)
	}
}

impl fmt::Display for OnboardingStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for OnboardingStatus {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"pending" => Ok(OnboardingStatus::Pending),
			"provisioning" => Ok(OnboardingStatus::Provisioning),
			"completed" => Ok(OnboardingStatus::Completed),
			"failed" => Ok(OnboardingStatus::Failed),
			other => Err(ValidationError::Invalid {
				field: "status",
				value: other.to_string(),
			}),
		}
	}
}

/// Subscription plan purchased at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Plan {
	Free,
	#[default]
	Standard,
	Premium,
}

impl Plan {
	pub fn as_str(&self) -> &'static str {
		match self {
			Plan::Free => "free",
			Plan::Standard => "standard",
			Plan::Premium => "premium",
		}
	}

	/// Name shown on checkout and in order descriptions.
	pub fn display_name(&self) -> &'static str {
		match self {
			Plan::Free => "Free (Test)",
			Plan::Standard => "Standard",
			Plan::Premium => "Premium",
		}
	}

	/// Price in minor currency units (paise).
	pub fn price_minor(&self, cycle: BillingCycle) -> u64 {
		match (self, cycle) {
			(Plan::Free, _) => 100,
			(Plan::Standard, BillingCycle::Monthly) => 99_900,
			(Plan::Standard, BillingCycle::Yearly) => 999_000,
			(Plan::Premium, BillingCycle::Monthly) => 299_900,
			(Plan::Premium, BillingCycle::Yearly) => 2_999_000,
		}
	}
}

impl fmt::Display for Plan {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Plan {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"free" => Ok(Plan::Free),
			"standard" => Ok(Plan::Standard),
			"premium" => Ok(Plan::Premium),
			_ => Err(ValidationError::Invalid {
				field: "plan",
				value: s.to_string(),
			}),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
	#[default]
	Monthly,
	Yearly,
}

impl BillingCycle {
	pub fn as_str(&self) -> &'static str {
		match self {
			BillingCycle::Monthly => "monthly",
			BillingCycle::Yearly => "yearly",
		}
	}

	pub fn subscription_days(&self) -> i64 {
		match self {
			BillingCycle::Monthly => 30,
			BillingCycle::Yearly => 365,
		}
	}
}

impl fmt::Display for BillingCycle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for BillingCycle {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"monthly" => Ok(BillingCycle::Monthly),
			"yearly" => Ok(BillingCycle::Yearly),
			_ => Err(ValidationError::Invalid {
				field: "billing_cycle",
				value: s.to_string(),
			}),
		}
	}
}

/// Caller-supplied fields for a new onboarding request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewOnboardingRequest {
	pub agency_name: String,
	pub admin_email: String,
	pub admin_name: Option<String>,
	pub website: Option<String>,
	pub plan: Plan,
	pub billing_cycle: BillingCycle,
	pub notes: Option<String>,
	/// Payment processor order id; the de-duplication key when present.
	pub payment_order_id: Option<String>,
	pub payment_id: Option<String>,
}

impl NewOnboardingRequest {
	/// Trim every field, lower-case the email, drop empty optionals and
	/// enforce the length limits.
	pub fn normalize(self) -> Result<Self, ValidationError> {
		let agency_name = required("agency_name", &self.agency_name)?;
		let admin_email = required("admin_email", &self.admin_email)?.to_lowercase();
		if !is_plausible_email(&admin_email) {
			return Err(ValidationError::Invalid {
				field: "admin_email",
				value: admin_email,
			});
		}

		Ok(Self {
			agency_name,
			admin_email,
			admin_name: optional("admin_name", self.admin_name)?,
			website: optional("website", self.website)?,
			plan: self.plan,
			billing_cycle: self.billing_cycle,
			notes: optional("notes", self.notes)?,
			payment_order_id: optional("payment_order_id", self.payment_order_id)?,
			payment_id: optional("payment_id", self.payment_id)?,
		})
	}
}

pub(crate) fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
	let trimmed = value.trim();
	if trimmed.is_empty() {
		return Err(ValidationError::Missing(field));
	}
	if trimmed.chars().count() > MAX_FIELD_LEN {
		return Err(ValidationError::TooLong {
			field,
			max: MAX_FIELD_LEN,
		});
	}
	Ok(trimmed.to_string())
}

fn optional(field: &'static str, value: Option<String>) -> Result<Option<String>, ValidationError> {
	match value.as_deref().map(str::trim) {
		None | Some("") => Ok(None),
		Some(v) if v.chars().count() > MAX_FIELD_LEN => Err(ValidationError::TooLong {
			field,
			max: MAX_FIELD_LEN,
		}),
		Some(v) => Ok(Some(v.to_string())),
	}
}

pub(crate) fn is_plausible_email(email: &str) -> bool {
	match email.split_once('@') {
		Some((local, domain)) => {
			!local.is_empty()
				&& domain.contains('.')
				&& !domain.starts_with('.')
				&& !domain.ends_with('.')
				&& !email.chars().any(char::is_whitespace)
		}
		None => false,
	}
}

/// One tenant signup attempt.
#[derive(Debug, Clone)]
pub struct OnboardingRequest {
	pub id: RequestId,
	pub agency_name: String,
	pub admin_email: String,
	pub admin_name: Option<String>,
	pub website: Option<String>,
	pub plan: Plan,
	pub billing_cycle: BillingCycle,
	pub notes: Option<String>,
	pub status: OnboardingStatus,
	pub metadata: ProvisioningMetadata,
	pub payment_order_id: Option<String>,
	pub payment_id: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl OnboardingRequest {
	/// Build a fresh `pending` request from normalized input.
	/// A fresh `pending` request. Timestamps are truncated to microseconds,
	/// the precision they are stored at.
	pub fn pending(new: NewOnboardingRequest, now: DateTime<Utc>) -> Self {
		let now = now.trunc_subsecs(6);
		Self {
			id: RequestId::generate(),
			agency_name: new.agency_name,
			admin_email: new.admin_email,
			admin_name: new.admin_name,
			website: new.website,
			plan: new.plan,
			billing_cycle: new.billing_cycle,
			notes: new.notes,
			status: OnboardingStatus::Pending,
			metadata: ProvisioningMetadata::default(),
			payment_order_id: new.payment_order_id,
			payment_id: new.payment_id,
			created_at: now,
			updated_at: now,
		}
	}
}
