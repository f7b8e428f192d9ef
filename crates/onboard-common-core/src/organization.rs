// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Provisioned tenants and their memberships.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::ids::{OrgId, RequestId, UserId};
use crate::onboarding::{BillingCycle, OnboardingRequest, Plan};

pub const MAX_SLUG_LEN: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrgStatus {
	#[default]
	Active,
	Suspended,
}

impl OrgStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			OrgStatus::Active => "active",
			OrgStatus::Suspended => "suspended",
		}
	}
}

impl FromStr for OrgStatus {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"active" => Ok(OrgStatus::Active),
			"suspended" => Ok(OrgStatus::Suspended),
			other => Err(ValidationError::Invalid {
				field: "org_status",
				value: other.to_string(),
			}),
		}
	}
}

/// Tenant branding captured at onboarding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgSettings {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub display_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub brand_color: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub logo_url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organization {
	pub id: OrgId,
	/// At most one organization exists per onboarding request.
	pub onboarding_request_id: Option<RequestId>,
	pub name: String,
	pub slug: String,
	pub plan: Plan,
	pub billing_cycle: BillingCycle,
	pub status: OrgStatus,
	pub settings: OrgSettings,
	pub subscription_ends_at: DateTime<Utc>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Organization {
	/// The organization an onboarding request provisions.
	pub fn for_request(request: &OnboardingRequest, slug: String, now: DateTime<Utc>) -> Self {
		let now = now.trunc_subsecs(6);
		Self {
			id: OrgId::generate(),
			onboarding_request_id: Some(request.id),
			name: request.agency_name.clone(),
			slug,
			plan: request.plan,
			billing_cycle: request.billing_cycle,
			status: OrgStatus::Active,
			settings: OrgSettings {
				display_name: Some(request.agency_name.clone()),
				website: request.website.clone(),
				..Default::default()
			},
			subscription_ends_at: subscription_ends_at(request.billing_cycle, now),
			created_at: now,
			updated_at: now,
		}
	}
}

pub fn subscription_ends_at(cycle: BillingCycle, from: DateTime<Utc>) -> DateTime<Utc> {
	from + Duration::days(cycle.subscription_days())
}

/// Derive a URL slug from an organization name.
///
/// Lower-cases, collapses every run of non-alphanumerics into `-`, trims
/// dashes and cuts to [`MAX_SLUG_LEN`] characters. Names with no usable
/// characters fall back to `org`.
pub fn slugify(name: &str) -> String {
	let mut slug = String::with_capacity(name.len());
	let mut pending_dash = false;
	for c in name.chars().flat_map(char::to_lowercase) {
		if c.is_ascii_alphanumeric() {
			if pending_dash && !slug.is_empty() {
				slug.push('-');
			}
			pending_dash = false;
			slug.push(c);
		} else {
			pending_dash = true;
		}
	}

	slug.truncate(MAX_SLUG_LEN);
	let slug = slug.trim_end_matches('-').to_string();
	if slug.is_empty() {
		"org".to_string()
	} else {
		slug
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
	Owner,
	Admin,
	Member,
}

impl MemberRole {
	pub fn as_str(&self) -> &'static str {
		match self {
			MemberRole::Owner => "owner",
			MemberRole::Admin => "admin",
			MemberRole::Member => "member",
		}
	}
}

impl fmt::Display for MemberRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for MemberRole {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"owner" => Ok(MemberRole::Owner),
			"admin" => Ok(MemberRole::Admin),
			"member" => Ok(MemberRole::Member),
			other => Err(ValidationError::Invalid {
				field: "role",
				value: other.to_string(),
			}),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
	Active,
	Invited,
}

impl MembershipStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			MembershipStatus::Active => "active",
			MembershipStatus::Invited => "invited",
		}
	}
}

impl FromStr for MembershipStatus {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"active" => Ok(MembershipStatus::Active),
			"invited" => Ok(MembershipStatus::Invited),
			other => Err(ValidationError::Invalid {
				field: "membership_status",
				value: other.to_string(),
			}),
		}
	}
}

/// Binds a directory identity to an organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgMembership {
	pub org_id: OrgId,
	pub user_id: UserId,
	pub role: MemberRole,
	pub status: MembershipStatus,
	pub created_at: DateTime<Utc>,
}
