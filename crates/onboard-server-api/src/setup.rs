// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use onboard_common_core::{BillingCycle, OrgMembership, Plan};
use onboard_server_provisioning::SetupContext;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyTokenRequest {
	#[serde(default)]
	pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyTokenResponse {
	pub email: String,
	pub org_id: String,
	pub org_name: String,
	pub plan: Plan,
	pub billing_cycle: BillingCycle,
	pub subscription_ends_at: DateTime<Utc>,
}

impl From<SetupContext> for VerifyTokenResponse {
	fn from(ctx: SetupContext) -> Self {
		Self {
			email: ctx.email,
			org_id: ctx.org_id.to_string(),
			org_name: ctx.org_name,
			plan: ctx.plan,
			billing_cycle: ctx.billing_cycle,
			subscription_ends_at: ctx.subscription_ends_at,
		}
	}
}

/// Sent by the identity step once the directory account exists.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteSetupRequest {
	#[serde(default)]
	pub token: String,
	#[serde(default)]
	pub email: String,
	#[serde(default)]
	pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteSetupResponse {
	pub org_id: String,
	pub user_id: String,
	pub role: String,
	pub status: String,
}

impl From<OrgMembership> for CompleteSetupResponse {
	fn from(membership: OrgMembership) -> Self {
		Self {
			org_id: membership.org_id.to_string(),
			user_id: membership.user_id.to_string(),
			role: membership.role.as_str().to_string(),
			status: membership.status.as_str().to_string(),
		}
	}
}
