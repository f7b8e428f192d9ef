// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Self-service setup: look a signup token up, then complete the account.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use onboard_common_core::{
	BillingCycle, MemberRole, MembershipStatus, OrgId, OrgMembership, Plan, UserId,
	ValidationError,
};
use onboard_common_secret::SecretString;
use onboard_server_db::{DbError, OrgStore};
use onboard_server_magiclink::{MagicLinkContext, MagicLinkType};
use tracing::instrument;

use crate::error::{ProvisioningError, Result};
use crate::magic_links::MagicLinkService;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupContext {
	pub email: String,
	pub org_id: OrgId,
	pub org_name: String,
	pub plan: Plan,
	pub billing_cycle: BillingCycle,
	pub subscription_ends_at: DateTime<Utc>,
}

pub struct SetupService {
	orgs: Arc<dyn OrgStore>,
	links: MagicLinkService,
}

impl SetupService {
	pub fn new(orgs: Arc<dyn OrgStore>, links: MagicLinkService) -> Self {
		Self { orgs, links }
	}

	/// Resolve a signup token to its organization. Never consumes the token.
	#[instrument(skip_all)]
	pub async fn verify_token(&self, token: &SecretString) -> Result<SetupContext> {
		let ctx = self.links.verify(token, MagicLinkType::Signup).await?;
		self.context(ctx).await
	}

	async fn context(&self, ctx: MagicLinkContext) -> Result<SetupContext> {
		let org = self
			.orgs
			.get_org_by_id(&ctx.org_id)
			.await?
			.ok_or(ProvisioningError::NotFound("organization"))?;

		Ok(SetupContext {
			email: ctx.email,
			org_id: org.id,
			org_name: org.name,
			plan: org.plan,
			billing_cycle: org.billing_cycle,
			subscription_ends_at: org.subscription_ends_at,
		})
	}

	/// Bind `user_id` to the token's organization as its active owner.
	///
	/// The token is consumed before anything is created; losing that race is
	/// [`ProvisioningError::AlreadyUsed`] and leaves no trace.
	#[instrument(skip(self, token, email), fields(user_id = %user_id))]
	pub async fn complete(
		&self,
		token: &SecretString,
		email: &str,
		user_id: UserId,
	) -> Result<OrgMembership> {
		let ctx = self.links.verify(token, MagicLinkType::Signup).await?;
		if !ctx.email.eq_ignore_ascii_case(email.trim()) {
			tracing::warn!(
				target: "onboard::security",
				org_id = %ctx.org_id,
				"setup completion with mismatched email"
			);
			return Err(ValidationError::Invalid {
				field: "email",
				value: email.trim().to_string(),
			}
			.into());
		}
		let setup = self.context(ctx).await?;

		if !self.links.consume(token).await? {
			tracing::info!(org_id = %setup.org_id, "signup link consumed concurrently");
			return Err(ProvisioningError::AlreadyUsed);
		}

		let membership = OrgMembership {
			org_id: setup.org_id,
			user_id,
			role: MemberRole::Owner,
			status: MembershipStatus::Active,
			created_at: Utc::now().trunc_subsecs(6),
		};
		match self.orgs.add_member(&membership).await {
			Ok(()) => {
				tracing::info!(org_id = %setup.org_id, "organization owner joined");
				Ok(membership)
			}
			Err(DbError::Conflict(_)) => Err(ProvisioningError::AlreadyMember),
			Err(e) => Err(e.into()),
		}
	}
}
