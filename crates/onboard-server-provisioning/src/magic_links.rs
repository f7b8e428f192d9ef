// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Magic link issue, verify and consume over a [`MagicLinkStore`].
//!
//! Verification is a read and never changes state. Consumption is the
//! store's single conditional update; exactly one caller wins it.

use std::sync::Arc;

use chrono::{Duration, Utc};
use onboard_common_core::OrgId;
use onboard_common_secret::SecretString;
use onboard_server_db::{DbError, MagicLinkStore};
use onboard_server_magiclink::{MagicLink, MagicLinkContext, MagicLinkMetadata, MagicLinkType};

use crate::error::{ProvisioningError, Result};

#[derive(Clone)]
pub struct MagicLinkService {
	store: Arc<dyn MagicLinkStore>,
	ttl: Duration,
}

impl MagicLinkService {
	pub fn new(store: Arc<dyn MagicLinkStore>, ttl: Duration) -> Self {
		Self { store, ttl }
	}

	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	#[tracing::instrument(skip(self, email, metadata), fields(link_type = %link_type, org_id = %org_id))]
	pub async fn issue(
		&self,
		link_type: MagicLinkType,
		email: &str,
		org_id: OrgId,
		metadata: MagicLinkMetadata,
	) -> std::result::Result<MagicLink, DbError> {
		let link = MagicLink::new(link_type, email, org_id, metadata, self.ttl);
		self.store.create_magic_link(&link).await?;
		Ok(link)
	}

	/// Check a token without consuming it. Expiry is checked before use.
	#[tracing::instrument(skip(self, token), fields(expected = %expected))]
	pub async fn verify(
		&self,
		token: &SecretString,
		expected: MagicLinkType,
	) -> Result<MagicLinkContext> {
		let link = self
			.store
			.get_magic_link_by_token(token, expected)
			.await?
			.ok_or(ProvisioningError::NotFound("magic link"))?;

		link.check(expected, Utc::now()).map_err(|e| {
			tracing::debug!(error = %e, "magic link rejected");
			ProvisioningError::from(e)
		})
	}

	#[tracing::instrument(skip(self, token))]
	pub async fn consume(&self, token: &SecretString) -> std::result::Result<bool, DbError> {
		self.store.consume_magic_link(token, Utc::now()).await
	}

	pub async fn latest_unconsumed(
		&self,
		org_id: &OrgId,
		email: &str,
		link_type: MagicLinkType,
	) -> std::result::Result<Option<MagicLink>, DbError> {
		self
			.store
			.get_latest_unconsumed(org_id, email, link_type)
			.await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{seed_org, Harness};
	use onboard_server_db::MagicLinkRepository;
	use onboard_server_magiclink::MAGIC_LINK_TTL_HOURS;

	async fn service() -> (MagicLinkService, OrgId, Arc<MagicLinkRepository>) {
		let harness = Harness::new().await;
		let org_id = seed_org(&harness.pool).await;
		let store = Arc::new(MagicLinkRepository::new(harness.pool.clone()));
		(
			MagicLinkService::new(store.clone(), Duration::hours(MAGIC_LINK_TTL_HOURS)),
			org_id,
			store,
		)
	}

	#[tokio::test]
	async fn issued_link_verifies_until_consumed() {
		let (service, org_id, _) = service().await;
		let link = service
			.issue(
				MagicLinkType::Signup,
				"owner@acme.io",
				org_id,
				MagicLinkMetadata::default(),
			)
			.await
			.unwrap();

		let ctx = service
			.verify(&link.token, MagicLinkType::Signup)
			.await
			.unwrap();
		assert_eq!(ctx.email, "owner@acme.io");
		assert_eq!(ctx.org_id, org_id);

		assert!(service.consume(&link.token).await.unwrap());
		assert!(matches!(
			service.verify(&link.token, MagicLinkType::Signup).await,
			Err(ProvisioningError::AlreadyUsed)
		));
		assert!(!service.consume(&link.token).await.unwrap());
	}

	#[tokio::test]
	async fn wrong_type_is_not_found() {
		let (service, org_id, _) = service().await;
		let link = service
			.issue(
				MagicLinkType::Signup,
				"owner@acme.io",
				org_id,
				MagicLinkMetadata::default(),
			)
			.await
			.unwrap();

		assert!(matches!(
			service.verify(&link.token, MagicLinkType::PasswordReset).await,
			Err(ProvisioningError::NotFound("magic link"))
		));
	}

	#[tokio::test]
	async fn unknown_token_is_not_found() {
		let (service, _, _) = service().await;
		assert!(matches!(
			service
				.verify(&SecretString::from("deadbeef"), MagicLinkType::Signup)
				.await,
			Err(ProvisioningError::NotFound(_))
		));
	}

	#[tokio::test]
	async fn expired_wins_over_used() {
		let (service, org_id, store) = service().await;
		let mut link = MagicLink::new(
			MagicLinkType::Signup,
			"owner@acme.io",
			org_id,
			MagicLinkMetadata::default(),
			Duration::hours(1),
		);
		link.created_at -= Duration::hours(2);
		link.expires_at -= Duration::hours(2);
		store.create_magic_link(&link).await.unwrap();

		assert!(matches!(
			service.verify(&link.token, MagicLinkType::Signup).await,
			Err(ProvisioningError::Expired)
		));

		assert!(service.consume(&link.token).await.unwrap());
		assert!(matches!(
			service.verify(&link.token, MagicLinkType::Signup).await,
			Err(ProvisioningError::Expired)
		));
	}

	#[tokio::test]
	async fn ttl_sets_expiry() {
		let (service, org_id, _) = service().await;
		let link = service
			.issue(
				MagicLinkType::Signup,
				"owner@acme.io",
				org_id,
				MagicLinkMetadata::default(),
			)
			.await
			.unwrap();
		assert_eq!(link.expires_at - link.created_at, service.ttl());
	}
}
