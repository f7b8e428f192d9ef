// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Administrative controls over onboarding requests.
//!
//! Every operation takes the authenticated [`Principal`] and asks
//! [`is_allowed`] first. Denials are logged on the `onboard::security`
//! target. Nothing here ever returns provisioned keys.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use onboard_common_core::{
	BillingCycle, OnboardingRequest, OnboardingStatus, OrgId, Plan, ProvisioningFailure,
	ProvisioningStep, RequestId,
};
use onboard_server_auth::{is_allowed, AdminAction, Principal};
use onboard_server_db::{OnboardingStore, OrgStore, MAX_LIST_LIMIT};
use onboard_server_email::{SetupEmail, SetupNotifier};
use onboard_server_magiclink::MagicLinkType;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{ProvisioningError, Result};
use crate::magic_links::MagicLinkService;
use crate::orchestrator::{bounded, Orchestrator, OrchestratorSettings};

/// A request as an admin sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminRequestView {
	pub id: RequestId,
	pub agency_name: String,
	pub admin_email: String,
	pub admin_name: Option<String>,
	pub website: Option<String>,
	pub plan: Plan,
	pub billing_cycle: BillingCycle,
	pub notes: Option<String>,
	pub status: OnboardingStatus,
	pub payment_order_id: Option<String>,
	pub payment_id: Option<String>,
	pub org_id: Option<OrgId>,
	pub instance_url: Option<String>,
	pub project_id: Option<String>,
	pub deployment_id: Option<String>,
	pub started_at: Option<DateTime<Utc>>,
	pub completed_at: Option<DateTime<Utc>>,
	pub setup_email_sent_at: Option<DateTime<Utc>>,
	pub failure: Option<ProvisioningFailure>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl From<OnboardingRequest> for AdminRequestView {
	fn from(request: OnboardingRequest) -> Self {
		let metadata = request.metadata;
		Self {
			id: request.id,
			agency_name: request.agency_name,
			admin_email: request.admin_email,
			admin_name: request.admin_name,
			website: request.website,
			plan: request.plan,
			billing_cycle: request.billing_cycle,
			notes: request.notes,
			status: request.status,
			payment_order_id: request.payment_order_id,
			payment_id: request.payment_id,
			org_id: metadata.org_id,
			instance_url: metadata.instance_url,
			project_id: metadata.project_id,
			deployment_id: metadata.deployment_id,
			started_at: metadata.started_at,
			completed_at: metadata.completed_at,
			setup_email_sent_at: metadata.setup_email_sent_at,
			failure: metadata.failure,
			created_at: request.created_at,
			updated_at: request.updated_at,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResendReceipt {
	pub email: String,
	pub expires_at: DateTime<Utc>,
}

pub struct AdminService {
	requests: Arc<dyn OnboardingStore>,
	orgs: Arc<dyn OrgStore>,
	links: MagicLinkService,
	notifier: Arc<dyn SetupNotifier>,
	orchestrator: Arc<Orchestrator>,
	settings: OrchestratorSettings,
}

impl AdminService {
	pub fn new(
		requests: Arc<dyn OnboardingStore>,
		orgs: Arc<dyn OrgStore>,
		links: MagicLinkService,
		notifier: Arc<dyn SetupNotifier>,
		orchestrator: Arc<Orchestrator>,
		settings: OrchestratorSettings,
	) -> Self {
		Self {
			requests,
			orgs,
			links,
			notifier,
			orchestrator,
			settings,
		}
	}

	fn authorize(&self, principal: &Principal, action: AdminAction) -> Result<()> {
		if is_allowed(principal, action) {
			return Ok(());
		}
		tracing::warn!(
			target: "onboard::security",
			subject = %principal.subject,
			?action,
			"admin action denied"
		);
		Err(ProvisioningError::Forbidden { action })
	}

	/// Newest first, at most [`MAX_LIST_LIMIT`] records.
	#[instrument(skip(self, principal), fields(subject = %principal.subject))]
	pub async fn list(
		&self,
		principal: &Principal,
		limit: Option<u32>,
	) -> Result<Vec<AdminRequestView>> {
		self.authorize(principal, AdminAction::ListRequests)?;
		let requests = self
			.requests
			.list_requests(limit.unwrap_or(MAX_LIST_LIMIT))
			.await?;
		Ok(requests.into_iter().map(AdminRequestView::from).collect())
	}

	#[instrument(skip(self, principal), fields(subject = %principal.subject, request_id = %id))]
	pub async fn view(&self, principal: &Principal, id: &RequestId) -> Result<AdminRequestView> {
		self.authorize(principal, AdminAction::ViewRequest)?;
		Ok(self.orchestrator.get_request(id).await?.into())
	}

	/// Approve a pending request: runs the full provisioning flow.
	#[instrument(skip(self, principal), fields(subject = %principal.subject, request_id = %id))]
	pub async fn advance(&self, principal: &Principal, id: &RequestId) -> Result<AdminRequestView> {
		self.authorize(principal, AdminAction::AdvanceRequest)?;
		tracing::info!("admin approved onboarding request");
		Ok(self.orchestrator.advance(id).await?.into())
	}

	/// Force a request back to `pending`. Idempotent; links are untouched.
	#[instrument(skip(self, principal), fields(subject = %principal.subject, request_id = %id))]
	pub async fn reset(&self, principal: &Principal, id: &RequestId) -> Result<AdminRequestView> {
		self.authorize(principal, AdminAction::ResetRequest)?;
		let before = self.orchestrator.get_request(id).await?;
		if !matches!(
			before.status,
			OnboardingStatus::Failed | OnboardingStatus::Pending
		) {
			tracing::warn!(status = %before.status, "resetting a request that has not failed");
		}

		if !self.requests.reset_to_pending(id).await? {
			return Err(ProvisioningError::NotFound("onboarding request"));
		}
		tracing::info!(from = %before.status, "onboarding request reset to pending");
		Ok(self.orchestrator.get_request(id).await?.into())
	}

	/// Re-send the setup email using the newest unconsumed link. Never mints
	/// a new token.
	#[instrument(skip(self, principal), fields(subject = %principal.subject, request_id = %id))]
	pub async fn resend_email(&self, principal: &Principal, id: &RequestId) -> Result<ResendReceipt> {
		self.authorize(principal, AdminAction::ResendEmail)?;
		let request = self.orchestrator.get_request(id).await?;

		let org = self
			.orgs
			.get_org_by_request_id(&request.id)
			.await?
			.ok_or(ProvisioningError::NotFound("organization"))?;

		let link = self
			.links
			.latest_unconsumed(&org.id, &request.admin_email, MagicLinkType::Signup)
			.await?
			.ok_or(ProvisioningError::NotFound("magic link"))?;
		if link.is_expired_at(Utc::now()) {
			return Err(ProvisioningError::Expired);
		}

		let email = SetupEmail {
			agency_name: request.agency_name.clone(),
			admin_email: request.admin_email.clone(),
			setup_url: link.setup_url(&self.settings.base_url).into(),
			instance_url: request.metadata.instance_url.clone(),
			project_id: request.metadata.project_id.clone(),
		};

		if let Err(failure) = bounded(
			ProvisioningStep::SendSetupEmail,
			self.settings.email_timeout,
			self.notifier.send_setup_email(&email),
		)
		.await
		{
			let correlation_id = Uuid::new_v4();
			tracing::error!(%correlation_id, error = %failure.message, "setup email resend failed");
			return Err(failure.into_error(correlation_id));
		}

		tracing::info!(to = %request.admin_email, "setup email resent");
		Ok(ResendReceipt {
			email: request.admin_email,
			expires_at: link.expires_at,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{new_request, Harness};
	use chrono::Duration;
	use onboard_common_secret::SecretString;
	use onboard_server_auth::Role;
	use onboard_server_db::{MagicLinkRepository, OnboardingRepository};
	use onboard_server_magiclink::{MagicLink, MagicLinkMetadata};

	fn admin() -> Principal {
		Principal::new("ops@platform.io", vec![Role::OnboardingAdmin])
	}

	fn support() -> Principal {
		Principal::new("help@platform.io", vec![Role::Support])
	}

	async fn completed(harness: &Harness) -> RequestId {
		let orchestrator = harness.orchestrator();
		let request = orchestrator
			.create_request(new_request("Acme", "owner@acme.io"))
			.await
			.unwrap();
		orchestrator.advance(&request.id).await.unwrap();
		request.id
	}

	mod authorization {
		use super::*;

		#[tokio::test]
		async fn support_can_read_but_not_mutate() {
			let harness = Harness::new().await;
			let id = completed(&harness).await;
			let service = harness.admin();

			assert_eq!(service.list(&support(), None).await.unwrap().len(), 1);
			assert!(service.view(&support(), &id).await.is_ok());
			assert!(matches!(
				service.reset(&support(), &id).await,
				Err(ProvisioningError::Forbidden {
					action: AdminAction::ResetRequest
				})
			));
			assert!(matches!(
				service.resend_email(&support(), &id).await,
				Err(ProvisioningError::Forbidden { .. })
			));
			assert!(matches!(
				service.advance(&support(), &id).await,
				Err(ProvisioningError::Forbidden { .. })
			));
		}

		#[tokio::test]
		async fn principal_without_roles_is_denied_everything() {
			let harness = Harness::new().await;
			let nobody = Principal::new("nobody", vec![]);
			assert!(matches!(
				harness.admin().list(&nobody, None).await,
				Err(ProvisioningError::Forbidden { .. })
			));
		}
	}

	mod list {
		use super::*;

		#[tokio::test]
		async fn newest_first_and_without_keys() {
			let harness = Harness::new().await;
			let first = completed(&harness).await;
			let second = harness
				.orchestrator()
				.create_request(new_request("Beta", "owner@beta.io"))
				.await
				.unwrap();

			let listed = harness.admin().list(&admin(), None).await.unwrap();
			assert_eq!(listed.len(), 2);
			assert_eq!(listed[0].id, second.id);
			assert_eq!(listed[1].id, first);
			assert!(listed[1].project_id.is_some());
			let debug = format!("{listed:?}");
			assert!(!debug.contains("service-key-value"));
		}

		#[tokio::test]
		async fn limit_is_capped() {
			let harness = Harness::new().await;
			let orchestrator = harness.orchestrator();
			for i in 0..3 {
				orchestrator
					.create_request(new_request(&format!("Agency {i}"), "owner@acme.io"))
					.await
					.unwrap();
			}
			let listed = harness.admin().list(&admin(), Some(2)).await.unwrap();
			assert_eq!(listed.len(), 2);
		}
	}

	mod reset {
		use super::*;

		#[tokio::test]
		async fn failed_goes_to_pending_idempotently() {
			let harness = Harness::new().await;
			harness.provider.set_failing(true);
			let orchestrator = harness.orchestrator();
			let request = orchestrator
				.create_request(new_request("Acme", "owner@acme.io"))
				.await
				.unwrap();
			orchestrator.advance(&request.id).await.unwrap_err();

			let service = harness.admin();
			let view = service.reset(&admin(), &request.id).await.unwrap();
			assert_eq!(view.status, OnboardingStatus::Pending);
			let view = service.reset(&admin(), &request.id).await.unwrap();
			assert_eq!(view.status, OnboardingStatus::Pending);
		}

		#[tokio::test]
		async fn reset_keeps_links() {
			let harness = Harness::new().await;
			let id = completed(&harness).await;
			let before = harness.notifier.sent()[0].setup_url.clone();

			let view = harness.admin().reset(&admin(), &id).await.unwrap();
			assert_eq!(view.status, OnboardingStatus::Pending);

			let receipt = harness.admin().resend_email(&admin(), &id).await.unwrap();
			assert_eq!(receipt.email, "owner@acme.io");
			assert_eq!(harness.notifier.sent()[1].setup_url, before);
		}

		#[tokio::test]
		async fn missing_request_is_not_found() {
			let harness = Harness::new().await;
			assert!(matches!(
				harness.admin().reset(&admin(), &RequestId::generate()).await,
				Err(ProvisioningError::NotFound(_))
			));
		}
	}

	mod resend {
		use super::*;

		#[tokio::test]
		async fn reuses_the_same_token() {
			let harness = Harness::new().await;
			let id = completed(&harness).await;

			harness.admin().resend_email(&admin(), &id).await.unwrap();
			let sent = harness.notifier.sent();
			assert_eq!(sent.len(), 2);
			assert_eq!(sent[0].setup_url, sent[1].setup_url);
			assert_eq!(sent[1].admin_email, "owner@acme.io");
		}

		#[tokio::test]
		async fn pending_request_has_no_organization() {
			let harness = Harness::new().await;
			let request = harness
				.orchestrator()
				.create_request(new_request("Acme", "owner@acme.io"))
				.await
				.unwrap();
			assert!(matches!(
				harness.admin().resend_email(&admin(), &request.id).await,
				Err(ProvisioningError::NotFound("organization"))
			));
		}

		#[tokio::test]
		async fn consumed_link_is_not_found() {
			let harness = Harness::new().await;
			let id = completed(&harness).await;
			let url = harness.notifier.sent()[0].setup_url.clone();
			let token = url.expose().rsplit("token=").next().unwrap().to_string();
			harness.magic_links().consume(&SecretString::from(token)).await.unwrap();

			assert!(matches!(
				harness.admin().resend_email(&admin(), &id).await,
				Err(ProvisioningError::NotFound("magic link"))
			));
		}

		#[tokio::test]
		async fn expired_link_is_expired() {
			let harness = Harness::new().await;
			let id = completed(&harness).await;
			let view = harness.admin().view(&admin(), &id).await.unwrap();
			let org_id = view.org_id.unwrap();

			// Consume the live link and leave only an expired one behind.
			let url = harness.notifier.sent()[0].setup_url.clone();
			let token = url.expose().rsplit("token=").next().unwrap().to_string();
			harness.magic_links().consume(&SecretString::from(token)).await.unwrap();
			let mut stale = MagicLink::new(
				MagicLinkType::Signup,
				"owner@acme.io",
				org_id,
				MagicLinkMetadata::default(),
				Duration::hours(1),
			);
			stale.created_at -= Duration::hours(3);
			stale.expires_at -= Duration::hours(3);
			MagicLinkRepository::new(harness.pool.clone())
				.create_magic_link(&stale)
				.await
				.unwrap();

			assert!(matches!(
				harness.admin().resend_email(&admin(), &id).await,
				Err(ProvisioningError::Expired)
			));
		}

		#[tokio::test]
		async fn notifier_failure_is_upstream() {
			let harness = Harness::new().await;
			let id = completed(&harness).await;
			harness.notifier.set_failing(true);
			assert!(matches!(
				harness.admin().resend_email(&admin(), &id).await,
				Err(ProvisioningError::Upstream {
					step: ProvisioningStep::SendSetupEmail,
					..
				})
			));
			// Resend never changes status.
			let stored = OnboardingRepository::new(harness.pool.clone())
				.get_request_by_id(&id)
				.await
				.unwrap()
				.unwrap();
			assert_eq!(stored.status, OnboardingStatus::Completed);
		}
	}

	mod approve {
		use super::*;

		#[tokio::test]
		async fn admin_advance_completes() {
			let harness = Harness::new().await;
			let request = harness
				.orchestrator()
				.create_request(new_request("Acme", "owner@acme.io"))
				.await
				.unwrap();
			let view = harness.admin().advance(&admin(), &request.id).await.unwrap();
			assert_eq!(view.status, OnboardingStatus::Completed);
			assert_eq!(harness.notifier.sent().len(), 1);
		}
	}
}
