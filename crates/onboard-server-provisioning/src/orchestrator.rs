// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The onboarding state machine.
//!
//! ```text
//! pending ──advance──▶ provisioning ──▶ completed
//!    ▲                       │
//!    │                       └────────▶ failed
//!    └──────── admin reset ─────────────────┘
//! ```
//!
//! `advance` claims a request with a conditional `pending → provisioning`
//! update, then runs each step in order. The first failing step moves the
//! request to `failed` and records `{step, message, correlation_id}` in its
//! metadata. Steps that already committed are not rolled back: a later
//! advance reuses the organization and provider artifacts they produced.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use onboard_common_core::{
	slugify, NewOnboardingRequest, OnboardingRequest, OnboardingStatus, Organization,
	ProvisioningMetadata, ProvisioningStep, PublicMetadata, RequestId, MAX_SLUG_LEN,
};
use onboard_server_db::{DbError, OnboardingStore, OrgStore};
use onboard_server_email::{SetupEmail, SetupNotifier};
use onboard_server_magiclink::{MagicLinkMetadata, MagicLinkType};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{ProvisioningError, Result};
use crate::magic_links::MagicLinkService;
use crate::provider::{InfraProvisioner, ProvisionRequest};

const MAX_SLUG_ATTEMPTS: usize = 5;

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
	/// Public base URL the setup link points at.
	pub base_url: String,
	pub provider_timeout: Duration,
	pub email_timeout: Duration,
}

/// What anyone may learn about a request: no keys, no failure detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestStatus {
	pub id: RequestId,
	pub status: OnboardingStatus,
	pub agency_name: String,
	pub admin_email: String,
	pub metadata: PublicMetadata,
}

impl RequestStatus {
	pub fn of(request: &OnboardingRequest) -> Self {
		Self {
			id: request.id,
			status: request.status,
			agency_name: request.agency_name.clone(),
			admin_email: request.admin_email.clone(),
			metadata: request.metadata.public_view(request.status),
		}
	}
}

#[derive(Debug)]
pub(crate) struct StepFailure {
	pub(crate) step: ProvisioningStep,
	pub(crate) message: String,
	timed_out: bool,
}

impl StepFailure {
	fn new(step: ProvisioningStep, err: impl Display) -> Self {
		Self {
			step,
			message: err.to_string(),
			timed_out: false,
		}
	}

	fn timeout(step: ProvisioningStep, limit: Duration) -> Self {
		Self {
			step,
			message: format!("timed out after {}s", limit.as_secs_f64()),
			timed_out: true,
		}
	}

	pub(crate) fn into_error(self, correlation_id: Uuid) -> ProvisioningError {
		if self.timed_out {
			ProvisioningError::Timeout {
				step: self.step,
				correlation_id,
			}
		} else {
			ProvisioningError::Upstream {
				step: self.step,
				correlation_id,
				message: self.message,
			}
		}
	}
}

/// Run an external call under a deadline, folding both failure kinds into
/// a [`StepFailure`] for `step`.
pub(crate) async fn bounded<T, E, F>(
	step: ProvisioningStep,
	limit: Duration,
	call: F,
) -> std::result::Result<T, StepFailure>
where
	E: Display,
	F: Future<Output = std::result::Result<T, E>>,
{
	match tokio::time::timeout(limit, call).await {
		Ok(Ok(value)) => Ok(value),
		Ok(Err(e)) => Err(StepFailure::new(step, e)),
		Err(_) => Err(StepFailure::timeout(step, limit)),
	}
}

pub struct Orchestrator {
	requests: Arc<dyn OnboardingStore>,
	orgs: Arc<dyn OrgStore>,
	links: MagicLinkService,
	provider: Arc<dyn InfraProvisioner>,
	notifier: Arc<dyn SetupNotifier>,
	settings: OrchestratorSettings,
}

impl Orchestrator {
	pub fn new(
		requests: Arc<dyn OnboardingStore>,
		orgs: Arc<dyn OrgStore>,
		links: MagicLinkService,
		provider: Arc<dyn InfraProvisioner>,
		notifier: Arc<dyn SetupNotifier>,
		settings: OrchestratorSettings,
	) -> Self {
		Self {
			requests,
			orgs,
			links,
			provider,
			notifier,
			settings,
		}
	}

	/// Validate and insert a `pending` request.
	///
	/// A second request for the same payment order fails with
	/// [`ProvisioningError::Duplicate`] carrying the first request's id.
	#[instrument(
		skip(self, new),
		fields(agency = %new.agency_name, order_id = ?new.payment_order_id)
	)]
	pub async fn create_request(&self, new: NewOnboardingRequest) -> Result<OnboardingRequest> {
		let new = new.normalize()?;
		let request = OnboardingRequest::pending(new, Utc::now());

		match self.requests.create_request(&request).await {
			Ok(()) => {
				tracing::info!(request_id = %request.id, "onboarding request created");
				Ok(request)
			}
			Err(DbError::Conflict(column)) if column == "payment_order_id" => {
				let order_id = request.payment_order_id.as_deref().unwrap_or_default();
				let existing = self
					.requests
					.get_request_by_payment_order_id(order_id)
					.await?
					.ok_or(ProvisioningError::NotFound("onboarding request"))?;
				tracing::info!(existing = %existing.id, "duplicate payment order ignored");
				Err(ProvisioningError::Duplicate {
					existing: existing.id,
				})
			}
			Err(e) => Err(e.into()),
		}
	}

	pub async fn get_request(&self, id: &RequestId) -> Result<OnboardingRequest> {
		self
			.requests
			.get_request_by_id(id)
			.await?
			.ok_or(ProvisioningError::NotFound("onboarding request"))
	}

	/// Side-effect free status read.
	#[instrument(skip(self), fields(request_id = %id))]
	pub async fn get_status(&self, id: &RequestId) -> Result<RequestStatus> {
		Ok(RequestStatus::of(&self.get_request(id).await?))
	}

	/// Drive a `pending` request to `completed` or `failed`.
	///
	/// Returns the request as stored at the end. A step failure is returned
	/// as [`ProvisioningError::Upstream`] or [`ProvisioningError::Timeout`]
	/// after the request has been marked `failed`.
	#[instrument(skip(self), fields(request_id = %id))]
	pub async fn advance(&self, id: &RequestId) -> Result<OnboardingRequest> {
		let request = self.get_request(id).await?;
		if request.status != OnboardingStatus::Pending {
			return Err(ProvisioningError::InvalidTransition {
				from: request.status,
			});
		}

		let mut metadata = request.metadata.clone();
		metadata.started_at = Some(Utc::now());
		metadata.completed_at = None;
		metadata.failure = None;

		let claimed = self
			.requests
			.transition_status_with_metadata(
				id,
				OnboardingStatus::Pending,
				OnboardingStatus::Provisioning,
				&metadata,
			)
			.await?;
		if !claimed {
			let current = self.get_request(id).await?;
			tracing::info!(status = %current.status, "request was claimed concurrently");
			return Err(ProvisioningError::InvalidTransition {
				from: current.status,
			});
		}

		let correlation_id = Uuid::new_v4();
		tracing::info!(%correlation_id, agency = %request.agency_name, "provisioning started");

		match self.run_steps(&request, &mut metadata).await {
			Ok(()) => {
				self.finish(&request, metadata, correlation_id).await?;
				self.get_request(id).await
			}
			Err(failure) => {
				self.fail(&request, metadata, &failure, correlation_id).await;
				Err(failure.into_error(correlation_id))
			}
		}
	}

	async fn run_steps(
		&self,
		request: &OnboardingRequest,
		metadata: &mut ProvisioningMetadata,
	) -> std::result::Result<(), StepFailure> {
		let org = self
			.ensure_org(request)
			.await
			.map_err(|e| StepFailure::new(ProvisioningStep::CreateOrganization, e))?;
		metadata.org_id = Some(org.id);

		if metadata.has_artifacts() {
			tracing::info!(
				project_id = ?metadata.project_id,
				"reusing provider artifacts from an earlier attempt"
			);
		} else {
			let provision = ProvisionRequest {
				request_id: request.id,
				org_id: org.id,
				name: org.name.clone(),
				slug: org.slug.clone(),
				plan: org.plan,
			};
			let instance = bounded(
				ProvisioningStep::ProvisionInfrastructure,
				self.settings.provider_timeout,
				self.provider.provision(&provision),
			)
			.await?;
			metadata.instance_url = Some(instance.instance_url);
			metadata.project_id = Some(instance.project_id);
			metadata.deployment_id = instance.deployment_id;
			metadata.keys = Some(instance.keys);
		}

		self
			.requests
			.update_metadata(&request.id, metadata)
			.await
			.map_err(|e| StepFailure::new(ProvisioningStep::RecordArtifacts, e))?;

		let link = self
			.links
			.issue(
				MagicLinkType::Signup,
				&request.admin_email,
				org.id,
				MagicLinkMetadata {
					plan: request.plan,
					billing_cycle: request.billing_cycle,
				},
			)
			.await
			.map_err(|e| StepFailure::new(ProvisioningStep::IssueMagicLink, e))?;

		let email = SetupEmail {
			agency_name: request.agency_name.clone(),
			admin_email: request.admin_email.clone(),
			setup_url: link.setup_url(&self.settings.base_url).into(),
			instance_url: metadata.instance_url.clone(),
			project_id: metadata.project_id.clone(),
		};
		bounded(
			ProvisioningStep::SendSetupEmail,
			self.settings.email_timeout,
			self.notifier.send_setup_email(&email),
		)
		.await?;
		metadata.setup_email_sent_at = Some(Utc::now());

		Ok(())
	}

	/// The organization bound to `request`, created on first use.
	async fn ensure_org(&self, request: &OnboardingRequest) -> std::result::Result<Organization, DbError> {
		if let Some(org) = self.orgs.get_org_by_request_id(&request.id).await? {
			tracing::debug!(org_id = %org.id, "reusing organization");
			return Ok(org);
		}

		let base = slugify(&request.agency_name);
		let mut slug = base.clone();
		for _ in 0..MAX_SLUG_ATTEMPTS {
			let org = Organization::for_request(request, slug.clone(), Utc::now());
			match self.orgs.create_org(&org).await {
				Ok(()) => {
					tracing::info!(org_id = %org.id, slug = %org.slug, "organization created");
					return Ok(org);
				}
				Err(DbError::Conflict(column)) if column == "slug" => {
					slug = slug_with_suffix(&base, Utc::now().timestamp_micros());
					tracing::debug!(%slug, "slug taken, retrying with suffix");
				}
				Err(DbError::Conflict(column)) if column == "onboarding_request_id" => {
					return self
						.orgs
						.get_org_by_request_id(&request.id)
						.await?
						.ok_or_else(|| DbError::NotFound("organization".to_string()));
				}
				Err(e) => return Err(e),
			}
		}
		Err(DbError::Conflict(format!("no free slug for {base}")))
	}

	async fn finish(
		&self,
		request: &OnboardingRequest,
		mut metadata: ProvisioningMetadata,
		correlation_id: Uuid,
	) -> Result<()> {
		metadata.completed_at = Some(Utc::now());
		let moved = self
			.requests
			.transition_status_with_metadata(
				&request.id,
				OnboardingStatus::Provisioning,
				OnboardingStatus::Completed,
				&metadata,
			)
			.await;

		match moved {
			Ok(true) => {
				tracing::info!(%correlation_id, "provisioning completed");
				Ok(())
			}
			Ok(false) => {
				tracing::warn!(%correlation_id, "request left provisioning before completion");
				Ok(())
			}
			Err(e) => {
				let failure = StepFailure::new(ProvisioningStep::Complete, &e);
				self.fail(request, metadata, &failure, correlation_id).await;
				Err(failure.into_error(correlation_id))
			}
		}
	}

	async fn fail(
		&self,
		request: &OnboardingRequest,
		mut metadata: ProvisioningMetadata,
		failure: &StepFailure,
		correlation_id: Uuid,
	) {
		tracing::error!(
			%correlation_id,
			step = %failure.step,
			error = %failure.message,
			"provisioning failed"
		);
		metadata.completed_at = None;
		metadata.record_failure(failure.step, &failure.message, correlation_id, Utc::now());

		match self
			.requests
			.transition_status_with_metadata(
				&request.id,
				OnboardingStatus::Provisioning,
				OnboardingStatus::Failed,
				&metadata,
			)
			.await
		{
			Ok(true) => {}
			Ok(false) => {
				tracing::warn!(%correlation_id, "request left provisioning before it could be failed")
			}
			Err(e) => {
				tracing::error!(%correlation_id, error = %e, "could not record provisioning failure")
			}
		}
	}
}

/// `base` plus a base-36 rendering of `stamp`, kept within [`MAX_SLUG_LEN`].
pub fn slug_with_suffix(base: &str, stamp: i64) -> String {
	let suffix = to_base36(stamp.unsigned_abs());
	let room = MAX_SLUG_LEN.saturating_sub(suffix.len() + 1);
	let head: String = base.chars().take(room).collect();
	let head = head.trim_end_matches('-');
	if head.is_empty() {
		suffix
	} else {
		format!("{head}-{suffix}")
	}
}

fn to_base36(mut n: u64) -> String {
	const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
	if n == 0 {
		return "0".to_string();
	}
	let mut out = Vec::new();
	while n > 0 {
		out.push(DIGITS[(n % 36) as usize]);
		n /= 36;
	}
	out.reverse();
	String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{new_request, Harness, TEST_BASE_URL};
	use chrono::Duration as ChronoDuration;
	use onboard_common_core::PUBLIC_FAILURE_MESSAGE;
	use onboard_common_secret::SecretString;
	use onboard_server_db::{MagicLinkRepository, OnboardingRepository, OrgRepository};
	use proptest::prelude::*;

	fn token_from(url: &str) -> String {
		url.rsplit("token=").next().unwrap().to_string()
	}

	mod create {
		use super::*;

		#[tokio::test]
		async fn creates_pending_request() {
			let harness = Harness::new().await;
			let request = harness
				.orchestrator()
				.create_request(new_request(" Acme Studio ", "Owner@Acme.io"))
				.await
				.unwrap();
			assert_eq!(request.status, OnboardingStatus::Pending);
			assert_eq!(request.agency_name, "Acme Studio");
			assert_eq!(request.admin_email, "owner@acme.io");
		}

		#[tokio::test]
		async fn returned_request_matches_stored_timestamps() {
			let harness = Harness::new().await;
			let orchestrator = harness.orchestrator();
			let created = orchestrator
				.create_request(new_request("Acme Studio", "owner@acme.io"))
				.await
				.unwrap();
			let stored = orchestrator.get_request(&created.id).await.unwrap();
			assert_eq!(stored.created_at, created.created_at);
			assert_eq!(stored.updated_at, created.updated_at);
		}

		#[tokio::test]
		async fn invalid_input_is_validation_error() {
			let harness = Harness::new().await;
			let err = harness
				.orchestrator()
				.create_request(new_request("", "owner@acme.io"))
				.await
				.unwrap_err();
			assert!(matches!(err, ProvisioningError::Validation(_)));
		}

		#[tokio::test]
		async fn duplicate_order_returns_existing_id() {
			let harness = Harness::new().await;
			let orchestrator = harness.orchestrator();
			let mut new = new_request("Acme", "owner@acme.io");
			new.payment_order_id = Some("order_1".to_string());

			let first = orchestrator.create_request(new.clone()).await.unwrap();
			let err = orchestrator.create_request(new).await.unwrap_err();
			match err {
				ProvisioningError::Duplicate { existing } => assert_eq!(existing, first.id),
				other => panic!("expected duplicate, got {other:?}"),
			}
			let all = OnboardingRepository::new(harness.pool.clone())
				.list_requests(10)
				.await
				.unwrap();
			assert_eq!(all.len(), 1);
		}
	}

	mod advance {
		use super::*;

		#[tokio::test]
		async fn end_to_end_completes() {
			let harness = Harness::new().await;
			let orchestrator = harness.orchestrator();
			let request = orchestrator
				.create_request(new_request("Acme Studio", "owner@acme.io"))
				.await
				.unwrap();

			let before = Utc::now();
			let done = orchestrator.advance(&request.id).await.unwrap();
			assert_eq!(done.status, OnboardingStatus::Completed);
			assert!(done.metadata.has_artifacts());
			assert!(done.metadata.completed_at.is_some());
			assert!(done.metadata.setup_email_sent_at.is_some());
			assert!(done.metadata.failure.is_none());

			let org = OrgRepository::new(harness.pool.clone())
				.get_org_by_request_id(&request.id)
				.await
				.unwrap()
				.unwrap();
			assert_eq!(org.slug, "acme-studio");
			assert_eq!(done.metadata.org_id, Some(org.id));

			let sent = harness.notifier.sent();
			assert_eq!(sent.len(), 1);
			assert_eq!(sent[0].admin_email, "owner@acme.io");
			assert!(sent[0]
				.setup_url
				.expose()
				.starts_with(&format!("{TEST_BASE_URL}/setup?token=")));

			let token = token_from(sent[0].setup_url.expose());
			let link = MagicLinkRepository::new(harness.pool.clone())
				.get_magic_link_by_token(&SecretString::from(token), MagicLinkType::Signup)
				.await
				.unwrap()
				.unwrap();
			assert_eq!(link.org_id, org.id);
			let expected = before + ChronoDuration::hours(24);
			assert!((link.expires_at - expected).num_seconds().abs() < 5);

			assert_eq!(harness.provider.calls().len(), 1);
			assert_eq!(harness.provider.calls()[0].request_id, request.id);
		}

		#[tokio::test]
		async fn provider_failure_marks_failed_without_link_or_email() {
			let harness = Harness::new().await;
			harness.provider.set_failing(true);
			let orchestrator = harness.orchestrator();
			let request = orchestrator
				.create_request(new_request("Acme", "owner@acme.io"))
				.await
				.unwrap();

			let err = orchestrator.advance(&request.id).await.unwrap_err();
			let correlation = match err {
				ProvisioningError::Upstream {
					step,
					correlation_id,
					..
				} => {
					assert_eq!(step, ProvisioningStep::ProvisionInfrastructure);
					correlation_id
				}
				other => panic!("expected upstream error, got {other:?}"),
			};

			let stored = orchestrator.get_request(&request.id).await.unwrap();
			assert_eq!(stored.status, OnboardingStatus::Failed);
			let failure = stored.metadata.failure.unwrap();
			assert_eq!(failure.step, ProvisioningStep::ProvisionInfrastructure);
			assert_eq!(failure.correlation_id, correlation);
			assert!(harness.notifier.sent().is_empty());

			let org_id = stored.metadata.org_id.unwrap();
			assert!(MagicLinkRepository::new(harness.pool.clone())
				.get_latest_unconsumed(&org_id, "owner@acme.io", MagicLinkType::Signup)
				.await
				.unwrap()
				.is_none());
		}

		#[tokio::test]
		async fn email_failure_marks_failed() {
			let harness = Harness::new().await;
			harness.notifier.set_failing(true);
			let orchestrator = harness.orchestrator();
			let request = orchestrator
				.create_request(new_request("Acme", "owner@acme.io"))
				.await
				.unwrap();

			let err = orchestrator.advance(&request.id).await.unwrap_err();
			assert!(matches!(
				err,
				ProvisioningError::Upstream {
					step: ProvisioningStep::SendSetupEmail,
					..
				}
			));
			let stored = orchestrator.get_request(&request.id).await.unwrap();
			assert_eq!(stored.status, OnboardingStatus::Failed);
			// Artifacts committed before the failure are kept.
			assert!(stored.metadata.has_artifacts());
		}

		#[tokio::test]
		async fn slow_provider_times_out_as_failed() {
			let mut harness = Harness::new().await;
			harness.settings.provider_timeout = Duration::from_millis(50);
			harness.provider.set_delay(Duration::from_secs(5));
			let orchestrator = harness.orchestrator();
			let request = orchestrator
				.create_request(new_request("Acme", "owner@acme.io"))
				.await
				.unwrap();

			let err = orchestrator.advance(&request.id).await.unwrap_err();
			assert!(matches!(
				err,
				ProvisioningError::Timeout {
					step: ProvisioningStep::ProvisionInfrastructure,
					..
				}
			));
			let stored = orchestrator.get_request(&request.id).await.unwrap();
			assert_eq!(stored.status, OnboardingStatus::Failed);
			assert!(stored.metadata.failure.unwrap().message.contains("timed out"));
		}

		#[tokio::test]
		async fn only_pending_requests_advance() {
			let harness = Harness::new().await;
			let orchestrator = harness.orchestrator();
			let request = orchestrator
				.create_request(new_request("Acme", "owner@acme.io"))
				.await
				.unwrap();
			orchestrator.advance(&request.id).await.unwrap();

			let err = orchestrator.advance(&request.id).await.unwrap_err();
			assert!(matches!(
				err,
				ProvisioningError::InvalidTransition {
					from: OnboardingStatus::Completed
				}
			));
			assert_eq!(harness.provider.calls().len(), 1);
		}

		#[tokio::test]
		async fn missing_request_is_not_found() {
			let harness = Harness::new().await;
			let err = harness
				.orchestrator()
				.advance(&RequestId::generate())
				.await
				.unwrap_err();
			assert!(matches!(err, ProvisioningError::NotFound(_)));
		}

		#[tokio::test]
		async fn re_advance_after_reset_reuses_org_and_artifacts() {
			let harness = Harness::new().await;
			harness.notifier.set_failing(true);
			let orchestrator = harness.orchestrator();
			let request = orchestrator
				.create_request(new_request("Acme", "owner@acme.io"))
				.await
				.unwrap();
			orchestrator.advance(&request.id).await.unwrap_err();
			let failed = orchestrator.get_request(&request.id).await.unwrap();

			let repo = OnboardingRepository::new(harness.pool.clone());
			assert!(repo.reset_to_pending(&request.id).await.unwrap());
			harness.notifier.set_failing(false);

			let done = orchestrator.advance(&request.id).await.unwrap();
			assert_eq!(done.status, OnboardingStatus::Completed);
			assert_eq!(done.metadata.org_id, failed.metadata.org_id);
			assert_eq!(done.metadata.project_id, failed.metadata.project_id);
			assert!(done.metadata.failure.is_none());
			assert_eq!(harness.provider.calls().len(), 1);
		}

		#[tokio::test]
		async fn slug_collision_gets_suffix() {
			let harness = Harness::new().await;
			let orchestrator = harness.orchestrator();
			let first = orchestrator
				.create_request(new_request("Acme", "a@acme.io"))
				.await
				.unwrap();
			let second = orchestrator
				.create_request(new_request("ACME!", "b@acme.io"))
				.await
				.unwrap();
			orchestrator.advance(&first.id).await.unwrap();
			orchestrator.advance(&second.id).await.unwrap();

			let orgs = OrgRepository::new(harness.pool.clone());
			let a = orgs.get_org_by_request_id(&first.id).await.unwrap().unwrap();
			let b = orgs.get_org_by_request_id(&second.id).await.unwrap().unwrap();
			assert_eq!(a.slug, "acme");
			assert!(b.slug.starts_with("acme-"));
			assert_ne!(a.id, b.id);
		}

		#[tokio::test]
		async fn concurrent_advances_provision_once() {
			let dir = tempfile::tempdir().unwrap();
			let url = format!("sqlite:{}", dir.path().join("advance.db").display());
			let pool = onboard_server_db::create_pool(&url).await.unwrap();
			onboard_server_db::run_migrations(&pool).await.unwrap();
			let harness = Harness::with_pool(pool);
			let orchestrator = harness.orchestrator();
			let request = orchestrator
				.create_request(new_request("Acme", "owner@acme.io"))
				.await
				.unwrap();

			let attempts: Vec<_> = (0..4)
				.map(|_| {
					let orchestrator = orchestrator.clone();
					let id = request.id;
					tokio::spawn(async move { orchestrator.advance(&id).await })
				})
				.collect();
			let mut ok = 0;
			for handle in attempts {
				if handle.await.unwrap().is_ok() {
					ok += 1;
				}
			}
			assert_eq!(ok, 1);
			assert_eq!(harness.provider.calls().len(), 1);
		}
	}

	mod status {
		use super::*;

		#[tokio::test]
		async fn never_exposes_keys() {
			let harness = Harness::new().await;
			let orchestrator = harness.orchestrator();
			let request = orchestrator
				.create_request(new_request("Acme", "owner@acme.io"))
				.await
				.unwrap();
			orchestrator.advance(&request.id).await.unwrap();

			let status = orchestrator.get_status(&request.id).await.unwrap();
			assert_eq!(status.status, OnboardingStatus::Completed);
			assert_eq!(status.agency_name, "Acme");
			let debug = format!("{status:?}");
			assert!(!debug.contains("service-key-value"));
			assert!(!debug.contains("anon-key-value"));
		}

		#[tokio::test]
		async fn failed_shows_generic_message() {
			let harness = Harness::new().await;
			harness.provider.set_failing(true);
			let orchestrator = harness.orchestrator();
			let request = orchestrator
				.create_request(new_request("Acme", "owner@acme.io"))
				.await
				.unwrap();
			orchestrator.advance(&request.id).await.unwrap_err();

			let status = orchestrator.get_status(&request.id).await.unwrap();
			assert_eq!(status.metadata.error.as_deref(), Some(PUBLIC_FAILURE_MESSAGE));
		}

		#[tokio::test]
		async fn status_read_changes_nothing() {
			let harness = Harness::new().await;
			let orchestrator = harness.orchestrator();
			let request = orchestrator
				.create_request(new_request("Acme", "owner@acme.io"))
				.await
				.unwrap();
			orchestrator.get_status(&request.id).await.unwrap();
			let stored = orchestrator.get_request(&request.id).await.unwrap();
			assert_eq!(stored.status, OnboardingStatus::Pending);
			assert_eq!(
				stored.updated_at.timestamp_micros(),
				request.updated_at.timestamp_micros()
			);
		}
	}

	mod slugs {
		use super::*;

		#[test]
		fn base36_encoding() {
			assert_eq!(to_base36(0), "0");
			assert_eq!(to_base36(35), "z");
			assert_eq!(to_base36(36), "10");
		}

		#[test]
		fn suffix_is_appended() {
			assert_eq!(slug_with_suffix("acme", 36), "acme-10");
		}

		proptest! {
			#[test]
			fn suffixed_slug_fits(name in ".{0,120}", stamp in any::<i64>()) {
				let slug = slug_with_suffix(&slugify(&name), stamp);
				prop_assert!(slug.len() <= MAX_SLUG_LEN);
				prop_assert!(!slug.starts_with('-'));
				prop_assert!(!slug.ends_with('-'));
				prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
			}
		}
	}
}
