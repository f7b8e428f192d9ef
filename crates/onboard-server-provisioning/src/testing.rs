// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fakes and a wired-up harness for tests of this crate and the server.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use onboard_common_core::{
	NewOnboardingRequest, OnboardingRequest, OrgId, Organization, ProvisionedKeys,
};
use onboard_common_secret::SecretString;
use onboard_server_db::testing::create_test_pool;
use onboard_server_db::{
	MagicLinkRepository, OnboardingRepository, OrgRepository, PaymentOrderRepository,
};
use onboard_server_email::{EmailError, SetupEmail, SetupNotifier};
use onboard_server_magiclink::MAGIC_LINK_TTL_HOURS;
use onboard_server_payment::{CreatedOrder, OrderDraft, OrderError, OrderGateway};
use sqlx::SqlitePool;

use crate::admin::AdminService;
use crate::magic_links::MagicLinkService;
use crate::orchestrator::{Orchestrator, OrchestratorSettings};
use crate::payment_orders::PaymentOrderService;
use crate::provider::{InfraProvisioner, ProviderError, ProvisionRequest, ProvisionedInstance};
use crate::setup::SetupService;

#[derive(Default)]
pub struct FakeProvisioner {
	calls: Mutex<Vec<ProvisionRequest>>,
	failing: AtomicBool,
	delay: Mutex<Option<Duration>>,
}

impl FakeProvisioner {
	pub fn set_failing(&self, failing: bool) {
		self.failing.store(failing, Ordering::SeqCst);
	}

	pub fn set_delay(&self, delay: Duration) {
		*self.delay.lock().unwrap() = Some(delay);
	}

	pub fn calls(&self) -> Vec<ProvisionRequest> {
		self.calls.lock().unwrap().clone()
	}
}

#[async_trait]
impl InfraProvisioner for FakeProvisioner {
	async fn provision(&self, request: &ProvisionRequest) -> Result<ProvisionedInstance, ProviderError> {
		self.calls.lock().unwrap().push(request.clone());
		let delay = *self.delay.lock().unwrap();
		if let Some(delay) = delay {
			tokio::time::sleep(delay).await;
		}
		if self.failing.load(Ordering::SeqCst) {
			return Err(ProviderError::Rejected { status: 500 });
		}
		Ok(ProvisionedInstance {
			instance_url: format!("https://{}.example.app", request.slug),
			project_id: format!("prj_{}", request.slug),
			deployment_id: Some("dpl_1".to_string()),
			keys: ProvisionedKeys {
				anon_key: SecretString::from("anon-key-value"),
				service_key: SecretString::from("service-key-value"),
			},
		})
	}
}

#[derive(Default)]
pub struct RecordingNotifier {
	sent: Mutex<Vec<SetupEmail>>,
	failing: AtomicBool,
}

impl RecordingNotifier {
	pub fn set_failing(&self, failing: bool) {
		self.failing.store(failing, Ordering::SeqCst);
	}

	pub fn sent(&self) -> Vec<SetupEmail> {
		self.sent.lock().unwrap().clone()
	}
}

#[async_trait]
impl SetupNotifier for RecordingNotifier {
	async fn send_setup_email(&self, email: &SetupEmail) -> Result<(), EmailError> {
		if self.failing.load(Ordering::SeqCst) {
			return Err(EmailError::NotConfigured);
		}
		self.sent.lock().unwrap().push(email.clone());
		Ok(())
	}
}

/// Records order drafts and answers like the processor would.
#[derive(Default)]
pub struct FakeOrderGateway {
	drafts: Mutex<Vec<OrderDraft>>,
	failing: AtomicBool,
}

impl FakeOrderGateway {
	pub fn set_failing(&self, failing: bool) {
		self.failing.store(failing, Ordering::SeqCst);
	}

	pub fn drafts(&self) -> Vec<OrderDraft> {
		self.drafts.lock().unwrap().clone()
	}
}

#[async_trait]
impl OrderGateway for FakeOrderGateway {
	async fn create_order(&self, draft: &OrderDraft) -> Result<CreatedOrder, OrderError> {
		if self.failing.load(Ordering::SeqCst) {
			return Err(OrderError::Rejected { status: 500 });
		}
		let mut drafts = self.drafts.lock().unwrap();
		drafts.push(draft.clone());
		Ok(CreatedOrder {
			id: format!("order_fake_{}", drafts.len()),
			amount: draft.amount,
			currency: draft.currency.clone(),
			receipt: Some(draft.receipt.clone()),
			status: "created".to_string(),
		})
	}
}

pub const TEST_BASE_URL: &str = "https://app.example.com";

pub fn test_settings() -> OrchestratorSettings {
	OrchestratorSettings {
		base_url: TEST_BASE_URL.to_string(),
		provider_timeout: Duration::from_secs(5),
		email_timeout: Duration::from_secs(5),
	}
}

/// In-memory database plus fakes, with every service wired to them.
pub struct Harness {
	pub pool: SqlitePool,
	pub provider: Arc<FakeProvisioner>,
	pub notifier: Arc<RecordingNotifier>,
	pub gateway: Arc<FakeOrderGateway>,
	pub settings: OrchestratorSettings,
}

impl Harness {
	pub async fn new() -> Self {
		Self::with_pool(create_test_pool().await)
	}

	pub fn with_pool(pool: SqlitePool) -> Self {
		Self {
			pool,
			provider: Arc::new(FakeProvisioner::default()),
			notifier: Arc::new(RecordingNotifier::default()),
			gateway: Arc::new(FakeOrderGateway::default()),
			settings: test_settings(),
		}
	}

	pub fn magic_links(&self) -> MagicLinkService {
		MagicLinkService::new(
			Arc::new(MagicLinkRepository::new(self.pool.clone())),
			chrono::Duration::hours(MAGIC_LINK_TTL_HOURS),
		)
	}

	pub fn orchestrator(&self) -> Arc<Orchestrator> {
		Arc::new(Orchestrator::new(
			Arc::new(OnboardingRepository::new(self.pool.clone())),
			Arc::new(OrgRepository::new(self.pool.clone())),
			self.magic_links(),
			self.provider.clone(),
			self.notifier.clone(),
			self.settings.clone(),
		))
	}

	pub fn admin(&self) -> AdminService {
		AdminService::new(
			Arc::new(OnboardingRepository::new(self.pool.clone())),
			Arc::new(OrgRepository::new(self.pool.clone())),
			self.magic_links(),
			self.notifier.clone(),
			self.orchestrator(),
			self.settings.clone(),
		)
	}

	pub fn payment_orders(&self) -> PaymentOrderService {
		PaymentOrderService::new(
			Arc::new(PaymentOrderRepository::new(self.pool.clone())),
			self.gateway.clone(),
			Some("rzp_live_fake".to_string()),
		)
	}

	pub fn setup(&self) -> SetupService {
		SetupService::new(
			Arc::new(OrgRepository::new(self.pool.clone())),
			self.magic_links(),
		)
	}
}

pub fn new_request(agency: &str, email: &str) -> NewOnboardingRequest {
	NewOnboardingRequest {
		agency_name: agency.to_string(),
		admin_email: email.to_string(),
		..Default::default()
	}
}

/// Insert a request and its organization directly, bypassing the orchestrator.
pub async fn seed_org(pool: &SqlitePool) -> OrgId {
	let request = OnboardingRequest::pending(new_request("Seed Co", "owner@seed.io"), Utc::now());
	OnboardingRepository::new(pool.clone())
		.create_request(&request)
		.await
		.unwrap();
	let org = Organization::for_request(&request, format!("seed-{}", request.id), Utc::now());
	OrgRepository::new(pool.clone()).create_org(&org).await.unwrap();
	org.id
}
