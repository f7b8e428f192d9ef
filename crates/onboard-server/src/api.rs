// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application state and router.

use std::sync::Arc;

use axum::{
	routing::{get, post},
	Router,
};
use onboard_server_auth::CredentialVerifier;
use onboard_server_config::ServerConfig;
use onboard_server_db::{
	MagicLinkRepository, OnboardingRepository, OrgRepository, PaymentOrderRepository,
};
use onboard_server_email::{DisabledNotifier, EmailService, SetupNotifier};
use onboard_server_payment::{
	order_gateway_for, OrderGateway, PaymentVerifier, UnconfiguredOrderGateway,
};
use onboard_server_provisioning::{
	AdminService, HttpInfraProvisioner, InfraProvisioner, MagicLinkService, Orchestrator,
	OrchestratorSettings, PaymentOrderService, SetupService, UnconfiguredProvisioner,
};
use onboard_server_smtp::SmtpClient;
use sqlx::SqlitePool;

use crate::routes;

#[derive(Clone)]
pub struct AppState {
	pub pool: SqlitePool,
	pub orchestrator: Arc<Orchestrator>,
	pub admin: Arc<AdminService>,
	pub setup: Arc<SetupService>,
	/// Absent when no payment key secret is configured.
	pub payment: Option<Arc<PaymentVerifier>>,
	pub orders: Arc<PaymentOrderService>,
	pub credentials: Arc<CredentialVerifier>,
	/// Advance paid requests from the webhook handler.
	pub auto_advance: bool,
}

/// Build state with the provider and notifier described by `config`.
///
/// A provider or SMTP relay that cannot be constructed is logged and
/// replaced by its unconfigured stand-in; requests that need it then fail
/// at the corresponding step.
pub async fn create_app_state(pool: SqlitePool, config: &ServerConfig) -> AppState {
	let provider: Arc<dyn InfraProvisioner> = match &config.provisioning.provider_url {
		Some(url) => match HttpInfraProvisioner::new(
			url.clone(),
			config.provisioning.provider_token.clone(),
			config.provisioning.provider_timeout,
		) {
			Ok(client) => {
				tracing::info!(provider_url = %url, "infrastructure provider configured");
				Arc::new(client)
			}
			Err(e) => {
				tracing::error!(error = %e, "failed to build infrastructure provider client");
				Arc::new(UnconfiguredProvisioner)
			}
		},
		None => {
			tracing::warn!("no infrastructure provider configured, provisioning will fail");
			Arc::new(UnconfiguredProvisioner)
		}
	};

	let notifier: Arc<dyn SetupNotifier> = match &config.smtp {
		Some(smtp) => {
			let smtp_config = onboard_server_smtp::SmtpConfig {
				host: smtp.host.clone(),
				port: smtp.port,
				username: smtp.username.clone(),
				password: smtp.password.clone(),
				from_address: smtp.from_address.clone(),
				from_name: smtp.from_name.clone(),
				use_tls: smtp.use_tls,
			};
			match SmtpClient::new(smtp_config) {
				Ok(client) => {
					tracing::info!(host = %smtp.host, port = smtp.port, "SMTP configured");
					Arc::new(EmailService::new(client))
				}
				Err(e) => {
					tracing::error!(error = %e, "failed to build SMTP client");
					Arc::new(DisabledNotifier)
				}
			}
		}
		None => {
			tracing::warn!("SMTP not configured, setup emails will not be sent");
			Arc::new(DisabledNotifier)
		}
	};

	create_app_state_with(pool, config, provider, notifier)
}

/// Build state around an explicit provider and notifier.
pub fn create_app_state_with(
	pool: SqlitePool,
	config: &ServerConfig,
	provider: Arc<dyn InfraProvisioner>,
	notifier: Arc<dyn SetupNotifier>,
) -> AppState {
	let requests = Arc::new(OnboardingRepository::new(pool.clone()));
	let orgs = Arc::new(OrgRepository::new(pool.clone()));
	let links = MagicLinkService::new(
		Arc::new(MagicLinkRepository::new(pool.clone())),
		chrono::Duration::hours(config.magic_link.ttl_hours),
	);
	let settings = OrchestratorSettings {
		base_url: config.http.base_url.clone(),
		provider_timeout: config.provisioning.provider_timeout,
		email_timeout: config.provisioning.email_timeout,
	};

	let orchestrator = Arc::new(Orchestrator::new(
		requests.clone(),
		orgs.clone(),
		links.clone(),
		provider,
		notifier.clone(),
		settings.clone(),
	));
	let admin = AdminService::new(
		requests,
		orgs.clone(),
		links.clone(),
		notifier,
		orchestrator.clone(),
		settings,
	);
	let setup = SetupService::new(orgs, links);

	let payment = match &config.payment.key_secret {
		Some(key_secret) => Some(Arc::new(PaymentVerifier::new(
			key_secret.clone(),
			config.payment.webhook_secret.clone(),
		))),
		None => {
			tracing::warn!("payment key secret not configured, payment endpoints are disabled");
			None
		}
	};

	let gateway: Arc<dyn OrderGateway> = match &config.payment.key_secret {
		Some(key_secret) => match order_gateway_for(
			config.payment.key_id.as_deref(),
			key_secret,
			&config.payment.orders_api_url,
			std::time::Duration::from_secs(config.payment.order_timeout_secs),
		) {
			Ok(gateway) => {
				tracing::info!(test_mode = gateway.is_test_mode(), "payment orders configured");
				gateway
			}
			Err(e) => {
				tracing::error!(error = %e, "failed to build payment orders client");
				Arc::new(UnconfiguredOrderGateway)
			}
		},
		None => Arc::new(UnconfiguredOrderGateway),
	};
	let orders = PaymentOrderService::new(
		Arc::new(PaymentOrderRepository::new(pool.clone())),
		gateway,
		config.payment.key_id.clone(),
	);

	let credentials = CredentialVerifier::new(config.admin.credentials.clone());
	if credentials.is_empty() {
		tracing::warn!("no admin credentials configured, admin endpoints will reject every request");
	}

	AppState {
		pool,
		orchestrator,
		admin: Arc::new(admin),
		setup: Arc::new(setup),
		payment,
		orders: Arc::new(orders),
		credentials: Arc::new(credentials),
		auto_advance: config.provisioning.auto_advance,
	}
}

pub fn create_router(state: AppState) -> Router {
	let public = Router::new()
		.route("/health", get(routes::health::health_check))
		.route("/api/openapi.json", get(routes::docs::openapi_json))
		// Payment intake
		.route(
			"/api/payment/create-order",
			post(routes::payment::create_order),
		)
		.route("/api/payment/verify", post(routes::payment::verify_payment))
		.route("/api/payment/webhook", post(routes::payment::payment_webhook))
		// Public onboarding form and polling
		.route(
			"/api/onboarding",
			post(routes::onboarding::create_onboarding_request),
		)
		.route(
			"/api/onboarding/{id}/status",
			get(routes::onboarding::get_onboarding_status),
		)
		// Setup link landing
		.route("/api/setup/verify-token", post(routes::setup::verify_token))
		.route("/api/setup/complete", post(routes::setup::complete_setup));

	// Admin routes authenticate with RequireAdmin; the policy decides per action.
	let admin = Router::new()
		.route("/api/admin/onboarding", get(routes::admin::list_requests))
		.route("/api/admin/onboarding/{id}", get(routes::admin::get_request))
		.route(
			"/api/admin/onboarding/{id}/advance",
			post(routes::admin::advance_request),
		)
		.route(
			"/api/admin/onboarding/{id}/reset",
			post(routes::admin::reset_request),
		)
		.route(
			"/api/admin/onboarding/{id}/resend-email",
			post(routes::admin::resend_email),
		)
		.route("/api/admin/payments", get(routes::admin::list_payments));

	public.merge(admin).with_state(state)
}
