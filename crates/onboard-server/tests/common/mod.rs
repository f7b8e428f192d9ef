// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared setup for the HTTP integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
	body::Body,
	http::{header, Request, StatusCode},
	Router,
};
use onboard_common_secret::SecretString;
use onboard_server::{create_app_state_with, create_router, AppState, ServerConfig};
use onboard_server_auth::hash_admin_token;
use onboard_server_config::{
	AdminConfigLayer, AdminCredentialEntry, HttpConfigLayer, PaymentConfigLayer,
	ProvisioningConfigLayer, ServerConfigLayer,
};
use onboard_server_payment::{compute_hmac_sha256, signing_payload, PAYMENT_SIGNATURE_HEADER};
use onboard_server_provisioning::testing::{FakeProvisioner, RecordingNotifier, TEST_BASE_URL};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub const KEY_SECRET: &str = "test_key_secret";
pub const WEBHOOK_SECRET: &str = "test_webhook_secret";
pub const ADMIN_TOKEN: &str = "adm_test_token";
pub const SUPPORT_TOKEN: &str = "sup_test_token";

pub struct TestApp {
	pub router: Router,
	pub state: AppState,
	pub provider: Arc<FakeProvisioner>,
	pub notifier: Arc<RecordingNotifier>,
	_dir: TempDir,
}

pub fn config_layer() -> ServerConfigLayer {
	ServerConfigLayer {
		http: Some(HttpConfigLayer {
			base_url: Some(TEST_BASE_URL.to_string()),
			..Default::default()
		}),
		payment: Some(PaymentConfigLayer {
			key_id: Some("rzp_test_key".to_string()),
			key_secret: Some(SecretString::from(KEY_SECRET)),
			webhook_secret: Some(SecretString::from(WEBHOOK_SECRET)),
			..Default::default()
		}),
		admin: Some(AdminConfigLayer {
			credentials: Some(vec![
				AdminCredentialEntry {
					subject: "ops@example.com".to_string(),
					token_sha256: hash_admin_token(ADMIN_TOKEN),
					roles: vec!["onboarding_admin".to_string()],
				},
				AdminCredentialEntry {
					subject: "support@example.com".to_string(),
					token_sha256: hash_admin_token(SUPPORT_TOKEN),
					roles: vec!["support".to_string()],
				},
			]),
		}),
		..Default::default()
	}
}

pub fn test_config() -> ServerConfig {
	onboard_server_config::finalize(config_layer()).unwrap()
}

pub fn auto_advance_config() -> ServerConfig {
	let mut layer = config_layer();
	layer.provisioning = Some(ProvisioningConfigLayer {
		auto_advance: Some(true),
		..Default::default()
	});
	onboard_server_config::finalize(layer).unwrap()
}

/// Creates a test app with an isolated on-disk database.
pub async fn setup_test_app() -> TestApp {
	setup_test_app_with(test_config()).await
}

pub async fn setup_test_app_with(config: ServerConfig) -> TestApp {
	let dir = tempfile::tempdir().unwrap();
	let db_path = dir.path().join("onboard.db");
	let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
	let pool = onboard_server_db::create_pool(&db_url).await.unwrap();
	onboard_server_db::run_migrations(&pool).await.unwrap();

	let provider = Arc::new(FakeProvisioner::default());
	let notifier = Arc::new(RecordingNotifier::default());
	let state = create_app_state_with(pool, &config, provider.clone(), notifier.clone());

	TestApp {
		router: create_router(state.clone()),
		state,
		provider,
		notifier,
		_dir: dir,
	}
}

impl TestApp {
	pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
		let response = self.router.clone().oneshot(request).await.unwrap();
		let status = response.status();
		let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
			.await
			.unwrap();
		let body = if bytes.is_empty() {
			Value::Null
		} else {
			serde_json::from_slice(&bytes).unwrap()
		};
		(status, body)
	}

	pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
		let mut builder = Request::builder().method("GET").uri(uri);
		if let Some(token) = token {
			builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
		}
		self.send(builder.body(Body::empty()).unwrap()).await
	}

	pub async fn post_json(&self, uri: &str, body: Value, token: Option<&str>) -> (StatusCode, Value) {
		let mut builder = Request::builder()
			.method("POST")
			.uri(uri)
			.header(header::CONTENT_TYPE, "application/json");
		if let Some(token) = token {
			builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
		}
		self.send(builder.body(Body::from(body.to_string())).unwrap()).await
	}

	pub async fn post_webhook(&self, body: &str, signature: Option<&str>) -> (StatusCode, Value) {
		let mut builder = Request::builder()
			.method("POST")
			.uri("/api/payment/webhook")
			.header(header::CONTENT_TYPE, "application/json");
		if let Some(signature) = signature {
			builder = builder.header(PAYMENT_SIGNATURE_HEADER, signature);
		}
		self.send(builder.body(Body::from(body.to_string())).unwrap()).await
	}

	/// Create a request through the public form and return its id.
	pub async fn create_request(&self, agency: &str, email: &str) -> String {
		let (status, body) = self
			.post_json(
				"/api/onboarding",
				serde_json::json!({ "agencyName": agency, "adminEmail": email, "plan": "premium" }),
				None,
			)
			.await;
		assert_eq!(status, StatusCode::CREATED, "{body}");
		body["requestId"].as_str().unwrap().to_string()
	}

	pub async fn advance(&self, id: &str) -> (StatusCode, Value) {
		self
			.post_json(
				&format!("/api/admin/onboarding/{id}/advance"),
				Value::Null,
				Some(ADMIN_TOKEN),
			)
			.await
	}

	/// Token from the most recent setup email.
	pub fn last_setup_token(&self) -> String {
		let sent = self.notifier.sent();
		let email = sent.last().expect("a setup email was sent");
		email
			.setup_url
			.expose()
			.rsplit("token=")
			.next()
			.unwrap()
			.to_string()
	}
}

pub fn checkout_signature(order_id: &str, payment_id: &str) -> String {
	compute_hmac_sha256(
		KEY_SECRET.as_bytes(),
		signing_payload(order_id, payment_id).as_bytes(),
	)
	.unwrap()
}

pub fn webhook_signature(body: &str) -> String {
	compute_hmac_sha256(WEBHOOK_SECRET.as_bytes(), body.as_bytes()).unwrap()
}

pub fn captured_event(order_id: &str) -> String {
	serde_json::json!({
		"entity": "event",
		"event": "payment.captured",
		"payload": {
			"payment": {
				"entity": {
					"id": format!("pay_{order_id}"),
					"order_id": order_id,
					"amount": 99900,
					"email": "payer@acme.io",
					"notes": {
						"agency_name": "Acme Studio",
						"admin_email": "Owner@Acme.io",
						"plan": "standard",
						"billing_cycle": "monthly"
					}
				}
			}
		}
	})
	.to_string()
}
