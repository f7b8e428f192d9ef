// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Infrastructure provider client.
//!
//! The provider is a black box that turns a tenant into a running instance.
//! Every call carries the onboarding request id as `Idempotency-Key`, so a
//! re-advance after a failure cannot create a second set of resources.

use std::time::Duration;

use async_trait::async_trait;
use onboard_common_core::{OrgId, Plan, ProvisionedKeys, RequestId};
use onboard_common_secret::SecretString;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
	#[error("infrastructure provider is not configured")]
	NotConfigured,

	#[error("request timed out")]
	Timeout,

	#[error("network error: {0}")]
	Network(#[from] reqwest::Error),

	#[error("provider rejected the request with status {status}")]
	Rejected { status: u16 },

	#[error("invalid provider response: {0}")]
	InvalidResponse(String),
}

/// What the provider needs to create a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionRequest {
	pub request_id: RequestId,
	pub org_id: OrgId,
	pub name: String,
	pub slug: String,
	pub plan: Plan,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedInstance {
	pub instance_url: String,
	pub project_id: String,
	pub deployment_id: Option<String>,
	pub keys: ProvisionedKeys,
}

#[async_trait]
pub trait InfraProvisioner: Send + Sync {
	async fn provision(&self, request: &ProvisionRequest) -> Result<ProvisionedInstance, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct ProviderResponse {
	instance_url: String,
	project_id: String,
	#[serde(default)]
	deployment_id: Option<String>,
	anon_key: String,
	service_key: String,
}

/// Provider reached over HTTPS: `POST {base_url}/v1/tenants`.
#[derive(Clone)]
pub struct HttpInfraProvisioner {
	http_client: Client,
	base_url: String,
	token: Option<SecretString>,
}

impl HttpInfraProvisioner {
	pub fn new(
		base_url: impl Into<String>,
		token: Option<SecretString>,
		timeout: Duration,
	) -> Result<Self, ProviderError> {
		let http_client = Client::builder()
			.timeout(timeout)
			.user_agent(concat!("onboard/", env!("CARGO_PKG_VERSION")))
			.build()?;

		Ok(Self {
			http_client,
			base_url: base_url.into().trim_end_matches('/').to_string(),
			token,
		})
	}

	fn tenants_url(&self) -> String {
		format!("{}/v1/tenants", self.base_url)
	}
}

#[async_trait]
impl InfraProvisioner for HttpInfraProvisioner {
	#[instrument(
		name = "provider.provision",
		skip(self, request),
		fields(request_id = %request.request_id, slug = %request.slug)
	)]
	async fn provision(&self, request: &ProvisionRequest) -> Result<ProvisionedInstance, ProviderError> {
		let mut builder = self
			.http_client
			.post(self.tenants_url())
			.header(IDEMPOTENCY_KEY_HEADER, request.request_id.to_string())
			.json(request);
		if let Some(token) = &self.token {
			builder = builder.bearer_auth(token.expose());
		}

		debug!(url = %self.tenants_url(), "sending provisioning request");
		let response = builder.send().await.map_err(|e| {
			if e.is_timeout() {
				error!("provider request timed out");
				return ProviderError::Timeout;
			}
			error!(error = %e, "network error calling provider");
			ProviderError::Network(e)
		})?;

		let status = response.status();
		if !status.is_success() {
			// The body may echo tenant details; it stays in debug logs only.
			let body = response.text().await.unwrap_or_default();
			error!(status = status.as_u16(), "provider rejected provisioning request");
			debug!(body = %body, "provider error body");
			return Err(ProviderError::Rejected {
				status: status.as_u16(),
			});
		}

		let parsed: ProviderResponse = response
			.json()
			.await
			.map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

		debug!(project_id = %parsed.project_id, "tenant provisioned");
		Ok(ProvisionedInstance {
			instance_url: parsed.instance_url,
			project_id: parsed.project_id,
			deployment_id: parsed.deployment_id,
			keys: ProvisionedKeys {
				anon_key: SecretString::new(parsed.anon_key),
				service_key: SecretString::new(parsed.service_key),
			},
		})
	}
}

/// Stand-in when no provider URL is configured. Every call fails.
pub struct UnconfiguredProvisioner;

#[async_trait]
impl InfraProvisioner for UnconfiguredProvisioner {
	async fn provision(&self, _request: &ProvisionRequest) -> Result<ProvisionedInstance, ProviderError> {
		Err(ProviderError::NotConfigured)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use wiremock::matchers::{header, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn request() -> ProvisionRequest {
		ProvisionRequest {
			request_id: RequestId::generate(),
			org_id: OrgId::generate(),
			name: "Acme Studio".to_string(),
			slug: "acme-studio".to_string(),
			plan: Plan::Standard,
		}
	}

	fn client(server: &MockServer) -> HttpInfraProvisioner {
		HttpInfraProvisioner::new(
			server.uri(),
			Some(SecretString::from("provider-token")),
			Duration::from_secs(5),
		)
		.unwrap()
	}

	#[tokio::test]
	async fn sends_idempotency_key_and_parses_instance() {
		let server = MockServer::start().await;
		let req = request();

		Mock::given(method("POST"))
			.and(path("/v1/tenants"))
			.and(header("authorization", "Bearer provider-token"))
			.and(header("idempotency-key", req.request_id.to_string().as_str()))
			.respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
				"instance_url": "https://acme-studio.example.app",
				"project_id": "prj_123",
				"deployment_id": "dpl_9",
				"anon_key": "anon",
				"service_key": "service"
			})))
			.expect(1)
			.mount(&server)
			.await;

		let instance = client(&server).provision(&req).await.unwrap();
		assert_eq!(instance.instance_url, "https://acme-studio.example.app");
		assert_eq!(instance.project_id, "prj_123");
		assert_eq!(instance.deployment_id.as_deref(), Some("dpl_9"));
		assert_eq!(instance.keys.service_key.expose(), "service");
	}

	#[tokio::test]
	async fn error_status_is_rejected_without_body() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(500).set_body_string("quota exceeded for acme"))
			.mount(&server)
			.await;

		let err = client(&server).provision(&request()).await.unwrap_err();
		assert!(matches!(err, ProviderError::Rejected { status: 500 }));
		assert!(!err.to_string().contains("quota"));
	}

	#[tokio::test]
	async fn malformed_body_is_invalid_response() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
			.mount(&server)
			.await;

		let err = client(&server).provision(&request()).await.unwrap_err();
		assert!(matches!(err, ProviderError::InvalidResponse(_)));
	}

	#[tokio::test]
	async fn slow_provider_times_out() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
			.mount(&server)
			.await;

		let provisioner =
			HttpInfraProvisioner::new(server.uri(), None, Duration::from_millis(100)).unwrap();
		let err = provisioner.provision(&request()).await.unwrap_err();
		assert!(matches!(err, ProviderError::Timeout));
	}

	#[tokio::test]
	async fn unconfigured_always_fails() {
		let err = UnconfiguredProvisioner.provision(&request()).await.unwrap_err();
		assert!(matches!(err, ProviderError::NotConfigured));
	}
}
