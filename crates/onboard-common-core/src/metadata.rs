// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Typed provisioning metadata stored on each onboarding request.
//!
//! [`ProvisioningMetadata`] serializes provider keys in clear text so they
//! survive storage. It is a persistence record: anything crossing the HTTP
//! boundary goes through [`ProvisioningMetadata::public_view`] instead.

use chrono::{DateTime, Utc};
use onboard_common_secret::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::ids::OrgId;
use crate::onboarding::OnboardingStatus;

/// The only failure detail unauthenticated callers ever see.
pub const PUBLIC_FAILURE_MESSAGE: &str = "setup could not be completed";

/// Steps of an `advance` run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningStep {
	CreateOrganization,
	ProvisionInfrastructure,
	RecordArtifacts,
	IssueMagicLink,
	SendSetupEmail,
	Complete,
}

impl ProvisioningStep {
	pub fn as_str(&self) -> &'static str {
		match self {
			ProvisioningStep::CreateOrganization => "create_organization",
			ProvisioningStep::ProvisionInfrastructure => "provision_infrastructure",
			ProvisioningStep::RecordArtifacts => "record_artifacts",
			ProvisioningStep::IssueMagicLink => "issue_magic_link",
			ProvisioningStep::SendSetupEmail => "send_setup_email",
			ProvisioningStep::Complete => "complete",
		}
	}
}

impl fmt::Display for ProvisioningStep {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Access keys for the provisioned backend instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionedKeys {
	#[serde(with = "onboard_common_secret::persist")]
	pub anon_key: SecretString,
	#[serde(with = "onboard_common_secret::persist")]
	pub service_key: SecretString,
}

/// Why the last `advance` run stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProvisioningFailure {
	pub step: ProvisioningStep,
	pub message: String,
	pub correlation_id: Uuid,
	pub failed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningMetadata {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub org_id: Option<OrgId>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub instance_url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub project_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub deployment_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub keys: Option<ProvisionedKeys>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub started_at: Option<DateTime<Utc>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub completed_at: Option<DateTime<Utc>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub setup_email_sent_at: Option<DateTime<Utc>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub failure: Option<ProvisioningFailure>,
}

impl ProvisioningMetadata {
	/// True once a provider call has succeeded for this request.
	pub fn has_artifacts(&self) -> bool {
		self.project_id.is_some() && self.instance_url.is_some() && self.keys.is_some()
	}

	pub fn record_failure(
		&mut self,
		step: ProvisioningStep,
		message: impl Into<String>,
		correlation_id: Uuid,
		now: DateTime<Utc>,
	) {
		self.failure = Some(ProvisioningFailure {
			step,
			message: message.into(),
			correlation_id,
			failed_at: now,
		});
	}

	/// Subset safe to return to unauthenticated callers.
	pub fn public_view(&self, status: OnboardingStatus) -> PublicMetadata {
		let failed = status == OnboardingStatus::Failed;
		PublicMetadata {
			instance_url: self.instance_url.clone(),
			project_id: self.project_id.clone(),
			started_at: self.started_at,
			completed_at: self.completed_at,
			error: failed.then(|| PUBLIC_FAILURE_MESSAGE.to_string()),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PublicMetadata {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub instance_url: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub project_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub started_at: Option<DateTime<Utc>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub completed_at: Option<DateTime<Utc>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn provisioned() -> ProvisioningMetadata {
		ProvisioningMetadata {
			org_id: Some(OrgId::generate()),
			instance_url: Some("https://acme.example.app".to_string()),
			project_id: Some("proj_123".to_string()),
			deployment_id: Some("dpl_9".to_string()),
			keys: Some(ProvisionedKeys {
				anon_key: SecretString::from("anon-secret-value"),
				service_key: SecretString::from("service-secret-value"),
			}),
			..Default::default()
		}
	}

	#[test]
	fn storage_round_trip_keeps_keys() {
		let metadata = provisioned();
		let json = serde_json::to_string(&metadata).unwrap();
		let back: ProvisioningMetadata = serde_json::from_str(&json).unwrap();
		assert_eq!(back, metadata);
		assert!(back.has_artifacts());
	}

	#[test]
	fn empty_object_decodes_to_default() {
		let metadata: ProvisioningMetadata = serde_json::from_str("{}").unwrap();
		assert_eq!(metadata, ProvisioningMetadata::default());
		assert!(!metadata.has_artifacts());
	}

	#[test]
	fn public_view_never_contains_keys() {
		let view = provisioned().public_view(OnboardingStatus::Completed);
		let json = serde_json::to_string(&view).unwrap();
		assert!(!json.contains("anon-secret-value"));
		assert!(!json.contains("service-secret-value"));
		assert!(json.contains("proj_123"));
		assert!(view.error.is_none());
	}

	#[test]
	fn public_view_hides_failure_detail() {
		let mut metadata = ProvisioningMetadata::default();
		metadata.record_failure(
			ProvisioningStep::ProvisionInfrastructure,
			"provider returned 500: quota exceeded for project acme",
			Uuid::new_v4(),
			Utc::now(),
		);
		let view = metadata.public_view(OnboardingStatus::Failed);
		assert_eq!(view.error.as_deref(), Some(PUBLIC_FAILURE_MESSAGE));
		let json = serde_json::to_string(&view).unwrap();
		assert!(!json.contains("quota"));
	}

	#[test]
	fn steps_serialize_in_snake_case() {
		let json = serde_json::to_string(&ProvisioningStep::SendSetupEmail).unwrap();
		assert_eq!(json, "\"send_setup_email\"");
		assert_eq!(ProvisioningStep::SendSetupEmail.to_string(), "send_setup_email");
	}
}
