// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use onboard_common_core::{
	BillingCycle, NewOnboardingRequest, OnboardingRequest, OnboardingStatus, Plan, PublicMetadata,
};
use onboard_server_provisioning::RequestStatus;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Public onboarding form.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOnboardingRequest {
	#[serde(default)]
	pub agency_name: String,
	#[serde(default)]
	pub admin_email: String,
	#[serde(default)]
	pub admin_name: Option<String>,
	#[serde(default)]
	pub website: Option<String>,
	#[serde(default)]
	pub plan: Option<Plan>,
	#[serde(default)]
	pub billing_cycle: Option<BillingCycle>,
	#[serde(default)]
	pub notes: Option<String>,
}

impl From<CreateOnboardingRequest> for NewOnboardingRequest {
	fn from(form: CreateOnboardingRequest) -> Self {
		NewOnboardingRequest {
			agency_name: form.agency_name,
			admin_email: form.admin_email,
			admin_name: form.admin_name,
			website: form.website,
			plan: form.plan.unwrap_or_default(),
			billing_cycle: form.billing_cycle.unwrap_or_default(),
			notes: form.notes,
			payment_order_id: None,
			payment_id: None,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOnboardingResponse {
	pub request_id: String,
	pub status: OnboardingStatus,
	pub created_at: DateTime<Utc>,
}

impl From<&OnboardingRequest> for CreateOnboardingResponse {
	fn from(request: &OnboardingRequest) -> Self {
		Self {
			request_id: request.id.to_string(),
			status: request.status,
			created_at: request.created_at,
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicMetadataResponse {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub instance_url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub project_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub started_at: Option<DateTime<Utc>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub completed_at: Option<DateTime<Utc>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

impl From<PublicMetadata> for PublicMetadataResponse {
	fn from(metadata: PublicMetadata) -> Self {
		Self {
			instance_url: metadata.instance_url,
			project_id: metadata.project_id,
			started_at: metadata.started_at,
			completed_at: metadata.completed_at,
			error: metadata.error,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingStatusResponse {
	pub request_id: String,
	pub status: OnboardingStatus,
	pub agency_name: String,
	pub admin_email: String,
	pub metadata: PublicMetadataResponse,
}

impl From<RequestStatus> for OnboardingStatusResponse {
	fn from(status: RequestStatus) -> Self {
		Self {
			request_id: status.id.to_string(),
			status: status.status,
			agency_name: status.agency_name,
			admin_email: status.admin_email,
			metadata: status.metadata.into(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn form_defaults_plan_and_cycle() {
		let form: CreateOnboardingRequest =
			serde_json::from_str(r#"{"agencyName":"Acme","adminEmail":"owner@acme.io"}"#).unwrap();
		let new: NewOnboardingRequest = form.into();
		assert_eq!(new.plan, Plan::Standard);
		assert_eq!(new.billing_cycle, BillingCycle::Monthly);
		assert!(new.payment_order_id.is_none());
	}

	#[test]
	fn form_parses_plan() {
		let form: CreateOnboardingRequest = serde_json::from_str(
			r#"{"agencyName":"Acme","adminEmail":"a@b.co","plan":"premium","billingCycle":"yearly"}"#,
		)
		.unwrap();
		assert_eq!(form.plan, Some(Plan::Premium));
		assert_eq!(form.billing_cycle, Some(BillingCycle::Yearly));
	}

	#[test]
	fn status_serializes_camel_case() {
		let response = OnboardingStatusResponse {
			request_id: "r".to_string(),
			status: OnboardingStatus::Failed,
			agency_name: "Acme".to_string(),
			admin_email: "owner@acme.io".to_string(),
			metadata: PublicMetadataResponse {
				error: Some("setup could not be completed".to_string()),
				..Default::default()
			},
		};
		let json = serde_json::to_value(&response).unwrap();
		assert_eq!(json["status"], "failed");
		assert_eq!(json["agencyName"], "Acme");
		assert_eq!(json["metadata"]["error"], "setup could not be completed");
		assert!(json["metadata"].get("instanceUrl").is_none());
	}
}
