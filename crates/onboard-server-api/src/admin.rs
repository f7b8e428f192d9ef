// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use onboard_common_core::{BillingCycle, OnboardingStatus, Plan, ProvisioningFailure, ProvisioningStep};
use onboard_server_provisioning::{AdminRequestView, ResendReceipt};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListRequestsParams {
	/// Clamped to 1..=200.
	pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FailureResponse {
	pub step: ProvisioningStep,
	pub message: String,
	pub correlation_id: Uuid,
	pub failed_at: DateTime<Utc>,
}

impl From<ProvisioningFailure> for FailureResponse {
	fn from(failure: ProvisioningFailure) -> Self {
		Self {
			step: failure.step,
			message: failure.message,
			correlation_id: failure.correlation_id,
			failed_at: failure.failed_at,
		}
	}
}

/// Admin view of one request. Provisioned keys are never included.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminRequestResponse {
	pub id: String,
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
	pub org_id: Option<String>,
	pub instance_url: Option<String>,
	pub project_id: Option<String>,
	pub deployment_id: Option<String>,
	pub started_at: Option<DateTime<Utc>>,
	pub completed_at: Option<DateTime<Utc>>,
	pub setup_email_sent_at: Option<DateTime<Utc>>,
	pub failure: Option<FailureResponse>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl From<AdminRequestView> for AdminRequestResponse {
	fn from(view: AdminRequestView) -> Self {
		Self {
			id: view.id.to_string(),
			agency_name: view.agency_name,
			admin_email: view.admin_email,
			admin_name: view.admin_name,
			website: view.website,
			plan: view.plan,
			billing_cycle: view.billing_cycle,
			notes: view.notes,
			status: view.status,
			payment_order_id: view.payment_order_id,
			payment_id: view.payment_id,
			org_id: view.org_id.map(|id| id.to_string()),
			instance_url: view.instance_url,
			project_id: view.project_id,
			deployment_id: view.deployment_id,
			started_at: view.started_at,
			completed_at: view.completed_at,
			setup_email_sent_at: view.setup_email_sent_at,
			failure: view.failure.map(FailureResponse::from),
			created_at: view.created_at,
			updated_at: view.updated_at,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListRequestsResponse {
	pub requests: Vec<AdminRequestResponse>,
	pub count: usize,
}

impl From<Vec<AdminRequestView>> for ListRequestsResponse {
	fn from(views: Vec<AdminRequestView>) -> Self {
		let requests: Vec<AdminRequestResponse> = views.into_iter().map(Into::into).collect();
		Self {
			count: requests.len(),
			requests,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResendEmailResponse {
	pub sent: bool,
	pub email: String,
	pub link_expires_at: DateTime<Utc>,
}

impl From<ResendReceipt> for ResendEmailResponse {
	fn from(receipt: ResendReceipt) -> Self {
		Self {
			sent: true,
			email: receipt.email,
			link_expires_at: receipt.expires_at,
		}
	}
}
