// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use onboard_common_core::{BillingCycle, NewPaymentOrder, PaymentOrder, PaymentOrderStatus, Plan};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Checkout form submitted before the payer sees the processor form.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
	#[serde(default)]
	pub agency_name: String,
	#[serde(default)]
	pub admin_email: String,
	#[serde(default)]
	pub plan: Option<Plan>,
	#[serde(default)]
	pub billing_cycle: Option<BillingCycle>,
}

impl From<CreateOrderRequest> for NewPaymentOrder {
	fn from(form: CreateOrderRequest) -> Self {
		NewPaymentOrder {
			agency_name: form.agency_name,
			admin_email: form.admin_email,
			plan: form.plan.unwrap_or_default(),
			billing_cycle: form.billing_cycle.unwrap_or_default(),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
	pub order_id: String,
	/// Minor currency units (paise).
	pub amount: u64,
	pub amount_major: u64,
	pub currency: String,
	pub plan: Plan,
	pub billing_cycle: BillingCycle,
	/// Public key id for the checkout form.
	pub key_id: Option<String>,
	pub test_mode: bool,
}

impl CreateOrderResponse {
	pub fn new(order: &PaymentOrder, key_id: Option<&str>) -> Self {
		Self {
			order_id: order.order_id.clone(),
			amount: order.amount_minor,
			amount_major: order.amount_major(),
			currency: order.currency.clone(),
			plan: order.plan,
			billing_cycle: order.billing_cycle,
			key_id: key_id.map(str::to_string),
			test_mode: order.test_mode,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrderResponse {
	pub order_id: String,
	pub receipt: String,
	pub agency_name: String,
	pub admin_email: String,
	pub plan: Plan,
	pub billing_cycle: BillingCycle,
	pub amount: u64,
	pub currency: String,
	pub status: PaymentOrderStatus,
	pub test_mode: bool,
	pub payment_id: Option<String>,
	pub onboarding_request_id: Option<String>,
	pub created_at: DateTime<Utc>,
	pub paid_at: Option<DateTime<Utc>>,
}

impl From<PaymentOrder> for PaymentOrderResponse {
	fn from(order: PaymentOrder) -> Self {
		Self {
			order_id: order.order_id,
			receipt: order.receipt,
			agency_name: order.agency_name,
			admin_email: order.admin_email,
			plan: order.plan,
			billing_cycle: order.billing_cycle,
			amount: order.amount_minor,
			currency: order.currency,
			status: order.status,
			test_mode: order.test_mode,
			payment_id: order.payment_id,
			onboarding_request_id: order.onboarding_request_id.map(|id| id.to_string()),
			created_at: order.created_at,
			paid_at: order.paid_at,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListPaymentsResponse {
	pub payments: Vec<PaymentOrderResponse>,
	pub count: usize,
}

impl From<Vec<PaymentOrder>> for ListPaymentsResponse {
	fn from(orders: Vec<PaymentOrder>) -> Self {
		let payments: Vec<PaymentOrderResponse> = orders.into_iter().map(Into::into).collect();
		Self {
			count: payments.len(),
			payments,
		}
	}
}

/// Checkout callback. Missing fields deserialize as empty and are rejected
/// by validation rather than by the JSON extractor.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentVerifyRequest {
	#[serde(default, alias = "razorpay_order_id")]
	pub order_id: String,
	#[serde(default, alias = "razorpay_payment_id")]
	pub payment_id: String,
	#[serde(default, alias = "razorpay_signature")]
	pub signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentVerifyResponse {
	pub verified: bool,
	pub order_id: String,
	pub payment_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAckResponse {
	pub acknowledged: bool,
	/// Set when the event created (or matched) an onboarding request.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub request_id: Option<String>,
	#[serde(default)]
	pub duplicate: bool,
}
