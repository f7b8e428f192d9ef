// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Checkout order creation with the payment processor.
//!
//! The processor signs `"{order_id}|{payment_id}"` after checkout, so an order
//! must exist before the payer sees the payment form. Test-mode key ids
//! (`rzp_test…`) never reach the processor; [`TestModeOrderGateway`] mints a
//! local order id instead.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use onboard_common_core::{NewPaymentOrder, ORDER_CURRENCY};
use onboard_common_secret::SecretString;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};
use uuid::Uuid;

const TEST_KEY_PREFIX: &str = "rzp_test";

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
	#[error("payment processor is not configured")]
	NotConfigured,

	#[error("request timed out")]
	Timeout,

	#[error("network error: {0}")]
	Network(#[from] reqwest::Error),

	#[error("processor rejected the order with status {status}")]
	Rejected { status: u16 },

	#[error("invalid processor response: {0}")]
	InvalidResponse(String),
}

/// Notes attached to the processor order. The webhook echoes them back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderNotes {
	pub agency_name: String,
	pub admin_email: String,
	pub plan: String,
	pub billing_cycle: String,
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDraft {
	/// Minor currency units.
	pub amount: u64,
	pub currency: String,
	pub receipt: String,
	pub description: String,
	pub notes: OrderNotes,
}

impl OrderDraft {
	pub fn for_order(order: &NewPaymentOrder, receipt: String) -> Self {
		Self {
			amount: order.amount_minor(),
			currency: ORDER_CURRENCY.to_string(),
			receipt,
			description: order.description(),
			notes: OrderNotes {
				agency_name: order.agency_name.clone(),
				admin_email: order.admin_email.clone(),
				plan: order.plan.as_str().to_string(),
				billing_cycle: order.billing_cycle.as_str().to_string(),
			},
		}
	}
}

/// A unique receipt id: `onboarding-{millis}-{7 random chars}`.
pub fn new_receipt() -> String {
	let random = Uuid::new_v4().simple().to_string();
	format!("onboarding-{}-{}", Utc::now().timestamp_millis(), &random[..7])
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedOrder {
	pub id: String,
	pub amount: u64,
	pub currency: String,
	#[serde(default)]
	pub receipt: Option<String>,
	pub status: String,
}

#[async_trait]
pub trait OrderGateway: Send + Sync {
	async fn create_order(&self, draft: &OrderDraft) -> Result<CreatedOrder, OrderError>;

	/// Orders from this gateway never reach the processor.
	fn is_test_mode(&self) -> bool {
		false
	}
}

/// Processor orders API: `POST {base_url}/orders` with basic auth.
#[derive(Clone)]
pub struct HttpOrderGateway {
	http_client: Client,
	base_url: String,
	key_id: String,
	key_secret: SecretString,
}

impl HttpOrderGateway {
	pub fn new(
		base_url: impl Into<String>,
		key_id: impl Into<String>,
		key_secret: SecretString,
		timeout: Duration,
	) -> Result<Self, OrderError> {
		let http_client = Client::builder()
			.timeout(timeout)
			.user_agent(concat!("onboard/", env!("CARGO_PKG_VERSION")))
			.build()?;

		Ok(Self {
			http_client,
			base_url: base_url.into().trim_end_matches('/').to_string(),
			key_id: key_id.into(),
			key_secret,
		})
	}

	fn orders_url(&self) -> String {
		format!("{}/orders", self.base_url)
	}
}

#[async_trait]
impl OrderGateway for HttpOrderGateway {
	#[instrument(
		name = "payment.create_order",
		skip(self, draft),
		fields(receipt = %draft.receipt, amount = draft.amount)
	)]
	async fn create_order(&self, draft: &OrderDraft) -> Result<CreatedOrder, OrderError> {
		let response = self
			.http_client
			.post(self.orders_url())
			.basic_auth(&self.key_id, Some(self.key_secret.expose()))
			.json(draft)
			.send()
			.await
			.map_err(|e| {
				if e.is_timeout() {
					error!("order request timed out");
					return OrderError::Timeout;
				}
				error!(error = %e, "network error calling payment processor");
				OrderError::Network(e)
			})?;

		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			error!(status = status.as_u16(), "processor rejected order");
			debug!(body = %body, "processor error body");
			return Err(OrderError::Rejected {
				status: status.as_u16(),
			});
		}

		let order: CreatedOrder = response
			.json()
			.await
			.map_err(|e| OrderError::InvalidResponse(e.to_string()))?;

		debug!(order_id = %order.id, "processor order created");
		Ok(order)
	}
}

/// Local orders for test-mode keys.
pub struct TestModeOrderGateway;

#[async_trait]
impl OrderGateway for TestModeOrderGateway {
	async fn create_order(&self, draft: &OrderDraft) -> Result<CreatedOrder, OrderError> {
		let id = format!("order_test_{}", Uuid::new_v4().simple());
		debug!(order_id = %id, "test-mode order created");
		Ok(CreatedOrder {
			id,
			amount: draft.amount,
			currency: draft.currency.clone(),
			receipt: Some(draft.receipt.clone()),
			status: "created".to_string(),
		})
	}

	fn is_test_mode(&self) -> bool {
		true
	}
}

/// Stand-in without a key id. Every call fails.
pub struct UnconfiguredOrderGateway;

#[async_trait]
impl OrderGateway for UnconfiguredOrderGateway {
	async fn create_order(&self, _draft: &OrderDraft) -> Result<CreatedOrder, OrderError> {
		Err(OrderError::NotConfigured)
	}
}

/// Pick the gateway for a key pair: test-mode key ids stay local, other key
/// ids talk to `api_url`.
pub fn order_gateway_for(
	key_id: Option<&str>,
	key_secret: &SecretString,
	api_url: &str,
	timeout: Duration,
) -> Result<Arc<dyn OrderGateway>, OrderError> {
	match key_id {
		Some(id) if id.starts_with(TEST_KEY_PREFIX) => Ok(Arc::new(TestModeOrderGateway)),
		Some(id) => Ok(Arc::new(HttpOrderGateway::new(
			api_url,
			id,
			key_secret.clone(),
			timeout,
		)?)),
		None => Ok(Arc::new(UnconfiguredOrderGateway)),
	}
}
