// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Checkout orders: created before payment, settled by the webhook.
//!
//! The processor call happens first and the order is stored only once the
//! processor has accepted it. A stored order is the authority on plan and
//! price when its payment arrives.

use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use onboard_common_core::{NewPaymentOrder, PaymentOrder, PaymentOrderStatus, RequestId};
use onboard_server_auth::{is_allowed, AdminAction, Principal};
use onboard_server_db::{PaymentOrderStore, MAX_LIST_LIMIT};
use onboard_server_payment::{new_receipt, OrderDraft, OrderError, OrderGateway};
use tracing::instrument;

use crate::error::{ProvisioningError, Result};

pub struct PaymentOrderService {
	orders: Arc<dyn PaymentOrderStore>,
	gateway: Arc<dyn OrderGateway>,
	key_id: Option<String>,
}

impl PaymentOrderService {
	pub fn new(
		orders: Arc<dyn PaymentOrderStore>,
		gateway: Arc<dyn OrderGateway>,
		key_id: Option<String>,
	) -> Self {
		Self {
			orders,
			gateway,
			key_id,
		}
	}

	/// Public key id the checkout page opens the processor form with.
	pub fn key_id(&self) -> Option<&str> {
		self.key_id.as_deref()
	}

	#[instrument(skip(self, new), fields(plan = %new.plan, billing_cycle = %new.billing_cycle))]
	pub async fn create_order(&self, new: NewPaymentOrder) -> Result<PaymentOrder> {
		let new = new.normalize()?;
		let draft = OrderDraft::for_order(&new, new_receipt());
		let created = self.gateway.create_order(&draft).await?;

		if created.amount != draft.amount {
			return Err(OrderError::InvalidResponse(format!(
				"order amount {} does not match price {}",
				created.amount, draft.amount
			))
			.into());
		}

		let order = PaymentOrder::created(
			new,
			created.id,
			draft.receipt,
			self.gateway.is_test_mode(),
			Utc::now(),
		);
		self.orders.create_order(&order).await?;

		tracing::info!(
			order_id = %order.order_id,
			amount_minor = order.amount_minor,
			test_mode = order.test_mode,
			"checkout order created"
		);
		Ok(order)
	}

	/// Newest first, at most [`MAX_LIST_LIMIT`] records.
	#[instrument(skip(self, principal), fields(subject = %principal.subject))]
	pub async fn list(&self, principal: &Principal, limit: Option<u32>) -> Result<Vec<PaymentOrder>> {
		let action = AdminAction::ListPayments;
		if !is_allowed(principal, action) {
			tracing::warn!(
				target: "onboard::security",
				subject = %principal.subject,
				?action,
				"admin action denied"
			);
			return Err(ProvisioningError::Forbidden { action });
		}
		Ok(self
			.orders
			.list_orders(limit.unwrap_or(MAX_LIST_LIMIT))
			.await?)
	}

	/// The stored order a payment belongs to, if this server created it.
	#[instrument(skip(self))]
	pub async fn find(&self, order_id: Option<&str>) -> Result<Option<PaymentOrder>> {
		match order_id.map(str::trim).filter(|id| !id.is_empty()) {
			Some(id) => Ok(self.orders.get_order(id).await?),
			None => Ok(None),
		}
	}

	/// Record the payment on its order and link the onboarding request it
	/// produced. A captured order keeps its status.
	#[instrument(skip(self, payment_id), fields(status = %status, request_id = %request_id))]
	pub async fn settle(
		&self,
		order_id: &str,
		payment_id: &str,
		status: PaymentOrderStatus,
		request_id: &RequestId,
	) -> Result<()> {
		let now = Utc::now().trunc_subsecs(6);
		if !self
			.orders
			.record_payment(order_id, payment_id, status, now)
			.await?
		{
			tracing::debug!("order already settled");
		}
		self.orders.link_request(order_id, request_id).await?;
		Ok(())
	}
}
