// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Checkout order repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use onboard_common_core::{PaymentOrder, PaymentOrderStatus, RequestId};
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::DbError;
use crate::onboarding::MAX_LIST_LIMIT;
use crate::{format_timestamp, parse_column, parse_optional_timestamp, parse_timestamp};

const COLUMNS: &str = "order_id, receipt, agency_name, admin_email, plan, billing_cycle, amount_minor, currency, status, test_mode, payment_id, onboarding_request_id, created_at, updated_at, paid_at";

#[async_trait]
pub trait PaymentOrderStore: Send + Sync {
	async fn create_order(&self, order: &PaymentOrder) -> Result<(), DbError>;
	async fn get_order(&self, order_id: &str) -> Result<Option<PaymentOrder>, DbError>;
	async fn list_orders(&self, limit: u32) -> Result<Vec<PaymentOrder>, DbError>;
	async fn record_payment(
		&self,
		order_id: &str,
		payment_id: &str,
		status: PaymentOrderStatus,
		now: DateTime<Utc>,
	) -> Result<bool, DbError>;
	async fn link_request(&self, order_id: &str, request_id: &RequestId) -> Result<bool, DbError>;
}

#[derive(Clone)]
pub struct PaymentOrderRepository {
	pool: SqlitePool,
}

impl PaymentOrderRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// # Errors
	/// `DbError::Conflict` if the order id is already stored.
	#[tracing::instrument(skip(self, order), fields(order_id = %order.order_id))]
	pub async fn create_order(&self, order: &PaymentOrder) -> Result<(), DbError> {
		let amount = i64::try_from(order.amount_minor)
			.map_err(|_| DbError::Internal(format!("amount out of range: {}", order.amount_minor)))?;
		sqlx::query(
			r#"
			INSERT INTO payment_orders (order_id, receipt, agency_name, admin_email, plan, billing_cycle, amount_minor, currency, status, test_mode, payment_id, onboarding_request_id, created_at, updated_at, paid_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(&order.order_id)
		.bind(&order.receipt)
		.bind(&order.agency_name)
		.bind(&order.admin_email)
		.bind(order.plan.as_str())
		.bind(order.billing_cycle.as_str())
		.bind(amount)
		.bind(&order.currency)
		.bind(order.status.as_str())
		.bind(order.test_mode)
		.bind(&order.payment_id)
		.bind(order.onboarding_request_id.map(|id| id.to_string()))
		.bind(format_timestamp(order.created_at))
		.bind(format_timestamp(order.updated_at))
		.bind(order.paid_at.map(format_timestamp))
		.execute(&self.pool)
		.await
		.map_err(DbError::from_insert)?;

		tracing::debug!(amount_minor = order.amount_minor, "payment order stored");
		Ok(())
	}

	#[tracing::instrument(skip(self))]
	pub async fn get_order(&self, order_id: &str) -> Result<Option<PaymentOrder>, DbError> {
		let row = sqlx::query(&format!(
			"SELECT {COLUMNS} FROM payment_orders WHERE order_id = ?"
		))
		.bind(order_id)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_order(&r)).transpose()
	}

	/// Newest first. `limit` is clamped to [`MAX_LIST_LIMIT`].
	#[tracing::instrument(skip(self))]
	pub async fn list_orders(&self, limit: u32) -> Result<Vec<PaymentOrder>, DbError> {
		let limit = limit.clamp(1, MAX_LIST_LIMIT);
		let rows = sqlx::query(&format!(
			"SELECT {COLUMNS} FROM payment_orders ORDER BY created_at DESC, rowid DESC LIMIT ?"
		))
		.bind(i64::from(limit))
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_order).collect()
	}

	/// Attach the processor's payment to an order. A captured order is final;
	/// a later `authorized` event for it changes nothing. Returns `false` if
	/// no row changed.
	#[tracing::instrument(skip(self, payment_id), fields(status = %status))]
	pub async fn record_payment(
		&self,
		order_id: &str,
		payment_id: &str,
		status: PaymentOrderStatus,
		now: DateTime<Utc>,
	) -> Result<bool, DbError> {
		let result = sqlx::query(
			r#"
			UPDATE payment_orders
			SET payment_id = ?, status = ?, paid_at = COALESCE(paid_at, ?), updated_at = ?
			WHERE order_id = ? AND status != 'captured'
			"#,
		)
		.bind(payment_id)
		.bind(status.as_str())
		.bind(format_timestamp(now))
		.bind(format_timestamp(now))
		.bind(order_id)
		.execute(&self.pool)
		.await?;

		Ok(result.rows_affected() > 0)
	}

	#[tracing::instrument(skip(self), fields(request_id = %request_id))]
	pub async fn link_request(&self, order_id: &str, request_id: &RequestId) -> Result<bool, DbError> {
		let result = sqlx::query(
			r#"
			UPDATE payment_orders
			SET onboarding_request_id = ?, updated_at = ?
			WHERE order_id = ?
			"#,
		)
		.bind(request_id.to_string())
		.bind(format_timestamp(Utc::now()))
		.bind(order_id)
		.execute(&self.pool)
		.await?;

		Ok(result.rows_affected() > 0)
	}
}

fn row_to_order(row: &sqlx::sqlite::SqliteRow) -> Result<PaymentOrder, DbError> {
	let plan: String = row.get("plan");
	let billing_cycle: String = row.get("billing_cycle");
	let status: String = row.get("status");
	let amount: i64 = row.get("amount_minor");
	let request_id: Option<String> = row.get("onboarding_request_id");
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");

	Ok(PaymentOrder {
		order_id: row.get("order_id"),
		receipt: row.get("receipt"),
		agency_name: row.get("agency_name"),
		admin_email: row.get("admin_email"),
		plan: parse_column("plan", &plan)?,
		billing_cycle: parse_column("billing_cycle", &billing_cycle)?,
		amount_minor: u64::try_from(amount)
			.map_err(|_| DbError::Internal(format!("Invalid amount_minor: {amount}")))?,
		currency: row.get("currency"),
		status: parse_column("status", &status)?,
		test_mode: row.get("test_mode"),
		payment_id: row.get("payment_id"),
		onboarding_request_id: request_id
			.map(|id| parse_column("onboarding_request_id", &id))
			.transpose()?,
		created_at: parse_timestamp("created_at", &created_at)?,
		updated_at: parse_timestamp("updated_at", &updated_at)?,
		paid_at: parse_optional_timestamp("paid_at", row.get("paid_at"))?,
	})
}

#[async_trait]
impl PaymentOrderStore for PaymentOrderRepository {
	async fn create_order(&self, order: &PaymentOrder) -> Result<(), DbError> {
		self.create_order(order).await
	}

	async fn get_order(&self, order_id: &str) -> Result<Option<PaymentOrder>, DbError> {
		self.get_order(order_id).await
	}

	async fn list_orders(&self, limit: u32) -> Result<Vec<PaymentOrder>, DbError> {
		self.list_orders(limit).await
	}

	async fn record_payment(
		&self,
		order_id: &str,
		payment_id: &str,
		status: PaymentOrderStatus,
		now: DateTime<Utc>,
	) -> Result<bool, DbError> {
		self.record_payment(order_id, payment_id, status, now).await
	}

	async fn link_request(&self, order_id: &str, request_id: &RequestId) -> Result<bool, DbError> {
		self.link_request(order_id, request_id).await
	}
}
