// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Onboarding request repository.
//!
//! Status changes are conditional updates (`WHERE status = ?`) so two callers
//! cannot both move the same request out of a given state. The admin reset is
//! the one unconditional write.

use async_trait::async_trait;
use chrono::Utc;
use onboard_common_core::{OnboardingRequest, OnboardingStatus, ProvisioningMetadata, RequestId};
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::DbError;
use crate::{format_timestamp, parse_column, parse_timestamp};

/// Hard cap on `list_requests`.
pub const MAX_LIST_LIMIT: u32 = 200;

const COLUMNS: &str = "id, agency_name, admin_email, admin_name, website, plan, billing_cycle, notes, status, metadata, payment_order_id, payment_id, created_at, updated_at";

#[async_trait]
pub trait OnboardingStore: Send + Sync {
	async fn create_request(&self, request: &OnboardingRequest) -> Result<(), DbError>;
	async fn get_request_by_id(&self, id: &RequestId) -> Result<Option<OnboardingRequest>, DbError>;
	async fn get_request_by_payment_order_id(
		&self,
		order_id: &str,
	) -> Result<Option<OnboardingRequest>, DbError>;
	async fn list_requests(&self, limit: u32) -> Result<Vec<OnboardingRequest>, DbError>;
	async fn transition_status(
		&self,
		id: &RequestId,
		from: OnboardingStatus,
		to: OnboardingStatus,
	) -> Result<bool, DbError>;
	async fn transition_status_with_metadata(
		&self,
		id: &RequestId,
		from: OnboardingStatus,
		to: OnboardingStatus,
		metadata: &ProvisioningMetadata,
	) -> Result<bool, DbError>;
	async fn update_metadata(
		&self,
		id: &RequestId,
		metadata: &ProvisioningMetadata,
	) -> Result<(), DbError>;
	async fn reset_to_pending(&self, id: &RequestId) -> Result<bool, DbError>;
}

#[derive(Clone)]
pub struct OnboardingRepository {
	pool: SqlitePool,
}

impl OnboardingRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Insert a new request.
	///
	/// # Errors
	/// `DbError::Conflict("payment_order_id")` if another request already
	/// carries the same payment order id.
	#[tracing::instrument(skip(self, request), fields(request_id = %request.id))]
	pub async fn create_request(&self, request: &OnboardingRequest) -> Result<(), DbError> {
		let metadata = serde_json::to_string(&request.metadata)?;
		sqlx::query(
			r#"
			INSERT INTO onboarding_requests (id, agency_name, admin_email, admin_name, website, plan, billing_cycle, notes, status, metadata, payment_order_id, payment_id, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(request.id.to_string())
		.bind(&request.agency_name)
		.bind(&request.admin_email)
		.bind(&request.admin_name)
		.bind(&request.website)
		.bind(request.plan.as_str())
		.bind(request.billing_cycle.as_str())
		.bind(&request.notes)
		.bind(request.status.as_str())
		.bind(metadata)
		.bind(&request.payment_order_id)
		.bind(&request.payment_id)
		.bind(format_timestamp(request.created_at))
		.bind(format_timestamp(request.updated_at))
		.execute(&self.pool)
		.await
		.map_err(DbError::from_insert)?;

		tracing::debug!(status = %request.status, "onboarding request created");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(request_id = %id))]
	pub async fn get_request_by_id(
		&self,
		id: &RequestId,
	) -> Result<Option<OnboardingRequest>, DbError> {
		let row = sqlx::query(&format!(
			"SELECT {COLUMNS} FROM onboarding_requests WHERE id = ?"
		))
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_request(&r)).transpose()
	}

	#[tracing::instrument(skip(self))]
	pub async fn get_request_by_payment_order_id(
		&self,
		order_id: &str,
	) -> Result<Option<OnboardingRequest>, DbError> {
		let row = sqlx::query(&format!(
			"SELECT {COLUMNS} FROM onboarding_requests WHERE payment_order_id = ?"
		))
		.bind(order_id)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_request(&r)).transpose()
	}

	/// Newest first. `limit` is clamped to [`MAX_LIST_LIMIT`].
	#[tracing::instrument(skip(self))]
	pub async fn list_requests(&self, limit: u32) -> Result<Vec<OnboardingRequest>, DbError> {
		let limit = limit.clamp(1, MAX_LIST_LIMIT);
		let rows = sqlx::query(&format!(
			"SELECT {COLUMNS} FROM onboarding_requests ORDER BY created_at DESC, rowid DESC LIMIT ?"
		))
		.bind(i64::from(limit))
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_request).collect()
	}

	/// Move `id` from `from` to `to`. Returns `false` if the request was not
	/// in `from`.
	#[tracing::instrument(skip(self), fields(request_id = %id, from = %from, to = %to))]
	pub async fn transition_status(
		&self,
		id: &RequestId,
		from: OnboardingStatus,
		to: OnboardingStatus,
	) -> Result<bool, DbError> {
		let result = sqlx::query(
			r#"
			UPDATE onboarding_requests
			SET status = ?, updated_at = ?
			WHERE id = ? AND status = ?
			"#,
		)
		.bind(to.as_str())
		.bind(format_timestamp(Utc::now()))
		.bind(id.to_string())
		.bind(from.as_str())
		.execute(&self.pool)
		.await?;

		let moved = result.rows_affected() > 0;
		tracing::debug!(moved, "status transition");
		Ok(moved)
	}

	/// Like [`Self::transition_status`] but writes `metadata` in the same
	/// statement.
	#[tracing::instrument(skip(self, metadata), fields(request_id = %id, from = %from, to = %to))]
	pub async fn transition_status_with_metadata(
		&self,
		id: &RequestId,
		from: OnboardingStatus,
		to: OnboardingStatus,
		metadata: &ProvisioningMetadata,
	) -> Result<bool, DbError> {
		let metadata = serde_json::to_string(metadata)?;
		let result = sqlx::query(
			r#"
			UPDATE onboarding_requests
			SET status = ?, metadata = ?, updated_at = ?
			WHERE id = ? AND status = ?
			"#,
		)
		.bind(to.as_str())
		.bind(metadata)
		.bind(format_timestamp(Utc::now()))
		.bind(id.to_string())
		.bind(from.as_str())
		.execute(&self.pool)
		.await?;

		let moved = result.rows_affected() > 0;
		tracing::debug!(moved, "status transition with metadata");
		Ok(moved)
	}

	#[tracing::instrument(skip(self, metadata), fields(request_id = %id))]
	pub async fn update_metadata(
		&self,
		id: &RequestId,
		metadata: &ProvisioningMetadata,
	) -> Result<(), DbError> {
		let metadata = serde_json::to_string(metadata)?;
		let result = sqlx::query(
			r#"
			UPDATE onboarding_requests
			SET metadata = ?, updated_at = ?
			WHERE id = ?
			"#,
		)
		.bind(metadata)
		.bind(format_timestamp(Utc::now()))
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("onboarding request {id}")));
		}
		Ok(())
	}

	/// Force `pending` whatever the current status. Returns `false` if the
	/// request does not exist.
	#[tracing::instrument(skip(self), fields(request_id = %id))]
	pub async fn reset_to_pending(&self, id: &RequestId) -> Result<bool, DbError> {
		let result = sqlx::query(
			r#"
			UPDATE onboarding_requests
			SET status = 'pending', updated_at = ?
			WHERE id = ?
			"#,
		)
		.bind(format_timestamp(Utc::now()))
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;

		Ok(result.rows_affected() > 0)
	}
}

fn row_to_request(row: &sqlx::sqlite::SqliteRow) -> Result<OnboardingRequest, DbError> {
	let id: String = row.get("id");
	let plan: String = row.get("plan");
	let billing_cycle: String = row.get("billing_cycle");
	let status: String = row.get("status");
	let metadata: String = row.get("metadata");
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");

	Ok(OnboardingRequest {
		id: parse_column("request id", &id)?,
		agency_name: row.get("agency_name"),
		admin_email: row.get("admin_email"),
		admin_name: row.get("admin_name"),
		website: row.get("website"),
		plan: parse_column("plan", &plan)?,
		billing_cycle: parse_column("billing_cycle", &billing_cycle)?,
		notes: row.get("notes"),
		status: parse_column("status", &status)?,
		metadata: serde_json::from_str(&metadata)?,
		payment_order_id: row.get("payment_order_id"),
		payment_id: row.get("payment_id"),
		created_at: parse_timestamp("created_at", &created_at)?,
		updated_at: parse_timestamp("updated_at", &updated_at)?,
	})
}

#[async_trait]
impl OnboardingStore for OnboardingRepository {
	async fn create_request(&self, request: &OnboardingRequest) -> Result<(), DbError> {
		self.create_request(request).await
	}

	async fn get_request_by_id(&self, id: &RequestId) -> Result<Option<OnboardingRequest>, DbError> {
		self.get_request_by_id(id).await
	}

	async fn get_request_by_payment_order_id(
		&self,
		order_id: &str,
	) -> Result<Option<OnboardingRequest>, DbError> {
		self.get_request_by_payment_order_id(order_id).await
	}

	async fn list_requests(&self, limit: u32) -> Result<Vec<OnboardingRequest>, DbError> {
		self.list_requests(limit).await
	}

	async fn transition_status(
		&self,
		id: &RequestId,
		from: OnboardingStatus,
		to: OnboardingStatus,
	) -> Result<bool, DbError> {
		self.transition_status(id, from, to).await
	}

	async fn transition_status_with_metadata(
		&self,
		id: &RequestId,
		from: OnboardingStatus,
		to: OnboardingStatus,
		metadata: &ProvisioningMetadata,
	) -> Result<bool, DbError> {
		self
			.transition_status_with_metadata(id, from, to, metadata)
			.await
	}

	async fn update_metadata(
		&self,
		id: &RequestId,
		metadata: &ProvisioningMetadata,
	) -> Result<(), DbError> {
		self.update_metadata(id, metadata).await
	}

	async fn reset_to_pending(&self, id: &RequestId) -> Result<bool, DbError> {
		self.reset_to_pending(id).await
	}
}
