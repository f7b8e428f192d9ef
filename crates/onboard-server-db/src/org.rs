// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Organization repository for database operations.
//!
//! - Organization create and lookup (by id, slug or onboarding request)
//! - Membership management

use async_trait::async_trait;
use onboard_common_core::{OrgId, OrgMembership, OrgSettings, Organization, RequestId, UserId};
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::DbError;
use crate::{format_timestamp, parse_column, parse_timestamp};

const ORG_COLUMNS: &str = "id, onboarding_request_id, name, slug, plan, billing_cycle, status, settings, subscription_ends_at, created_at, updated_at";

#[async_trait]
pub trait OrgStore: Send + Sync {
	async fn create_org(&self, org: &Organization) -> Result<(), DbError>;
	async fn get_org_by_id(&self, id: &OrgId) -> Result<Option<Organization>, DbError>;
	async fn get_org_by_slug(&self, slug: &str) -> Result<Option<Organization>, DbError>;
	async fn get_org_by_request_id(
		&self,
		request_id: &RequestId,
	) -> Result<Option<Organization>, DbError>;
	async fn add_member(&self, membership: &OrgMembership) -> Result<(), DbError>;
	async fn get_membership(
		&self,
		org_id: &OrgId,
		user_id: &UserId,
	) -> Result<Option<OrgMembership>, DbError>;
}

/// Repository for organizations and their members.
///
/// All IDs are UUIDs stored as strings in SQLite.
#[derive(Clone)]
pub struct OrgRepository {
	pool: SqlitePool,
}

impl OrgRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Create a new organization.
	///
	/// # Errors
	/// `DbError::Conflict("slug")` if the slug is taken and
	/// `DbError::Conflict("onboarding_request_id")` if the request already
	/// owns an organization.
	#[tracing::instrument(skip(self, org), fields(org_id = %org.id, slug = %org.slug))]
	pub async fn create_org(&self, org: &Organization) -> Result<(), DbError> {
		let settings = serde_json::to_string(&org.settings)?;
		sqlx::query(
			r#"
			INSERT INTO organizations (id, onboarding_request_id, name, slug, plan, billing_cycle, status, settings, subscription_ends_at, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(org.id.to_string())
		.bind(org.onboarding_request_id.map(|id| id.to_string()))
		.bind(&org.name)
		.bind(&org.slug)
		.bind(org.plan.as_str())
		.bind(org.billing_cycle.as_str())
		.bind(org.status.as_str())
		.bind(settings)
		.bind(format_timestamp(org.subscription_ends_at))
		.bind(format_timestamp(org.created_at))
		.bind(format_timestamp(org.updated_at))
		.execute(&self.pool)
		.await
		.map_err(DbError::from_insert)?;

		tracing::debug!("organization created");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(org_id = %id))]
	pub async fn get_org_by_id(&self, id: &OrgId) -> Result<Option<Organization>, DbError> {
		let row = sqlx::query(&format!("SELECT {ORG_COLUMNS} FROM organizations WHERE id = ?"))
			.bind(id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		row.map(|r| row_to_org(&r)).transpose()
	}

	#[tracing::instrument(skip(self))]
	pub async fn get_org_by_slug(&self, slug: &str) -> Result<Option<Organization>, DbError> {
		let row = sqlx::query(&format!(
			"SELECT {ORG_COLUMNS} FROM organizations WHERE slug = ?"
		))
		.bind(slug)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_org(&r)).transpose()
	}

	/// The organization provisioned for an onboarding request, if any.
	#[tracing::instrument(skip(self), fields(request_id = %request_id))]
	pub async fn get_org_by_request_id(
		&self,
		request_id: &RequestId,
	) -> Result<Option<Organization>, DbError> {
		let row = sqlx::query(&format!(
			"SELECT {ORG_COLUMNS} FROM organizations WHERE onboarding_request_id = ?"
		))
		.bind(request_id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_org(&r)).transpose()
	}

	/// # Errors
	/// `DbError::Conflict` if the user is already a member.
	#[tracing::instrument(
		skip(self, membership),
		fields(org_id = %membership.org_id, user_id = %membership.user_id, role = %membership.role)
	)]
	pub async fn add_member(&self, membership: &OrgMembership) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO org_memberships (org_id, user_id, role, status, created_at)
			VALUES (?, ?, ?, ?, ?)
			"#,
		)
		.bind(membership.org_id.to_string())
		.bind(membership.user_id.to_string())
		.bind(membership.role.as_str())
		.bind(membership.status.as_str())
		.bind(format_timestamp(membership.created_at))
		.execute(&self.pool)
		.await
		.map_err(DbError::from_insert)?;

		tracing::debug!("member added");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(org_id = %org_id, user_id = %user_id))]
	pub async fn get_membership(
		&self,
		org_id: &OrgId,
		user_id: &UserId,
	) -> Result<Option<OrgMembership>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT org_id, user_id, role, status, created_at
			FROM org_memberships
			WHERE org_id = ? AND user_id = ?
			"#,
		)
		.bind(org_id.to_string())
		.bind(user_id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_membership(&r)).transpose()
	}
}

fn row_to_org(row: &sqlx::sqlite::SqliteRow) -> Result<Organization, DbError> {
	let id: String = row.get("id");
	let request_id: Option<String> = row.get("onboarding_request_id");
	let plan: String = row.get("plan");
	let billing_cycle: String = row.get("billing_cycle");
	let status: String = row.get("status");
	let settings: String = row.get("settings");
	let subscription_ends_at: String = row.get("subscription_ends_at");
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");

	let settings: OrgSettings = serde_json::from_str(&settings)?;

	Ok(Organization {
		id: parse_column("org id", &id)?,
		onboarding_request_id: request_id
			.map(|r| parse_column("onboarding_request_id", &r))
			.transpose()?,
		name: row.get("name"),
		slug: row.get("slug"),
		plan: parse_column("plan", &plan)?,
		billing_cycle: parse_column("billing_cycle", &billing_cycle)?,
		status: parse_column("status", &status)?,
		settings,
		subscription_ends_at: parse_timestamp("subscription_ends_at", &subscription_ends_at)?,
		created_at: parse_timestamp("created_at", &created_at)?,
		updated_at: parse_timestamp("updated_at", &updated_at)?,
	})
}

fn row_to_membership(row: &sqlx::sqlite::SqliteRow) -> Result<OrgMembership, DbError> {
	let org_id: String = row.get("org_id");
	let user_id: String = row.get("user_id");
	let role: String = row.get("role");
	let status: String = row.get("status");
	let created_at: String = row.get("created_at");

	Ok(OrgMembership {
		org_id: parse_column("org_id", &org_id)?,
		user_id: parse_column("user_id", &user_id)?,
		role: parse_column("role", &role)?,
		status: parse_column("membership status", &status)?,
		created_at: parse_timestamp("created_at", &created_at)?,
	})
}

#[async_trait]
impl OrgStore for OrgRepository {
	async fn create_org(&self, org: &Organization) -> Result<(), DbError> {
		self.create_org(org).await
	}

	async fn get_org_by_id(&self, id: &OrgId) -> Result<Option<Organization>, DbError> {
		self.get_org_by_id(id).await
	}

	async fn get_org_by_slug(&self, slug: &str) -> Result<Option<Organization>, DbError> {
		self.get_org_by_slug(slug).await
	}

	async fn get_org_by_request_id(
		&self,
		request_id: &RequestId,
	) -> Result<Option<Organization>, DbError> {
		self.get_org_by_request_id(request_id).await
	}

	async fn add_member(&self, membership: &OrgMembership) -> Result<(), DbError> {
		self.add_member(membership).await
	}

	async fn get_membership(
		&self,
		org_id: &OrgId,
		user_id: &UserId,
	) -> Result<Option<OrgMembership>, DbError> {
		self.get_membership(org_id, user_id).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::onboarding::OnboardingRepository;
	use crate::testing::create_test_pool;
	use chrono::Utc;
	use onboard_common_core::{
		BillingCycle, MemberRole, MembershipStatus, NewOnboardingRequest, OnboardingRequest, Plan,
	};
	use proptest::prelude::*;

	async fn seed_request(pool: &SqlitePool, name: &str) -> OnboardingRequest {
		let request = OnboardingRequest::pending(
			NewOnboardingRequest {
				agency_name: name.to_string(),
				admin_email: "owner@acme.io".to_string(),
				website: Some("https://acme.io".to_string()),
				plan: Plan::Premium,
				billing_cycle: BillingCycle::Yearly,
				..Default::default()
			},
			Utc::now(),
		);
		OnboardingRepository::new(pool.clone())
			.create_request(&request)
			.await
			.unwrap();
		request
	}

	proptest! {
		#[test]
		fn org_id_round_trips_through_text(_seed in 0u32..100) {
			let id = OrgId::generate();
			let parsed: OrgId = parse_column("org id", &id.to_string()).unwrap();
			prop_assert_eq!(parsed, id);
		}
	}

	#[tokio::test]
	async fn create_and_lookup() {
		let pool = create_test_pool().await;
		let request = seed_request(&pool, "Acme Studio").await;
		let repo = OrgRepository::new(pool);
		let org = Organization::for_request(&request, "acme-studio".to_string(), Utc::now());
		repo.create_org(&org).await.unwrap();

		let by_id = repo.get_org_by_id(&org.id).await.unwrap().unwrap();
		assert_eq!(by_id.name, "Acme Studio");
		assert_eq!(by_id.plan, Plan::Premium);
		assert_eq!(by_id.billing_cycle, BillingCycle::Yearly);
		assert_eq!(by_id.settings.website.as_deref(), Some("https://acme.io"));

		let by_request = repo
			.get_org_by_request_id(&request.id)
			.await
			.unwrap()
			.unwrap();
		assert_eq!(by_request.id, org.id);

		let by_slug = repo.get_org_by_slug("acme-studio").await.unwrap().unwrap();
		assert_eq!(by_slug.id, org.id);
	}

	#[tokio::test]
	async fn one_org_per_request() {
		let pool = create_test_pool().await;
		let request = seed_request(&pool, "Acme Studio").await;
		let repo = OrgRepository::new(pool);
		repo.create_org(&Organization::for_request(
			&request,
			"acme-a".to_string(),
			Utc::now(),
		))
		.await
		.unwrap();

		let err = repo
			.create_org(&Organization::for_request(
				&request,
				"acme-b".to_string(),
				Utc::now(),
			))
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::Conflict(ref c) if c == "onboarding_request_id"));
	}

	#[tokio::test]
	async fn slug_collision_is_conflict() {
		let pool = create_test_pool().await;
		let first = seed_request(&pool, "Acme").await;
		let second = seed_request(&pool, "Acme").await;
		let repo = OrgRepository::new(pool);
		repo.create_org(&Organization::for_request(&first, "acme".to_string(), Utc::now()))
			.await
			.unwrap();

		let err = repo
			.create_org(&Organization::for_request(
				&second,
				"acme".to_string(),
				Utc::now(),
			))
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::Conflict(ref c) if c == "slug"));
	}

	#[tokio::test]
	async fn membership_is_unique() {
		let pool = create_test_pool().await;
		let request = seed_request(&pool, "Acme").await;
		let repo = OrgRepository::new(pool);
		let org = Organization::for_request(&request, "acme".to_string(), Utc::now());
		repo.create_org(&org).await.unwrap();

		let membership = OrgMembership {
			org_id: org.id,
			user_id: UserId::generate(),
			role: MemberRole::Owner,
			status: MembershipStatus::Active,
			created_at: Utc::now(),
		};
		repo.add_member(&membership).await.unwrap();

		let loaded = repo
			.get_membership(&org.id, &membership.user_id)
			.await
			.unwrap()
			.unwrap();
		assert_eq!(loaded.role, MemberRole::Owner);
		assert_eq!(loaded.status, MembershipStatus::Active);

		assert!(matches!(
			repo.add_member(&membership).await,
			Err(DbError::Conflict(_))
		));
	}
}
