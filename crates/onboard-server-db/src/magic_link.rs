// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Magic link repository.
//!
//! Lookups always filter on link type. Consumption is one conditional
//! `UPDATE ... WHERE used_at IS NULL`, so concurrent consumers race inside
//! SQLite and exactly one wins.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use onboard_common_core::OrgId;
use onboard_common_secret::SecretString;
use onboard_server_magiclink::{MagicLink, MagicLinkType};
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::DbError;
use crate::{format_timestamp, parse_column, parse_optional_timestamp, parse_timestamp};

const COLUMNS: &str = "token, link_type, email, org_id, metadata, created_at, expires_at, used_at";

#[async_trait]
pub trait MagicLinkStore: Send + Sync {
	async fn create_magic_link(&self, link: &MagicLink) -> Result<(), DbError>;
	async fn get_magic_link_by_token(
		&self,
		token: &SecretString,
		link_type: MagicLinkType,
	) -> Result<Option<MagicLink>, DbError>;
	async fn consume_magic_link(
		&self,
		token: &SecretString,
		now: DateTime<Utc>,
	) -> Result<bool, DbError>;
	async fn get_latest_unconsumed(
		&self,
		org_id: &OrgId,
		email: &str,
		link_type: MagicLinkType,
	) -> Result<Option<MagicLink>, DbError>;
}

#[derive(Clone)]
pub struct MagicLinkRepository {
	pool: SqlitePool,
}

impl MagicLinkRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(
		skip(self, link),
		fields(link_type = %link.link_type, org_id = %link.org_id)
	)]
	pub async fn create_magic_link(&self, link: &MagicLink) -> Result<(), DbError> {
		let metadata = serde_json::to_string(&link.metadata)?;
		sqlx::query(
			r#"
			INSERT INTO magic_links (token, link_type, email, org_id, metadata, created_at, expires_at, used_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(link.token.expose())
		.bind(link.link_type.as_str())
		.bind(&link.email)
		.bind(link.org_id.to_string())
		.bind(metadata)
		.bind(format_timestamp(link.created_at))
		.bind(format_timestamp(link.expires_at))
		.bind(link.used_at.map(format_timestamp))
		.execute(&self.pool)
		.await
		.map_err(DbError::from_insert)?;

		tracing::debug!(expires_at = %link.expires_at, "magic link stored");
		Ok(())
	}

	/// Look a token up as `link_type`. Tokens of other types are invisible.
	#[tracing::instrument(skip(self, token), fields(link_type = %link_type))]
	pub async fn get_magic_link_by_token(
		&self,
		token: &SecretString,
		link_type: MagicLinkType,
	) -> Result<Option<MagicLink>, DbError> {
		let row = sqlx::query(&format!(
			"SELECT {COLUMNS} FROM magic_links WHERE token = ? AND link_type = ?"
		))
		.bind(token.expose())
		.bind(link_type.as_str())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_link(&r)).transpose()
	}

	/// Stamp `used_at` if it is still unset. Returns whether this call did it.
	#[tracing::instrument(skip(self, token))]
	pub async fn consume_magic_link(
		&self,
		token: &SecretString,
		now: DateTime<Utc>,
	) -> Result<bool, DbError> {
		let result = sqlx::query(
			r#"
			UPDATE magic_links
			SET used_at = ?
			WHERE token = ? AND used_at IS NULL
			"#,
		)
		.bind(format_timestamp(now))
		.bind(token.expose())
		.execute(&self.pool)
		.await?;

		let consumed = result.rows_affected() > 0;
		tracing::debug!(consumed, "magic link consume");
		Ok(consumed)
	}

	/// Newest link for `(org_id, email, link_type)` that has not been used.
	#[tracing::instrument(skip(self, email), fields(org_id = %org_id, link_type = %link_type))]
	pub async fn get_latest_unconsumed(
		&self,
		org_id: &OrgId,
		email: &str,
		link_type: MagicLinkType,
	) -> Result<Option<MagicLink>, DbError> {
		let row = sqlx::query(&format!(
			r#"
			SELECT {COLUMNS} FROM magic_links
			WHERE org_id = ? AND email = ? AND link_type = ? AND used_at IS NULL
			ORDER BY created_at DESC, rowid DESC
			LIMIT 1
			"#
		))
		.bind(org_id.to_string())
		.bind(email)
		.bind(link_type.as_str())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_link(&r)).transpose()
	}
}

fn row_to_link(row: &sqlx::sqlite::SqliteRow) -> Result<MagicLink, DbError> {
	let token: String = row.get("token");
	let link_type: String = row.get("link_type");
	let org_id: String = row.get("org_id");
	let metadata: String = row.get("metadata");
	let created_at: String = row.get("created_at");
	let expires_at: String = row.get("expires_at");
	let used_at: Option<String> = row.get("used_at");

	Ok(MagicLink {
		token: SecretString::new(token),
		link_type: parse_column("link_type", &link_type)?,
		email: row.get("email"),
		org_id: parse_column("org_id", &org_id)?,
		metadata: serde_json::from_str(&metadata)?,
		created_at: parse_timestamp("created_at", &created_at)?,
		expires_at: parse_timestamp("expires_at", &expires_at)?,
		used_at: parse_optional_timestamp("used_at", used_at)?,
	})
}

#[async_trait]
impl MagicLinkStore for MagicLinkRepository {
	async fn create_magic_link(&self, link: &MagicLink) -> Result<(), DbError> {
		self.create_magic_link(link).await
	}

	async fn get_magic_link_by_token(
		&self,
		token: &SecretString,
		link_type: MagicLinkType,
	) -> Result<Option<MagicLink>, DbError> {
		self.get_magic_link_by_token(token, link_type).await
	}

	async fn consume_magic_link(
		&self,
		token: &SecretString,
		now: DateTime<Utc>,
	) -> Result<bool, DbError> {
		self.consume_magic_link(token, now).await
	}

	async fn get_latest_unconsumed(
		&self,
		org_id: &OrgId,
		email: &str,
		link_type: MagicLinkType,
	) -> Result<Option<MagicLink>, DbError> {
		self.get_latest_unconsumed(org_id, email, link_type).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::onboarding::OnboardingRepository;
	use crate::org::OrgRepository;
	use crate::testing::create_test_pool;
	use chrono::Duration;
	use onboard_common_core::{NewOnboardingRequest, OnboardingRequest, Organization};
	use onboard_server_magiclink::{MagicLinkMetadata, MAGIC_LINK_TTL_HOURS};

	async fn seed_org(pool: &SqlitePool) -> OrgId {
		let request = OnboardingRequest::pending(
			NewOnboardingRequest {
				agency_name: "Acme".to_string(),
				admin_email: "owner@acme.io".to_string(),
				..Default::default()
			},
			Utc::now(),
		);
		OnboardingRepository::new(pool.clone())
			.create_request(&request)
			.await
			.unwrap();
		let org = Organization::for_request(&request, "acme".to_string(), Utc::now());
		OrgRepository::new(pool.clone())
			.create_org(&org)
			.await
			.unwrap();
		org.id
	}

	fn signup_link(org_id: OrgId) -> MagicLink {
		MagicLink::new(
			MagicLinkType::Signup,
			"owner@acme.io",
			org_id,
			MagicLinkMetadata::default(),
			Duration::hours(MAGIC_LINK_TTL_HOURS),
		)
	}

	#[tokio::test]
	async fn stores_and_loads_by_token() {
		let pool = create_test_pool().await;
		let org_id = seed_org(&pool).await;
		let repo = MagicLinkRepository::new(pool);
		let link = signup_link(org_id);
		repo.create_magic_link(&link).await.unwrap();

		let loaded = repo
			.get_magic_link_by_token(&link.token, MagicLinkType::Signup)
			.await
			.unwrap()
			.unwrap();
		assert_eq!(loaded.token, link.token);
		assert_eq!(loaded.email, "owner@acme.io");
		assert_eq!(loaded.org_id, org_id);
		assert!(loaded.used_at.is_none());
		assert_eq!(loaded.created_at, link.created_at);
		assert_eq!(loaded.expires_at, link.expires_at);
	}

	#[tokio::test]
	async fn lookup_is_restricted_by_type() {
		let pool = create_test_pool().await;
		let org_id = seed_org(&pool).await;
		let repo = MagicLinkRepository::new(pool);
		let link = signup_link(org_id);
		repo.create_magic_link(&link).await.unwrap();

		assert!(repo
			.get_magic_link_by_token(&link.token, MagicLinkType::PasswordReset)
			.await
			.unwrap()
			.is_none());
	}

	#[tokio::test]
	async fn consume_succeeds_once() {
		let pool = create_test_pool().await;
		let org_id = seed_org(&pool).await;
		let repo = MagicLinkRepository::new(pool);
		let link = signup_link(org_id);
		repo.create_magic_link(&link).await.unwrap();

		assert!(repo.consume_magic_link(&link.token, Utc::now()).await.unwrap());
		assert!(!repo.consume_magic_link(&link.token, Utc::now()).await.unwrap());

		let loaded = repo
			.get_magic_link_by_token(&link.token, MagicLinkType::Signup)
			.await
			.unwrap()
			.unwrap();
		assert!(loaded.used_at.is_some());
	}

	#[tokio::test]
	async fn consume_unknown_token_is_false() {
		let repo = MagicLinkRepository::new(create_test_pool().await);
		assert!(!repo
			.consume_magic_link(&SecretString::from("nope"), Utc::now())
			.await
			.unwrap());
	}

	#[tokio::test]
	async fn concurrent_consumers_have_one_winner() {
		let dir = tempfile::tempdir().unwrap();
		let url = format!("sqlite:{}", dir.path().join("links.db").display());
		let pool = crate::pool::create_pool(&url).await.unwrap();
		crate::migrations::run_migrations(&pool).await.unwrap();

		let org_id = seed_org(&pool).await;
		let repo = MagicLinkRepository::new(pool);
		let link = signup_link(org_id);
		repo.create_magic_link(&link).await.unwrap();

		let attempts = (0..8).map(|_| {
			let repo = repo.clone();
			let token = link.token.clone();
			tokio::spawn(async move { repo.consume_magic_link(&token, Utc::now()).await })
		});
		let results = futures::future::join_all(attempts).await;

		let winners = results
			.into_iter()
			.map(|r| r.unwrap().unwrap())
			.filter(|won| *won)
			.count();
		assert_eq!(winners, 1);
	}

	#[tokio::test]
	async fn latest_unconsumed_skips_used_links() {
		let pool = create_test_pool().await;
		let org_id = seed_org(&pool).await;
		let repo = MagicLinkRepository::new(pool);

		let mut older = signup_link(org_id);
		older.created_at -= Duration::minutes(10);
		let newer = signup_link(org_id);
		repo.create_magic_link(&older).await.unwrap();
		repo.create_magic_link(&newer).await.unwrap();

		let latest = repo
			.get_latest_unconsumed(&org_id, "owner@acme.io", MagicLinkType::Signup)
			.await
			.unwrap()
			.unwrap();
		assert_eq!(latest.token, newer.token);

		repo.consume_magic_link(&newer.token, Utc::now())
			.await
			.unwrap();
		let latest = repo
			.get_latest_unconsumed(&org_id, "owner@acme.io", MagicLinkType::Signup)
			.await
			.unwrap()
			.unwrap();
		assert_eq!(latest.token, older.token);

		repo.consume_magic_link(&older.token, Utc::now())
			.await
			.unwrap();
		assert!(repo
			.get_latest_unconsumed(&org_id, "owner@acme.io", MagicLinkType::Signup)
			.await
			.unwrap()
			.is_none());
	}
}
