// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::SqlitePool;

use crate::error::DbError;

const MIGRATIONS: &[(&str, &str)] = &[
	(
		"001_onboarding_requests",
		include_str!("../migrations/001_onboarding_requests.sql"),
	),
	(
		"002_organizations",
		include_str!("../migrations/002_organizations.sql"),
	),
	(
		"003_magic_links",
		include_str!("../migrations/003_magic_links.sql"),
	),
	(
		"004_payment_orders",
		include_str!("../migrations/004_payment_orders.sql"),
	),
];

/// Apply every embedded migration. Statements are idempotent, so this runs
/// on each startup.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
	for (name, sql) in MIGRATIONS {
		for statement in statements(sql) {
			if let Err(e) = sqlx::query(&statement).execute(pool).await {
				if e.to_string().contains("already exists") {
					tracing::trace!(migration = name, "object already exists, skipping");
					continue;
				}
				tracing::error!(migration = name, error = %e, "migration failed");
				return Err(e.into());
			}
		}
		tracing::debug!(migration = name, "migration applied");
	}

	tracing::info!(count = MIGRATIONS.len(), "database migrations complete");
	Ok(())
}

fn statements(sql: &str) -> Vec<String> {
	sql.split(';')
		.map(|chunk| {
			chunk
				.lines()
				.filter(|line| !line.trim_start().starts_with("--"))
				.collect::<Vec<_>>()
				.join("\n")
		})
		.filter(|s| !s.trim().is_empty())
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_test_pool;

	#[test]
	fn comments_and_blank_chunks_are_dropped() {
		let parsed = statements("-- header\n\nCREATE TABLE a (x INT);\n-- trailing\n");
		assert_eq!(parsed.len(), 1);
		assert!(parsed[0].contains("CREATE TABLE a"));
	}

	#[tokio::test]
	async fn migrations_are_rerunnable() {
		let pool = create_test_pool().await;
		run_migrations(&pool).await.unwrap();
		run_migrations(&pool).await.unwrap();

		let count: i64 = sqlx::query_scalar(
			"SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('onboarding_requests', 'organizations', 'org_memberships', 'magic_links', 'payment_orders')",
		)
		.fetch_one(&pool)
		.await
		.unwrap();
		assert_eq!(count, 5);
	}
}
