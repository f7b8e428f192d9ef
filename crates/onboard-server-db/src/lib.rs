// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite persistence for the onboarding server.
//!
//! Each aggregate has a `*Store` trait, used by the services, and a
//! `*Repository` implementation over a [`sqlx::SqlitePool`]. Timestamps are
//! stored as fixed-width RFC 3339 text so that lexical order is time order.

pub mod error;
pub mod magic_link;
pub mod migrations;
pub mod onboarding;
pub mod org;
pub mod payment_order;
pub mod pool;
pub mod testing;

pub use error::{DbError, Result};
pub use magic_link::{MagicLinkRepository, MagicLinkStore};
pub use migrations::run_migrations;
pub use onboarding::{OnboardingRepository, OnboardingStore, MAX_LIST_LIMIT};
pub use org::{OrgRepository, OrgStore};
pub use payment_order::{PaymentOrderRepository, PaymentOrderStore};
pub use pool::create_pool;

use chrono::{DateTime, SecondsFormat, Utc};

pub(crate) fn format_timestamp(dt: DateTime<Utc>) -> String {
	dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("Invalid {field}: {e}")))
}

pub(crate) fn parse_optional_timestamp(
	field: &str,
	value: Option<String>,
) -> Result<Option<DateTime<Utc>>> {
	value.map(|v| parse_timestamp(field, &v)).transpose()
}

pub(crate) fn parse_column<T>(field: &str, value: &str) -> Result<T>
where
	T: std::str::FromStr,
	T::Err: std::fmt::Display,
{
	value
		.parse()
		.map_err(|e| DbError::Internal(format!("Invalid {field}: {e}")))
}
