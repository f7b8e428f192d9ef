// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Magic links for tenant setup.
//!
//! A magic link is a capability: whoever holds the token may finish setting
//! up the organization it names. Links are typed, expire after
//! [`MAGIC_LINK_TTL_HOURS`] and are consumed at most once.
//!
//! # Token lifetime
//!
//! ```text
//! issued ─────────────────────────────────────> expires_at (24 h)
//!   │                                               │
//!   │  valid while used_at is None                  │
//!   │  and now < expires_at                         │
//!   │                                               │
//!   └───[verify: read-only]──[consume: used_at]─────┘
//! ```
//!
//! Verification checks expiry before consumption, so a stale link always
//! reports [`MagicLinkError::Expired`] whether or not it was used.
//!
//! The plaintext token is persisted because an admin resend must deliver
//! the same URL again. In memory it is held in a [`SecretString`] and never
//! logged.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use onboard_common_core::{BillingCycle, OrgId, Plan, ValidationError};
use onboard_common_secret::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::instrument;

/// Default link lifetime.
pub const MAGIC_LINK_TTL_HOURS: i64 = 24;

/// Random bytes per token; hex encoding doubles the length.
pub const MAGIC_LINK_TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MagicLinkType {
	Signup,
	PasswordReset,
}

impl MagicLinkType {
	pub fn as_str(&self) -> &'static str {
		match self {
			MagicLinkType::Signup => "signup",
			MagicLinkType::PasswordReset => "password_reset",
		}
	}
}

impl fmt::Display for MagicLinkType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for MagicLinkType {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"signup" => Ok(MagicLinkType::Signup),
			"password_reset" => Ok(MagicLinkType::PasswordReset),
			other => Err(ValidationError::Invalid {
				field: "magic_link_type",
				value: other.to_string(),
			}),
		}
	}
}

/// Context carried by a signup link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagicLinkMetadata {
	pub plan: Plan,
	pub billing_cycle: BillingCycle,
}

/// Why a token cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MagicLinkError {
	#[error("magic link not found")]
	NotFound,

	#[error("magic link has expired")]
	Expired,

	#[error("magic link has already been used")]
	AlreadyUsed,
}

/// What a successful verification reveals about a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicLinkContext {
	pub email: String,
	pub org_id: OrgId,
	pub metadata: MagicLinkMetadata,
}

#[derive(Debug, Clone)]
pub struct MagicLink {
	pub token: SecretString,
	pub link_type: MagicLinkType,
	pub email: String,
	pub org_id: OrgId,
	pub metadata: MagicLinkMetadata,
	pub created_at: DateTime<Utc>,
	pub expires_at: DateTime<Utc>,
	/// Set once by consumption and never cleared.
	pub used_at: Option<DateTime<Utc>>,
}

impl MagicLink {
	/// Mint a link with a fresh random token.
	#[instrument(
		name = "magic_link.create",
		skip_all,
		fields(link_type = %link_type, org_id = %org_id, email = %email.as_ref())
	)]
	pub fn new(
		link_type: MagicLinkType,
		email: impl AsRef<str> + Into<String>,
		org_id: OrgId,
		metadata: MagicLinkMetadata,
		ttl: Duration,
	) -> Self {
		let now = Utc::now().trunc_subsecs(6);
		let link = Self {
			token: SecretString::new(generate_magic_link_token()),
			link_type,
			email: email.into(),
			org_id,
			metadata,
			created_at: now,
			expires_at: now + ttl,
			used_at: None,
		};

		tracing::info!(expires_at = %link.expires_at, "created magic link");
		link
	}

	pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
		now >= self.expires_at
	}

	pub fn is_expired(&self) -> bool {
		self.is_expired_at(Utc::now())
	}

	pub fn is_used(&self) -> bool {
		self.used_at.is_some()
	}

	pub fn is_valid(&self) -> bool {
		!self.is_expired() && !self.is_used()
	}

	/// Decide whether this link may be honored as `expected` at `now`.
	///
	/// A type mismatch reads as [`MagicLinkError::NotFound`] so callers
	/// cannot probe tokens of other types.
	pub fn check(
		&self,
		expected: MagicLinkType,
		now: DateTime<Utc>,
	) -> Result<MagicLinkContext, MagicLinkError> {
		if self.link_type != expected {
			return Err(MagicLinkError::NotFound);
		}
		if self.is_expired_at(now) {
			return Err(MagicLinkError::Expired);
		}
		if self.is_used() {
			return Err(MagicLinkError::AlreadyUsed);
		}
		Ok(MagicLinkContext {
			email: self.email.clone(),
			org_id: self.org_id,
			metadata: self.metadata,
		})
	}

	pub fn setup_url(&self, base_url: &str) -> String {
		setup_url(base_url, self.token.expose())
	}
}

/// Generate a hex token from [`MAGIC_LINK_TOKEN_BYTES`] of CSPRNG output.
pub fn generate_magic_link_token() -> String {
	use rand::Rng;

	let bytes: [u8; MAGIC_LINK_TOKEN_BYTES] = rand::thread_rng().gen();
	hex::encode(bytes)
}

/// `{base_url}/setup?token={token}`
pub fn setup_url(base_url: &str, token: &str) -> String {
	format!("{}/setup?token={token}", base_url.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashSet;

	fn signup_link() -> MagicLink {
		MagicLink::new(
			MagicLinkType::Signup,
			"owner@acme.io",
			OrgId::generate(),
			MagicLinkMetadata::default(),
			Duration::hours(MAGIC_LINK_TTL_HOURS),
		)
	}

	mod token_generation {
		use super::*;

		#[test]
		fn token_is_64_hex_chars() {
			let token = generate_magic_link_token();
			assert_eq!(token.len(), MAGIC_LINK_TOKEN_BYTES * 2);
			assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
		}

		#[test]
		fn tokens_are_unique() {
			let tokens: HashSet<_> = (0..100).map(|_| generate_magic_link_token()).collect();
			assert_eq!(tokens.len(), 100);
		}

		#[test]
		fn token_is_not_logged_through_debug() {
			let link = signup_link();
			let debug = format!("{link:?}");
			assert!(!debug.contains(link.token.expose().as_str()));
		}
	}

	mod lifetime {
		use super::*;

		#[test]
		fn expires_after_ttl() {
			let link = signup_link();
			assert_eq!(
				link.expires_at,
				link.created_at + Duration::hours(MAGIC_LINK_TTL_HOURS)
			);
			assert!(link.expires_at > link.created_at);
			assert!(link.is_valid());
		}

		#[test]
		fn expiry_boundary_is_inclusive() {
			let link = signup_link();
			assert!(!link.is_expired_at(link.expires_at - Duration::seconds(1)));
			assert!(link.is_expired_at(link.expires_at));
		}
	}

	mod check {
		use super::*;

		#[test]
		fn fresh_link_yields_context() {
			let link = signup_link();
			let ctx = link.check(MagicLinkType::Signup, Utc::now()).unwrap();
			assert_eq!(ctx.email, "owner@acme.io");
			assert_eq!(ctx.org_id, link.org_id);
		}

		#[test]
		fn wrong_type_reads_as_not_found() {
			let link = signup_link();
			assert_eq!(
				link.check(MagicLinkType::PasswordReset, Utc::now()),
				Err(MagicLinkError::NotFound)
			);
		}

		#[test]
		fn expired_wins_over_used() {
			let mut link = signup_link();
			link.used_at = Some(link.created_at);
			let later = link.expires_at + Duration::minutes(1);
			assert_eq!(
				link.check(MagicLinkType::Signup, later),
				Err(MagicLinkError::Expired)
			);
		}

		#[test]
		fn expired_unused_is_expired() {
			let link = signup_link();
			assert_eq!(
				link.check(MagicLinkType::Signup, link.expires_at),
				Err(MagicLinkError::Expired)
			);
		}

		#[test]
		fn used_unexpired_is_already_used() {
			let mut link = signup_link();
			link.used_at = Some(Utc::now());
			assert_eq!(
				link.check(MagicLinkType::Signup, Utc::now()),
				Err(MagicLinkError::AlreadyUsed)
			);
		}
	}

	mod urls {
		use super::*;

		#[test]
		fn setup_url_strips_trailing_slash() {
			assert_eq!(
				setup_url("https://app.example.com/", "abc"),
				"https://app.example.com/setup?token=abc"
			);
		}

		#[test]
		fn link_setup_url_embeds_token() {
			let link = signup_link();
			let url = link.setup_url("https://app.example.com");
			assert!(url.ends_with(link.token.expose().as_str()));
		}
	}

	mod types {
		use super::*;

		#[test]
		fn link_type_parses_stored_values() {
			assert_eq!("signup".parse::<MagicLinkType>().unwrap(), MagicLinkType::Signup);
			assert_eq!(
				"password_reset".parse::<MagicLinkType>().unwrap(),
				MagicLinkType::PasswordReset
			);
			assert!("login".parse::<MagicLinkType>().is_err());
		}

		#[test]
		fn metadata_serializes_plan_and_cycle() {
			let metadata = MagicLinkMetadata {
				plan: Plan::Premium,
				billing_cycle: BillingCycle::Yearly,
			};
			let json = serde_json::to_string(&metadata).unwrap();
			assert_eq!(json, r#"{"plan":"premium","billing_cycle":"yearly"}"#);
		}
	}

	mod proptest_tests {
		use super::*;
		use proptest::prelude::*;

		proptest! {
			#[test]
			fn any_instant_past_expiry_is_expired(offset_secs in 0i64..10_000_000, used in any::<bool>()) {
				let mut link = signup_link();
				if used {
					link.used_at = Some(link.created_at);
				}
				let now = link.expires_at + Duration::seconds(offset_secs);
				prop_assert_eq!(link.check(MagicLinkType::Signup, now), Err(MagicLinkError::Expired));
			}

			#[test]
			fn any_instant_before_expiry_is_usable(offset_secs in 1i64..(MAGIC_LINK_TTL_HOURS * 3600)) {
				let link = signup_link();
				let now = link.expires_at - Duration::seconds(offset_secs);
				prop_assert!(link.check(MagicLinkType::Signup, now).is_ok());
			}
		}
	}
}
