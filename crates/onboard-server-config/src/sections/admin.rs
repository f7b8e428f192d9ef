// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Admin principals.
//!
//! ```toml
//! [[admin.credentials]]
//! subject = "ops@example.com"
//! token_sha256 = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
//! roles = ["onboarding_admin"]
//! ```

use onboard_server_auth::{AdminCredential, Role};
use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AdminCredentialEntry {
	pub subject: String,
	/// Hex SHA-256 of the bearer token.
	pub token_sha256: String,
	#[serde(default)]
	pub roles: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AdminConfig {
	pub credentials: Vec<AdminCredential>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminConfigLayer {
	#[serde(default)]
	pub credentials: Option<Vec<AdminCredentialEntry>>,
}

impl AdminConfigLayer {
	pub fn merge(&mut self, other: AdminConfigLayer) {
		if other.credentials.is_some() {
			self.credentials = other.credentials;
		}
	}

	pub fn finalize(self) -> Result<AdminConfig, ConfigError> {
		let credentials = self
			.credentials
			.unwrap_or_default()
			.into_iter()
			.map(|entry| {
				let roles = entry
					.roles
					.iter()
					.map(|r| r.parse::<Role>())
					.collect::<Result<Vec<_>, _>>()
					.map_err(|message| ConfigError::InvalidValue {
						key: format!("admin.credentials[{}].roles", entry.subject),
						message,
					})?;
				AdminCredential::new(entry.subject, &entry.token_sha256, roles)
					.map_err(|e| ConfigError::Validation(e.to_string()))
			})
			.collect::<Result<Vec<_>, _>>()?;

		Ok(AdminConfig { credentials })
	}
}
