// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Outbound mail. The section is optional: without a host no mail is sent.

use onboard_common_secret::SecretString;
use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct SmtpConfig {
	pub host: String,
	pub port: u16,
	pub username: Option<String>,
	pub password: Option<SecretString>,
	pub from_address: String,
	pub from_name: String,
	/// STARTTLS; only disable for local relays.
	pub use_tls: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SmtpConfigLayer {
	#[serde(default)]
	pub host: Option<String>,
	#[serde(default)]
	pub port: Option<u16>,
	#[serde(default)]
	pub username: Option<String>,
	#[serde(default)]
	pub password: Option<SecretString>,
	#[serde(default)]
	pub from_address: Option<String>,
	#[serde(default)]
	pub from_name: Option<String>,
	#[serde(default)]
	pub use_tls: Option<bool>,
}

impl SmtpConfigLayer {
	pub fn merge(&mut self, other: SmtpConfigLayer) {
		if other.host.is_some() {
			self.host = other.host;
		}
		if other.port.is_some() {
			self.port = other.port;
		}
		if other.username.is_some() {
			self.username = other.username;
		}
		if other.password.is_some() {
			self.password = other.password;
		}
		if other.from_address.is_some() {
			self.from_address = other.from_address;
		}
		if other.from_name.is_some() {
			self.from_name = other.from_name;
		}
		if other.use_tls.is_some() {
			self.use_tls = other.use_tls;
		}
	}

	/// `Ok(None)` when no host is configured.
	pub fn finalize(self) -> Result<Option<SmtpConfig>, ConfigError> {
		let Some(host) = self.host else {
			return Ok(None);
		};
		let from_address = self.from_address.ok_or_else(|| {
			ConfigError::Validation("smtp.from_address is required when smtp.host is set".to_string())
		})?;

		Ok(Some(SmtpConfig {
			host,
			port: self.port.unwrap_or(587),
			username: self.username,
			password: self.password,
			from_address,
			from_name: self.from_name.unwrap_or_else(|| "Onboarding".to_string()),
			use_tls: self.use_tls.unwrap_or(true),
		}))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn no_host_means_disabled() {
		assert!(SmtpConfigLayer::default().finalize().unwrap().is_none());
	}

	#[test]
	fn host_requires_from_address() {
		let layer = SmtpConfigLayer {
			host: Some("smtp.example.com".to_string()),
			..Default::default()
		};
		assert!(matches!(layer.finalize(), Err(ConfigError::Validation(_))));
	}

	#[test]
	fn defaults_port_and_tls() {
		let config = SmtpConfigLayer {
			host: Some("smtp.example.com".to_string()),
			from_address: Some("noreply@example.com".to_string()),
			..Default::default()
		}
		.finalize()
		.unwrap()
		.unwrap();
		assert_eq!(config.port, 587);
		assert!(config.use_tls);
		assert_eq!(config.from_name, "Onboarding");
	}

	#[test]
	fn password_is_redacted_in_debug() {
		let layer = SmtpConfigLayer {
			password: Some(SecretString::from("hunter2")),
			..Default::default()
		};
		assert!(!format!("{layer:?}").contains("hunter2"));
	}
}
