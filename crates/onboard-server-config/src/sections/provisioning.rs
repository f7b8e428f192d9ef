// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Infrastructure provider and orchestration settings.

use std::time::Duration;

use onboard_common_secret::SecretString;
use serde::Deserialize;

const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 60;
const DEFAULT_EMAIL_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct ProvisioningConfig {
	/// Base URL of the infrastructure provider API.
	pub provider_url: Option<String>,
	pub provider_token: Option<SecretString>,
	pub provider_timeout: Duration,
	pub email_timeout: Duration,
	/// Advance paid requests from the webhook handler without admin approval.
	pub auto_advance: bool,
}

impl Default for ProvisioningConfig {
	fn default() -> Self {
		ProvisioningConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvisioningConfigLayer {
	#[serde(default)]
	pub provider_url: Option<String>,
	#[serde(default)]
	pub provider_token: Option<SecretString>,
	#[serde(default)]
	pub provider_timeout_secs: Option<u64>,
	#[serde(default)]
	pub email_timeout_secs: Option<u64>,
	#[serde(default)]
	pub auto_advance: Option<bool>,
}

impl ProvisioningConfigLayer {
	pub fn merge(&mut self, other: ProvisioningConfigLayer) {
		if other.provider_url.is_some() {
			self.provider_url = other.provider_url;
		}
		if other.provider_token.is_some() {
			self.provider_token = other.provider_token;
		}
		if other.provider_timeout_secs.is_some() {
			self.provider_timeout_secs = other.provider_timeout_secs;
		}
		if other.email_timeout_secs.is_some() {
			self.email_timeout_secs = other.email_timeout_secs;
		}
		if other.auto_advance.is_some() {
			self.auto_advance = other.auto_advance;
		}
	}

	pub fn finalize(self) -> ProvisioningConfig {
		ProvisioningConfig {
			provider_url: self.provider_url,
			provider_token: self.provider_token,
			provider_timeout: Duration::from_secs(
				self
					.provider_timeout_secs
					.unwrap_or(DEFAULT_PROVIDER_TIMEOUT_SECS),
			),
			email_timeout: Duration::from_secs(
				self.email_timeout_secs.unwrap_or(DEFAULT_EMAIL_TIMEOUT_SECS),
			),
			auto_advance: self.auto_advance.unwrap_or(false),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults() {
		let config = ProvisioningConfigLayer::default().finalize();
		assert_eq!(config.provider_timeout, Duration::from_secs(60));
		assert_eq!(config.email_timeout, Duration::from_secs(15));
		assert!(!config.auto_advance);
		assert!(config.provider_url.is_none());
	}

	#[test]
	fn overrides_timeouts() {
		let mut layer = ProvisioningConfigLayer::default();
		layer.merge(ProvisioningConfigLayer {
			provider_timeout_secs: Some(5),
			auto_advance: Some(true),
			..Default::default()
		});
		let config = layer.finalize();
		assert_eq!(config.provider_timeout, Duration::from_secs(5));
		assert!(config.auto_advance);
	}
}
