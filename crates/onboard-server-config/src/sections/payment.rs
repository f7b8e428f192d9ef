// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Payment processor credentials.

use onboard_common_secret::SecretString;
use serde::Deserialize;

pub const DEFAULT_ORDERS_API_URL: &str = "https://api.razorpay.com/v1";
pub const DEFAULT_ORDER_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct PaymentConfig {
	/// Public key id, echoed to the checkout page.
	pub key_id: Option<String>,
	/// Signs `order_id|payment_id` on checkout confirmations.
	pub key_secret: Option<SecretString>,
	/// Signs webhook bodies.
	pub webhook_secret: Option<SecretString>,
	/// Base URL of the processor's orders API.
	pub orders_api_url: String,
	pub order_timeout_secs: u64,
}

impl Default for PaymentConfig {
	fn default() -> Self {
		PaymentConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentConfigLayer {
	#[serde(default)]
	pub key_id: Option<String>,
	#[serde(default)]
	pub key_secret: Option<SecretString>,
	#[serde(default)]
	pub webhook_secret: Option<SecretString>,
	#[serde(default)]
	pub orders_api_url: Option<String>,
	#[serde(default)]
	pub order_timeout_secs: Option<u64>,
}

impl PaymentConfigLayer {
	pub fn merge(&mut self, other: PaymentConfigLayer) {
		if other.key_id.is_some() {
			self.key_id = other.key_id;
		}
		if other.key_secret.is_some() {
			self.key_secret = other.key_secret;
		}
		if other.webhook_secret.is_some() {
			self.webhook_secret = other.webhook_secret;
		}
		if other.orders_api_url.is_some() {
			self.orders_api_url = other.orders_api_url;
		}
		if other.order_timeout_secs.is_some() {
			self.order_timeout_secs = other.order_timeout_secs;
		}
	}

	pub fn finalize(self) -> PaymentConfig {
		PaymentConfig {
			key_id: self.key_id,
			key_secret: self.key_secret.filter(|s| !s.is_empty()),
			webhook_secret: self.webhook_secret.filter(|s| !s.is_empty()),
			orders_api_url: self
				.orders_api_url
				.unwrap_or_else(|| DEFAULT_ORDERS_API_URL.to_string()),
			order_timeout_secs: self
				.order_timeout_secs
				.unwrap_or(DEFAULT_ORDER_TIMEOUT_SECS),
		}
	}
}
