// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Payment processor signature verification.
//!
//! Two checks live here:
//!
//! - **Checkout callback**: the browser posts `{order_id, payment_id, signature}`
//!   where `signature = hex(HMAC-SHA256(key_secret, "{order_id}|{payment_id}"))`.
//! - **Webhook**: the processor posts a JSON body signed with
//!   `hex(HMAC-SHA256(webhook_secret, body))` in [`PAYMENT_SIGNATURE_HEADER`].
//!
//! Both comparisons are constant time and exact: a signature must be the
//! 64 lowercase hex characters the processor sends, with no surrounding
//! whitespace. Neither check touches any stored state.
//!
//! [`orders`] creates the checkout order those signatures later refer to.

pub mod error;
pub mod orders;
pub mod webhook;

use hmac::{Hmac, Mac};
use onboard_common_secret::SecretString;
use sha2::Sha256;

pub use error::PaymentError;
pub use orders::{
	new_receipt, order_gateway_for, CreatedOrder, HttpOrderGateway, OrderDraft, OrderError,
	OrderGateway, OrderNotes, TestModeOrderGateway, UnconfiguredOrderGateway,
};
pub use webhook::{PaymentEntity, PaymentEvent, PaymentEventKind, PaymentNotes};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the webhook body signature.
pub const PAYMENT_SIGNATURE_HEADER: &str = "x-razorpay-signature";

/// Length of a hex-encoded HMAC-SHA256 signature.
pub const SIGNATURE_HEX_LEN: usize = 64;

fn keyed_mac(secret: &[u8], payload: &[u8]) -> Result<HmacSha256, PaymentError> {
	let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| PaymentError::InvalidKey)?;
	mac.update(payload);
	Ok(mac)
}

/// Hex-encoded HMAC-SHA256 of `payload`.
pub fn compute_hmac_sha256(secret: &[u8], payload: &[u8]) -> Result<String, PaymentError> {
	let mac = keyed_mac(secret, payload)?;
	Ok(hex::encode(mac.finalize().into_bytes()))
}

fn is_lowercase_hex_signature(signature: &str) -> bool {
	signature.len() == SIGNATURE_HEX_LEN
		&& signature
			.bytes()
			.all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Constant-time check of a hex-encoded HMAC-SHA256 signature.
pub fn verify_hmac_sha256(secret: &[u8], payload: &[u8], signature: &str) -> bool {
	if !is_lowercase_hex_signature(signature) {
		return false;
	}
	let Ok(expected) = hex::decode(signature) else {
		return false;
	};
	let Ok(mac) = keyed_mac(secret, payload) else {
		return false;
	};
	mac.verify_slice(&expected).is_ok()
}

/// The string the processor signs for a checkout callback.
pub fn signing_payload(order_id: &str, payment_id: &str) -> String {
	format!("{order_id}|{payment_id}")
}

/// Checkout callback as posted by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentConfirmation {
	pub order_id: String,
	pub payment_id: String,
	pub signature: String,
}

impl PaymentConfirmation {
	pub fn validate(&self) -> Result<(), PaymentError> {
		if self.order_id.trim().is_empty() {
			return Err(PaymentError::MissingField("order_id"));
		}
		if self.payment_id.trim().is_empty() {
			return Err(PaymentError::MissingField("payment_id"));
		}
		if self.signature.trim().is_empty() {
			return Err(PaymentError::MissingField("signature"));
		}
		Ok(())
	}
}

/// Verifies payment processor signatures with explicitly supplied secrets.
#[derive(Clone)]
pub struct PaymentVerifier {
	key_secret: SecretString,
	webhook_secret: Option<SecretString>,
}

impl PaymentVerifier {
	pub fn new(key_secret: SecretString, webhook_secret: Option<SecretString>) -> Self {
		Self {
			key_secret,
			webhook_secret,
		}
	}

	/// Check a checkout callback signature. Returns `false` on any mismatch,
	/// including signatures that are not valid hex.
	#[tracing::instrument(
		name = "payment.verify",
		skip(self, signature),
		fields(order_id = %order_id, payment_id = %payment_id)
	)]
	pub fn verify(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
		let payload = signing_payload(order_id, payment_id);
		let valid = verify_hmac_sha256(
			self.key_secret.expose().as_bytes(),
			payload.as_bytes(),
			signature,
		);
		tracing::debug!(valid, "payment signature checked");
		valid
	}

	pub fn verify_confirmation(&self, confirmation: &PaymentConfirmation) -> Result<bool, PaymentError> {
		confirmation.validate()?;
		Ok(self.verify(
			confirmation.order_id.trim(),
			confirmation.payment_id.trim(),
			&confirmation.signature,
		))
	}

	/// Check a webhook body signature. Without a configured webhook secret
	/// every webhook is rejected.
	#[tracing::instrument(name = "payment.verify_webhook", skip_all, fields(body_len = body.len()))]
	pub fn verify_webhook(&self, body: &[u8], signature: &str) -> bool {
		match &self.webhook_secret {
			Some(secret) => verify_hmac_sha256(secret.expose().as_bytes(), body, signature),
			None => {
				tracing::warn!("webhook received but no webhook secret is configured");
				false
			}
		}
	}
}
