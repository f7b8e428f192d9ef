// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bearer credentials for admin principals.
//!
//! Only SHA-256 digests of admin tokens are configured. A presented token is
//! hashed and compared against every configured digest in constant time.

use onboard_common_secret::SecretString;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::types::{Principal, Role};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
	#[error("token digest for '{subject}' must be 64 hex characters")]
	InvalidDigest { subject: String },

	#[error("admin credential for '{subject}' has no roles")]
	NoRoles { subject: String },
}

/// A configured admin identity.
#[derive(Debug, Clone)]
pub struct AdminCredential {
	pub subject: String,
	digest: [u8; 32],
	pub roles: Vec<Role>,
}

impl AdminCredential {
	pub fn new(
		subject: impl Into<String>,
		token_sha256_hex: &str,
		roles: Vec<Role>,
	) -> Result<Self, CredentialError> {
		let subject = subject.into();
		let bytes = hex::decode(token_sha256_hex.trim())
			.map_err(|_| CredentialError::InvalidDigest {
				subject: subject.clone(),
			})?;
		let digest: [u8; 32] = bytes
			.try_into()
			.map_err(|_| CredentialError::InvalidDigest {
				subject: subject.clone(),
			})?;
		if roles.is_empty() {
			return Err(CredentialError::NoRoles { subject });
		}
		Ok(Self {
			subject,
			digest,
			roles,
		})
	}
}

/// Hex SHA-256 of an admin token, as stored in configuration.
pub fn hash_admin_token(token: &str) -> String {
	hex::encode(Sha256::digest(token.as_bytes()))
}

/// Resolves bearer tokens to principals.
#[derive(Debug, Clone, Default)]
pub struct CredentialVerifier {
	credentials: Vec<AdminCredential>,
}

impl CredentialVerifier {
	pub fn new(credentials: Vec<AdminCredential>) -> Self {
		Self { credentials }
	}

	pub fn is_empty(&self) -> bool {
		self.credentials.is_empty()
	}

	/// Returns the principal owning `token`, or `None` if no digest matches.
	pub fn authenticate(&self, token: &SecretString) -> Option<Principal> {
		let presented: [u8; 32] = Sha256::digest(token.expose().as_bytes()).into();

		// Every credential is compared so timing does not reveal the match index.
		let mut found = None;
		for credential in &self.credentials {
			let matches: bool = credential.digest.ct_eq(&presented).into();
			if matches && found.is_none() {
				found = Some(credential);
			}
		}

		found.map(|c| Principal::new(c.subject.clone(), c.roles.clone()))
	}
}
