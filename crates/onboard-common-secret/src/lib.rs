// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secret wrapper for payment secrets, provider keys and magic-link tokens.
//!
//! [`Secret<T>`] renders as `[REDACTED]` through `Debug`, `Display` and
//! `Serialize`, zeroizes its memory on drop and only hands out the inner value
//! through [`Secret::expose`].
//!
//! ```
//! use onboard_common_secret::Secret;
//!
//! let key = Secret::new("rzp_live_secret".to_string());
//! assert_eq!(format!("{key}"), "[REDACTED]");
//! assert_eq!(key.expose(), "rzp_live_secret");
//! ```
//!
//! Values that must survive a round trip through storage opt in with
//! `#[serde(with = "onboard_common_secret::persist")]`.

use std::fmt;
use zeroize::Zeroize;

/// Placeholder written wherever a secret would otherwise appear.
pub const REDACTED: &str = "[REDACTED]";

#[derive(Zeroize)]
#[zeroize(drop)]
pub struct Secret<T>
where
	T: Zeroize,
{
	inner: T,
}

pub type SecretString = Secret<String>;

impl<T> Secret<T>
where
	T: Zeroize,
{
	pub fn new(inner: T) -> Self {
		Self { inner }
	}

	/// Borrow the inner value. Every call site is a deliberate disclosure.
	pub fn expose(&self) -> &T {
		&self.inner
	}

	/// Clone the inner value out, leaving this wrapper to zeroize its copy.
	pub fn into_inner(self) -> T
	where
		T: Clone,
	{
		self.inner.clone()
	}
}

impl SecretString {
	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}
}

impl From<String> for SecretString {
	fn from(value: String) -> Self {
		Secret::new(value)
	}
}

impl From<&str> for SecretString {
	fn from(value: &str) -> Self {
		Secret::new(value.to_string())
	}
}

impl<T> Clone for Secret<T>
where
	T: Zeroize + Clone,
{
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T> fmt::Debug for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Secret").field(&REDACTED).finish()
	}
}

impl<T> fmt::Display for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl<T> PartialEq for Secret<T>
where
	T: Zeroize + PartialEq,
{
	fn eq(&self, other: &Self) -> bool {
		self.inner == other.inner
	}
}

impl<T> Eq for Secret<T> where T: Zeroize + Eq {}

#[cfg(feature = "serde")]
mod serde_impl {
	use super::{Secret, REDACTED};
	use serde::{Deserialize, Deserializer, Serialize, Serializer};
	use zeroize::Zeroize;

	impl<T> Serialize for Secret<T>
	where
		T: Serialize + Zeroize,
	{
		fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
		where
			S: Serializer,
		{
			serializer.serialize_str(REDACTED)
		}
	}

	impl<'de, T> Deserialize<'de> for Secret<T>
	where
		T: Deserialize<'de> + Zeroize,
	{
		fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
		where
			D: Deserializer<'de>,
		{
			T::deserialize(deserializer).map(Secret::new)
		}
	}
}

/// Serde adapter that writes the exposed value.
///
/// Only for persistence records that never leave the process boundary.
#[cfg(feature = "serde")]
pub mod persist {
	use super::SecretString;
	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(secret.expose())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
	where
		D: Deserializer<'de>,
	{
		String::deserialize(deserializer).map(SecretString::new)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn debug_and_display_are_redacted() {
		let secret = SecretString::from("service-role-key");
		assert_eq!(format!("{secret}"), REDACTED);
		assert!(!format!("{secret:?}").contains("service-role-key"));
		assert!(!format!("{:?}", Some(secret)).contains("service-role-key"));
	}

	#[test]
	fn expose_and_into_inner_return_value() {
		let secret = SecretString::from("abc");
		assert_eq!(secret.expose(), "abc");
		assert_eq!(secret.clone().into_inner(), "abc");
	}

	#[test]
	fn equality_uses_inner_value() {
		assert_eq!(SecretString::from("a"), SecretString::from("a"));
		assert_ne!(SecretString::from("a"), SecretString::from("b"));
	}

	#[cfg(feature = "serde")]
	mod serde_tests {
		use super::*;
		use serde::{Deserialize, Serialize};

		#[derive(Serialize, Deserialize)]
		struct Stored {
			#[serde(with = "crate::persist")]
			key: SecretString,
		}

		#[test]
		fn default_serialization_is_redacted() {
			let json = serde_json::to_string(&SecretString::from("whsec_123")).unwrap();
			assert_eq!(json, format!("\"{REDACTED}\""));
		}

		#[test]
		fn persist_adapter_round_trips_value() {
			let stored = Stored {
				key: SecretString::from("anon-key"),
			};
			let json = serde_json::to_string(&stored).unwrap();
			assert!(json.contains("anon-key"));

			let back: Stored = serde_json::from_str(&json).unwrap();
			assert_eq!(back.key.expose(), "anon-key");
		}
	}

	proptest! {
		#[test]
		fn formatting_never_leaks(inner in "[a-zA-Z0-9_-]{3,48}") {
			prop_assume!(!inner.contains("REDACTED") && !inner.contains("Secret"));
			let secret = SecretString::new(inner.clone());
			let displayed = format!("{}", secret);
			let debugged = format!("{:?}", secret);
			prop_assert!(!displayed.contains(&inner));
			prop_assert!(!debugged.contains(&inner));
		}
	}
}
