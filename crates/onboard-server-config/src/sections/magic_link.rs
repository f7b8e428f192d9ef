// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::Deserialize;

const DEFAULT_TTL_HOURS: i64 = 24;
/// Thirty days.
pub const MAX_TTL_HOURS: i64 = 720;

#[derive(Debug, Clone)]
pub struct MagicLinkConfig {
	pub ttl_hours: i64,
}

impl Default for MagicLinkConfig {
	fn default() -> Self {
		Self {
			ttl_hours: DEFAULT_TTL_HOURS,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MagicLinkConfigLayer {
	#[serde(default)]
	pub ttl_hours: Option<i64>,
}

impl MagicLinkConfigLayer {
	pub fn merge(&mut self, other: MagicLinkConfigLayer) {
		if other.ttl_hours.is_some() {
			self.ttl_hours = other.ttl_hours;
		}
	}

	pub fn finalize(self) -> MagicLinkConfig {
		MagicLinkConfig {
			ttl_hours: self.ttl_hours.unwrap_or(DEFAULT_TTL_HOURS),
		}
	}
}
