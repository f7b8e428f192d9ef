// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

/// Input that cannot become an onboarding record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
	#[error("{0} is required")]
	Missing(&'static str),

	#[error("{field} exceeds {max} characters")]
	TooLong { field: &'static str, max: usize },

	#[error("invalid {field}: {value}")]
	Invalid { field: &'static str, value: String },
}
