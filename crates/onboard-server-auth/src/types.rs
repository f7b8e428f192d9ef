// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role claims an admin principal can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	/// Full control over onboarding requests.
	OnboardingAdmin,
	/// Read-only view of onboarding requests.
	Support,
}

impl Role {
	pub fn as_str(&self) -> &'static str {
		match self {
			Role::OnboardingAdmin => "onboarding_admin",
			Role::Support => "support",
		}
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Role {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim() {
			"onboarding_admin" | "admin" => Ok(Role::OnboardingAdmin),
			"support" => Ok(Role::Support),
			other => Err(format!("unknown role '{other}'")),
		}
	}
}

/// Operations on the admin surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminAction {
	ListRequests,
	ViewRequest,
	AdvanceRequest,
	ResetRequest,
	ResendEmail,
	ListPayments,
}

impl AdminAction {
	pub fn is_read_only(&self) -> bool {
		matches!(
			self,
			AdminAction::ListRequests | AdminAction::ViewRequest | AdminAction::ListPayments
		)
	}
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
	/// Stable subject, usually the admin's email.
	pub subject: String,
	pub roles: Vec<Role>,
}

impl Principal {
	pub fn new(subject: impl Into<String>, roles: Vec<Role>) -> Self {
		Self {
			subject: subject.into(),
			roles,
		}
	}

	pub fn has_role(&self, role: Role) -> bool {
		self.roles.contains(&role)
	}
}
