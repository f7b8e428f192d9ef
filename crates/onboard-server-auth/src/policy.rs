// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access policy for the onboarding admin surface.

use tracing::instrument;

use crate::types::{AdminAction, Principal, Role};

/// Decide whether `principal` may perform `action`.
///
/// `onboarding_admin` may do everything; `support` may only read.
/// Principals without role claims are denied.
#[instrument(
	level = "debug",
	skip(principal),
	fields(subject = %principal.subject, action = ?action)
)]
pub fn is_allowed(principal: &Principal, action: AdminAction) -> bool {
	let allowed = if principal.has_role(Role::OnboardingAdmin) {
		true
	} else if principal.has_role(Role::Support) {
		action.is_read_only()
	} else {
		false
	};

	tracing::debug!(allowed, "policy decision");
	allowed
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	const ALL_ACTIONS: [AdminAction; 6] = [
		AdminAction::ListRequests,
		AdminAction::ViewRequest,
		AdminAction::AdvanceRequest,
		AdminAction::ResetRequest,
		AdminAction::ResendEmail,
		AdminAction::ListPayments,
	];

	#[test]
	fn admin_may_do_everything() {
		let admin = Principal::new("ops@example.com", vec![Role::OnboardingAdmin]);
		for action in ALL_ACTIONS {
			assert!(is_allowed(&admin, action), "{action:?}");
		}
	}

	#[test]
	fn support_is_read_only() {
		let support = Principal::new("help@example.com", vec![Role::Support]);
		assert!(is_allowed(&support, AdminAction::ListRequests));
		assert!(is_allowed(&support, AdminAction::ViewRequest));
		assert!(is_allowed(&support, AdminAction::ListPayments));
		assert!(!is_allowed(&support, AdminAction::ResetRequest));
		assert!(!is_allowed(&support, AdminAction::ResendEmail));
		assert!(!is_allowed(&support, AdminAction::AdvanceRequest));
	}

	#[test]
	fn no_roles_means_no_access() {
		let nobody = Principal::new("someone@example.com", vec![]);
		for action in ALL_ACTIONS {
			assert!(!is_allowed(&nobody, action));
		}
	}

	#[test]
	fn subject_alone_grants_nothing() {
		// A principal named like an admin without the claim is still denied.
		let impostor = Principal::new("admin@example.com", vec![Role::Support]);
		assert!(!is_allowed(&impostor, AdminAction::ResetRequest));
	}

	proptest! {
		#[test]
		fn mutating_actions_require_admin_claim(
			subject in "[a-z]{3,12}@[a-z]{3,8}\\.com",
			has_support in any::<bool>(),
			idx in 0usize..ALL_ACTIONS.len(),
		) {
			let roles = if has_support { vec![Role::Support] } else { vec![] };
			let principal = Principal::new(subject, roles);
			let action = ALL_ACTIONS[idx];
			if !action.is_read_only() {
				prop_assert!(!is_allowed(&principal, action));
			}
		}
	}
}
