// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authentication and authorization for the onboarding admin surface.
//!
//! Authentication resolves a bearer credential to a [`Principal`] carrying
//! role claims. Authorization is the pure predicate [`is_allowed`], which
//! never looks at transport details.

pub mod credentials;
pub mod policy;
pub mod types;

pub use credentials::{hash_admin_token, AdminCredential, CredentialError, CredentialVerifier};
pub use policy::is_allowed;
pub use types::{AdminAction, Principal, Role};
