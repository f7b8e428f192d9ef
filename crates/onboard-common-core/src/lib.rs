// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Domain types shared across the onboarding server crates.
//!
//! - [`OnboardingRequest`] and its status state machine
//! - [`Organization`] and [`OrgMembership`]
//! - [`ProvisioningMetadata`], the typed record of what provisioning produced
//! - [`PaymentOrder`], a checkout order awaiting or holding its payment

pub mod error;
pub mod ids;
pub mod metadata;
pub mod onboarding;
pub mod organization;
pub mod payment_order;

pub use error::ValidationError;
pub use ids::{OrgId, RequestId, UserId};
pub use metadata::{
	ProvisionedKeys, ProvisioningFailure, ProvisioningMetadata, ProvisioningStep, PublicMetadata,
	PUBLIC_FAILURE_MESSAGE,
};
pub use onboarding::{
	BillingCycle, NewOnboardingRequest, OnboardingRequest, OnboardingStatus, Plan, MAX_FIELD_LEN,
};
pub use payment_order::{NewPaymentOrder, PaymentOrder, PaymentOrderStatus, ORDER_CURRENCY};
pub use organization::{
	slugify, subscription_ends_at, MemberRole, MembershipStatus, OrgMembership, OrgSettings,
	OrgStatus, Organization, MAX_SLUG_LEN,
};
