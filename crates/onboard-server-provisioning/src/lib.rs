// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant onboarding services.
//!
//! - [`Orchestrator`]: request intake and the `pending → provisioning →
//!   completed | failed` state machine.
//! - [`AdminService`]: role-gated list, view, approve, reset and resend.
//! - [`SetupService`]: token lookup and account completion for the new
//!   tenant administrator.
//! - [`MagicLinkService`]: issue, verify and consume setup links.
//! - [`PaymentOrderService`]: checkout orders and their settlement.
//!
//! External calls go through [`InfraProvisioner`],
//! [`onboard_server_email::SetupNotifier`] and
//! [`onboard_server_payment::OrderGateway`].

pub mod admin;
pub mod error;
pub mod magic_links;
pub mod orchestrator;
pub mod payment_orders;
pub mod provider;
pub mod setup;
pub mod testing;

pub use admin::{AdminRequestView, AdminService, ResendReceipt};
pub use error::{ProvisioningError, Result};
pub use magic_links::MagicLinkService;
pub use orchestrator::{slug_with_suffix, Orchestrator, OrchestratorSettings, RequestStatus};
pub use payment_orders::PaymentOrderService;
pub use provider::{
	HttpInfraProvisioner, InfraProvisioner, ProviderError, ProvisionRequest, ProvisionedInstance,
	UnconfiguredProvisioner,
};
pub use setup::{SetupContext, SetupService};
