// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections. Each has a partial `*ConfigLayer` for merging and
//! a resolved `*Config`.

mod admin;
mod database;
mod http;
mod logging;
mod magic_link;
mod payment;
mod provisioning;
mod smtp;

pub use admin::{AdminConfig, AdminConfigLayer, AdminCredentialEntry};
pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use magic_link::{MagicLinkConfig, MagicLinkConfigLayer, MAX_TTL_HOURS};
pub use payment::{
	PaymentConfig, PaymentConfigLayer, DEFAULT_ORDERS_API_URL, DEFAULT_ORDER_TIMEOUT_SECS,
};
pub use provisioning::{ProvisioningConfig, ProvisioningConfigLayer};
pub use smtp::{SmtpConfig, SmtpConfigLayer};
