// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration assembled from every source before resolution.

use serde::Deserialize;

use crate::sections::{
	AdminConfigLayer, DatabaseConfigLayer, HttpConfigLayer, LoggingConfigLayer, MagicLinkConfigLayer,
	PaymentConfigLayer, ProvisioningConfigLayer, SmtpConfigLayer,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfigLayer {
	/// `development`, `staging` or `production`.
	pub environment: Option<String>,
	pub http: Option<HttpConfigLayer>,
	pub database: Option<DatabaseConfigLayer>,
	pub payment: Option<PaymentConfigLayer>,
	pub magic_link: Option<MagicLinkConfigLayer>,
	pub smtp: Option<SmtpConfigLayer>,
	pub provisioning: Option<ProvisioningConfigLayer>,
	pub admin: Option<AdminConfigLayer>,
	pub logging: Option<LoggingConfigLayer>,
}

macro_rules! merge_section {
	($self:ident, $other:ident, $($field:ident),+ $(,)?) => {
		$(
			match ($self.$field.as_mut(), $other.$field) {
				(Some(mine), Some(theirs)) => mine.merge(theirs),
				(None, Some(theirs)) => $self.$field = Some(theirs),
				(_, None) => {}
			}
		)+
	};
}

impl ServerConfigLayer {
	/// Overlay `other` on top of `self`; fields set in `other` win.
	pub fn merge(&mut self, other: ServerConfigLayer) {
		if other.environment.is_some() {
			self.environment = other.environment;
		}
		merge_section!(
			self,
			other,
			http,
			database,
			payment,
			magic_link,
			smtp,
			provisioning,
			admin,
			logging,
		);
	}
}
