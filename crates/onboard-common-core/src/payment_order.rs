// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Checkout orders created with the payment processor before payment.
//!
//! An order is the record the processor's later signature and webhook refer
//! to by `order_id`. It starts `created` and moves to `authorized` or
//! `captured` when the webhook reports the payment.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::ids::RequestId;
use crate::onboarding::{is_plausible_email, required, BillingCycle, Plan};

/// Every order is priced in Indian rupees.
pub const ORDER_CURRENCY: &str = "INR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum PaymentOrderStatus {
	#[default]
	Created,
	Authorized,
	Captured,
}

impl PaymentOrderStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			PaymentOrderStatus::Created => "created",
			PaymentOrderStatus::Authorized => "authorized",
			PaymentOrderStatus::Captured => "captured",
		}
	}
}

impl fmt::Display for PaymentOrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for PaymentOrderStatus {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"created" => Ok(PaymentOrderStatus::Created),
			"authorized" => Ok(PaymentOrderStatus::Authorized),
			"captured" => Ok(PaymentOrderStatus::Captured),
			_ => Err(ValidationError::Invalid {
				field: "status",
				value: s.to_string(),
			}),
		}
	}
}

/// Checkout form input for a new order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPaymentOrder {
	pub agency_name: String,
	pub admin_email: String,
	pub plan: Plan,
	pub billing_cycle: BillingCycle,
}

impl NewPaymentOrder {
	pub fn normalize(self) -> Result<Self, ValidationError> {
		let agency_name = required("agency_name", &self.agency_name)?;
		let admin_email = required("admin_email", &self.admin_email)?.to_lowercase();
		if !is_plausible_email(&admin_email) {
			return Err(ValidationError::Invalid {
				field: "admin_email",
				value: admin_email,
			});
		}
		Ok(Self {
			agency_name,
			admin_email,
			plan: self.plan,
			billing_cycle: self.billing_cycle,
		})
	}

	pub fn amount_minor(&self) -> u64 {
		self.plan.price_minor(self.billing_cycle)
	}

	pub fn description(&self) -> String {
		format!("{} Plan - {}", self.plan.display_name(), self.billing_cycle)
	}
}

/// A stored checkout order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOrder {
	/// Processor order id.
	pub order_id: String,
	pub receipt: String,
	pub agency_name: String,
	pub admin_email: String,
	pub plan: Plan,
	pub billing_cycle: BillingCycle,
	pub amount_minor: u64,
	pub currency: String,
	pub status: PaymentOrderStatus,
	/// Created without calling the processor.
	pub test_mode: bool,
	pub payment_id: Option<String>,
	pub onboarding_request_id: Option<RequestId>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub paid_at: Option<DateTime<Utc>>,
}

impl PaymentOrder {
	pub fn created(
		new: NewPaymentOrder,
		order_id: String,
		receipt: String,
		test_mode: bool,
		now: DateTime<Utc>,
	) -> Self {
		let now = now.trunc_subsecs(6);
		Self {
			order_id,
			receipt,
			amount_minor: new.amount_minor(),
			agency_name: new.agency_name,
			admin_email: new.admin_email,
			plan: new.plan,
			billing_cycle: new.billing_cycle,
			currency: ORDER_CURRENCY.to_string(),
			status: PaymentOrderStatus::Created,
			test_mode,
			payment_id: None,
			onboarding_request_id: None,
			created_at: now,
			updated_at: now,
			paid_at: None,
		}
	}

	/// Amount in whole currency units, as shown to the payer.
	pub fn amount_major(&self) -> u64 {
		self.amount_minor / 100
	}
}
