// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Payment webhook payloads.
//!
//! Only `payment.authorized` and `payment.captured` start onboarding. Every
//! other event is acknowledged and ignored.

use onboard_common_core::{
	BillingCycle, NewOnboardingRequest, PaymentOrder, PaymentOrderStatus, Plan,
};
use serde::Deserialize;

use crate::error::PaymentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentEventKind {
	Authorized,
	Captured,
	Other,
}

impl PaymentEventKind {
	fn from_event(event: &str) -> Self {
		match event {
			"payment.authorized" => PaymentEventKind::Authorized,
			"payment.captured" => PaymentEventKind::Captured,
			_ => PaymentEventKind::Other,
		}
	}

	pub fn starts_onboarding(&self) -> bool {
		matches!(self, PaymentEventKind::Authorized | PaymentEventKind::Captured)
	}

	/// Status a stored checkout order moves to on this event.
	pub fn order_status(&self) -> Option<PaymentOrderStatus> {
		match self {
			PaymentEventKind::Authorized => Some(PaymentOrderStatus::Authorized),
			PaymentEventKind::Captured => Some(PaymentOrderStatus::Captured),
			PaymentEventKind::Other => None,
		}
	}
}

/// Customer-supplied checkout notes attached to the order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentNotes {
	pub agency_name: Option<String>,
	pub admin_email: Option<String>,
	pub admin_name: Option<String>,
	pub website: Option<String>,
	pub plan: Option<String>,
	pub billing_cycle: Option<String>,
	pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEntity {
	pub id: String,
	pub order_id: Option<String>,
	pub amount: Option<u64>,
	pub email: Option<String>,
	#[serde(default, deserialize_with = "notes_or_empty")]
	pub notes: PaymentNotes,
}

// The processor sends `"notes": []` when the order carries no notes.
fn notes_or_empty<'de, D>(deserializer: D) -> Result<PaymentNotes, D::Error>
where
	D: serde::Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Notes {
		Map(PaymentNotes),
		List(Vec<serde_json::Value>),
	}

	Ok(match Notes::deserialize(deserializer)? {
		Notes::Map(notes) => notes,
		Notes::List(_) => PaymentNotes::default(),
	})
}

#[derive(Debug, Deserialize)]
struct RawEvent {
	event: String,
	#[serde(default)]
	payload: Option<RawPayload>,
}

#[derive(Debug, Deserialize)]
struct RawPayload {
	payment: Option<RawPaymentWrapper>,
}

#[derive(Debug, Deserialize)]
struct RawPaymentWrapper {
	entity: PaymentEntity,
}

#[derive(Debug, Clone)]
pub struct PaymentEvent {
	pub event: String,
	pub kind: PaymentEventKind,
	pub payment: Option<PaymentEntity>,
}

impl PaymentEvent {
	pub fn parse(body: &[u8]) -> Result<Self, PaymentError> {
		let raw: RawEvent = serde_json::from_slice(body)?;
		Ok(Self {
			kind: PaymentEventKind::from_event(&raw.event),
			event: raw.event,
			payment: raw.payload.and_then(|p| p.payment).map(|p| p.entity),
		})
	}
}

impl PaymentEntity {
	/// Turn a paid order into onboarding input.
	///
	/// The admin email falls back to the payer's email. When the processor
	/// reports an amount it must cover the plan price.
	pub fn to_onboarding_request(&self) -> Result<NewOnboardingRequest, PaymentError> {
		let order_id = self
			.order_id
			.clone()
			.filter(|o| !o.trim().is_empty())
			.ok_or(PaymentError::MissingField("order_id"))?;

		let plan = match self.notes.plan.as_deref() {
			Some(p) if !p.trim().is_empty() => p.parse::<Plan>()?,
			_ => Plan::default(),
		};
		let billing_cycle = match self.notes.billing_cycle.as_deref() {
			Some(c) if !c.trim().is_empty() => c.parse::<BillingCycle>()?,
			_ => BillingCycle::default(),
		};

		if let Some(actual) = self.amount {
			let expected = plan.price_minor(billing_cycle);
			if actual < expected {
				return Err(PaymentError::AmountMismatch { expected, actual });
			}
		}

		let request = NewOnboardingRequest {
			agency_name: self
				.notes
				.agency_name
				.clone()
				.ok_or(PaymentError::MissingField("agency_name"))?,
			admin_email: self
				.notes
				.admin_email
				.clone()
				.or_else(|| self.email.clone())
				.ok_or(PaymentError::MissingField("admin_email"))?,
			admin_name: self.notes.admin_name.clone(),
			website: self.notes.website.clone(),
			plan,
			billing_cycle,
			notes: self.notes.notes.clone(),
			payment_order_id: Some(order_id),
			payment_id: Some(self.id.clone()),
		};

		Ok(request.normalize()?)
	}

	/// Turn a payment for a stored checkout order into onboarding input.
	///
	/// The stored order decides agency, admin email, plan and price; the
	/// notes only add the optional fields the order does not carry.
	pub fn to_onboarding_request_for_order(
		&self,
		order: &PaymentOrder,
	) -> Result<NewOnboardingRequest, PaymentError> {
		match self.order_id.as_deref() {
			Some(id) if id == order.order_id => {}
			other => {
				return Err(PaymentError::OrderMismatch {
					expected: order.order_id.clone(),
					actual: other.unwrap_or_default().to_string(),
				})
			}
		}

		if let Some(actual) = self.amount {
			if actual < order.amount_minor {
				return Err(PaymentError::AmountMismatch {
					expected: order.amount_minor,
					actual,
				});
			}
		}

		let request = NewOnboardingRequest {
			agency_name: order.agency_name.clone(),
			admin_email: order.admin_email.clone(),
			admin_name: self.notes.admin_name.clone(),
			website: self.notes.website.clone(),
			plan: order.plan,
			billing_cycle: order.billing_cycle,
			notes: self.notes.notes.clone(),
			payment_order_id: Some(order.order_id.clone()),
			payment_id: Some(self.id.clone()),
		};

		Ok(request.normalize()?)
	}
}
