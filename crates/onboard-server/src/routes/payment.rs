// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Checkout orders and payment processor callbacks.
//!
//! Neither callback trusts its input until the signature checks out. Bad
//! signatures are logged on the security target and rejected with 401
//! before any onboarding state is read or written.

use axum::{
	body::Bytes,
	extract::State,
	http::{HeaderMap, StatusCode},
	Json,
};
use onboard_common_core::{PaymentOrder, RequestId};
use onboard_server_api::{
	CreateOrderRequest, CreateOrderResponse, ErrorResponse, PaymentVerifyRequest,
	PaymentVerifyResponse, WebhookAckResponse,
};
use onboard_server_payment::{
	PaymentConfirmation, PaymentEntity, PaymentError, PaymentEvent, PaymentEventKind,
	PAYMENT_SIGNATURE_HEADER,
};
use onboard_server_provisioning::ProvisioningError;

use crate::{api::AppState, error::ServerError};

#[utoipa::path(
    post,
    path = "/api/payment/create-order",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Checkout order created", body = CreateOrderResponse),
        (status = 400, description = "Invalid checkout form", body = ErrorResponse),
        (status = 502, description = "Payment processor rejected the order", body = ErrorResponse),
        (status = 503, description = "Payments not configured", body = ErrorResponse),
        (status = 504, description = "Payment processor timed out", body = ErrorResponse)
    ),
    tag = "payment"
)]
#[tracing::instrument(skip_all)]
pub async fn create_order(
	State(state): State<AppState>,
	Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), ServerError> {
	let order = state.orders.create_order(payload.into()).await?;
	Ok((
		StatusCode::CREATED,
		Json(CreateOrderResponse::new(&order, state.orders.key_id())),
	))
}

#[utoipa::path(
    post,
    path = "/api/payment/verify",
    request_body = PaymentVerifyRequest,
    responses(
        (status = 200, description = "Signature verified", body = PaymentVerifyResponse),
        (status = 400, description = "Missing field", body = onboard_server_api::ErrorResponse),
        (status = 401, description = "Signature mismatch", body = onboard_server_api::ErrorResponse),
        (status = 503, description = "Payments not configured", body = onboard_server_api::ErrorResponse)
    ),
    tag = "payment"
)]
#[tracing::instrument(skip_all, fields(order_id = %payload.order_id))]
pub async fn verify_payment(
	State(state): State<AppState>,
	Json(payload): Json<PaymentVerifyRequest>,
) -> Result<Json<PaymentVerifyResponse>, ServerError> {
	let verifier = state
		.payment
		.as_ref()
		.ok_or(ServerError::NotConfigured("payment"))?;

	let confirmation = PaymentConfirmation {
		order_id: payload.order_id,
		payment_id: payload.payment_id,
		signature: payload.signature,
	};
	if !verifier.verify_confirmation(&confirmation)? {
		tracing::warn!(
			target: "onboard::security",
			order_id = %confirmation.order_id,
			"payment signature mismatch"
		);
		return Err(ServerError::InvalidSignature);
	}

	tracing::info!("payment signature verified");
	Ok(Json(PaymentVerifyResponse {
		verified: true,
		order_id: confirmation.order_id.trim().to_string(),
		payment_id: confirmation.payment_id.trim().to_string(),
	}))
}

#[utoipa::path(
    post,
    path = "/api/payment/webhook",
    request_body(content = String, description = "Raw event body, signed in the x-razorpay-signature header"),
    responses(
        (status = 200, description = "Event acknowledged", body = WebhookAckResponse),
        (status = 400, description = "Malformed event", body = onboard_server_api::ErrorResponse),
        (status = 401, description = "Signature mismatch", body = onboard_server_api::ErrorResponse)
    ),
    tag = "payment"
)]
#[tracing::instrument(skip_all, fields(body_len = body.len()))]
pub async fn payment_webhook(
	State(state): State<AppState>,
	headers: HeaderMap,
	body: Bytes,
) -> Result<Json<WebhookAckResponse>, ServerError> {
	let verifier = state
		.payment
		.as_ref()
		.ok_or(ServerError::NotConfigured("payment"))?;

	let signature = headers
		.get(PAYMENT_SIGNATURE_HEADER)
		.and_then(|v| v.to_str().ok())
		.unwrap_or_default();
	if signature.is_empty() || !verifier.verify_webhook(&body, signature) {
		tracing::warn!(
			target: "onboard::security",
			signature_present = !signature.is_empty(),
			"webhook signature rejected"
		);
		return Err(ServerError::InvalidSignature);
	}

	let event = PaymentEvent::parse(&body)?;
	if !event.kind.starts_onboarding() {
		tracing::debug!(event = %event.event, "ignoring payment event");
		return Ok(Json(WebhookAckResponse {
			acknowledged: true,
			request_id: None,
			duplicate: false,
		}));
	}

	let payment = event
		.payment
		.ok_or(PaymentError::MissingField("payload.payment"))?;
	// Orders created here are authoritative; foreign orders fall back to notes.
	let stored = state.orders.find(payment.order_id.as_deref()).await?;
	let new = match &stored {
		Some(order) => payment.to_onboarding_request_for_order(order)?,
		None => payment.to_onboarding_request()?,
	};

	let request = match state.orchestrator.create_request(new).await {
		Ok(request) => request,
		Err(ProvisioningError::Duplicate { existing }) => {
			tracing::info!(request_id = %existing, event = %event.event, "duplicate payment event");
			settle(&state, stored.as_ref(), &payment, event.kind, &existing).await?;
			return Ok(Json(WebhookAckResponse {
				acknowledged: true,
				request_id: Some(existing.to_string()),
				duplicate: true,
			}));
		}
		Err(e) => return Err(e.into()),
	};
	settle(&state, stored.as_ref(), &payment, event.kind, &request.id).await?;

	if state.auto_advance {
		// A failed advance is recorded on the request and still acknowledged.
		if let Err(e) = state.orchestrator.advance(&request.id).await {
			tracing::warn!(request_id = %request.id, error = %e, "auto-advance failed");
		}
	}

	Ok(Json(WebhookAckResponse {
		acknowledged: true,
		request_id: Some(request.id.to_string()),
		duplicate: false,
	}))
}

async fn settle(
	state: &AppState,
	order: Option<&PaymentOrder>,
	payment: &PaymentEntity,
	kind: PaymentEventKind,
	request_id: &RequestId,
) -> Result<(), ServerError> {
	if let (Some(order), Some(status)) = (order, kind.order_status()) {
		state
			.orders
			.settle(&order.order_id, &payment.id, status, request_id)
			.await?;
	}
	Ok(())
}
