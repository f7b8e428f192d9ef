// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! OpenAPI documentation for onboard-server, served at `/api/openapi.json`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Onboard Server API",
        version = "1.0.0",
        description = "Tenant onboarding: payment intake, provisioning, setup links and admin controls.",
        license(name = "Proprietary"),
        contact(
            name = "Geoffrey Huntley",
            email = "ghuntley@ghuntley.com",
            url = "https://ghuntley.com"
        )
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    tags(
        (name = "health", description = "Liveness and database checks"),
        (name = "payment", description = "Checkout orders, payment confirmation and processor webhooks"),
        (name = "onboarding", description = "Public onboarding form and status polling"),
        (name = "setup", description = "Setup link verification and account completion"),
        (name = "admin", description = "Onboarding administration (admin principals only)")
    ),
    paths(
        crate::routes::health::health_check,
        crate::routes::payment::create_order,
        crate::routes::payment::verify_payment,
        crate::routes::payment::payment_webhook,
        crate::routes::onboarding::create_onboarding_request,
        crate::routes::onboarding::get_onboarding_status,
        crate::routes::setup::verify_token,
        crate::routes::setup::complete_setup,
        crate::routes::admin::list_requests,
        crate::routes::admin::get_request,
        crate::routes::admin::advance_request,
        crate::routes::admin::reset_request,
        crate::routes::admin::resend_email,
        crate::routes::admin::list_payments,
    ),
    components(
        schemas(
            onboard_server_api::ErrorResponse,
            onboard_server_api::HealthResponse,
            // Payment
            onboard_server_api::CreateOrderRequest,
            onboard_server_api::CreateOrderResponse,
            onboard_server_api::PaymentVerifyRequest,
            onboard_server_api::PaymentVerifyResponse,
            onboard_server_api::WebhookAckResponse,
            // Onboarding
            onboard_server_api::CreateOnboardingRequest,
            onboard_server_api::CreateOnboardingResponse,
            onboard_server_api::OnboardingStatusResponse,
            onboard_server_api::PublicMetadataResponse,
            // Setup
            onboard_server_api::VerifyTokenRequest,
            onboard_server_api::VerifyTokenResponse,
            onboard_server_api::CompleteSetupRequest,
            onboard_server_api::CompleteSetupResponse,
            // Admin
            onboard_server_api::AdminRequestResponse,
            onboard_server_api::FailureResponse,
            onboard_server_api::ListRequestsResponse,
            onboard_server_api::ResendEmailResponse,
            onboard_server_api::PaymentOrderResponse,
            onboard_server_api::ListPaymentsResponse,
            // Domain enums
            onboard_common_core::OnboardingStatus,
            onboard_common_core::Plan,
            onboard_common_core::BillingCycle,
            onboard_common_core::ProvisioningStep,
            onboard_common_core::PaymentOrderStatus,
        )
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn spec_serializes() {
		let spec = ApiDoc::openapi();
		let json = serde_json::to_string_pretty(&spec).expect("should serialize to JSON");

		assert!(json.contains("\"openapi\""));
		assert!(json.contains("Onboard Server API"));
	}

	#[test]
	fn every_route_is_documented() {
		let spec = ApiDoc::openapi();
		let json = serde_json::to_string(&spec).expect("should serialize");

		let expected_paths = [
			"/health",
			"/api/payment/create-order",
			"/api/payment/verify",
			"/api/payment/webhook",
			"/api/onboarding",
			"/api/onboarding/{id}/status",
			"/api/setup/verify-token",
			"/api/setup/complete",
			"/api/admin/onboarding",
			"/api/admin/onboarding/{id}",
			"/api/admin/onboarding/{id}/advance",
			"/api/admin/onboarding/{id}/reset",
			"/api/admin/onboarding/{id}/resend-email",
			"/api/admin/payments",
		];
		for path in expected_paths {
			assert!(json.contains(path), "Missing path: {path}");
		}
	}

	#[test]
	fn admin_schema_has_no_key_fields() {
		let spec = ApiDoc::openapi();
		let json = serde_json::to_string(&spec).expect("should serialize");

		assert!(!json.contains("serviceKey"));
		assert!(!json.contains("anonKey"));
	}
}
