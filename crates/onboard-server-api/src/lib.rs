// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire types for the onboarding HTTP API. JSON fields are camelCase.

pub mod admin;
pub mod common;
pub mod onboarding;
pub mod payment;
pub mod setup;

pub use admin::{
	AdminRequestResponse, FailureResponse, ListRequestsParams, ListRequestsResponse,
	ResendEmailResponse,
};
pub use common::{ErrorResponse, HealthResponse};
pub use onboarding::{
	CreateOnboardingRequest, CreateOnboardingResponse, OnboardingStatusResponse,
	PublicMetadataResponse,
};
pub use payment::{
	CreateOrderRequest, CreateOrderResponse, ListPaymentsResponse, PaymentOrderResponse,
	PaymentVerifyRequest, PaymentVerifyResponse, WebhookAckResponse,
};
pub use setup::{CompleteSetupRequest, CompleteSetupResponse, VerifyTokenRequest, VerifyTokenResponse};
