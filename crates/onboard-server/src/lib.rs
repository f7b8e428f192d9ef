// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant onboarding HTTP server.
//!
//! Payment intake, the public onboarding form and status polling, setup
//! token verification and the role-gated admin surface, all over one
//! SQLite database.

pub mod api;
pub mod api_docs;
pub mod auth_middleware;
pub mod error;
pub mod routes;

pub use api::{create_app_state, create_app_state_with, create_router, AppState};
pub use api_docs::ApiDoc;
pub use error::ServerError;
pub use onboard_server_config::ServerConfig;
