// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Notification dispatch for tenant onboarding.
//!
//! [`SetupNotifier`] is the seam the orchestrator calls. [`EmailService`]
//! delivers over SMTP; [`DisabledNotifier`] stands in when no mail server is
//! configured and fails every send.

mod templates;

pub use templates::{render_setup_email, RenderedEmail};

use async_trait::async_trait;
use onboard_common_secret::SecretString;
use onboard_server_smtp::{SmtpClient, SmtpError};

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
	#[error("email delivery is not configured")]
	NotConfigured,

	#[error(transparent)]
	Smtp(#[from] SmtpError),
}

/// Everything the setup email needs. Provider keys are deliberately absent.
#[derive(Debug, Clone)]
pub struct SetupEmail {
	pub agency_name: String,
	pub admin_email: String,
	/// Embeds the magic-link token.
	pub setup_url: SecretString,
	pub instance_url: Option<String>,
	pub project_id: Option<String>,
}

#[async_trait]
pub trait SetupNotifier: Send + Sync {
	async fn send_setup_email(&self, email: &SetupEmail) -> Result<(), EmailError>;
}

pub struct EmailService {
	smtp: SmtpClient,
}

impl EmailService {
	pub fn new(smtp: SmtpClient) -> Self {
		Self { smtp }
	}

	pub async fn check_health(&self) -> Result<(), EmailError> {
		Ok(self.smtp.check_health().await?)
	}
}

#[async_trait]
impl SetupNotifier for EmailService {
	#[tracing::instrument(
		name = "email.setup",
		skip(self, email),
		fields(to = %email.admin_email, agency = %email.agency_name)
	)]
	async fn send_setup_email(&self, email: &SetupEmail) -> Result<(), EmailError> {
		let rendered = render_setup_email(email);
		self
			.smtp
			.send_email(&email.admin_email, &rendered.subject, &rendered.html, &rendered.text)
			.await?;
		tracing::info!("setup email sent");
		Ok(())
	}
}

/// Used when the server runs without SMTP.
pub struct DisabledNotifier;

#[async_trait]
impl SetupNotifier for DisabledNotifier {
	async fn send_setup_email(&self, email: &SetupEmail) -> Result<(), EmailError> {
		tracing::warn!(to = %email.admin_email, "setup email not sent: SMTP is not configured");
		Err(EmailError::NotConfigured)
	}
}
