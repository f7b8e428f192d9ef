// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SMTP client for onboarding mail.
//!
//! Sends multipart (HTML + plain text) messages over [`lettre`], with
//! STARTTLS by default. The password is held in a [`SecretString`].
//!
//! ```no_run
//! use onboard_server_smtp::{SmtpClient, SmtpConfig};
//! use onboard_common_secret::SecretString;
//!
//! # async fn example() -> Result<(), onboard_server_smtp::SmtpError> {
//! let client = SmtpClient::new(SmtpConfig {
//!     host: "smtp.example.com".to_string(),
//!     port: 587,
//!     username: Some("mailer".to_string()),
//!     password: Some(SecretString::new("password".to_string())),
//!     from_address: "noreply@example.com".to_string(),
//!     from_name: "Onboarding".to_string(),
//!     use_tls: true,
//! })?;
//! client
//!     .send_email("owner@acme.io", "Welcome", "<p>Hi</p>", "Hi")
//!     .await?;
//! # Ok(())
//! # }
//! ```

use lettre::{
	message::{header::ContentType, Mailbox, MultiPart, SinglePart},
	transport::smtp::authentication::Credentials,
	AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use onboard_common_secret::SecretString;

#[derive(Debug, thiserror::Error)]
pub enum SmtpError {
	#[error("connection failed: {0}")]
	Connection(String),

	#[error("send failed: {0}")]
	Send(String),

	#[error("invalid email address: {0}")]
	Address(String),
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
	pub host: String,
	/// 25 (plain), 465 (TLS) or 587 (STARTTLS).
	pub port: u16,
	pub username: Option<String>,
	pub password: Option<SecretString>,
	pub from_address: String,
	pub from_name: String,
	pub use_tls: bool,
}

pub struct SmtpClient {
	transport: AsyncSmtpTransport<Tokio1Executor>,
	from_mailbox: Mailbox,
}

impl SmtpClient {
	/// Build the transport. No connection is made until the first send.
	///
	/// # Errors
	/// [`SmtpError::Address`] if the sender address is invalid and
	/// [`SmtpError::Connection`] if the TLS relay cannot be configured.
	#[tracing::instrument(
		name = "smtp_client_new",
		skip(config),
		fields(host = %config.host, port = %config.port, use_tls = %config.use_tls)
	)]
	pub fn new(config: SmtpConfig) -> Result<Self, SmtpError> {
		let from_mailbox: Mailbox = format!("{} <{}>", config.from_name, config.from_address)
			.parse()
			.map_err(|e| SmtpError::Address(format!("{e}")))?;

		let builder = if config.use_tls {
			AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
				.map_err(|e| SmtpError::Connection(format!("{e}")))?
		} else {
			AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
		};

		let mut builder = builder.port(config.port);

		if let (Some(username), Some(password)) = (config.username, config.password) {
			builder = builder.credentials(Credentials::new(username, password.into_inner()));
		}

		tracing::debug!("SMTP client initialized");

		Ok(Self {
			transport: builder.build(),
			from_mailbox,
		})
	}

	#[tracing::instrument(name = "smtp_check_health", skip(self))]
	pub async fn check_health(&self) -> Result<(), SmtpError> {
		self
			.transport
			.test_connection()
			.await
			.map_err(|e| SmtpError::Connection(format!("{e}")))?;
		tracing::debug!("SMTP server is healthy");
		Ok(())
	}

	#[tracing::instrument(
		name = "smtp_send_email",
		skip(self, body_html, body_text),
		fields(to = %to, subject = %subject)
	)]
	pub async fn send_email(
		&self,
		to: &str,
		subject: &str,
		body_html: &str,
		body_text: &str,
	) -> Result<(), SmtpError> {
		let to_mailbox: Mailbox = to.parse().map_err(|e| SmtpError::Address(format!("{e}")))?;

		let message = Message::builder()
			.from(self.from_mailbox.clone())
			.to(to_mailbox)
			.subject(subject)
			.multipart(
				MultiPart::alternative()
					.singlepart(
						SinglePart::builder()
							.header(ContentType::TEXT_PLAIN)
							.body(body_text.to_string()),
					)
					.singlepart(
						SinglePart::builder()
							.header(ContentType::TEXT_HTML)
							.body(body_html.to_string()),
					),
			)
			.map_err(|e| SmtpError::Send(format!("failed to build message: {e}")))?;

		self
			.transport
			.send(message)
			.await
			.map_err(|e| SmtpError::Send(format!("{e}")))?;

		tracing::info!("email sent");
		Ok(())
	}
}

/// Syntactic check via [`Mailbox`] parsing; says nothing about deliverability.
pub fn is_valid_email(email: &str) -> bool {
	email.parse::<Mailbox>().is_ok()
}
