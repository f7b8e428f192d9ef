// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the onboarding server.
//!
//! Layered from built-in defaults, a TOML file and `ONBOARD_SERVER_*`
//! environment variables, in increasing precedence.
//!
//! ```ignore
//! use onboard_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("listening on {}", config.socket_addr());
//! ```

pub mod env;
pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use env::{load_secret_env, SecretEnvError};
pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

pub const DEVELOPMENT: &str = "development";

#[derive(Debug, Clone)]
pub struct ServerConfig {
	pub environment: String,
	pub http: HttpConfig,
	pub database: DatabaseConfig,
	pub payment: PaymentConfig,
	pub magic_link: MagicLinkConfig,
	pub smtp: Option<SmtpConfig>,
	pub provisioning: ProvisioningConfig,
	pub admin: AdminConfig,
	pub logging: LoggingConfig,
}

impl ServerConfig {
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}

	pub fn is_development(&self) -> bool {
		self.environment == DEVELOPMENT
	}
}

/// Load configuration with the standard precedence.
///
/// 1. Environment variables (`ONBOARD_SERVER_*`)
/// 2. Config file (`/etc/onboard/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

pub fn load_config_from_env() -> Result<ServerConfig, ConfigError> {
	load_from(vec![Box::new(EnvSource)])
}

fn load_from(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

/// Resolve a merged layer and apply cross-field validation.
pub fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let config = ServerConfig {
		environment: layer.environment.unwrap_or_else(|| DEVELOPMENT.to_string()),
		http: layer.http.unwrap_or_default().finalize(),
		database: layer.database.unwrap_or_default().finalize(),
		payment: layer.payment.unwrap_or_default().finalize(),
		magic_link: layer.magic_link.unwrap_or_default().finalize(),
		smtp: layer.smtp.unwrap_or_default().finalize()?,
		provisioning: layer.provisioning.unwrap_or_default().finalize(),
		admin: layer.admin.unwrap_or_default().finalize()?,
		logging: layer.logging.unwrap_or_default().finalize(),
	};

	validate_config(&config)?;

	info!(
		environment = %config.environment,
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		smtp_configured = config.smtp.is_some(),
		provider_configured = config.provisioning.provider_url.is_some(),
		auto_advance = config.provisioning.auto_advance,
		admin_credentials = config.admin.credentials.len(),
		"Server configuration loaded"
	);

	Ok(config)
}

fn validate_config(config: &ServerConfig) -> Result<(), ConfigError> {
	if config.magic_link.ttl_hours <= 0 {
		return Err(ConfigError::InvalidValue {
			key: "magic_link.ttl_hours".to_string(),
			message: "must be positive".to_string(),
		});
	}
	if config.magic_link.ttl_hours > MAX_TTL_HOURS {
		return Err(ConfigError::InvalidValue {
			key: "magic_link.ttl_hours".to_string(),
			message: format!("must be at most {MAX_TTL_HOURS}"),
		});
	}

	if config.is_development() {
		return Ok(());
	}

	if config.payment.key_secret.is_none() {
		return Err(ConfigError::MissingEnvVar(
			"ONBOARD_SERVER_PAYMENT_KEY_SECRET".to_string(),
		));
	}
	if config.payment.webhook_secret.is_none() {
		return Err(ConfigError::MissingEnvVar(
			"ONBOARD_SERVER_PAYMENT_WEBHOOK_SECRET".to_string(),
		));
	}
	if config.provisioning.provider_url.is_none() {
		return Err(ConfigError::Validation(format!(
			"provisioning.provider_url is required when environment is '{}'",
			config.environment
		)));
	}

	Ok(())
}
