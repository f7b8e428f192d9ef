// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, a TOML file and the environment.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::env::load_secret_env;
use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	AdminConfigLayer, AdminCredentialEntry, DatabaseConfigLayer, HttpConfigLayer, LogFormat,
	LoggingConfigLayer, MagicLinkConfigLayer, PaymentConfigLayer, ProvisioningConfigLayer,
	SmtpConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/onboard/server.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: ONBOARD_SERVER_<SECTION>_<FIELD>. Secrets also accept
/// `<VAR>_FILE`.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			environment: env_var("ONBOARD_SERVER_ENV"),
			http: Some(load_http_from_env()?),
			database: Some(load_database_from_env()),
			payment: Some(load_payment_from_env()?),
			magic_link: Some(load_magic_link_from_env()?),
			smtp: Some(load_smtp_from_env()?),
			provisioning: Some(load_provisioning_from_env()?),
			admin: Some(load_admin_from_env()?),
			logging: Some(load_logging_from_env()?),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_parse<T: std::str::FromStr>(name: &str, kind: &str) -> Result<Option<T>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid {kind} value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn env_u16(name: &str) -> Result<Option<u16>, ConfigError> {
	env_parse(name, "u16")
}

fn env_u64(name: &str) -> Result<Option<u64>, ConfigError> {
	env_parse(name, "u64")
}

fn env_i64(name: &str) -> Result<Option<i64>, ConfigError> {
	env_parse(name, "i64")
}

fn secret(name: &str) -> Result<Option<onboard_common_secret::SecretString>, ConfigError> {
	load_secret_env(name).map_err(|e| ConfigError::Secret(e.to_string()))
}

fn load_http_from_env() -> Result<HttpConfigLayer, ConfigError> {
	let cors_origins = env_var("ONBOARD_SERVER_HTTP_CORS_ORIGINS").map(|s| {
		s.split(',')
			.map(|s| s.trim().to_string())
			.filter(|s| !s.is_empty())
			.collect()
	});

	Ok(HttpConfigLayer {
		host: env_var("ONBOARD_SERVER_HTTP_HOST"),
		port: env_u16("ONBOARD_SERVER_HTTP_PORT")?,
		base_url: env_var("ONBOARD_SERVER_HTTP_BASE_URL"),
		cors_origins,
	})
}

fn load_database_from_env() -> DatabaseConfigLayer {
	DatabaseConfigLayer {
		url: env_var("ONBOARD_SERVER_DATABASE_URL"),
	}
}

fn load_payment_from_env() -> Result<PaymentConfigLayer, ConfigError> {
	Ok(PaymentConfigLayer {
		key_id: env_var("ONBOARD_SERVER_PAYMENT_KEY_ID"),
		key_secret: secret("ONBOARD_SERVER_PAYMENT_KEY_SECRET")?,
		webhook_secret: secret("ONBOARD_SERVER_PAYMENT_WEBHOOK_SECRET")?,
		orders_api_url: env_var("ONBOARD_SERVER_PAYMENT_ORDERS_API_URL"),
		order_timeout_secs: env_u64("ONBOARD_SERVER_PAYMENT_ORDER_TIMEOUT_SECS")?,
	})
}

fn load_magic_link_from_env() -> Result<MagicLinkConfigLayer, ConfigError> {
	Ok(MagicLinkConfigLayer {
		ttl_hours: env_i64("ONBOARD_SERVER_MAGIC_LINK_TTL_HOURS")?,
	})
}

fn load_smtp_from_env() -> Result<SmtpConfigLayer, ConfigError> {
	Ok(SmtpConfigLayer {
		host: env_var("ONBOARD_SERVER_SMTP_HOST"),
		port: env_u16("ONBOARD_SERVER_SMTP_PORT")?,
		username: env_var("ONBOARD_SERVER_SMTP_USERNAME"),
		password: secret("ONBOARD_SERVER_SMTP_PASSWORD")?,
		from_address: env_var("ONBOARD_SERVER_SMTP_FROM_ADDRESS"),
		from_name: env_var("ONBOARD_SERVER_SMTP_FROM_NAME"),
		use_tls: env_bool("ONBOARD_SERVER_SMTP_USE_TLS"),
	})
}

fn load_provisioning_from_env() -> Result<ProvisioningConfigLayer, ConfigError> {
	Ok(ProvisioningConfigLayer {
		provider_url: env_var("ONBOARD_SERVER_PROVISIONING_PROVIDER_URL"),
		provider_token: secret("ONBOARD_SERVER_PROVISIONING_PROVIDER_TOKEN")?,
		provider_timeout_secs: env_u64("ONBOARD_SERVER_PROVISIONING_PROVIDER_TIMEOUT_SECS")?,
		email_timeout_secs: env_u64("ONBOARD_SERVER_PROVISIONING_EMAIL_TIMEOUT_SECS")?,
		auto_advance: env_bool("ONBOARD_SERVER_PROVISIONING_AUTO_ADVANCE"),
	})
}

/// `ONBOARD_SERVER_ADMIN_CREDENTIALS` holds a JSON array of
/// `{subject, token_sha256, roles}` objects.
fn load_admin_from_env() -> Result<AdminConfigLayer, ConfigError> {
	let credentials = match env_var("ONBOARD_SERVER_ADMIN_CREDENTIALS") {
		Some(json) => Some(
			serde_json::from_str::<Vec<AdminCredentialEntry>>(&json).map_err(|e| {
				ConfigError::InvalidValue {
					key: "ONBOARD_SERVER_ADMIN_CREDENTIALS".to_string(),
					message: e.to_string(),
				}
			})?,
		),
		None => None,
	};
	Ok(AdminConfigLayer { credentials })
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	let format = match env_var("ONBOARD_SERVER_LOGGING_FORMAT") {
		Some(v) => Some(v.parse::<LogFormat>().map_err(|message| {
			ConfigError::InvalidValue {
				key: "ONBOARD_SERVER_LOGGING_FORMAT".to_string(),
				message,
			}
		})?),
		None => None,
	};

	Ok(LoggingConfigLayer {
		level: env_var("ONBOARD_SERVER_LOGGING_LEVEL"),
		format,
	})
}
