// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP listener and public URL.

use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct HttpConfig {
	pub host: String,
	pub port: u16,
	/// Public origin used to build setup links.
	pub base_url: String,
	/// Empty means any origin.
	pub cors_origins: Vec<String>,
}

impl Default for HttpConfig {
	fn default() -> Self {
		HttpConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpConfigLayer {
	#[serde(default)]
	pub host: Option<String>,
	#[serde(default)]
	pub port: Option<u16>,
	#[serde(default)]
	pub base_url: Option<String>,
	#[serde(default)]
	pub cors_origins: Option<Vec<String>>,
}

impl HttpConfigLayer {
	pub fn merge(&mut self, other: HttpConfigLayer) {
		if other.host.is_some() {
			self.host = other.host;
		}
		if other.port.is_some() {
			self.port = other.port;
		}
		if other.base_url.is_some() {
			self.base_url = other.base_url;
		}
		if other.cors_origins.is_some() {
			self.cors_origins = other.cors_origins;
		}
	}

	pub fn finalize(self) -> HttpConfig {
		let port = self.port.unwrap_or(8080);
		HttpConfig {
			host: self.host.unwrap_or_else(|| "0.0.0.0".to_string()),
			port,
			base_url: self
				.base_url
				.unwrap_or_else(|| format!("http://localhost:{port}")),
			cors_origins: self.cors_origins.unwrap_or_default(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults() {
		let config = HttpConfigLayer::default().finalize();
		assert_eq!(config.host, "0.0.0.0");
		assert_eq!(config.port, 8080);
		assert_eq!(config.base_url, "http://localhost:8080");
		assert!(config.cors_origins.is_empty());
	}

	#[test]
	fn base_url_follows_port_when_unset() {
		let config = HttpConfigLayer {
			port: Some(9000),
			..Default::default()
		}
		.finalize();
		assert_eq!(config.base_url, "http://localhost:9000");
	}

	#[test]
	fn merge_keeps_unset_fields() {
		let mut layer = HttpConfigLayer {
			host: Some("127.0.0.1".to_string()),
			port: Some(3000),
			..Default::default()
		};
		layer.merge(HttpConfigLayer {
			port: Some(4000),
			..Default::default()
		});
		let config = layer.finalize();
		assert_eq!(config.host, "127.0.0.1");
		assert_eq!(config.port, 4000);
	}
}
