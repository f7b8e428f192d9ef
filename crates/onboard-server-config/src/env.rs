// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secret loading with `*_FILE` support.
//!
//! `load_secret_env("ONBOARD_SERVER_PAYMENT_KEY_SECRET")` reads the variable
//! itself, or failing that the file named by
//! `ONBOARD_SERVER_PAYMENT_KEY_SECRET_FILE`. Setting both is an error.

use std::path::PathBuf;

use onboard_common_secret::SecretString;

#[derive(Debug, thiserror::Error)]
pub enum SecretEnvError {
	#[error("both {var} and {var}_FILE are set")]
	Conflict { var: String },

	#[error("failed to read {var}_FILE at {path}: {source}")]
	FileRead {
		var: String,
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

pub fn load_secret_env(var: &str) -> Result<Option<SecretString>, SecretEnvError> {
	let direct = std::env::var(var).ok().filter(|v| !v.is_empty());
	let file_var = format!("{var}_FILE");
	let file = std::env::var(&file_var).ok().filter(|v| !v.is_empty());

	match (direct, file) {
		(Some(_), Some(_)) => Err(SecretEnvError::Conflict {
			var: var.to_string(),
		}),
		(Some(value), None) => Ok(Some(SecretString::new(value))),
		(None, Some(path)) => {
			let path = PathBuf::from(path);
			let mut content =
				std::fs::read_to_string(&path).map_err(|source| SecretEnvError::FileRead {
					var: var.to_string(),
					path: path.clone(),
					source,
				})?;
			// Editors and `echo` leave one trailing newline.
			if content.ends_with('\n') {
				content.pop();
				if content.ends_with('\r') {
					content.pop();
				}
			}
			Ok(Some(SecretString::new(content)))
		}
		(None, None) => Ok(None),
	}
}
