//! App credentials used to authenticate every upstream call.

// self
use crate::{
	_prelude::*,
	auth::{AppId, Secret},
	error::ConfigError,
};

/// App identifier and secret pair sourced from process configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
	/// Application identifier.
	pub app_id: AppId,
	/// Application secret; never logged.
	pub app_secret: Secret,
}
impl Credentials {
	/// Validates and wraps an app identifier and secret.
	pub fn new(app_id: impl AsRef<str>, app_secret: impl Into<String>) -> Result<Self, ConfigError> {
		let app_secret = Secret::new(app_secret);

		if app_id.as_ref().is_empty() || app_secret.is_empty() {
			return Err(ConfigError::MissingCredentials {
				app_id: !app_id.as_ref().is_empty(),
				app_secret: !app_secret.is_empty(),
			});
		}

		let app_id = AppId::new(app_id.as_ref()).map_err(ConfigError::InvalidAppId)?;

		Ok(Self { app_id, app_secret })
	}

	/// Builds credentials from optional configuration values, treating empty strings as absent.
	pub fn from_parts(app_id: Option<&str>, app_secret: Option<&str>) -> Result<Self, ConfigError> {
		match (non_empty(app_id), non_empty(app_secret)) {
			(Some(id), Some(secret)) => Self::new(id, secret),
			(id, secret) => Err(ConfigError::MissingCredentials {
				app_id: id.is_some(),
				app_secret: secret.is_some(),
			}),
		}
	}
}

fn non_empty(value: Option<&str>) -> Option<&str> {
	value.filter(|v| !v.trim().is_empty())
}
