use std::path::PathBuf;

use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, HostError>;

#[derive(Debug, Error)]
pub enum HostError {
	#[error("config file {path} could not be used: {reason}")]
	Config { path: PathBuf, reason: String },

	#[error("no tab with id '{id}'")]
	TabNotFound { id: String, available: Vec<String> },

	#[error("invalid input: {0}")]
	InvalidInput(String),

	#[error(transparent)]
	Core(#[from] tabhost::Error),
}

impl HostError {
	/// Convert this error to a CommandError for structured output
	pub fn to_command_error(&self) -> CommandError {
		let (code, message, details) = match self {
			HostError::Config { path, reason } => (
				ErrorCode::ConfigError,
				self.to_string(),
				Some(serde_json::json!({ "path": path, "reason": reason })),
			),
			HostError::TabNotFound { id, available } => (
				ErrorCode::TabNotFound,
				self.to_string(),
				Some(serde_json::json!({ "id": id, "available": available })),
			),
			HostError::InvalidInput(msg) => (ErrorCode::InvalidInput, msg.clone(), None),
			HostError::Core(err) => {
				let details = match err {
					tabhost::Error::ResourceNotFound { filename } => Some(serde_json::json!({ "filename": filename })),
					tabhost::Error::NavigationFailed { address, .. } => {
						Some(serde_json::json!({ "address": address, "retryable": true }))
					}
					tabhost::Error::DescriptorInvalid { tab_id, .. } => Some(serde_json::json!({ "tabId": tab_id })),
					_ => None,
				};
				(ErrorCode::from_core_code(err.code()), err.to_string(), details)
			}
		};

		CommandError { code, message, details }
	}
}
