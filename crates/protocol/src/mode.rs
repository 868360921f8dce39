//! Build-mode switch.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Binary debug/release switch read once at process start.
///
/// Drives script-bridge payload selection, development redirects in the
/// resource resolver, and whether reload/cache-purge are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
	/// Development build: live servers, reload, cache purging.
	Debug,
	/// Production build: bundled payloads only.
	Release,
}

impl BuildMode {
	/// Mode matching how the current binary was compiled.
	pub fn from_build() -> Self {
		if cfg!(debug_assertions) { Self::Debug } else { Self::Release }
	}

	/// Returns `true` in [`BuildMode::Debug`].
	pub fn is_development(self) -> bool {
		matches!(self, Self::Debug)
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Debug => "debug",
			Self::Release => "release",
		}
	}
}

impl fmt::Display for BuildMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for BuildMode {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"debug" | "dev" | "development" => Ok(Self::Debug),
			"release" | "prod" | "production" => Ok(Self::Release),
			other => Err(format!("unknown build mode: {other}")),
		}
	}
}
