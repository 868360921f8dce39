//! Parsing of `local://` addresses into resource lookups.

use percent_encoding::percent_decode_str;
use tabhost_runtime::{Error, Result};
use url::Url;

use super::DEFAULT_INDEX_DOCUMENT;

/// A custom-scheme request split into its addressing parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
	pub scheme: String,
	pub host: Option<String>,
	pub path: String,
}

impl ResourceRequest {
	pub fn new(scheme: impl Into<String>, host: Option<&str>, path: impl Into<String>) -> Self {
		Self {
			scheme: scheme.into(),
			host: host.map(str::to_string),
			path: path.into(),
		}
	}

	/// Parses an address such as `local://style.css` or `local:///index.html`.
	///
	/// # Errors
	///
	/// Returns [`Error::ResourceNotFound`] carrying the raw address when it
	/// is not a valid URL.
	pub fn parse(address: &str) -> Result<Self> {
		let url = Url::parse(address).map_err(|_| Error::ResourceNotFound {
			filename: address.to_string(),
		})?;
		Ok(Self {
			scheme: url.scheme().to_string(),
			host: url.host_str().map(str::to_string),
			path: url.path().to_string(),
		})
	}

	/// File name this request asks for.
	///
	/// A non-empty host wins (`local://style.css`). Otherwise the last path
	/// segment is used, falling back to [`DEFAULT_INDEX_DOCUMENT`] when the
	/// path has none (`local:///`). Percent-escapes are decoded.
	pub fn file_name(&self) -> String {
		if let Some(host) = self.host.as_deref().filter(|h| !h.is_empty()) {
			return decode(host);
		}

		match self.path.rsplit('/').next() {
			Some(segment) if !segment.is_empty() => decode(segment),
			_ => DEFAULT_INDEX_DOCUMENT.to_string(),
		}
	}
}

fn decode(component: &str) -> String {
	percent_decode_str(component).decode_utf8_lossy().into_owned()
}

/// A file name split at its last `.`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceName {
	pub base: String,
	pub extension: Option<String>,
}

impl ResourceName {
	pub fn split(file_name: &str) -> Self {
		match file_name.rsplit_once('.') {
			Some((base, ext)) if !ext.is_empty() => Self {
				base: base.to_string(),
				extension: Some(ext.to_string()),
			},
			Some((base, _)) => Self {
				base: base.to_string(),
				extension: None,
			},
			None => Self {
				base: file_name.to_string(),
				extension: None,
			},
		}
	}

	/// Name looked up in the resource namespace: `base.extension`.
	pub fn lookup_name(&self) -> String {
		match &self.extension {
			Some(ext) => format!("{}.{ext}", self.base),
			None => self.base.clone(),
		}
	}
}
