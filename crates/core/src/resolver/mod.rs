//! Resource resolution for the `local://` scheme.
//!
//! The resolver answers custom-scheme requests from a web content engine
//! out of a flat namespace of bundled files. In development mode one
//! reserved address, [`RESERVED_INDEX_ADDRESS`], is redirected to a live
//! development server instead; every other address passes through.
//!
//! Resolution is stateless: the build mode and the dev address are fixed
//! when the resolver is constructed and never vary per request.

mod assets;
mod mime;
mod request;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tabhost_protocol::BuildMode;
use tabhost_runtime::{Error, Result};
use tracing::{debug, info};

pub use assets::{AssetSource, DirectoryAssets, MemoryAssets};
pub use mime::{OCTET_STREAM, mime_type_for};
pub use request::{ResourceName, ResourceRequest};

use crate::web::WebContentEngine;

/// Scheme served by the resolver.
pub const LOCAL_SCHEME: &str = "local";

/// Document served when a request names no file.
pub const DEFAULT_INDEX_DOCUMENT: &str = "index.html";

/// The one address redirected to the development server in debug builds.
pub const RESERVED_INDEX_ADDRESS: &str = "local://index.html";

/// Fixed local development server for web content.
pub const DEFAULT_DEV_ADDRESS: &str = "http://localhost:3000";

/// A successfully resolved bundled file.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedResource {
	pub file_name: String,
	pub base: String,
	pub extension: Option<String>,
	pub mime_type: &'static str,
	#[serde(skip)]
	pub bytes: Vec<u8>,
}

impl ResolvedResource {
	pub fn len(&self) -> usize {
		self.bytes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.bytes.is_empty()
	}
}

impl fmt::Debug for ResolvedResource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ResolvedResource")
			.field("file_name", &self.file_name)
			.field("mime_type", &self.mime_type)
			.field("len", &self.bytes.len())
			.finish()
	}
}

/// Serves bundled files and applies development routing.
pub struct ResourceResolver {
	mode: BuildMode,
	assets: Arc<dyn AssetSource>,
	dev_address: String,
}

impl ResourceResolver {
	pub fn new(mode: BuildMode, assets: Arc<dyn AssetSource>) -> Self {
		Self {
			mode,
			assets,
			dev_address: DEFAULT_DEV_ADDRESS.to_string(),
		}
	}

	/// Overrides the development server the reserved address redirects to.
	pub fn with_dev_address(mut self, address: impl Into<String>) -> Self {
		self.dev_address = address.into();
		self
	}

	pub fn mode(&self) -> BuildMode {
		self.mode
	}

	pub fn dev_address(&self) -> &str {
		&self.dev_address
	}

	pub fn assets(&self) -> &dyn AssetSource {
		self.assets.as_ref()
	}

	/// Resolves one request to its bytes and MIME type.
	///
	/// The file name comes from [`ResourceRequest::file_name`]; the MIME type
	/// from the lowercased extension.
	///
	/// # Errors
	///
	/// Returns [`Error::ResourceNotFound`] carrying the derived file name when
	/// nothing in the namespace matches. No bytes are returned in that case.
	pub fn resolve(&self, request: &ResourceRequest) -> Result<ResolvedResource> {
		let file_name = request.file_name();
		let name = ResourceName::split(&file_name);

		let bytes = self.assets.read(&name.lookup_name()).map_err(|err| match err {
			Error::ResourceNotFound { .. } => Error::ResourceNotFound {
				filename: file_name.clone(),
			},
			other => other,
		})?;

		let mime_type = mime_type_for(name.extension.as_deref());
		debug!(target = "tabhost.resolver", file = %file_name, mime = mime_type, len = bytes.len(), "resolved resource");

		Ok(ResolvedResource {
			file_name,
			base: name.base,
			extension: name.extension,
			mime_type,
			bytes,
		})
	}

	/// Parses and resolves a full `local://` address.
	///
	/// # Errors
	///
	/// Returns [`Error::ResourceNotFound`] for unparsable addresses, addresses
	/// on another scheme, and names with no bundled file.
	pub fn resolve_address(&self, address: &str) -> Result<ResolvedResource> {
		let request = ResourceRequest::parse(address)?;
		if !request.scheme.eq_ignore_ascii_case(LOCAL_SCHEME) {
			return Err(Error::ResourceNotFound {
				filename: address.to_string(),
			});
		}
		self.resolve(&request)
	}

	/// Address the content engine should actually load for `requested`.
	pub fn resolve_base_address(&self, requested: &str) -> String {
		if self.redirects(requested) {
			info!(target = "tabhost.resolver", from = requested, to = %self.dev_address, "redirecting to dev server");
			return self.dev_address.clone();
		}
		requested.to_string()
	}

	/// Returns true if `requested` is rewritten by [`Self::resolve_base_address`].
	pub fn redirects(&self, requested: &str) -> bool {
		self.mode.is_development() && requested == RESERVED_INDEX_ADDRESS
	}

	/// Clears the engine's cached storage, resolving once it is done.
	///
	/// Only meaningful in development mode, ahead of loading the redirected
	/// index address.
	///
	/// # Errors
	///
	/// Returns [`Error::Unsupported`] in release mode, or whatever the engine
	/// reports while purging.
	pub async fn purge_cache(&self, engine: &dyn WebContentEngine) -> Result<()> {
		if !self.mode.is_development() {
			return Err(Error::Unsupported("cache purge is only available in debug builds"));
		}
		debug!(target = "tabhost.resolver", "purging web content cache");
		engine.purge_cache().await
	}
}

impl fmt::Debug for ResourceResolver {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ResourceResolver")
			.field("mode", &self.mode)
			.field("assets", &self.assets.describe())
			.field("dev_address", &self.dev_address)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::headless::HeadlessWebEngine;

	fn bundle() -> Arc<dyn AssetSource> {
		Arc::new(
			MemoryAssets::new()
				.with_file("index.html", "<html><body>home</body></html>")
				.with_file("style.css", "body { margin: 0 }")
				.with_file("logo.PNG", vec![0x89, b'P', b'N', b'G']),
		)
	}

	#[test]
	fn resolves_host_form() {
		let resolver = ResourceResolver::new(BuildMode::Release, bundle());
		let resource = resolver.resolve_address("local://style.css").unwrap();

		assert_eq!(resource.base, "style");
		assert_eq!(resource.extension.as_deref(), Some("css"));
		assert_eq!(resource.mime_type, "text/css");
		assert_eq!(resource.bytes, b"body { margin: 0 }");
	}

	#[test]
	fn resolves_path_form() {
		let resolver = ResourceResolver::new(BuildMode::Release, bundle());
		let resource = resolver.resolve_address("local:///index.html").unwrap();

		assert_eq!(resource.base, "index");
		assert_eq!(resource.extension.as_deref(), Some("html"));
		assert_eq!(resource.mime_type, "text/html");
	}

	#[test]
	fn empty_path_serves_index_document() {
		let resolver = ResourceResolver::new(BuildMode::Release, bundle());
		let resource = resolver.resolve_address("local:///").unwrap();

		assert_eq!(resource.file_name, DEFAULT_INDEX_DOCUMENT);
		assert!(!resource.is_empty());
	}

	#[test]
	fn uppercase_extension_maps_mime() {
		let resolver = ResourceResolver::new(BuildMode::Release, bundle());
		let resource = resolver.resolve_address("local://logo.PNG").unwrap();

		assert_eq!(resource.mime_type, "image/png");
		assert_eq!(resource.len(), 4);
	}

	#[test]
	fn missing_file_reports_original_name() {
		let resolver = ResourceResolver::new(BuildMode::Release, bundle());
		let err = resolver.resolve_address("local:///assets/missing.js").unwrap_err();

		match err {
			Error::ResourceNotFound { filename } => assert_eq!(filename, "missing.js"),
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[test]
	fn serves_escaped_file_names() {
		let assets = MemoryAssets::new().with_file("my file.css", "p {}").with_file("图片.png", vec![1u8, 2, 3]);
		let resolver = ResourceResolver::new(BuildMode::Release, Arc::new(assets));

		let css = resolver.resolve_address("local:///my%20file.css").unwrap();
		assert_eq!(css.file_name, "my file.css");
		assert_eq!(css.mime_type, "text/css");

		assert_eq!(resolver.resolve_address("local://my%20file.css").unwrap().len(), 4);

		let image = resolver.resolve_address("local:///图片.png").unwrap();
		assert_eq!(image.base, "图片");
		assert_eq!(image.mime_type, "image/png");
		assert_eq!(image.len(), 3);
	}

	#[test]
	fn other_scheme_is_not_served() {
		let resolver = ResourceResolver::new(BuildMode::Release, bundle());
		let err = resolver.resolve_address("https://style.css").unwrap_err();
		assert!(err.is_not_found());
	}

	#[test]
	fn debug_redirects_only_reserved_address() {
		let resolver = ResourceResolver::new(BuildMode::Debug, bundle());

		assert_eq!(resolver.resolve_base_address("local://index.html"), DEFAULT_DEV_ADDRESS);
		assert_eq!(resolver.resolve_base_address("local://other.html"), "local://other.html");
		assert_eq!(resolver.resolve_base_address("https://example.com"), "https://example.com");
	}

	#[test]
	fn release_passes_everything_through() {
		let resolver = ResourceResolver::new(BuildMode::Release, bundle());

		for address in ["local://index.html", "local://other.html", "https://example.com"] {
			assert_eq!(resolver.resolve_base_address(address), address);
			assert!(!resolver.redirects(address));
		}
	}

	#[test]
	fn custom_dev_address() {
		let resolver = ResourceResolver::new(BuildMode::Debug, bundle()).with_dev_address("http://127.0.0.1:5173");
		assert_eq!(resolver.resolve_base_address(RESERVED_INDEX_ADDRESS), "http://127.0.0.1:5173");
	}

	#[tokio::test]
	async fn purge_requires_debug() {
		let engine = HeadlessWebEngine::new();

		let release = ResourceResolver::new(BuildMode::Release, bundle());
		assert!(matches!(release.purge_cache(&engine).await, Err(Error::Unsupported(_))));
		assert_eq!(engine.log().purges(), 0);

		let debug = ResourceResolver::new(BuildMode::Debug, bundle());
		debug.purge_cache(&engine).await.unwrap();
		assert_eq!(engine.log().purges(), 1);
	}
}
