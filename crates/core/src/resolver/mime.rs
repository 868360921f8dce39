//! Extension → MIME type table for bundled resources.

/// Fallback for unknown or missing extensions.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Returns the MIME type served for `extension`.
///
/// Matching ignores ASCII case; anything not in the table is served as
/// [`OCTET_STREAM`].
pub fn mime_type_for(extension: Option<&str>) -> &'static str {
	let Some(ext) = extension else {
		return OCTET_STREAM;
	};

	match ext.to_ascii_lowercase().as_str() {
		"html" | "htm" => "text/html",
		"css" => "text/css",
		"js" => "application/javascript",
		"json" => "application/json",
		"png" => "image/png",
		"jpg" | "jpeg" => "image/jpeg",
		"gif" => "image/gif",
		"svg" => "image/svg+xml",
		"ico" => "image/x-icon",
		"txt" => "text/plain",
		"pdf" => "application/pdf",
		_ => OCTET_STREAM,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn table_entries() {
		let cases = [
			("html", "text/html"),
			("htm", "text/html"),
			("css", "text/css"),
			("js", "application/javascript"),
			("json", "application/json"),
			("png", "image/png"),
			("jpeg", "image/jpeg"),
			("svg", "image/svg+xml"),
			("ico", "image/x-icon"),
			("pdf", "application/pdf"),
		];
		for (ext, mime) in cases {
			assert_eq!(mime_type_for(Some(ext)), mime, "extension {ext}");
		}
	}

	#[test]
	fn case_insensitive() {
		assert_eq!(mime_type_for(Some("PNG")), "image/png");
		assert_eq!(mime_type_for(Some("Html")), "text/html");
	}

	#[test]
	fn unknown_falls_back() {
		assert_eq!(mime_type_for(Some("wasm")), OCTET_STREAM);
		assert_eq!(mime_type_for(None), OCTET_STREAM);
	}
}
