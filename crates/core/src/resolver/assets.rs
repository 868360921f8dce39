//! Bundled resource namespaces.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use tabhost_runtime::{Error, Result};

/// A flat namespace of bundled files addressed by `base.extension`.
pub trait AssetSource: Send + Sync {
	/// Reads the named file in full.
	///
	/// # Errors
	///
	/// Returns [`Error::ResourceNotFound`] when no file with that name exists.
	fn read(&self, name: &str) -> Result<Vec<u8>>;

	/// Human-readable location, used in logs.
	fn describe(&self) -> String;
}

/// Files under one directory on disk.
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
	root: PathBuf,
}

impl DirectoryAssets {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Maps `name` to a path inside the root, refusing anything that would
	/// escape it.
	fn path_for(&self, name: &str) -> Option<PathBuf> {
		let candidate = Path::new(name);
		let mut components = candidate.components();
		match (components.next(), components.next()) {
			(Some(Component::Normal(_)), None) => Some(self.root.join(candidate)),
			_ => None,
		}
	}
}

impl AssetSource for DirectoryAssets {
	fn read(&self, name: &str) -> Result<Vec<u8>> {
		let not_found = || Error::ResourceNotFound {
			filename: name.to_string(),
		};

		let path = self.path_for(name).ok_or_else(not_found)?;
		if !path.is_file() {
			return Err(not_found());
		}

		match std::fs::read(&path) {
			Ok(bytes) => Ok(bytes),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(not_found()),
			Err(err) => Err(Error::Io(err)),
		}
	}

	fn describe(&self) -> String {
		self.root.display().to_string()
	}
}

/// In-memory namespace, mostly for tests and embedded payloads.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
	files: HashMap<String, Vec<u8>>,
}

impl MemoryAssets {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_file(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
		self.insert(name, bytes);
		self
	}

	pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
		self.files.insert(name.into(), bytes.into());
	}
}

impl AssetSource for MemoryAssets {
	fn read(&self, name: &str) -> Result<Vec<u8>> {
		self.files.get(name).cloned().ok_or_else(|| Error::ResourceNotFound {
			filename: name.to_string(),
		})
	}

	fn describe(&self) -> String {
		format!("memory ({} files)", self.files.len())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn directory_reads_existing_file() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("app.js"), b"console.log(1)").unwrap();

		let assets = DirectoryAssets::new(dir.path());
		assert_eq!(assets.read("app.js").unwrap(), b"console.log(1)");
	}

	#[test]
	fn directory_missing_file_is_not_found() {
		let dir = tempfile::tempdir().unwrap();
		let assets = DirectoryAssets::new(dir.path());

		let err = assets.read("missing.css").unwrap_err();
		assert!(err.is_not_found());
	}

	#[test]
	fn directory_rejects_traversal() {
		let outer = tempfile::tempdir().unwrap();
		std::fs::write(outer.path().join("secret.txt"), b"x").unwrap();
		let inner = outer.path().join("Web");
		std::fs::create_dir(&inner).unwrap();

		let assets = DirectoryAssets::new(&inner);
		assert!(assets.read("../secret.txt").unwrap_err().is_not_found());
		assert!(assets.read("/etc/passwd").unwrap_err().is_not_found());
		assert!(assets.read("..").unwrap_err().is_not_found());
	}

	#[test]
	fn directory_subdirectory_is_not_a_file() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::create_dir(dir.path().join("img")).unwrap();

		let assets = DirectoryAssets::new(dir.path());
		assert!(assets.read("img").unwrap_err().is_not_found());
	}

	#[test]
	fn memory_assets_lookup() {
		let assets = MemoryAssets::new().with_file("index.html", "<html></html>");
		assert_eq!(assets.read("index.html").unwrap(), b"<html></html>");
		assert!(assets.read("other.html").unwrap_err().is_not_found());
	}
}
