//! File-backed [`ExpiringCache`] that survives process restarts.

// std
use std::{
	fs::{self, File},
	io::{ErrorKind, Write},
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	cache::{CacheError, CacheFuture, ExpiringCache},
};

/// Persists the cached record as one JSON document, overwriting the whole file on each write.
#[derive(Clone, Debug)]
pub struct FileCache {
	path: PathBuf,
}
impl FileCache {
	/// Creates a cache bound to `path`; nothing is touched on disk until the first write.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// Creates the conventional per-credential cache file (`ezviz_<app_key>.auth_file`) inside
	/// `dir`.
	pub fn for_app_key(dir: impl AsRef<Path>, app_key: &str) -> Self {
		Self::new(dir.as_ref().join(Self::file_name(app_key)))
	}

	/// File name used for an application key.
	pub fn file_name(app_key: &str) -> String {
		format!("ezviz_{app_key}.auth_file")
	}

	/// Path of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Removes the backing file, if present.
	pub fn clear(&self) -> Result<(), CacheError> {
		match fs::remove_file(&self.path) {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
			Err(e) => Err(CacheError::Backend {
				message: format!("Failed to remove {}: {e}", self.path.display()),
			}),
		}
	}

	fn read_now(&self) -> Result<Vec<u8>, CacheError> {
		let bytes = match fs::read(&self.path) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == ErrorKind::NotFound => return Err(CacheError::NotFound),
			Err(e) =>
				return Err(CacheError::Backend {
					message: format!("Failed to read {}: {e}", self.path.display()),
				}),
		};

		if bytes.is_empty() {
			return Err(CacheError::NotFound);
		}

		Ok(bytes)
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), CacheError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| CacheError::Backend {
				message: format!("Failed to create cache directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn write_now(&self, bytes: &[u8]) -> Result<(), CacheError> {
		Self::ensure_parent_exists(&self.path)?;

		let mut tmp_path = self.path.clone().into_os_string();

		tmp_path.push(".tmp");

		let tmp_path = PathBuf::from(tmp_path);

		{
			let mut file = File::create(&tmp_path).map_err(|e| CacheError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(bytes).map_err(|e| CacheError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| CacheError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| CacheError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl ExpiringCache for FileCache {
	fn store(&self, bytes: Vec<u8>) -> CacheFuture<'_, ()> {
		Box::pin(async move { self.write_now(&bytes) })
	}

	fn load(&self) -> CacheFuture<'_, Vec<u8>> {
		Box::pin(async move { self.read_now() })
	}
}
