// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::{archive::Archive, config::Config, error::Result};
use std::{
	collections::HashMap,
	path::{Path, PathBuf},
	sync::{Arc, Mutex, PoisonError},
};

/// Opened archives keyed by their path, shared by everyone that asks for
/// them.
///
/// Lookup and insertion happen under one lock, so concurrent first requests
/// for the same path initialize the archive exactly once. Failures are not
/// remembered: a later request retries, which matters when the file appears
/// after the first attempt.
#[derive(Debug, Default)]
pub struct ArchiveCache {
	archives: Mutex<HashMap<PathBuf, Arc<Archive>>>,
}

impl ArchiveCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the cached archive at `path`, opening it with `config` if it
	/// is not cached yet.
	pub fn get_or_create(&self, path: &Path, config: &Config) -> Result<Arc<Archive>> {
		self.get_or_create_with(path, |path| Archive::open_with(path, config.clone()))
	}

	/// Like [`get_or_create`](Self::get_or_create), with a custom way of
	/// opening archives that are not cached yet.
	pub fn get_or_create_with<F>(&self, path: &Path, open: F) -> Result<Arc<Archive>>
	where
		F: FnOnce(&Path) -> Result<Archive>,
	{
		let mut archives = self.lock();
		if let Some(archive) = archives.get(path) {
			return Ok(Arc::clone(archive));
		}
		let archive = match open(path) {
			Ok(archive) => Arc::new(archive),
			Err(err) => {
				tracing::debug!(path = %path.display(), %err, "failed to open asar archive");
				return Err(err);
			}
		};
		archives.insert(path.to_path_buf(), Arc::clone(&archive));
		tracing::debug!(path = %path.display(), "cached asar archive");
		Ok(archive)
	}

	/// The cached archive at `path`, without opening anything.
	pub fn get(&self, path: &Path) -> Option<Arc<Archive>> {
		self.lock().get(path).cloned()
	}

	/// Drops the cache's reference to the archive at `path`.
	pub fn remove(&self, path: &Path) -> Option<Arc<Archive>> {
		self.lock().remove(path)
	}

	/// Drops every cached archive. Archives still held elsewhere stay usable
	/// until their last holder lets go.
	pub fn clear(&self) {
		self.lock().clear();
	}

	pub fn len(&self) -> usize {
		self.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.lock().is_empty()
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Arc<Archive>>> {
		self.archives.lock().unwrap_or_else(PoisonError::into_inner)
	}
}
