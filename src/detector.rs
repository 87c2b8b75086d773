// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::{
	collections::HashMap,
	fs,
	path::{Path, PathBuf},
	sync::{Mutex, PoisonError},
};

/// A filesystem path split into the archive that contains it and the path
/// inside that archive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArchivePath {
	pub archive: PathBuf,
	pub relative: PathBuf,
}

/// Tells paths inside archives apart from ordinary paths.
///
/// A path component is an archive when its name has the archive extension
/// and it is not a directory on disk. Whether a path is a directory is
/// remembered for the lifetime of the detector.
#[derive(Debug)]
pub struct PathDetector {
	extension: String,
	directories: Mutex<HashMap<PathBuf, bool>>,
}

impl PathDetector {
	/// `extension` is given without the leading dot, e.g. `"asar"`.
	pub fn new(extension: impl Into<String>) -> Self {
		Self {
			extension: extension.into(),
			directories: Mutex::new(HashMap::new()),
		}
	}

	/// Finds the closest ancestor of `full_path` (including itself) that is
	/// an archive.
	///
	/// With `allow_root`, `full_path` may be the archive itself and the
	/// relative path is then empty; otherwise that case is not an archive
	/// path.
	pub fn split_archive_path(&self, full_path: &Path, allow_root: bool) -> Option<ArchivePath> {
		let archive = full_path
			.ancestors()
			.find(|ancestor| self.has_extension(ancestor) && !self.is_directory_cached(ancestor))?;
		if archive == full_path && !allow_root {
			return None;
		}
		let relative = full_path.strip_prefix(archive).ok()?;
		Some(ArchivePath {
			archive: archive.to_path_buf(),
			relative: relative.to_path_buf(),
		})
	}

	/// Whether `path` points inside an archive.
	pub fn is_archive_path(&self, path: &Path) -> bool {
		self.split_archive_path(path, false).is_some()
	}

	/// Whether `path` is an existing directory, asking the filesystem only
	/// the first time.
	pub fn is_directory_cached(&self, path: &Path) -> bool {
		let mut directories = self
			.directories
			.lock()
			.unwrap_or_else(PoisonError::into_inner);
		*directories
			.entry(path.to_path_buf())
			.or_insert_with(|| fs::metadata(path).map(|meta| meta.is_dir()).unwrap_or(false))
	}

	/// Forgets every cached directory lookup.
	pub fn clear(&self) {
		self.directories
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.clear();
	}

	fn has_extension(&self, path: &Path) -> bool {
		path.extension()
			.and_then(|ext| ext.to_str())
			.map_or(false, |ext| ext.eq_ignore_ascii_case(&self.extension))
	}
}

impl Default for PathDetector {
	fn default() -> Self {
		Self::new("asar")
	}
}
