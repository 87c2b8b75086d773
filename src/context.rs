// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::{
	archive::Archive,
	cache::ArchiveCache,
	config::Config,
	detector::{ArchivePath, PathDetector},
	error::{Error, Result},
	integrity::validate_integrity,
	io::ReadAt,
};
use std::{fs, path::Path, sync::Arc};

/// Everything needed to serve reads of paths that may point into archives:
/// the archive cache, the directory lookup cache, and the settings they
/// share.
///
/// Create one per process (or per embedding) and hand it to whoever loads
/// files; [`clear`](Self::clear) it on shutdown.
///
/// ```rust,no_run
/// use asar_archive::{AsarContext, Result};
/// use std::path::Path;
///
/// fn main() -> Result<()> {
/// 	let context = AsarContext::default();
/// 	let index = context.read_file_to_string(Path::new("/opt/app/resources/app.asar/index.html"))?;
/// 	println!("{index}");
/// 	Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct AsarContext {
	config: Config,
	cache: ArchiveCache,
	detector: PathDetector,
}

impl AsarContext {
	pub fn new(config: Config) -> Self {
		Self {
			detector: PathDetector::new(config.extension.clone()),
			cache: ArchiveCache::new(),
			config,
		}
	}

	#[inline]
	pub const fn config(&self) -> &Config {
		&self.config
	}

	#[inline]
	pub const fn cache(&self) -> &ArchiveCache {
		&self.cache
	}

	#[inline]
	pub const fn detector(&self) -> &PathDetector {
		&self.detector
	}

	/// See [`PathDetector::split_archive_path`].
	pub fn split_archive_path(&self, path: &Path, allow_root: bool) -> Option<ArchivePath> {
		self.detector.split_archive_path(path, allow_root)
	}

	pub fn is_archive_path(&self, path: &Path) -> bool {
		self.detector.is_archive_path(path)
	}

	/// The shared, initialized archive stored at `archive_path`.
	pub fn archive(&self, archive_path: &Path) -> Result<Arc<Archive>> {
		self.cache.get_or_create(archive_path, &self.config)
	}

	/// Reads a file that may live inside an archive. Paths outside of any
	/// archive are read from disk as usual.
	pub fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
		let ArchivePath { archive, relative } = match self.split_archive_path(path, false) {
			Some(split) => split,
			None => return Ok(fs::read(path)?),
		};
		let archive = self.archive(&archive)?;
		let info = archive.file_info(&relative)?;

		let data = if info.unpacked {
			fs::read(archive.copy_file_out(&relative)?)?
		} else {
			let mut buf = vec![0_u8; info.size as usize];
			archive.file()?.read_exact_at(&mut buf, info.offset)?;
			buf
		};
		if let Some(integrity) = &info.integrity {
			validate_integrity(&relative, &data, integrity)?;
		}
		Ok(data)
	}

	/// Like [`read_file`](Self::read_file), for UTF-8 text.
	pub fn read_file_to_string(&self, path: &Path) -> Result<String> {
		String::from_utf8(self.read_file(path)?).map_err(|_| Error::Utf8)
	}

	/// Drops every cached archive and directory lookup.
	pub fn clear(&self) {
		self.cache.clear();
		self.detector.clear();
	}
}

impl Default for AsarContext {
	fn default() -> Self {
		Self::new(Config::default())
	}
}

#[cfg(test)]
mod test {
	use super::AsarContext;
	use crate::{config::Config, error::Error, test_util::ArchiveBuilder};
	use std::{fs, path::PathBuf};

	#[test]
	pub fn test_read_file() {
		let dir = tempfile::tempdir().expect("failed to create temp dir");
		let archive = ArchiveBuilder::new()
			.file("index.html", b"<h1>hi</h1>")
			.file("bin/blob", &[0xff, 0xfe, 0x00])
			.unpacked("native/addon.node", b"native bytes")
			.write(dir.path(), "app.asar");
		let plain = dir.path().join("plain.txt");
		fs::write(&plain, b"plain").expect("failed to write file");
		let context = AsarContext::default();

		assert_eq!(
			context
				.read_file_to_string(&archive.join("index.html"))
				.expect("failed to read"),
			"<h1>hi</h1>"
		);
		assert_eq!(
			context
				.read_file(&archive.join("native/addon.node"))
				.expect("failed to read"),
			b"native bytes"
		);
		assert_eq!(
			context.read_file_to_string(&plain).expect("failed to read"),
			"plain"
		);
		assert_eq!(
			context.read_file_to_string(&archive.join("bin/blob")),
			Err(Error::Utf8)
		);
		assert_eq!(
			context.read_file(&archive.join("missing.js")),
			Err(Error::NotFound(PathBuf::from("missing.js")))
		);
		assert!(context.read_file(&dir.path().join("nope.txt")).is_err());
		assert_eq!(context.cache().len(), 1);

		context.clear();
		assert!(context.cache().is_empty());
	}

	#[test]
	pub fn test_custom_extension() {
		let dir = tempfile::tempdir().expect("failed to create temp dir");
		let archive = ArchiveBuilder::new()
			.file("a.txt", b"hello")
			.write(dir.path(), "bundle.pak");
		let context = AsarContext::new(Config {
			extension: "pak".to_string(),
			..Config::default()
		});
		assert!(context.is_archive_path(&archive.join("a.txt")));
		assert_eq!(
			context.read_file(&archive.join("a.txt")).expect("failed to read"),
			b"hello"
		);
		assert!(!AsarContext::default().is_archive_path(&archive.join("a.txt")));
	}

	#[test]
	pub fn test_malformed_archive_reads_as_missing() {
		let dir = tempfile::tempdir().expect("failed to create temp dir");
		let archive = dir.path().join("broken.asar");
		fs::write(&archive, b"garbage!garbage!").expect("failed to write archive");
		let context = AsarContext::default();
		assert!(context.read_file(&archive.join("a.txt")).is_err());
		assert!(context.cache().is_empty());
	}
}
