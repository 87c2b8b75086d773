// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::{
	error::Result,
	header::FileIntegrity,
	integrity::validate_integrity,
	io::{release_temp_file, ReadAt},
};
use std::{
	fs,
	path::{Path, PathBuf},
};

/// A uniquely named file on disk that is deleted again when dropped.
///
/// Used to hand files stored inside an archive to code that needs a real
/// filesystem path, such as a native module loader.
#[derive(Debug, Default)]
pub struct ScopedTemporaryFile {
	path: Option<PathBuf>,
	dir: Option<PathBuf>,
}

impl ScopedTemporaryFile {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates files inside `dir` instead of the system temporary directory.
	pub fn new_in(dir: impl Into<PathBuf>) -> Self {
		Self {
			path: None,
			dir: Some(dir.into()),
		}
	}

	/// Creates the file, keeping `extension` (such as `".node"`) at the end
	/// of its name. Does nothing if the file already exists.
	pub fn init(&mut self, extension: &str) -> Result<&Path> {
		if self.path.is_none() {
			let mut builder = tempfile::Builder::new();
			builder.prefix(".asar").suffix(extension);
			let file = match &self.dir {
				Some(dir) => builder.tempfile_in(dir)?,
				None => builder.tempfile()?,
			};
			// Deletion is handled by `Drop`, which knows about files that are
			// still in use.
			let path = file.into_temp_path().keep().map_err(|err| err.error)?;
			self.path = Some(path);
		}
		Ok(self.path())
	}

	/// Creates the file and fills it with the `size` bytes at `offset` in
	/// `source`. With `integrity`, the bytes are verified before anything is
	/// written.
	pub fn init_from_file<R: ReadAt + ?Sized>(
		&mut self,
		source: &R,
		extension: &str,
		offset: u64,
		size: u32,
		integrity: Option<(&Path, &FileIntegrity)>,
	) -> Result<&Path> {
		self.init(extension)?;

		let mut buf = vec![0_u8; size as usize];
		source.read_exact_at(&mut buf, offset)?;
		if let Some((name, integrity)) = integrity {
			validate_integrity(name, &buf, integrity)?;
		}

		fs::write(self.path(), &buf)?;
		Ok(self.path())
	}

	/// Path of the file, or an empty path before [`init`](Self::init).
	pub fn path(&self) -> &Path {
		self.path.as_deref().unwrap_or_else(|| Path::new(""))
	}
}

impl Drop for ScopedTemporaryFile {
	fn drop(&mut self) {
		if let Some(path) = self.path.take() {
			release_temp_file(&path);
		}
	}
}

#[cfg(test)]
mod test {
	use super::ScopedTemporaryFile;
	use crate::{error::Error, test_util::integrity_for};
	use std::{fs, path::Path};

	#[test]
	pub fn test_init_is_idempotent() {
		let dir = tempfile::tempdir().expect("failed to create temp dir");
		let mut file = ScopedTemporaryFile::new_in(dir.path());
		let first = file.init(".node").expect("failed to init").to_path_buf();
		let second = file.init(".js").expect("failed to init").to_path_buf();
		assert_eq!(first, second);
		assert_eq!(first.extension().and_then(|ext| ext.to_str()), Some("node"));
		assert!(first.starts_with(dir.path()));
		assert!(first.is_file());
		drop(file);
		assert!(!first.exists());
	}

	#[test]
	pub fn test_init_from_file() {
		let dir = tempfile::tempdir().expect("failed to create temp dir");
		let source = b"....payload....".to_vec();
		let mut file = ScopedTemporaryFile::new_in(dir.path());
		let path = file
			.init_from_file(&source, ".txt", 4, 7, None)
			.expect("failed to copy")
			.to_path_buf();
		assert_eq!(fs::read(&path).expect("failed to read"), b"payload");
	}

	#[test]
	pub fn test_init_from_file_checks_integrity() {
		let dir = tempfile::tempdir().expect("failed to create temp dir");
		let source = b"....payload....".to_vec();
		let integrity = integrity_for(b"payload", 4);

		let mut file = ScopedTemporaryFile::new_in(dir.path());
		file.init_from_file(&source, "", 4, 7, Some((Path::new("p"), &integrity)))
			.expect("valid payload rejected");

		let mut file = ScopedTemporaryFile::new_in(dir.path());
		let err = file
			.init_from_file(&source, "", 3, 7, Some((Path::new("p"), &integrity)))
			.expect_err("shifted payload accepted");
		assert!(matches!(err, Error::HashMismatch { .. }));
		assert_eq!(fs::read(file.path()).expect("failed to read"), b"");
	}

	#[test]
	pub fn test_short_source() {
		let mut file = ScopedTemporaryFile::new();
		let err = file
			.init_from_file(&b"abc".to_vec(), "", 1, 5, None)
			.expect_err("short read accepted");
		assert!(matches!(err, Error::Io(_)));
	}
}
