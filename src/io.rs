// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Positional reads and temporary file cleanup, which differ per platform.
use std::{
	fs::File,
	io::{Error as IoError, ErrorKind, Result as IoResult},
	path::Path,
	sync::Arc,
};

/// A source that can be read at arbitrary offsets without a shared cursor,
/// so several threads may read from it at once.
pub trait ReadAt {
	/// Fills `buf` with the bytes starting at `offset`, failing on a short
	/// read.
	fn read_exact_at(&self, buf: &mut [u8], offset: u64) -> IoResult<()>;
}

#[cfg(unix)]
impl ReadAt for File {
	fn read_exact_at(&self, buf: &mut [u8], offset: u64) -> IoResult<()> {
		std::os::unix::fs::FileExt::read_exact_at(self, buf, offset)
	}
}

#[cfg(windows)]
impl ReadAt for File {
	fn read_exact_at(&self, mut buf: &mut [u8], mut offset: u64) -> IoResult<()> {
		use std::os::windows::fs::FileExt;
		while !buf.is_empty() {
			match self.seek_read(buf, offset) {
				Ok(0) => break,
				Ok(n) => {
					buf = &mut buf[n..];
					offset += n as u64;
				}
				Err(err) if err.kind() == ErrorKind::Interrupted => {}
				Err(err) => return Err(err),
			}
		}
		if buf.is_empty() {
			Ok(())
		} else {
			Err(IoError::new(
				ErrorKind::UnexpectedEof,
				"failed to fill whole buffer",
			))
		}
	}
}

impl ReadAt for [u8] {
	fn read_exact_at(&self, buf: &mut [u8], offset: u64) -> IoResult<()> {
		let start = usize::try_from(offset).map_err(|_| eof())?;
		let end = start.checked_add(buf.len()).ok_or_else(eof)?;
		let src = self.get(start..end).ok_or_else(eof)?;
		buf.copy_from_slice(src);
		Ok(())
	}
}

impl ReadAt for Vec<u8> {
	fn read_exact_at(&self, buf: &mut [u8], offset: u64) -> IoResult<()> {
		self.as_slice().read_exact_at(buf, offset)
	}
}

impl<T: ReadAt + ?Sized> ReadAt for &T {
	fn read_exact_at(&self, buf: &mut [u8], offset: u64) -> IoResult<()> {
		(**self).read_exact_at(buf, offset)
	}
}

impl<T: ReadAt + ?Sized> ReadAt for Arc<T> {
	fn read_exact_at(&self, buf: &mut [u8], offset: u64) -> IoResult<()> {
		(**self).read_exact_at(buf, offset)
	}
}

fn eof() -> IoError {
	IoError::new(ErrorKind::UnexpectedEof, "read past the end of the source")
}

/// Deletes a temporary file that may still be in use.
#[cfg(not(windows))]
pub(crate) fn release_temp_file(path: &Path) {
	match std::fs::remove_file(path) {
		Ok(()) => {}
		Err(err) if err.kind() == ErrorKind::NotFound => {}
		Err(err) => tracing::warn!(path = %path.display(), %err, "failed to delete temporary file"),
	}
}

/// Deletes a temporary file that may still be in use.
///
/// A file that is mapped or executing cannot be deleted on Windows; it is
/// left for the system's temporary directory cleanup instead of blocking or
/// failing the caller. Scheduling the delete for the next reboot would take
/// an FFI call, which this crate does not make (see "Deferred deletion" in
/// DESIGN.md).
#[cfg(windows)]
pub(crate) fn release_temp_file(path: &Path) {
	match std::fs::remove_file(path) {
		Ok(()) => {}
		Err(err) if err.kind() == ErrorKind::NotFound => {}
		Err(err) => tracing::debug!(
			path = %path.display(),
			%err,
			"temporary file is still in use, leaving it for later cleanup"
		),
	}
}
