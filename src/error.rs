// SPDX-License-Identifier: Apache-2.0 OR MIT
use serde::de::Error as DeError;
use serde_json::Error as JsonError;
use std::{io::Error as IoError, path::PathBuf};
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
	#[error("I/O error: {0}")]
	Io(#[from] IoError),
	#[error("JSON error: {0}")]
	Json(#[from] JsonError),
	#[error("Archive is truncated")]
	Truncated,
	#[error("Malformed pickle envelope")]
	InvalidPickle,
	#[error("Invalid archive header: {0}")]
	InvalidHeader(String),
	#[error("Archive has not been initialized")]
	NotInitialized,
	#[error("No such file or directory in archive: {}", .0.display())]
	NotFound(PathBuf),
	#[error("Not a directory: {}", .0.display())]
	NotADirectory(PathBuf),
	#[error("Is a directory: {}", .0.display())]
	IsADirectory(PathBuf),
	#[error("Too many levels of symbolic links: {}", .0.display())]
	SymlinkLoop(PathBuf),
	#[error(
		"File {} lies outside of the archive (offset={offset}, size={size}, length={length})",
		path.display()
	)]
	OutOfBounds {
		path: PathBuf,
		offset: u64,
		size: u64,
		length: u64,
	},
	#[error(
		"Integrity check failed for {}{}: expected {expected}, got {actual}",
		file.display(),
		block.map(|block| format!(" (block {block})")).unwrap_or_default()
	)]
	HashMismatch {
		file: PathBuf,
		block: Option<usize>,
		expected: String,
		actual: String,
	},
	#[error("Unsupported integrity hashing algorithm")]
	UnsupportedAlgorithm,
	#[error("No integrity information for {}", .0.display())]
	MissingIntegrity(PathBuf),
	#[error("Path is not inside an asar archive")]
	NotAnArchivePath,
	#[error("File contents are not valid UTF-8")]
	Utf8,
}

impl Error {
	/// Whether this error means the archive contents may have been tampered
	/// with. These must never be treated like a plain "not found".
	pub const fn is_integrity_failure(&self) -> bool {
		matches!(
			self,
			Self::HashMismatch { .. } | Self::UnsupportedAlgorithm | Self::MissingIntegrity(_)
		)
	}

	/// Whether the lookup failed because the entry does not exist or has the
	/// wrong kind.
	pub const fn is_not_found(&self) -> bool {
		matches!(
			self,
			Self::NotFound(_) | Self::NotADirectory(_) | Self::IsADirectory(_) | Self::NotAnArchivePath
		)
	}
}

impl Clone for Error {
	fn clone(&self) -> Self {
		match self {
			Self::Io(io_err) => Self::Io(IoError::new(io_err.kind(), io_err.to_string())),
			Self::Json(json_err) => Self::Json(JsonError::custom(json_err.to_string())),
			Self::Truncated => Self::Truncated,
			Self::InvalidPickle => Self::InvalidPickle,
			Self::InvalidHeader(reason) => Self::InvalidHeader(reason.clone()),
			Self::NotInitialized => Self::NotInitialized,
			Self::NotFound(path) => Self::NotFound(path.clone()),
			Self::NotADirectory(path) => Self::NotADirectory(path.clone()),
			Self::IsADirectory(path) => Self::IsADirectory(path.clone()),
			Self::SymlinkLoop(path) => Self::SymlinkLoop(path.clone()),
			Self::OutOfBounds {
				path,
				offset,
				size,
				length,
			} => Self::OutOfBounds {
				path: path.clone(),
				offset: *offset,
				size: *size,
				length: *length,
			},
			Self::HashMismatch {
				file,
				block,
				expected,
				actual,
			} => Self::HashMismatch {
				file: file.clone(),
				block: *block,
				expected: expected.clone(),
				actual: actual.clone(),
			},
			Self::UnsupportedAlgorithm => Self::UnsupportedAlgorithm,
			Self::MissingIntegrity(path) => Self::MissingIntegrity(path.clone()),
			Self::NotAnArchivePath => Self::NotAnArchivePath,
			Self::Utf8 => Self::Utf8,
		}
	}
}

impl PartialEq for Error {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Io(io_err), Self::Io(other_io_err)) => {
				io_err.kind() == other_io_err.kind()
					&& io_err.raw_os_error() == other_io_err.raw_os_error()
					&& io_err.to_string() == other_io_err.to_string()
			}
			(Self::Json(json_err), Self::Json(other_json_err)) => {
				json_err.line() == other_json_err.line()
					&& json_err.column() == other_json_err.column()
					&& json_err.classify() == other_json_err.classify()
					&& json_err.to_string() == other_json_err.to_string()
			}
			(Self::Truncated, Self::Truncated)
			| (Self::InvalidPickle, Self::InvalidPickle)
			| (Self::NotInitialized, Self::NotInitialized)
			| (Self::UnsupportedAlgorithm, Self::UnsupportedAlgorithm)
			| (Self::NotAnArchivePath, Self::NotAnArchivePath)
			| (Self::Utf8, Self::Utf8) => true,
			(Self::InvalidHeader(a), Self::InvalidHeader(b)) => a == b,
			(Self::NotFound(a), Self::NotFound(b))
			| (Self::NotADirectory(a), Self::NotADirectory(b))
			| (Self::IsADirectory(a), Self::IsADirectory(b))
			| (Self::SymlinkLoop(a), Self::SymlinkLoop(b))
			| (Self::MissingIntegrity(a), Self::MissingIntegrity(b)) => a == b,
			(
				Self::OutOfBounds {
					path,
					offset,
					size,
					length,
				},
				Self::OutOfBounds {
					path: other_path,
					offset: other_offset,
					size: other_size,
					length: other_length,
				},
			) => {
				path == other_path
					&& offset == other_offset
					&& size == other_size
					&& length == other_length
			}
			(
				Self::HashMismatch {
					file,
					block,
					expected,
					actual,
				},
				Self::HashMismatch {
					file: other_file,
					block: other_block,
					expected: other_expected,
					actual: other_actual,
				},
			) => {
				file == other_file
					&& block == other_block
					&& expected == other_expected
					&& actual == other_actual
			}
			_ => false,
		}
	}
}

pub type Result<T> = std::result::Result<T, Error>;
