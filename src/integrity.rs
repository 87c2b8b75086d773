// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::{
	error::{Error, Result},
	header::{FileIntegrity, HashAlgorithm},
	validator::IntegrityValidator,
};
use sha2::{digest::FixedOutputReset, Digest, Sha256};
use std::{cell::RefCell, path::Path};

thread_local! {
	pub static SHA256: RefCell<Sha256> = RefCell::new(Sha256::new());
}

impl HashAlgorithm {
	/// Hashes `data`, returning the lowercase hex digest.
	pub fn hash(&self, data: &[u8]) -> Result<String> {
		match self {
			Self::Sha256 => Ok(SHA256.with(|hasher| {
				let mut hasher = hasher.borrow_mut();
				hasher.update(data);
				hex::encode(hasher.finalize_fixed_reset())
			})),
			Self::None => Err(Error::UnsupportedAlgorithm),
		}
	}
}

/// Expected hash of an archive's raw header string, supplied by whoever
/// signed the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderIntegrity {
	pub algorithm: HashAlgorithm,
	pub hash: String,
}

impl HeaderIntegrity {
	pub fn sha256(hash: impl Into<String>) -> Self {
		Self {
			algorithm: HashAlgorithm::Sha256,
			hash: hash.into(),
		}
	}

	/// Checks the header string against the expected hash.
	pub fn validate(&self, archive: &Path, header: &str) -> Result<()> {
		let actual = self.algorithm.hash(header.as_bytes())?;
		if actual != self.hash {
			tracing::error!(
				archive = %archive.display(),
				expected = %self.hash,
				%actual,
				"integrity check failed for asar archive header"
			);
			return Err(Error::HashMismatch {
				file: archive.to_path_buf(),
				block: None,
				expected: self.hash.clone(),
				actual,
			});
		}
		Ok(())
	}
}

/// Checks a fully buffered file against its integrity metadata: every block
/// hash first, then the whole-file hash.
///
/// A mismatch means the archive was corrupted or tampered with, and the
/// returned error must fail the read outright.
pub fn validate_integrity(file: &Path, data: &[u8], integrity: &FileIntegrity) -> Result<()> {
	let mut validator = IntegrityValidator::new(integrity.clone(), data, 0, data.len() as u64);
	validator.set_file_name(file);
	validator.on_read(data)?;
	validator.on_done()?;

	let actual = integrity.algorithm().hash(data)?;
	if actual != integrity.hash() {
		tracing::error!(
			file = %file.display(),
			expected = %integrity.hash(),
			%actual,
			"integrity check failed for file in asar archive"
		);
		return Err(Error::HashMismatch {
			file: file.to_path_buf(),
			block: None,
			expected: integrity.hash().to_string(),
			actual,
		});
	}
	Ok(())
}
