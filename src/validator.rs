// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::{
	error::{Error, Result},
	header::FileIntegrity,
	io::ReadAt,
};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Where an [`IntegrityValidator`] is in its stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ValidatorState {
	/// No bytes of the current block have been seen yet.
	AwaitingBlock,
	/// Part of the current block has been hashed.
	ValidatingBlock,
	/// The stream ended and every block matched.
	Finished,
	/// A block did not match. Terminal: all further calls fail.
	Failed,
}

/// Checks the per-block hashes of a file while it is being streamed, without
/// buffering more than one block.
///
/// Bytes must be fed in stream order through [`on_read`](Self::on_read),
/// followed by a single [`on_done`](Self::on_done). If the consumer stops
/// reading before the end of the requested range, `on_done` reads the rest
/// straight from `source` so that the whole range is still covered.
///
/// A mismatch is not recoverable. The validator latches into
/// [`ValidatorState::Failed`] and the caller must abort the read without
/// handing out any more bytes.
#[derive(Debug)]
pub struct IntegrityValidator<R> {
	integrity: FileIntegrity,
	source: R,
	file: PathBuf,
	hasher: Option<Sha256>,
	current_block: usize,
	current_hash_byte_count: u64,
	total_hash_byte_count: u64,
	read_start: u64,
	extra_read: u64,
	read_max: u64,
	done_reading: bool,
	failure: Option<Error>,
}

impl<R: ReadAt> IntegrityValidator<R> {
	/// Creates a validator for the `size` bytes at `offset` in `source`.
	pub fn new(integrity: FileIntegrity, source: R, offset: u64, size: u64) -> Self {
		Self {
			integrity,
			source,
			file: PathBuf::new(),
			hasher: None,
			current_block: 0,
			current_hash_byte_count: 0,
			total_hash_byte_count: 0,
			read_start: offset,
			extra_read: 0,
			read_max: offset.saturating_add(size),
			done_reading: false,
			failure: None,
		}
	}

	/// Names the file in log messages and errors.
	pub fn set_file_name(&mut self, file: &Path) {
		self.file = file.to_path_buf();
	}

	/// Narrows validation to the byte range `[read_start, read_max)` of the
	/// source. `extra_read` is how many bytes before `read_start` the stream
	/// will also deliver, so that hashing can begin on a block boundary.
	pub fn set_range(&mut self, read_start: u64, extra_read: u64, read_max: u64) {
		self.read_start = read_start;
		self.extra_read = extra_read;
		self.read_max = read_max;
	}

	/// Index of the block the first streamed byte belongs to.
	pub fn set_current_block(&mut self, block: usize) {
		self.current_block = block;
	}

	pub fn state(&self) -> ValidatorState {
		if self.failure.is_some() {
			ValidatorState::Failed
		} else if self.done_reading {
			ValidatorState::Finished
		} else if self.current_hash_byte_count == 0 {
			ValidatorState::AwaitingBlock
		} else {
			ValidatorState::ValidatingBlock
		}
	}

	/// Total bytes hashed so far, including any read back from the source.
	#[inline]
	pub const fn bytes_hashed(&self) -> u64 {
		self.total_hash_byte_count
	}

	/// Feeds the next chunk of the stream.
	pub fn on_read(&mut self, mut data: &[u8]) -> Result<()> {
		self.check_not_failed()?;
		debug_assert!(!self.done_reading, "on_read called after on_done");
		let block_size = u64::from(self.integrity.block_size());
		if block_size == 0 {
			return self.fail(None);
		}
		while !data.is_empty() {
			let block_left = block_size - self.current_hash_byte_count;
			let len = data.len().min(block_left as usize);
			let (chunk, rest) = data.split_at(len);
			self.hasher.get_or_insert_with(Sha256::new).update(chunk);
			self.current_hash_byte_count += len as u64;
			self.total_hash_byte_count += len as u64;
			data = rest;
			if self.current_hash_byte_count == block_size {
				self.finish_block()?;
			}
		}
		Ok(())
	}

	/// Marks the end of the stream and checks the trailing block.
	pub fn on_done(&mut self) -> Result<()> {
		self.check_not_failed()?;
		self.done_reading = true;
		self.finish_block()?;
		while self.total_hash_byte_count < self.covered_len()
			&& self.current_block < self.integrity.blocks().len()
		{
			self.finish_block()?;
		}
		if self.total_hash_byte_count < self.covered_len() {
			return self.fail(None);
		}
		Ok(())
	}

	fn finish_block(&mut self) -> Result<()> {
		if self.current_hash_byte_count == 0
			&& (!self.done_reading || self.current_block >= self.integrity.blocks().len())
		{
			return Ok(());
		}

		// A block that never saw any bytes still has the hash of empty input.
		let mut hasher = self.hasher.take().unwrap_or_else(Sha256::new);

		let covered_len = self.covered_len();
		if self.done_reading && self.total_hash_byte_count < covered_len {
			let block_left = u64::from(self.integrity.block_size()) - self.current_hash_byte_count;
			let needed = block_left.min(covered_len - self.total_hash_byte_count);
			let offset = self.covered_start() + self.total_hash_byte_count;
			let mut buf = vec![0_u8; needed as usize];
			if let Err(err) = self.source.read_exact_at(&mut buf, offset) {
				tracing::error!(
					file = %self.file.display(),
					%err,
					"failed to read the unread remainder of a streamed asar file"
				);
				let err = Error::Io(err);
				self.failure = Some(err.clone());
				return Err(err);
			}
			hasher.update(&buf);
			self.current_hash_byte_count += needed;
			self.total_hash_byte_count += needed;
		}

		let actual = hex::encode(hasher.finalize());
		match self.integrity.blocks().get(self.current_block) {
			Some(expected) if *expected == actual => {
				self.current_block += 1;
				self.current_hash_byte_count = 0;
				Ok(())
			}
			_ => self.fail(Some(actual)),
		}
	}

	fn fail(&mut self, actual: Option<String>) -> Result<()> {
		let expected = self
			.integrity
			.blocks()
			.get(self.current_block)
			.cloned()
			.unwrap_or_default();
		let actual = actual.unwrap_or_default();
		tracing::error!(
			file = %self.file.display(),
			block = self.current_block,
			%expected,
			%actual,
			"failed to validate block while streaming asar file"
		);
		let err = Error::HashMismatch {
			file: self.file.clone(),
			block: Some(self.current_block),
			expected,
			actual,
		};
		self.failure = Some(err.clone());
		Err(err)
	}

	fn check_not_failed(&self) -> Result<()> {
		match &self.failure {
			Some(err) => Err(err.clone()),
			None => Ok(()),
		}
	}

	const fn covered_start(&self) -> u64 {
		self.read_start.saturating_sub(self.extra_read)
	}

	const fn covered_len(&self) -> u64 {
		self.read_max.saturating_sub(self.covered_start())
	}
}

#[cfg(test)]
mod test {
	use super::{IntegrityValidator, ValidatorState};
	use crate::{error::Error, test_util::integrity_for};

	#[test]
	pub fn test_streams_blocks() {
		let data = b"0123456789abcdefXYZ".to_vec();
		let integrity = integrity_for(&data, 4);
		let mut validator = IntegrityValidator::new(integrity, &data, 0, data.len() as u64);
		assert_eq!(validator.state(), ValidatorState::AwaitingBlock);
		validator.on_read(&data[..6]).expect("block failed");
		assert_eq!(validator.state(), ValidatorState::ValidatingBlock);
		validator.on_read(&data[6..7]).expect("block failed");
		validator.on_read(&data[7..]).expect("block failed");
		validator.on_done().expect("final block failed");
		assert_eq!(validator.state(), ValidatorState::Finished);
		assert_eq!(validator.bytes_hashed(), data.len() as u64);
	}

	#[test]
	pub fn test_single_flipped_byte_fails() {
		let data = b"0123456789abcdef".to_vec();
		let integrity = integrity_for(&data, 8);
		for idx in 0..data.len() {
			let mut tampered = data.clone();
			tampered[idx] ^= 0x20;
			let mut validator =
				IntegrityValidator::new(integrity.clone(), &tampered, 0, data.len() as u64);
			let result = validator
				.on_read(&tampered)
				.and_then(|_| validator.on_done());
			let err = result.expect_err("tampered byte passed validation");
			assert!(matches!(err, Error::HashMismatch { block: Some(block), .. } if block == idx / 8));
			assert_eq!(validator.state(), ValidatorState::Failed);
			assert_eq!(validator.on_read(b"x"), Err(err));
		}
	}

	#[test]
	pub fn test_empty_file() {
		let integrity = integrity_for(b"", 4 * 1024 * 1024);
		let mut validator = IntegrityValidator::new(integrity, Vec::new(), 0, 0);
		validator.on_done().expect("empty file failed validation");
		assert_eq!(validator.state(), ValidatorState::Finished);

		let wrong = integrity_for(b"not empty", 4 * 1024 * 1024);
		let mut validator = IntegrityValidator::new(wrong, Vec::new(), 0, 0);
		assert!(validator.on_done().is_err());
	}

	#[test]
	pub fn test_exact_block_multiple() {
		let data = b"abcdefgh".to_vec();
		let integrity = integrity_for(&data, 4);
		assert_eq!(integrity.blocks().len(), 3);
		let mut validator = IntegrityValidator::new(integrity, &data, 0, 8);
		validator.on_read(&data).expect("block failed");
		validator.on_done().expect("trailing block failed");
	}

	#[test]
	pub fn test_reads_remainder_when_consumer_stops() {
		let mut archive = b"HEADER".to_vec();
		let contents = b"0123456789ab";
		archive.extend_from_slice(contents);
		let integrity = integrity_for(contents, 4);
		let mut validator = IntegrityValidator::new(integrity, &archive, 6, 12);
		validator.on_read(&contents[..6]).expect("block failed");
		validator.on_done().expect("remainder failed");
		assert_eq!(validator.bytes_hashed(), 12);

		let mut tampered = archive.clone();
		tampered[16] = b'!';
		let integrity = integrity_for(contents, 4);
		let mut validator = IntegrityValidator::new(integrity, &tampered, 6, 12);
		validator.on_read(&contents[..6]).expect("block failed");
		let err = validator.on_done().expect_err("tampered remainder passed");
		assert!(matches!(err, Error::HashMismatch { block: Some(2), .. }));
	}

	#[test]
	pub fn test_range_from_middle_block() {
		let contents = b"0123456789ab".to_vec();
		let integrity = integrity_for(&contents, 4);
		let mut validator = IntegrityValidator::new(integrity, &contents, 0, 12);
		// Bytes 5.. were requested; the stream starts at the block boundary 4.
		validator.set_current_block(1);
		validator.set_range(5, 1, 12);
		validator.on_read(&contents[4..]).expect("block failed");
		validator.on_done().expect("final block failed");
		assert_eq!(validator.state(), ValidatorState::Finished);
	}

	#[test]
	pub fn test_more_data_than_blocks() {
		let contents = b"0123".to_vec();
		let integrity = integrity_for(&contents, 4);
		let longer = b"01234567".to_vec();
		let mut validator = IntegrityValidator::new(integrity, &longer, 0, 8);
		let result = validator.on_read(&longer).and_then(|_| validator.on_done());
		assert!(result.is_err());
	}
}
