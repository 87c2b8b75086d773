// SPDX-License-Identifier: Apache-2.0 OR MIT
//! The length-prefixed envelope the asar packer wraps the header in.
//!
//! A pickle is a little-endian `u32` payload size followed by the payload.
//! Inside the payload every field starts on a 4-byte boundary; strings are a
//! `u32` byte length followed by the bytes.
use crate::error::{Error, Result};
use byteorder::{ByteOrder, LittleEndian};
use std::mem::size_of;

/// Size of the pickle that stores the size of the header pickle.
pub const SIZE_PICKLE_LEN: usize = 8;

#[derive(Debug, Clone, Copy)]
pub struct Pickle<'a> {
	payload: &'a [u8],
}

impl<'a> Pickle<'a> {
	pub fn new(data: &'a [u8]) -> Result<Self> {
		if data.len() < size_of::<u32>() {
			return Err(Error::InvalidPickle);
		}
		let (len, rest) = data.split_at(size_of::<u32>());
		let payload_size = LittleEndian::read_u32(len) as usize;
		if payload_size > rest.len() {
			return Err(Error::InvalidPickle);
		}
		Ok(Self {
			payload: &rest[..payload_size],
		})
	}

	#[inline]
	pub const fn iter(&self) -> PickleIter<'a> {
		PickleIter {
			remaining: self.payload,
		}
	}
}

#[derive(Debug, Clone)]
pub struct PickleIter<'a> {
	remaining: &'a [u8],
}

impl<'a> PickleIter<'a> {
	pub fn read_u32(&mut self) -> Result<u32> {
		let bytes = self.advance(size_of::<u32>())?;
		Ok(LittleEndian::read_u32(bytes))
	}

	pub fn read_str(&mut self) -> Result<&'a str> {
		let len = self.read_u32()? as usize;
		let bytes = self.advance(len)?;
		std::str::from_utf8(bytes).map_err(|_| Error::Utf8)
	}

	fn advance(&mut self, len: usize) -> Result<&'a [u8]> {
		if len > self.remaining.len() {
			return Err(Error::InvalidPickle);
		}
		let (bytes, rest) = self.remaining.split_at(len);
		// Padding at the very end of the payload may be omitted.
		let padding = (4 - len % 4) % 4;
		self.remaining = &rest[padding.min(rest.len())..];
		Ok(bytes)
	}
}

/// Reads the size of the header pickle from the first
/// [`SIZE_PICKLE_LEN`] bytes of an archive.
pub fn read_header_size(prefix: &[u8]) -> Result<u32> {
	Pickle::new(prefix)?.iter().read_u32()
}

/// Reads the JSON header string out of the header pickle.
pub fn read_header_json(data: &[u8]) -> Result<&str> {
	Pickle::new(data)?.iter().read_str()
}
