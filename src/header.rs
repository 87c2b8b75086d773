// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::error::{Error, Result};
use serde::{
	de::{self, MapAccess, Visitor},
	Deserialize, Deserializer, Serialize,
};
use serde_with::{serde_as, DisplayFromStr};
use std::{collections::HashMap, fmt};

/// A node of the archive's directory tree.
///
/// The on-disk JSON does not tag nodes; the kind is inferred from which keys
/// are present (`files`, `link`, or `size`), and a node carrying more than one
/// of those is rejected while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawHeader", untagged)]
pub enum Header {
	File(File),
	Directory {
		files: HashMap<String, Self>,
		#[serde(skip_serializing_if = "is_false", default)]
		unpacked: bool,
	},
	Link {
		link: String,
	},
}

impl Header {
	/// Parses the JSON header string of an archive.
	///
	/// The root must be a directory node.
	pub fn parse(json: &str) -> Result<Self> {
		let header = serde_json::from_str::<Self>(json)?;
		if !header.is_dir() {
			return Err(Error::InvalidHeader(
				"root node is not a directory".to_string(),
			));
		}
		Ok(header)
	}

	#[inline]
	pub const fn is_dir(&self) -> bool {
		matches!(self, Self::Directory { .. })
	}

	#[inline]
	pub const fn is_link(&self) -> bool {
		matches!(self, Self::Link { .. })
	}

	/// The children of a directory node.
	#[inline]
	pub const fn files(&self) -> Option<&HashMap<String, Self>> {
		match self {
			Self::Directory { files, .. } => Some(files),
			_ => None,
		}
	}

	/// The target of a link node.
	#[inline]
	pub fn link(&self) -> Option<&str> {
		match self {
			Self::Link { link } => Some(link),
			_ => None,
		}
	}
}

/// Every key a node may carry; narrowed down to a [`Header`] variant by
/// [`TryFrom`].
///
/// Only JSON objects are accepted as nodes.
#[derive(Default)]
struct RawHeader {
	files: Option<HashMap<String, Header>>,
	link: Option<String>,
	size: Option<u64>,
	offset: Option<u64>,
	unpacked: bool,
	executable: bool,
	integrity: Option<FileIntegrity>,
}

impl<'de> Deserialize<'de> for RawHeader {
	fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		deserializer.deserialize_map(NodeVisitor)
	}
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
	type Value = RawHeader;

	fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
		formatter.write_str("a header node object")
	}

	fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
	where
		A: MapAccess<'de>,
	{
		let mut raw = RawHeader::default();
		while let Some(key) = map.next_key::<String>()? {
			match key.as_str() {
				"files" => raw.files = map.next_value()?,
				"link" => raw.link = map.next_value()?,
				"size" => raw.size = map.next_value()?,
				"offset" => {
					raw.offset = map
						.next_value::<Option<String>>()?
						.map(|offset| offset.parse::<u64>())
						.transpose()
						.map_err(de::Error::custom)?;
				}
				"unpacked" => raw.unpacked = map.next_value()?,
				"executable" => raw.executable = map.next_value()?,
				"integrity" => raw.integrity = map.next_value()?,
				_ => {
					map.next_value::<de::IgnoredAny>()?;
				}
			}
		}
		Ok(raw)
	}
}

impl TryFrom<RawHeader> for Header {
	type Error = String;

	fn try_from(raw: RawHeader) -> std::result::Result<Self, Self::Error> {
		match (raw.files, raw.link, raw.size) {
			(Some(files), None, None) => Ok(Self::Directory {
				files,
				unpacked: raw.unpacked,
			}),
			(None, Some(link), None) => Ok(Self::Link { link }),
			(None, None, Some(size)) => {
				let size = u32::try_from(size)
					.map_err(|_| format!("file size {size} does not fit in 32 bits"))?;
				let offset = match (raw.offset, raw.unpacked) {
					(Some(offset), _) => offset,
					(None, true) => 0,
					(None, false) => return Err("packed file is missing an offset".to_string()),
				};
				Ok(Self::File(File {
					offset,
					size,
					executable: raw.executable,
					unpacked: raw.unpacked,
					integrity: raw.integrity,
				}))
			}
			(None, None, None) => Err("node is neither a file, a directory nor a link".to_string()),
			_ => Err("node mixes file, directory and link keys".to_string()),
		}
	}
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct File {
	/// The offset from the end of the header that this file is located at.
	#[serde_as(as = "DisplayFromStr")]
	offset: u64,
	/// The total size of the file.
	size: u32,
	/// Whether this file is executable or not.
	#[serde(skip_serializing_if = "is_false", default)]
	executable: bool,
	/// Whether the contents live next to the archive instead of inside it.
	#[serde(skip_serializing_if = "is_false", default)]
	unpacked: bool,
	/// Integrity details of the file, such as hashes.
	#[serde(skip_serializing_if = "Option::is_none", default)]
	integrity: Option<FileIntegrity>,
}

impl File {
	/// The offset from the end of the header that this file is located at.
	#[inline]
	pub const fn offset(&self) -> u64 {
		self.offset
	}

	/// The total size of the file.
	#[inline]
	pub const fn size(&self) -> u32 {
		self.size
	}

	/// Whether this file is executable or not.
	#[inline]
	pub const fn executable(&self) -> bool {
		self.executable
	}

	/// Whether the contents live in `<archive>.unpacked/` rather than inside
	/// the archive.
	#[inline]
	pub const fn unpacked(&self) -> bool {
		self.unpacked
	}

	/// Integrity details of the file, if the packer recorded any usable ones.
	#[inline]
	pub fn integrity(&self) -> Option<&FileIntegrity> {
		self.integrity
			.as_ref()
			.filter(|integrity| integrity.is_usable())
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileIntegrity {
	/// The hashing algorithm used to calculate the hash.
	algorithm: HashAlgorithm,
	/// The hash of the file, in lowercase hex format.
	hash: String,
	/// The size of each "block" to be hashed in a file.
	block_size: u32,
	/// The hash of each "block" in a file, in lowercase hex format.
	blocks: Vec<String>,
}

impl FileIntegrity {
	pub fn new(algorithm: HashAlgorithm, hash: String, block_size: u32, blocks: Vec<String>) -> Self {
		Self {
			algorithm,
			hash,
			block_size,
			blocks,
		}
	}

	/// The hashing algorithm used to calculate the hash.
	#[inline]
	pub const fn algorithm(&self) -> HashAlgorithm {
		self.algorithm
	}

	/// The hash of the file
	#[inline]
	pub fn hash(&self) -> &str {
		&self.hash
	}

	/// The size of each "block" to be hashed in a file.
	#[inline]
	pub const fn block_size(&self) -> u32 {
		self.block_size
	}

	/// The hash of each "block" in a file.
	#[inline]
	pub fn blocks(&self) -> &[String] {
		&self.blocks
	}

	const fn is_usable(&self) -> bool {
		!matches!(self.algorithm, HashAlgorithm::None) && self.block_size > 0
	}
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum HashAlgorithm {
	/// The SHA-256 hashing algorithm
	#[serde(rename = "SHA256")]
	Sha256,
	/// Any algorithm this crate does not know about.
	#[serde(other)]
	None,
}

impl Default for HashAlgorithm {
	fn default() -> Self {
		Self::None
	}
}

const fn is_false(b: &bool) -> bool {
	!*b
}
