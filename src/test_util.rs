// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Builds archives the way the external packer lays them out.
use crate::header::{FileIntegrity, HashAlgorithm};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use std::{
	fs,
	path::{Path, PathBuf},
};

/// Block hashes as the packer computes them: one hash per full block, plus
/// one for whatever is left over at the end (possibly nothing).
pub(crate) fn integrity_for(data: &[u8], block_size: u32) -> FileIntegrity {
	let mut blocks = data
		.chunks(block_size as usize)
		.filter(|block| block.len() == block_size as usize)
		.map(|block| hex::encode(Sha256::digest(block)))
		.collect::<Vec<_>>();
	let tail = &data[blocks.len() * block_size as usize..];
	blocks.push(hex::encode(Sha256::digest(tail)));
	FileIntegrity::new(
		HashAlgorithm::Sha256,
		hex::encode(Sha256::digest(data)),
		block_size,
		blocks,
	)
}

#[derive(Debug, Default)]
pub(crate) struct ArchiveBuilder {
	root: Map<String, Value>,
	data: Vec<u8>,
	unpacked: Vec<(String, Vec<u8>)>,
	block_size: Option<u32>,
}

impl ArchiveBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records integrity metadata for every packed file added afterwards.
	pub fn with_integrity(mut self, block_size: u32) -> Self {
		self.block_size = Some(block_size);
		self
	}

	pub fn file(self, path: &str, contents: &[u8]) -> Self {
		self.packed(path, contents, false)
	}

	pub fn executable(self, path: &str, contents: &[u8]) -> Self {
		self.packed(path, contents, true)
	}

	pub fn unpacked(mut self, path: &str, contents: &[u8]) -> Self {
		self.unpacked.push((path.to_string(), contents.to_vec()));
		self.node(path, json!({ "size": contents.len(), "unpacked": true }))
	}

	pub fn link(self, path: &str, target: &str) -> Self {
		self.node(path, json!({ "link": target }))
	}

	pub fn dir(self, path: &str) -> Self {
		self.node(path, json!({ "files": {} }))
	}

	/// Inserts an arbitrary node, for headers the packer would never write.
	pub fn node(mut self, path: &str, node: Value) -> Self {
		let mut segments = path.split('/').collect::<Vec<_>>();
		let name = segments.pop().expect("empty path");
		let mut dir = &mut self.root;
		for segment in segments {
			dir = dir
				.entry(segment)
				.or_insert_with(|| json!({ "files": {} }))
				.get_mut("files")
				.and_then(Value::as_object_mut)
				.expect("parent is not a directory");
		}
		dir.insert(name.to_string(), node);
		self
	}

	fn packed(mut self, path: &str, contents: &[u8], executable: bool) -> Self {
		let mut node = json!({
			"size": contents.len(),
			"offset": self.data.len().to_string(),
		});
		if executable {
			node["executable"] = Value::Bool(true);
		}
		if let Some(block_size) = self.block_size {
			node["integrity"] =
				serde_json::to_value(integrity_for(contents, block_size)).expect("integrity");
		}
		self.data.extend_from_slice(contents);
		self.node(path, node)
	}

	pub fn header_json(&self) -> String {
		json!({ "files": self.root }).to_string()
	}

	/// Serializes a header string into the double pickle envelope.
	pub fn envelope(json: &str) -> Vec<u8> {
		let json_size = json.len() as u32;
		let aligned = json_size + (4 - json_size % 4) % 4;
		let mut out = Vec::new();
		out.extend_from_slice(&4_u32.to_le_bytes());
		out.extend_from_slice(&(aligned + 8).to_le_bytes());
		out.extend_from_slice(&(aligned + 4).to_le_bytes());
		out.extend_from_slice(&json_size.to_le_bytes());
		out.extend_from_slice(json.as_bytes());
		out.resize(out.len() + (aligned - json_size) as usize, 0);
		out
	}

	pub fn to_bytes(&self) -> Vec<u8> {
		let mut out = Self::envelope(&self.header_json());
		out.extend_from_slice(&self.data);
		out
	}

	/// Writes the archive as `dir/name`, with unpacked files beside it.
	pub fn write(&self, dir: &Path, name: &str) -> PathBuf {
		let path = dir.join(name);
		fs::write(&path, self.to_bytes()).expect("failed to write archive");
		let unpacked_dir = dir.join(format!("{name}.unpacked"));
		for (relative, contents) in &self.unpacked {
			let target = unpacked_dir.join(relative);
			fs::create_dir_all(target.parent().expect("no parent"))
				.expect("failed to create unpacked dir");
			fs::write(target, contents).expect("failed to write unpacked file");
		}
		path
	}
}
