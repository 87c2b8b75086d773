// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Walks slash-delimited virtual paths through a [`Header`] tree.
//!
//! Paths are taken literally: `.` and `..` are ordinary names, and empty
//! segments (`a//b`, a leading `/`) are skipped. A link met in the middle of a
//! path is resolved again from the root, and every such hop counts against a
//! budget so that cyclic archives fail with [`Error::SymlinkLoop`].
use crate::{
	error::{Error, Result},
	header::{File, Header},
};
use std::{
	collections::HashMap,
	path::{Path, PathBuf},
};

#[cfg(windows)]
const SEPARATORS: &[char] = &['\\', '/'];
#[cfg(not(windows))]
const SEPARATORS: &[char] = &['/'];

#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
	root: &'a Header,
	max_hops: usize,
}

impl<'a> Resolver<'a> {
	pub const fn new(root: &'a Header, max_hops: usize) -> Self {
		Self { root, max_hops }
	}

	/// Finds the node at `path` without following a link at the final
	/// segment.
	pub fn resolve(&self, path: &Path) -> Result<&'a Header> {
		self.walk().node(path_str(path)?, path)
	}

	/// Finds the file at `path`, following links at the final segment until a
	/// file is reached.
	pub fn resolve_file(&self, path: &Path) -> Result<&'a File> {
		let mut walk = self.walk();
		let mut node = walk.node(path_str(path)?, path)?;
		loop {
			match node {
				Header::File(file) => return Ok(file),
				Header::Directory { .. } => return Err(Error::IsADirectory(path.to_path_buf())),
				Header::Link { link } => {
					walk.hop(path)?;
					node = walk.node(link, path)?;
				}
			}
		}
	}

	/// Lists the names inside the directory at `path`. A link at `path` is
	/// followed once.
	pub fn read_dir(&self, path: &Path) -> Result<Vec<&'a str>> {
		let mut walk = self.walk();
		let node = walk.node(path_str(path)?, path)?;
		let files = walk
			.files(node, path)?
			.ok_or_else(|| Error::NotADirectory(path.to_path_buf()))?;
		Ok(files.keys().map(String::as_str).collect())
	}

	/// The literal target of the link at `path`, or `path` itself for any
	/// other node.
	pub fn realpath(&self, path: &Path) -> Result<PathBuf> {
		match self.resolve(path)? {
			Header::Link { link } => Ok(PathBuf::from(link)),
			_ => Ok(path.to_path_buf()),
		}
	}

	const fn walk(&self) -> Walk<'a> {
		Walk {
			root: self.root,
			hops_left: self.max_hops,
		}
	}
}

struct Walk<'a> {
	root: &'a Header,
	hops_left: usize,
}

impl<'a> Walk<'a> {
	fn node(&mut self, virtual_path: &str, path: &Path) -> Result<&'a Header> {
		let mut node = self.root;
		for segment in virtual_path.split(SEPARATORS).filter(|s| !s.is_empty()) {
			node = self
				.files(node, path)?
				.and_then(|files| files.get(segment))
				.ok_or_else(|| Error::NotFound(path.to_path_buf()))?;
		}
		Ok(node)
	}

	/// The children of `dir`, looking through one link if `dir` is one.
	fn files(&mut self, dir: &'a Header, path: &Path) -> Result<Option<&'a HashMap<String, Header>>> {
		match dir {
			Header::Directory { files, .. } => Ok(Some(files)),
			Header::Link { link } => {
				self.hop(path)?;
				Ok(self.node(link, path)?.files())
			}
			Header::File(_) => Ok(None),
		}
	}

	fn hop(&mut self, path: &Path) -> Result<()> {
		self.hops_left = self
			.hops_left
			.checked_sub(1)
			.ok_or_else(|| Error::SymlinkLoop(path.to_path_buf()))?;
		Ok(())
	}
}

fn path_str(path: &Path) -> Result<&str> {
	path.to_str()
		.ok_or_else(|| Error::NotFound(path.to_path_buf()))
}

#[cfg(test)]
mod test {
	use super::Resolver;
	use crate::{error::Error, header::Header};
	use std::path::{Path, PathBuf};

	fn header() -> Header {
		Header::parse(
			r#"{"files":{
				"a":{"files":{
					"b":{"size":3,"offset":"0"},
					"c":{"files":{"d.txt":{"size":1,"offset":"3"}}}
				}},
				"x":{"files":{"y":{"link":"a/b"}}},
				"alias":{"link":"a/c"},
				"chain":{"link":"x/y"},
				"loop":{"link":"loop/self"},
				"ping":{"link":"pong"},
				"pong":{"link":"ping"}
			}}"#,
		)
		.expect("failed to parse header")
	}

	#[test]
	pub fn test_resolve() {
		let header = header();
		let resolver = Resolver::new(&header, 40);
		assert!(std::ptr::eq(
			resolver.resolve(Path::new("")).expect("root"),
			&header
		));
		assert!(resolver.resolve(Path::new("a/c")).expect("a/c").is_dir());
		assert!(resolver.resolve(Path::new("/a//c/")).expect("a/c").is_dir());
		assert_eq!(
			resolver.resolve(Path::new("a/missing")),
			Err(Error::NotFound(PathBuf::from("a/missing")))
		);
		assert_eq!(
			resolver.resolve(Path::new("a/b/c")),
			Err(Error::NotFound(PathBuf::from("a/b/c")))
		);
		assert!(resolver.resolve(Path::new("a/./b")).is_err());
	}

	#[test]
	pub fn test_links() {
		let header = header();
		let resolver = Resolver::new(&header, 40);
		assert!(resolver.resolve(Path::new("x/y")).expect("x/y").is_link());
		assert_eq!(
			resolver.resolve_file(Path::new("x/y")).expect("x/y"),
			resolver.resolve_file(Path::new("a/b")).expect("a/b")
		);
		assert_eq!(
			resolver.resolve_file(Path::new("chain")).expect("chain"),
			resolver.resolve_file(Path::new("a/b")).expect("a/b")
		);
		// A linked directory in the middle of a path.
		assert_eq!(
			resolver
				.resolve_file(Path::new("alias/d.txt"))
				.expect("alias/d.txt")
				.offset(),
			3
		);
		assert_eq!(
			resolver.realpath(Path::new("alias")).expect("alias"),
			PathBuf::from("a/c")
		);
		assert_eq!(
			resolver.realpath(Path::new("a/../a")).ok(),
			None,
			"realpath does not normalize"
		);
		assert_eq!(
			resolver.realpath(Path::new("a/b")).expect("a/b"),
			PathBuf::from("a/b")
		);
	}

	#[test]
	pub fn test_symlink_cycles_fail() {
		let header = header();
		let resolver = Resolver::new(&header, 40);
		assert_eq!(
			resolver.resolve_file(Path::new("ping")),
			Err(Error::SymlinkLoop(PathBuf::from("ping")))
		);
		assert_eq!(
			resolver.resolve(Path::new("loop/self/x")),
			Err(Error::SymlinkLoop(PathBuf::from("loop/self/x")))
		);
	}

	#[test]
	pub fn test_hop_budget() {
		let header = header();
		assert!(Resolver::new(&header, 2).resolve_file(Path::new("chain")).is_ok());
		assert_eq!(
			Resolver::new(&header, 1).resolve_file(Path::new("chain")),
			Err(Error::SymlinkLoop(PathBuf::from("chain")))
		);
	}

	#[test]
	pub fn test_read_dir() {
		let header = header();
		let resolver = Resolver::new(&header, 40);
		let mut root = resolver.read_dir(Path::new("")).expect("root");
		root.sort_unstable();
		assert_eq!(root, ["a", "alias", "chain", "loop", "ping", "pong", "x"]);
		assert_eq!(
			resolver.read_dir(Path::new("alias")).expect("alias"),
			["d.txt"]
		);
		assert_eq!(
			resolver.read_dir(Path::new("a/b")),
			Err(Error::NotADirectory(PathBuf::from("a/b")))
		);
		assert_eq!(
			resolver.resolve_file(Path::new("a")),
			Err(Error::IsADirectory(PathBuf::from("a")))
		);
	}
}
