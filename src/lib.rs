// SPDX-License-Identifier: Apache-2.0 OR MIT
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![forbid(unsafe_code)]
#![warn(
	clippy::perf,
	clippy::complexity,
	clippy::style,
	clippy::correctness,
	clippy::missing_const_for_fn
)]
#![allow(clippy::tabs_in_doc_comments, clippy::too_many_arguments)]

//! This crate provides read-only access to [asar](https://github.com/electron/asar) archives,
//! the format [Electron](https://www.electronjs.org/) applications ship their sources in.
//!
//! It resolves paths inside an archive (following the archive's own symbolic
//! links), hands out files either as byte ranges of the archive or as real
//! files on disk, keeps opened archives in a shared cache, and verifies the
//! per-block SHA-256 hashes the packer can record for every file.
//!
//! # Examples
//!
//! ## Listing the contents of an asar archive
//! ```rust,no_run
//! use asar_archive::{Archive, Result};
//!
//! fn main() -> Result<()> {
//! 	let archive = Archive::open("archive.asar")?;
//! 	for (path, _) in archive.entries()? {
//! 		println!("{}", path.display());
//! 	}
//! 	Ok(())
//! }
//! ```
//!
//! ## Reading a file from an asar archive
//! ```rust,no_run
//! use asar_archive::{AsarContext, Result};
//! use std::path::Path;
//!
//! fn main() -> Result<()> {
//! 	let context = AsarContext::default();
//! 	let contents = context.read_file_to_string(Path::new("archive.asar/hello.txt"))?;
//! 	assert_eq!(contents, "Hello, World!");
//! 	Ok(())
//! }
//! ```
//!
//! ## Validating a streamed file
//! ```rust,no_run
//! use asar_archive::{Archive, IntegrityValidator, Result};
//! use std::path::Path;
//!
//! fn main() -> Result<()> {
//! 	let archive = Archive::open("archive.asar")?;
//! 	let path = Path::new("hello.txt");
//! 	let info = archive.file_info(path)?;
//! 	if let Some(integrity) = info.integrity.clone() {
//! 		let mut validator =
//! 			IntegrityValidator::new(integrity, archive.file()?, info.offset, info.size.into());
//! 		let contents = archive.read(path)?;
//! 		for chunk in contents.chunks(1024) {
//! 			validator.on_read(chunk)?;
//! 		}
//! 		validator.on_done()?;
//! 	}
//! 	Ok(())
//! }
//! ```
//!
//! # Integrity
//!
//! Set [`Config::validate_integrity`] to require integrity metadata on every
//! file and check it whenever a file is read or copied out.
//!
//! # License
//!
//! `asar-archive` is licensed under either the [MIT license](LICENSE-MIT) or the
//! [Apache License 2.0](LICENSE-APACHE), at the choice of the user.

/// Opened archives and lookups inside them.
pub mod archive;
/// Process-wide sharing of opened archives.
pub mod cache;
/// Configuration shared by archives.
pub mod config;
pub mod context;
/// Finding the archive a filesystem path points into.
pub mod detector;
/// Error handling for parsing and reading asar archives.
pub mod error;
/// Header parsing for asar archives.
pub mod header;
pub mod integrity;
pub mod io;
pub mod pickle;
/// Virtual path resolution inside a header tree.
pub mod resolve;
pub mod temp_file;
/// Block-wise integrity checks for streamed reads.
pub mod validator;

#[cfg(test)]
pub(crate) mod test_util;

pub use archive::{Archive, FileInfo, FileType, Stats};
pub use cache::ArchiveCache;
pub use config::Config;
pub use context::AsarContext;
pub use detector::{ArchivePath, PathDetector};
pub use error::{Error, Result};
pub use header::{File, FileIntegrity, HashAlgorithm, Header};
pub use integrity::{validate_integrity, HeaderIntegrity};
pub use io::ReadAt;
pub use temp_file::ScopedTemporaryFile;
pub use validator::{IntegrityValidator, ValidatorState};
