// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::{
	config::Config,
	error::{Error, Result},
	header::{File, FileIntegrity, Header},
	integrity::{validate_integrity, HeaderIntegrity},
	io::ReadAt,
	pickle::{read_header_json, read_header_size, SIZE_PICKLE_LEN},
	resolve::Resolver,
	temp_file::ScopedTemporaryFile,
};
use std::{
	collections::HashMap,
	fs,
	io::{Error as IoError, ErrorKind},
	path::{Path, PathBuf},
	sync::{Mutex, PoisonError},
};

/// Where a file's bytes live, as resolved from the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileInfo {
	/// Size of the file in bytes.
	pub size: u32,
	/// Absolute offset of the file inside the archive. Zero for unpacked
	/// files.
	pub offset: u64,
	/// The file lives in `<archive>.unpacked/` instead of the archive.
	pub unpacked: bool,
	pub executable: bool,
	/// Present only when integrity validation is enabled; streamed reads of
	/// this file must then go through an
	/// [`IntegrityValidator`](crate::IntegrityValidator).
	pub integrity: Option<FileIntegrity>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FileType {
	File,
	Directory,
	Link,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats {
	pub kind: FileType,
	/// Only filled in for files.
	pub info: FileInfo,
}

impl Stats {
	#[inline]
	pub const fn is_file(&self) -> bool {
		matches!(self.kind, FileType::File)
	}

	#[inline]
	pub const fn is_directory(&self) -> bool {
		matches!(self.kind, FileType::Directory)
	}

	#[inline]
	pub const fn is_link(&self) -> bool {
		matches!(self.kind, FileType::Link)
	}
}

/// An opened asar archive.
///
/// Construction only opens the file; [`init`](Self::init) reads and parses
/// the header. Once initialized, every lookup only reads the immutable header
/// tree and the file through positional reads, so an `Archive` can be shared
/// between threads behind an [`Arc`](std::sync::Arc).
///
/// ```rust,no_run
/// use asar_archive::{Archive, Result};
/// use std::path::Path;
///
/// fn main() -> Result<()> {
/// 	let archive = Archive::open("app.asar")?;
/// 	let info = archive.file_info(Path::new("package.json"))?;
/// 	println!("package.json is {} bytes at offset {}", info.size, info.offset);
/// 	let native = archive.copy_file_out(Path::new("build/addon.node"))?;
/// 	println!("addon available at {}", native.display());
/// 	Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Archive {
	path: PathBuf,
	file: std::io::Result<fs::File>,
	config: Config,
	header_integrity: Option<HeaderIntegrity>,
	header: Option<Header>,
	header_size: u64,
	len: u64,
	external_files: Mutex<HashMap<PathBuf, ScopedTemporaryFile>>,
}

impl Archive {
	/// Opens the file at `path` without reading it. A file that cannot be
	/// opened is not an error yet; [`init`](Self::init) will report it.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self::new_with(path, Config::default())
	}

	pub fn new_with(path: impl Into<PathBuf>, config: Config) -> Self {
		let path = path.into();
		let file = fs::File::open(&path);
		Self {
			path,
			file,
			config,
			header_integrity: None,
			header: None,
			header_size: 0,
			len: 0,
			external_files: Mutex::new(HashMap::new()),
		}
	}

	/// Opens and initializes the archive at `path`.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
		Self::open_with(path, Config::default())
	}

	pub fn open_with(path: impl Into<PathBuf>, config: Config) -> Result<Self> {
		let mut archive = Self::new_with(path, config);
		archive.init()?;
		Ok(archive)
	}

	/// Requires the raw header string to match `integrity` during
	/// [`init`](Self::init).
	pub fn with_header_integrity(mut self, integrity: HeaderIntegrity) -> Self {
		self.header_integrity = Some(integrity);
		self
	}

	/// Reads and parses the header. Calling this again after it succeeded
	/// does nothing.
	pub fn init(&mut self) -> Result<()> {
		if self.header.is_some() {
			return Ok(());
		}

		let file = match &self.file {
			Ok(file) => file,
			Err(err) => {
				if err.kind() != ErrorKind::NotFound {
					tracing::warn!(path = %self.path.display(), %err, "failed to open asar archive");
				}
				return Err(Error::Io(IoError::new(err.kind(), err.to_string())));
			}
		};

		let len = file.metadata()?.len();
		if len < SIZE_PICKLE_LEN as u64 {
			return Err(Error::Truncated);
		}
		let mut prefix = [0_u8; SIZE_PICKLE_LEN];
		file.read_exact_at(&mut prefix, 0)?;
		let size = read_header_size(&prefix)?;
		if u64::from(size) > len - SIZE_PICKLE_LEN as u64 {
			return Err(Error::Truncated);
		}
		let mut buf = vec![0_u8; size as usize];
		file.read_exact_at(&mut buf, SIZE_PICKLE_LEN as u64)?;
		let json = read_header_json(&buf)?;

		if let Some(integrity) = &self.header_integrity {
			integrity.validate(&self.path, json)?;
		}
		let header = Header::parse(json)?;

		self.header_size = SIZE_PICKLE_LEN as u64 + u64::from(size);
		self.len = len;
		self.header = Some(header);
		tracing::debug!(
			path = %self.path.display(),
			header_size = self.header_size,
			len,
			"opened asar archive"
		);
		Ok(())
	}

	#[inline]
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Size of the envelope and header; packed offsets are relative to this.
	#[inline]
	pub const fn header_size(&self) -> u64 {
		self.header_size
	}

	/// Length of the archive file in bytes.
	#[inline]
	pub const fn len(&self) -> u64 {
		self.len
	}

	#[inline]
	pub const fn is_empty(&self) -> bool {
		self.len == 0
	}

	#[inline]
	pub fn is_initialized(&self) -> bool {
		self.header.is_some()
	}

	pub fn header(&self) -> Result<&Header> {
		self.header.as_ref().ok_or(Error::NotInitialized)
	}

	/// The archive file, for streaming reads at [`FileInfo::offset`].
	pub fn file(&self) -> Result<&fs::File> {
		self.header()?;
		self.file.as_ref().map_err(|_| Error::NotInitialized)
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	fn resolver(&self) -> Result<Resolver<'_>> {
		Ok(Resolver::new(self.header()?, self.config.max_link_hops))
	}

	/// Looks up the file at `path`, following links. Directories have no
	/// file info.
	pub fn file_info(&self, path: &Path) -> Result<FileInfo> {
		let file = self.resolver()?.resolve_file(path)?;
		self.fill_info(path, file)
	}

	/// Describes the node at `path` without following a link there.
	pub fn stat(&self, path: &Path) -> Result<Stats> {
		let stats = match self.resolver()?.resolve(path)? {
			Header::Link { .. } => Stats {
				kind: FileType::Link,
				info: FileInfo::default(),
			},
			Header::Directory { .. } => Stats {
				kind: FileType::Directory,
				info: FileInfo::default(),
			},
			Header::File(file) => Stats {
				kind: FileType::File,
				info: self.fill_info(path, file)?,
			},
		};
		Ok(stats)
	}

	/// Names of the entries in the directory at `path`, in no particular
	/// order.
	pub fn readdir(&self, path: &Path) -> Result<Vec<String>> {
		Ok(self
			.resolver()?
			.read_dir(path)?
			.into_iter()
			.map(str::to_string)
			.collect())
	}

	/// The target of the link at `path`, or `path` itself.
	pub fn realpath(&self, path: &Path) -> Result<PathBuf> {
		self.resolver()?.realpath(path)
	}

	/// Every file and link in the archive, found by walking the tree from the
	/// root with [`readdir`](Self::readdir). Links are listed, not followed.
	pub fn entries(&self) -> Result<Vec<(PathBuf, FileType)>> {
		let resolver = self.resolver()?;
		let mut entries = Vec::new();
		let mut pending = vec![PathBuf::new()];
		while let Some(dir) = pending.pop() {
			for name in resolver.read_dir(&dir)? {
				let path = dir.join(name);
				match resolver.resolve(&path)? {
					Header::Directory { .. } => pending.push(path),
					Header::Link { .. } => entries.push((path, FileType::Link)),
					Header::File(_) => entries.push((path, FileType::File)),
				}
			}
		}
		Ok(entries)
	}

	/// Where an unpacked file at `path` lives on disk.
	pub fn unpacked_path(&self, path: &Path) -> PathBuf {
		let mut dir = self.path.clone().into_os_string();
		dir.push(".unpacked");
		PathBuf::from(dir).join(path)
	}

	/// Makes the file at `path` available at a real filesystem path.
	///
	/// Unpacked files are already on disk and their path is returned as is.
	/// Packed files are copied into a temporary file that lives as long as
	/// this archive; asking again for the same path returns the same copy.
	pub fn copy_file_out(&self, path: &Path) -> Result<PathBuf> {
		self.header()?;
		let mut external_files = self
			.external_files
			.lock()
			.unwrap_or_else(PoisonError::into_inner);
		if let Some(temp_file) = external_files.get(path) {
			return Ok(temp_file.path().to_path_buf());
		}

		let info = self.file_info(path)?;
		if info.unpacked {
			return Ok(self.unpacked_path(path));
		}

		let mut temp_file = match &self.config.temp_dir {
			Some(dir) => ScopedTemporaryFile::new_in(dir),
			None => ScopedTemporaryFile::new(),
		};
		let extension = path
			.extension()
			.map(|ext| format!(".{}", ext.to_string_lossy()))
			.unwrap_or_default();
		temp_file.init_from_file(
			self.file()?,
			&extension,
			info.offset,
			info.size,
			info.integrity.as_ref().map(|integrity| (path, integrity)),
		)?;

		#[cfg(unix)]
		{
			use std::os::unix::fs::PermissionsExt;
			if info.executable {
				fs::set_permissions(temp_file.path(), fs::Permissions::from_mode(0o755))?;
			}
		}

		let out = temp_file.path().to_path_buf();
		tracing::debug!(
			archive = %self.path.display(),
			file = %path.display(),
			out = %out.display(),
			"copied file out of asar archive"
		);
		external_files.insert(path.to_path_buf(), temp_file);
		Ok(out)
	}

	/// Reads the whole file at `path`, from the archive or from the unpacked
	/// directory.
	pub fn read(&self, path: &Path) -> Result<Vec<u8>> {
		let info = self.file_info(path)?;
		let data = if info.unpacked {
			fs::read(self.unpacked_path(path))?
		} else {
			let mut buf = vec![0_u8; info.size as usize];
			self.file()?.read_exact_at(&mut buf, info.offset)?;
			buf
		};
		if let Some(integrity) = &info.integrity {
			validate_integrity(path, &data, integrity)?;
		}
		Ok(data)
	}

	fn fill_info(&self, path: &Path, file: &File) -> Result<FileInfo> {
		let integrity = if self.config.validate_integrity {
			let integrity = file
				.integrity()
				.ok_or_else(|| Error::MissingIntegrity(path.to_path_buf()))?;
			Some(integrity.clone())
		} else {
			None
		};

		if file.unpacked() {
			return Ok(FileInfo {
				size: file.size(),
				offset: 0,
				unpacked: true,
				executable: file.executable(),
				integrity,
			});
		}

		let size = u64::from(file.size());
		let offset = file.offset().checked_add(self.header_size);
		match offset.and_then(|offset| offset.checked_add(size).map(|end| (offset, end))) {
			Some((offset, end)) if end <= self.len => Ok(FileInfo {
				size: file.size(),
				offset,
				unpacked: false,
				executable: file.executable(),
				integrity,
			}),
			_ => Err(Error::OutOfBounds {
				path: path.to_path_buf(),
				offset: file.offset(),
				size,
				length: self.len,
			}),
		}
	}
}
