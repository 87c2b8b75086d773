// SPDX-License-Identifier: Apache-2.0 OR MIT
use super::args::ExtractArgs;
use asar_archive::{Archive, FileType};
use color_eyre::{
	eyre::{eyre, WrapErr},
	Result,
};
use std::{
	fs,
	path::{Component, Path, PathBuf},
};

fn check_relative(path: &Path) -> Result<()> {
	if path
		.components()
		.any(|c| !matches!(c, Component::Normal(_)))
	{
		return Err(eyre!(
			"asar archive attempted to escape destination with {}",
			path.display()
		));
	}
	Ok(())
}

/// Where the link at `link` should point so that it reaches `target`, both
/// relative to the archive root.
fn link_target(link: &Path, target: &Path) -> PathBuf {
	let depth = link.parent().map_or(0, |parent| parent.components().count());
	let mut out = PathBuf::new();
	for _ in 0..depth {
		out.push("..");
	}
	out.join(target)
}

pub fn extract(args: ExtractArgs) -> Result<()> {
	let archive = Archive::open(&args.archive)
		.wrap_err_with(|| format!("failed to open archive {}", args.archive.display()))?;
	for (path, kind) in archive.entries().wrap_err("failed to walk archive")? {
		check_relative(&path)?;
		let out_path = args.destination.join(&path);
		if let Some(parent) = out_path.parent() {
			fs::create_dir_all(parent)
				.wrap_err_with(|| format!("failed to create directory {}", parent.display()))?;
		}
		if kind == FileType::Link {
			extract_link(&archive, &path, &out_path)?;
			continue;
		}
		let data = archive
			.read(&path)
			.wrap_err_with(|| format!("failed to read {}", path.display()))?;
		fs::write(&out_path, data)
			.wrap_err_with(|| format!("failed to write file {}", out_path.display()))?;
		#[cfg(unix)]
		{
			use std::os::unix::fs::PermissionsExt;
			if archive.file_info(&path)?.executable {
				fs::set_permissions(&out_path, fs::Permissions::from_mode(0o755))?;
			}
		}
	}

	Ok(())
}

#[cfg(unix)]
fn extract_link(archive: &Archive, path: &Path, out_path: &Path) -> Result<()> {
	let target = archive.realpath(path)?;
	check_relative(&target)?;
	let target = link_target(path, &target);
	std::os::unix::fs::symlink(&target, out_path).wrap_err_with(|| {
		format!(
			"failed to link {} to {}",
			out_path.display(),
			target.display()
		)
	})
}

/// Without symlinks, linked files are extracted as copies of their target.
/// Links to directories are skipped, their contents show up under the
/// target.
#[cfg(not(unix))]
fn extract_link(archive: &Archive, path: &Path, out_path: &Path) -> Result<()> {
	let data = match archive.read(path) {
		Ok(data) => data,
		Err(err) if err.is_not_found() => {
			tracing::debug!(path = %path.display(), %err, "skipping link");
			return Ok(());
		}
		Err(err) => return Err(err).wrap_err_with(|| format!("failed to read {}", path.display())),
	};
	fs::write(out_path, data)
		.wrap_err_with(|| format!("failed to write file {}", out_path.display()))
}

#[cfg(test)]
mod test {
	use super::{check_relative, link_target};
	use std::path::{Path, PathBuf};

	#[test]
	pub fn test_link_target() {
		assert_eq!(
			link_target(Path::new("alias"), Path::new("a.txt")),
			PathBuf::from("a.txt")
		);
		assert_eq!(
			link_target(Path::new("x/y/alias"), Path::new("dir/a.txt")),
			PathBuf::from("../../dir/a.txt")
		);
	}

	#[test]
	pub fn test_check_relative() {
		assert!(check_relative(Path::new("dir/a.txt")).is_ok());
		assert!(check_relative(Path::new("../a.txt")).is_err());
		assert!(check_relative(Path::new("/etc/passwd")).is_err());
	}
}
