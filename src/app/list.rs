// SPDX-License-Identifier: Apache-2.0 OR MIT
use super::args::ListArgs;
use asar_archive::{Archive, FileType};
use color_eyre::{eyre::WrapErr, Result};
use std::path::{PathBuf, MAIN_SEPARATOR};

pub fn list(args: ListArgs) -> Result<()> {
	let archive = Archive::open(&args.archive)
		.wrap_err_with(|| format!("failed to read archive {}", args.archive.display()))?;
	let root = PathBuf::from(MAIN_SEPARATOR.to_string());
	let mut entries = archive.entries().wrap_err("failed to walk archive")?;
	entries.sort_by(|(a, _), (b, _)| a.cmp(b));
	for (path, kind) in entries {
		let path = root.join(path);
		match kind {
			FileType::Link => {
				let target = archive
					.realpath(path.strip_prefix(&root)?)
					.wrap_err_with(|| format!("failed to resolve {}", path.display()))?;
				println!("{} -> {}", path.display(), target.display());
			}
			_ => println!("{}", path.display()),
		}
	}

	Ok(())
}
