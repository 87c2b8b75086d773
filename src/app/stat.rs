// SPDX-License-Identifier: Apache-2.0 OR MIT
use super::args::StatArgs;
use asar_archive::{Archive, FileType};
use color_eyre::{eyre::WrapErr, Result};

pub fn stat(args: StatArgs) -> Result<()> {
	let archive = Archive::open(&args.archive)
		.wrap_err_with(|| format!("failed to open archive {}", args.archive.display()))?;
	let stats = archive
		.stat(&args.path)
		.wrap_err_with(|| format!("failed to stat {}", args.path.display()))?;
	match stats.kind {
		FileType::Directory => {
			let entries = archive.readdir(&args.path)?;
			println!("directory, {} entries", entries.len());
		}
		FileType::Link => {
			let target = archive.realpath(&args.path)?;
			println!("link -> {}", target.display());
		}
		FileType::File => {
			let info = stats.info;
			println!("file, {} bytes", info.size);
			if info.unpacked {
				println!("unpacked: {}", archive.unpacked_path(&args.path).display());
			} else {
				println!("offset: {}", info.offset);
			}
			println!("executable: {}", info.executable);
		}
	}

	Ok(())
}
