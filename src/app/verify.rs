// SPDX-License-Identifier: Apache-2.0 OR MIT
use super::args::VerifyArgs;
use asar_archive::{Archive, Config, FileType, IntegrityValidator};
use color_eyre::{
	eyre::{eyre, WrapErr},
	Result,
};
use std::fs;

/// Chunk size used to stream files through the validator.
const CHUNK_SIZE: usize = 64 * 1024;

pub fn verify(args: VerifyArgs) -> Result<()> {
	let config = Config {
		validate_integrity: true,
		..Config::default()
	};
	let archive = Archive::open_with(&args.archive, config)
		.wrap_err_with(|| format!("failed to open archive {}", args.archive.display()))?;
	let (checked, skipped) = verify_archive(&archive, args.strict)?;
	println!("{checked} files verified, {skipped} without integrity information");

	Ok(())
}

/// Checks every file carrying integrity information, returning how many were
/// checked and how many had none.
fn verify_archive(archive: &Archive, strict: bool) -> Result<(usize, usize)> {
	let mut checked = 0_usize;
	let mut skipped = 0_usize;
	for (path, kind) in archive.entries().wrap_err("failed to walk archive")? {
		if kind != FileType::File {
			continue;
		}
		let info = match archive.file_info(&path) {
			Ok(info) => info,
			Err(err) if !strict && matches!(err, asar_archive::Error::MissingIntegrity(_)) => {
				tracing::info!(path = %path.display(), "no integrity information");
				skipped += 1;
				continue;
			}
			Err(err) => return Err(err).wrap_err_with(|| format!("failed to check {}", path.display())),
		};
		let integrity = info
			.integrity
			.ok_or_else(|| eyre!("no integrity information for {}", path.display()))?;

		if info.unpacked {
			let data = fs::read(archive.unpacked_path(&path))
				.wrap_err_with(|| format!("failed to read unpacked {}", path.display()))?;
			asar_archive::validate_integrity(&path, &data, &integrity)
				.wrap_err_with(|| format!("{} was modified", path.display()))?;
		} else {
			let file = archive.file()?;
			let mut validator =
				IntegrityValidator::new(integrity, file, info.offset, u64::from(info.size));
			validator.set_file_name(&path);
			let mut buf = vec![0_u8; CHUNK_SIZE];
			let mut offset = info.offset;
			let end = info.offset + u64::from(info.size);
			while offset < end {
				let len = CHUNK_SIZE.min((end - offset) as usize);
				asar_archive::ReadAt::read_exact_at(file, &mut buf[..len], offset)?;
				validator
					.on_read(&buf[..len])
					.wrap_err_with(|| format!("{} was modified", path.display()))?;
				offset += len as u64;
			}
			validator
				.on_done()
				.wrap_err_with(|| format!("{} was modified", path.display()))?;
		}
		checked += 1;
	}

	Ok((checked, skipped))
}
