// SPDX-License-Identifier: Apache-2.0 OR MIT
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[clap(author, version, about, long_about = None, propagate_version = true)]
pub struct AppArgs {
	/// Log more details (repeat for even more)
	#[clap(short, long, global = true, action = ArgAction::Count)]
	pub verbose: u8,
	#[clap(subcommand)]
	pub subcommand: AppSubcommand,
}

#[derive(Subcommand)]
pub enum AppSubcommand {
	List(ListArgs),
	Extract(ExtractArgs),
	ExtractFile(ExtractFileArgs),
	Stat(StatArgs),
	Verify(VerifyArgs),
}

/// List files of asar archive
#[derive(Args)]
pub struct ListArgs {
	/// The asar archive to list
	#[clap(value_parser)]
	pub archive: PathBuf,
}

/// Extract an asar archive, recreating links as symlinks where supported
#[derive(Args)]
pub struct ExtractArgs {
	/// Archive to extract
	#[clap(value_parser)]
	pub archive: PathBuf,
	/// The directory to extract to
	#[clap(value_parser)]
	pub destination: PathBuf,
}

/// Extract one file from an asar archive
#[derive(Args)]
pub struct ExtractFileArgs {
	/// Archive to extract
	#[clap(value_parser)]
	pub archive: PathBuf,
	/// The file to extract from the archive
	#[clap(value_parser)]
	pub filename: PathBuf,
}

/// Show what a path inside an asar archive is
#[derive(Args)]
pub struct StatArgs {
	/// The asar archive to look into
	#[clap(value_parser)]
	pub archive: PathBuf,
	/// The path inside the archive
	#[clap(value_parser)]
	pub path: PathBuf,
}

/// Check the integrity hashes of every file in an asar archive
#[derive(Args)]
pub struct VerifyArgs {
	/// The asar archive to verify
	#[clap(value_parser)]
	pub archive: PathBuf,
	/// Fail on files without integrity information
	#[clap(long)]
	pub strict: bool,
}
