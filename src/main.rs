// SPDX-License-Identifier: Apache-2.0 OR MIT
mod app;

use self::app::args::{AppArgs, AppSubcommand};
use clap::Parser;
use color_eyre::{
	eyre::{eyre, WrapErr},
	Result,
};

fn main() -> Result<()> {
	color_eyre::install().wrap_err("failed to install color-eyre handler")?;
	let args = AppArgs::parse();
	init_tracing(args.verbose)?;

	match args.subcommand {
		AppSubcommand::List(args) => app::list::list(args).wrap_err("failed to list archive"),
		AppSubcommand::Extract(args) => {
			app::extract::extract(args).wrap_err("failed to extract archive")
		}
		AppSubcommand::ExtractFile(args) => {
			app::extract_file::extract_file(args).wrap_err("failed to extract file")
		}
		AppSubcommand::Stat(args) => app::stat::stat(args).wrap_err("failed to stat file"),
		AppSubcommand::Verify(args) => app::verify::verify(args).wrap_err("failed to verify archive"),
	}
}

fn init_tracing(verbose: u8) -> Result<()> {
	let level = match verbose {
		0 => "warn",
		1 => "info",
		2 => "debug",
		_ => "trace",
	};
	let filter = format!("asar={level},asar_archive={level}");
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(false)
		.with_writer(std::io::stderr)
		.try_init()
		.map_err(|err| eyre!("failed to install tracing subscriber: {err}"))
}
