// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025 1BitSquared <info@1bitsquared.com>

mod cli_commands;

use std::ffi::OsStr;
use std::io::stdout;
use std::path::PathBuf;

use clap::builder::TypedValueParser;
use clap::builder::styling::Styles;
use clap::{Arg, ArgAction, Args, Command, CommandFactory, Parser, crate_description, crate_version};
use clap_complete::{Shell, generate};
use color_eyre::config::HookBuilder;
use color_eyre::eyre::Result;

use crate::cli_commands::ToplevelCommmands;

#[derive(Parser)]
#[command(
	version,
	about = format!("{} v{}", crate_description!(), crate_version!()),
	styles(style()),
	disable_colored_help(false),
	arg_required_else_help(true)
)]
pub(crate) struct CliArguments
{
	#[arg(global = true, short = 'i', long = "image")]
	/// JSON register image describing the simulated debug port to run against
	image: Option<PathBuf>,
	#[arg(global = true, short = 'v', long = "verbose", action = ArgAction::Count)]
	/// Increase log verbosity (once for debug, twice for trace)
	verbose: u8,
	#[arg(global = true, long = "show-transactions", default_value_t = false)]
	/// Print every DP register access made once the command completes
	show_transactions: bool,

	#[command(subcommand)]
	pub subcommand: ToplevelCommmands,
}

#[derive(Args)]
pub(crate) struct CompletionArguments
{
	shell: Shell,
}

/// Parses numbers given either in decimal or as `0x` prefixed hex
#[derive(Clone)]
pub(crate) struct NumberParser {}

impl TypedValueParser for NumberParser
{
	type Value = u64;

	fn parse_ref(&self, cmd: &Command, _arg: Option<&Arg>, value: &OsStr) -> Result<Self::Value, clap::Error>
	{
		let value = value
			.to_str()
			.ok_or_else(|| clap::Error::new(clap::error::ErrorKind::InvalidUtf8).with_cmd(cmd))?;
		let result = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
			Some(digits) => u64::from_str_radix(&digits.replace('_', ""), 16),
			None => value.parse(),
		};
		result.map_err(|_| clap::Error::new(clap::error::ErrorKind::ValueValidation).with_cmd(cmd))
	}
}

fn install_error_handler() -> Result<()>
{
	HookBuilder::default()
		.display_env_section(false)
		.panic_section(format!(
			"Unhandled crash in bmd-adiv6-cli v{}, please include everything above in any report",
			crate_version!()
		))
		.install()?;
	Ok(())
}

/// Clap v3 style (approximate)
/// See https://stackoverflow.com/a/75343828
fn style() -> clap::builder::Styles
{
	Styles::styled()
		.usage(
			anstyle::Style::new()
				.fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow)))
				.bold(),
		)
		.header(
			anstyle::Style::new()
				.bold()
				.fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
		)
		.literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
}

fn main() -> Result<()>
{
	install_error_handler()?;
	let cli_args = CliArguments::parse();

	let level = match cli_args.verbose {
		0 => log::LevelFilter::Info,
		1 => log::LevelFilter::Debug,
		_ => log::LevelFilter::Trace,
	};
	env_logger::Builder::new()
		.filter_level(level)
		.parse_default_env()
		.init();

	match &cli_args.subcommand {
		ToplevelCommmands::Complete(comp_args) => {
			let mut cmd = CliArguments::command();
			generate(comp_args.shell, &mut cmd, "bmd-adiv6-cli", &mut stdout());
			Ok(())
		},
		subcommand => subcommand.run(&cli_args),
	}
}
