// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025 1BitSquared <info@1bitsquared.com>

pub mod ap;

use std::sync::Arc;

use bmd_adiv6::sim::SimulatedDebugPort;
use bmd_adiv6::sim::image::RegisterImage;
use bmd_adiv6::{ADIV5_AP_ACCESS, AdiDebugPort, DiscoveryError};
use clap::Subcommand;
use color_eyre::eyre::{OptionExt, Result, eyre};
use log::info;
use owo_colors::OwoColorize;

use crate::cli_commands::ap::{ReadArguments, WriteArguments};
use crate::{CliArguments, CompletionArguments};

/// The first DP version to implement ADIv6
const DP_VERSION_ADIV6: u8 = 3;

#[derive(Subcommand)]
pub enum ToplevelCommmands
{
	/// Identify the debug port and find the root of its debug component tree
	Discover,
	/// Read a register from an access port
	Read(ReadArguments),
	/// Write a register on an access port
	Write(WriteArguments),
	/// Generate completions data for the shell
	Complete(CompletionArguments),
}

impl ToplevelCommmands
{
	pub fn run(&self, cli_args: &CliArguments) -> Result<()>
	{
		let sim = simulated_dp(cli_args)?;
		let mut dp = AdiDebugPort::new(sim.clone());

		let result = match self {
			ToplevelCommmands::Discover => discover_command(&mut dp),
			ToplevelCommmands::Read(read_args) => ap::read_command(&mut dp, read_args),
			ToplevelCommmands::Write(write_args) => ap::write_command(&mut dp, write_args),
			ToplevelCommmands::Complete(_) => Ok(()),
		};

		if cli_args.show_transactions {
			for transaction in sim.transactions() {
				println!("{:x?}", transaction);
			}
		}
		result
	}
}

fn simulated_dp(cli_args: &CliArguments) -> Result<Arc<SimulatedDebugPort>>
{
	let path = cli_args
		.image
		.as_deref()
		.ok_or_eyre("A register image must be given with --image to run against")?;
	let image = RegisterImage::from_path(path)?;
	Ok(Arc::new(SimulatedDebugPort::from(&image)))
}

/// Read DPIDR and, depending on the DP version, either run ADIv6 discovery or set up for ADIv5.
/// Returns whether the DP is ready for AP accesses.
pub fn attach(dp: &mut AdiDebugPort) -> Result<bool>
{
	dp.read_dpidr()?;
	if dp.version() < DP_VERSION_ADIV6 {
		info!("DPv{} speaks ADIv5, APs are addressed by APSEL", dp.version());
		dp.install_ap_access(&ADIV5_AP_ACCESS);
		return Ok(true);
	}
	dp.init()
}

fn discover_command(dp: &mut AdiDebugPort) -> Result<()>
{
	dp.read_dpidr()?;
	if dp.version() < DP_VERSION_ADIV6 {
		println!("{} DPv{} is not an ADIv6 DP, nothing to discover", "Note:".yellow(), dp.version());
		return Ok(());
	}

	match dp.discover() {
		Ok(entry) => {
			println!("{} {}-bit resource bus", "DP:".green(), dp.address_width());
			println!("{} {}", "Root:".green(), entry);
			Ok(())
		},
		Err(error) => {
			if let Some(reason) = error.downcast_ref::<DiscoveryError>() {
				println!("{} {}", "Discovery failed:".red(), reason);
				return Err(eyre!("No usable debug component tree on this DP"));
			}
			Err(error)
		},
	}
}
