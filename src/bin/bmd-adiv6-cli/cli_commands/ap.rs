// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025 1BitSquared <info@1bitsquared.com>

use bmd_adiv6::AdiDebugPort;
use bmd_adiv6::adi::select::ap_register_address;
use clap::Args;
use color_eyre::eyre::{Result, eyre};
use owo_colors::OwoColorize;

use crate::NumberParser;
use crate::cli_commands::attach;

/// AP register offsets are 12 bits wide
const AP_REGISTER_OFFSET_MAX: u64 = 0xfff;

#[derive(Args)]
pub struct ReadArguments
{
	#[arg(value_parser = NumberParser {})]
	/// Address of the AP on the resource bus (ADIv6) or its APSEL (ADIv5)
	ap: u64,
	#[arg(value_parser = NumberParser {})]
	/// Offset of the register within the AP, for example 0xd00 for a MEM-AP's CSW
	offset: u64,
}

#[derive(Args)]
pub struct WriteArguments
{
	#[arg(value_parser = NumberParser {})]
	/// Address of the AP on the resource bus (ADIv6) or its APSEL (ADIv5)
	ap: u64,
	#[arg(value_parser = NumberParser {})]
	/// Offset of the register within the AP, for example 0xd04 for a MEM-AP's TAR
	offset: u64,
	#[arg(value_parser = NumberParser {})]
	/// Value to write into the register
	value: u64,
}

fn register_address(offset: u64) -> Result<u16>
{
	if offset > AP_REGISTER_OFFSET_MAX || offset & 0x3 != 0 {
		return Err(eyre!("AP register offset 0x{:x} is not a word aligned 12-bit offset", offset));
	}
	Ok(ap_register_address(offset as u16))
}

fn ready(dp: &mut AdiDebugPort) -> Result<()>
{
	if !attach(dp)? {
		return Err(eyre!("Discovery failed, access ports are not reachable on this DP"));
	}
	Ok(())
}

pub fn read_command(dp: &mut AdiDebugPort, read_args: &ReadArguments) -> Result<()>
{
	let addr = register_address(read_args.offset)?;
	ready(dp)?;

	let mut ap = dp.access_port(read_args.ap);
	let value = ap.read(addr)?;
	println!(
		"{} 0x{:x} + 0x{:03x} = {}",
		"AP".green(),
		read_args.ap,
		read_args.offset,
		format!("0x{:08x}", value).bold()
	);
	Ok(())
}

pub fn write_command(dp: &mut AdiDebugPort, write_args: &WriteArguments) -> Result<()>
{
	let addr = register_address(write_args.offset)?;
	let value = u32::try_from(write_args.value)
		.map_err(|_| eyre!("Value 0x{:x} does not fit in a 32-bit register", write_args.value))?;
	ready(dp)?;

	let mut ap = dp.access_port(write_args.ap);
	ap.write(addr, value)?;
	println!(
		"{} 0x{:x} + 0x{:03x} <- {}",
		"AP".green(),
		write_args.ap,
		write_args.offset,
		format!("0x{:08x}", value).bold()
	);
	Ok(())
}
