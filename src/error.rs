// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025 1BitSquared <info@1bitsquared.com>

//! Module for error handling code.

use thiserror::Error;

use crate::adi::TargetAddr32;

#[derive(Debug, Error)]
pub enum AdiError
{
	#[error("No AP register access installed on this DP, has it been initialised?")]
	NoApAccess,
}

/// Reasons discovery can decide the DP's component tree is not usable. These are all
/// problems with what the target told us, never with the link to it.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiscoveryError
{
	#[error("No valid base address on DP")]
	NoValidBaseAddress,

	#[error("Bad base address {high:x}{low:08x} on DP ({address_width}-bit addressing)")]
	BaseAddressOutOfRange
	{
		high: TargetAddr32,
		low: TargetAddr32,
		address_width: u8,
	},

	#[error("{entry} 0x{high:x}{low:08x}: 0x{cidr:08x} <- does not match preamble (0x{expected:08x})")]
	PreambleMismatch
	{
		/// Which entry of the component tree this was
		entry: u32,
		high: TargetAddr32,
		low: TargetAddr32,
		/// The CIDR value actually read back
		cidr: u32,
		/// The preamble it was checked against
		expected: u32,
	},
}
