// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025 1BitSquared <info@1bitsquared.com>

//! Address banking arithmetic for the DP register window.
//!
//! Nothing in here touches the transport: these functions only compute the values that
//! have to go into SELECT and SELECT1 for a given access, and pull 64-bit resource
//! addresses apart into (and back out of) the two 32-bit halves the DP deals in.
//!
//! See the ARM Debug Interface v6 Architecture Specification, IHI0074 ver. e, §B2.

use crate::adi::{ADIV5_APNDP, TargetAddr32, TargetAddr64};

/// A DP register bank, as programmed into SELECT.DPBANKSEL
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DpBank(pub u8);

impl DpBank
{
	pub const BANK0: Self = Self(0);
	pub const BANK1: Self = Self(1);
	pub const BANK2: Self = Self(2);
	pub const BANK3: Self = Self(3);
	pub const BANK5: Self = Self(5);

	/// DPIDR1 lives in bank 1
	pub const DPIDR1: Self = Self::BANK1;
	/// BASEPTR0 lives in bank 2
	pub const BASEPTR0: Self = Self::BANK2;
	/// BASEPTR1 lives in bank 3
	pub const BASEPTR1: Self = Self::BANK3;
	/// SELECT1 lives in bank 5
	pub const SELECT1: Self = Self::BANK5;
}

/// SELECT.DPBANKSEL occupies the bottom nibble of SELECT
const DP_BANKSEL_MASK: u32 = 0x0000000f;

/// Mask of the AP register address bits that select a bank rather than a window register
pub const ADIV6_AP_BANK_MASK: u16 = 0xf0f0;
/// Mask applied to raw 12-bit identification register offsets (CIDR/PIDR) for SELECT
const ADIV6_ID_BANK_MASK: u16 = 0x0ff0;

/// Bit 0 of BASEPTR0 flags whether the base pointer holds a valid address
pub const ADIV6_DP_BASEPTR0_VALID: u64 = 0x00000001;
/// The base pointer is 4KiB aligned, everything below bit 12 is flags or reserved
pub const ADIV6_DP_BASE_ADDRESS_MASK: u64 = 0xfffffffffffff000;

/// Compute the SELECT value that exposes the given DP register bank in the window
pub fn dp_bank_select(bank: DpBank) -> u32
{
	u32::from(bank.0) & DP_BANKSEL_MASK
}

/// Split a 64-bit resource bus address into its (low, high) 32-bit halves
pub fn split_wide_address(address: TargetAddr64) -> (TargetAddr32, TargetAddr32)
{
	(address as TargetAddr32, (address >> 32) as TargetAddr32)
}

/// Re-combine the (low, high) 32-bit halves of a resource bus address
pub fn combine_wide_address(low: TargetAddr32, high: TargetAddr32) -> TargetAddr64
{
	TargetAddr64::from(low) | (TargetAddr64::from(high) << 32)
}

/// Encode a 12-bit AP register offset (as given in the architecture documents, e.g. 0xd00 for
/// a MEM-AP's CSW) into the 16-bit register address form the AP access functions take
pub fn ap_register_address(offset: u16) -> u16
{
	ADIV5_APNDP | (offset & 0x00ff) | ((offset & 0x0f00) << 4)
}

/// Redistribute the bank bits of an AP register address into their SELECT positions.
///
/// AP register addresses carry offset bits 7:4 in place, and offset bits 11:8 up in bits
/// 15:12 (bit 8 being taken by the APnDP flag), so the top nibble has to come down by 4
/// to land on SELECT bits 11:8.
pub fn ap_bank_bits(addr: u16) -> u32
{
	let bank = u32::from(addr & ADIV6_AP_BANK_MASK);
	((bank & 0xf000) >> 4) | (bank & 0x00f0)
}

/// Compute the SELECT value for an access to the AP register `addr` of the AP at `ap_address`
pub fn ap_select(ap_address: TargetAddr64, addr: u16) -> u32
{
	let (low, _) = split_wide_address(ap_address);
	low | ap_bank_bits(addr)
}

/// Compute the SELECT value for a block of identification registers given by its raw
/// 12-bit offset (for example CIDR0 at 0xff0)
pub fn id_select(ap_address: TargetAddr64, offset: u16) -> u32
{
	let (low, _) = split_wide_address(ap_address);
	low | u32::from(offset & ADIV6_ID_BANK_MASK)
}

/// Check that a candidate base address has no bits set at or above `address_width`
pub fn base_address_fits(address: TargetAddr64, address_width: u8) -> bool
{
	if address_width >= 64 {
		return true;
	}
	let mask = (1u64 << address_width) - 1;
	(address & mask) == address
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn dp_banks()
	{
		assert_eq!(dp_bank_select(DpBank::DPIDR1), 1);
		assert_eq!(dp_bank_select(DpBank::BASEPTR0), 2);
		assert_eq!(dp_bank_select(DpBank::BASEPTR1), 3);
		assert_eq!(dp_bank_select(DpBank::SELECT1), 5);
	}

	#[test]
	fn split_and_combine()
	{
		let addresses = [0u64, 0x0000_0000_0000_1000, 0x0000_0080_0000_2000, 0xffff_ffff_ffff_ffff, 0x1234_5678_9abc_def0];
		for address in addresses {
			let (low, high) = split_wide_address(address);
			assert_eq!(combine_wide_address(low, high), address);
		}
		assert_eq!(split_wide_address(0x0000_00ab_cdef_1000), (0xcdef_1000, 0x0000_00ab));
	}

	#[test]
	fn ap_bank_redistribution()
	{
		// Offset 0xd00 (CSW in an ADIv6 MEM-AP) encodes as 0xd000 | 0x00
		assert_eq!(ap_bank_bits(0xd000), 0x0d00);
		// Offset 0xd14, window register 0x4 is not a bank bit
		assert_eq!(ap_bank_bits(0xd014), 0x0d10);
		// The APnDP flag never makes it into SELECT
		assert_eq!(ap_bank_bits(0x01fc), 0x00f0);
		assert_eq!(ap_bank_bits(0xf1fc), 0x0ff0);
	}

	#[test]
	fn register_offsets_encode()
	{
		assert_eq!(ap_register_address(0xd00), 0xd100);
		assert_eq!(ap_register_address(0xd0c), 0xd10c);
		assert_eq!(ap_register_address(0x0fc), 0x01fc);
		// And come back out as the same bank
		assert_eq!(ap_bank_bits(ap_register_address(0xd04)), 0x0d00);
		assert_eq!(ap_bank_bits(ap_register_address(0xff0)), 0x0ff0);
	}

	#[test]
	fn selects_keep_the_low_address_half()
	{
		assert_eq!(ap_select(0x0000_0001_8000_0000, 0xd104), 0x8000_0d00);
		assert_eq!(id_select(0x0000_0001_8000_0000, 0xff0), 0x8000_0ff0);
	}

	#[test]
	fn width_checks()
	{
		assert!(base_address_fits(0x0000_00ff_ffff_f001, 40));
		assert!(!base_address_fits(0x0000_0100_0000_1001, 40));
		assert!(base_address_fits(0xffff_ffff_ffff_f001, 64));
		assert!(base_address_fits(0, 0));
		assert!(!base_address_fits(1, 0));
	}
}
