// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025 1BitSquared <info@1bitsquared.com>

use color_eyre::eyre::Result;

use crate::adi::{ADIV5_DP_SELECT, AdiDebugPort, AdiVersion, ApRegisterAccess, TargetAddr64};

const ADIV5_AP_APSEL_SHIFT: u32 = 24;
const ADIV5_AP_BANK_MASK: u16 = 0x00f0;

/// AP register access for ADIv5 DPs, where the AP is picked by an 8-bit APSEL in SELECT.
/// The AP address of an ADIv5 AP is its APSEL.
pub struct AdiV5ApAccess;

pub static ADIV5_AP_ACCESS: AdiV5ApAccess = AdiV5ApAccess;

impl AdiV5ApAccess
{
	pub fn select(ap_address: TargetAddr64, addr: u16) -> u32
	{
		let apsel = ap_address as u8;
		(u32::from(apsel) << ADIV5_AP_APSEL_SHIFT) | u32::from(addr & ADIV5_AP_BANK_MASK)
	}
}

impl ApRegisterAccess for AdiV5ApAccess
{
	fn ap_read(&self, dp: &mut AdiDebugPort, ap_address: TargetAddr64, addr: u16) -> Result<u32>
	{
		dp.dp_write(ADIV5_DP_SELECT, Self::select(ap_address, addr))?;
		dp.dp_read(addr)
	}

	fn ap_write(&self, dp: &mut AdiDebugPort, ap_address: TargetAddr64, addr: u16, value: u32) -> Result<()>
	{
		dp.dp_write(ADIV5_DP_SELECT, Self::select(ap_address, addr))?;
		dp.dp_write(addr, value)
	}

	fn adi_version(&self) -> AdiVersion
	{
		AdiVersion::V5
	}
}
