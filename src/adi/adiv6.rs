// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025 1BitSquared <info@1bitsquared.com>

//! Transport generic ADIv6 support: AP register access through the DP's resource bus
//! and discovery of the debug component tree root.
//!
//! See the following ARM Reference Documents:
//! ARM Debug Interface v6 Architecture Specification, IHI0074 ver. e
//! - https://developer.arm.com/documentation/ihi0074/latest/

use color_eyre::eyre::Result;
use log::{debug, info, warn};

use crate::adi::component::{CID_PREAMBLE, CIDR0_OFFSET, ComponentEntry, assemble_cidr, cidr_preamble_valid};
use crate::adi::select::{
	ADIV6_DP_BASE_ADDRESS_MASK, ADIV6_DP_BASEPTR0_VALID, DpBank, ap_select, base_address_fits, combine_wide_address,
	id_select, split_wide_address,
};
use crate::adi::{
	ADIV5_APNDP, ADIV5_DP_SELECT, ADIV6_DP_BASEPTR0, ADIV6_DP_BASEPTR1, ADIV6_DP_DPIDR1, ADIV6_DP_DPIDR1_ASIZE_MASK,
	ADIV6_DP_SELECT1, AdiAccessPort, AdiDebugPort, AdiVersion, ApRegisterAccess, TargetAddr64,
};
use crate::error::DiscoveryError;

/// AP register access for ADIv6 DPs, where APs are addressed by their location on the
/// DP's resource bus rather than by an APSEL.
///
/// Every access re-programs SELECT1 and SELECT from scratch. Nothing about the last bank
/// selected is remembered between calls, so each access costs three extra DP writes.
pub struct AdiV6ApAccess;

pub static ADIV6_AP_ACCESS: AdiV6ApAccess = AdiV6ApAccess;

impl AdiV6ApAccess
{
	/// Point the DP window at the bank of `ap_address` that holds register `addr`
	fn select_ap_bank(dp: &mut AdiDebugPort, ap_address: TargetAddr64, addr: u16) -> Result<()>
	{
		let (_, high) = split_wide_address(ap_address);
		// Set SELECT1 in the DP up first
		dp.select_dp_bank(DpBank::SELECT1)?;
		dp.dp_write(ADIV6_DP_SELECT1, high)?;
		// Now set up SELECT in the DP
		dp.dp_write(ADIV5_DP_SELECT, ap_select(ap_address, addr))
	}
}

impl ApRegisterAccess for AdiV6ApAccess
{
	fn ap_read(&self, dp: &mut AdiDebugPort, ap_address: TargetAddr64, addr: u16) -> Result<u32>
	{
		Self::select_ap_bank(dp, ap_address, addr)?;
		dp.dp_read(addr)
	}

	fn ap_write(&self, dp: &mut AdiDebugPort, ap_address: TargetAddr64, addr: u16, value: u32) -> Result<()>
	{
		Self::select_ap_bank(dp, ap_address, addr)?;
		dp.dp_write(addr, value)
	}

	fn adi_version(&self) -> AdiVersion
	{
		AdiVersion::V6
	}
}

impl AdiDebugPort
{
	/// Run ADIv6 discovery on this DP, installing ADIv6 AP register access if it succeeds.
	///
	/// Returns `Ok(false)` if the DP's base address or root component do not check out
	/// (the reason having been logged), and `Err` if talking to the DP failed.
	pub fn init(&mut self) -> Result<bool>
	{
		match self.discover() {
			Ok(entry) => {
				info!("Root component {}", entry);
				Ok(true)
			},
			Err(error) => {
				// Anything that is not a discovery failure is a transport problem and goes back up
				if let Some(reason) = error.downcast_ref::<DiscoveryError>() {
					warn!("{}", reason);
					return Ok(false);
				}
				Err(error)
			},
		}
	}

	/// Run ADIv6 discovery on this DP, returning the root entry of the component tree.
	///
	/// Validation failures come back as a [`DiscoveryError`] inside the report. Any AP register
	/// access already installed is removed first, and ADIv6 AP register access is only installed
	/// once the root component has been identified.
	pub fn discover(&mut self) -> Result<ComponentEntry>
	{
		// Whatever a previous discovery found no longer holds until this one succeeds
		self.clear_ap_access();
		// DPIDR1 is on bank 1
		self.select_dp_bank(DpBank::DPIDR1)?;
		// Read the other DPIDR and figure out the DP bus address width
		let dpidr1 = self.dp_read(ADIV6_DP_DPIDR1)?;
		self.set_address_width((dpidr1 & ADIV6_DP_DPIDR1_ASIZE_MASK) as u8);

		info!("DP DPIDR1 0x{:08x} {}-bit addressing", dpidr1, self.address_width());

		// Now we know how wide the DP bus addresses are, read out the base pointers and validate them
		let base_address = self.read_base_address()?;
		let base_address = validate_base_address(base_address, self.address_width())?;
		info!("DP base address 0x{:016x}", base_address);

		let entry = self.probe_component(base_address, 0)?;
		self.install_ap_access(&ADIV6_AP_ACCESS);
		Ok(entry)
	}

	fn read_base_address(&mut self) -> Result<TargetAddr64>
	{
		// BASEPTR0 is on bank 2
		self.select_dp_bank(DpBank::BASEPTR0)?;
		let baseptr0 = self.dp_read(ADIV6_DP_BASEPTR0)?;
		// BASEPTR1 is on bank 3
		self.select_dp_bank(DpBank::BASEPTR1)?;
		let baseptr1 = self.dp_read(ADIV6_DP_BASEPTR1)?;
		// Now re-combine the values and return
		Ok(combine_wide_address(baseptr0, baseptr1))
	}

	fn probe_component(&mut self, base_address: TargetAddr64, entry_number: u32) -> Result<ComponentEntry>
	{
		// Start out by making a fake AP to use for all the reads
		let mut base_ap = self.access_port(base_address);

		let cidr = read_id(&mut base_ap, CIDR0_OFFSET)?;
		// CIDR preamble sanity check
		if !cidr_preamble_valid(cidr) {
			let (low, high) = split_wide_address(base_address);
			return Err(DiscoveryError::PreambleMismatch {
				entry: entry_number,
				high,
				low,
				cidr,
				expected: CID_PREAMBLE,
			}
			.into());
		}

		let entry = ComponentEntry::new(entry_number, base_address, cidr);
		debug!("{}", entry);
		Ok(entry)
	}
}

/// Check the VALID flag and the DP's address width against a raw BASEPTR1:BASEPTR0 value,
/// giving back the 4KiB aligned component tree root address if it all checks out
pub fn validate_base_address(base_address: TargetAddr64, address_width: u8) -> Result<TargetAddr64, DiscoveryError>
{
	if base_address & ADIV6_DP_BASEPTR0_VALID == 0 {
		return Err(DiscoveryError::NoValidBaseAddress);
	}
	if !base_address_fits(base_address, address_width) {
		let (low, high) = split_wide_address(base_address);
		return Err(DiscoveryError::BaseAddressOutOfRange {
			high,
			low,
			address_width,
		});
	}
	Ok(base_address & ADIV6_DP_BASE_ADDRESS_MASK)
}

/// Read the identification register block (CIDR or PIDR) of a component starting at the raw
/// 12-bit `offset`, one byte from each of the four registers
pub fn read_id(ap: &mut AdiAccessPort<'_>, offset: u16) -> Result<u32>
{
	let ap_address = ap.ap_address();
	let (_, high) = split_wide_address(ap_address);
	let dp = ap.dp();
	// Set up the DP resource bus to do the reads. Set SELECT1 in the DP up first
	dp.select_dp_bank(DpBank::SELECT1)?;
	dp.dp_write(ADIV6_DP_SELECT1, high)?;
	// Now set up SELECT in the DP
	dp.dp_write(ADIV5_DP_SELECT, id_select(ap_address, offset))?;

	// Loop through each ID register location and read it, pulling out only the relevant byte
	let mut values = [0u32; 4];
	for (index, value) in values.iter_mut().enumerate() {
		*value = dp.dp_read(ADIV5_APNDP | ((index as u16) << 2))?;
	}
	Ok(assemble_cidr(values))
}
