// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025 1BitSquared <info@1bitsquared.com>

pub mod adiv5;
pub mod adiv6;
pub mod component;
pub mod select;

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use color_eyre::eyre::Result;
use log::{debug, info};

use crate::adi::select::{DpBank, dp_bank_select};
use crate::error::AdiError;

pub type TargetAddr32 = u32;
pub type TargetAddr64 = u64;

/// Flag in a 16-bit register address marking the access as going to the AP side of the window
pub const ADIV5_APNDP: u16 = 0x0100;

// DP register window addresses
pub const ADIV5_DP_DPIDR: u16 = 0x0;
pub const ADIV5_DP_CTRLSTAT: u16 = 0x4;
pub const ADIV5_DP_SELECT: u16 = 0x8;
pub const ADIV5_DP_RDBUFF: u16 = 0xc;
pub const ADIV6_DP_DPIDR1: u16 = 0x0;
pub const ADIV6_DP_BASEPTR0: u16 = 0x0;
pub const ADIV6_DP_BASEPTR1: u16 = 0x0;
pub const ADIV6_DP_SELECT1: u16 = 0x4;

// DPIDR fields
const ADIV5_DP_DPIDR_DESIGNER_MASK: u32 = 0x00000ffe;
const ADIV5_DP_DPIDR_DESIGNER_SHIFT: u32 = 1;
const ADIV5_DP_DPIDR_VERSION_MASK: u32 = 0x0000f000;
const ADIV5_DP_DPIDR_VERSION_SHIFT: u32 = 12;
const ADIV5_DP_DPIDR_MINDP: u32 = 0x00010000;
const ADIV5_DP_DPIDR_PARTNO_MASK: u32 = 0x0ff00000;
const ADIV5_DP_DPIDR_PARTNO_SHIFT: u32 = 20;
/// DPIDR1.ASIZE gives the DP resource bus address width in bits
pub const ADIV6_DP_DPIDR1_ASIZE_MASK: u32 = 0x0000007f;

/// Types implementing this trait are the link-level transport to a single DP: something that
/// can put a read or write of one of the four window registers on the wire and report back.
///
/// Bit 8 of `addr` ([`ADIV5_APNDP`]) selects between the DP and AP halves of the window,
/// the bottom nibble selects the register. Any other bits are ignored by the transport.
pub trait DpTransport: Send + Sync
{
	fn dp_read(&self, addr: u16) -> Result<u32>;
	fn dp_write(&self, addr: u16, value: u32) -> Result<()>;
}

/// Types implementing this trait implement AP register access for one version of the
/// ARM Debug Interface architecture. One of these gets installed into the DP once it's been
/// worked out which ADI version the DP speaks.
pub trait ApRegisterAccess: Send + Sync
{
	/// Read the AP register `addr` of the AP at `ap_address`
	fn ap_read(&self, dp: &mut AdiDebugPort, ap_address: TargetAddr64, addr: u16) -> Result<u32>;
	/// Write `value` to the AP register `addr` of the AP at `ap_address`
	fn ap_write(&self, dp: &mut AdiDebugPort, ap_address: TargetAddr64, addr: u16, value: u32) -> Result<()>;
	/// Which ADI version this implementation is for, for diagnostics
	fn adi_version(&self) -> AdiVersion;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdiVersion
{
	V5,
	V6,
}

impl Display for AdiVersion
{
	fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result
	{
		match self {
			AdiVersion::V5 => write!(fmt, "ADIv5"),
			AdiVersion::V6 => write!(fmt, "ADIv6"),
		}
	}
}

/// An ARM debug port associated with a JTAG TAP or a SWD interface drop of an ARM debug based device
pub struct AdiDebugPort
{
	/// DP version
	version: u8,
	/// Whether this is a minimal DP (no pushed operations or transaction counter)
	minimal: bool,
	/// DP designer (not impplementer!)
	designer_code: u16,
	/// DP partno
	partno: u16,

	/// DPv3+ bus address width
	address_width: u8,

	/// The AP register access implementation for the ADI version this DP speaks,
	/// installed once discovery says it's safe to do so
	ap_access: Option<&'static dyn ApRegisterAccess>,

	/// The transport to talk to the DP over
	remote: Arc<dyn DpTransport>,
}

impl AdiDebugPort
{
	pub fn new(remote: Arc<dyn DpTransport>) -> Self
	{
		Self {
			version: 0,
			minimal: false,
			designer_code: 0,
			partno: 0,
			address_width: 0,
			ap_access: None,
			remote,
		}
	}

	/// Read a DP register through the window, in whatever bank is currently selected
	pub fn dp_read(&mut self, addr: u16) -> Result<u32>
	{
		let value = self.remote.dp_read(addr)?;
		debug!("DP read {:04x} -> {:08x}", addr, value);
		Ok(value)
	}

	/// Write a DP register through the window, in whatever bank is currently selected
	pub fn dp_write(&mut self, addr: u16, value: u32) -> Result<()>
	{
		debug!("DP write {:04x} <- {:08x}", addr, value);
		self.remote.dp_write(addr, value)
	}

	/// Switch the DP side of the window over to the given register bank
	pub fn select_dp_bank(&mut self, bank: DpBank) -> Result<()>
	{
		self.dp_write(ADIV5_DP_SELECT, dp_bank_select(bank))
	}

	/// Read out DPIDR and extract the DP's version and identification from it
	pub fn read_dpidr(&mut self) -> Result<u32>
	{
		// DPIDR is on bank 0, but is also readable from any bank on all DPs that exist
		self.select_dp_bank(DpBank::BANK0)?;
		let dpidr = self.dp_read(ADIV5_DP_DPIDR)?;

		self.version = ((dpidr & ADIV5_DP_DPIDR_VERSION_MASK) >> ADIV5_DP_DPIDR_VERSION_SHIFT) as u8;
		self.minimal = dpidr & ADIV5_DP_DPIDR_MINDP != 0;
		self.designer_code = ((dpidr & ADIV5_DP_DPIDR_DESIGNER_MASK) >> ADIV5_DP_DPIDR_DESIGNER_SHIFT) as u16;
		self.partno = ((dpidr & ADIV5_DP_DPIDR_PARTNO_MASK) >> ADIV5_DP_DPIDR_PARTNO_SHIFT) as u16;

		info!(
			"DP DPIDR 0x{:08x} ({}DPv{}, designer 0x{:03x}, partno 0x{:02x})",
			dpidr,
			if self.minimal { "MIN" } else { "" },
			self.version,
			self.designer_code,
			self.partno,
		);
		Ok(dpidr)
	}

	pub fn version(&self) -> u8
	{
		self.version
	}

	pub fn is_minimal(&self) -> bool
	{
		self.minimal
	}

	pub fn designer_code(&self) -> u16
	{
		self.designer_code
	}

	pub fn partno(&self) -> u16
	{
		self.partno
	}

	/// The DP resource bus address width, valid once discovery has read DPIDR1
	pub fn address_width(&self) -> u8
	{
		self.address_width
	}

	pub(crate) fn set_address_width(&mut self, address_width: u8)
	{
		self.address_width = address_width;
	}

	/// The currently installed AP register access implementation, if any
	pub fn ap_access(&self) -> Option<&'static dyn ApRegisterAccess>
	{
		self.ap_access
	}

	/// Install the AP register access implementation for this DP's ADI version
	pub fn install_ap_access(&mut self, ap_access: &'static dyn ApRegisterAccess)
	{
		debug!("Installing {} AP register access", ap_access.adi_version());
		self.ap_access = Some(ap_access);
	}

	/// Drop any installed AP register access, leaving AP accesses failing until one is installed again
	pub(crate) fn clear_ap_access(&mut self)
	{
		self.ap_access = None;
	}

	/// Get a handle on the AP at `ap_address` on this DP
	pub fn access_port(&mut self, ap_address: TargetAddr64) -> AdiAccessPort<'_>
	{
		AdiAccessPort {
			dp: self,
			ap_address,
		}
	}
}

/// An access port associated with a debug port on a device. This holds the DP for as long as
/// it lives, so no other register sequence can be interleaved with one going through this AP.
pub struct AdiAccessPort<'dp>
{
	/// The debug port this AP is associated with
	dp: &'dp mut AdiDebugPort,
	/// The AP's address on the DP's resource bus (or, for ADIv5, its APSEL)
	ap_address: TargetAddr64,
}

impl<'dp> AdiAccessPort<'dp>
{
	pub fn ap_address(&self) -> TargetAddr64
	{
		self.ap_address
	}

	pub fn dp(&mut self) -> &mut AdiDebugPort
	{
		self.dp
	}

	/// Read the AP register `addr` through the DP's installed AP register access implementation
	pub fn read(&mut self, addr: u16) -> Result<u32>
	{
		let ap_access = self.dp.ap_access.ok_or(AdiError::NoApAccess)?;
		ap_access.ap_read(self.dp, self.ap_address, addr)
	}

	/// Write the AP register `addr` through the DP's installed AP register access implementation
	pub fn write(&mut self, addr: u16, value: u32) -> Result<()>
	{
		let ap_access = self.dp.ap_access.ok_or(AdiError::NoApAccess)?;
		ap_access.ap_write(self.dp, self.ap_address, addr, value)
	}
}
