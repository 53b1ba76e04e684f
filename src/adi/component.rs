// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025 1BitSquared <info@1bitsquared.com>

use std::fmt::{self, Display, Formatter};

use crate::adi::TargetAddr64;

/// Offset of CIDR0 in a component's 4KiB identification block, CIDR1..3 follow on every 4 bytes
pub const CIDR0_OFFSET: u16 = 0xff0;

/// The fixed bits of a CIDR, everything but the component class nibble
pub const CID_PREAMBLE: u32 = 0xb105000d;
pub const CID_CLASS_MASK: u32 = 0x0000f000;
pub const CID_CLASS_SHIFT: u32 = 12;

/// Rebuild a CIDR from the four CIDRn register values, each of which only holds one byte of it
pub fn assemble_cidr(cidrs: [u32; 4]) -> u32
{
	cidrs
		.iter()
		.enumerate()
		.fold(0, |result, (index, value)| result | ((value & 0xff) << (index * 8)))
}

/// Check a CIDR for the preamble that marks a CoreSight style component
pub fn cidr_preamble_valid(cidr: u32) -> bool
{
	(cidr & !CID_CLASS_MASK) == CID_PREAMBLE
}

/// The component class nibble of a CIDR
pub fn cidr_class(cidr: u32) -> u8
{
	((cidr & CID_CLASS_MASK) >> CID_CLASS_SHIFT) as u8
}

/// The class of a component, as given by its CIDR
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentClass
{
	GenericVerification,
	RomTable,
	CoreSight,
	PeripheralTestBlock,
	GenericIp,
	CoreLinkPrimeCellOrSystem,
	Reserved(u8),
}

impl From<u8> for ComponentClass
{
	fn from(class: u8) -> Self
	{
		match class {
			0x0 => Self::GenericVerification,
			0x1 => Self::RomTable,
			0x9 => Self::CoreSight,
			0xb => Self::PeripheralTestBlock,
			0xe => Self::GenericIp,
			0xf => Self::CoreLinkPrimeCellOrSystem,
			class => Self::Reserved(class),
		}
	}
}

impl Display for ComponentClass
{
	fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result
	{
		match self {
			Self::GenericVerification => write!(fmt, "Generic verification component"),
			Self::RomTable => write!(fmt, "ROM table"),
			Self::CoreSight => write!(fmt, "CoreSight component"),
			Self::PeripheralTestBlock => write!(fmt, "Peripheral test block"),
			Self::GenericIp => write!(fmt, "Generic IP component"),
			Self::CoreLinkPrimeCellOrSystem => write!(fmt, "CoreLink, PrimeCell or system component"),
			Self::Reserved(class) => write!(fmt, "Reserved class 0x{:x}", class),
		}
	}
}

/// A validated and classified entry in the debug component tree
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComponentEntry
{
	/// Which entry this is, the root being entry 0
	pub entry: u32,
	/// Where on the DP's resource bus the component lives
	pub address: TargetAddr64,
	/// The raw CIDR value read back for the component
	pub cidr: u32,
	pub class: ComponentClass,
}

impl ComponentEntry
{
	pub fn new(entry: u32, address: TargetAddr64, cidr: u32) -> Self
	{
		Self {
			entry,
			address,
			cidr,
			class: cidr_class(cidr).into(),
		}
	}
}

impl Display for ComponentEntry
{
	fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result
	{
		write!(
			fmt,
			"{} 0x{:x}{:08x}: 0x{:08x} {}",
			self.entry,
			(self.address >> 32) as u32,
			self.address as u32,
			self.cidr,
			self.class
		)
	}
}
