// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025 1BitSquared <info@1bitsquared.com>

//! A debug port that only exists in memory.
//!
//! This models just enough of an ADIv6 DP to run discovery and AP accesses against: the banked
//! DP identification and base pointer registers, SELECT and SELECT1, and a sparse 64-bit
//! resource bus that AP window accesses land on. Every transaction is logged so the exact
//! sequence of register accesses can be inspected afterwards.

pub mod image;

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use color_eyre::eyre::{Result, eyre};
use log::trace;

use crate::adi::component::CIDR0_OFFSET;
use crate::adi::select::{DpBank, combine_wide_address};
use crate::adi::{
	ADIV5_APNDP, ADIV5_DP_CTRLSTAT, ADIV5_DP_DPIDR, ADIV5_DP_RDBUFF, ADIV5_DP_SELECT, ADIV6_DP_BASEPTR0, ADIV6_DP_BASEPTR1,
	ADIV6_DP_DPIDR1, ADIV6_DP_SELECT1, DpTransport, TargetAddr64,
};

/// One register access as seen on the wire: the raw register address and the value
/// written, or read back
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transaction
{
	Read(u16, u32),
	Write(u16, u32),
}

const SELECT_DPBANKSEL_MASK: u32 = 0x0000000f;
const SELECT_ADDR_MASK: u32 = 0xfffffff0;
const WINDOW_REG_MASK: u16 = 0x000c;

#[derive(Default)]
struct SimState
{
	dpidr: u32,
	dpidr1: u32,
	baseptr0: u32,
	baseptr1: u32,
	ctrlstat: u32,

	select: u32,
	select1: u32,
	rdbuff: u32,

	/// The resource bus, word addressed by full 64-bit address
	ap_registers: BTreeMap<TargetAddr64, u32>,
	transactions: Vec<Transaction>,
	/// Make the transport fail once this many transactions have completed
	fail_after: Option<usize>,
}

#[derive(Default)]
pub struct SimulatedDebugPort
{
	state: Mutex<SimState>,
}

impl SimulatedDebugPort
{
	pub fn new() -> Self
	{
		Self::default()
	}

	pub fn with_dpidr(self, dpidr: u32) -> Self
	{
		self.state().dpidr = dpidr;
		self
	}

	pub fn with_dpidr1(self, dpidr1: u32) -> Self
	{
		self.state().dpidr1 = dpidr1;
		self
	}

	pub fn with_base_pointer(self, baseptr0: u32, baseptr1: u32) -> Self
	{
		{
			let mut state = self.state();
			state.baseptr0 = baseptr0;
			state.baseptr1 = baseptr1;
		}
		self
	}

	/// Place a register value on the resource bus
	pub fn with_ap_register(self, address: TargetAddr64, value: u32) -> Self
	{
		self.state().ap_registers.insert(address, value);
		self
	}

	/// Place a component with the given CIDR at `address`, spreading it over CIDR0..3
	pub fn with_component(self, address: TargetAddr64, cidr: u32) -> Self
	{
		{
			let mut state = self.state();
			for index in 0..4u32 {
				let register = address + TargetAddr64::from(CIDR0_OFFSET) + TargetAddr64::from(index * 4);
				state.ap_registers.insert(register, (cidr >> (index * 8)) & 0xff);
			}
		}
		self
	}

	/// Make every transaction after the first `count` fail as though the link dropped
	pub fn failing_after(self, count: usize) -> Self
	{
		self.state().fail_after = Some(count);
		self
	}

	fn state(&self) -> MutexGuard<'_, SimState>
	{
		self.state.lock().unwrap()
	}

	/// All the transactions seen so far
	pub fn transactions(&self) -> Vec<Transaction>
	{
		self.state().transactions.clone()
	}

	/// All the transactions seen so far, clearing the log
	pub fn take_transactions(&self) -> Vec<Transaction>
	{
		std::mem::take(&mut self.state().transactions)
	}

	/// The value of a register on the resource bus, if it's ever been set
	pub fn ap_register(&self, address: TargetAddr64) -> Option<u32>
	{
		self.state().ap_registers.get(&address).copied()
	}
}

impl SimState
{
	fn dp_bank(&self) -> DpBank
	{
		DpBank((self.select & SELECT_DPBANKSEL_MASK) as u8)
	}

	/// Where on the resource bus an AP window access to `addr` goes
	fn ap_address(&self, addr: u16) -> TargetAddr64
	{
		combine_wide_address(self.select & SELECT_ADDR_MASK, self.select1) | TargetAddr64::from(addr & WINDOW_REG_MASK)
	}

	fn check_link(&self) -> Result<()>
	{
		match self.fail_after {
			Some(count) if self.transactions.len() >= count => Err(eyre!("Simulated link failure")),
			_ => Ok(()),
		}
	}

	fn read(&mut self, addr: u16) -> Result<u32>
	{
		self.check_link()?;
		let value = if addr & ADIV5_APNDP != 0 {
			let address = self.ap_address(addr);
			let value = self.ap_registers.get(&address).copied().unwrap_or(0);
			trace!("Resource bus read 0x{:016x} -> 0x{:08x}", address, value);
			self.rdbuff = value;
			value
		} else {
			match (addr & WINDOW_REG_MASK, self.dp_bank()) {
				(ADIV5_DP_DPIDR, DpBank::BANK0) => self.dpidr,
				(ADIV6_DP_DPIDR1, DpBank::DPIDR1) => self.dpidr1,
				(ADIV6_DP_BASEPTR0, DpBank::BASEPTR0) => self.baseptr0,
				(ADIV6_DP_BASEPTR1, DpBank::BASEPTR1) => self.baseptr1,
				(ADIV6_DP_SELECT1, DpBank::SELECT1) => self.select1,
				(ADIV5_DP_CTRLSTAT, DpBank::BANK0) => self.ctrlstat,
				(ADIV5_DP_RDBUFF, _) => self.rdbuff,
				_ => 0,
			}
		};
		self.transactions.push(Transaction::Read(addr, value));
		Ok(value)
	}

	fn write(&mut self, addr: u16, value: u32) -> Result<()>
	{
		self.check_link()?;
		if addr & ADIV5_APNDP != 0 {
			let address = self.ap_address(addr);
			trace!("Resource bus write 0x{:016x} <- 0x{:08x}", address, value);
			self.ap_registers.insert(address, value);
		} else {
			match (addr & WINDOW_REG_MASK, self.dp_bank()) {
				(ADIV6_DP_SELECT1, DpBank::SELECT1) => self.select1 = value,
				(ADIV5_DP_CTRLSTAT, DpBank::BANK0) => self.ctrlstat = value,
				(ADIV5_DP_SELECT, _) => self.select = value,
				// ABORT and TARGETSEL have nothing to act on here
				_ => {},
			}
		}
		self.transactions.push(Transaction::Write(addr, value));
		Ok(())
	}
}

impl DpTransport for SimulatedDebugPort
{
	fn dp_read(&self, addr: u16) -> Result<u32>
	{
		self.state().read(addr)
	}

	fn dp_write(&self, addr: u16, value: u32) -> Result<()>
	{
		self.state().write(addr, value)
	}
}
