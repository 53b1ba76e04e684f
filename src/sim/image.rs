// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025 1BitSquared <info@1bitsquared.com>

use std::collections::BTreeMap;
use std::fmt::{self, Formatter};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use color_eyre::eyre::{Context, Result};
use log::info;
use serde::de::{Error as DeError, Visitor};
use serde::{Deserialize, Deserializer};

use crate::sim::SimulatedDebugPort;

/// A register value given either as a JSON number or as a (possibly `0x` prefixed) hex string
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct HexValue(pub u64);

struct HexValueVisitor;

impl<'de> Visitor<'de> for HexValueVisitor
{
	type Value = HexValue;

	fn expecting(&self, formatter: &mut Formatter) -> fmt::Result
	{
		formatter.write_str("an integer or a hex string")
	}

	fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
	where
		E: DeError,
	{
		Ok(HexValue(value))
	}

	fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
	where
		E: DeError,
	{
		let digits = value
			.strip_prefix("0x")
			.or_else(|| value.strip_prefix("0X"))
			.unwrap_or(value)
			.replace('_', "");
		u64::from_str_radix(&digits, 16)
			.map(HexValue)
			.map_err(|_| E::custom(format!("invalid hex value '{}'", value)))
	}
}

impl<'de> Deserialize<'de> for HexValue
{
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		deserializer.deserialize_any(HexValueVisitor)
	}
}

impl HexValue
{
	fn as_u32(self) -> u32
	{
		self.0 as u32
	}
}

#[derive(Deserialize)]
pub struct ComponentImage
{
	pub address: HexValue,
	pub cidr: HexValue,
}

/// The description of a simulated DP, as read from a JSON file
#[derive(Deserialize)]
pub struct RegisterImage
{
	#[serde(default)]
	pub dpidr: Option<HexValue>,
	pub dpidr1: HexValue,
	pub baseptr0: HexValue,
	#[serde(default)]
	pub baseptr1: Option<HexValue>,
	#[serde(default, rename = "apRegisters")]
	pub ap_registers: BTreeMap<HexValue, HexValue>,
	#[serde(default)]
	pub components: Vec<ComponentImage>,
}

impl RegisterImage
{
	pub fn from_path(path: &Path) -> Result<Self>
	{
		let file = File::open(path).wrap_err_with(|| format!("Failed to open register image {}", path.display()))?;
		let image: RegisterImage = serde_json::from_reader(BufReader::new(file))
			.wrap_err_with(|| format!("Failed to parse register image {}", path.display()))?;
		info!(
			"Loaded register image with {} AP registers and {} components",
			image.ap_registers.len(),
			image.components.len()
		);
		Ok(image)
	}
}

impl From<&RegisterImage> for SimulatedDebugPort
{
	fn from(image: &RegisterImage) -> Self
	{
		let mut sim = SimulatedDebugPort::new()
			.with_dpidr(image.dpidr.map_or(0, HexValue::as_u32))
			.with_dpidr1(image.dpidr1.as_u32())
			.with_base_pointer(image.baseptr0.as_u32(), image.baseptr1.map_or(0, HexValue::as_u32));
		for component in &image.components {
			sim = sim.with_component(component.address.0, component.cidr.as_u32());
		}
		for (address, value) in &image.ap_registers {
			sim = sim.with_ap_register(address.0, value.as_u32());
		}
		sim
	}
}
