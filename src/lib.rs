// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025 1BitSquared <info@1bitsquared.com>

pub mod adi;
pub mod error;
pub mod sim;

pub use adi::adiv5::ADIV5_AP_ACCESS;
pub use adi::adiv6::ADIV6_AP_ACCESS;
pub use adi::component::{ComponentClass, ComponentEntry};
pub use adi::{AdiAccessPort, AdiDebugPort, ApRegisterAccess, DpTransport};
pub use error::{AdiError, DiscoveryError};
