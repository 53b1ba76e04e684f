// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025 1BitSquared <info@1bitsquared.com>

#[cfg(test)]
mod tests
{
    use std::sync::{Arc, Mutex};
    use std::thread;

    use color_eyre::eyre::Result;
    use bmd_adiv6::adi::{ADIV5_APNDP, ADIV5_DP_SELECT};
    use bmd_adiv6::adi::adiv6::validate_base_address;
    use bmd_adiv6::adi::select::ap_register_address;
    use bmd_adiv6::sim::{SimulatedDebugPort, Transaction};
    use bmd_adiv6::{ADIV5_AP_ACCESS, ADIV6_AP_ACCESS, AdiDebugPort, AdiError, ComponentClass, DiscoveryError};

    fn debug_port(sim: SimulatedDebugPort) -> (Arc<SimulatedDebugPort>, AdiDebugPort)
    {
        let sim = Arc::new(sim);
        let dp = AdiDebugPort::new(sim.clone());
        (sim, dp)
    }

    #[test]
    fn discovers_rom_table_root() -> Result<()>
    {
        let (sim, mut dp) = debug_port(
            SimulatedDebugPort::new()
                .with_dpidr1(40)
                .with_base_pointer(0x0000_1001, 0)
                .with_component(0x1000, 0xb105_100d),
        );

        assert!(dp.init()?);
        assert_eq!(dp.address_width(), 40);
        assert!(dp.ap_access().is_some());

        let transactions = sim.take_transactions();
        assert_eq!(&transactions[..6], &[
            Transaction::Write(ADIV5_DP_SELECT, 1),
            Transaction::Read(0x0, 40),
            Transaction::Write(ADIV5_DP_SELECT, 2),
            Transaction::Read(0x0, 0x0000_1001),
            Transaction::Write(ADIV5_DP_SELECT, 3),
            Transaction::Read(0x0, 0),
        ]);
        // The CIDR block is read through the AP window, one register per byte
        assert_eq!(&transactions[6..9], &[
            Transaction::Write(ADIV5_DP_SELECT, 5),
            Transaction::Write(0x4, 0),
            Transaction::Write(ADIV5_DP_SELECT, 0x1ff0),
        ]);
        assert_eq!(&transactions[9..], &[
            Transaction::Read(ADIV5_APNDP, 0x0d),
            Transaction::Read(ADIV5_APNDP | 0x4, 0x10),
            Transaction::Read(ADIV5_APNDP | 0x8, 0x05),
            Transaction::Read(ADIV5_APNDP | 0xc, 0xb1),
        ]);
        Ok(())
    }

    #[test]
    fn root_entry_above_4gib() -> Result<()>
    {
        let (_, mut dp) = debug_port(
            SimulatedDebugPort::new()
                .with_dpidr1(40)
                .with_base_pointer(0x8000_0003, 0x1)
                .with_component(0x1_8000_0000, 0xb105_900d),
        );

        let entry = dp.discover()?;
        assert_eq!(entry.entry, 0);
        assert_eq!(entry.address, 0x1_8000_0000);
        assert_eq!(entry.cidr, 0xb105_900d);
        assert_eq!(entry.class, ComponentClass::CoreSight);
        assert_eq!(entry.to_string(), "0 0x180000000: 0xb105900d CoreSight component");
        Ok(())
    }

    #[test]
    fn no_valid_base_address() -> Result<()>
    {
        let (sim, mut dp) = debug_port(
            SimulatedDebugPort::new()
                .with_dpidr1(32)
                .with_base_pointer(0x0000_1000, 0)
                .with_component(0x1000, 0xb105_100d),
        );

        assert!(!dp.init()?);
        assert!(dp.ap_access().is_none());

        // Nothing goes out on the wire after BASEPTR1 has been read
        let transactions = sim.take_transactions();
        assert_eq!(transactions.len(), 6);
        assert_eq!(transactions.last(), Some(&Transaction::Read(0x0, 0)));

        let error = dp.discover().unwrap_err();
        assert_eq!(error.downcast_ref::<DiscoveryError>(), Some(&DiscoveryError::NoValidBaseAddress));
        Ok(())
    }

    #[test]
    fn failed_rediscovery_removes_ap_access() -> Result<()>
    {
        let (sim, mut dp) = debug_port(
            SimulatedDebugPort::new()
                .with_dpidr1(32)
                .with_base_pointer(0x0000_1000, 0)
                .with_component(0x1000, 0xb105_100d),
        );
        dp.install_ap_access(&ADIV6_AP_ACCESS);

        assert!(!dp.init()?);
        assert!(dp.ap_access().is_none());
        sim.take_transactions();

        // The AP access is refused without anything reaching the wire
        let error = dp.access_port(0x1000).read(ap_register_address(0xff0)).unwrap_err();
        assert!(matches!(error.downcast_ref::<AdiError>(), Some(AdiError::NoApAccess)));
        assert!(sim.transactions().is_empty());
        Ok(())
    }

    #[test]
    fn base_address_beyond_address_width() -> Result<()>
    {
        let (sim, mut dp) = debug_port(
            SimulatedDebugPort::new()
                .with_dpidr1(40)
                .with_base_pointer(0x0000_1001, 0x100)
                .with_component(0x100_0000_1000, 0xb105_100d),
        );

        assert!(!dp.init()?);
        assert!(dp.ap_access().is_none());
        assert_eq!(sim.take_transactions().len(), 6);

        let error = dp.discover().unwrap_err();
        assert_eq!(error.downcast_ref::<DiscoveryError>(), Some(&DiscoveryError::BaseAddressOutOfRange {
            high: 0x100,
            low: 0x0000_1001,
            address_width: 40,
        }));
        Ok(())
    }

    #[test]
    fn full_width_bus_accepts_any_address()
    {
        assert_eq!(validate_base_address(0xffff_ffff_ffff_f001, 64), Ok(0xffff_ffff_ffff_f000));
        assert_eq!(validate_base_address(0x0000_0000_0000_2001, 12), Err(DiscoveryError::BaseAddressOutOfRange {
            high: 0,
            low: 0x2001,
            address_width: 12,
        }));
    }

    #[test]
    fn preamble_mismatch() -> Result<()>
    {
        let (_, mut dp) = debug_port(
            SimulatedDebugPort::new()
                .with_dpidr1(32)
                .with_base_pointer(0x0000_2001, 0)
                .with_component(0x2000, 0xb105_100e),
        );

        assert!(!dp.init()?);
        assert!(dp.ap_access().is_none());

        let error = dp.discover().unwrap_err();
        assert_eq!(error.downcast_ref::<DiscoveryError>(), Some(&DiscoveryError::PreambleMismatch {
            entry: 0,
            high: 0,
            low: 0x2000,
            cidr: 0xb105_100e,
            expected: 0xb105_000d,
        }));
        assert_eq!(
            error.to_string(),
            "0 0x000002000: 0xb105100e <- does not match preamble (0xb105000d)"
        );
        Ok(())
    }

    #[test]
    fn empty_bus_is_not_a_component() -> Result<()>
    {
        let (_, mut dp) = debug_port(SimulatedDebugPort::new().with_dpidr1(32).with_base_pointer(0x0000_3001, 0));

        assert!(!dp.init()?);
        assert!(dp.ap_access().is_none());
        Ok(())
    }

    #[test]
    fn link_failure_is_not_a_discovery_failure()
    {
        // The BASEPTR0 read is the fourth transaction
        let (_, mut dp) = debug_port(
            SimulatedDebugPort::new()
                .with_dpidr1(40)
                .with_base_pointer(0x0000_1001, 0)
                .with_component(0x1000, 0xb105_100d)
                .failing_after(3),
        );

        let error = dp.init().unwrap_err();
        assert!(error.downcast_ref::<DiscoveryError>().is_none());
        assert!(dp.ap_access().is_none());
    }

    #[test]
    fn link_failure_during_component_probe()
    {
        let (_, mut dp) = debug_port(
            SimulatedDebugPort::new()
                .with_dpidr1(40)
                .with_base_pointer(0x0000_1001, 0)
                .with_component(0x1000, 0xb105_100d)
                .failing_after(10),
        );

        // Ten transactions gets through the base pointers and the first CIDR read
        assert!(dp.init().is_err());
        assert!(dp.ap_access().is_none());
    }

    #[test]
    fn ap_access_after_discovery() -> Result<()>
    {
        let (sim, mut dp) = debug_port(
            SimulatedDebugPort::new()
                .with_dpidr1(40)
                .with_base_pointer(0x0000_1001, 0)
                .with_component(0x1000, 0xb105_100d)
                .with_ap_register(0x80_0000_2d00, 0x2300_0052),
        );
        assert!(dp.init()?);
        sim.take_transactions();

        let csw = ap_register_address(0xd00);
        let mut ap = dp.access_port(0x80_0000_2000);
        assert_eq!(ap.read(csw)?, 0x2300_0052);
        ap.write(ap_register_address(0xd04), 0x2000_0000)?;
        assert_eq!(sim.ap_register(0x80_0000_2d04), Some(0x2000_0000));

        assert_eq!(sim.take_transactions(), vec![
            Transaction::Write(ADIV5_DP_SELECT, 5),
            Transaction::Write(0x4, 0x80),
            Transaction::Write(ADIV5_DP_SELECT, 0x0000_2d00),
            Transaction::Read(csw, 0x2300_0052),
            Transaction::Write(ADIV5_DP_SELECT, 5),
            Transaction::Write(0x4, 0x80),
            Transaction::Write(ADIV5_DP_SELECT, 0x0000_2d00),
            Transaction::Write(ap_register_address(0xd04), 0x2000_0000),
        ]);
        Ok(())
    }

    #[test]
    fn ap_access_needs_initialisation()
    {
        let (sim, mut dp) = debug_port(SimulatedDebugPort::new());
        let error = dp.access_port(0x1000).read(ap_register_address(0xd00)).unwrap_err();
        assert!(matches!(error.downcast_ref::<AdiError>(), Some(AdiError::NoApAccess)));
        assert!(sim.transactions().is_empty());
    }

    #[test]
    fn adiv5_dp_uses_apsel() -> Result<()>
    {
        let (sim, mut dp) = debug_port(
            SimulatedDebugPort::new()
                .with_dpidr(0x2ba0_1477)
                .with_ap_register(0x0100_00f0, 0x0000_0001),
        );
        dp.read_dpidr()?;
        assert_eq!(dp.version(), 1);
        dp.install_ap_access(&ADIV5_AP_ACCESS);
        sim.take_transactions();

        assert_eq!(dp.access_port(1).read(ADIV5_APNDP | 0xf0)?, 1);
        assert_eq!(sim.take_transactions(), vec![
            Transaction::Write(ADIV5_DP_SELECT, 0x0100_00f0),
            Transaction::Read(ADIV5_APNDP | 0xf0, 1),
        ]);
        Ok(())
    }

    #[test]
    fn shared_between_threads() -> Result<()>
    {
        let (sim, mut dp) = debug_port(
            SimulatedDebugPort::new()
                .with_dpidr1(40)
                .with_base_pointer(0x0000_1001, 0)
                .with_component(0x1000, 0xb105_100d),
        );
        assert!(dp.init()?);
        let dp = Arc::new(Mutex::new(dp));

        let workers: Vec<_> = (0..4u32)
            .map(|index| {
                let dp = dp.clone();
                thread::spawn(move || -> Result<()> {
                    let mut dp = dp.lock().unwrap();
                    let ap_address = u64::from(index + 1) << 32;
                    dp.access_port(ap_address).write(ap_register_address(0x004), index)
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap()?;
        }

        for index in 0..4u32 {
            assert_eq!(sim.ap_register((u64::from(index + 1) << 32) | 0x4), Some(index));
        }
        Ok(())
    }
}
