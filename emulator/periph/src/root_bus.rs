/*++

Licensed under the Apache-2.0 license.

File Name:

    root_bus.rs

Abstract:

    File contains the root Bus implementation for the emulated SoC.

--*/

use crate::{CpuDebugBridge, Xadc};
use wishbone_csr::soc::{CSR_CPU_OR_BRIDGE_BASE, CSR_XADC_TEMPERATURE_ADDR, MAIN_RAM_BASE, MAIN_RAM_SIZE};
use wishbone_emu_bus::{Bus, BusError, Ram, RvAddr, RvData, RvSize};

#[derive(Debug, Clone)]
pub struct SocBusOffsets {
    pub ram_offset: u32,
    pub ram_size: u32,
    pub xadc_offset: u32,
    pub debug_offset: u32,
}

impl Default for SocBusOffsets {
    fn default() -> Self {
        Self {
            ram_offset: MAIN_RAM_BASE,
            ram_size: MAIN_RAM_SIZE,
            xadc_offset: CSR_XADC_TEMPERATURE_ADDR,
            debug_offset: CSR_CPU_OR_BRIDGE_BASE,
        }
    }
}

pub struct SocRootBus {
    pub ram: Ram,
    pub xadc: Xadc,
    pub debug: CpuDebugBridge,
    offsets: SocBusOffsets,
}

impl SocRootBus {
    pub fn new(offsets: SocBusOffsets) -> Self {
        let ram = Ram::new(vec![0; offsets.ram_size as usize]);
        Self {
            ram,
            xadc: Xadc::new(),
            debug: CpuDebugBridge::new(),
            offsets,
        }
    }
}

impl Default for SocRootBus {
    fn default() -> Self {
        Self::new(SocBusOffsets::default())
    }
}

impl Bus for SocRootBus {
    fn read(&mut self, size: RvSize, addr: RvAddr) -> Result<RvData, BusError> {
        if addr >= self.offsets.ram_offset && addr < self.offsets.ram_offset + self.offsets.ram_size
        {
            return self.ram.read(size, addr - self.offsets.ram_offset);
        }
        if addr >= self.offsets.xadc_offset
            && addr < self.offsets.xadc_offset + self.xadc.mmap_size()
        {
            return self.xadc.read(size, addr - self.offsets.xadc_offset);
        }
        if addr >= self.offsets.debug_offset
            && addr < self.offsets.debug_offset + self.debug.mmap_size()
        {
            return self.debug.read(size, addr - self.offsets.debug_offset);
        }
        Err(BusError::LoadAccessFault)
    }

    fn write(&mut self, size: RvSize, addr: RvAddr, val: RvData) -> Result<(), BusError> {
        if addr >= self.offsets.ram_offset && addr < self.offsets.ram_offset + self.offsets.ram_size
        {
            return self.ram.write(size, addr - self.offsets.ram_offset, val);
        }
        if addr >= self.offsets.xadc_offset
            && addr < self.offsets.xadc_offset + self.xadc.mmap_size()
        {
            return self.xadc.write(size, addr - self.offsets.xadc_offset, val);
        }
        if addr >= self.offsets.debug_offset
            && addr < self.offsets.debug_offset + self.debug.mmap_size()
        {
            return self.debug.write(size, addr - self.offsets.debug_offset, val);
        }
        Err(BusError::StoreAccessFault)
    }

    fn poll(&mut self) {
        self.debug.poll();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use wishbone_csr::debug::{cmd, CoreStatus, CORE_ID};
    use wishbone_csr::soc::{
        CSR_CPU_OR_BRIDGE_DEBUG_CORE, CSR_CPU_OR_BRIDGE_DEBUG_PACKET_COUNTER,
    };
    use wishbone_csr::xadc::temperature_celsius;

    #[test]
    fn decodes_ram_at_its_window() {
        let mut bus = SocRootBus::default();
        bus.write(RvSize::Word, MAIN_RAM_BASE + 0x100, 0xcafe_f00d).unwrap();
        assert_eq!(
            bus.read(RvSize::Word, MAIN_RAM_BASE + 0x100).unwrap(),
            0xcafe_f00d
        );
        // The backing store observed the same bytes.
        assert_eq!(bus.ram.data()[0x100], 0x0d);
    }

    #[test]
    fn decodes_the_xadc_temperature_register() {
        let mut bus = SocRootBus::default();
        let raw = bus.read(RvSize::Word, CSR_XADC_TEMPERATURE_ADDR).unwrap();
        assert!((20.0..60.0).contains(&temperature_celsius(raw)));
    }

    #[test]
    fn decodes_the_debug_block() {
        let mut bus = SocRootBus::default();
        let status = CoreStatus(bus.read(RvSize::Word, CSR_CPU_OR_BRIDGE_DEBUG_CORE).unwrap());
        assert_eq!(status.core_id(), CORE_ID);

        bus.write(RvSize::Word, CSR_CPU_OR_BRIDGE_DEBUG_CORE, cmd::HALT).unwrap();
        assert!(bus.debug.halted());
        assert_eq!(
            bus.read(RvSize::Word, CSR_CPU_OR_BRIDGE_DEBUG_PACKET_COUNTER)
                .unwrap(),
            1
        );
    }

    #[test]
    fn unmapped_addresses_fault() {
        let mut bus = SocRootBus::default();
        assert_eq!(
            bus.read(RvSize::Word, 0x1000_0000),
            Err(BusError::LoadAccessFault)
        );
        assert_eq!(
            bus.write(RvSize::Word, 0xe000_7000, 0),
            Err(BusError::StoreAccessFault)
        );
    }

    #[test]
    fn polling_advances_the_running_core() {
        let mut bus = SocRootBus::default();
        let before = bus.debug.pc();
        bus.poll();
        bus.poll();
        assert_eq!(bus.debug.pc(), before + 8);
    }
}
