/*++

Licensed under the Apache-2.0 license.

File Name:

    xadc.rs

Abstract:

    File contains the XADC temperature sensor device implementation.

--*/

use wishbone_csr::xadc::temperature_code;
use wishbone_emu_bus::{Bus, BusError, RvAddr, RvData, RvSize};

pub struct Xadc {
    temperature: RvData,
}

impl Xadc {
    /// Temperature Register
    const ADDR_TEMPERATURE: RvAddr = 0x0000_0000;

    pub fn new() -> Self {
        Self {
            // A believable on-die temperature for an idle part.
            temperature: temperature_code(35.0),
        }
    }

    /// Override the reported raw temperature code.
    pub fn set_temperature_code(&mut self, code: RvData) {
        self.temperature = code & 0xfff;
    }

    /// Memory map size.
    pub fn mmap_size(&self) -> RvAddr {
        4
    }
}

impl Default for Xadc {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for Xadc {
    fn read(&mut self, size: RvSize, addr: RvAddr) -> Result<RvData, BusError> {
        match (size, addr) {
            (RvSize::Word, Xadc::ADDR_TEMPERATURE) => Ok(self.temperature),
            _ => Err(BusError::LoadAccessFault),
        }
    }

    // The sensor block is read-only.
    fn write(&mut self, _size: RvSize, _addr: RvAddr, _val: RvData) -> Result<(), BusError> {
        Err(BusError::StoreAccessFault)
    }
}
