// Licensed under the Apache-2.0 license

use crate::{Bus, BusError, RvAddr, RvData, RvSize};

/// Byte-addressable little-endian memory.
pub struct Ram {
    data: Vec<u8>,
}

impl Ram {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> RvAddr {
        self.data.len() as RvAddr
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn check(&self, size: RvSize, addr: RvAddr, misaligned: BusError, fault: BusError) -> Result<usize, BusError> {
        if addr % size as RvAddr != 0 {
            return Err(misaligned);
        }
        let start = addr as usize;
        let end = start + size as usize;
        if end > self.data.len() {
            return Err(fault);
        }
        Ok(start)
    }
}

impl Bus for Ram {
    fn read(&mut self, size: RvSize, addr: RvAddr) -> Result<RvData, BusError> {
        let start = self.check(
            size,
            addr,
            BusError::LoadAddrMisaligned,
            BusError::LoadAccessFault,
        )?;
        let mut val: RvData = 0;
        for (i, byte) in self.data[start..start + size as usize].iter().enumerate() {
            val |= (*byte as RvData) << (8 * i);
        }
        Ok(val)
    }

    fn write(&mut self, size: RvSize, addr: RvAddr, val: RvData) -> Result<(), BusError> {
        let start = self.check(
            size,
            addr,
            BusError::StoreAddrMisaligned,
            BusError::StoreAccessFault,
        )?;
        for (i, byte) in self.data[start..start + size as usize].iter_mut().enumerate() {
            *byte = (val >> (8 * i)) as u8;
        }
        Ok(())
    }
}
