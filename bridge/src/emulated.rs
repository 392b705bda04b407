// Licensed under the Apache-2.0 license

use crate::BridgeError;
use std::sync::{Arc, Mutex};
use wishbone_emu_periph::SocRootBus;
use wishbone_emu_bus::{Bus, RvSize};

/// Transport backed by the in-process emulated SoC. One bus access equals
/// one polled bus clock, which keeps the modeled core's progress
/// deterministic under test.
#[derive(Clone)]
pub struct EmulatedBridge {
    bus: Arc<Mutex<SocRootBus>>,
}

impl EmulatedBridge {
    pub fn new(bus: SocRootBus) -> Self {
        Self {
            bus: Arc::new(Mutex::new(bus)),
        }
    }

    pub fn connect(&self) -> Result<(), BridgeError> {
        Ok(())
    }

    pub fn peek(&self, addr: u32) -> Result<u32, BridgeError> {
        let mut bus = self.bus.lock().unwrap();
        let result = bus.read(RvSize::Word, addr);
        bus.poll();
        result.map_err(|_| BridgeError::AccessFault(addr))
    }

    pub fn poke(&self, addr: u32, value: u32) -> Result<(), BridgeError> {
        let mut bus = self.bus.lock().unwrap();
        let result = bus.write(RvSize::Word, addr, value);
        bus.poll();
        result.map_err(|_| BridgeError::AccessFault(addr))
    }

    pub fn burst_read(&self, addr: u32, count: u32) -> Result<Vec<u32>, BridgeError> {
        let mut bus = self.bus.lock().unwrap();
        let mut values = Vec::with_capacity(count as usize);
        for i in 0..count {
            let word = addr.wrapping_add(4 * i);
            let result = bus.read(RvSize::Word, word);
            bus.poll();
            values.push(result.map_err(|_| BridgeError::AccessFault(word))?);
        }
        Ok(values)
    }

    pub fn burst_write(&self, addr: u32, values: &[u32]) -> Result<(), BridgeError> {
        let mut bus = self.bus.lock().unwrap();
        for (i, value) in values.iter().enumerate() {
            let word = addr.wrapping_add(4 * i as u32);
            let result = bus.write(RvSize::Word, word, *value);
            bus.poll();
            result.map_err(|_| BridgeError::AccessFault(word))?;
        }
        Ok(())
    }
}

impl Default for EmulatedBridge {
    fn default() -> Self {
        Self::new(SocRootBus::default())
    }
}
