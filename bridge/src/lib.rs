// Licensed under the Apache-2.0 license

//! Host-side access to the SoC bus. A [`Bridge`] hands out word-wide
//! peek/poke over some transport; transports serialize access internally,
//! so handles are cheap to clone and safe to hand to other threads.

mod debug;
mod emulated;
pub mod etherbone;
mod ethernet;

pub use debug::{DebugController, DebugCtlError};
pub use emulated::EmulatedBridge;
pub use ethernet::EthernetBridge;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("bridge is not connected")]
    NotConnected,
    #[error("access fault at address {0:#010x}")]
    AccessFault(u32),
    #[error("unexpected response from target")]
    WrongResponse,
    #[error("etherbone magic bytes missing")]
    NoMagic,
    #[error("unsupported etherbone address or port width")]
    UnsupportedWidth,
    #[error("connection closed by peer")]
    ConnectionClosed,
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// A handle onto the SoC bus.
#[derive(Clone)]
pub enum Bridge {
    /// In-process emulated SoC.
    Emulated(EmulatedBridge),

    /// Etherbone over TCP.
    Ethernet(EthernetBridge),
}

impl Bridge {
    /// An emulated SoC with the default memory map.
    pub fn emulated() -> Self {
        Bridge::Emulated(EmulatedBridge::default())
    }

    pub fn ethernet(host: &str, port: u16) -> Self {
        Bridge::Ethernet(EthernetBridge::new(host, port))
    }

    pub fn connect(&self) -> Result<(), BridgeError> {
        match self {
            Bridge::Emulated(b) => b.connect(),
            Bridge::Ethernet(b) => b.connect(),
        }
    }

    /// Read one bus word.
    pub fn peek(&self, addr: u32) -> Result<u32, BridgeError> {
        match self {
            Bridge::Emulated(b) => b.peek(addr),
            Bridge::Ethernet(b) => b.peek(addr),
        }
    }

    /// Write one bus word.
    pub fn poke(&self, addr: u32, value: u32) -> Result<(), BridgeError> {
        match self {
            Bridge::Emulated(b) => b.poke(addr, value),
            Bridge::Ethernet(b) => b.poke(addr, value),
        }
    }

    /// Read `count` consecutive words starting at `addr`.
    pub fn burst_read(&self, addr: u32, count: u32) -> Result<Vec<u32>, BridgeError> {
        match self {
            Bridge::Emulated(b) => b.burst_read(addr, count),
            Bridge::Ethernet(b) => b.burst_read(addr, count),
        }
    }

    /// Write consecutive words starting at `addr`.
    pub fn burst_write(&self, addr: u32, values: &[u32]) -> Result<(), BridgeError> {
        match self {
            Bridge::Emulated(b) => b.burst_write(addr, values),
            Bridge::Ethernet(b) => b.burst_write(addr, values),
        }
    }
}
