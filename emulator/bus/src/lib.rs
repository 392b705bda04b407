// Licensed under the Apache-2.0 license

//! Memory-bus abstraction for the emulated SoC. Peripherals implement
//! [`Bus`]; a root bus composes them behind one address decode.

mod ram;

pub use ram::Ram;

use thiserror::Error;

/// An address on the SoC bus.
pub type RvAddr = u32;

/// A data word on the SoC bus.
pub type RvData = u32;

/// Access width of a bus operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RvSize {
    Byte = 1,
    HalfWord = 2,
    Word = 4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum BusError {
    #[error("load access fault")]
    LoadAccessFault,
    #[error("load address misaligned")]
    LoadAddrMisaligned,
    #[error("store access fault")]
    StoreAccessFault,
    #[error("store address misaligned")]
    StoreAddrMisaligned,
}

/// Represents an abstract memory bus. Used to read and write from RAM and
/// peripheral addresses.
pub trait Bus {
    /// Read data of specified size from given address
    ///
    /// # Arguments
    ///
    /// * `size` - Size of the read
    /// * `addr` - Address to read from
    ///
    /// # Error
    ///
    /// * `BusError` - Exception with cause `BusError::LoadAccessFault` or `BusError::LoadAddrMisaligned`
    fn read(&mut self, size: RvSize, addr: RvAddr) -> Result<RvData, BusError>;

    /// Write data of specified size to given address
    ///
    /// # Arguments
    ///
    /// * `size` - Size of the write
    /// * `addr` - Address to write
    /// * `val` - Data to write
    ///
    /// # Error
    ///
    /// * `BusError` - Exception with cause `BusError::StoreAccessFault` or `BusError::StoreAddrMisaligned`
    fn write(&mut self, size: RvSize, addr: RvAddr, val: RvData) -> Result<(), BusError>;

    /// This method is used to notify peripherals of the passage of time. The
    /// owner of this bus MAY call this function periodically.
    fn poll(&mut self) {
        // By default, do nothing
    }
}
