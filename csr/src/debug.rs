// Licensed under the Apache-2.0 license

//! Layout of the `cpu_or_bridge` debug registers, shared between the host
//! controller and the emulated peripheral.
//!
//! DEBUG_CORE accepts one command word per write and reports the status
//! word on read. DEBUG_DATA is the operand/result window for commands that
//! carry a value. DEBUG_SYNC is the completion handshake for the last
//! command: `ready` once it finished, `error` if it was rejected; writing
//! any value acknowledges the handshake. DEBUG_PACKET_COUNTER counts every
//! command packet the block processed and wraps at 32 bits.

use bitfield::bitfield;

/// Identification value in the upper half of the DEBUG_CORE status word.
pub const CORE_ID: u16 = 0x5742;

/// Register index of the program counter; x0..x31 precede it.
pub const REG_PC: u32 = 32;
/// Number of debugger-visible registers.
pub const REG_COUNT: u32 = 33;
/// Hardware breakpoint slots the block provides.
pub const BREAKPOINT_SLOTS: usize = 4;

bitfield! {
    /// DEBUG_CORE read view.
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct CoreStatus(u32);
    impl Debug;
    pub halted, set_halted: 0;
    pub u16, core_id, set_core_id: 31, 16;
}

bitfield! {
    /// DEBUG_SYNC read view.
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct SyncStatus(u32);
    impl Debug;
    pub ready, set_ready: 0;
    pub error, set_error: 1;
}

/// Command words accepted by DEBUG_CORE.
pub mod cmd {
    /// Halt the core.
    pub const HALT: u32 = 0x0000_0001;
    /// Resume the core.
    pub const RESUME: u32 = 0x0000_0002;
    /// Execute one instruction; only valid while halted.
    pub const STEP: u32 = 0x0000_0004;
    /// Reset the core; it stays halted at the reset vector.
    pub const RESET: u32 = 0x0000_0008;
    /// Replace DEBUG_DATA (a register index) with that register's value.
    pub const REG_READ: u32 = 0x0000_0010;
    /// Latch DEBUG_DATA as the register index for a later REG_WRITE.
    pub const REG_SELECT: u32 = 0x0000_0020;
    /// Write DEBUG_DATA to the register latched by REG_SELECT.
    pub const REG_WRITE: u32 = 0x0000_0040;
    /// Arm a hardware breakpoint at the address in DEBUG_DATA.
    pub const BP_SET: u32 = 0x0000_0080;
    /// Disarm the hardware breakpoint at the address in DEBUG_DATA.
    pub const BP_CLEAR: u32 = 0x0000_0100;
}
