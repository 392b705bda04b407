// Licensed under the Apache-2.0 license

//! Host-side controller for the `cpu_or_bridge` debug block. Works over
//! any [`Bridge`], so the same sequences drive the emulated SoC and a
//! remote one behind the Etherbone server.

use crate::{Bridge, BridgeError};
use log::trace;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use wishbone_csr::debug::{cmd, CoreStatus, SyncStatus, CORE_ID, REG_COUNT, REG_PC};
use wishbone_csr::soc::{
    CSR_CPU_OR_BRIDGE_DEBUG_CORE, CSR_CPU_OR_BRIDGE_DEBUG_DATA,
    CSR_CPU_OR_BRIDGE_DEBUG_PACKET_COUNTER, CSR_CPU_OR_BRIDGE_DEBUG_SYNC,
};

#[derive(Debug, Error)]
pub enum DebugCtlError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error("target does not identify as a debug core (status {0:#010x})")]
    UnknownCore(u32),
    #[error("debug command {0:#010x} was rejected")]
    CommandRejected(u32),
    #[error("timed out waiting for the debug handshake")]
    SyncTimeout,
    #[error("register index {0} out of range")]
    BadRegister(u32),
}

pub struct DebugController {
    bridge: Bridge,
}

impl DebugController {
    /// Handshake polls before a command is declared lost.
    const SYNC_RETRIES: u32 = 1000;

    /// Attach to the debug block and verify its identification word.
    pub fn new(bridge: &Bridge) -> Result<Self, DebugCtlError> {
        let status = CoreStatus(bridge.peek(CSR_CPU_OR_BRIDGE_DEBUG_CORE)?);
        if status.core_id() != CORE_ID {
            return Err(DebugCtlError::UnknownCore(status.0));
        }
        Ok(Self {
            bridge: bridge.clone(),
        })
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    /// Issue one command and wait out the completion handshake.
    fn command(&self, command: u32) -> Result<(), DebugCtlError> {
        trace!("debug command {command:#010x}");
        self.bridge.poke(CSR_CPU_OR_BRIDGE_DEBUG_CORE, command)?;
        for _ in 0..Self::SYNC_RETRIES {
            let sync = SyncStatus(self.bridge.peek(CSR_CPU_OR_BRIDGE_DEBUG_SYNC)?);
            if sync.ready() {
                self.bridge.poke(CSR_CPU_OR_BRIDGE_DEBUG_SYNC, 0)?;
                if sync.error() {
                    return Err(DebugCtlError::CommandRejected(command));
                }
                return Ok(());
            }
            thread::sleep(Duration::from_micros(50));
        }
        Err(DebugCtlError::SyncTimeout)
    }

    pub fn halt(&self) -> Result<(), DebugCtlError> {
        self.command(cmd::HALT)
    }

    pub fn resume(&self) -> Result<(), DebugCtlError> {
        self.command(cmd::RESUME)
    }

    pub fn step(&self) -> Result<(), DebugCtlError> {
        self.command(cmd::STEP)
    }

    pub fn reset(&self) -> Result<(), DebugCtlError> {
        self.command(cmd::RESET)
    }

    pub fn halted(&self) -> Result<bool, DebugCtlError> {
        let status = CoreStatus(self.bridge.peek(CSR_CPU_OR_BRIDGE_DEBUG_CORE)?);
        Ok(status.halted())
    }

    /// Read one debugger-visible register (x0..x31, then the pc).
    pub fn read_register(&self, index: u32) -> Result<u32, DebugCtlError> {
        if index >= REG_COUNT {
            return Err(DebugCtlError::BadRegister(index));
        }
        self.bridge.poke(CSR_CPU_OR_BRIDGE_DEBUG_DATA, index)?;
        self.command(cmd::REG_READ)?;
        Ok(self.bridge.peek(CSR_CPU_OR_BRIDGE_DEBUG_DATA)?)
    }

    pub fn write_register(&self, index: u32, value: u32) -> Result<(), DebugCtlError> {
        if index >= REG_COUNT {
            return Err(DebugCtlError::BadRegister(index));
        }
        self.bridge.poke(CSR_CPU_OR_BRIDGE_DEBUG_DATA, index)?;
        self.command(cmd::REG_SELECT)?;
        self.bridge.poke(CSR_CPU_OR_BRIDGE_DEBUG_DATA, value)?;
        self.command(cmd::REG_WRITE)
    }

    pub fn pc(&self) -> Result<u32, DebugCtlError> {
        self.read_register(REG_PC)
    }

    pub fn set_breakpoint(&self, addr: u32) -> Result<(), DebugCtlError> {
        self.bridge.poke(CSR_CPU_OR_BRIDGE_DEBUG_DATA, addr)?;
        self.command(cmd::BP_SET)
    }

    pub fn clear_breakpoint(&self, addr: u32) -> Result<(), DebugCtlError> {
        self.bridge.poke(CSR_CPU_OR_BRIDGE_DEBUG_DATA, addr)?;
        self.command(cmd::BP_CLEAR)
    }

    /// Debug packets the block has processed since reset.
    pub fn packet_count(&self) -> Result<u32, DebugCtlError> {
        Ok(self.bridge.peek(CSR_CPU_OR_BRIDGE_DEBUG_PACKET_COUNTER)?)
    }
}
