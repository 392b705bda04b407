/*++

Licensed under the Apache-2.0 license.

File Name:

    cpu_debug.rs

Abstract:

    File contains the cpu_or_bridge debug block implementation.

--*/

use wishbone_csr::debug::{cmd, CoreStatus, SyncStatus, BREAKPOINT_SLOTS, CORE_ID, REG_COUNT, REG_PC};
use wishbone_csr::soc::{
    CSR_CPU_OR_BRIDGE_BASE, CSR_CPU_OR_BRIDGE_DEBUG_CORE, CSR_CPU_OR_BRIDGE_DEBUG_DATA,
    CSR_CPU_OR_BRIDGE_DEBUG_PACKET_COUNTER, CSR_CPU_OR_BRIDGE_DEBUG_SYNC,
};
use wishbone_emu_bus::{Bus, BusError, RvAddr, RvData, RvSize};

/// Debug access port of the SoC CPU. Commands arrive through DEBUG_CORE,
/// operands and results move through the DEBUG_DATA window, and completion
/// is reported through the DEBUG_SYNC handshake. The modeled core advances
/// one instruction word per bus clock while running and halts itself when
/// the pc lands on an armed breakpoint.
pub struct CpuDebugBridge {
    xregs: [RvData; 32],
    pc: RvData,
    halted: bool,
    data: RvData,
    selected: RvData,
    sync: RvData,
    packet_counter: RvData,
    breakpoints: [Option<RvData>; BREAKPOINT_SLOTS],
}

impl CpuDebugBridge {
    /// Core control/identification Register
    const ADDR_CORE: RvAddr = CSR_CPU_OR_BRIDGE_DEBUG_CORE - CSR_CPU_OR_BRIDGE_BASE;

    /// Data transfer Register
    const ADDR_DATA: RvAddr = CSR_CPU_OR_BRIDGE_DEBUG_DATA - CSR_CPU_OR_BRIDGE_BASE;

    /// Synchronization/handshake Register
    const ADDR_SYNC: RvAddr = CSR_CPU_OR_BRIDGE_DEBUG_SYNC - CSR_CPU_OR_BRIDGE_BASE;

    /// Packet counter Register
    const ADDR_PACKET_COUNTER: RvAddr =
        CSR_CPU_OR_BRIDGE_DEBUG_PACKET_COUNTER - CSR_CPU_OR_BRIDGE_BASE;

    const RESET_VECTOR: RvData = 0;

    pub fn new() -> Self {
        Self {
            xregs: [0; 32],
            pc: Self::RESET_VECTOR,
            halted: false,
            data: 0,
            selected: 0,
            sync: 0,
            packet_counter: 0,
            breakpoints: [None; BREAKPOINT_SLOTS],
        }
    }

    /// Memory map size.
    pub fn mmap_size(&self) -> RvAddr {
        0x10
    }

    pub fn halted(&self) -> bool {
        self.halted
    }

    pub fn pc(&self) -> RvData {
        self.pc
    }

    fn status(&self) -> RvData {
        let mut status = CoreStatus(0);
        status.set_halted(self.halted);
        status.set_core_id(CORE_ID);
        status.0
    }

    fn execute(&mut self, command: RvData) {
        self.packet_counter = self.packet_counter.wrapping_add(1);
        let ok = match command {
            cmd::HALT => {
                self.halted = true;
                true
            }
            cmd::RESUME => {
                self.halted = false;
                true
            }
            cmd::STEP => {
                if self.halted {
                    self.advance();
                    true
                } else {
                    false
                }
            }
            cmd::RESET => {
                self.xregs = [0; 32];
                self.pc = Self::RESET_VECTOR;
                self.selected = 0;
                self.halted = true;
                true
            }
            cmd::REG_READ => self.reg_read(),
            cmd::REG_SELECT => {
                self.selected = self.data;
                true
            }
            cmd::REG_WRITE => self.reg_write(),
            cmd::BP_SET => self.breakpoint_set(),
            cmd::BP_CLEAR => {
                for slot in self.breakpoints.iter_mut() {
                    if *slot == Some(self.data) {
                        *slot = None;
                    }
                }
                true
            }
            _ => false,
        };
        let mut sync = SyncStatus(0);
        sync.set_ready(true);
        sync.set_error(!ok);
        self.sync = sync.0;
    }

    // Register file access is only legal while the core is halted.
    fn reg_read(&mut self) -> bool {
        if !self.halted || self.data >= REG_COUNT {
            return false;
        }
        self.data = match self.data {
            REG_PC => self.pc,
            0 => 0,
            idx => self.xregs[idx as usize],
        };
        true
    }

    fn reg_write(&mut self) -> bool {
        if !self.halted || self.selected >= REG_COUNT {
            return false;
        }
        match self.selected {
            REG_PC => self.pc = self.data,
            // x0 is hardwired to zero; writes are accepted and ignored.
            0 => {}
            idx => self.xregs[idx as usize] = self.data,
        }
        true
    }

    fn breakpoint_set(&mut self) -> bool {
        if self.breakpoints.contains(&Some(self.data)) {
            return true;
        }
        match self.breakpoints.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => {
                *slot = Some(self.data);
                true
            }
            None => false,
        }
    }

    fn advance(&mut self) {
        self.pc = self.pc.wrapping_add(4);
        if self.breakpoints.contains(&Some(self.pc)) {
            self.halted = true;
        }
    }
}

impl Default for CpuDebugBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for CpuDebugBridge {
    fn read(&mut self, size: RvSize, addr: RvAddr) -> Result<RvData, BusError> {
        match (size, addr) {
            (RvSize::Word, Self::ADDR_CORE) => Ok(self.status()),
            (RvSize::Word, Self::ADDR_DATA) => Ok(self.data),
            (RvSize::Word, Self::ADDR_SYNC) => Ok(self.sync),
            (RvSize::Word, Self::ADDR_PACKET_COUNTER) => Ok(self.packet_counter),
            _ => Err(BusError::LoadAccessFault),
        }
    }

    fn write(&mut self, size: RvSize, addr: RvAddr, val: RvData) -> Result<(), BusError> {
        match (size, addr) {
            (RvSize::Word, Self::ADDR_CORE) => self.execute(val),
            (RvSize::Word, Self::ADDR_DATA) => self.data = val,
            // Any write acknowledges the handshake.
            (RvSize::Word, Self::ADDR_SYNC) => self.sync = 0,
            _ => Err(BusError::StoreAccessFault)?,
        }
        Ok(())
    }

    fn poll(&mut self) {
        if !self.halted {
            self.advance();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sync_of(bridge: &mut CpuDebugBridge) -> SyncStatus {
        SyncStatus(bridge.read(RvSize::Word, CpuDebugBridge::ADDR_SYNC).unwrap())
    }

    fn command(bridge: &mut CpuDebugBridge, cmd: RvData) -> SyncStatus {
        bridge.write(RvSize::Word, CpuDebugBridge::ADDR_CORE, cmd).unwrap();
        let sync = sync_of(bridge);
        assert!(sync.ready());
        bridge.write(RvSize::Word, CpuDebugBridge::ADDR_SYNC, 0).unwrap();
        sync
    }

    fn set_data(bridge: &mut CpuDebugBridge, val: RvData) {
        bridge.write(RvSize::Word, CpuDebugBridge::ADDR_DATA, val).unwrap();
    }

    fn data_of(bridge: &mut CpuDebugBridge) -> RvData {
        bridge.read(RvSize::Word, CpuDebugBridge::ADDR_DATA).unwrap()
    }

    #[test]
    fn status_word_carries_core_id_and_halt_flag() {
        let mut bridge = CpuDebugBridge::new();
        let status = CoreStatus(bridge.read(RvSize::Word, 0).unwrap());
        assert_eq!(status.core_id(), CORE_ID);
        assert!(!status.halted());

        command(&mut bridge, cmd::HALT);
        let status = CoreStatus(bridge.read(RvSize::Word, 0).unwrap());
        assert!(status.halted());
    }

    #[test]
    fn registers_read_back_what_was_written() {
        let mut bridge = CpuDebugBridge::new();
        command(&mut bridge, cmd::HALT);

        set_data(&mut bridge, 5);
        assert!(!command(&mut bridge, cmd::REG_SELECT).error());
        set_data(&mut bridge, 0xdead_beef);
        assert!(!command(&mut bridge, cmd::REG_WRITE).error());

        set_data(&mut bridge, 5);
        assert!(!command(&mut bridge, cmd::REG_READ).error());
        assert_eq!(data_of(&mut bridge), 0xdead_beef);
    }

    #[test]
    fn x0_reads_as_zero_even_after_a_write() {
        let mut bridge = CpuDebugBridge::new();
        command(&mut bridge, cmd::HALT);

        set_data(&mut bridge, 0);
        command(&mut bridge, cmd::REG_SELECT);
        set_data(&mut bridge, 0x1234);
        assert!(!command(&mut bridge, cmd::REG_WRITE).error());

        set_data(&mut bridge, 0);
        command(&mut bridge, cmd::REG_READ);
        assert_eq!(data_of(&mut bridge), 0);
    }

    #[test]
    fn register_access_is_rejected_while_running() {
        let mut bridge = CpuDebugBridge::new();
        set_data(&mut bridge, 1);
        assert!(command(&mut bridge, cmd::REG_READ).error());
    }

    #[test]
    fn out_of_range_register_indices_are_rejected() {
        let mut bridge = CpuDebugBridge::new();
        command(&mut bridge, cmd::HALT);
        set_data(&mut bridge, REG_COUNT);
        assert!(command(&mut bridge, cmd::REG_READ).error());
    }

    #[test]
    fn unknown_commands_set_the_error_flag() {
        let mut bridge = CpuDebugBridge::new();
        assert!(command(&mut bridge, 0x8000_0000).error());
    }

    #[test]
    fn step_advances_the_pc_by_one_word() {
        let mut bridge = CpuDebugBridge::new();
        command(&mut bridge, cmd::HALT);
        let pc = bridge.pc();
        command(&mut bridge, cmd::STEP);
        assert_eq!(bridge.pc(), pc + 4);
        assert!(bridge.halted());
    }

    #[test]
    fn step_is_rejected_while_running() {
        let mut bridge = CpuDebugBridge::new();
        assert!(command(&mut bridge, cmd::STEP).error());
    }

    #[test]
    fn core_halts_when_the_pc_reaches_a_breakpoint() {
        let mut bridge = CpuDebugBridge::new();
        command(&mut bridge, cmd::HALT);
        set_data(&mut bridge, 16);
        assert!(!command(&mut bridge, cmd::BP_SET).error());
        command(&mut bridge, cmd::RESUME);

        for _ in 0..8 {
            bridge.poll();
        }
        assert!(bridge.halted());
        assert_eq!(bridge.pc(), 16);
    }

    #[test]
    fn breakpoint_slots_are_bounded() {
        let mut bridge = CpuDebugBridge::new();
        for addr in 0..BREAKPOINT_SLOTS as RvData {
            set_data(&mut bridge, 0x100 + 4 * addr);
            assert!(!command(&mut bridge, cmd::BP_SET).error());
        }
        set_data(&mut bridge, 0x200);
        assert!(command(&mut bridge, cmd::BP_SET).error());

        // Clearing one slot frees it up again.
        set_data(&mut bridge, 0x100);
        assert!(!command(&mut bridge, cmd::BP_CLEAR).error());
        set_data(&mut bridge, 0x200);
        assert!(!command(&mut bridge, cmd::BP_SET).error());
    }

    #[test]
    fn reset_leaves_the_core_halted_at_the_reset_vector() {
        let mut bridge = CpuDebugBridge::new();
        for _ in 0..4 {
            bridge.poll();
        }
        assert_ne!(bridge.pc(), 0);
        command(&mut bridge, cmd::RESET);
        assert!(bridge.halted());
        assert_eq!(bridge.pc(), 0);
    }

    #[test]
    fn packet_counter_counts_accepted_and_rejected_commands() {
        let mut bridge = CpuDebugBridge::new();
        let before = bridge
            .read(RvSize::Word, CpuDebugBridge::ADDR_PACKET_COUNTER)
            .unwrap();
        command(&mut bridge, cmd::HALT);
        command(&mut bridge, 0x8000_0000);
        let after = bridge
            .read(RvSize::Word, CpuDebugBridge::ADDR_PACKET_COUNTER)
            .unwrap();
        assert_eq!(after, before + 2);
    }

    #[test]
    fn packet_counter_is_read_only() {
        let mut bridge = CpuDebugBridge::new();
        assert_eq!(
            bridge.write(RvSize::Word, CpuDebugBridge::ADDR_PACKET_COUNTER, 0),
            Err(BusError::StoreAccessFault)
        );
    }

    #[test]
    fn sub_word_accesses_fault() {
        let mut bridge = CpuDebugBridge::new();
        assert_eq!(
            bridge.read(RvSize::Byte, CpuDebugBridge::ADDR_CORE),
            Err(BusError::LoadAccessFault)
        );
        assert_eq!(
            bridge.write(RvSize::HalfWord, CpuDebugBridge::ADDR_DATA, 0),
            Err(BusError::StoreAccessFault)
        );
    }
}
