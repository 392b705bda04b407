/*++

Licensed under the Apache-2.0 license.

File Name:

    gdb_target.rs

Abstract:

    File contains gdb_target module for the Wishbone debug bridge.

--*/

use gdbstub::arch::SingleStepGdbBehavior;
use gdbstub::common::Signal;
use gdbstub::stub::SingleThreadStopReason;
use gdbstub::target;
use gdbstub::target::ext::base::singlethread::{SingleThreadBase, SingleThreadResume};
use gdbstub::target::ext::base::BaseOps;
use gdbstub::target::Target;
use gdbstub::target::TargetError;
use gdbstub::target::TargetResult;
use gdbstub_arch;
use wishbone_bridge::{DebugController, DebugCtlError};
use wishbone_csr::debug::REG_PC;

pub enum ExecMode {
    Step,
    Continue,
}

/// GDB view of the remote core behind the debug bridge. Register traffic
/// goes through the debug block; memory traffic goes straight through the
/// bridge as word accesses.
pub struct GdbTarget {
    ctl: DebugController,
    exec_mode: ExecMode,
    breakpoints: Vec<u32>,
}

impl GdbTarget {
    // Create new instance of GdbTarget
    pub fn new(ctl: DebugController) -> Self {
        Self {
            ctl,
            exec_mode: ExecMode::Continue,
            breakpoints: Vec::new(),
        }
    }

    pub fn controller(&self) -> &DebugController {
        &self.ctl
    }

    /// One quantum of the run loop: step once in step mode, otherwise
    /// check whether the core stopped on its own.
    pub fn poll_stop(&mut self) -> Result<Option<SingleThreadStopReason<u32>>, &'static str> {
        match self.exec_mode {
            ExecMode::Step => {
                self.ctl.step().map_err(|_| "step command failed")?;
                Ok(Some(SingleThreadStopReason::DoneStep))
            }
            ExecMode::Continue => {
                if self.ctl.halted().map_err(|_| "status read failed")? {
                    let pc = self.ctl.pc().map_err(|_| "pc read failed")?;
                    if self.breakpoints.contains(&pc) {
                        Ok(Some(SingleThreadStopReason::SwBreak(())))
                    } else {
                        Ok(Some(SingleThreadStopReason::Signal(Signal::SIGTRAP)))
                    }
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Halt on client interrupt (Ctrl-C in gdb).
    pub fn interrupt(&mut self) -> Result<(), &'static str> {
        self.exec_mode = ExecMode::Continue;
        self.ctl.halt().map_err(|_| "halt command failed")
    }
}

impl Target for GdbTarget {
    type Arch = gdbstub_arch::riscv::Riscv32;
    type Error = &'static str;

    fn base_ops(&mut self) -> BaseOps<Self::Arch, Self::Error> {
        BaseOps::SingleThread(self)
    }

    fn guard_rail_implicit_sw_breakpoints(&self) -> bool {
        true
    }

    fn guard_rail_single_step_gdb_behavior(&self) -> SingleStepGdbBehavior {
        SingleStepGdbBehavior::Optional
    }

    fn support_breakpoints(
        &mut self,
    ) -> Option<target::ext::breakpoints::BreakpointsOps<'_, Self>> {
        Some(self)
    }
}

impl SingleThreadBase for GdbTarget {
    fn read_registers(
        &mut self,
        regs: &mut gdbstub_arch::riscv::reg::RiscvCoreRegs<u32>,
    ) -> TargetResult<(), Self> {
        regs.pc = self
            .ctl
            .read_register(REG_PC)
            .map_err(|_| TargetError::Fatal("register read failed"))?;
        for idx in 0..regs.x.len() {
            regs.x[idx] = self
                .ctl
                .read_register(idx as u32)
                .map_err(|_| TargetError::Fatal("register read failed"))?;
        }
        Ok(())
    }

    fn write_registers(
        &mut self,
        regs: &gdbstub_arch::riscv::reg::RiscvCoreRegs<u32>,
    ) -> TargetResult<(), Self> {
        self.ctl
            .write_register(REG_PC, regs.pc)
            .map_err(|_| TargetError::Fatal("register write failed"))?;
        for idx in 0..regs.x.len() {
            self.ctl
                .write_register(idx as u32, regs.x[idx])
                .map_err(|_| TargetError::Fatal("register write failed"))?;
        }
        Ok(())
    }

    fn read_addrs(&mut self, start_addr: u32, data: &mut [u8]) -> TargetResult<(), Self> {
        let bridge = self.ctl.bridge();
        let mut cached: Option<(u32, u32)> = None;
        for (addr, val) in (start_addr..).zip(data.iter_mut()) {
            let aligned = addr & !3;
            let word = match cached {
                Some((cached_addr, word)) if cached_addr == aligned => word,
                _ => {
                    let word = bridge
                        .peek(aligned)
                        .map_err(|_| TargetError::Fatal("bridge read failed"))?;
                    cached = Some((aligned, word));
                    word
                }
            };
            *val = (word >> (8 * (addr & 3))) as u8;
        }
        Ok(())
    }

    fn write_addrs(&mut self, start_addr: u32, data: &[u8]) -> TargetResult<(), Self> {
        let bridge = self.ctl.bridge();
        let mut pending: Option<(u32, u32)> = None;
        for (addr, val) in (start_addr..).zip(data.iter().copied()) {
            let aligned = addr & !3;
            let mut word = match pending {
                Some((pending_addr, word)) if pending_addr == aligned => word,
                Some((pending_addr, word)) => {
                    bridge
                        .poke(pending_addr, word)
                        .map_err(|_| TargetError::Fatal("bridge write failed"))?;
                    bridge
                        .peek(aligned)
                        .map_err(|_| TargetError::Fatal("bridge read failed"))?
                }
                None => bridge
                    .peek(aligned)
                    .map_err(|_| TargetError::Fatal("bridge read failed"))?,
            };
            let shift = 8 * (addr & 3);
            word = (word & !(0xff << shift)) | ((val as u32) << shift);
            pending = Some((aligned, word));
        }
        if let Some((pending_addr, word)) = pending {
            bridge
                .poke(pending_addr, word)
                .map_err(|_| TargetError::Fatal("bridge write failed"))?;
        }
        Ok(())
    }

    fn support_resume(
        &mut self,
    ) -> Option<target::ext::base::singlethread::SingleThreadResumeOps<'_, Self>> {
        Some(self)
    }
}

impl target::ext::base::singlethread::SingleThreadSingleStep for GdbTarget {
    fn step(&mut self, signal: Option<Signal>) -> Result<(), Self::Error> {
        if signal.is_some() {
            return Err("no support for stepping with signal");
        }

        self.exec_mode = ExecMode::Step;

        Ok(())
    }
}

impl SingleThreadResume for GdbTarget {
    fn resume(&mut self, signal: Option<Signal>) -> Result<(), Self::Error> {
        if signal.is_some() {
            return Err("no support for continuing with signal");
        }

        self.exec_mode = ExecMode::Continue;
        self.ctl.resume().map_err(|_| "resume command failed")
    }

    #[inline(always)]
    fn support_single_step(
        &mut self,
    ) -> Option<target::ext::base::singlethread::SingleThreadSingleStepOps<'_, Self>> {
        Some(self)
    }
}

impl target::ext::breakpoints::Breakpoints for GdbTarget {
    #[inline(always)]
    fn support_sw_breakpoint(
        &mut self,
    ) -> Option<target::ext::breakpoints::SwBreakpointOps<'_, Self>> {
        Some(self)
    }
}

impl target::ext::breakpoints::SwBreakpoint for GdbTarget {
    fn add_sw_breakpoint(&mut self, addr: u32, _kind: usize) -> TargetResult<bool, Self> {
        if self.breakpoints.contains(&addr) {
            return Ok(true);
        }
        match self.ctl.set_breakpoint(addr) {
            Ok(()) => {
                self.breakpoints.push(addr);
                Ok(true)
            }
            // All hardware slots in use; let the client report it.
            Err(DebugCtlError::CommandRejected(_)) => Ok(false),
            Err(_) => Err(TargetError::Fatal("breakpoint command failed")),
        }
    }

    fn remove_sw_breakpoint(&mut self, addr: u32, _kind: usize) -> TargetResult<bool, Self> {
        match self.breakpoints.iter().position(|x| *x == addr) {
            None => return Ok(false),
            Some(pos) => self.breakpoints.remove(pos),
        };
        self.ctl
            .clear_breakpoint(addr)
            .map_err(|_| TargetError::Fatal("breakpoint command failed"))?;
        Ok(true)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use wishbone_bridge::Bridge;
    use wishbone_csr::debug::BREAKPOINT_SLOTS;
    use wishbone_csr::soc::MAIN_RAM_BASE;

    fn halted_target() -> GdbTarget {
        let bridge = Bridge::emulated();
        let ctl = DebugController::new(&bridge).unwrap();
        ctl.halt().unwrap();
        GdbTarget::new(ctl)
    }

    #[test]
    fn registers_round_trip_through_the_gdb_view() {
        let mut target = halted_target();
        let mut regs = gdbstub_arch::riscv::reg::RiscvCoreRegs::<u32>::default();
        regs.pc = 0x100;
        for (idx, x) in regs.x.iter_mut().enumerate() {
            *x = idx as u32 * 3;
        }
        target.write_registers(&regs).ok().unwrap();

        let mut readback = gdbstub_arch::riscv::reg::RiscvCoreRegs::<u32>::default();
        target.read_registers(&mut readback).ok().unwrap();
        assert_eq!(readback.pc, 0x100);
        // x0 reads back as zero no matter what was written.
        assert_eq!(readback.x[0], 0);
        assert_eq!(readback.x[1..], regs.x[1..]);
    }

    #[test]
    fn memory_access_handles_unaligned_spans() {
        let mut target = halted_target();
        let data: Vec<u8> = (0u8..11).collect();
        target.write_addrs(MAIN_RAM_BASE + 5, &data).ok().unwrap();

        let mut readback = vec![0u8; 11];
        target.read_addrs(MAIN_RAM_BASE + 5, &mut readback).ok().unwrap();
        assert_eq!(readback, data);

        // Bytes around the span are untouched.
        let mut edges = vec![0u8; 2];
        target.read_addrs(MAIN_RAM_BASE + 4, &mut edges[..1]).ok().unwrap();
        target.read_addrs(MAIN_RAM_BASE + 16, &mut edges[1..]).ok().unwrap();
        assert_eq!(edges, vec![0, 0]);
    }

    #[test]
    fn step_mode_reports_done_step() {
        use gdbstub::target::ext::base::singlethread::SingleThreadSingleStep;

        let mut target = halted_target();
        let pc = target.controller().pc().unwrap();
        SingleThreadSingleStep::step(&mut target, None).unwrap();
        assert!(matches!(
            target.poll_stop().unwrap(),
            Some(SingleThreadStopReason::DoneStep)
        ));
        assert_eq!(target.controller().pc().unwrap(), pc + 4);
    }

    #[test]
    fn breakpoints_exhaust_the_hardware_slots() {
        use gdbstub::target::ext::breakpoints::SwBreakpoint;

        let mut target = halted_target();
        for i in 0..BREAKPOINT_SLOTS as u32 {
            assert!(target.add_sw_breakpoint(0x1000 + 4 * i, 4).ok().unwrap());
        }
        // Re-adding an armed address is idempotent.
        assert!(target.add_sw_breakpoint(0x1000, 4).ok().unwrap());
        // One more unique address does not fit.
        assert!(!target.add_sw_breakpoint(0x2000, 4).ok().unwrap());

        assert!(target.remove_sw_breakpoint(0x1000, 4).ok().unwrap());
        assert!(!target.remove_sw_breakpoint(0x1000, 4).ok().unwrap());
        assert!(target.add_sw_breakpoint(0x2000, 4).ok().unwrap());
    }

    #[test]
    fn continue_mode_reports_the_breakpoint_stop() {
        use gdbstub::target::ext::breakpoints::SwBreakpoint;

        let mut target = halted_target();
        target.controller().reset().unwrap();
        assert!(target.add_sw_breakpoint(32, 4).ok().unwrap());
        SingleThreadResume::resume(&mut target, None).unwrap();

        let mut stop = None;
        for _ in 0..100 {
            if let Some(reason) = target.poll_stop().unwrap() {
                stop = Some(reason);
                break;
            }
        }
        assert!(matches!(stop, Some(SingleThreadStopReason::SwBreak(()))));
    }
}
