// Licensed under the Apache-2.0 license

//! Emulated peripherals of the target SoC: the XADC temperature sensor and
//! the `cpu_or_bridge` debug block, composed behind a root bus.

mod cpu_debug;
mod root_bus;
mod xadc;

pub use cpu_debug::CpuDebugBridge;
pub use root_bus::{SocBusOffsets, SocRootBus};
pub use xadc::Xadc;
