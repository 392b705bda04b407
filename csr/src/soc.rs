// Licensed under the Apache-2.0 license

//! CSR addresses for the target SoC, mirroring the `csr.h` the SoC build
//! emits alongside the gateware. Keep these in sync with the bitstream
//! actually loaded on the board.

use crate::map::{AccessMode, CsrConstant, CsrMap, CsrRegion};

pub const CSR_XADC_TEMPERATURE_ADDR: u32 = 0xe000_5800;

/* cpu_or_bridge */
pub const CSR_CPU_OR_BRIDGE_BASE: u32 = 0xe000_6000;

pub const CSR_CPU_OR_BRIDGE_DEBUG_CORE: u32 = 0xe000_6000;
pub const CSR_CPU_OR_BRIDGE_DEBUG_DATA: u32 = 0xe000_6004;
pub const CSR_CPU_OR_BRIDGE_DEBUG_SYNC: u32 = 0xe000_6008;
pub const CSR_CPU_OR_BRIDGE_DEBUG_PACKET_COUNTER: u32 = 0xe000_600c;

/// Main RAM window of the SoC.
pub const MAIN_RAM_BASE: u32 = 0x4000_0000;
pub const MAIN_RAM_SIZE: u32 = 0x0002_0000;

/// The built-in map, for symbolic lookup when no `csr.csv` is supplied.
pub fn soc_map() -> CsrMap {
    let xadc = CsrRegion {
        name: Some("xadc".to_string()),
        constants: vec![CsrConstant::with_mode(
            "CSR_XADC_TEMPERATURE_ADDR",
            CSR_XADC_TEMPERATURE_ADDR,
            AccessMode::ReadOnly,
        )],
    };
    let bridge = CsrRegion {
        name: Some("cpu_or_bridge".to_string()),
        constants: vec![
            CsrConstant::new("CSR_CPU_OR_BRIDGE_BASE", CSR_CPU_OR_BRIDGE_BASE),
            CsrConstant::with_mode(
                "CSR_CPU_OR_BRIDGE_DEBUG_CORE",
                CSR_CPU_OR_BRIDGE_DEBUG_CORE,
                AccessMode::ReadWrite,
            ),
            CsrConstant::with_mode(
                "CSR_CPU_OR_BRIDGE_DEBUG_DATA",
                CSR_CPU_OR_BRIDGE_DEBUG_DATA,
                AccessMode::ReadWrite,
            ),
            CsrConstant::with_mode(
                "CSR_CPU_OR_BRIDGE_DEBUG_SYNC",
                CSR_CPU_OR_BRIDGE_DEBUG_SYNC,
                AccessMode::ReadWrite,
            ),
            CsrConstant::with_mode(
                "CSR_CPU_OR_BRIDGE_DEBUG_PACKET_COUNTER",
                CSR_CPU_OR_BRIDGE_DEBUG_PACKET_COUNTER,
                AccessMode::ReadOnly,
            ),
        ],
    };
    CsrMap {
        regions: vec![xadc, bridge],
    }
}
