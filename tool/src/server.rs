/*++

Licensed under the Apache-2.0 license.

File Name:

    server.rs

Abstract:

    File contains the server dispatch for the Wishbone debug bridge tool.

--*/

use crate::config::Config;
use crate::gdb;
use crate::wishbone::{WishboneServer, WishboneServerError};
use crate::RUNNING;
use log::{error, info, warn};
use rand::prelude::*;
use std::io;
use std::sync::atomic::Ordering;
use thiserror::Error;
use wishbone_bridge::{Bridge, BridgeError, DebugController, DebugCtlError};
use wishbone_csr::soc::{CSR_XADC_TEMPERATURE_ADDR, MAIN_RAM_BASE};
use wishbone_csr::xadc::temperature_celsius;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Wishbone(#[from] WishboneServerError),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error(transparent)]
    DebugCtl(#[from] DebugCtlError),
    #[error("random test failed at loop {loops}: expected {expected:08x}, observed {observed:08x}")]
    RandomValue {
        loops: u32,
        expected: u32,
        observed: u32,
    },
}

/// Serve GDB clients one after another until the tool is stopped.
pub fn gdb_server(cfg: &Config, bridge: &Bridge) -> Result<(), ServerError> {
    while RUNNING.load(Ordering::Relaxed) {
        let ctl = DebugController::new(bridge)?;
        // Quiesce the core so the client attaches to a stable target.
        ctl.halt()?;
        let mut target = gdb::gdb_target::GdbTarget::new(ctl);
        let connection = gdb::gdb_state::wait_for_tcp(&cfg.bind_addr, cfg.bind_port)?;
        gdb::gdb_state::run(&mut target, connection);
    }
    Ok(())
}

pub fn wishbone_server(cfg: &Config, bridge: &Bridge) -> Result<(), ServerError> {
    let mut server = WishboneServer::bind(&cfg.bind_addr, cfg.bind_port)?;
    while RUNNING.load(Ordering::Relaxed) {
        server.connect()?;
        loop {
            if let Err(e) = server.process(bridge) {
                match e {
                    WishboneServerError::ConnectionClosed => info!("client disconnected"),
                    e => error!("error in Wishbone server: {:?}", e),
                }
                break;
            }
        }
    }
    Ok(())
}

/// Hammer a scratch address with random values and verify every readback.
pub fn random_test(cfg: &Config, bridge: &Bridge) -> Result<(), ServerError> {
    let mut loop_counter: u32 = 0;
    let random_addr = cfg.random_address.unwrap_or(MAIN_RAM_BASE + 8192);
    info!("writing random values to 0x{:08x}", random_addr);
    while RUNNING.load(Ordering::Relaxed) {
        let val = random::<u32>();
        bridge.poke(random_addr, val)?;
        let cmp = bridge.peek(random_addr)?;
        if cmp != val {
            error!(
                "loop {}: expected {:08x}, got {:08x}",
                loop_counter, val, cmp
            );
            return Err(ServerError::RandomValue {
                loops: loop_counter,
                expected: val,
                observed: cmp,
            });
        }
        if (loop_counter % 1000) == 0 {
            info!("loop: {} ({:08x})", loop_counter, val);
        }
        loop_counter = loop_counter.wrapping_add(1);
        if let Some(max_loops) = cfg.random_loops {
            if loop_counter > max_loops {
                info!("no errors encountered");
                return Ok(());
            }
        }
    }
    Ok(())
}

/// One-shot memory access: poke when a value was given, peek otherwise.
pub fn memory_access(cfg: &Config, bridge: &Bridge) -> Result<(), ServerError> {
    if let Some(addr) = cfg.memory_address {
        if let Some(value) = cfg.memory_value {
            if cfg.is_read_only(addr) {
                warn!("register at {:08x} is read-only, poking anyway", addr);
            }
            bridge.poke(addr, value)?;
        } else {
            let val = bridge.peek(addr)?;
            println!("Value at {:08x}: {:08x}", addr, val);
        }
    } else {
        println!("No operation and no address specified!");
        println!(
            "Try specifying an address such as \"0x40000000\" or a register name.  See --help for more information"
        );
    }
    Ok(())
}

/// Read the XADC die temperature and print it in degrees Celsius.
pub fn temperature(bridge: &Bridge) -> Result<(), ServerError> {
    let raw = bridge.peek(CSR_XADC_TEMPERATURE_ADDR)?;
    println!(
        "Die temperature: {:.1} C (raw 0x{:03x})",
        temperature_celsius(raw),
        raw & 0xfff
    );
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::BridgeKind;
    use wishbone_csr::soc::soc_map;

    fn test_config() -> Config {
        Config {
            map: soc_map(),
            bridge_kind: BridgeKind::Emulated,
            ethernet_host: None,
            ethernet_port: 1234,
            bind_addr: "127.0.0.1".to_string(),
            bind_port: 0,
            server_kind: None,
            memory_address: None,
            memory_value: None,
            temperature: false,
            random_address: None,
            random_loops: None,
        }
    }

    #[test]
    fn random_test_converges_on_the_emulated_soc() {
        let mut cfg = test_config();
        cfg.random_loops = Some(100);
        let bridge = Bridge::emulated();
        random_test(&cfg, &bridge).unwrap();
    }

    #[test]
    fn memory_access_peeks_and_pokes() {
        let mut cfg = test_config();
        cfg.memory_address = Some(MAIN_RAM_BASE);
        cfg.memory_value = Some(0x5a5a_5a5a);
        let bridge = Bridge::emulated();
        memory_access(&cfg, &bridge).unwrap();
        assert_eq!(bridge.peek(MAIN_RAM_BASE).unwrap(), 0x5a5a_5a5a);

        cfg.memory_value = None;
        memory_access(&cfg, &bridge).unwrap();
    }

    #[test]
    fn temperature_reads_the_xadc() {
        let bridge = Bridge::emulated();
        temperature(&bridge).unwrap();
    }
}
