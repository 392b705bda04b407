/*++

Licensed under the Apache-2.0 license.

File Name:

    config.rs

Abstract:

    File contains the command line surface and validated configuration.

--*/

use clap::{ArgAction, Parser, ValueEnum};
use clap_num::maybe_hex;
use std::path::PathBuf;
use thiserror::Error;
use wishbone_bridge::Bridge;
use wishbone_csr::{parse_csv, soc, AccessMode, CsrMap, CsrParseError};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BridgeKind {
    /// In-process emulated SoC.
    Emulated,
    /// Etherbone over TCP.
    Ethernet,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServerKind {
    /// GDB remote-serial-protocol server.
    Gdb,
    /// Wishbone (Etherbone) bridge server.
    Wishbone,
    /// Write random values and read them back.
    RandomTest,
}

#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, name = "wishbone-tool")]
pub struct ToolArgs {
    /// Address to read or write: hex, decimal, or a CSR register name.
    #[arg(index = 1)]
    pub address: Option<String>,

    /// Value to write at the address.
    #[arg(index = 2, value_parser = maybe_hex::<u32>)]
    pub value: Option<u32>,

    /// Bridge transport to the target.
    #[arg(short, long, value_enum, default_value = "emulated")]
    pub bridge_kind: BridgeKind,

    /// Remote host for the ethernet bridge.
    #[arg(long)]
    pub ethernet_host: Option<String>,

    /// Remote port for the ethernet bridge.
    #[arg(long, default_value_t = 1234)]
    pub ethernet_port: u16,

    /// IP address to bind servers to.
    #[arg(short = 'a', long, default_value = "0.0.0.0")]
    pub bind_addr: String,

    /// Port number for servers to listen on.
    #[arg(short = 'n', long, default_value_t = 1234)]
    pub port: u16,

    /// Server to run against the bridge.
    #[arg(short, long, value_enum)]
    pub server_kind: Option<ServerKind>,

    /// Register map (csr.csv) for symbolic addresses.
    #[arg(long)]
    pub csr_csv: Option<PathBuf>,

    /// Read the XADC die temperature and exit.
    #[arg(long)]
    pub temperature: bool,

    /// Scratch RAM address for the random self-test.
    #[arg(long, value_parser = maybe_hex::<u32>)]
    pub random_address: Option<u32>,

    /// Stop the random self-test after this many loops.
    #[arg(long)]
    pub random_loops: Option<u32>,

    /// Raise log verbosity (-v, -vv).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown register or malformed address {0:?}")]
    BadAddress(String),
    #[error("the ethernet bridge needs --ethernet-host")]
    EthernetHostRequired,
    #[error("can't read register map {path}: {source}")]
    CsrRead {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    CsrParse(#[from] CsrParseError),
}

pub struct Config {
    pub map: CsrMap,
    pub bridge_kind: BridgeKind,
    pub ethernet_host: Option<String>,
    pub ethernet_port: u16,
    pub bind_addr: String,
    pub bind_port: u16,
    pub server_kind: Option<ServerKind>,
    pub memory_address: Option<u32>,
    pub memory_value: Option<u32>,
    pub temperature: bool,
    pub random_address: Option<u32>,
    pub random_loops: Option<u32>,
}

impl Config {
    pub fn parse(args: ToolArgs) -> Result<Self, ConfigError> {
        let map = match &args.csr_csv {
            Some(path) => {
                let text =
                    std::fs::read_to_string(path).map_err(|source| ConfigError::CsrRead {
                        path: path.display().to_string(),
                        source,
                    })?;
                parse_csv(&text)?
            }
            None => soc::soc_map(),
        };
        if args.bridge_kind == BridgeKind::Ethernet && args.ethernet_host.is_none() {
            return Err(ConfigError::EthernetHostRequired);
        }
        let memory_address = match &args.address {
            Some(s) => Some(resolve_address(&map, s)?),
            None => None,
        };
        Ok(Self {
            map,
            bridge_kind: args.bridge_kind,
            ethernet_host: args.ethernet_host,
            ethernet_port: args.ethernet_port,
            bind_addr: args.bind_addr,
            bind_port: args.port,
            server_kind: args.server_kind,
            memory_address,
            memory_value: args.value,
            temperature: args.temperature,
            random_address: args.random_address,
            random_loops: args.random_loops,
        })
    }

    pub fn create_bridge(&self) -> Bridge {
        match self.bridge_kind {
            BridgeKind::Emulated => Bridge::emulated(),
            BridgeKind::Ethernet => Bridge::ethernet(
                self.ethernet_host.as_deref().unwrap_or("127.0.0.1"),
                self.ethernet_port,
            ),
        }
    }

    /// Whether the register map marks the address read-only.
    pub fn is_read_only(&self, addr: u32) -> bool {
        self.map
            .name_of(addr)
            .map(|name| self.map.mode_of(name) == Some(AccessMode::ReadOnly))
            .unwrap_or(false)
    }
}

/// `0x`-prefixed hex, bare decimal, or a register name from the map.
pub fn resolve_address(map: &CsrMap, input: &str) -> Result<u32, ConfigError> {
    if let Some(hex) = input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")) {
        return u32::from_str_radix(hex, 16).map_err(|_| ConfigError::BadAddress(input.to_string()));
    }
    if !input.is_empty() && input.chars().all(|c| c.is_ascii_digit()) {
        return input
            .parse()
            .map_err(|_| ConfigError::BadAddress(input.to_string()));
    }
    map.lookup(input)
        .ok_or_else(|| ConfigError::BadAddress(input.to_string()))
}
