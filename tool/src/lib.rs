/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    Library interface for the Wishbone debug bridge tool.

--*/

pub mod config;
pub mod gdb;
pub mod server;
pub mod wishbone;

use std::sync::atomic::AtomicBool;

/// Cleared by the Ctrl-C handler; server loops exit once it goes false.
pub static RUNNING: AtomicBool = AtomicBool::new(true);

pub use config::{Config, ConfigError, ToolArgs};
