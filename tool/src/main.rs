/*++

Licensed under the Apache-2.0 license.

File Name:

    main.rs

Abstract:

    File contains main entrypoint for the Wishbone debug bridge tool.

--*/

use anyhow::Context;
use clap::Parser;
use std::sync::atomic::Ordering;
use wishbone_tool::config::{Config, ServerKind, ToolArgs};
use wishbone_tool::{server, RUNNING};

fn main() -> anyhow::Result<()> {
    let args = ToolArgs::parse();

    let level = match args.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    let _ = simple_logger::SimpleLogger::new().with_level(level).init();

    // Exit server loops cleanly on Ctrl-C.
    ctrlc::set_handler(move || {
        RUNNING.store(false, Ordering::Relaxed);
    })
    .context("failed to install the Ctrl-C handler")?;

    let cfg = Config::parse(args)?;
    let bridge = cfg.create_bridge();
    bridge.connect().context("unable to connect to the target")?;

    match cfg.server_kind {
        Some(ServerKind::Gdb) => server::gdb_server(&cfg, &bridge)?,
        Some(ServerKind::Wishbone) => server::wishbone_server(&cfg, &bridge)?,
        Some(ServerKind::RandomTest) => server::random_test(&cfg, &bridge)?,
        None => {
            if cfg.temperature {
                server::temperature(&bridge)?;
            } else {
                server::memory_access(&cfg, &bridge)?;
            }
        }
    }

    Ok(())
}
