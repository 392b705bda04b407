/*++

Licensed under the Apache-2.0 license.

File Name:

    gdb_state.rs

Abstract:

    File contains the blocking event loop driving the GDB stub.

--*/

use crate::gdb::gdb_target::GdbTarget;
use crate::RUNNING;
use gdbstub::common::Signal;
use gdbstub::conn::ConnectionExt;
use gdbstub::stub::run_blocking::{self, WaitForStopReasonError};
use gdbstub::stub::{DisconnectReason, GdbStub, SingleThreadStopReason};
use log::{error, info};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

type GdbConnection = Box<dyn ConnectionExt<Error = std::io::Error>>;

enum BridgeGdbEventLoop {}

impl run_blocking::BlockingEventLoop for BridgeGdbEventLoop {
    type Target = GdbTarget;
    type Connection = GdbConnection;
    type StopReason = SingleThreadStopReason<u32>;

    fn wait_for_stop_reason(
        target: &mut GdbTarget,
        conn: &mut Self::Connection,
    ) -> Result<
        run_blocking::Event<SingleThreadStopReason<u32>>,
        WaitForStopReasonError<&'static str, std::io::Error>,
    > {
        loop {
            if conn
                .peek()
                .map_err(WaitForStopReasonError::Connection)?
                .is_some()
            {
                let byte = conn.read().map_err(WaitForStopReasonError::Connection)?;
                return Ok(run_blocking::Event::IncomingData(byte));
            }
            if let Some(reason) = target.poll_stop().map_err(WaitForStopReasonError::Target)? {
                return Ok(run_blocking::Event::TargetStopped(reason));
            }
            if !RUNNING.load(Ordering::Relaxed) {
                return Ok(run_blocking::Event::TargetStopped(
                    SingleThreadStopReason::Exited(0),
                ));
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    fn on_interrupt(
        target: &mut GdbTarget,
    ) -> Result<Option<SingleThreadStopReason<u32>>, &'static str> {
        target.interrupt()?;
        Ok(Some(SingleThreadStopReason::Signal(Signal::SIGINT)))
    }
}

/// Block until a GDB client connects on the given address.
pub fn wait_for_tcp(bind_addr: &str, port: u16) -> std::io::Result<TcpStream> {
    let listener = TcpListener::bind((bind_addr, port))?;
    info!("accepting gdb connections on {}:{}", bind_addr, port);
    let (stream, peer) = listener.accept()?;
    info!("connection from {}", peer);
    Ok(stream)
}

/// Run one GDB client session to its disconnect.
pub fn run(target: &mut GdbTarget, connection: TcpStream) {
    let connection: GdbConnection = Box::new(connection);
    let gdb = GdbStub::new(connection);
    match gdb.run_blocking::<BridgeGdbEventLoop>(target) {
        Ok(disconnect_reason) => match disconnect_reason {
            DisconnectReason::Disconnect => info!("client disconnected"),
            DisconnectReason::TargetExited(code) => info!("target exited with code {}", code),
            DisconnectReason::TargetTerminated(signal) => {
                info!("target terminated with signal {:?}", signal)
            }
            DisconnectReason::Kill => info!("client killed the session"),
        },
        Err(e) => error!("gdbstub encountered an error: {}", e),
    }
}
