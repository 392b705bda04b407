/*++

Licensed under the Apache-2.0 license.

File Name:

    wishbone.rs

Abstract:

    File contains the Wishbone-over-TCP (Etherbone) bridge server.

--*/

use log::{info, warn};
use std::io;
use std::net::{TcpListener, TcpStream};
use thiserror::Error;
use wishbone_bridge::etherbone::{self, EbRecord, EbWrites};
use wishbone_bridge::{Bridge, BridgeError};

#[derive(Debug, Error)]
pub enum WishboneServerError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("client closed the connection")]
    ConnectionClosed,
    #[error("no client is connected")]
    NotConnected,
    #[error(transparent)]
    Bridge(BridgeError),
}

impl From<BridgeError> for WishboneServerError {
    fn from(e: BridgeError) -> Self {
        match e {
            BridgeError::ConnectionClosed => WishboneServerError::ConnectionClosed,
            e => WishboneServerError::Bridge(e),
        }
    }
}

/// Serves Etherbone records from one TCP client at a time, bridging them
/// onto the local [`Bridge`].
pub struct WishboneServer {
    listener: TcpListener,
    connection: Option<TcpStream>,
}

impl WishboneServer {
    pub fn bind(bind_addr: &str, port: u16) -> io::Result<Self> {
        let listener = TcpListener::bind((bind_addr, port))?;
        info!("accepting connections on {}:{}", bind_addr, port);
        Ok(Self {
            listener,
            connection: None,
        })
    }

    /// Port actually bound, for callers that asked for an ephemeral one.
    pub fn port(&self) -> io::Result<u16> {
        Ok(self.listener.local_addr()?.port())
    }

    /// Accept the next client.
    pub fn connect(&mut self) -> Result<(), WishboneServerError> {
        let (connection, peer) = self.listener.accept()?;
        connection.set_nodelay(true)?;
        info!("connection from {}", peer);
        self.connection = Some(connection);
        Ok(())
    }

    /// Serve one record: apply the write section, answer the read section,
    /// and always reply with exactly one record so the client stays framed.
    /// A faulted read answers as all-ones and a faulted write is dropped,
    /// the way a bus error terminates a cycle without killing the link.
    pub fn process(&mut self, bridge: &Bridge) -> Result<(), WishboneServerError> {
        let connection = self
            .connection
            .as_mut()
            .ok_or(WishboneServerError::NotConnected)?;
        let request = etherbone::read_record(connection)?;

        let mut reply = EbRecord::default();
        if let Some(writes) = &request.writes {
            for (i, value) in writes.values.iter().enumerate() {
                let addr = writes.base.wrapping_add(4 * i as u32);
                if let Err(e) = bridge.poke(addr, *value) {
                    warn!("dropping write to {:08x}: {}", addr, e);
                }
            }
        }
        if let Some(reads) = &request.reads {
            let mut values = Vec::with_capacity(reads.addresses.len());
            for addr in &reads.addresses {
                values.push(bridge.peek(*addr).unwrap_or_else(|e| {
                    warn!("read of {:08x} faulted: {}", addr, e);
                    0xffff_ffff
                }));
            }
            reply.writes = Some(EbWrites {
                base: reads.base_ret,
                values,
            });
        }
        etherbone::write_record(connection, &reply)?;
        Ok(())
    }
}
