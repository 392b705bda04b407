// Licensed under the Apache-2.0 license

use crate::etherbone::{self, EbRecord, MAX_RECORD_WORDS};
use crate::BridgeError;
use log::{info, warn};
use std::net::TcpStream;
use std::sync::{Arc, Mutex};

/// Transport speaking Etherbone to a remote bridge server over TCP. Every
/// request is answered with exactly one record, so the stream stays framed
/// even across pipelined callers.
#[derive(Clone)]
pub struct EthernetBridge {
    host: String,
    port: u16,
    stream: Arc<Mutex<Option<TcpStream>>>,
}

impl EthernetBridge {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            stream: Arc::new(Mutex::new(None)),
        }
    }

    pub fn connect(&self) -> Result<(), BridgeError> {
        let mut guard = self.stream.lock().unwrap();
        if guard.is_some() {
            return Ok(());
        }
        let stream = TcpStream::connect((self.host.as_str(), self.port))?;
        stream.set_nodelay(true)?;
        info!("connected to {}:{}", self.host, self.port);
        *guard = Some(stream);
        Ok(())
    }

    fn transact(&self, request: &EbRecord) -> Result<EbRecord, BridgeError> {
        let mut guard = self.stream.lock().unwrap();
        let stream = guard.as_mut().ok_or(BridgeError::NotConnected)?;
        let result: Result<EbRecord, BridgeError> = (|| {
            etherbone::write_record(stream, request)?;
            etherbone::read_record(stream)
        })();
        if result.is_err() {
            // Drop the stream so the caller reconnects before retrying.
            warn!("transaction failed, dropping connection to {}:{}", self.host, self.port);
            *guard = None;
        }
        result
    }

    pub fn peek(&self, addr: u32) -> Result<u32, BridgeError> {
        let reply = self.transact(&EbRecord::read(addr, vec![addr]))?;
        match reply.writes {
            Some(writes) if writes.values.len() == 1 => Ok(writes.values[0]),
            _ => Err(BridgeError::WrongResponse),
        }
    }

    pub fn poke(&self, addr: u32, value: u32) -> Result<(), BridgeError> {
        self.transact(&EbRecord::write(addr, vec![value]))?;
        Ok(())
    }

    pub fn burst_read(&self, addr: u32, count: u32) -> Result<Vec<u32>, BridgeError> {
        let mut values = Vec::with_capacity(count as usize);
        let mut next = addr;
        let mut remaining = count as usize;
        while remaining > 0 {
            let chunk = remaining.min(MAX_RECORD_WORDS);
            let addresses = (0..chunk as u32).map(|i| next.wrapping_add(4 * i)).collect();
            let reply = self.transact(&EbRecord::read(next, addresses))?;
            match reply.writes {
                Some(writes) if writes.values.len() == chunk => values.extend(writes.values),
                _ => return Err(BridgeError::WrongResponse),
            }
            next = next.wrapping_add(4 * chunk as u32);
            remaining -= chunk;
        }
        Ok(values)
    }

    pub fn burst_write(&self, addr: u32, values: &[u32]) -> Result<(), BridgeError> {
        let mut next = addr;
        for chunk in values.chunks(MAX_RECORD_WORDS) {
            self.transact(&EbRecord::write(next, chunk.to_vec()))?;
            next = next.wrapping_add(4 * chunk.len() as u32);
        }
        Ok(())
    }
}
