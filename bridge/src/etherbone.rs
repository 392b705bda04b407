// Licensed under the Apache-2.0 license

//! Etherbone record codec.
//!
//! Every request and reply is one packet header plus one record:
//!
//! ```text
//! magic: [u8; 2]      0x4e 0x6f
//! version/flags: u8   protocol version in the upper nibble
//! widths: u8          address and port widths, one nibble each
//! record flags: u8
//! byte_enable: u8
//! wcount: u8          values in the write section
//! rcount: u8          addresses in the read section
//! write section       base address + wcount values (if wcount > 0)
//! read section        reply-to address + rcount addresses (if rcount > 0)
//! ```
//!
//! All addresses and values are big-endian 32-bit words. Reads are
//! answered with a record whose write section targets the reply-to
//! address.

use crate::BridgeError;
use std::io::{ErrorKind, Read, Write};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

pub const EB_MAGIC: [u8; 2] = [0x4e, 0x6f];
/// Protocol version 1 in the upper nibble.
pub const EB_VERSION: u8 = 0x10;
/// 32-bit address width, 32-bit port width.
pub const EB_ADDR_PORT_32: u8 = 0x44;
/// Largest number of words one record section can carry.
pub const MAX_RECORD_WORDS: usize = 255;

#[derive(FromBytes, IntoBytes, Immutable, KnownLayout, Clone, Copy)]
#[repr(C)]
struct PacketHeader {
    magic: [u8; 2],
    version: u8,
    widths: u8,
}

#[derive(FromBytes, IntoBytes, Immutable, KnownLayout, Clone, Copy)]
#[repr(C)]
struct RecordHeader {
    flags: u8,
    byte_enable: u8,
    wcount: u8,
    rcount: u8,
}

/// Write section of a record: consecutive words starting at `base`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EbWrites {
    pub base: u32,
    pub values: Vec<u32>,
}

/// Read section of a record: the reply lands at `base_ret`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EbReads {
    pub base_ret: u32,
    pub addresses: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EbRecord {
    pub writes: Option<EbWrites>,
    pub reads: Option<EbReads>,
}

impl EbRecord {
    pub fn write(base: u32, values: Vec<u32>) -> Self {
        Self {
            writes: Some(EbWrites { base, values }),
            reads: None,
        }
    }

    pub fn read(base_ret: u32, addresses: Vec<u32>) -> Self {
        Self {
            writes: None,
            reads: Some(EbReads {
                base_ret,
                addresses,
            }),
        }
    }
}

pub fn encode_record(record: &EbRecord) -> Vec<u8> {
    let wcount = record.writes.as_ref().map_or(0, |w| w.values.len());
    let rcount = record.reads.as_ref().map_or(0, |r| r.addresses.len());
    debug_assert!(wcount <= MAX_RECORD_WORDS && rcount <= MAX_RECORD_WORDS);

    let mut out = Vec::with_capacity(8 + 4 * (wcount + rcount) + 8);
    let packet = PacketHeader {
        magic: EB_MAGIC,
        version: EB_VERSION,
        widths: EB_ADDR_PORT_32,
    };
    out.extend_from_slice(packet.as_bytes());
    let header = RecordHeader {
        flags: 0,
        byte_enable: 0x0f,
        wcount: wcount as u8,
        rcount: rcount as u8,
    };
    out.extend_from_slice(header.as_bytes());
    if let Some(writes) = &record.writes {
        out.extend_from_slice(&writes.base.to_be_bytes());
        for value in &writes.values {
            out.extend_from_slice(&value.to_be_bytes());
        }
    }
    if let Some(reads) = &record.reads {
        out.extend_from_slice(&reads.base_ret.to_be_bytes());
        for addr in &reads.addresses {
            out.extend_from_slice(&addr.to_be_bytes());
        }
    }
    out
}

pub fn write_record(stream: &mut impl Write, record: &EbRecord) -> std::io::Result<()> {
    stream.write_all(&encode_record(record))
}

pub fn read_record(stream: &mut impl Read) -> Result<EbRecord, BridgeError> {
    let mut header = [0u8; 8];
    read_exact_or_closed(stream, &mut header)?;
    let packet =
        PacketHeader::read_from_bytes(&header[..4]).map_err(|_| BridgeError::WrongResponse)?;
    if packet.magic != EB_MAGIC || packet.version & 0xf0 != EB_VERSION {
        return Err(BridgeError::NoMagic);
    }
    if packet.widths != EB_ADDR_PORT_32 {
        return Err(BridgeError::UnsupportedWidth);
    }
    let record =
        RecordHeader::read_from_bytes(&header[4..8]).map_err(|_| BridgeError::WrongResponse)?;

    let writes = if record.wcount > 0 {
        let base = read_word(stream)?;
        let mut values = Vec::with_capacity(record.wcount as usize);
        for _ in 0..record.wcount {
            values.push(read_word(stream)?);
        }
        Some(EbWrites { base, values })
    } else {
        None
    };
    let reads = if record.rcount > 0 {
        let base_ret = read_word(stream)?;
        let mut addresses = Vec::with_capacity(record.rcount as usize);
        for _ in 0..record.rcount {
            addresses.push(read_word(stream)?);
        }
        Some(EbReads {
            base_ret,
            addresses,
        })
    } else {
        None
    };
    Ok(EbRecord { writes, reads })
}

fn read_word(stream: &mut impl Read) -> Result<u32, BridgeError> {
    let mut buf = [0u8; 4];
    read_exact_or_closed(stream, &mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

fn read_exact_or_closed(stream: &mut impl Read, buf: &mut [u8]) -> Result<(), BridgeError> {
    stream.read_exact(buf).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            BridgeError::ConnectionClosed
        } else {
            BridgeError::Io(e)
        }
    })
}
