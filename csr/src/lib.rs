// Licensed under the Apache-2.0 license

//! Register-map model and parsers for LiteX-style CSR definitions.
//!
//! A CSR map is an ordered list of named address constants, grouped into
//! regions by the conventions the SoC build uses when it emits `csr.h` and
//! `csr.csv`. This crate models those maps, parses and re-emits both
//! artifact formats, and holds the register-word layouts shared between the
//! host-side bridge and the emulated SoC.

mod csv;
mod header;
mod map;

pub mod debug;
pub mod soc;
pub mod xadc;

pub use csv::parse_csv;
pub use header::{parse_header, write_header};
pub use map::{AccessMode, CsrConstant, CsrMap, CsrMapError, CsrParseError, CsrRegion};
