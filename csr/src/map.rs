// Licensed under the Apache-2.0 license

use std::collections::HashSet;
use thiserror::Error;

/// CSR registers are one 32-bit bus word each.
pub const CSR_WORD_BYTES: u32 = 4;

#[derive(Debug, Error)]
pub enum CsrParseError {
    #[error("line {line}: malformed define")]
    MalformedDefine { line: usize },
    #[error("line {line}: malformed csv row")]
    MalformedRow { line: usize },
    #[error("line {line}: invalid address value {value:?}")]
    InvalidValue { line: usize, value: String },
    #[error("line {line}: duplicate name {name:?}")]
    DuplicateName { line: usize, name: String },
    #[error("line {line}: unexpected input")]
    UnexpectedLine { line: usize },
}

#[derive(Debug, Error)]
pub enum CsrMapError {
    #[error("duplicate constant name {0:?}")]
    DuplicateName(String),
    #[error("register address {0:#010x} appears more than once")]
    DuplicateAddress(u32),
    #[error("region {region:?}: base {base:#010x} does not match first register {first:#010x}")]
    BaseMismatch {
        region: String,
        base: u32,
        first: u32,
    },
    #[error("region {region:?}: register {name:?} breaks the one-word stride")]
    NonContiguous { region: String, name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

impl AccessMode {
    /// Access-mode column of a `csr.csv` row. Unknown strings map to `None`
    /// so newer generators do not break the parser.
    pub fn from_csv(s: &str) -> Option<AccessMode> {
        match s {
            "ro" => Some(AccessMode::ReadOnly),
            "rw" => Some(AccessMode::ReadWrite),
            _ => None,
        }
    }
}

/// A single named address constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrConstant {
    pub name: String,
    pub value: u32,
    pub mode: Option<AccessMode>,
}

impl CsrConstant {
    pub fn new(name: &str, value: u32) -> Self {
        Self {
            name: name.to_string(),
            value,
            mode: None,
        }
    }

    pub fn with_mode(name: &str, value: u32, mode: AccessMode) -> Self {
        Self {
            name: name.to_string(),
            value,
            mode: Some(mode),
        }
    }

    fn is_base(&self) -> bool {
        normalize(&self.name).ends_with("_base")
    }
}

/// A group of constants emitted under one region marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsrRegion {
    /// Region marker name, `None` for constants emitted before any marker.
    pub name: Option<String>,
    pub constants: Vec<CsrConstant>,
}

impl CsrRegion {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            constants: Vec::new(),
        }
    }

    /// The region's `_BASE` constant, if it carries one.
    pub fn base(&self) -> Option<&CsrConstant> {
        self.constants.iter().find(|c| c.is_base())
    }

    /// The region's registers, in emission order (`_BASE` excluded).
    pub fn registers(&self) -> impl Iterator<Item = &CsrConstant> {
        self.constants.iter().filter(|c| !c.is_base())
    }
}

/// An ordered register map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsrMap {
    pub regions: Vec<CsrRegion>,
}

impl CsrMap {
    /// All constants in emission order.
    pub fn constants(&self) -> impl Iterator<Item = &CsrConstant> {
        self.regions.iter().flat_map(|r| r.constants.iter())
    }

    /// Case-insensitive name lookup. The `CSR_` prefix and `_ADDR` suffix
    /// the header generator adds are optional, so `xadc_temperature`
    /// resolves the same constant as `CSR_XADC_TEMPERATURE_ADDR`.
    pub fn lookup(&self, name: &str) -> Option<u32> {
        let wanted = normalize(name);
        self.constants()
            .find(|c| normalize(&c.name) == wanted)
            .map(|c| c.value)
    }

    /// Access mode recorded for a named constant, if any.
    pub fn mode_of(&self, name: &str) -> Option<AccessMode> {
        let wanted = normalize(name);
        self.constants()
            .find(|c| normalize(&c.name) == wanted)
            .and_then(|c| c.mode)
    }

    /// Reverse lookup of a register address to its symbolic name.
    pub fn name_of(&self, addr: u32) -> Option<&str> {
        self.regions
            .iter()
            .flat_map(|r| r.registers())
            .find(|c| c.value == addr)
            .map(|c| c.name.as_str())
    }

    /// Check the structural invariants of a generated map:
    /// all names are distinct, all register addresses are distinct, and
    /// within a region the registers are contiguous one-word slots starting
    /// at the region's `_BASE` address (a `_BASE` constant aliases its first
    /// register, so it is exempt from the address-uniqueness check).
    pub fn validate(&self) -> Result<(), CsrMapError> {
        let mut names = HashSet::new();
        let mut addrs = HashSet::new();
        for region in &self.regions {
            for c in &region.constants {
                if !names.insert(c.name.clone()) {
                    return Err(CsrMapError::DuplicateName(c.name.clone()));
                }
            }
            for reg in region.registers() {
                if !addrs.insert(reg.value) {
                    return Err(CsrMapError::DuplicateAddress(reg.value));
                }
            }
            let region_name = region.name.clone().unwrap_or_default();
            if let (Some(base), Some(first)) = (region.base(), region.registers().next()) {
                if base.value != first.value {
                    return Err(CsrMapError::BaseMismatch {
                        region: region_name,
                        base: base.value,
                        first: first.value,
                    });
                }
            }
            let mut prev: Option<u32> = None;
            for reg in region.registers() {
                if let Some(prev) = prev {
                    if reg.value != prev.wrapping_add(CSR_WORD_BYTES) {
                        return Err(CsrMapError::NonContiguous {
                            region: region_name,
                            name: reg.name.clone(),
                        });
                    }
                }
                prev = Some(reg.value);
            }
        }
        Ok(())
    }
}

/// Canonical form used for name comparison: lowercase, without the `CSR_`
/// prefix and `_ADDR` suffix the header generator decorates names with.
pub(crate) fn normalize(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    let stripped = lower.strip_prefix("csr_").unwrap_or(&lower);
    stripped
        .strip_suffix("_addr")
        .unwrap_or(stripped)
        .to_string()
}

#[cfg(test)]
mod test {
    use super::*;

    fn block(name: &str, base: u32, regs: &[&str]) -> CsrRegion {
        let mut region = CsrRegion::named(name);
        region
            .constants
            .push(CsrConstant::new(&format!("{name}_base"), base));
        for (i, reg) in regs.iter().enumerate() {
            region.constants.push(CsrConstant::new(
                &format!("{name}_{reg}"),
                base + CSR_WORD_BYTES * i as u32,
            ));
        }
        region
    }

    #[test]
    fn lookup_is_case_and_decoration_insensitive() {
        let map = CsrMap {
            regions: vec![block("uart", 0xe000_1800, &["rxtx", "txfull"])],
        };
        assert_eq!(map.lookup("uart_rxtx"), Some(0xe000_1800));
        assert_eq!(map.lookup("UART_RXTX"), Some(0xe000_1800));
        assert_eq!(map.lookup("CSR_UART_RXTX_ADDR"), Some(0xe000_1800));
        assert_eq!(map.lookup("uart_missing"), None);
    }

    #[test]
    fn name_of_ignores_base_aliases() {
        let map = CsrMap {
            regions: vec![block("uart", 0xe000_1800, &["rxtx"])],
        };
        assert_eq!(map.name_of(0xe000_1800), Some("uart_rxtx"));
    }

    #[test]
    fn validate_accepts_contiguous_block() {
        let map = CsrMap {
            regions: vec![block("uart", 0xe000_1800, &["rxtx", "txfull", "rxempty"])],
        };
        map.validate().unwrap();
    }

    #[test]
    fn validate_rejects_duplicate_names() {
        let mut region = CsrRegion::named("uart");
        region.constants.push(CsrConstant::new("uart_rxtx", 0x0));
        region.constants.push(CsrConstant::new("uart_rxtx", 0x4));
        let map = CsrMap {
            regions: vec![region],
        };
        assert!(matches!(
            map.validate(),
            Err(CsrMapError::DuplicateName(_))
        ));
    }

    #[test]
    fn validate_rejects_duplicate_register_addresses() {
        let mut a = CsrRegion::named("a");
        a.constants.push(CsrConstant::new("a_reg", 0x1000));
        let mut b = CsrRegion::named("b");
        b.constants.push(CsrConstant::new("b_reg", 0x1000));
        let map = CsrMap {
            regions: vec![a, b],
        };
        assert!(matches!(
            map.validate(),
            Err(CsrMapError::DuplicateAddress(0x1000))
        ));
    }

    #[test]
    fn validate_rejects_base_not_aliasing_first_register() {
        let mut region = CsrRegion::named("uart");
        region.constants.push(CsrConstant::new("uart_base", 0x1000));
        region.constants.push(CsrConstant::new("uart_rxtx", 0x1004));
        let map = CsrMap {
            regions: vec![region],
        };
        assert!(matches!(
            map.validate(),
            Err(CsrMapError::BaseMismatch { .. })
        ));
    }

    #[test]
    fn validate_rejects_gapped_registers() {
        let mut region = CsrRegion::named("uart");
        region.constants.push(CsrConstant::new("uart_rxtx", 0x1000));
        region
            .constants
            .push(CsrConstant::new("uart_txfull", 0x1008));
        let map = CsrMap {
            regions: vec![region],
        };
        assert!(matches!(
            map.validate(),
            Err(CsrMapError::NonContiguous { .. })
        ));
    }
}
