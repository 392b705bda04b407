// Licensed under the Apache-2.0 license

//! Parser and emitter for the generated `csr.h`-style constant headers.
//!
//! The input is the flat `#define` form the SoC build emits: one constant
//! per line, with `/* region */` comment markers opening each register
//! block. Parsing and re-emitting a header preserves every name and value
//! in order.

use crate::map::{CsrConstant, CsrMap, CsrParseError, CsrRegion};
use std::collections::HashSet;

pub fn parse_header(input: &str) -> Result<CsrMap, CsrParseError> {
    let mut map = CsrMap::default();
    let mut region = CsrRegion::default();
    let mut names = HashSet::new();

    for (idx, raw) in input.lines().enumerate() {
        let line = idx + 1;
        let text = raw.trim();
        if text.is_empty() {
            continue;
        }
        if text.starts_with("/*") && text.ends_with("*/") {
            if let Some(marker) = region_marker(text) {
                if !region.constants.is_empty() || region.name.is_some() {
                    map.regions.push(region);
                }
                region = CsrRegion::named(marker);
            }
            continue;
        }
        if let Some(rest) = text.strip_prefix("#define") {
            let mut parts = rest.split_whitespace();
            let (name, value) = match (parts.next(), parts.next(), parts.next()) {
                (Some(name), Some(value), None) => (name, value),
                _ => return Err(CsrParseError::MalformedDefine { line }),
            };
            if !names.insert(name.to_string()) {
                return Err(CsrParseError::DuplicateName {
                    line,
                    name: name.to_string(),
                });
            }
            let value = parse_value(value).ok_or_else(|| CsrParseError::InvalidValue {
                line,
                value: value.to_string(),
            })?;
            region.constants.push(CsrConstant::new(name, value));
            continue;
        }
        return Err(CsrParseError::UnexpectedLine { line });
    }
    if !region.constants.is_empty() || region.name.is_some() {
        map.regions.push(region);
    }
    Ok(map)
}

/// Emit a map back into header form. `parse_header(&write_header(&m))`
/// reproduces `m` exactly for any map `parse_header` produced.
pub fn write_header(map: &CsrMap) -> String {
    let mut out = String::new();
    for region in &map.regions {
        if !out.is_empty() {
            out.push('\n');
        }
        if let Some(name) = &region.name {
            out.push_str(&format!("/* {name} */\n"));
        }
        for c in &region.constants {
            out.push_str(&format!("#define {} 0x{:08x}\n", c.name, c.value));
        }
    }
    out
}

/// A `/* name */` line opens a region; comments holding anything other
/// than a single identifier are skipped by the caller.
fn region_marker(text: &str) -> Option<&str> {
    let inner = text.strip_prefix("/*")?.strip_suffix("*/")?.trim();
    if !inner.is_empty()
        && inner
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Some(inner)
    } else {
        None
    }
}

fn parse_value(value: &str) -> Option<u32> {
    if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        value.parse().ok()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SOC_HEADER: &str = "\
#define CSR_XADC_TEMPERATURE_ADDR 0xe0005800

/* cpu_or_bridge */
#define CSR_CPU_OR_BRIDGE_BASE 0xe0006000

#define CSR_CPU_OR_BRIDGE_DEBUG_CORE 0xe0006000
#define CSR_CPU_OR_BRIDGE_DEBUG_DATA 0xe0006004
#define CSR_CPU_OR_BRIDGE_DEBUG_SYNC 0xe0006008
#define CSR_CPU_OR_BRIDGE_DEBUG_PACKET_COUNTER 0xe000600c
";

    #[test]
    fn parses_the_soc_header() {
        let map = parse_header(SOC_HEADER).unwrap();
        assert_eq!(map.regions.len(), 2);
        assert_eq!(map.regions[0].name, None);
        assert_eq!(map.regions[1].name.as_deref(), Some("cpu_or_bridge"));
        assert_eq!(map.lookup("CSR_XADC_TEMPERATURE_ADDR"), Some(0xe000_5800));
        assert_eq!(map.lookup("cpu_or_bridge_debug_core"), Some(0xe000_6000));
        assert_eq!(
            map.lookup("cpu_or_bridge_debug_packet_counter"),
            Some(0xe000_600c)
        );
        map.validate().unwrap();
    }

    #[test]
    fn register_addresses_step_by_one_word() {
        let map = parse_header(SOC_HEADER).unwrap();
        let bridge = &map.regions[1];
        assert_eq!(bridge.base().unwrap().value, 0xe000_6000);
        let addrs: Vec<u32> = bridge.registers().map(|r| r.value).collect();
        assert_eq!(addrs, vec![0xe000_6000, 0xe000_6004, 0xe000_6008, 0xe000_600c]);
    }

    #[test]
    fn round_trips_names_and_values() {
        let map = parse_header(SOC_HEADER).unwrap();
        let emitted = write_header(&map);
        let reparsed = parse_header(&emitted).unwrap();
        assert_eq!(map, reparsed);
        // A second trip through the emitter is byte-stable.
        assert_eq!(emitted, write_header(&reparsed));
    }

    #[test]
    fn rejects_malformed_defines() {
        assert!(matches!(
            parse_header("#define CSR_ONLY_NAME"),
            Err(CsrParseError::MalformedDefine { line: 1 })
        ));
        assert!(matches!(
            parse_header("#define CSR_A 0xe0005800 extra"),
            Err(CsrParseError::MalformedDefine { line: 1 })
        ));
    }

    #[test]
    fn rejects_bad_values_and_duplicates() {
        assert!(matches!(
            parse_header("#define CSR_A 0xzz"),
            Err(CsrParseError::InvalidValue { line: 1, .. })
        ));
        let dup = "#define CSR_A 0x0\n#define CSR_A 0x4\n";
        assert!(matches!(
            parse_header(dup),
            Err(CsrParseError::DuplicateName { line: 2, .. })
        ));
    }

    #[test]
    fn rejects_unexpected_lines() {
        assert!(matches!(
            parse_header("static int x = 3;"),
            Err(CsrParseError::UnexpectedLine { line: 1 })
        ));
    }

    #[test]
    fn accepts_decimal_values_and_prose_comments() {
        let input = "/* generated file, do not edit */\n#define CSR_A 16\n";
        let map = parse_header(input).unwrap();
        assert_eq!(map.lookup("CSR_A"), Some(16));
        // The prose comment does not open a region.
        assert_eq!(map.regions.len(), 1);
        assert_eq!(map.regions[0].name, None);
    }
}
