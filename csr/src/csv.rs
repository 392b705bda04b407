// Licensed under the Apache-2.0 license

//! Parser for the `csr.csv` description the SoC build emits next to the
//! header. Rows are `kind,name,address,size,mode`; only `csr_base` and
//! `csr_register` rows contribute to the map, the `constant` and
//! `memory_region` rows describe things that are not bus registers.

use crate::map::{AccessMode, CsrConstant, CsrMap, CsrParseError, CsrRegion};
use std::collections::HashSet;

pub fn parse_csv(input: &str) -> Result<CsrMap, CsrParseError> {
    let mut map = CsrMap::default();
    let mut names = HashSet::new();

    for (idx, raw) in input.lines().enumerate() {
        let line = idx + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = text.split(',').map(str::trim).collect();
        if fields.len() < 3 {
            return Err(CsrParseError::MalformedRow { line });
        }
        match fields[0] {
            "csr_base" => {
                let name = fields[1];
                let value = parse_addr(fields[2], line)?;
                let base_name = format!("{name}_base");
                if !names.insert(base_name.clone()) {
                    return Err(CsrParseError::DuplicateName {
                        line,
                        name: base_name,
                    });
                }
                let mut region = CsrRegion::named(name);
                region.constants.push(CsrConstant::new(&base_name, value));
                map.regions.push(region);
            }
            "csr_register" => {
                let name = fields[1];
                let value = parse_addr(fields[2], line)?;
                if !names.insert(name.to_string()) {
                    return Err(CsrParseError::DuplicateName {
                        line,
                        name: name.to_string(),
                    });
                }
                let mut constant = CsrConstant::new(name, value);
                constant.mode = fields.get(4).and_then(|m| AccessMode::from_csv(m));
                region_for(&mut map, name).constants.push(constant);
            }
            // Clock constants, memory regions, and anything newer
            // generators add.
            _ => {}
        }
    }
    Ok(map)
}

/// Registers belong to the region whose name is the longest prefix of the
/// register name on an underscore boundary; registers with no matching
/// `csr_base` row collect in a trailing anonymous region.
fn region_for<'a>(map: &'a mut CsrMap, reg_name: &str) -> &'a mut CsrRegion {
    let mut best: Option<(usize, usize)> = None;
    for (idx, region) in map.regions.iter().enumerate() {
        if let Some(name) = &region.name {
            if reg_name == name || reg_name.starts_with(&format!("{name}_")) {
                match best {
                    Some((_, len)) if len >= name.len() => {}
                    _ => best = Some((idx, name.len())),
                }
            }
        }
    }
    match best {
        Some((idx, _)) => &mut map.regions[idx],
        None => {
            if map.regions.last().map(|r| r.name.is_some()).unwrap_or(true) {
                map.regions.push(CsrRegion::default());
            }
            map.regions.last_mut().unwrap()
        }
    }
}

fn parse_addr(value: &str, line: usize) -> Result<u32, CsrParseError> {
    let parsed = if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        value.parse().ok()
    };
    parsed.ok_or_else(|| CsrParseError::InvalidValue {
        line,
        value: value.to_string(),
    })
}
