// Licensed under the Apache-2.0 license

//! XADC temperature transfer function. The sensor reports a 12-bit code;
//! the 7-series transfer function maps it to degrees Celsius.

/// Convert a raw temperature code to degrees Celsius.
pub fn temperature_celsius(raw: u32) -> f64 {
    (raw & 0xfff) as f64 * 503.975 / 4096.0 - 273.15
}

/// Inverse of [`temperature_celsius`], clamped to the 12-bit code range.
pub fn temperature_code(celsius: f64) -> u32 {
    let code = (celsius + 273.15) * 4096.0 / 503.975;
    code.round().clamp(0.0, 4095.0) as u32
}
