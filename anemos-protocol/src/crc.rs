//! CRC-8 check code
//!
//! Polynomial 0x07 (x^8 + x^2 + x + 1), initial value 0, no reflection,
//! no final XOR (CRC-8/SMBUS).

/// Polynomial for CRC-8/SMBUS
const POLY: u8 = 0x07;

/// Compute CRC-8 over `data`
pub fn crc8(data: &[u8]) -> u8 {
    crc8_update(0, data)
}

/// Continue a CRC-8 computation with more data
pub fn crc8_update(mut crc: u8, data: &[u8]) -> u8 {
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            if crc & 0x80 != 0 {
                crc = (crc << 1) ^ POLY;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}
