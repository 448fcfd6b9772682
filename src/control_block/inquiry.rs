// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! INQUIRY (6): CDB filler that writes into a provided 16-byte buffer, and
//! the standard INQUIRY data parser.
//!
//! CDB layout (SPC):
//!   [0] = 0x12 (INQUIRY)
//!   [1] = EVPD (bit 0); other bits reserved (CMDDT obsolete → 0)
//!   [2] = Page Code (only when EVPD=1; else 0)
//!   [3] = Allocation Length (MSB)
//!   [4] = Allocation Length (LSB)
//!   [5] = Control

use anyhow::{Result, bail};

use crate::models::identity::DeviceIdentity;

pub const INQUIRY_OPCODE: u8 = 0x12;
pub const INQUIRY_CDB_LEN: usize = 6;
/// Length of the standard INQUIRY data up to and including the revision.
pub const STANDARD_INQUIRY_LEN: usize = 36;

/// Fill a **Standard INQUIRY (EVPD=0)** CDB.
/// Returns the CDB length used.
#[inline]
pub fn fill_inquiry_standard(cdb: &mut [u8; 16], allocation_len: u8, control: u8) -> usize {
    cdb.fill(0);
    cdb[0] = INQUIRY_OPCODE;
    cdb[1] = 0x00; // EVPD=0
    cdb[2] = 0x00; // page code ignored when EVPD=0
    cdb[3] = 0x00;
    cdb[4] = allocation_len;
    cdb[5] = control;
    INQUIRY_CDB_LEN
}

/// Convenience: Standard INQUIRY for the 36 identity bytes, control=0.
#[inline]
pub fn fill_inquiry_standard_simple(cdb: &mut [u8; 16]) -> usize {
    fill_inquiry_standard(cdb, STANDARD_INQUIRY_LEN as u8, 0x00)
}

/// Parse a Standard INQUIRY (EVPD=0) response (minimum 36 bytes).
///
/// Vendor, product and revision keep their space padding.
pub fn parse_inquiry_standard(buf: &[u8]) -> Result<DeviceIdentity> {
    if buf.len() < STANDARD_INQUIRY_LEN {
        bail!("INQUIRY buffer too short: {}", buf.len());
    }
    Ok(DeviceIdentity {
        device_type: buf[0] & 0x1F,
        vendor: ascii_field(&buf[8..16]),
        product: ascii_field(&buf[16..32]),
        revision: ascii_field(&buf[32..36]),
    })
}

fn ascii_field(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| match b {
            0x20..=0x7E => b as char,
            0 => ' ',
            _ => '?',
        })
        .collect()
}
