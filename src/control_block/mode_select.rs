// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! MODE SELECT(10): CDB filler that writes into a provided 16-byte buffer.
//!
//! CDB layout (SPC):
//!   [0]    = 0x55 (MODE SELECT(10))
//!   [1]    = PF (bit 4) | SP (bit 0)
//!   [2..7] = reserved
//!   [7..9] = PARAMETER LIST LENGTH (big-endian)
//!   [9]    = CONTROL

pub const MODE_SELECT_10: u8 = 0x55;
pub const MODE_SELECT10_CDB_LEN: usize = 10;

const PF_BIT: u8 = 0b0001_0000;
const SP_BIT: u8 = 0b0000_0001;

/// Fill a MODE SELECT(10) CDB into `cdb[0..10]` and return its length.
///
/// * `page_format` – parameter list uses the page format (PF)
/// * `save_pages`  – device also stores the pages as saved values (SP)
#[inline]
pub fn fill_mode_select10(
    cdb: &mut [u8; 16],
    page_format: bool,
    save_pages: bool,
    parameter_list_len: u16,
    control: u8,
) -> usize {
    cdb.fill(0);
    cdb[0] = MODE_SELECT_10;
    if page_format {
        cdb[1] |= PF_BIT;
    }
    if save_pages {
        cdb[1] |= SP_BIT;
    }
    cdb[7..9].copy_from_slice(&parameter_list_len.to_be_bytes());
    cdb[9] = control;
    MODE_SELECT10_CDB_LEN
}
