// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! MODE SENSE(10): CDB filler that writes into a provided 16-byte buffer,
//! plus the response walker that locates a page after the mode parameter
//! header and block descriptors.

use anyhow::{Result, bail};
use zerocopy::{
    FromBytes, Immutable, KnownLayout,
    byteorder::{BigEndian, U16},
};

use crate::models::mode_page::{MODE_PARAMETER_HEADER10_LEN, PageVariant};

pub const MODE_SENSE_10: u8 = 0x5A;
pub const MODE_SENSE10_CDB_LEN: usize = 10;

#[inline]
fn pc_bits(pc: PageVariant) -> u8 {
    (pc as u8) << 6
}

/// Fill a MODE SENSE(10) CDB into `cdb[0..10]`.
/// Layout:
///   [0]=0x5A, [1]=LLBAA<<4 | DBD<<3, [2]=PC(7..6)|PAGE(5..0), [3]=SUBPAGE,
///   [4..6]=0, [7..8]=ALLOC_LEN(be), [9]=CONTROL
#[allow(clippy::too_many_arguments)]
#[inline]
pub fn fill_mode_sense10(
    cdb: &mut [u8; 16],
    dbd: bool,
    llbaa: bool,
    pc: PageVariant,
    page_code: u8,
    subpage_code: u8,
    allocation_len: u16,
    control: u8,
) -> usize {
    cdb.fill(0);
    cdb[0] = MODE_SENSE_10;
    cdb[1] = ((llbaa as u8) << 4) | ((dbd as u8) << 3);
    cdb[2] = pc_bits(pc) | (page_code & 0x3F);
    cdb[3] = subpage_code;
    let [msb, lsb] = allocation_len.to_be_bytes();
    cdb[7] = msb;
    cdb[8] = lsb;
    cdb[9] = control;
    MODE_SENSE10_CDB_LEN
}

/// Convenience: MODE SENSE(10) for one page control value with DBD=1,
/// LLBAA=0, subpage=0, control=0.
#[inline]
pub fn fill_mode_sense10_simple(
    cdb: &mut [u8; 16],
    pc: PageVariant,
    page_code: u8,
    allocation_len: u16,
) -> usize {
    fill_mode_sense10(cdb, true, false, pc, page_code, 0x00, allocation_len, 0x00)
}

/// Raw 8-byte mode parameter header of MODE SENSE(10) data.
#[repr(C)]
#[derive(FromBytes, KnownLayout, Immutable, Debug)]
pub struct ModeParameterHeader10 {
    /// Bytes following this field (bytes 0-1).
    pub mode_data_len: U16<BigEndian>,
    pub medium_type: u8,
    /// WP / DPOFUA bits.
    pub device_specific: u8,
    /// LONGLBA bit.
    pub flags: u8,
    reserved: u8,
    pub block_descriptor_len: U16<BigEndian>,
}

/// Return the page bytes (starting at the page code) of a MODE SENSE(10)
/// response.
///
/// The page is clipped to the bytes actually transferred and to the length
/// the header announces, whichever is shorter.
pub fn parse_mode_sense10_page(buf: &[u8]) -> Result<&[u8]> {
    let Ok((hdr, _)) = ModeParameterHeader10::ref_from_prefix(buf) else {
        bail!(
            "MODE SENSE(10): need ≥ {MODE_PARAMETER_HEADER10_LEN} bytes, got {}",
            buf.len()
        );
    };
    let total = (usize::from(hdr.mode_data_len.get()) + 2).min(buf.len());
    let offset = MODE_PARAMETER_HEADER10_LEN + usize::from(hdr.block_descriptor_len.get());
    if offset + 2 > total {
        bail!(
            "MODE SENSE(10): no page after header (data len {}, block descriptors {})",
            hdr.mode_data_len.get(),
            hdr.block_descriptor_len.get()
        );
    }
    Ok(&buf[offset..total])
}
