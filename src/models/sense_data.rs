// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::fmt;

use anyhow::{Result, anyhow};

/// Fixed-format sense data must be at least 14 bytes to reach ASC/ASCQ.
pub const FIXED_MIN_LEN: usize = 14;
/// Descriptor-format sense header.
pub const DESCRIPTOR_MIN_LEN: usize = 8;

pub const SENSE_KEY_NO_SENSE: u8 = 0x00;
pub const SENSE_KEY_RECOVERED_ERROR: u8 = 0x01;
pub const SENSE_KEY_ILLEGAL_REQUEST: u8 = 0x05;

const SENSE_KEY_DESCRIPTIONS: [&str; 16] = [
    "No Sense",
    "Recovered Error",
    "Not Ready",
    "Medium Error",
    "Hardware Error",
    "Illegal Request",
    "Unit Attention",
    "Data Protect",
    "Blank Check",
    "Vendor specific",
    "Copy Aborted",
    "Aborted Command",
    "Equal",
    "Volume Overflow",
    "Miscompare",
    "Completed",
];

/// Key fields of SPC-4 sense data, fixed (0x70/0x71) or descriptor
/// (0x72/0x73) format.
#[derive(Default, Clone, Copy, PartialEq, Eq)]
pub struct SenseData {
    pub response_code: u8, // low-7 bits of byte0
    pub sense_key: u8,
    pub asc: u8,
    pub ascq: u8,
}

impl SenseData {
    /// Parse sense data as returned in the SG_IO sense buffer.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        let b0 = *buf.first().ok_or_else(|| anyhow!("empty sense buffer"))?;
        let response_code = b0 & 0x7F;
        match response_code {
            0x70 | 0x71 => {
                if buf.len() < FIXED_MIN_LEN {
                    return Err(anyhow!(
                        "fixed sense too small: {} < {FIXED_MIN_LEN}",
                        buf.len()
                    ));
                }
                Ok(Self {
                    response_code,
                    sense_key: buf[2] & 0x0F,
                    asc: buf[12],
                    ascq: buf[13],
                })
            },
            0x72 | 0x73 => {
                if buf.len() < DESCRIPTOR_MIN_LEN {
                    return Err(anyhow!(
                        "descriptor sense too small: {} < {DESCRIPTOR_MIN_LEN}",
                        buf.len()
                    ));
                }
                Ok(Self {
                    response_code,
                    sense_key: buf[1] & 0x0F,
                    asc: buf[2],
                    ascq: buf[3],
                })
            },
            other => Err(anyhow!("unknown sense response code {other:#04x}")),
        }
    }

    /// Sense keys that do not indicate a failed command.
    #[inline]
    pub fn is_benign(&self) -> bool {
        matches!(
            self.sense_key,
            SENSE_KEY_NO_SENSE | SENSE_KEY_RECOVERED_ERROR
        )
    }

    pub fn sense_key_str(&self) -> &'static str {
        SENSE_KEY_DESCRIPTIONS[usize::from(self.sense_key & 0x0F)]
    }
}

impl fmt::Display for SenseData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.asc == 0 && self.ascq == 0 {
            f.write_str(self.sense_key_str())
        } else {
            write!(
                f,
                "{}, {}",
                self.sense_key_str(),
                asc_ascq_to_str(self.asc, self.ascq)
            )
        }
    }
}

impl fmt::Debug for SenseData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SenseData")
            .field(
                "response_code",
                &format_args!("{:#04x}", self.response_code),
            )
            .field("sense_key", &format_args!("{:#x}", self.sense_key))
            .field("asc", &format_args!("{:#04x}", self.asc))
            .field("ascq", &format_args!("{:#04x}", self.ascq))
            .field("description", &asc_ascq_to_str(self.asc, self.ascq))
            .finish()
    }
}

/// Return the SPC-4 description for a given ASC/ASCQ pair.
///
/// * If the pair is not present in the table, returns `"UNSPECIFIED / vendor
///   specific"`.
#[inline]
pub fn asc_ascq_to_str(asc: u8, ascq: u8) -> &'static str {
    hot_table(asc, ascq).unwrap_or("UNSPECIFIED / vendor specific")
}

fn hot_table(asc: u8, ascq: u8) -> Option<&'static str> {
    Some(match (asc, ascq) {
        (0x00, 0x00) => "No additional sense information",
        (0x04, 0x00) => "Logical unit not ready, cause not reportable",
        (0x04, 0x01) => "Logical unit is in process of becoming ready",
        (0x1A, 0x00) => "Parameter list length error",
        (0x20, 0x00) => "Invalid command operation code",
        (0x24, 0x00) => "Invalid field in CDB",
        (0x25, 0x00) => "Logical unit not supported",
        (0x26, 0x00) => "Invalid field in parameter list",
        (0x26, 0x01) => "Parameter not supported",
        (0x26, 0x02) => "Parameter value invalid",
        (0x28, 0x00) => "Not ready to ready change, medium may have changed",
        (0x29, 0x00) => "Power on, reset, or bus device reset occurred",
        (0x2A, 0x01) => "Mode parameters changed",
        (0x39, 0x00) => "Saving parameters not supported",
        (0x3A, 0x00) => "Medium not present",
        (0x40, 0x00) => "Data integrity error",
        _ => return None,
    })
}
