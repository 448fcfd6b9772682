// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use core::fmt;

/// Identity strings of a device, as returned by standard INQUIRY.
///
/// All strings are kept byte-exact, trailing spaces included: the supported
/// device table matches them as-is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceIdentity {
    /// Peripheral device type (byte 0, bits 4..0).
    pub device_type: u8,
    /// T10 vendor identification, 8 bytes.
    pub vendor: String,
    /// Product identification, 16 bytes.
    pub product: String,
    /// Product revision level, 4 bytes.
    pub revision: String,
}

impl DeviceIdentity {
    pub fn new(
        vendor: impl Into<String>,
        product: impl Into<String>,
        revision: impl Into<String>,
    ) -> Self {
        Self {
            device_type: 0,
            vendor: vendor.into(),
            product: product.into(),
            revision: revision.into(),
        }
    }

    pub fn device_type_str(&self) -> &'static str {
        match self.device_type {
            0x00 => "Direct-access block (disk)",
            0x05 => "CD/DVD",
            0x07 => "Optical memory",
            0x0D => "Enclosure services",
            0x0E => "RBC",
            _ => "Other",
        }
    }
}

/// `<vendor> <product> (rev <revision>)`, the form printed after opening.
impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} (rev {})", self.vendor, self.product, self.revision)
    }
}
