// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Allow-list of devices whose vendor page layout has been verified.

use serde::{Deserialize, Serialize};

use crate::models::identity::DeviceIdentity;

/// INQUIRY vendor identification width.
pub const VENDOR_LEN: usize = 8;
/// INQUIRY product identification width.
pub const PRODUCT_LEN: usize = 16;

const WD_VENDOR: &str = "WD      ";
const WD_PRODUCTS: [&str; 7] = [
    "My Passport 0837",
    "My Passport 259D",
    "My Passport 259E",
    "My Passport 259F",
    "My Passport 259A",
    "My Passport 25E1",
    "My Passport 25E2",
];

/// One vendor and the products verified under it.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SupportedDevice {
    pub vendor: String,
    pub products: Vec<String>,
}

/// Outcome of matching a device identity against the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualification {
    Supported,
    UnknownVendor,
    UnknownProduct,
}

impl Qualification {
    #[inline]
    pub fn is_supported(self) -> bool {
        matches!(self, Qualification::Supported)
    }
}

/// Ordered, read-only list of supported devices.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct SupportedDeviceTable {
    entries: Vec<SupportedDevice>,
}

impl Default for SupportedDeviceTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SupportedDeviceTable {
    pub fn new(entries: Vec<SupportedDevice>) -> Self {
        Self { entries }
    }

    /// Models verified to carry the LED page.
    pub fn builtin() -> Self {
        Self::new(vec![SupportedDevice {
            vendor: WD_VENDOR.to_string(),
            products: WD_PRODUCTS.iter().map(|p| p.to_string()).collect(),
        }])
    }

    pub fn entries(&self) -> &[SupportedDevice] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [SupportedDevice] {
        &mut self.entries
    }

    /// Flattened `(vendor, product)` pairs in table order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().flat_map(|e| {
            e.products
                .iter()
                .map(move |p| (e.vendor.as_str(), p.as_str()))
        })
    }

    /// Exact, case-sensitive match. Only the first entry with a matching
    /// vendor is searched for the product.
    pub fn qualify(&self, identity: &DeviceIdentity) -> Qualification {
        let Some(entry) = self.entries.iter().find(|e| e.vendor == identity.vendor) else {
            return Qualification::UnknownVendor;
        };
        if entry.products.iter().any(|p| *p == identity.product) {
            Qualification::Supported
        } else {
            Qualification::UnknownProduct
        }
    }
}
