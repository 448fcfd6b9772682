// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! SCSI transport seam.
//!
//! The LED controller only needs four operations: open a device, INQUIRY,
//! read the four variants of one mode page, and MODE SELECT(10). Anything
//! implementing [`ScsiTransport`] can drive it, the Linux SG_IO backend in
//! [`sg`] or an in-memory fake.

use thiserror::Error;

use crate::models::{identity::DeviceIdentity, mode_page::ModePageSet, sense_data::SenseData};

/// Linux SG_IO backend.
pub mod sg;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Command completed with CHECK CONDITION.
    #[error("{0}")]
    Sense(SenseData),
    #[error(
        "SCSI status {status:#04x}, host status {host_status:#06x}, driver status \
         {driver_status:#06x}"
    )]
    Status {
        status: u8,
        host_status: u16,
        driver_status: u16,
    },
    /// Response data did not have the expected shape.
    #[error("{0:#}")]
    Malformed(#[from] anyhow::Error),
    #[error("SCSI pass-through is not supported on this platform")]
    Unsupported,
}

/// Opens device handles.
pub trait ScsiTransport {
    type Device: ScsiDevice;

    /// Open `path` read-only or read-write.
    fn open(&self, path: &str, read_only: bool) -> Result<Self::Device, TransportError>;
}

/// Commands issued against one open device.
pub trait ScsiDevice {
    /// Standard INQUIRY.
    fn inquiry(&mut self) -> Result<DeviceIdentity, TransportError>;

    /// Read the current, changeable, default and saved values of
    /// `page_code`, each truncated or zero-filled to the record size.
    fn mode_page_variants(&mut self, page_code: u8) -> Result<ModePageSet, TransportError>;

    /// MODE SELECT(10) with `params` as the parameter list.
    fn mode_select10(
        &mut self,
        page_format: bool,
        save_pages: bool,
        params: &[u8],
    ) -> Result<(), TransportError>;
}
