// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use thiserror::Error;

use crate::{models::mode_page::PageIntegrityError, transport::TransportError};

/// Every way a run can fail. All of them are fatal.
#[derive(Debug, Error)]
pub enum LedError {
    /// VALUE argument did not parse.
    #[error("Unknown value: {0}")]
    UnknownValue(String),
    /// Configuration file could not be loaded or is invalid.
    #[error("Config error ({0:#})")]
    Config(anyhow::Error),
    #[error("Failed to open ({0})")]
    Open(#[source] TransportError),
    #[error("Inquiry failed ({0})")]
    Identity(#[source] TransportError),
    #[error("Unknown or unsupported vendor!")]
    UnsupportedVendor,
    #[error("Unknown or unsupported product!")]
    UnsupportedProduct,
    #[error("Get mode page failed ({0})")]
    PageFetch(#[source] TransportError),
    #[error(transparent)]
    PageIntegrity(#[from] PageIntegrityError),
    #[error("Set mode page failed ({0})")]
    Write(#[source] TransportError),
    /// Diagnostic or report stream could not be written.
    #[error("Output failed ({0})")]
    Output(#[from] std::io::Error),
    /// Controller step ran before the one that fills its input.
    #[error("Internal error ({0})")]
    State(&'static str),
}

impl LedError {
    /// Usage errors are printed bare, everything else is prefixed with the
    /// device path.
    #[inline]
    pub fn is_usage(&self) -> bool {
        matches!(self, LedError::UnknownValue(_))
    }

    /// Format the message the way it is printed on stderr.
    pub fn diagnostic(&self, device: &str) -> String {
        if self.is_usage() {
            self.to_string()
        } else {
            format!("{device}: ERROR: {self}")
        }
    }
}
