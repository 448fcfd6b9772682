//! Read and toggle the activity LED of WD My Passport disks through the
//! vendor-specific SCSI mode page `0x21`.
// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

/// Handles configuration, command-line parsing, and logging.
pub mod cfg;
/// Builders and parsers for the SCSI commands in use (control blocks).
pub mod control_block;
/// Fatal error taxonomy and its operator-facing rendering.
pub mod error;
/// Mode page records, identity, operator intent and the allow-list.
pub mod models;
/// Contains the state machine that runs one invocation.
pub mod state_machine;
/// SCSI transport trait and the Linux SG_IO backend.
pub mod transport;

pub use error::LedError;
