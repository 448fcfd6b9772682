//! State machine driving one LED read or write.

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

/// Common structures and traits for state machines.
pub mod common;
/// Open, identify, qualify, read, validate, report and write.
pub mod led_states;
