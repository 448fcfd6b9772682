// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Parsing of the VALUE command-line argument.
//!
//! Grammar: `FORCEGET` | `[FORCESET:][save:](on | off | <integer>)`.
//! `FORCESET:` is case-sensitive and must come first, `save:` is
//! case-insensitive. Integers follow C literal rules (`0x` hex, leading `0`
//! octal, otherwise decimal) and must fit in a byte.

use crate::{
    error::LedError,
    models::mode_page::{LED_OFF, LED_ON},
};

const FORCE_GET: &str = "FORCEGET";
const FORCE_SET_PREFIX: &str = "FORCESET:";
const SAVE_PREFIX: &str = "save:";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedMode {
    Read,
    Write(u8),
}

/// What the operator asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Intent {
    pub mode: LedMode,
    /// Ask the device to also store the value in its saved page.
    pub persist: bool,
    /// Skip the supported vendor/product check.
    pub force_qualification: bool,
}

impl Default for Intent {
    fn default() -> Self {
        Self {
            mode: LedMode::Read,
            persist: false,
            force_qualification: false,
        }
    }
}

impl Intent {
    /// Parse the optional VALUE argument.
    pub fn parse(arg: Option<&str>) -> Result<Self, LedError> {
        let Some(arg) = arg else {
            return Ok(Self::default());
        };
        if arg == FORCE_GET {
            return Ok(Self {
                force_qualification: true,
                ..Self::default()
            });
        }

        let (force_qualification, rest) = match arg.strip_prefix(FORCE_SET_PREFIX) {
            Some(rest) => (true, rest),
            None => (false, arg),
        };
        let (persist, rest) = match strip_prefix_ignore_case(rest, SAVE_PREFIX) {
            Some(rest) => (true, rest),
            None => (false, rest),
        };

        let value = match rest {
            "off" => LED_OFF,
            "on" => LED_ON,
            other => parse_c_integer(other)
                .and_then(|v| u8::try_from(v).ok())
                .ok_or_else(|| LedError::UnknownValue(other.to_string()))?,
        };

        Ok(Self {
            mode: LedMode::Write(value),
            persist,
            force_qualification,
        })
    }

    #[inline]
    pub fn is_read_only(&self) -> bool {
        matches!(self.mode, LedMode::Read)
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

/// Integer literal with `strtol(s, &end, 0)` semantics, accepted only when
/// the whole string is consumed and at least one digit is present.
fn parse_c_integer(s: &str) -> Option<i64> {
    let s = s.trim_start_matches(|c: char| c.is_ascii_whitespace());
    let (negative, s) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let hex = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .filter(|h| h.starts_with(|c: char| c.is_ascii_hexdigit()));
    let (radix, digits) = match hex {
        Some(h) => (16, h),
        None if s.len() > 1 && s.starts_with('0') => (8, &s[1..]),
        None => (10, s),
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let v = i64::from_str_radix(digits, radix).ok()?;
    Some(if negative { -v } else { v })
}
