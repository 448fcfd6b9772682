// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::process::{Command, Output};

use anyhow::{Context, Result};

/// Run the binary with `args`, logging off and no config file.
pub fn wdled(args: &[&str]) -> Result<Output> {
    Command::new(env!("CARGO_BIN_EXE_wdled"))
        .args(args)
        .env_remove("WDLED_CONFIG")
        .env_remove("WDLED_LOG")
        .output()
        .context("failed to spawn wdled")
}

pub fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}
