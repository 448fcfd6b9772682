// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::models::supported::SupportedDeviceTable;

pub fn resolve_config_path<P: AsRef<Path>>(rel: P) -> Result<PathBuf> {
    let p = rel.as_ref();

    let abs = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()
            .context("cannot get current working dir")?
            .join(p)
    };

    let canon = abs
        .canonicalize()
        .with_context(|| format!("failed to canonicalize path {abs:?}"))?;

    Ok(canon)
}

/// What the command line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Help,
    Run {
        device: String,
        value: Option<String>,
    },
}

/// `args` includes the program name. Help is chosen when the first
/// argument is a help flag or the argument count is not one or two.
pub fn parse_args<S: AsRef<str>>(args: &[S]) -> Invocation {
    match args {
        [_, first, ..] if matches!(first.as_ref(), "--help" | "-help" | "-h") => Invocation::Help,
        [_, device] => Invocation::Run {
            device: device.as_ref().to_string(),
            value: None,
        },
        [_, device, value] => Invocation::Run {
            device: device.as_ref().to_string(),
            value: Some(value.as_ref().to_string()),
        },
        _ => Invocation::Help,
    }
}

/// Usage text followed by the allow-list.
pub fn write_help(w: &mut dyn Write, program: &str, table: &SupportedDeviceTable) -> io::Result<()> {
    writeln!(
        w,
        "{} {} - Control the LED mode of WD My Passport Disks",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )?;
    writeln!(w, "Usage: {program} DEVICE [VALUE]")?;
    writeln!(
        w,
        "  DEVICE: SCSI device to control (e.g /dev/disk/by-id/usb-WD_My_Passport_...)"
    )?;
    writeln!(w, "  VALUE:  LED mode to set ('on' or 'off', 0 or 255)")?;
    writeln!(w, "          Omit to read current mode")?;
    writeln!(
        w,
        "          Prefix with 'save:' to have the disk remember the LED mode"
    )?;
    writeln!(w)?;
    writeln!(w, "Example: (to turn the LED off permanently)")?;
    writeln!(w, "  {program} /dev/disk/by-id/usb-WD_My_Passport_foo save:off")?;
    writeln!(w)?;
    writeln!(w, "Supported devices:")?;
    for (vendor, product) in table.pairs() {
        writeln!(w, "  {vendor} {product}")?;
    }
    Ok(())
}
