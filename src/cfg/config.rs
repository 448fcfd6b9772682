// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{ffi::OsStr, fs, path::Path, time::Duration};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::{
    cfg::{
        cli::resolve_config_path,
        enums::{LogFormat, LogOutput, RotationFrequency},
    },
    models::supported::{PRODUCT_LEN, SupportedDeviceTable, VENDOR_LEN},
    transport::sg::DEFAULT_TIMEOUT,
};

/// Environment variable naming the YAML config file.
pub const CONFIG_ENV: &str = "WDLED_CONFIG";

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Config {
    /// Allow-list; replaces the built-in table when present.
    #[serde(default)]
    pub supported: SupportedDeviceTable,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub logger: LoggerConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TransportConfig {
    /// Per-command SG_IO timeout.
    #[serde(rename = "timeout_secs", with = "serde_secs", default = "default_timeout")]
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LoggerConfig {
    /// `EnvFilter` directive, `off` disables logging.
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub output: LogOutput,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default)]
    pub is_show_line: bool,
    #[serde(default)]
    pub is_show_module_path: bool,
    #[serde(default)]
    pub is_show_target: bool,
    /// Required when `output` is `file`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<LogFileConfig>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            output: LogOutput::default(),
            format: LogFormat::default(),
            is_show_line: false,
            is_show_module_path: false,
            is_show_target: false,
            file: None,
        }
    }
}

fn default_level() -> String {
    "off".to_string()
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LogFileConfig {
    pub path: String,
    #[serde(default)]
    pub rotation_frequency: RotationFrequency,
}

impl Config {
    /// Built-in defaults when `path` is `None`, the file at `path` otherwise.
    pub fn load(path: Option<&OsStr>) -> Result<Self> {
        match path {
            None => Ok(Self::default()),
            Some(p) => resolve_config_path(p).and_then(Self::load_from_file),
        }
    }

    /// Loads the configuration from YAML, validates it, and returns the
    /// ready-to-use value.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut cfg: Config =
            serde_yaml::from_str(&s).context("failed to parse config YAML")?;
        cfg.validate_and_normalize()?;
        Ok(cfg)
    }

    /// Validates invariants and pads identification strings to their
    /// INQUIRY widths.
    pub fn validate_and_normalize(&mut self) -> Result<()> {
        ensure!(
            !self.supported.entries().is_empty(),
            "supported must list at least one vendor"
        );
        for entry in self.supported.entries_mut() {
            entry.vendor = normalize_field(&entry.vendor, VENDOR_LEN)
                .with_context(|| format!("vendor {:?}", entry.vendor))?;
            ensure!(
                !entry.products.is_empty(),
                "vendor {:?} has no products",
                entry.vendor
            );
            for product in &mut entry.products {
                *product = normalize_field(product, PRODUCT_LEN)
                    .with_context(|| format!("product {product:?}"))?;
            }
        }

        ensure!(
            self.transport.timeout >= Duration::from_secs(1),
            "timeout_secs must be >= 1"
        );

        ensure!(
            !self.logger.level.trim().is_empty(),
            "logger level must not be empty"
        );
        if self.logger.output == LogOutput::File {
            let file = self
                .logger
                .file
                .as_ref()
                .context("logger output is file but no file section given")?;
            ensure!(!file.path.is_empty(), "logger file path must not be empty");
        }

        Ok(())
    }
}

/// Space-pad `s` to `width` bytes.
fn normalize_field(s: &str, width: usize) -> Result<String> {
    ensure!(!s.trim().is_empty(), "must not be empty");
    ensure!(s.is_ascii(), "must be ASCII");
    ensure!(s.len() <= width, "longer than {width} bytes");
    Ok(format!("{s:<width$}"))
}

/// Serde helpers for representing `Duration` as a number of seconds.
mod serde_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}
