// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{
    fs,
    path::PathBuf,
    sync::atomic::{AtomicU32, Ordering},
    time::Duration,
};

use anyhow::Result;
use wdled::{
    cfg::{
        config::Config,
        enums::{LogFormat, LogOutput, RotationFrequency},
    },
    models::{identity::DeviceIdentity, supported::Qualification},
};

static SEQ: AtomicU32 = AtomicU32::new(0);

/// Write `yaml` to a fresh file under the temp dir.
fn temp_config(yaml: &str) -> Result<PathBuf> {
    let n = SEQ.fetch_add(1, Ordering::Relaxed);
    let path = std::env::temp_dir().join(format!("wdled-test-{}-{n}.yaml", std::process::id()));
    fs::write(&path, yaml)?;
    Ok(path)
}

#[test]
fn full_config_file() -> Result<()> {
    let path = temp_config(
        r#"
supported:
  - vendor: WD
    products:
      - My Passport 0837
      - Elements 25A3
transport:
  timeout_secs: 5
logger:
  level: wdled=debug
  output: file
  format: json
  is_show_line: true
  file:
    path: /tmp/wdled.log
    rotation_frequency: daily
"#,
    )?;
    let cfg = Config::load(Some(path.as_os_str()))?;
    fs::remove_file(&path)?;

    assert_eq!(cfg.transport.timeout, Duration::from_secs(5));
    assert_eq!(cfg.logger.output, LogOutput::File);
    assert_eq!(cfg.logger.format, LogFormat::Json);
    assert!(cfg.logger.is_show_line);
    let file = cfg.logger.file.as_ref().expect("WTF");
    assert_eq!(file.rotation_frequency, RotationFrequency::Daily);

    let id = DeviceIdentity::new("WD      ", "Elements 25A3   ", "1012");
    assert_eq!(cfg.supported.qualify(&id), Qualification::Supported);
    // table replaced, not merged
    let id = DeviceIdentity::new("WD      ", "My Passport 25E2", "1012");
    assert_eq!(cfg.supported.qualify(&id), Qualification::UnknownProduct);
    Ok(())
}

#[test]
fn invalid_file_is_an_error() -> Result<()> {
    let path = temp_config("supported:\n  - vendor: WESTERNDIGITAL\n    products: [x]\n")?;
    let err = Config::load(Some(path.as_os_str())).expect_err("must fail");
    fs::remove_file(&path)?;
    assert!(format!("{err:#}").contains("longer than 8 bytes"), "{err:#}");
    Ok(())
}

#[test]
fn missing_file_is_an_error() {
    let path = std::env::temp_dir().join("wdled-test-does-not-exist.yaml");
    assert!(Config::load(Some(path.as_os_str())).is_err());
}

#[test]
fn malformed_yaml_is_an_error() -> Result<()> {
    let path = temp_config("transport: [1, 2\n")?;
    let res = Config::load(Some(path.as_os_str()));
    fs::remove_file(&path)?;
    assert!(res.is_err());
    Ok(())
}
