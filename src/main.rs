// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{
    io::{self, Write},
    process::ExitCode,
};

use tracing::{debug, info_span};
use wdled::{
    LedError,
    cfg::{
        cli::{Invocation, parse_args, write_help},
        config::{CONFIG_ENV, Config},
        logger::init_logger,
    },
    models::intent::Intent,
    state_machine::{common::StateMachineCtx, led_states::LedCtx},
    transport::sg::SgTransport,
};

fn load_config() -> anyhow::Result<Config> {
    Config::load(std::env::var_os(CONFIG_ENV).as_deref())
}

fn run(device: &str, value: Option<&str>) -> Result<(), LedError> {
    let intent = Intent::parse(value)?;
    let config = load_config().map_err(LedError::Config)?;
    let _guard = init_logger(&config.logger).map_err(LedError::Config)?;
    let _span = info_span!("wdled", device).entered();

    let transport = SgTransport::new(config.transport.timeout);
    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut out = stdout.lock();
    let mut diag = stderr.lock();

    let outcome = LedCtx::new(
        &transport,
        device,
        intent,
        &config.supported,
        &mut out,
        &mut diag,
    )
    .execute()?;
    debug!(?outcome, "done");
    Ok(())
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map_or(env!("CARGO_PKG_NAME"), String::as_str);

    match parse_args(&args) {
        Invocation::Help => {
            let table = load_config().map(|c| c.supported).unwrap_or_default();
            let _ = write_help(&mut io::stderr().lock(), program, &table);
            ExitCode::FAILURE
        },
        Invocation::Run { device, value } => match run(&device, value.as_deref()) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                let _ = writeln!(io::stderr().lock(), "{}", e.diagnostic(&device));
                ExitCode::FAILURE
            },
        },
    }
}
