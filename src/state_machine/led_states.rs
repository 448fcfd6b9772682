// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Read / write flow for the LED page.
//!
//! `Start → Opened → Identified → Qualified → PageFetched → Validated →
//! Reported → [write] → Done`. Any error ends the run; nothing is retried
//! and a failed MODE SELECT is not rolled back.

use std::io::Write;

use tracing::{debug, warn};

use crate::{
    error::LedError,
    models::{
        identity::DeviceIdentity,
        intent::{Intent, LedMode},
        mode_page::{LedValues, ModePageRecord, ModePageSet, ModeSelectPacket, PAGE_CODE},
        supported::{Qualification, SupportedDeviceTable},
    },
    state_machine::common::{StateMachine, StateMachineCtx, Transition},
    transport::{ScsiDevice, ScsiTransport},
};

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedOutcome {
    pub identity: DeviceIdentity,
    /// Values before any write.
    pub values: LedValues,
    /// Page sent with MODE SELECT, if a write was requested.
    pub written: Option<ModePageRecord>,
    pub persisted: bool,
}

pub struct LedCtx<'a, T: ScsiTransport> {
    pub transport: &'a T,
    pub device_path: &'a str,
    pub intent: Intent,
    pub table: &'a SupportedDeviceTable,
    /// Report stream (stdout).
    out: &'a mut dyn Write,
    /// Diagnostic stream (stderr).
    diag: &'a mut dyn Write,

    device: Option<T::Device>,
    identity: Option<DeviceIdentity>,
    pages: Option<ModePageSet>,
    values: Option<LedValues>,
    written: Option<ModePageRecord>,
}

impl<'a, T: ScsiTransport> LedCtx<'a, T> {
    pub fn new(
        transport: &'a T,
        device_path: &'a str,
        intent: Intent,
        table: &'a SupportedDeviceTable,
        out: &'a mut dyn Write,
        diag: &'a mut dyn Write,
    ) -> Self {
        Self {
            transport,
            device_path,
            intent,
            table,
            out,
            diag,
            device: None,
            identity: None,
            pages: None,
            values: None,
            written: None,
        }
    }

    fn device(&mut self) -> Result<&mut T::Device, LedError> {
        self.device.as_mut().ok_or(LedError::State("device is not open"))
    }

    fn identity(&self) -> Result<&DeviceIdentity, LedError> {
        self.identity
            .as_ref()
            .ok_or(LedError::State("device not identified"))
    }

    fn pages(&self) -> Result<&ModePageSet, LedError> {
        self.pages.as_ref().ok_or(LedError::State("mode page not read"))
    }

    fn open(&mut self) -> Result<(), LedError> {
        if self.intent.force_qualification {
            writeln!(self.diag, "WARNING: Skipping supported vendor/product checks!")?;
        }
        let read_only = self.intent.is_read_only();
        let device = self
            .transport
            .open(self.device_path, read_only)
            .map_err(LedError::Open)?;
        self.device = Some(device);
        Ok(())
    }

    fn identify(&mut self) -> Result<(), LedError> {
        let identity = self.device()?.inquiry().map_err(LedError::Identity)?;
        writeln!(self.diag, "{}: {identity}", self.device_path)?;
        self.identity = Some(identity);
        Ok(())
    }

    fn qualify(&mut self) -> Result<(), LedError> {
        let verdict = self.table.qualify(self.identity()?);
        let forced = self.intent.force_qualification;
        match verdict {
            Qualification::Supported => Ok(()),
            Qualification::UnknownVendor if forced => {
                warn!(device = self.device_path, "vendor check skipped");
                writeln!(self.diag, "MANUALLY SKIPPED UNSUPPORTED VENDOR CHECK!")?;
                Ok(())
            },
            Qualification::UnknownProduct if forced => {
                warn!(device = self.device_path, "product check skipped");
                writeln!(self.diag, "MANUALLY SKIPPED UNSUPPORTED DEVICE CHECK!")?;
                Ok(())
            },
            Qualification::UnknownVendor => Err(LedError::UnsupportedVendor),
            Qualification::UnknownProduct => Err(LedError::UnsupportedProduct),
        }
    }

    fn fetch_pages(&mut self) -> Result<(), LedError> {
        let pages = self
            .device()?
            .mode_page_variants(PAGE_CODE)
            .map_err(LedError::PageFetch)?;
        debug!(
            current = ?pages.current,
            changeable = ?pages.changeable,
            default = ?pages.default,
            saved = ?pages.saved,
            "mode page"
        );
        self.pages = Some(pages);
        Ok(())
    }

    fn validate(&mut self) -> Result<(), LedError> {
        self.pages()?.validate()?;
        Ok(())
    }

    fn report(&mut self) -> Result<(), LedError> {
        let values = self.pages()?.led_values();
        writeln!(self.out, "{values}")?;
        self.values = Some(values);
        Ok(())
    }

    fn write_led(&mut self, value: u8) -> Result<(), LedError> {
        let page = self.pages()?.current.with_led(value);
        let packet = ModeSelectPacket::new(&page);
        let persist = self.intent.persist;
        debug!(value, persist, "writing LED page");
        self.device()?
            .mode_select10(true, persist, packet.as_bytes())
            .map_err(LedError::Write)?;
        self.written = Some(page);
        Ok(())
    }

    fn outcome(&mut self) -> Result<LedOutcome, LedError> {
        Ok(LedOutcome {
            identity: self
                .identity
                .take()
                .ok_or(LedError::State("device not identified"))?,
            values: self.values.ok_or(LedError::State("values not reported"))?,
            written: self.written,
            persisted: self.written.is_some() && self.intent.persist,
        })
    }
}

#[derive(Debug)]
pub struct Start;
#[derive(Debug)]
pub struct Opened;
#[derive(Debug)]
pub struct Identified;
#[derive(Debug)]
pub struct Qualified;
#[derive(Debug)]
pub struct PageFetched;
#[derive(Debug)]
pub struct Validated;
#[derive(Debug)]
pub struct Reported;

#[derive(Debug)]
pub enum LedStates {
    Start(Start),
    Opened(Opened),
    Identified(Identified),
    Qualified(Qualified),
    PageFetched(PageFetched),
    Validated(Validated),
    Reported(Reported),
}

type LedStepOut = Transition<LedStates, Result<(), LedError>>;

#[inline]
fn advance(r: Result<(), LedError>, next: LedStates) -> LedStepOut {
    match r {
        Ok(()) => Transition::Next(next, Ok(())),
        Err(e) => Transition::Done(Err(e)),
    }
}

impl<'ctx, T: ScsiTransport> StateMachine<LedCtx<'ctx, T>, LedStepOut> for Start {
    fn step(&self, ctx: &mut LedCtx<'ctx, T>) -> LedStepOut {
        advance(ctx.open(), LedStates::Opened(Opened))
    }
}

impl<'ctx, T: ScsiTransport> StateMachine<LedCtx<'ctx, T>, LedStepOut> for Opened {
    fn step(&self, ctx: &mut LedCtx<'ctx, T>) -> LedStepOut {
        advance(ctx.identify(), LedStates::Identified(Identified))
    }
}

impl<'ctx, T: ScsiTransport> StateMachine<LedCtx<'ctx, T>, LedStepOut> for Identified {
    fn step(&self, ctx: &mut LedCtx<'ctx, T>) -> LedStepOut {
        advance(ctx.qualify(), LedStates::Qualified(Qualified))
    }
}

impl<'ctx, T: ScsiTransport> StateMachine<LedCtx<'ctx, T>, LedStepOut> for Qualified {
    fn step(&self, ctx: &mut LedCtx<'ctx, T>) -> LedStepOut {
        advance(ctx.fetch_pages(), LedStates::PageFetched(PageFetched))
    }
}

impl<'ctx, T: ScsiTransport> StateMachine<LedCtx<'ctx, T>, LedStepOut> for PageFetched {
    fn step(&self, ctx: &mut LedCtx<'ctx, T>) -> LedStepOut {
        advance(ctx.validate(), LedStates::Validated(Validated))
    }
}

impl<'ctx, T: ScsiTransport> StateMachine<LedCtx<'ctx, T>, LedStepOut> for Validated {
    fn step(&self, ctx: &mut LedCtx<'ctx, T>) -> LedStepOut {
        advance(ctx.report(), LedStates::Reported(Reported))
    }
}

impl<'ctx, T: ScsiTransport> StateMachine<LedCtx<'ctx, T>, LedStepOut> for Reported {
    fn step(&self, ctx: &mut LedCtx<'ctx, T>) -> LedStepOut {
        match ctx.intent.mode {
            LedMode::Read => Transition::Done(Ok(())),
            LedMode::Write(value) => Transition::Done(ctx.write_led(value)),
        }
    }
}

impl<'ctx, T: ScsiTransport> StateMachineCtx<LedCtx<'ctx, T>, LedOutcome> for LedCtx<'ctx, T> {
    fn execute(&mut self) -> Result<LedOutcome, LedError> {
        debug!(device = self.device_path, intent = ?self.intent, "Loop LED");

        let mut state = LedStates::Start(Start);
        loop {
            let tr = match &state {
                LedStates::Start(s) => s.step(self),
                LedStates::Opened(s) => s.step(self),
                LedStates::Identified(s) => s.step(self),
                LedStates::Qualified(s) => s.step(self),
                LedStates::PageFetched(s) => s.step(self),
                LedStates::Validated(s) => s.step(self),
                LedStates::Reported(s) => s.step(self),
            };

            match tr {
                Transition::Next(next, r) => {
                    r?;
                    debug!(state = ?next, "LED transition");
                    state = next;
                },
                Transition::Done(r) => {
                    r?;
                    return self.outcome();
                },
            }
        }
    }
}
