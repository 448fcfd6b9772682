// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Vendor mode page 0x21 as exposed by WD My Passport bridges.
//!
//! Wire layout of one page as MODE SENSE returns it (after the mode
//! parameter header and block descriptors):
//!   [0]    = PS(7) | SPF(6) | PAGE CODE(5..0)
//!   [1]    = PAGE LENGTH (bytes following this one)
//!   [2]    = magic, always 0x30 on known firmware
//!   [3..5] = zero
//!   [5]    = unknown flags, some bits changeable
//!   [6..8] = zero
//!   [8]    = LED control (0x00 off, 0xFF on)
//!   [9..12]= zero
//!
//! Only the first ten payload bytes have a known meaning; the record keeps
//! 32 bytes of payload so a longer page from other firmware is captured
//! instead of silently cut at ten.

use core::fmt;

use thiserror::Error;
use zerocopy::{FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout};

/// Vendor page code of the LED page.
pub const PAGE_CODE: u8 = 0x21;
/// First payload byte of every page seen so far.
pub const PAGE_MAGIC: u8 = 0x30;
/// Payload bytes reserved in a [`ModePageRecord`].
pub const PAYLOAD_CAPACITY: usize = 32;
/// Page header (code + length) size.
pub const PAGE_HEADER_LEN: usize = 2;
/// Full in-memory size of a [`ModePageRecord`].
pub const RECORD_LEN: usize = PAGE_HEADER_LEN + PAYLOAD_CAPACITY;
/// Number of payload bytes the LED page defines.
pub const LED_PAYLOAD_LEN: usize = core::mem::size_of::<LedPayload>();
/// Mode parameter header used by MODE SENSE(10) / MODE SELECT(10).
pub const MODE_PARAMETER_HEADER10_LEN: usize = 8;
/// Bytes sent by MODE SELECT(10): parameter header, page header, payload.
pub const MODE_SELECT_PACKET_LEN: usize =
    MODE_PARAMETER_HEADER10_LEN + PAGE_HEADER_LEN + LED_PAYLOAD_LEN;

/// LED value meaning "on".
pub const LED_ON: u8 = 0xFF;
/// LED value meaning "off".
pub const LED_OFF: u8 = 0x00;

bitflags::bitflags! {
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    /// Flag bits sharing byte 0 of a mode page with the page code.
    pub struct PageCodeFlags: u8 {
        /// Parameters Saveable, reported by the device, reserved on write
        const PS  = 0b1000_0000;
        /// SubPage Format
        const SPF = 0b0100_0000;
    }
}

impl PageCodeFlags {
    /// Mask that keeps the page code and the SPF bit, dropping only PS.
    pub const PAGE_ID_MASK: u8 = 0x7F;
}

/// Named view over the ten defined payload bytes.
#[repr(C)]
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable,
)]
pub struct LedPayload {
    pub magic: u8,
    zeros0: [u8; 2],
    /// Opaque flag byte, passed through verbatim.
    pub unknown1: u8,
    zeros1: [u8; 2],
    pub led: u8,
    zeros2: [u8; 3],
}

/// One variant of the vendor page, byte-compatible with the transport
/// buffer it was read from.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct ModePageRecord {
    /// Page code with PS/SPF bits.
    pub code: u8,
    /// Page length as reported by the device.
    pub length: u8,
    /// Defined part of the payload.
    pub page: LedPayload,
    reserved: [u8; PAYLOAD_CAPACITY - LED_PAYLOAD_LEN],
}

impl Default for ModePageRecord {
    fn default() -> Self {
        Self::new_zeroed()
    }
}

impl ModePageRecord {
    /// Build a record from raw page bytes starting at the page code.
    ///
    /// Shorter input is zero-filled, longer input is truncated to
    /// [`RECORD_LEN`].
    pub fn from_page_bytes(buf: &[u8]) -> Self {
        let mut rec = Self::new_zeroed();
        let n = buf.len().min(RECORD_LEN);
        rec.as_mut_bytes()[..n].copy_from_slice(&buf[..n]);
        rec
    }

    /// Raw bytes view, the form exchanged with the transport.
    #[inline]
    pub fn raw(&self) -> &[u8] {
        self.as_bytes()
    }

    /// Page code without the PS bit.
    #[inline]
    pub fn page_id(&self) -> u8 {
        self.code & PageCodeFlags::PAGE_ID_MASK
    }

    #[inline]
    pub fn flags(&self) -> PageCodeFlags {
        PageCodeFlags::from_bits_truncate(self.code)
    }

    #[inline]
    pub fn led(&self) -> u8 {
        self.page.led
    }

    #[inline]
    pub fn magic(&self) -> u8 {
        self.page.magic
    }

    /// Derive the page to send with MODE SELECT: a copy of `self` with the
    /// PS bit cleared and the LED byte replaced.
    pub fn with_led(&self, value: u8) -> Self {
        let mut out = *self;
        out.code &= !PageCodeFlags::PS.bits();
        out.page.led = value;
        out
    }

    /// Header plus the defined payload, i.e. the bytes a MODE SELECT carries.
    #[inline]
    pub fn defined_bytes(&self) -> &[u8] {
        &self.raw()[..PAGE_HEADER_LEN + LED_PAYLOAD_LEN]
    }
}

impl fmt::Debug for ModePageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModePageRecord")
            .field("code", &format_args!("{:#04x}", self.code))
            .field("flags", &self.flags())
            .field("length", &self.length)
            .field("magic", &format_args!("{:#04x}", self.page.magic))
            .field("unknown1", &format_args!("{:#04x}", self.page.unknown1))
            .field("led", &self.page.led)
            .field("raw", &hex::encode(self.defined_bytes()))
            .finish()
    }
}

/// Page Control selector, which of the four page variants to read.
///
/// The discriminant is the PC field value of MODE SENSE byte 2 (bits 7..6).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum PageVariant {
    Current = 0b00,
    Changeable = 0b01,
    Default = 0b10,
    Saved = 0b11,
}

impl PageVariant {
    /// Order in which the variants are requested from the device.
    pub const ALL: [PageVariant; 4] = [
        PageVariant::Current,
        PageVariant::Changeable,
        PageVariant::Default,
        PageVariant::Saved,
    ];
}

impl fmt::Display for PageVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PageVariant::Current => "current",
            PageVariant::Changeable => "changeable",
            PageVariant::Default => "default",
            PageVariant::Saved => "saved",
        })
    }
}

/// The four variants of the page read in one go.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModePageSet {
    pub current: ModePageRecord,
    pub changeable: ModePageRecord,
    pub default: ModePageRecord,
    pub saved: ModePageRecord,
}

/// Reasons a freshly read page set must not be trusted.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PageIntegrityError {
    #[error("Unexpected mode page id ({code:#04x}) in {variant} page")]
    PageCode { variant: PageVariant, code: u8 },
    #[error("Unexpected mode page length ({length:#04x}) in {variant} page")]
    Length { variant: PageVariant, length: u8 },
    #[error("Unexpected mode page magic ({0:#04x})")]
    Magic(u8),
    #[error("LED bits don't appear changeable ({0:#04x})")]
    LedNotChangeable(u8),
}

/// LED byte of the three variants an operator cares about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedValues {
    pub current: u8,
    pub original: u8,
    pub saved: u8,
}

impl fmt::Display for LedValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LED: current={} original={} saved={}",
            self.current, self.original, self.saved
        )
    }
}

impl ModePageSet {
    pub fn get(&self, variant: PageVariant) -> &ModePageRecord {
        match variant {
            PageVariant::Current => &self.current,
            PageVariant::Changeable => &self.changeable,
            PageVariant::Default => &self.default,
            PageVariant::Saved => &self.saved,
        }
    }

    pub fn get_mut(&mut self, variant: PageVariant) -> &mut ModePageRecord {
        match variant {
            PageVariant::Current => &mut self.current,
            PageVariant::Changeable => &mut self.changeable,
            PageVariant::Default => &mut self.default,
            PageVariant::Saved => &mut self.saved,
        }
    }

    /// Check every structural and semantic invariant of the page set.
    ///
    /// Page ids are checked on all variants before any length, so the first
    /// reported problem is the most fundamental one.
    pub fn validate(&self) -> Result<(), PageIntegrityError> {
        for variant in PageVariant::ALL {
            let rec = self.get(variant);
            if rec.page_id() != PAGE_CODE {
                return Err(PageIntegrityError::PageCode {
                    variant,
                    code: rec.code,
                });
            }
        }
        for variant in PageVariant::ALL {
            let rec = self.get(variant);
            if usize::from(rec.length) != LED_PAYLOAD_LEN {
                return Err(PageIntegrityError::Length {
                    variant,
                    length: rec.length,
                });
            }
        }
        if self.current.magic() != PAGE_MAGIC {
            return Err(PageIntegrityError::Magic(self.current.magic()));
        }
        // The LED byte is written whole, so every bit must be changeable.
        if self.changeable.led() != LED_ON {
            return Err(PageIntegrityError::LedNotChangeable(self.changeable.led()));
        }
        Ok(())
    }

    pub fn led_values(&self) -> LedValues {
        LedValues {
            current: self.current.led(),
            original: self.default.led(),
            saved: self.saved.led(),
        }
    }
}

/// MODE SELECT(10) parameter list: an all-zero mode parameter header
/// followed by the page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeSelectPacket {
    bytes: [u8; MODE_SELECT_PACKET_LEN],
}

impl ModeSelectPacket {
    pub fn new(page: &ModePageRecord) -> Self {
        let mut bytes = [0u8; MODE_SELECT_PACKET_LEN];
        bytes[MODE_PARAMETER_HEADER10_LEN..].copy_from_slice(page.defined_bytes());
        Self { bytes }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The page part of the packet.
    pub fn page(&self) -> ModePageRecord {
        ModePageRecord::from_page_bytes(&self.bytes[MODE_PARAMETER_HEADER10_LEN..])
    }
}
