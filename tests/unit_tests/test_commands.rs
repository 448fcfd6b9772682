// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;
use hex_literal::hex;
use wdled::{
    control_block::{
        inquiry::parse_inquiry_standard,
        mod_sense::{fill_mode_sense10_simple, parse_mode_sense10_page},
        mode_select::fill_mode_select10,
    },
    models::{
        mode_page::{ModePageRecord, ModePageSet, ModeSelectPacket, PAGE_CODE, PageVariant},
        supported::{Qualification, SupportedDeviceTable},
    },
};

/// Standard INQUIRY data of a My Passport 25E2 bridge.
const INQUIRY_25E2: [u8; 36] = hex!(
    "00 00 06 12 5b 00 00 00"
    "57 44 20 20 20 20 20 20"
    "4d 79 20 50 61 73 73 70 6f 72 74 20 32 35 45 32"
    "34 30 30 34"
);

/// MODE SENSE(10) current values of page 0x21, DBD set, LED on.
const SENSE_CURRENT: [u8; 20] = hex!(
    "00 12 00 10 00 00 00 00"
    "a1 0a 30 00 00 5a 00 00 ff 00 00 00"
);

#[test]
fn inquiry_identifies_supported_disk() -> Result<()> {
    let id = parse_inquiry_standard(&INQUIRY_25E2)?;
    assert_eq!(id.vendor, "WD      ");
    assert_eq!(id.product, "My Passport 25E2");
    assert_eq!(id.revision, "4004");
    assert_eq!(id.device_type_str(), "Direct-access block (disk)");
    assert_eq!(
        SupportedDeviceTable::builtin().qualify(&id),
        Qualification::Supported
    );
    Ok(())
}

#[test]
fn mode_sense_cdbs_for_every_variant() {
    let expected = [
        hex!("5a 08 21 00 00 00 00 00 fc 00"),
        hex!("5a 08 61 00 00 00 00 00 fc 00"),
        hex!("5a 08 a1 00 00 00 00 00 fc 00"),
        hex!("5a 08 e1 00 00 00 00 00 fc 00"),
    ];
    for (variant, want) in PageVariant::ALL.into_iter().zip(expected) {
        let mut cdb = [0u8; 16];
        let n = fill_mode_sense10_simple(&mut cdb, variant, PAGE_CODE, 252);
        assert_eq!(&cdb[..n], &want, "{variant}");
    }
}

#[test]
fn sensed_page_becomes_record() -> Result<()> {
    let page = parse_mode_sense10_page(&SENSE_CURRENT)?;
    let rec = ModePageRecord::from_page_bytes(page);
    assert_eq!(rec.page_id(), PAGE_CODE);
    assert_eq!(rec.length, 10);
    assert_eq!(rec.magic(), 0x30);
    assert_eq!(rec.page.unknown1, 0x5a);
    assert_eq!(rec.led(), 0xff);
    // zero-filled past the transferred bytes
    assert!(rec.raw()[12..].iter().all(|&b| b == 0));
    Ok(())
}

#[test]
fn block_descriptors_are_skipped() -> Result<()> {
    let mut buf = vec![0u8; 8];
    buf[1] = 6 + 8 + 12;
    buf[7] = 8;
    buf.extend_from_slice(&[0xEE; 8]);
    buf.extend_from_slice(&hex!("21 0a 30 00 00 5a 00 00 00 00 00 00"));
    let page = parse_mode_sense10_page(&buf)?;
    assert_eq!(page[0], 0x21);
    assert_eq!(page.len(), 12);
    Ok(())
}

#[test]
fn truncated_sense_data_is_rejected() {
    assert!(parse_mode_sense10_page(&SENSE_CURRENT[..6]).is_err());
    // header announces block descriptors that were never sent
    let buf = hex!("00 0e 00 00 00 00 00 08 00 00 00 00");
    assert!(parse_mode_sense10_page(&buf).is_err());
}

#[test]
fn mode_select_carries_packet_length() -> Result<()> {
    let page = parse_mode_sense10_page(&SENSE_CURRENT)?;
    let current = ModePageRecord::from_page_bytes(page);
    let set = ModePageSet {
        current,
        ..ModePageSet::default()
    };
    let packet = ModeSelectPacket::new(&set.current.with_led(0));

    let mut cdb = [0u8; 16];
    let n = fill_mode_select10(&mut cdb, true, true, packet.as_bytes().len() as u16, 0);
    assert_eq!(&cdb[..n], &hex!("55 11 00 00 00 00 00 00 14 00"));
    assert_eq!(packet.page().code, 0x21);
    assert_eq!(packet.page().led(), 0);
    Ok(())
}
