// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;
use hex_literal::hex;
use wdled::{
    LedError,
    models::{
        identity::DeviceIdentity,
        intent::Intent,
        mode_page::{ModePageRecord, PageIntegrityError, PageVariant},
        supported::SupportedDeviceTable,
    },
    state_machine::{
        common::StateMachineCtx,
        led_states::{LedCtx, LedOutcome},
    },
};

use crate::unit_tests::common::{FailAt, FakeTransport, good_pages, my_passport};

const DEVICE: &str = "/dev/sdb";

struct Run {
    result: Result<LedOutcome, LedError>,
    out: String,
    diag: String,
}

fn run(transport: &FakeTransport, value: Option<&str>) -> Result<Run> {
    run_with_table(transport, &SupportedDeviceTable::builtin(), value)
}

fn run_with_table(
    transport: &FakeTransport,
    table: &SupportedDeviceTable,
    value: Option<&str>,
) -> Result<Run> {
    let intent = Intent::parse(value)?;
    let mut out = Vec::new();
    let mut diag = Vec::new();
    let result = LedCtx::new(transport, DEVICE, intent, table, &mut out, &mut diag).execute();
    Ok(Run {
        result,
        out: String::from_utf8(out)?,
        diag: String::from_utf8(diag)?,
    })
}

#[test]
fn read_reports_values_without_writing() -> Result<()> {
    let t = FakeTransport::new(my_passport(), good_pages());
    let r = run(&t, None)?;

    let outcome = r.result?;
    assert_eq!(r.out, "LED: current=255 original=255 saved=0\n");
    assert_eq!(r.diag, "/dev/sdb: WD       My Passport 25E2 (rev 4004)\n");
    assert_eq!(outcome.written, None);
    assert!(!outcome.persisted);

    let log = t.log.borrow();
    assert_eq!(log.opens, vec![(DEVICE.to_string(), true)]);
    assert_eq!(log.page_fetches, vec![0x21]);
    assert!(log.mode_selects.is_empty());
    Ok(())
}

#[test]
fn off_writes_led_zero_volatile() -> Result<()> {
    let t = FakeTransport::new(my_passport(), good_pages());
    let r = run(&t, Some("off"))?;

    let outcome = r.result?;
    // pre-write state is reported
    assert_eq!(r.out, "LED: current=255 original=255 saved=0\n");
    let written = outcome.written.expect("WTF");
    assert_eq!(written.led(), 0);
    assert!(!outcome.persisted);

    let log = t.log.borrow();
    assert_eq!(log.opens, vec![(DEVICE.to_string(), false)]);
    assert_eq!(log.mode_selects.len(), 1);
    let call = &log.mode_selects[0];
    assert!(call.page_format);
    assert!(!call.save_pages);
    assert_eq!(
        call.params,
        hex!("00 00 00 00 00 00 00 00 21 0a 30 00 00 5a 00 00 00 00 00 00").to_vec()
    );
    Ok(())
}

#[test]
fn save_on_persists() -> Result<()> {
    let t = FakeTransport::new(my_passport(), good_pages());
    let r = run(&t, Some("save:on"))?;

    let outcome = r.result?;
    assert_eq!(outcome.written.expect("WTF").led(), 255);
    assert!(outcome.persisted);

    let log = t.log.borrow();
    let call = &log.mode_selects[0];
    assert!(call.save_pages);
    assert_eq!(call.params.len(), 20);
    assert_eq!(call.params[8], 0x21);
    assert_eq!(call.params[16], 0xFF);
    Ok(())
}

#[test]
fn written_page_keeps_everything_but_led_and_ps() -> Result<()> {
    let t = FakeTransport::new(my_passport(), good_pages());
    let r = run(&t, Some("0x42"))?;
    let written = r.result?.written.expect("WTF");

    let current = good_pages().current;
    assert_eq!(written.code, current.code & 0x7F);
    assert_eq!(written.length, current.length);
    assert_eq!(written.page.magic, current.page.magic);
    assert_eq!(written.page.unknown1, current.page.unknown1);
    assert_eq!(written.page.led, 0x42);
    assert_eq!(written.raw()[1..8], current.raw()[1..8]);
    assert_eq!(written.raw()[9..], current.raw()[9..]);
    Ok(())
}

#[test]
fn unsupported_product_stops_before_page_fetch() -> Result<()> {
    let id = DeviceIdentity::new("WD      ", "Elements 25A3   ", "1012");
    let t = FakeTransport::new(id, good_pages());
    let r = run(&t, Some("off"))?;

    assert!(matches!(r.result, Err(LedError::UnsupportedProduct)));
    let log = t.log.borrow();
    assert!(log.page_fetches.is_empty());
    assert!(log.mode_selects.is_empty());
    Ok(())
}

#[test]
fn unsupported_vendor_fails() -> Result<()> {
    let id = DeviceIdentity::new("SEAGATE ", "My Passport 25E2", "1012");
    let t = FakeTransport::new(id, good_pages());
    let r = run(&t, None)?;

    let err = r.result.expect_err("must fail");
    assert_eq!(
        err.diagnostic(DEVICE),
        "/dev/sdb: ERROR: Unknown or unsupported vendor!"
    );
    assert!(t.log.borrow().page_fetches.is_empty());
    Ok(())
}

#[test]
fn led_not_changeable_blocks_write() -> Result<()> {
    let mut pages = good_pages();
    pages.changeable.page.led = 0x0F;
    let t = FakeTransport::new(my_passport(), pages);
    let r = run(&t, Some("on"))?;

    assert!(matches!(
        r.result,
        Err(LedError::PageIntegrity(PageIntegrityError::LedNotChangeable(0x0F)))
    ));
    assert!(r.out.is_empty());
    assert!(t.log.borrow().mode_selects.is_empty());
    Ok(())
}

#[test]
fn wrong_page_code_in_any_variant_blocks_write() -> Result<()> {
    for variant in PageVariant::ALL {
        let mut pages = good_pages();
        pages.get_mut(variant).code = 0x22;
        let t = FakeTransport::new(my_passport(), pages);
        let r = run(&t, Some("FORCESET:save:off"))?;

        assert!(
            matches!(
                r.result,
                Err(LedError::PageIntegrity(PageIntegrityError::PageCode { variant: v, code: 0x22 })) if v == variant
            ),
            "{variant}"
        );
        assert!(t.log.borrow().mode_selects.is_empty(), "{variant}");
    }
    Ok(())
}

#[test]
fn bad_magic_and_length() -> Result<()> {
    let mut pages = good_pages();
    pages.current.page.magic = 0x31;
    let t = FakeTransport::new(my_passport(), pages);
    let err = run(&t, None)?.result.expect_err("must fail");
    assert_eq!(
        err.diagnostic(DEVICE),
        "/dev/sdb: ERROR: Unexpected mode page magic (0x31)"
    );

    let mut pages = good_pages();
    pages.saved = ModePageRecord::from_page_bytes(&hex!("21 0e 30 00 00 5a 00 00 00 00 00 00"));
    let t = FakeTransport::new(my_passport(), pages);
    let err = run(&t, None)?.result.expect_err("must fail");
    assert!(matches!(
        err,
        LedError::PageIntegrity(PageIntegrityError::Length {
            variant: PageVariant::Saved,
            length: 0x0e
        })
    ));
    Ok(())
}

#[test]
fn forceget_skips_checks_with_warnings() -> Result<()> {
    let id = DeviceIdentity::new("ACME    ", "Disk            ", "0001");
    let t = FakeTransport::new(id, good_pages());
    let r = run(&t, Some("FORCEGET"))?;

    r.result?;
    assert_eq!(
        r.diag,
        "WARNING: Skipping supported vendor/product checks!\n\
         /dev/sdb: ACME     Disk             (rev 0001)\n\
         MANUALLY SKIPPED UNSUPPORTED VENDOR CHECK!\n"
    );
    let log = t.log.borrow();
    assert_eq!(log.opens, vec![(DEVICE.to_string(), true)]);
    assert!(log.mode_selects.is_empty());
    Ok(())
}

#[test]
fn forceset_writes_unknown_product() -> Result<()> {
    let id = DeviceIdentity::new("WD      ", "Elements 25A3   ", "1012");
    let t = FakeTransport::new(id, good_pages());
    let r = run(&t, Some("FORCESET:off"))?;

    r.result?;
    assert!(r.diag.ends_with("MANUALLY SKIPPED UNSUPPORTED DEVICE CHECK!\n"));
    assert_eq!(t.log.borrow().mode_selects.len(), 1);
    Ok(())
}

#[test]
fn forced_but_supported_prints_only_start_warning() -> Result<()> {
    let t = FakeTransport::new(my_passport(), good_pages());
    let r = run(&t, Some("FORCESET:on"))?;

    r.result?;
    assert!(r.diag.starts_with("WARNING: Skipping supported vendor/product checks!\n"));
    assert!(!r.diag.contains("MANUALLY SKIPPED"));
    Ok(())
}

#[test]
fn transport_failures_map_to_step() -> Result<()> {
    let cases = [
        (FailAt::Open, "/dev/sdb: ERROR: Failed to open (Permission denied)"),
        (FailAt::Inquiry, "/dev/sdb: ERROR: Inquiry failed (Input/output error)"),
        (
            FailAt::PageFetch,
            "/dev/sdb: ERROR: Get mode page failed (Input/output error)",
        ),
        (
            FailAt::ModeSelect,
            "/dev/sdb: ERROR: Set mode page failed (Input/output error)",
        ),
    ];
    for (at, expected) in cases {
        let t = FakeTransport::new(my_passport(), good_pages()).failing_at(at);
        let err = run(&t, Some("on"))?.result.expect_err("must fail");
        assert_eq!(err.diagnostic(DEVICE), expected, "{at:?}");
    }
    Ok(())
}

#[test]
fn configured_table_replaces_builtin() -> Result<()> {
    let table: SupportedDeviceTable = serde_yaml::from_str(
        "- vendor: \"ACME    \"\n  products: [\"Disk            \"]\n",
    )?;
    let id = DeviceIdentity::new("ACME    ", "Disk            ", "0001");
    let t = FakeTransport::new(id, good_pages());
    run_with_table(&t, &table, Some("off"))?.result?;

    let t = FakeTransport::new(my_passport(), good_pages());
    let r = run_with_table(&t, &table, None)?;
    assert!(matches!(r.result, Err(LedError::UnsupportedVendor)));
    Ok(())
}
