// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! SCSI generic pass-through (`SG_IO` ioctl) on Linux block or sg nodes.

use std::{fs::File, time::Duration};

use anyhow::Context;
use tracing::{debug, trace};

use crate::{
    control_block::{
        inquiry::{STANDARD_INQUIRY_LEN, fill_inquiry_standard_simple, parse_inquiry_standard},
        mod_sense::{fill_mode_sense10_simple, parse_mode_sense10_page},
        mode_select::fill_mode_select10,
    },
    models::{
        identity::DeviceIdentity,
        mode_page::{ModePageRecord, ModePageSet, PageVariant},
        sense_data::SenseData,
    },
    transport::{ScsiDevice, ScsiTransport, TransportError},
};

/// Per-command timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// Allocation length of each MODE SENSE(10); room for the header, block
/// descriptors and the largest page a device returns.
pub const MODE_SENSE_ALLOC_LEN: u16 = 252;
const SENSE_BUF_LEN: usize = 32;

const SAM_STAT_GOOD: u8 = 0x00;
const SAM_STAT_CHECK_CONDITION: u8 = 0x02;
const DRIVER_SENSE: u16 = 0x08;

/// Data phase of one command.
enum DataDir<'a> {
    None,
    FromDevice(&'a mut [u8]),
    ToDevice(&'a [u8]),
}

/// Opens devices for SG_IO.
#[derive(Debug, Clone)]
pub struct SgTransport {
    timeout: Duration,
}

impl Default for SgTransport {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl SgTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl ScsiTransport for SgTransport {
    type Device = SgDevice;

    fn open(&self, path: &str, read_only: bool) -> Result<SgDevice, TransportError> {
        debug!(path, read_only, "opening device");
        let file = open_device(path, read_only)?;
        Ok(SgDevice {
            file,
            timeout_ms: u32::try_from(self.timeout.as_millis()).unwrap_or(u32::MAX),
        })
    }
}

#[cfg(target_os = "linux")]
fn open_device(path: &str, read_only: bool) -> Result<File, TransportError> {
    use std::{fs::OpenOptions, os::unix::fs::OpenOptionsExt};

    Ok(OpenOptions::new()
        .read(true)
        .write(!read_only)
        .custom_flags(libc::O_NONBLOCK)
        .open(path)?)
}

#[cfg(not(target_os = "linux"))]
fn open_device(_path: &str, _read_only: bool) -> Result<File, TransportError> {
    Err(TransportError::Unsupported)
}

/// An open device node.
#[derive(Debug)]
pub struct SgDevice {
    file: File,
    timeout_ms: u32,
}

impl SgDevice {
    /// Issue one command and return the number of bytes transferred.
    fn execute(&mut self, cdb: &[u8], dir: DataDir<'_>) -> Result<usize, TransportError> {
        trace!(cdb = %hex::encode(cdb), "SG_IO");
        #[cfg(target_os = "linux")]
        {
            linux::sg_io(&self.file, cdb, dir, self.timeout_ms)
        }
        #[cfg(not(target_os = "linux"))]
        {
            let _ = (&self.file, cdb, dir, self.timeout_ms);
            Err(TransportError::Unsupported)
        }
    }
}

impl ScsiDevice for SgDevice {
    fn inquiry(&mut self) -> Result<DeviceIdentity, TransportError> {
        let mut cdb = [0u8; 16];
        let cdb_len = fill_inquiry_standard_simple(&mut cdb);
        let mut buf = [0u8; STANDARD_INQUIRY_LEN];
        let n = self.execute(&cdb[..cdb_len], DataDir::FromDevice(&mut buf))?;
        let id = parse_inquiry_standard(&buf[..n]).context("standard INQUIRY data")?;
        debug!(?id, kind = id.device_type_str(), "INQUIRY");
        Ok(id)
    }

    fn mode_page_variants(&mut self, page_code: u8) -> Result<ModePageSet, TransportError> {
        let mut set = ModePageSet::default();
        for variant in PageVariant::ALL {
            let mut cdb = [0u8; 16];
            let cdb_len =
                fill_mode_sense10_simple(&mut cdb, variant, page_code, MODE_SENSE_ALLOC_LEN);
            let mut buf = [0u8; MODE_SENSE_ALLOC_LEN as usize];
            let n = self.execute(&cdb[..cdb_len], DataDir::FromDevice(&mut buf))?;
            let page = parse_mode_sense10_page(&buf[..n])
                .with_context(|| format!("{variant} values of page {page_code:#04x}"))?;
            let rec = ModePageRecord::from_page_bytes(page);
            trace!(%variant, page = %hex::encode(page), "MODE SENSE(10)");
            *set.get_mut(variant) = rec;
        }
        Ok(set)
    }

    fn mode_select10(
        &mut self,
        page_format: bool,
        save_pages: bool,
        params: &[u8],
    ) -> Result<(), TransportError> {
        let len = u16::try_from(params.len())
            .context("MODE SELECT(10) parameter list longer than 65535 bytes")?;
        let mut cdb = [0u8; 16];
        let cdb_len = fill_mode_select10(&mut cdb, page_format, save_pages, len, 0x00);
        debug!(save_pages, params = %hex::encode(params), "MODE SELECT(10)");
        if params.is_empty() {
            self.execute(&cdb[..cdb_len], DataDir::None)?;
        } else {
            self.execute(&cdb[..cdb_len], DataDir::ToDevice(params))?;
        }
        Ok(())
    }
}

/// Map the completion fields of an SG_IO header to a result.
fn check_completion(
    status: u8,
    host_status: u16,
    driver_status: u16,
    sense: &[u8],
) -> Result<(), TransportError> {
    if status == SAM_STAT_CHECK_CONDITION && !sense.is_empty() {
        let sd = SenseData::parse(sense).context("sense data")?;
        if sd.is_benign() {
            debug!(?sd, "ignoring benign sense");
            return Ok(());
        }
        return Err(TransportError::Sense(sd));
    }
    // low nibble is the driver byte; DRIVER_SENSE only says sense was copied
    let driver = driver_status & 0x0F;
    if status != SAM_STAT_GOOD || host_status != 0 || (driver != 0 && driver != DRIVER_SENSE) {
        return Err(TransportError::Status {
            status,
            host_status,
            driver_status,
        });
    }
    Ok(())
}

#[cfg(target_os = "linux")]
mod linux {
    use std::{fs::File, os::unix::io::AsRawFd, ptr};

    use libc::{c_int, c_uchar, c_uint, c_ushort, c_void};

    use super::{DataDir, SENSE_BUF_LEN, check_completion};
    use crate::transport::TransportError;

    const SG_IO: c_uint = 0x2285;
    const SG_INTERFACE_ID: c_int = b'S' as c_int;
    const SG_DXFER_NONE: c_int = -1;
    const SG_DXFER_TO_DEV: c_int = -2;
    const SG_DXFER_FROM_DEV: c_int = -3;

    /// `struct sg_io_hdr` from `<scsi/sg.h>`.
    #[allow(dead_code)]
    #[repr(C)]
    struct SgIoHdr {
        interface_id: c_int,
        dxfer_direction: c_int,
        cmd_len: c_uchar,
        mx_sb_len: c_uchar,
        iovec_count: c_ushort,
        dxfer_len: c_uint,
        dxferp: *mut c_void,
        cmdp: *const c_uchar,
        sbp: *mut c_uchar,
        timeout: c_uint,
        flags: c_uint,
        pack_id: c_int,
        usr_ptr: *mut c_void,
        status: c_uchar,
        masked_status: c_uchar,
        msg_status: c_uchar,
        sb_len_wr: c_uchar,
        host_status: c_ushort,
        driver_status: c_ushort,
        resid: c_int,
        duration: c_uint,
        info: c_uint,
    }

    pub(super) fn sg_io(
        file: &File,
        cdb: &[u8],
        dir: DataDir<'_>,
        timeout_ms: u32,
    ) -> Result<usize, TransportError> {
        let mut sense = [0u8; SENSE_BUF_LEN];
        let (dxfer_direction, dxferp, dxfer_len) = match dir {
            DataDir::None => (SG_DXFER_NONE, ptr::null_mut(), 0usize),
            DataDir::FromDevice(buf) => {
                (SG_DXFER_FROM_DEV, buf.as_mut_ptr() as *mut c_void, buf.len())
            },
            // the kernel only reads through dxferp for TO_DEV transfers
            DataDir::ToDevice(buf) => {
                (SG_DXFER_TO_DEV, buf.as_ptr() as *mut c_void, buf.len())
            },
        };

        let mut hdr = SgIoHdr {
            interface_id: SG_INTERFACE_ID,
            dxfer_direction,
            cmd_len: cdb.len() as c_uchar,
            mx_sb_len: SENSE_BUF_LEN as c_uchar,
            iovec_count: 0,
            dxfer_len: dxfer_len as c_uint,
            dxferp,
            cmdp: cdb.as_ptr(),
            sbp: sense.as_mut_ptr(),
            timeout: timeout_ms,
            flags: 0,
            pack_id: 0,
            usr_ptr: ptr::null_mut(),
            status: 0,
            masked_status: 0,
            msg_status: 0,
            sb_len_wr: 0,
            host_status: 0,
            driver_status: 0,
            resid: 0,
            duration: 0,
            info: 0,
        };

        // SAFETY: every pointer in `hdr` refers to a buffer that outlives the
        // call and is at least as long as the length stored next to it.
        let rc = unsafe { libc::ioctl(file.as_raw_fd(), SG_IO as _, &mut hdr as *mut SgIoHdr) };
        if rc < 0 {
            return Err(std::io::Error::last_os_error().into());
        }

        let sense_len = usize::from(hdr.sb_len_wr).min(SENSE_BUF_LEN);
        check_completion(
            hdr.status,
            hdr.host_status,
            hdr.driver_status,
            &sense[..sense_len],
        )?;

        let resid = usize::try_from(hdr.resid).unwrap_or(0).min(dxfer_len);
        Ok(dxfer_len - resid)
    }
}
