//! SCSI CDL dialect: mode page 0x0A subpages 0x07 (T2A) and 0x08 (T2B).

use alloc::vec::Vec;

use storectl_core::device::DataPhase;
use storectl_core::{DeviceHandle, Error, Result};

use crate::descriptor::{parse_scsi_list, serialize_scsi_list, ScsiCdlDescriptor, DESCRIPTORS_PER_LIST};
use crate::policy::{validate_performance_value, validate_scsi, SupportedPolicies};

pub const MODE_PAGE_CDL: u8 = 0x0A;
pub const SUBPAGE_T2A: u8 = 0x07;
pub const SUBPAGE_T2B: u8 = 0x08;

const PAGE_HEADER_LEN: usize = 8;
const PAGE_BODY_LEN: usize = PAGE_HEADER_LEN + DESCRIPTORS_PER_LIST * crate::descriptor::DESCRIPTOR_LEN;

/// Which MODE SENSE command form returned the page currently held, so a
/// subsequent Set recomputes the right parameter-header offset by
/// checking which form was used to read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeSenseForm {
    Six,
    Ten,
}

/// A parsed T2A or T2B CDL mode page: the 8-byte page header (carrying
/// performance-vs-CDG in the high nibble of byte 7, meaningful for T2A
/// only) plus the seven descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScsiCdlPage {
    pub performance_vs_cdg: u8,
    pub descriptors: [ScsiCdlDescriptor; DESCRIPTORS_PER_LIST],
}

impl ScsiCdlPage {
    fn parse(body: &[u8; PAGE_BODY_LEN]) -> Self {
        Self {
            performance_vs_cdg: storectl_common::bits::high_nibble(body[7]),
            descriptors: parse_scsi_list(body, PAGE_HEADER_LEN),
        }
    }

    fn serialize(&self, subpage: u8) -> [u8; PAGE_BODY_LEN] {
        let mut body = [0u8; PAGE_BODY_LEN];
        body[0] = MODE_PAGE_CDL | 0x40; // SPF (subpage format) set
        body[1] = subpage;
        let page_len = (PAGE_BODY_LEN - 4) as u16;
        body[2..4].copy_from_slice(&page_len.to_be_bytes());
        body[7] = self.performance_vs_cdg << 4;
        serialize_scsi_list(&self.descriptors, &mut body, PAGE_HEADER_LEN);
        body
    }
}

fn mode_sense_ten_cdb(page: u8, subpage: u8, allocation_length: u16) -> [u8; 10] {
    let mut cdb = [0u8; 10];
    cdb[0] = 0x5A;
    cdb[1] = 0x08; // DBD: disable block descriptors
    cdb[2] = (page & 0x3F) | 0x40; // SPF page code with subpage select
    cdb[3] = subpage;
    cdb[7..9].copy_from_slice(&allocation_length.to_be_bytes());
    cdb
}

fn mode_sense_six_cdb(page: u8, subpage: u8, allocation_length: u8) -> [u8; 6] {
    let mut cdb = [0u8; 6];
    cdb[0] = 0x1A;
    cdb[1] = 0x08;
    cdb[2] = (page & 0x3F) | 0x40;
    cdb[3] = subpage;
    cdb[4] = allocation_length;
    cdb
}

fn mode_select_ten_cdb(parameter_list_length: u16) -> [u8; 10] {
    let mut cdb = [0u8; 10];
    cdb[0] = 0x55;
    cdb[1] = 0x11; // PF (page format) | SP (save pages)
    cdb[7..9].copy_from_slice(&parameter_list_length.to_be_bytes());
    cdb
}

/// Reads the current T2A or T2B page, returning which MODE SENSE form
/// succeeded alongside the parsed page.
pub fn read_page(device: &mut dyn DeviceHandle, subpage: u8) -> Result<(ModeSenseForm, ScsiCdlPage)> {
    let allocation_length = (10 + PAGE_BODY_LEN) as u16;
    let mut buf10 = alloc_buf(allocation_length as usize);
    let cdb = mode_sense_ten_cdb(MODE_PAGE_CDL, subpage, allocation_length);
    let outcome = device.scsi_command(&cdb, DataPhase::In(&mut buf10))?;
    if outcome.is_good() {
        // 8-byte MODE SENSE(10) header, block descriptor disabled so no
        // descriptor bytes follow it.
        let body: [u8; PAGE_BODY_LEN] = buf10[8..8 + PAGE_BODY_LEN].try_into().unwrap();
        return Ok((ModeSenseForm::Ten, ScsiCdlPage::parse(&body)));
    }

    let mut buf6 = alloc_buf((4 + PAGE_BODY_LEN).max(255));
    let cdb6 = mode_sense_six_cdb(MODE_PAGE_CDL, subpage, buf6.len().min(255) as u8);
    let outcome = device.scsi_command(&cdb6, DataPhase::In(&mut buf6))?;
    if !outcome.is_good() {
        return Err(Error::NotSupported);
    }
    let body: [u8; PAGE_BODY_LEN] = buf6[4..4 + PAGE_BODY_LEN].try_into().unwrap();
    Ok((ModeSenseForm::Six, ScsiCdlPage::parse(&body)))
}

fn alloc_buf(len: usize) -> Vec<u8> {
    alloc::vec![0u8; len]
}

/// Reads the supported-policy masks for the SCSI dialect. SCSI has no
/// dedicated supported-policy log page in scope here; the masks
/// are reported through the same Report Supported Operation Codes /
/// vendor log mechanism as the ATA dialect's Identify Device Data log,
/// which this workspace does not have a SCSI-side source for — callers
/// on SCSI devices must supply `SupportedPolicies` out of band (e.g.
/// from a prior vendor-specific query) rather than have this crate
/// invent a CDB. See DESIGN.md.
pub fn read_supported_policies(_device: &mut dyn DeviceHandle) -> Result<SupportedPolicies> {
    Err(Error::NotSupported)
}

/// One field a caller wants changed in a SCSI CDL Set.
pub enum ScsiCdlChange {
    PerformanceVsCdg(u8),
    Descriptor(usize, ScsiCdlDescriptor),
}

/// Read-modify-write Set: reads the current page, applies
/// and validates every change, then issues MODE SELECT(10) with
/// page-format=1, saved-pages=1 regardless of which MODE SENSE form the
/// read used (only the parse-side offset depends on that; the write is
/// always the 10-byte form ).
pub fn set_page(
    device: &mut dyn DeviceHandle,
    subpage: u8,
    supported: &SupportedPolicies,
    changes: &[ScsiCdlChange],
) -> Result<()> {
    let (_form, mut page) = read_page(device, subpage)?;

    for change in changes {
        match change {
            ScsiCdlChange::PerformanceVsCdg(value) => {
                validate_performance_value(*value)?;
                page.performance_vs_cdg = *value;
            }
            ScsiCdlChange::Descriptor(index, descriptor) => {
                validate_scsi(descriptor, supported)?;
                page.descriptors[*index] = *descriptor;
            }
        }
    }

    let body = page.serialize(subpage);
    let mut param_list = alloc_buf(8 + PAGE_BODY_LEN);
    // MODE SELECT(10) parameter header: 8 bytes, block descriptor length
    // left at zero (no block descriptor sent back).
    param_list[8..].copy_from_slice(&body);
    let cdb = mode_select_ten_cdb(param_list.len() as u16);
    let outcome = device.scsi_command(&cdb, DataPhase::Out(&param_list))?;
    if !outcome.is_good() {
        return Err(Error::Failure("MODE SELECT(10) rejected by device"));
    }
    Ok(())
}
