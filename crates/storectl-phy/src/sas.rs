//! SAS PHY test pattern: a 32-byte Send Diagnostic parameter
//! page (page code 0x3F, SAS protocol) that starts or stops a PHY test
//! pattern.

use storectl_core::device::DataPhase;
use storectl_core::{DeviceHandle, Error, Result};

const PAGE_CODE_SAS_PHY_TEST: u8 = 0x3F;
const PROTOCOL_ID_SAS: u8 = 0x06;
const PAGE_LENGTH: u16 = 0x001C;
const PAGE_TOTAL_LEN: usize = 32;

const OPCODE_SEND_DIAGNOSTIC: u8 = 0x1D;
const TEST_FUNCTION_START: u8 = 0x01;
const TEST_FUNCTION_STOP: u8 = 0x00;

/// SSC (spread-spectrum clocking) setting for byte 7 bits 5..4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadSpectrumClocking {
    NotControlled,
    DownSpreading,
    CenterSpreading,
}

impl SpreadSpectrumClocking {
    fn bits(self) -> u8 {
        match self {
            Self::NotControlled => 0b00,
            Self::DownSpreading => 0b01,
            Self::CenterSpreading => 0b10,
        }
    }
}

/// The fields that go into byte 7 of the page: physical link rate in
/// the low 4 bits, SSC in bits 5..4, the SATA-test-function flag in
/// bit 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhyTestPatternRequest {
    pub phy_identifier: u8,
    pub test_pattern_code: u8,
    pub physical_link_rate: u8,
    pub spread_spectrum_clocking: SpreadSpectrumClocking,
    pub sata_test_function: bool,
    pub dword_control: u8,
    pub test_pattern_dwords: u64,
}

fn build_page(req: &PhyTestPatternRequest, test_function: u8) -> [u8; PAGE_TOTAL_LEN] {
    let mut page = [0u8; PAGE_TOTAL_LEN];
    page[0] = PAGE_CODE_SAS_PHY_TEST;
    page[1] = PROTOCOL_ID_SAS;
    page[2..4].copy_from_slice(&PAGE_LENGTH.to_be_bytes());
    page[4] = req.phy_identifier;
    page[5] = test_function;
    page[6] = req.test_pattern_code;

    let mut byte7 = req.physical_link_rate & 0x0F;
    byte7 |= req.spread_spectrum_clocking.bits() << 4;
    if req.sata_test_function {
        byte7 |= 1 << 6;
    }
    page[7] = byte7;

    page[11] = req.dword_control;
    page[12..20].copy_from_slice(&req.test_pattern_dwords.to_be_bytes());
    page
}

fn send_diagnostic_cdb(parameter_list_length: u16) -> [u8; 6] {
    let mut cdb = [0u8; 6];
    cdb[0] = OPCODE_SEND_DIAGNOSTIC;
    cdb[3..5].copy_from_slice(&parameter_list_length.to_be_bytes());
    cdb
}

fn issue(device: &mut dyn DeviceHandle, page: &[u8; PAGE_TOTAL_LEN]) -> Result<()> {
    let cdb = send_diagnostic_cdb(page.len() as u16);
    let outcome = device.scsi_command(&cdb, DataPhase::Out(page))?;
    if !outcome.is_good() {
        return Err(Error::Failure("SEND DIAGNOSTIC (PHY test pattern) rejected by device"));
    }
    Ok(())
}

/// Starts a PHY test pattern (test-function 0x01).
pub fn start_test_pattern(device: &mut dyn DeviceHandle, req: &PhyTestPatternRequest) -> Result<()> {
    let page = build_page(req, TEST_FUNCTION_START);
    issue(device, &page)
}

/// Stops a PHY test pattern, using the same envelope as start but with
/// test-function 0x00.
pub fn stop_test_pattern(device: &mut dyn DeviceHandle, req: &PhyTestPatternRequest) -> Result<()> {
    let page = build_page(req, TEST_FUNCTION_STOP);
    issue(device, &page)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> PhyTestPatternRequest {
        PhyTestPatternRequest {
            phy_identifier: 3,
            test_pattern_code: 0x02,
            physical_link_rate: 0x9,
            spread_spectrum_clocking: SpreadSpectrumClocking::CenterSpreading,
            sata_test_function: true,
            dword_control: 0x01,
            test_pattern_dwords: 0x1122_3344_5566_7788,
        }
    }

    #[test]
    fn start_page_carries_page_header_and_test_function() {
        let page = build_page(&sample_request(), TEST_FUNCTION_START);
        assert_eq!(page[0], PAGE_CODE_SAS_PHY_TEST);
        assert_eq!(page[1], PROTOCOL_ID_SAS);
        assert_eq!(&page[2..4], &PAGE_LENGTH.to_be_bytes());
        assert_eq!(page[4], 3);
        assert_eq!(page[5], TEST_FUNCTION_START);
        assert_eq!(page[6], 0x02);
    }

    #[test]
    fn byte7_packs_rate_ssc_and_sata_bit() {
        let page = build_page(&sample_request(), TEST_FUNCTION_START);
        assert_eq!(page[7] & 0x0F, 0x9);
        assert_eq!((page[7] >> 4) & 0x3, SpreadSpectrumClocking::CenterSpreading.bits());
        assert_eq!((page[7] >> 6) & 0x1, 1);
    }

    #[test]
    fn test_pattern_dwords_are_big_endian() {
        let page = build_page(&sample_request(), TEST_FUNCTION_START);
        assert_eq!(&page[12..20], &0x1122_3344_5566_7788u64.to_be_bytes());
    }

    #[test]
    fn stop_uses_same_envelope_with_zero_test_function() {
        let start = build_page(&sample_request(), TEST_FUNCTION_START);
        let stop = build_page(&sample_request(), TEST_FUNCTION_STOP);
        assert_eq!(stop[5], TEST_FUNCTION_STOP);
        assert_eq!(&stop[6..], &start[6..]);
    }
}
