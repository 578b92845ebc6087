//! Device Configuration Overlay: the 256-word DCO parameter
//! page, the supported predicate, and the four direct/composite
//! operations (Identify, Set, Restore, Freeze-Lock).

#![cfg_attr(not(feature = "std"), no_std)]

pub mod page;

pub use page::{DcoFeatures1, DcoFeatures2, DcoPage, SataFeatures, TransferModeMask};

use storectl_core::device::{AtaTaskfile, DataPhase};
use storectl_core::{AtaIdentify, DeviceHandle, Error, Result};

pub const CMD_DCO_IDENTIFY: u8 = 0xB1;
pub const CMD_DCO_SET: u8 = 0xB1;
pub const CMD_DCO_RESTORE: u8 = 0xB1;
pub const CMD_DCO_FREEZE_LOCK: u8 = 0xB1;

/// Feature register sub-codes dispatched through `CMD_DCO_*` (all four
/// DCO operations share the 0xB1 opcode; the feature register selects
/// which one).
mod feature {
    pub const IDENTIFY: u16 = 0xC2;
    pub const SET: u16 = 0xC3;
    pub const RESTORE: u16 = 0xC0;
    pub const FREEZE_LOCK: u16 = 0xC1;
    pub const IDENTIFY_DMA: u16 = 0xC4;
    pub const SET_DMA: u16 = 0xC5;
}

/// `true` when word 083 bit 11 or word 086 bit 11 is set (with validity
/// checked against word 087).
pub fn is_supported(identify: &AtaIdentify) -> bool {
    let word83 = identify.word(83);
    let word86 = identify.word(86);
    let word87 = identify.word(87);
    let word83_valid = storectl_common::bits::identify_word_valid(word83);
    let supported_83 = word83_valid && storectl_common::bits::bit(word83, 11);
    let supported_86 = storectl_common::bits::bit(word87, 15) && storectl_common::bits::bit(word86, 11);
    supported_83 || supported_86
}

/// `true` when DMA-mode DCO commands are usable: word 069 bit 12 set and
/// validated by word 053 bit 1.
pub fn dma_supported(identify: &AtaIdentify) -> bool {
    let word53 = identify.word(53);
    let word69 = identify.word(69);
    storectl_common::bits::bit(word53, 1) && storectl_common::bits::bit(word69, 12)
}

fn issue(
    device: &mut dyn DeviceHandle,
    feature: u16,
    data: DataPhase<'_>,
) -> Result<storectl_core::AtaOutcome> {
    let mut taskfile = AtaTaskfile::new(CMD_DCO_IDENTIFY);
    taskfile.features = feature;
    device.ata_command(&taskfile, data)
}

/// Issues DCO-Identify (DMA mode if available) and parses the returned
/// page. Checksum failure is reported as `valid_checksum = false` on the
/// parsed page rather than as a hard error.
pub fn identify(device: &mut dyn DeviceHandle) -> Result<DcoPage> {
    let identify_data = device.ata_identify()?;
    if !is_supported(identify_data) {
        return Err(Error::NotSupported);
    }
    let use_dma = dma_supported(identify_data);
    let feature = if use_dma { feature::IDENTIFY_DMA } else { feature::IDENTIFY };

    let mut buf = [0u8; 512];
    let outcome = issue(device, feature, DataPhase::In(&mut buf))?;
    if !outcome.succeeded() {
        return Err(Error::Failure("DCO Identify rejected by device"));
    }
    Ok(DcoPage::parse(&buf))
}

/// Issues DCO-Set: clears every bit the caller set to `false` in `page`
/// relative to a fresh Identify read, leaves `true` bits untouched,
/// writes the caller's max LBA, recomputes the trailing checksum, then
/// writes the page back.
pub fn set(device: &mut dyn DeviceHandle, page: &DcoPage) -> Result<()> {
    let current = identify(device)?;
    let mut merged = current;
    merged.apply_restrictions(page);
    merged.max_lba = page.max_lba;

    let mut buf = merged.to_bytes();
    storectl_common::alg::hash::word_sum::recompute_trailing(&mut buf);

    let identify_data = device.ata_identify()?;
    let feature = if dma_supported(identify_data) { feature::SET_DMA } else { feature::SET };
    let outcome = issue(device, feature, DataPhase::Out(&buf[..]))?;
    if !outcome.succeeded() {
        return Err(Error::Failure("DCO Set rejected by device"));
    }
    device.refresh_identify()
}

/// Direct DCO-Restore. An Aborted return is probed with a
/// follow-up DCO-Identify — if that also aborts the feature set is
/// `Frozen`; otherwise an established HPA is the more likely cause and
/// the restore is reported as a plain `Failure`.
pub fn restore(device: &mut dyn DeviceHandle) -> Result<()> {
    let outcome = issue(device, feature::RESTORE, DataPhase::None)?;
    if outcome.succeeded() {
        return device.refresh_identify();
    }
    match identify(device) {
        Err(Error::Failure(_)) | Err(Error::NotSupported) => Err(Error::Frozen),
        Ok(_) => Err(Error::Failure("DCO Restore rejected by device; an established HPA is likely blocking it")),
        Err(other) => Err(other),
    }
}

/// Direct DCO-Freeze-Lock. An Aborted return means "already frozen", not
/// a generic failure.
pub fn freeze_lock(device: &mut dyn DeviceHandle) -> Result<()> {
    let outcome = issue(device, feature::FREEZE_LOCK, DataPhase::None)?;
    if outcome.succeeded() {
        Ok(())
    } else {
        Err(Error::Frozen)
    }
}
