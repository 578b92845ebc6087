//! The 512-byte DCO parameter page: revision, transfer-mode
//! masks, 48-bit max LBA, and the three feature-set masks ACS/ACS-2
//! define for DCO. Field byte offsets below are the page's actual wire
//! layout, not a restatement of a higher-level description.

/// Multi-word and Ultra DMA transfer modes a DCO page can allow or deny.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferModeMask {
    pub mwdma0: bool,
    pub mwdma1: bool,
    pub mwdma2: bool,
    pub udma0: bool,
    pub udma1: bool,
    pub udma2: bool,
    pub udma3: bool,
    pub udma4: bool,
    pub udma5: bool,
    pub udma6: bool,
}

/// Word-14/15 feature mask (ACS "feature set 1").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DcoFeatures1 {
    pub smart_feature: bool,
    pub smart_self_test: bool,
    pub smart_error_log: bool,
    pub ata_security: bool,
    pub power_up_in_standby: bool,
    pub read_write_dma_queued: bool,
    pub automatic_acoustic_management: bool,
    pub host_protected_area: bool,
    pub forty_eight_bit_address: bool,
    pub streaming: bool,
    pub time_limited_commands: bool,
    pub force_unit_access: bool,
    pub smart_selective_self_test: bool,
    pub smart_conveyance_self_test: bool,
    pub write_read_verify: bool,
}

/// Word-16/17 feature mask (SATA-specific features).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SataFeatures {
    pub ncq: bool,
    pub non_zero_buffer_offsets: bool,
    pub interface_power_management: bool,
    pub asynchronous_notification: bool,
    pub software_settings_preservation: bool,
}

/// Word-42/43 feature mask (ACS "feature set 2").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DcoFeatures2 {
    pub extended_power_conditions: bool,
    pub data_set_management: bool,
    pub free_fall: bool,
    pub trusted_computing: bool,
    pub write_uncorrectable: bool,
    pub nv_cache_power_management: bool,
    pub nv_cache: bool,
}

/// A parsed (or caller-built, for Set) DCO parameter page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DcoPage {
    pub revision: u16,
    pub transfer_modes: TransferModeMask,
    pub max_lba: u64,
    pub feat1: DcoFeatures1,
    pub sata_feat: SataFeatures,
    pub feat2: DcoFeatures2,
    /// `false` if the page's word-sum-to-zero checksum didn't validate.
    /// The page is still returned in full; this flag is the only
    /// signal.
    pub valid_checksum: bool,
}

macro_rules! bit_field {
    ($word:expr, $bit:expr) => {
        $word & (1u16 << $bit) != 0
    };
}

impl DcoPage {
    /// Parses a 512-byte DCO-Identify response.
    pub fn parse(buf: &[u8; 512]) -> Self {
        let valid_checksum = storectl_common::alg::hash::word_sum::is_valid(buf);
        let word = |offset: usize| u16::from_le_bytes([buf[offset], buf[offset + 1]]);

        let revision = word(0);
        let mwdma = word(2);
        let udma = word(4);
        let max_lba = u64::from_le_bytes([buf[6], buf[7], buf[8], buf[9], buf[10], buf[11], buf[12], buf[13]]);
        let features1 = word(14);
        let sata_features = word(16);
        let features2 = word(42);

        Self {
            revision,
            transfer_modes: TransferModeMask {
                mwdma0: bit_field!(mwdma, 0),
                mwdma1: bit_field!(mwdma, 1),
                mwdma2: bit_field!(mwdma, 2),
                udma0: bit_field!(udma, 0),
                udma1: bit_field!(udma, 1),
                udma2: bit_field!(udma, 2),
                udma3: bit_field!(udma, 3),
                udma4: bit_field!(udma, 4),
                udma5: bit_field!(udma, 5),
                udma6: bit_field!(udma, 6),
            },
            max_lba,
            feat1: DcoFeatures1 {
                smart_feature: bit_field!(features1, 0),
                smart_self_test: bit_field!(features1, 1),
                smart_error_log: bit_field!(features1, 2),
                ata_security: bit_field!(features1, 3),
                power_up_in_standby: bit_field!(features1, 4),
                read_write_dma_queued: bit_field!(features1, 5),
                automatic_acoustic_management: bit_field!(features1, 6),
                host_protected_area: bit_field!(features1, 7),
                forty_eight_bit_address: bit_field!(features1, 8),
                streaming: bit_field!(features1, 9),
                time_limited_commands: bit_field!(features1, 10),
                force_unit_access: bit_field!(features1, 11),
                smart_selective_self_test: bit_field!(features1, 12),
                smart_conveyance_self_test: bit_field!(features1, 13),
                write_read_verify: bit_field!(features1, 14),
            },
            sata_feat: SataFeatures {
                ncq: bit_field!(sata_features, 0),
                non_zero_buffer_offsets: bit_field!(sata_features, 1),
                interface_power_management: bit_field!(sata_features, 2),
                asynchronous_notification: bit_field!(sata_features, 3),
                software_settings_preservation: bit_field!(sata_features, 4),
            },
            feat2: DcoFeatures2 {
                extended_power_conditions: bit_field!(features2, 9),
                data_set_management: bit_field!(features2, 10),
                free_fall: bit_field!(features2, 11),
                trusted_computing: bit_field!(features2, 12),
                write_uncorrectable: bit_field!(features2, 13),
                nv_cache_power_management: bit_field!(features2, 14),
                nv_cache: bit_field!(features2, 15),
            },
            valid_checksum,
        }
    }

    /// For every field `restrictions` carries as `false`, clears the
    /// matching bit in `self`; fields left `true` in `restrictions` are
    /// untouched.
    pub fn apply_restrictions(&mut self, restrictions: &DcoPage) {
        let t = &mut self.transfer_modes;
        let r = &restrictions.transfer_modes;
        t.mwdma0 &= r.mwdma0;
        t.mwdma1 &= r.mwdma1;
        t.mwdma2 &= r.mwdma2;
        t.udma0 &= r.udma0;
        t.udma1 &= r.udma1;
        t.udma2 &= r.udma2;
        t.udma3 &= r.udma3;
        t.udma4 &= r.udma4;
        t.udma5 &= r.udma5;
        t.udma6 &= r.udma6;

        let f1 = &mut self.feat1;
        let rf1 = &restrictions.feat1;
        f1.smart_feature &= rf1.smart_feature;
        f1.smart_self_test &= rf1.smart_self_test;
        f1.smart_error_log &= rf1.smart_error_log;
        f1.ata_security &= rf1.ata_security;
        f1.power_up_in_standby &= rf1.power_up_in_standby;
        f1.read_write_dma_queued &= rf1.read_write_dma_queued;
        f1.automatic_acoustic_management &= rf1.automatic_acoustic_management;
        f1.host_protected_area &= rf1.host_protected_area;
        f1.forty_eight_bit_address &= rf1.forty_eight_bit_address;
        f1.streaming &= rf1.streaming;
        f1.time_limited_commands &= rf1.time_limited_commands;
        f1.force_unit_access &= rf1.force_unit_access;
        f1.smart_selective_self_test &= rf1.smart_selective_self_test;
        f1.smart_conveyance_self_test &= rf1.smart_conveyance_self_test;
        f1.write_read_verify &= rf1.write_read_verify;

        let sf = &mut self.sata_feat;
        let rsf = &restrictions.sata_feat;
        sf.ncq &= rsf.ncq;
        sf.non_zero_buffer_offsets &= rsf.non_zero_buffer_offsets;
        sf.interface_power_management &= rsf.interface_power_management;
        sf.asynchronous_notification &= rsf.asynchronous_notification;
        sf.software_settings_preservation &= rsf.software_settings_preservation;

        let f2 = &mut self.feat2;
        let rf2 = &restrictions.feat2;
        f2.extended_power_conditions &= rf2.extended_power_conditions;
        f2.data_set_management &= rf2.data_set_management;
        f2.free_fall &= rf2.free_fall;
        f2.trusted_computing &= rf2.trusted_computing;
        f2.write_uncorrectable &= rf2.write_uncorrectable;
        f2.nv_cache_power_management &= rf2.nv_cache_power_management;
        f2.nv_cache &= rf2.nv_cache;
    }

    /// Serializes to the 512-byte wire form. The trailing checksum word
    /// is left at zero; callers issuing a Set recompute it with
    /// [`storectl_common::alg::hash::word_sum::recompute_trailing`].
    pub fn to_bytes(&self) -> [u8; 512] {
        let mut buf = [0u8; 512];
        buf[0..2].copy_from_slice(&self.revision.to_le_bytes());

        let t = &self.transfer_modes;
        let mwdma = (t.mwdma0 as u16) | (t.mwdma1 as u16) << 1 | (t.mwdma2 as u16) << 2;
        let udma = (t.udma0 as u16)
        | (t.udma1 as u16) << 1
        | (t.udma2 as u16) << 2
        | (t.udma3 as u16) << 3
        | (t.udma4 as u16) << 4
        | (t.udma5 as u16) << 5
        | (t.udma6 as u16) << 6;
        buf[2..4].copy_from_slice(&mwdma.to_le_bytes());
        buf[4..6].copy_from_slice(&udma.to_le_bytes());
        buf[6..14].copy_from_slice(&self.max_lba.to_le_bytes());

        let f1 = &self.feat1;
        let features1 = (f1.smart_feature as u16)
        | (f1.smart_self_test as u16) << 1
        | (f1.smart_error_log as u16) << 2
        | (f1.ata_security as u16) << 3
        | (f1.power_up_in_standby as u16) << 4
        | (f1.read_write_dma_queued as u16) << 5
        | (f1.automatic_acoustic_management as u16) << 6
        | (f1.host_protected_area as u16) << 7
        | (f1.forty_eight_bit_address as u16) << 8
        | (f1.streaming as u16) << 9
        | (f1.time_limited_commands as u16) << 10
        | (f1.force_unit_access as u16) << 11
        | (f1.smart_selective_self_test as u16) << 12
        | (f1.smart_conveyance_self_test as u16) << 13
        | (f1.write_read_verify as u16) << 14;
        buf[14..16].copy_from_slice(&features1.to_le_bytes());

        let sf = &self.sata_feat;
        let sata_features = (sf.ncq as u16)
        | (sf.non_zero_buffer_offsets as u16) << 1
        | (sf.interface_power_management as u16) << 2
        | (sf.asynchronous_notification as u16) << 3
        | (sf.software_settings_preservation as u16) << 4;
        buf[16..18].copy_from_slice(&sata_features.to_le_bytes());

        let f2 = &self.feat2;
        let features2 = (f2.extended_power_conditions as u16) << 9
        | (f2.data_set_management as u16) << 10
        | (f2.free_fall as u16) << 11
        | (f2.trusted_computing as u16) << 12
        | (f2.write_uncorrectable as u16) << 13
        | (f2.nv_cache_power_management as u16) << 14
        | (f2.nv_cache as u16) << 15;
        buf[42..44].copy_from_slice(&features2.to_le_bytes());

        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_page() -> [u8; 512] {
        let mut buf = [0u8; 512];
        buf[0..2].copy_from_slice(&2u16.to_le_bytes()); // revision
        buf[2..4].copy_from_slice(&0b0000_0111u16.to_le_bytes()); // mwdma0-2
        buf[4..6].copy_from_slice(&0b0111_1111u16.to_le_bytes()); // udma0-6
        buf[6..14].copy_from_slice(&0x0000_FFFF_FFFFu64.to_le_bytes());
        buf[14..16].copy_from_slice(&0b0000_0000_0000_1000u16.to_le_bytes()); // ata_security
        storectl_common::alg::hash::word_sum::recompute_trailing(&mut buf);
        buf
    }

    #[test]
    fn parses_transfer_mode_and_feature_masks() {
        let page = DcoPage::parse(&sample_page());
        assert!(page.valid_checksum);
        assert!(page.transfer_modes.udma6);
        assert!(page.feat1.ata_security);
        assert!(!page.feat1.streaming);
        assert_eq!(page.max_lba, 0x0000_FFFF_FFFF);
    }

    #[test]
    fn invalid_checksum_is_flagged_not_rejected() {
        let mut buf = sample_page();
        buf[10] ^= 0xFF;
        let page = DcoPage::parse(&buf);
        assert!(!page.valid_checksum);
        assert_eq!(page.max_lba & 0xFF_0000, (0x0000_FFFF_FFFFu64 ^ 0xFF0000) & 0xFF_0000);
    }

    #[test]
    fn round_trips_through_to_bytes() {
        let original = sample_page();
        let page = DcoPage::parse(&original);
        let mut rebuilt = page.to_bytes();
        storectl_common::alg::hash::word_sum::recompute_trailing(&mut rebuilt);
        assert_eq!(DcoPage::parse(&rebuilt), page);
    }

    #[test]
    fn apply_restrictions_only_clears_false_fields() {
        let mut page = DcoPage::parse(&sample_page());
        let mut restrictions = page;
        restrictions.feat1.ata_security = false;
        page.apply_restrictions(&restrictions);
        assert!(!page.feat1.ata_security);
        assert!(page.transfer_modes.udma6, "fields left true must be untouched");
    }
}
