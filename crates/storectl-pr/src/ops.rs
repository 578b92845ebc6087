//! Register/Unregister/Acquire/Release/Clear/Preempt, dispatched to the
//! SCSI or NVMe wire form behind a single protocol-agnostic entry point
//! per operation.

use storectl_core::{DeviceHandle, DriveClass, Error, Result};

use crate::nvme;
use crate::scsi::{self, issue_out, ParameterFlags, SERVICE_ACTION_CLEAR, SERVICE_ACTION_PREEMPT, SERVICE_ACTION_PREEMPT_AND_ABORT, SERVICE_ACTION_REGISTER, SERVICE_ACTION_REGISTER_AND_IGNORE, SERVICE_ACTION_RELEASE, SERVICE_ACTION_RESERVE};
use crate::types::{ReservationScope, ReservationType};

pub use nvme::ChangePersistThroughPowerLoss;

fn reject_obsolete_on_nvme(device: &dyn DeviceHandle, reservation_type: ReservationType) -> Result<()> {
    if device.drive_class() == DriveClass::Nvme && reservation_type.nvme_code().is_none() {
        return Err(Error::BadParameter);
    }
    Ok(())
}

/// SCSI sends Register or Register-and-Ignore with current-key=0 and
/// service-action-key=`new_key`; NVMe issues Reservation Register with
/// the given CPTPL value.
pub fn register(device: &mut dyn DeviceHandle, new_key: u64, all_target_ports: bool, persist_through_power_loss: bool, ignore_existing: bool) -> Result<()> {
    match device.drive_class() {
        DriveClass::Scsi | DriveClass::Ata => {
            let service_action = if ignore_existing { SERVICE_ACTION_REGISTER_AND_IGNORE } else { SERVICE_ACTION_REGISTER };
            let block = scsi::basic_parameter_block(
                0,
                new_key,
                ParameterFlags {
                    spec_i_pt: false,
                    all_tg_pt: all_target_ports,
                    aptpl: persist_through_power_loss,
                },
            );
            issue_out(device, service_action, ReservationScope::LogicalUnit, ReservationType::WriteExclusive, &block)
        }
        DriveClass::Nvme => {
            let cptpl = if persist_through_power_loss {
                ChangePersistThroughPowerLoss::Set
            } else {
                ChangePersistThroughPowerLoss::Clear
            };
            nvme::register(device, 0, new_key, cptpl, ignore_existing)
        }
    }
}

/// SCSI Register with service-action-key=0; NVMe Reservation Register
/// unregister op.
pub fn unregister(device: &mut dyn DeviceHandle, current_key: u64) -> Result<()> {
    match device.drive_class() {
        DriveClass::Scsi | DriveClass::Ata => {
            let block = scsi::basic_parameter_block(current_key, 0, ParameterFlags::default());
            issue_out(device, SERVICE_ACTION_REGISTER, ReservationScope::LogicalUnit, ReservationType::WriteExclusive, &block)
        }
        DriveClass::Nvme => nvme::unregister(device, current_key),
    }
}

/// Rejects obsolete SCSI-only reservation types when targeting NVMe.
pub fn acquire(device: &mut dyn DeviceHandle, key: u64, reservation_type: ReservationType) -> Result<()> {
    reject_obsolete_on_nvme(device, reservation_type)?;
    match device.drive_class() {
        DriveClass::Scsi | DriveClass::Ata => {
            let block = scsi::basic_parameter_block(key, 0, ParameterFlags::default());
            issue_out(device, SERVICE_ACTION_RESERVE, ReservationScope::LogicalUnit, reservation_type, &block)
        }
        DriveClass::Nvme => nvme::acquire(device, key, reservation_type),
    }
}

/// Symmetric to [`acquire`].
pub fn release(device: &mut dyn DeviceHandle, key: u64, reservation_type: ReservationType) -> Result<()> {
    reject_obsolete_on_nvme(device, reservation_type)?;
    match device.drive_class() {
        DriveClass::Scsi | DriveClass::Ata => {
            let block = scsi::basic_parameter_block(key, 0, ParameterFlags::default());
            issue_out(device, SERVICE_ACTION_RELEASE, ReservationScope::LogicalUnit, reservation_type, &block)
        }
        DriveClass::Nvme => nvme::release(device, key, reservation_type),
    }
}

/// Removes all registrations and any active reservation.
pub fn clear(device: &mut dyn DeviceHandle, key: u64) -> Result<()> {
    match device.drive_class() {
        DriveClass::Scsi | DriveClass::Ata => {
            let block = scsi::basic_parameter_block(key, 0, ParameterFlags::default());
            issue_out(device, SERVICE_ACTION_CLEAR, ReservationScope::LogicalUnit, ReservationType::WriteExclusive, &block)
        }
        DriveClass::Nvme => nvme::clear(device, key),
    }
}

/// SCSI Preempt or Preempt-and-Abort; NVMe Reservation Acquire op 1 or 2.
pub fn preempt(device: &mut dyn DeviceHandle, key: u64, preempt_key: u64, reservation_type: ReservationType, abort: bool) -> Result<()> {
    reject_obsolete_on_nvme(device, reservation_type)?;
    match device.drive_class() {
        DriveClass::Scsi | DriveClass::Ata => {
            let service_action = if abort { SERVICE_ACTION_PREEMPT_AND_ABORT } else { SERVICE_ACTION_PREEMPT };
            let block = scsi::basic_parameter_block(key, preempt_key, ParameterFlags::default());
            issue_out(device, service_action, ReservationScope::LogicalUnit, reservation_type, &block)
        }
        DriveClass::Nvme => nvme::preempt(device, key, preempt_key, reservation_type, abort),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storectl_core::device::{AtaIdentify, AtaOutcome, AtaTaskfile, DataPhase, IdentifyData, NvmeCommand, NvmeOutcome, ScsiOutcome, SenseData, TransportHints};

    /// A scripted in-memory SCSI target tracking one registration key
    /// and an optional reservation, enough to exercise every op's
    /// dispatch and parameter-block shape.
    struct MockScsiTarget {
        identify_data: IdentifyData,
        registered_key: u64,
        reservation: Option<(u64, ReservationType)>,
    }

    impl MockScsiTarget {
        fn new() -> Self {
            Self {
                identify_data: IdentifyData::Scsi(storectl_core::device::ScsiIdentify {
                        inquiry: [0u8; 96],
                        vpd: alloc::vec::Vec::new(),
                }),
                registered_key: 0,
                reservation: None,
            }
        }
    }

    impl DeviceHandle for MockScsiTarget {
        fn drive_class(&self) -> DriveClass {
            DriveClass::Scsi
        }
        fn identify(&self) -> &IdentifyData {
            &self.identify_data
        }
        fn block_size(&self) -> u32 {
            512
        }
        fn max_lba(&self) -> u64 {
            0
        }
        fn min_dma_alignment(&self) -> u32 {
            1
        }
        fn transport_hints(&self) -> TransportHints {
            TransportHints {
                sat_layer_present: false,
                direct_ata_path: false,
                dma_available: true,
            }
        }
        fn ata_command(&mut self, _cmd: &AtaTaskfile, _data: DataPhase<'_>) -> Result<AtaOutcome> {
            Err(Error::NotSupported)
        }
        fn scsi_command(&mut self, cdb: &[u8], data: DataPhase<'_>) -> Result<ScsiOutcome> {
            let service_action = cdb[1] & 0x1F;
            if cdb[0] == scsi::OPCODE_PERSISTENT_RESERVE_OUT {
                let block = match data {
                    DataPhase::Out(b) => b,
                    _ => return Err(Error::BadParameter),
                };
                let key = u64::from_be_bytes(block[0..8].try_into().unwrap());
                let service_key = u64::from_be_bytes(block[8..16].try_into().unwrap());
                match service_action {
                    SERVICE_ACTION_REGISTER | SERVICE_ACTION_REGISTER_AND_IGNORE => {
                        if service_key == 0 {
                            self.registered_key = 0;
                        } else {
                            self.registered_key = service_key;
                        }
                    }
                    SERVICE_ACTION_RESERVE => {
                        let ty = ReservationType::from_scsi_code(cdb[2] & 0x0F).unwrap();
                        self.reservation = Some((key, ty));
                    }
                    SERVICE_ACTION_RELEASE => {
                        self.reservation = None;
                    }
                    SERVICE_ACTION_CLEAR => {
                        self.registered_key = 0;
                        self.reservation = None;
                    }
                    SERVICE_ACTION_PREEMPT | SERVICE_ACTION_PREEMPT_AND_ABORT => {
                        self.reservation = self.reservation.filter(|(holder, _)| *holder != service_key);
                    }
                    _ => return Ok(ScsiOutcome { status: 0x02, sense: SenseData::default() }),
                }
                return Ok(ScsiOutcome { status: 0, sense: SenseData::default() });
            }
            Err(Error::NotSupported)
        }
        fn nvme_command(&mut self, _cmd: &NvmeCommand, _data: DataPhase<'_>) -> Result<NvmeOutcome> {
            Err(Error::NotSupported)
        }
        fn refresh_identify(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn register_then_acquire_then_release_round_trip() {
        let mut target = MockScsiTarget::new();
        register(&mut target, 0xABCD, false, false, false).unwrap();
        assert_eq!(target.registered_key, 0xABCD);

        acquire(&mut target, 0xABCD, ReservationType::WriteExclusiveRegistrantsOnly).unwrap();
        assert_eq!(target.reservation, Some((0xABCD, ReservationType::WriteExclusiveRegistrantsOnly)));

        release(&mut target, 0xABCD, ReservationType::WriteExclusiveRegistrantsOnly).unwrap();
        assert_eq!(target.reservation, None);
    }

    #[test]
    fn preempt_removes_the_preempted_holder() {
        let mut target = MockScsiTarget::new();
        register(&mut target, 0xAAAA, false, false, false).unwrap();
        acquire(&mut target, 0xAAAA, ReservationType::ExclusiveAccess).unwrap();
        preempt(&mut target, 0xBBBB, 0xAAAA, ReservationType::ExclusiveAccess, false).unwrap();
        assert_eq!(target.reservation, None);
    }

    struct StubNvme;

    impl DeviceHandle for StubNvme {
        fn drive_class(&self) -> DriveClass {
            DriveClass::Nvme
        }
        fn identify(&self) -> &IdentifyData {
            unimplemented!()
        }
        fn block_size(&self) -> u32 {
            512
        }
        fn max_lba(&self) -> u64 {
            0
        }
        fn min_dma_alignment(&self) -> u32 {
            1
        }
        fn transport_hints(&self) -> TransportHints {
            TransportHints {
                sat_layer_present: false,
                direct_ata_path: false,
                dma_available: true,
            }
        }
        fn ata_command(&mut self, _cmd: &AtaTaskfile, _data: DataPhase<'_>) -> Result<AtaOutcome> {
            Err(Error::NotSupported)
        }
        fn scsi_command(&mut self, _cdb: &[u8], _data: DataPhase<'_>) -> Result<ScsiOutcome> {
            Err(Error::NotSupported)
        }
        fn nvme_command(&mut self, _cmd: &NvmeCommand, _data: DataPhase<'_>) -> Result<NvmeOutcome> {
            Ok(NvmeOutcome { status: 0 })
        }
        fn refresh_identify(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn acquire_rejects_obsolete_type_on_nvme() {
        let mut nvme = StubNvme;
        assert_eq!(acquire(&mut nvme, 1, ReservationType::ReadShared), Err(Error::BadParameter));
    }
}
