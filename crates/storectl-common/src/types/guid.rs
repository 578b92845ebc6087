//! Mixed-endian GUIDs, as used by GPT partition-table headers and entries.
//!
//! A GUID's wire encoding per RFC 4122 / the UEFI spec mixes endianness
//! within one 16-byte value: `time_low` (u32), `time_mid` (u16), and
//! `time_hi_and_version` (u16) are little-endian; `clock_seq_hi_and_reserved`,
//! `clock_seq_low`, and the 6-byte `node` are big-endian (byte-order,
//! i.e. stored in wire order). Naive byte-for-byte copies are wrong for
//! any code that also needs the canonical string form.

use crate::types::endian::{BigEndian, Endian, LittleEndian};
use crate::types::number::{U16, U32};

#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "bytemuck", derive(bytemuck::Pod, bytemuck::Zeroable))]
pub struct Guid([u8; 16]);

impl Default for Guid {
    fn default() -> Self {
        Self([0; 16])
    }
}

impl core::fmt::Debug for Guid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let (a, b, c, d, e) = self.fields();
        write!(f, "{:08x}-{:04x}-{:04x}-{:04x}-", a, b, c, d)?;
        for byte in e {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl Guid {
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Builds a GUID from its mixed-endian canonical fields.
    pub fn from_fields(time_low: u32, time_mid: u16, time_hi_and_version: u16, clock_seq: u16, node: [u8; 6]) -> Self {
        let mut bytes = [0u8; 16];
        bytes[0..4].copy_from_slice(&U32::<LittleEndian>::new(time_low).as_bytes());
        bytes[4..6].copy_from_slice(&U16::<LittleEndian>::new(time_mid).as_bytes());
        bytes[6..8].copy_from_slice(&U16::<LittleEndian>::new(time_hi_and_version).as_bytes());
        bytes[8..10].copy_from_slice(&U16::<BigEndian>::new(clock_seq).as_bytes());
        bytes[10..16].copy_from_slice(&node);
        Self(bytes)
    }

    /// Decomposes into `(time_low, time_mid, time_hi_and_version, clock_seq, node)`.
    pub fn fields(&self) -> (u32, u16, u16, u16, [u8; 6]) {
        let time_low = U32::<LittleEndian>::from_bytes(self.0[0..4].try_into().unwrap()).get();
        let time_mid = U16::<LittleEndian>::from_bytes(self.0[4..6].try_into().unwrap()).get();
        let time_hi = U16::<LittleEndian>::from_bytes(self.0[6..8].try_into().unwrap()).get();
        let clock_seq = U16::<BigEndian>::from_bytes(self.0[8..10].try_into().unwrap()).get();
        let mut node = [0u8; 6];
        node.copy_from_slice(&self.0[10..16]);
        (time_low, time_mid, time_hi, clock_seq, node)
    }

    pub const NIL: Self = Self([0; 16]);
}

// Small helpers so `Guid::from_fields` can read back the bytes of a
// freshly constructed endian-tagged integer without pulling in the
// `Endian::set`/mutable-self API for a one-shot conversion.
trait AsBytesExt<const N: usize> {
    fn as_bytes(&self) -> [u8; N];
    fn from_bytes(bytes: [u8; N]) -> Self;
}

impl AsBytesExt<2> for U16<LittleEndian> {
    fn as_bytes(&self) -> [u8; 2] {
        self.get().to_le_bytes()
    }
    fn from_bytes(bytes: [u8; 2]) -> Self {
        U16::new(u16::from_le_bytes(bytes))
    }
}

impl AsBytesExt<2> for U16<BigEndian> {
    fn as_bytes(&self) -> [u8; 2] {
        self.get().to_be_bytes()
    }
    fn from_bytes(bytes: [u8; 2]) -> Self {
        U16::new(u16::from_be_bytes(bytes))
    }
}

impl AsBytesExt<4> for U32<LittleEndian> {
    fn as_bytes(&self) -> [u8; 4] {
        self.get().to_le_bytes()
    }
    fn from_bytes(bytes: [u8; 4]) -> Self {
        U32::new(u32::from_le_bytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_fields() {
        let guid = Guid::from_fields(0xC12A7328, 0xF81F, 0x11D2, 0xBA4B, [0x00, 0xA0, 0xC9, 0x3E, 0xC9, 0x3B]);
        let (a, b, c, d, e) = guid.fields();
        assert_eq!(a, 0xC12A7328);
        assert_eq!(b, 0xF81F);
        assert_eq!(c, 0x11D2);
        assert_eq!(d, 0xBA4B);
        assert_eq!(e, [0x00, 0xA0, 0xC9, 0x3E, 0xC9, 0x3B]);
    }

    #[test]
    fn nil_is_all_zero() {
        assert_eq!(Guid::NIL.as_bytes(), &[0u8; 16]);
    }
}
