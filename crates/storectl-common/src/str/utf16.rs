use crate::types::{
    endian::{Endian, LittleEndian},
    number::U16,
};

/// A fixed-width, NUL-padded UTF-16LE string, as used by GPT partition
/// names (36 code units / 72 bytes).
#[repr(C)]
#[derive(Clone, Copy)]
pub struct FixedUtf16Str<const N: usize> {
    data: [U16<LittleEndian>; N],
}

impl<const N: usize> core::fmt::Debug for FixedUtf16Str<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FixedUtf16Str")
        .field("code_units", &N)
        .finish()
    }
}

impl<const N: usize> Default for FixedUtf16Str<N> {
    fn default() -> Self {
        Self {
            data: [U16::new(0); N],
        }
    }
}

impl<const N: usize> FixedUtf16Str<N> {
    pub fn from_units(units: [u16; N]) -> Self {
        let mut data = [U16::new(0); N];
        for (slot, unit) in data.iter_mut().zip(units.iter()) {
            slot.set(*unit);
        }
        Self { data }
    }

    pub fn code_units(&self) -> impl Iterator<Item = u16> + '_ {
        self.data.iter().map(|w| w.get()).take_while(|w| *w != 0)
    }

    /// Decodes the NUL-terminated prefix as real UTF-16, replacing any
    /// unpaired surrogate with U+FFFD rather than failing outright —
    /// partition names are cosmetic, not a parse-gating field.
    #[cfg(feature = "alloc")]
    pub fn to_string(&self) -> alloc::string::String {
        char::decode_utf16(self.code_units())
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
    }
}

#[cfg(feature = "bytemuck")]
unsafe impl<const N: usize> bytemuck::Pod for FixedUtf16Str<N> {}
#[cfg(feature = "bytemuck")]
unsafe impl<const N: usize> bytemuck::Zeroable for FixedUtf16Str<N> {}

#[cfg(all(test, feature = "alloc"))]
mod tests {
    use super::*;

    #[test]
    fn decodes_ascii_prefix() {
        let units: [u16; 8] = [b'E' as u16, b'F' as u16, b'I' as u16, 0, 0, 0, 0, 0];
        let s = FixedUtf16Str::from_units(units);
        assert_eq!(s.to_string(), "EFI");
    }

    #[test]
    fn empty_name_decodes_to_empty_string() {
        let s: FixedUtf16Str<36> = FixedUtf16Str::default();
        assert_eq!(s.to_string(), "");
    }
}
