//! The ATA convention for page checksums that aren't actually CRCs: the
//! page is split into 16-bit little-endian words, and a trailing
//! checksum word is chosen so that the sum of every word in the page is
//! zero modulo 65536. Used by the DCO parameter page (word 255, low
//! byte) and validated the same way for the SATA PHY event counter log.

/// Sum of all little-endian 16-bit words in `page`, wrapping on overflow.
///
/// `page.len()` must be even; the caller is expected to pass whole pages.
pub fn word_sum(page: &[u8]) -> u16 {
    debug_assert!(page.len() % 2 == 0, "word_sum requires an even-length page");
    page.chunks_exact(2)
    .fold(0u16, |acc, pair| acc.wrapping_add(u16::from_le_bytes([pair[0], pair[1]])))
}

/// `true` if the 16-bit word-sum of `page` is zero mod 65536.
pub fn is_valid(page: &[u8]) -> bool {
    word_sum(page) == 0
}

/// Recomputes the trailing checksum word (assumed to be the last two
/// bytes of `page`, little-endian) so that `word_sum(page) == 0`
/// afterwards. The existing checksum word is excluded from the running
/// sum before the new value is derived.
pub fn recompute_trailing(page: &mut [u8]) {
    let len = page.len();
    debug_assert!(len >= 2 && len % 2 == 0);
    let body_sum = word_sum(&page[.len() - 2]);
    let checksum = 0u16.wrapping_sub(body_sum);
    page[len - 2..].copy_from_slice(&checksum.to_le_bytes());
}
