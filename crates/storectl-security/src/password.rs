//! The ATA Security password parameter block and its two
//! wire serializations: native ATA and SATL-wrapped. These differ in two
//! fields (enhanced-erase bit position, master-password-identifier
//! endianness) — a `memcpy` between them is wrong, so each has its own
//! serializer rather than one shared byte-copy path.

/// Which password role a block targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordRole {
    User,
    Master,
}

/// Logical contents of an ATA Security password block, independent of
/// which wire form it will be serialized to.
#[derive(Debug, Clone)]
pub struct PasswordBlock {
    pub role: PasswordRole,
    pub enhanced_erase: bool,
    /// ZAC "erase full zones" flag.
    pub zac_erase_full_zones: bool,
    /// Maximum-security bit, meaningful on SET PASSWORD only.
    pub maximum_security: bool,
    pub password: [u8; 32],
    pub master_password_id: u16,
}

impl PasswordBlock {
    pub fn new(role: PasswordRole, password: &[u8]) -> Self {
        let mut bytes = [0u8; 32];
        let n = password.len().min(32);
        bytes[..n].copy_from_slice(&password[..n]);
        Self {
            role,
            enhanced_erase: false,
            zac_erase_full_zones: false,
            maximum_security: false,
            password: bytes,
            master_password_id: 0,
        }
    }
}

impl Drop for PasswordBlock {
    fn drop(&mut self) {
        zero_volatile(&mut self.password);
    }
}

/// A 512-byte on-wire password page that zeroes itself on drop, so a
/// serialized parameter block never outlives the command that used it.
pub struct WirePasswordPage(pub [u8; 512]);

impl Drop for WirePasswordPage {
    fn drop(&mut self) {
        zero_volatile(&mut self.0);
    }
}

impl core::ops::Deref for WirePasswordPage {
    type Target = [u8; 512];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Zeroes a password buffer before release, so no parameter block
/// outlives the command that used it.
fn zero_volatile(buf: &mut [u8]) {
    for byte in buf.iter_mut() {
        // SAFETY: `byte` is a valid, aligned `u8` reference for the
        // duration of the write; `write_volatile` prevents the compiler
        // from eliding this store as dead code on drop.
        unsafe { core::ptr::write_volatile(byte, 0) };
    }
}

/// Result of serializing a [`PasswordBlock`] for the SATL wire form: the
/// page itself, plus the role, which SATL pass-through conveys via the
/// SECURITY PROTOCOL OUT CDB's protocol-specific field rather than in
/// the page (the user/master role bit has no unambiguous home once the
/// enhanced-erase bit moves into byte 0 bit 0, so this workspace carries
/// role out-of-band alongside the page — see DESIGN.md).
pub struct SatlPasswordPage {
    pub page: WirePasswordPage,
    pub role: PasswordRole,
}

impl PasswordBlock {
    /// Native ATA wire form.
    pub fn serialize_native(&self) -> WirePasswordPage {
        let mut page = [0u8; 512];
        page[0] = (matches!(self.role, PasswordRole::Master) as u8)
        | ((self.enhanced_erase as u8) << 1)
        | ((self.zac_erase_full_zones as u8) << 2);
        page[1] = self.maximum_security as u8;
        page[2..34].copy_from_slice(&self.password);
        page[34..36].copy_from_slice(&self.master_password_id.to_le_bytes());
        WirePasswordPage(page)
    }

    /// SATL-wrapped wire form, sent via SCSI Security Protocol Out 0xEF.
    pub fn serialize_satl(&self) -> SatlPasswordPage {
        let mut page = [0u8; 512];
        page[0] = (self.enhanced_erase as u8) | ((self.zac_erase_full_zones as u8) << 2);
        page[1] = self.maximum_security as u8;
        page[2..34].copy_from_slice(&self.password);
        page[34..36].copy_from_slice(&self.master_password_id.to_be_bytes());
        SatlPasswordPage {
            page: WirePasswordPage(page),
            role: self.role,
        }
    }
}
