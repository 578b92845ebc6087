/// Fixed-width UTF-16LE strings (GPT partition names).
pub mod utf16;
