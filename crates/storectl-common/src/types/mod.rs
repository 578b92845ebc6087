/// Endianness marker types and the runtime `EndianType` enum.
pub mod endian;
/// Mixed-endian GUIDs (GPT disk/type/partition identifiers).
pub mod guid;
/// Endian-tagged fixed-width integers (`U16`, `U32`, `U64`, `Lba48`).
pub mod number;
