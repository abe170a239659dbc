pub trait ByteSerializable {
    fn to_bytes(&self) -> Vec<u8>;
    /// `bytes` must hold at least `size_on_disk()` bytes when the type is also `KnownSize`.
    fn from_bytes(bytes: &[u8]) -> Self;
}

pub trait KnownSize: ByteSerializable {
    fn size_on_disk() -> usize;
}

pub(crate) fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

pub(crate) fn read_u64(bytes: &[u8], at: usize) -> u64 {
    u64::from_le_bytes([
        bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3],
        bytes[at + 4], bytes[at + 5], bytes[at + 6], bytes[at + 7],
    ])
}

pub(crate) fn read_i64(bytes: &[u8], at: usize) -> i64 {
    read_u64(bytes, at) as i64
}
