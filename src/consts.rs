pub const BLOCK_SIZE: usize = 512;
pub const N_BLOCKS: usize = 8;
pub const DIRECT_POINTERS: usize = N_BLOCKS - 1;
pub const INDIRECT_SLOT: usize = N_BLOCKS - 1;
pub const POINTERS_PER_BLOCK: usize = BLOCK_SIZE / std::mem::size_of::<BlockPointer>();

pub const DIRECT_CAPACITY: u64 = (DIRECT_POINTERS * BLOCK_SIZE) as u64;
pub const MAX_FILE_SIZE: u64 = DIRECT_CAPACITY + (POINTERS_PER_BLOCK * BLOCK_SIZE) as u64;

pub const FILE_NAME_LENGTH: usize = 28;
// one byte of the name field always stays a terminator
pub const MAX_NAME_LENGTH: usize = FILE_NAME_LENGTH - 1;

pub const NULL_INODE: InodePointer = 0;
pub const ROOT_INODE: InodePointer = 1;

/// Marks an unallocated direct, indirect or indirect-table slot.
pub const EMPTY_POINTER: BlockPointer = u64::MAX;

/// Inode and data-block counts are rounded up to a multiple of this at format time.
pub const COUNT_ALIGNMENT: u64 = 32;

/// Absolute byte offset of a data block inside the image.
pub type BlockPointer = u64;
pub type InodePointer = u32;
pub type BlockPointers = [BlockPointer; N_BLOCKS];
