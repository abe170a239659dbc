use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::config::{GroupId, UserId};
use crate::consts::{BlockPointer, BlockPointers, InodePointer, EMPTY_POINTER, N_BLOCKS};
use crate::util::mode::{ModeBits, ModeBitsHelper};
use crate::util::serializable::{read_i64, read_u32, read_u64, ByteSerializable, KnownSize};

pub type Timestamp = i64;

const POINTERS_OFFSET: usize = 56;

/// In-memory copy of one inode record. Changes reach the image only through
/// `InodeTable::write_inode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inode {
    pub num: InodePointer,
    pub mode: ModeBits,
    pub uid: UserId,
    pub gid: GroupId,
    pub size: u64,
    pub nlinks: u32,
    pub atime: Timestamp,
    pub mtime: Timestamp,
    pub ctime: Timestamp,
    pub(crate) pointers: BlockPointers,
}

impl Inode {
    pub fn new(num: InodePointer, mode: ModeBits, uid: UserId, gid: GroupId) -> Inode {
        let now = now();
        Inode {
            num,
            mode,
            uid,
            gid,
            size: 0,
            nlinks: 0,
            atime: now,
            mtime: now,
            ctime: now,
            pointers: [EMPTY_POINTER; N_BLOCKS],
        }
    }

    pub fn is_directory(&self) -> bool {
        self.mode.is_directory()
    }

    pub fn pointer(&self, slot: usize) -> BlockPointer {
        self.pointers[slot]
    }

    pub(crate) fn set_pointer(&mut self, slot: usize, pointer: BlockPointer) {
        self.pointers[slot] = pointer;
    }

    pub fn touch_modified(&mut self) {
        let now = now();
        self.mtime = now;
        self.ctime = now;
    }
}

pub fn now() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|since| since.as_secs() as Timestamp)
        .unwrap_or(0)
}

pub fn to_system_time(timestamp: Timestamp) -> SystemTime {
    if timestamp >= 0 {
        UNIX_EPOCH + Duration::from_secs(timestamp as u64)
    } else {
        UNIX_EPOCH - Duration::from_secs(timestamp.unsigned_abs())
    }
}

impl KnownSize for Inode {
    fn size_on_disk() -> usize {
        POINTERS_OFFSET + N_BLOCKS * 8
    }
}

impl ByteSerializable for Inode {
    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Inode::size_on_disk());
        bytes.extend_from_slice(&self.num.to_le_bytes());
        bytes.extend_from_slice(&self.mode.to_le_bytes());
        bytes.extend_from_slice(&self.uid.to_le_bytes());
        bytes.extend_from_slice(&self.gid.to_le_bytes());
        bytes.extend_from_slice(&self.size.to_le_bytes());
        bytes.extend_from_slice(&self.nlinks.to_le_bytes());
        bytes.extend_from_slice(&[0; 4]);
        bytes.extend_from_slice(&self.atime.to_le_bytes());
        bytes.extend_from_slice(&self.mtime.to_le_bytes());
        bytes.extend_from_slice(&self.ctime.to_le_bytes());
        for pointer in self.pointers {
            bytes.extend_from_slice(&pointer.to_le_bytes());
        }
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        let mut pointers = [EMPTY_POINTER; N_BLOCKS];
        for (i, pointer) in pointers.iter_mut().enumerate() {
            *pointer = read_u64(bytes, POINTERS_OFFSET + i * 8);
        }

        Inode {
            num: read_u32(bytes, 0),
            mode: read_u32(bytes, 4),
            uid: read_u32(bytes, 8),
            gid: read_u32(bytes, 12),
            size: read_u64(bytes, 16),
            nlinks: read_u32(bytes, 24),
            atime: read_i64(bytes, 32),
            mtime: read_i64(bytes, 40),
            ctime: read_i64(bytes, 48),
            pointers,
        }
    }
}
