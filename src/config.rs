use crate::consts::COUNT_ALIGNMENT;
use crate::structure::superblock::SuperBlock;

/// Geometry requested when formatting an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    pub inode_count: u64,
    pub block_count: u64,
}

impl FormatOptions {
    /// Both counts are rounded up to the next multiple of 32.
    pub fn new(inode_count: u64, block_count: u64) -> FormatOptions {
        FormatOptions {
            inode_count: round_up(inode_count),
            block_count: round_up(block_count),
        }
    }

    /// Bytes the image must hold for this geometry.
    pub fn required_size(&self) -> u64 {
        SuperBlock::layout(self.inode_count, self.block_count).end()
    }
}

fn round_up(count: u64) -> u64 {
    count.div_ceil(COUNT_ALIGNMENT) * COUNT_ALIGNMENT
}

pub type UserId = u32;
pub type GroupId = u32;

/// Owner recorded on every inode a mount creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credentials {
    pub uid: UserId,
    pub gid: GroupId,
}

impl Credentials {
    pub fn new(uid: UserId, gid: GroupId) -> Credentials {
        Credentials { uid, gid }
    }

    pub fn root() -> Credentials {
        Credentials { uid: 0, gid: 0 }
    }

    /// The identity of the calling process.
    pub fn current() -> Credentials {
        let (uid, gid) = unsafe { (libc::getuid(), libc::getgid()) };
        Credentials { uid, gid }
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Credentials::current()
    }
}
