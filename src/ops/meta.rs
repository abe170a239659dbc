use std::time::SystemTime;

use crate::config::{GroupId, UserId};
use crate::consts::{InodePointer, BLOCK_SIZE, MAX_NAME_LENGTH};
use crate::driver::DeviceDriver;
use crate::structure::inode::{to_system_time, Inode};
use crate::structure::Structure;
use crate::util::error::Result;
use crate::util::mode::{ModeBits, ModeBitsHelper};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InodeType {
    File,
    Directory,
}

/// Everything `getattr` reports about one inode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    pub ino: InodePointer,
    pub kind: InodeType,
    pub mode: ModeBits,
    pub perm: u16,
    pub uid: UserId,
    pub gid: GroupId,
    pub size: u64,
    pub nlinks: u32,
    pub atime: SystemTime,
    pub mtime: SystemTime,
    pub ctime: SystemTime,
    /// Data blocks referenced through the direct and indirect pointers.
    pub blocks: u64,
    pub blksize: u32,
}

impl FileStat {
    pub fn from_inode(inode: &Inode, blocks: u64) -> FileStat {
        FileStat {
            ino: inode.num,
            kind: if inode.is_directory() { InodeType::Directory } else { InodeType::File },
            mode: inode.mode,
            perm: inode.mode.get_permissions(),
            uid: inode.uid,
            gid: inode.gid,
            size: inode.size,
            nlinks: inode.nlinks,
            atime: to_system_time(inode.atime),
            mtime: to_system_time(inode.mtime),
            ctime: to_system_time(inode.ctime),
            blocks,
            blksize: BLOCK_SIZE as u32,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.kind == InodeType::Directory
    }
}

/// Capacity figures for `statfs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsStats {
    pub block_size: u32,
    pub blocks: u64,
    pub free_blocks: u64,
    pub inodes: u64,
    pub free_inodes: u64,
    pub name_max: u32,
}

impl<D: DeviceDriver> Structure<D> {
    pub fn stat_inode(&self, inode: &Inode) -> Result<FileStat> {
        let blocks = self.data_blocks(inode)?.len() as u64;
        Ok(FileStat::from_inode(inode, blocks))
    }

    pub fn stats(&self) -> Result<FsStats> {
        let used_blocks = self.block_map.count_used(&self.io)?;
        let used_inodes = self.inode_map.count_used(&self.io)?;
        Ok(FsStats {
            block_size: BLOCK_SIZE as u32,
            blocks: self.block_map.capacity(),
            free_blocks: self.block_map.capacity() - used_blocks,
            inodes: self.inode_map.capacity(),
            free_inodes: self.inode_map.capacity() - used_inodes,
            name_max: MAX_NAME_LENGTH as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::mode::{directory_mode, file_mode};

    #[test]
    fn stat_from_inode() {
        let mut inode = Inode::new(9, file_mode(0o640), 1000, 50);
        inode.size = 1234;
        inode.nlinks = 1;
        inode.mtime = 100;

        let stat = FileStat::from_inode(&inode, 3);
        assert_eq!(stat.ino, 9);
        assert_eq!(stat.kind, InodeType::File);
        assert_eq!(stat.perm, 0o640);
        assert_eq!((stat.uid, stat.gid), (1000, 50));
        assert_eq!(stat.size, 1234);
        assert_eq!(stat.blocks, 3);
        assert_eq!(stat.blksize, 512);
        assert_eq!(stat.mtime, to_system_time(100));
        assert!(!stat.is_directory());

        let directory = Inode::new(1, directory_mode(0o755), 0, 0);
        assert!(FileStat::from_inode(&directory, 0).is_directory());
    }
}
