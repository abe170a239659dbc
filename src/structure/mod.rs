use log::{debug, trace};

use crate::config::{Credentials, FormatOptions};
use crate::consts::{BlockPointer, InodePointer, BLOCK_SIZE, COUNT_ALIGNMENT, NULL_INODE, ROOT_INODE};
use crate::driver::DeviceDriver;
use crate::io::IO;
use crate::structure::bitmap::Bitmap;
use crate::structure::inode::Inode;
use crate::structure::inode_table::InodeTable;
use crate::structure::superblock::SuperBlock;
use crate::util::error::{Error, Result};
use crate::util::mode::{directory_mode, ModeBits};

pub mod bitmap;
pub mod block_map;
pub mod directory;
pub mod inode;
pub mod inode_table;
pub mod superblock;

/// A mounted image: the region plus the layout read from its superblock.
pub struct Structure<D: DeviceDriver> {
    pub(crate) io: IO<D>,
    pub(crate) super_block: SuperBlock,
    pub(crate) inode_map: Bitmap,
    pub(crate) block_map: Bitmap,
    pub(crate) inode_table: InodeTable,
}

impl<D: DeviceDriver> Structure<D> {
    /// Lays out an empty filesystem holding only the root directory.
    pub fn format(device: D, options: &FormatOptions) -> Result<Structure<D>> {
        let mut io = IO::new(device);
        if options.inode_count < 2 || options.block_count == 0 {
            return Err(Error::InvalidArgument("format needs at least two inodes and one data block"));
        }
        if options.inode_count % COUNT_ALIGNMENT != 0 || options.block_count % COUNT_ALIGNMENT != 0 {
            return Err(Error::InvalidArgument("inode and block counts must be multiples of 32"));
        }

        let super_block = SuperBlock::layout(options.inode_count, options.block_count);
        if super_block.end() > io.get_size() {
            return Err(Error::InvalidArgument("image is too small for the requested geometry"));
        }
        super_block.write(&mut io)?;

        let mut structure = Structure::from_parts(io, super_block);
        structure.inode_map.clear(&mut structure.io)?;
        structure.block_map.clear(&mut structure.io)?;
        structure.inode_map.mark_used(&mut structure.io, NULL_INODE as u64)?;
        structure.inode_map.mark_used(&mut structure.io, ROOT_INODE as u64)?;

        let mut root = Inode::new(ROOT_INODE, directory_mode(0o755), 0, 0);
        root.nlinks = 2;
        structure.write_inode(&root)?;

        debug!(
            "formatted image: {} inodes, {} data blocks, data region at {}",
            super_block.inode_count, super_block.block_count, super_block.data_blocks
        );
        Ok(structure)
    }

    pub fn mount(device: D) -> Result<Structure<D>> {
        let io = IO::new(device);
        let super_block = SuperBlock::read(&io)?;
        let structure = Structure::from_parts(io, super_block);
        if !structure.inode_map.is_used(&structure.io, ROOT_INODE as u64)? {
            return Err(Error::Corrupted("root inode is not allocated".to_string()));
        }
        structure.read_inode(ROOT_INODE)?;
        Ok(structure)
    }

    fn from_parts(io: IO<D>, super_block: SuperBlock) -> Structure<D> {
        Structure {
            io,
            inode_map: Bitmap::new("inode", super_block.inode_bitmap, super_block.inode_count),
            block_map: Bitmap::new("data", super_block.data_bitmap, super_block.block_count),
            inode_table: InodeTable::new(super_block.inode_table, super_block.inode_count),
            super_block,
        }
    }

    pub fn read_inode(&self, num: InodePointer) -> Result<Inode> {
        self.inode_table.read_inode(&self.io, num)
    }

    pub fn write_inode(&mut self, inode: &Inode) -> Result<()> {
        self.inode_table.write_inode(&mut self.io, inode)
    }

    /// Takes the lowest free inode number and writes a fresh record for it.
    pub fn create_inode(&mut self, mode: ModeBits, owner: Credentials) -> Result<Inode> {
        let num = self.inode_map.allocate(&mut self.io)? as InodePointer;
        let inode = Inode::new(num, mode, owner.uid, owner.gid);
        if let Err(err) = self.write_inode(&inode) {
            self.inode_map.free(&mut self.io, num as u64)?;
            return Err(err);
        }
        Ok(inode)
    }

    /// Frees every block the inode owns, then its number. The record itself
    /// is left in place; `create_inode` rewrites it on reuse.
    pub fn release_inode(&mut self, inode: &Inode) -> Result<()> {
        self.release_blocks(inode)?;
        self.inode_map.free(&mut self.io, inode.num as u64)?;
        trace!("released inode {}", inode.num);
        Ok(())
    }

    /// Allocates a data block and zero-fills it before handing out its offset.
    pub fn allocate_block(&mut self) -> Result<BlockPointer> {
        let index = self.block_map.allocate(&mut self.io)?;
        let pointer = self.super_block.data_blocks + index * BLOCK_SIZE as u64;
        self.io.zero_block(pointer)?;
        Ok(pointer)
    }

    pub fn free_block(&mut self, pointer: BlockPointer) -> Result<()> {
        let index = self.block_index(pointer)?;
        self.block_map.free(&mut self.io, index)
    }

    /// Index of a data block inside the data bitmap.
    pub fn block_index(&self, pointer: BlockPointer) -> Result<u64> {
        let start = self.super_block.data_blocks;
        let relative = pointer.checked_sub(start).filter(|relative| relative % BLOCK_SIZE as u64 == 0);
        match relative.map(|relative| relative / BLOCK_SIZE as u64) {
            Some(index) if index < self.super_block.block_count => Ok(index),
            _ => Err(Error::Corrupted(format!("{} is not a data block pointer", pointer))),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::consts::EMPTY_POINTER;
    use crate::driver::memory_drive::MemoryDrive;
    use crate::util::mode::file_mode;

    pub(crate) fn structure(inodes: u64, blocks: u64) -> Structure<MemoryDrive> {
        let options = FormatOptions::new(inodes, blocks);
        let drive = MemoryDrive::new(options.required_size() as usize);
        Structure::format(drive, &options).unwrap()
    }

    #[test]
    fn format_then_mount() {
        let structure = structure(32, 32);
        assert_eq!(structure.inode_map.count_used(&structure.io).unwrap(), 2);
        assert_eq!(structure.block_map.count_used(&structure.io).unwrap(), 0);

        let root = structure.read_inode(ROOT_INODE).unwrap();
        assert!(root.is_directory());
        assert_eq!((root.uid, root.gid, root.size, root.nlinks), (0, 0, 0, 2));
        assert!(root.pointers.iter().all(|pointer| *pointer == EMPTY_POINTER));

        let super_block = structure.super_block;
        let mounted = Structure::mount(structure.io.device).unwrap();
        assert_eq!(mounted.super_block, super_block);
    }

    #[test]
    fn format_rejects_small_images() {
        let options = FormatOptions::new(32, 32);
        let drive = MemoryDrive::new(options.required_size() as usize - 1);
        assert!(matches!(Structure::format(drive, &options), Err(Error::InvalidArgument(_))));

        let drive = MemoryDrive::new(1 << 20);
        assert!(matches!(
            Structure::format(drive, &FormatOptions::new(0, 32)),
            Err(Error::InvalidArgument(_))
        ));

        let unaligned = FormatOptions { inode_count: 33, block_count: 32 };
        let drive = MemoryDrive::new(1 << 20);
        assert!(matches!(Structure::format(drive, &unaligned), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn mount_rejects_blank_images() {
        assert!(matches!(Structure::mount(MemoryDrive::new(1 << 16)), Err(Error::Corrupted(_))));
    }

    #[test]
    fn mount_requires_an_allocated_root() {
        let mut structure = structure(32, 32);
        structure.inode_map.free(&mut structure.io, ROOT_INODE as u64).unwrap();
        match Structure::mount(structure.io.device) {
            Err(Error::Corrupted(message)) => assert!(message.contains("root")),
            _ => panic!("mount accepted an image without a root inode"),
        }
    }

    #[test]
    fn inode_allocation_reuses_numbers() {
        let mut structure = structure(32, 32);
        let owner = Credentials::new(1000, 1000);

        let first = structure.create_inode(file_mode(0o644), owner).unwrap();
        let second = structure.create_inode(file_mode(0o644), owner).unwrap();
        assert_eq!((first.num, second.num), (2, 3));
        assert_eq!(structure.read_inode(2).unwrap().uid, 1000);

        structure.release_inode(&first).unwrap();
        assert_eq!(structure.create_inode(file_mode(0o600), owner).unwrap().num, 2);

        for _ in 4..32 {
            structure.create_inode(file_mode(0o644), owner).unwrap();
        }
        assert!(matches!(structure.create_inode(file_mode(0o644), owner), Err(Error::OutOfSpace)));
    }

    #[test]
    fn allocated_blocks_are_zeroed() {
        let mut structure = structure(32, 32);
        let pointer = structure.allocate_block().unwrap();
        assert_eq!(pointer, structure.super_block.data_blocks);

        structure.io.write(pointer, &[0xaa; BLOCK_SIZE]).unwrap();
        structure.free_block(pointer).unwrap();
        assert_eq!(structure.allocate_block().unwrap(), pointer);
        assert!(structure.io.read_block(pointer).unwrap().iter().all(|byte| *byte == 0));
    }

    #[test]
    fn block_index_validation() {
        let structure = structure(32, 32);
        let start = structure.super_block.data_blocks;
        assert_eq!(structure.block_index(start + 3 * 512).unwrap(), 3);
        assert!(structure.block_index(start + 1).is_err());
        assert!(structure.block_index(start - 512).is_err());
        assert!(structure.block_index(start + 32 * 512).is_err());
        assert!(structure.block_index(EMPTY_POINTER).is_err());
    }
}
