use log::trace;

use crate::consts::{
    BlockPointer, InodePointer, BLOCK_SIZE, DIRECT_POINTERS, FILE_NAME_LENGTH, MAX_NAME_LENGTH,
};
use crate::driver::DeviceDriver;
use crate::structure::inode::Inode;
use crate::structure::Structure;
use crate::util::error::{Error, Result};
use crate::util::serializable::{read_u32, ByteSerializable, KnownSize};

pub const ENTRY_SIZE: usize = FILE_NAME_LENGTH + 4;
pub const ENTRIES_PER_BLOCK: usize = BLOCK_SIZE / ENTRY_SIZE;
/// Directories only grow into direct blocks.
pub const MAX_ENTRIES: usize = DIRECT_POINTERS * ENTRIES_PER_BLOCK;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    name: [u8; FILE_NAME_LENGTH],
    pub num: InodePointer,
}

impl DirectoryEntry {
    pub fn new(name: &str, num: InodePointer) -> Result<DirectoryEntry> {
        validate_name(name)?;
        let mut field = [0u8; FILE_NAME_LENGTH];
        field[..name.len()].copy_from_slice(name.as_bytes());
        Ok(DirectoryEntry { name: field, num })
    }

    pub fn is_free(&self) -> bool {
        self.name[0] == 0
    }

    pub fn name_bytes(&self) -> &[u8] {
        let len = self.name.iter().position(|byte| *byte == 0).unwrap_or(FILE_NAME_LENGTH);
        &self.name[..len]
    }

    pub fn name(&self) -> String {
        String::from_utf8_lossy(self.name_bytes()).into_owned()
    }
}

impl KnownSize for DirectoryEntry {
    fn size_on_disk() -> usize {
        ENTRY_SIZE
    }
}

impl ByteSerializable for DirectoryEntry {
    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(ENTRY_SIZE);
        bytes.extend_from_slice(&self.name);
        bytes.extend_from_slice(&self.num.to_le_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        let mut name = [0u8; FILE_NAME_LENGTH];
        name.copy_from_slice(&bytes[..FILE_NAME_LENGTH]);
        DirectoryEntry { name, num: read_u32(bytes, FILE_NAME_LENGTH) }
    }
}

/// Rejects names that cannot be stored as a directory entry.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidArgument("empty file name"));
    }
    if name == "." || name == ".." {
        return Err(Error::InvalidArgument("reserved file name"));
    }
    if name.contains('/') || name.contains('\0') {
        return Err(Error::InvalidArgument("file name contains '/' or NUL"));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(Error::NameTooLong);
    }
    Ok(())
}


fn entry_offset(block: BlockPointer, index: usize) -> u64 {
    block + (index * ENTRY_SIZE) as u64
}

impl<D: DeviceDriver> Structure<D> {
    /// The live entry in `slot`, counting across the directory's direct blocks.
    /// `None` for free slots and unallocated blocks.
    pub fn read_slot(&self, directory: &Inode, slot: usize) -> Result<Option<DirectoryEntry>> {
        let (block_index, index) = (slot / ENTRIES_PER_BLOCK, slot % ENTRIES_PER_BLOCK);
        if block_index >= DIRECT_POINTERS {
            return Ok(None);
        }
        let block = match self.resolve_for_read(directory, block_index)? {
            Some(block) => block,
            None => return Ok(None),
        };
        let entry = DirectoryEntry::from_bytes(self.io.read(entry_offset(block, index), ENTRY_SIZE)?);
        Ok((!entry.is_free()).then_some(entry))
    }

    fn directory_blocks(&self, directory: &Inode) -> Result<Vec<BlockPointer>> {
        let mut blocks = Vec::with_capacity(DIRECT_POINTERS);
        for block_index in 0..DIRECT_POINTERS {
            if let Some(block) = self.resolve_for_read(directory, block_index)? {
                blocks.push(block);
            }
        }
        Ok(blocks)
    }

    fn locate_entry(&self, directory: &Inode, name: &str) -> Result<Option<(u64, DirectoryEntry)>> {
        for block in self.directory_blocks(directory)? {
            for index in 0..ENTRIES_PER_BLOCK {
                let offset = entry_offset(block, index);
                let entry = DirectoryEntry::from_bytes(self.io.read(offset, ENTRY_SIZE)?);
                if !entry.is_free() && entry.name_bytes() == name.as_bytes() {
                    return Ok(Some((offset, entry)));
                }
            }
        }
        Ok(None)
    }

    pub fn find_entry(&self, directory: &Inode, name: &str) -> Result<Option<DirectoryEntry>> {
        trace!("lookup of {:?} in inode {}", name, directory.num);
        #[cfg(test)]
        lookups::record();
        Ok(self.locate_entry(directory, name)?.map(|(_, entry)| entry))
    }

    /// Stores `name -> num` in the first free slot, growing the directory by
    /// one block when every allocated block is full. Uniqueness of `name` is
    /// the caller's concern. Size changes land in `directory`.
    pub fn insert_entry(&mut self, directory: &mut Inode, name: &str, num: InodePointer) -> Result<()> {
        let entry = DirectoryEntry::new(name, num)?;

        for block in self.directory_blocks(directory)? {
            for index in 0..ENTRIES_PER_BLOCK {
                let offset = entry_offset(block, index);
                if self.io.read(offset, 1)?[0] == 0 {
                    return self.io.write(offset, &entry.to_bytes());
                }
            }
        }

        let mut unused = None;
        for block_index in 0..DIRECT_POINTERS {
            if self.resolve_for_read(directory, block_index)?.is_none() {
                unused = Some(block_index);
                break;
            }
        }
        let block = self.resolve_for_write(directory, unused.ok_or(Error::OutOfSpace)?)?;
        directory.size += BLOCK_SIZE as u64;
        trace!("directory {} grew to {} bytes", directory.num, directory.size);
        self.io.write(entry_offset(block, 0), &entry.to_bytes())
    }

    /// Frees the slot holding `name`. The block stays with the directory.
    pub fn remove_entry(&mut self, directory: &Inode, name: &str) -> Result<DirectoryEntry> {
        let (offset, entry) = self.locate_entry(directory, name)?.ok_or(Error::NotFound)?;
        self.io.fill(offset, FILE_NAME_LENGTH, 0)?;
        Ok(entry)
    }

    pub fn is_empty_directory(&self, directory: &Inode) -> Result<bool> {
        for slot in 0..MAX_ENTRIES {
            if self.read_slot(directory, slot)?.is_some() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
