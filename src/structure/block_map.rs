//! Translation of (inode, logical block) into data-block offsets. Nothing else
//! in the crate reads an inode's pointer slots or indirect blocks directly.

use crate::consts::{
    BlockPointer, BLOCK_SIZE, DIRECT_POINTERS, EMPTY_POINTER, INDIRECT_SLOT, MAX_FILE_SIZE,
    POINTERS_PER_BLOCK,
};
use crate::driver::DeviceDriver;
use crate::structure::inode::Inode;
use crate::structure::Structure;
use crate::util::error::{Error, Result};

/// Splits a byte offset into its logical block index and the offset inside that block.
pub fn byte_to_block(offset: u64) -> (usize, usize) {
    ((offset / BLOCK_SIZE as u64) as usize, (offset % BLOCK_SIZE as u64) as usize)
}

/// Number of logical blocks an inode can address.
pub const MAX_BLOCKS: usize = (MAX_FILE_SIZE / BLOCK_SIZE as u64) as usize;

fn indirect_entry(indirect: BlockPointer, index: usize) -> u64 {
    indirect + (index * std::mem::size_of::<BlockPointer>()) as u64
}

impl<D: DeviceDriver> Structure<D> {
    /// Data block backing `block_index`, or `None` for a hole. Never allocates.
    pub fn resolve_for_read(&self, inode: &Inode, block_index: usize) -> Result<Option<BlockPointer>> {
        if block_index < DIRECT_POINTERS {
            return self.checked(inode.pointer(block_index));
        }
        if block_index >= MAX_BLOCKS {
            return Ok(None);
        }

        let indirect = match self.checked(inode.pointer(INDIRECT_SLOT))? {
            Some(indirect) => indirect,
            None => return Ok(None),
        };
        self.checked(self.io.read_u64(indirect_entry(indirect, block_index - DIRECT_POINTERS))?)
    }

    /// Data block backing `block_index`, allocating it (and the indirect block
    /// on first use) when the slot is empty. Pointer changes land in `inode`
    /// and must be written back by the caller.
    pub fn resolve_for_write(&mut self, inode: &mut Inode, block_index: usize) -> Result<BlockPointer> {
        if block_index < DIRECT_POINTERS {
            if let Some(existing) = self.checked(inode.pointer(block_index))? {
                return Ok(existing);
            }
            let pointer = self.allocate_block()?;
            inode.set_pointer(block_index, pointer);
            return Ok(pointer);
        }
        if block_index >= MAX_BLOCKS {
            return Err(Error::OutOfSpace);
        }

        let indirect = match self.checked(inode.pointer(INDIRECT_SLOT))? {
            Some(indirect) => indirect,
            None => {
                let indirect = self.allocate_block()?;
                self.io.fill(indirect, BLOCK_SIZE, 0xff)?;
                inode.set_pointer(INDIRECT_SLOT, indirect);
                indirect
            }
        };

        let entry = indirect_entry(indirect, block_index - DIRECT_POINTERS);
        if let Some(existing) = self.checked(self.io.read_u64(entry)?)? {
            return Ok(existing);
        }
        let pointer = self.allocate_block()?;
        self.io.write_u64(entry, pointer)?;
        Ok(pointer)
    }

    /// Every data block holding file or directory content, in logical order.
    /// The indirect block itself is not included.
    pub fn data_blocks(&self, inode: &Inode) -> Result<Vec<BlockPointer>> {
        let mut blocks = Vec::new();
        for slot in 0..DIRECT_POINTERS {
            blocks.extend(self.checked(inode.pointer(slot))?);
        }

        if let Some(indirect) = self.checked(inode.pointer(INDIRECT_SLOT))? {
            for index in 0..POINTERS_PER_BLOCK {
                blocks.extend(self.checked(self.io.read_u64(indirect_entry(indirect, index))?)?);
            }
        }
        Ok(blocks)
    }

    /// Data blocks plus the indirect block, if one is allocated.
    pub fn owned_blocks(&self, inode: &Inode) -> Result<Vec<BlockPointer>> {
        let mut blocks = self.data_blocks(inode)?;
        blocks.extend(self.checked(inode.pointer(INDIRECT_SLOT))?);
        Ok(blocks)
    }

    /// Returns every block the inode owns to the data bitmap. The inode's own
    /// slots are left untouched.
    pub(crate) fn release_blocks(&mut self, inode: &Inode) -> Result<()> {
        for pointer in self.owned_blocks(inode)? {
            self.free_block(pointer)?;
        }
        Ok(())
    }

    /// `None` for the empty marker; anything else must name a data block.
    fn checked(&self, pointer: BlockPointer) -> Result<Option<BlockPointer>> {
        if pointer == EMPTY_POINTER {
            return Ok(None);
        }
        self.block_index(pointer)?;
        Ok(Some(pointer))
    }
}
