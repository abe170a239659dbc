use crate::consts::{BLOCK_SIZE, COUNT_ALIGNMENT};
use crate::driver::DeviceDriver;
use crate::io::IO;
use crate::util::error::{Error, Result};
use crate::util::serializable::{read_u64, ByteSerializable, KnownSize};

/// Region layout of an image. Written once at format time and only read after.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SuperBlock {
    pub inode_count: u64,
    pub block_count: u64,
    pub inode_bitmap: u64,
    pub data_bitmap: u64,
    pub inode_table: u64,
    pub data_blocks: u64,
}

impl SuperBlock {
    /// Computes the offset chain for the given (already rounded) counts.
    pub fn layout(inode_count: u64, block_count: u64) -> SuperBlock {
        let inode_bitmap = SuperBlock::size_on_disk() as u64;
        let data_bitmap = inode_bitmap + inode_count / 8;
        let inode_table = data_bitmap + block_count / 8;
        let data_blocks = inode_table + inode_count * BLOCK_SIZE as u64;
        SuperBlock { inode_count, block_count, inode_bitmap, data_bitmap, inode_table, data_blocks }
    }

    /// First byte past the data-block region.
    pub fn end(&self) -> u64 {
        self.data_blocks + self.block_count * BLOCK_SIZE as u64
    }

    pub fn read<D: DeviceDriver>(io: &IO<D>) -> Result<SuperBlock> {
        let superblock = SuperBlock::from_bytes(io.read(0, SuperBlock::size_on_disk())?);
        superblock.validate(io.get_size())?;
        Ok(superblock)
    }

    pub fn write<D: DeviceDriver>(&self, io: &mut IO<D>) -> Result<()> {
        io.write(0, &self.to_bytes())
    }

    fn validate(&self, image_size: u64) -> Result<()> {
        if self.inode_count == 0 || self.block_count == 0 {
            return Err(Error::Corrupted("superblock has an empty inode or block region".to_string()));
        }
        if self.inode_count % COUNT_ALIGNMENT != 0 || self.block_count % COUNT_ALIGNMENT != 0 {
            return Err(Error::Corrupted(format!(
                "counts {}/{} are not multiples of {}",
                self.inode_count, self.block_count, COUNT_ALIGNMENT
            )));
        }
        // guards the multiplications in layout() against garbage counts
        if self.inode_count > image_size || self.block_count > image_size {
            return Err(Error::Corrupted("superblock counts exceed the image".to_string()));
        }
        if *self != SuperBlock::layout(self.inode_count, self.block_count) {
            return Err(Error::Corrupted(format!("inconsistent region offsets: {:?}", self)));
        }
        if self.end() > image_size {
            return Err(Error::Corrupted(format!(
                "layout needs {} bytes but the image holds {}",
                self.end(),
                image_size
            )));
        }
        Ok(())
    }
}

impl KnownSize for SuperBlock {
    fn size_on_disk() -> usize {
        6 * 8
    }
}

impl ByteSerializable for SuperBlock {
    fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(SuperBlock::size_on_disk());
        buffer.extend_from_slice(&self.inode_count.to_le_bytes());
        buffer.extend_from_slice(&self.block_count.to_le_bytes());
        buffer.extend_from_slice(&self.inode_bitmap.to_le_bytes());
        buffer.extend_from_slice(&self.data_bitmap.to_le_bytes());
        buffer.extend_from_slice(&self.inode_table.to_le_bytes());
        buffer.extend_from_slice(&self.data_blocks.to_le_bytes());
        buffer
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        SuperBlock {
            inode_count: read_u64(bytes, 0),
            block_count: read_u64(bytes, 8),
            inode_bitmap: read_u64(bytes, 16),
            data_bitmap: read_u64(bytes, 24),
            inode_table: read_u64(bytes, 32),
            data_blocks: read_u64(bytes, 40),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::memory_drive::MemoryDrive;

    #[test]
    fn layout_chain() {
        let superblock = SuperBlock::layout(64, 96);
        assert_eq!(superblock.inode_bitmap, 48);
        assert_eq!(superblock.data_bitmap, 48 + 8);
        assert_eq!(superblock.inode_table, 48 + 8 + 12);
        assert_eq!(superblock.data_blocks, 68 + 64 * 512);
        assert_eq!(superblock.end(), 68 + 64 * 512 + 96 * 512);
    }

    #[test]
    fn read_write_superblock() {
        let superblock = SuperBlock::layout(32, 32);
        let mut io = IO::new(MemoryDrive::new(superblock.end() as usize));
        superblock.write(&mut io).unwrap();
        assert_eq!(SuperBlock::read(&io).unwrap(), superblock);
    }

    #[test]
    fn field_order_on_disk() {
        let bytes = SuperBlock::layout(32, 64).to_bytes();
        assert_eq!(bytes.len(), 48);
        assert_eq!(&bytes[0..8], &32u64.to_le_bytes());
        assert_eq!(&bytes[8..16], &64u64.to_le_bytes());
        assert_eq!(&bytes[16..24], &48u64.to_le_bytes());
    }

    #[test]
    fn rejects_garbage() {
        let superblock = SuperBlock::layout(32, 32);

        let mut io = IO::new(MemoryDrive::new(superblock.end() as usize));
        assert!(matches!(SuperBlock::read(&io), Err(Error::Corrupted(_))));

        let mut shifted = superblock;
        shifted.data_blocks += 512;
        shifted.write(&mut io).unwrap();
        assert!(matches!(SuperBlock::read(&io), Err(Error::Corrupted(_))));

        let mut small = IO::new(MemoryDrive::new(superblock.end() as usize - 1));
        superblock.write(&mut small).unwrap();
        assert!(matches!(SuperBlock::read(&small), Err(Error::Corrupted(_))));
    }
}
