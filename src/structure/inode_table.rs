use crate::consts::{InodePointer, BLOCK_SIZE};
use crate::driver::DeviceDriver;
use crate::io::IO;
use crate::structure::inode::Inode;
use crate::util::error::{Error, Result};
use crate::util::serializable::{ByteSerializable, KnownSize};

/// The inode array. Each record sits at the start of its own block-sized slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InodeTable {
    table_index: u64,
    inode_count: u64,
}

impl InodeTable {
    pub fn new(table_index: u64, inode_count: u64) -> InodeTable {
        InodeTable { table_index, inode_count }
    }

    pub fn read_inode<D: DeviceDriver>(&self, io: &IO<D>, num: InodePointer) -> Result<Inode> {
        let offset = self.inode_offset(num)?;
        let inode = Inode::from_bytes(io.read(offset, Inode::size_on_disk())?);
        if inode.num != num {
            return Err(Error::Corrupted(format!("inode slot {} holds inode {}", num, inode.num)));
        }
        Ok(inode)
    }

    pub fn write_inode<D: DeviceDriver>(&self, io: &mut IO<D>, inode: &Inode) -> Result<()> {
        let offset = self.inode_offset(inode.num)?;
        io.write(offset, &inode.to_bytes())
    }

    #[inline]
    fn inode_offset(&self, num: InodePointer) -> Result<u64> {
        if num as u64 >= self.inode_count {
            return Err(Error::Corrupted(format!(
                "inode {} beyond table of {}",
                num, self.inode_count
            )));
        }
        Ok(self.table_index + num as u64 * BLOCK_SIZE as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::memory_drive::MemoryDrive;
    use crate::util::mode::file_mode;

    #[test]
    fn read_write_inode() {
        let mut io = IO::new(MemoryDrive::new(100 + 32 * BLOCK_SIZE));
        let table = InodeTable::new(100, 32);

        let mut memory_inode = Inode::new(5, file_mode(0o644), 1, 2);
        table.write_inode(&mut io, &memory_inode).unwrap();
        assert_eq!(table.read_inode(&io, 5).unwrap(), memory_inode);
        assert_eq!(io.read(100 + 5 * 512, 4).unwrap(), &5u32.to_le_bytes());

        memory_inode.size = 42;
        table.write_inode(&mut io, &memory_inode).unwrap();
        assert_eq!(table.read_inode(&io, 5).unwrap().size, 42);
    }

    #[test]
    fn rejects_foreign_slots() {
        let mut io = IO::new(MemoryDrive::new(100 + 32 * BLOCK_SIZE));
        let table = InodeTable::new(100, 32);

        assert!(matches!(table.read_inode(&io, 32), Err(Error::Corrupted(_))));
        let stray = Inode::new(40, file_mode(0o644), 0, 0);
        assert!(matches!(table.write_inode(&mut io, &stray), Err(Error::Corrupted(_))));

        // slot 3 never written: its number field reads as 0
        assert!(matches!(table.read_inode(&io, 3), Err(Error::Corrupted(_))));
    }
}
