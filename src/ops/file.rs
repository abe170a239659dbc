use std::cmp::min;

use log::warn;

use crate::consts::{BLOCK_SIZE, MAX_FILE_SIZE};
use crate::driver::DeviceDriver;
use crate::ops::BlockFS;
use crate::structure::block_map::byte_to_block;
use crate::structure::inode::Inode;
use crate::structure::Structure;
use crate::util::error::{Error, Result};

impl<D: DeviceDriver> Structure<D> {
    /// Copies file content into `buffer`. Holes read as zeros; nothing past
    /// `inode.size` is produced.
    pub fn read_data(&self, inode: &Inode, offset: u64, buffer: &mut [u8]) -> Result<usize> {
        if offset >= inode.size {
            return Ok(0);
        }
        let len = min(buffer.len() as u64, inode.size - offset) as usize;

        let mut done = 0;
        while done < len {
            let (block_index, intra) = byte_to_block(offset + done as u64);
            let chunk = min(BLOCK_SIZE - intra, len - done);
            let target = &mut buffer[done..done + chunk];
            match self.resolve_for_read(inode, block_index)? {
                Some(block) => target.copy_from_slice(&self.io.read_block(block)?[intra..intra + chunk]),
                None => target.fill(0),
            }
            done += chunk;
        }
        Ok(len)
    }

    /// Copies `data` into the file, allocating blocks as needed. `inode.size`
    /// grows with every chunk that lands, so a failure part way leaves it
    /// covering exactly the bytes written.
    pub fn write_data(&mut self, inode: &mut Inode, offset: u64, data: &[u8]) -> Result<()> {
        let mut done = 0;
        while done < data.len() {
            let (block_index, intra) = byte_to_block(offset + done as u64);
            let chunk = min(BLOCK_SIZE - intra, data.len() - done);
            let block = self.resolve_for_write(inode, block_index)?;
            self.io.write(block + intra as u64, &data[done..done + chunk])?;
            done += chunk;
            inode.size = inode.size.max(offset + done as u64);
        }
        Ok(())
    }
}

impl<D: DeviceDriver> BlockFS<D> {
    /// Reads up to `buffer.len()` bytes at `offset`, returning how many were
    /// produced. Short only at end of file.
    pub fn read(&self, path: &str, offset: u64, buffer: &mut [u8]) -> Result<usize> {
        let inode = self.structure.resolve(path)?.inode;
        if inode.is_directory() {
            return Err(Error::IsADirectory);
        }
        self.structure.read_data(&inode, offset, buffer)
    }

    /// Writes all of `data` at `offset` or fails. Bytes written before an
    /// allocation failure stay in place.
    pub fn write(&mut self, path: &str, offset: u64, data: &[u8]) -> Result<usize> {
        let mut inode = self.structure.resolve(path)?.inode;
        if inode.is_directory() {
            return Err(Error::IsADirectory);
        }
        if data.is_empty() {
            return Ok(0);
        }
        let fits = offset
            .checked_add(data.len() as u64)
            .is_some_and(|end| end <= MAX_FILE_SIZE);
        if !fits {
            return Err(Error::OutOfSpace);
        }

        let result = self.structure.write_data(&mut inode, offset, data);
        inode.touch_modified();
        self.structure.write_inode(&inode)?;

        if let Err(err) = result {
            warn!("write to {} stopped at size {}: {}", path, inode.size, err);
            return Err(err);
        }
        Ok(data.len())
    }
}
