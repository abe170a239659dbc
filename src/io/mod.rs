use crate::consts::{BlockPointer, BLOCK_SIZE};
use crate::driver::DeviceDriver;
use crate::util::error::{Error, Result};
use crate::util::serializable::read_u64;

/// Bounds-checked access to the image. Every offset is absolute from the start
/// of the region; nothing outside this type indexes the raw bytes.
pub struct IO<D: DeviceDriver> {
    pub(crate) device: D,
    size: u64,
}

impl<D: DeviceDriver> IO<D> {
    pub fn new(device: D) -> IO<D> {
        let size = device.get_size();
        IO { device, size }
    }

    pub fn get_size(&self) -> u64 {
        self.size
    }

    fn check(&self, offset: u64, len: usize) -> Result<std::ops::Range<usize>> {
        match offset.checked_add(len as u64) {
            Some(end) if end <= self.size => Ok(offset as usize..end as usize),
            _ => Err(Error::Corrupted(format!(
                "access of {} bytes at offset {} outside image of {} bytes",
                len, offset, self.size
            ))),
        }
    }

    pub fn read(&self, offset: u64, len: usize) -> Result<&[u8]> {
        let range = self.check(offset, len)?;
        Ok(&self.device.as_bytes()[range])
    }

    pub fn read_mut(&mut self, offset: u64, len: usize) -> Result<&mut [u8]> {
        let range = self.check(offset, len)?;
        Ok(&mut self.device.as_bytes_mut()[range])
    }

    pub fn write(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        self.read_mut(offset, data.len())?.copy_from_slice(data);
        Ok(())
    }

    pub fn read_u64(&self, offset: u64) -> Result<u64> {
        Ok(read_u64(self.read(offset, 8)?, 0))
    }

    pub fn write_u64(&mut self, offset: u64, value: u64) -> Result<()> {
        self.write(offset, &value.to_le_bytes())
    }

    pub fn read_block(&self, pointer: BlockPointer) -> Result<&[u8]> {
        self.read(pointer, BLOCK_SIZE)
    }

    pub fn fill(&mut self, offset: u64, len: usize, value: u8) -> Result<()> {
        self.read_mut(offset, len)?.fill(value);
        Ok(())
    }

    pub fn zero_block(&mut self, pointer: BlockPointer) -> Result<()> {
        self.fill(pointer, BLOCK_SIZE, 0)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.device.flush()?;
        Ok(())
    }
}
