use log::trace;

use crate::driver::DeviceDriver;
use crate::io::IO;
use crate::util::error::{Error, Result};

/// A free list stored in the image: bit `i % 8` of byte `i / 8` is set while
/// resource `i` is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bitmap {
    name: &'static str,
    start: u64,
    capacity: u64,
}

impl Bitmap {
    pub fn new(name: &'static str, start: u64, capacity: u64) -> Bitmap {
        Bitmap { name, start, capacity }
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Marks and returns the lowest free index.
    pub fn allocate<D: DeviceDriver>(&self, io: &mut IO<D>) -> Result<u64> {
        let map = io.read(self.start, self.byte_len())?;
        let found = map.iter().enumerate().find_map(|(byte_index, byte)| {
            (*byte != 0xff).then(|| byte_index as u64 * 8 + byte.trailing_ones() as u64)
        });

        match found {
            Some(index) if index < self.capacity => {
                self.mark_used(io, index)?;
                trace!("{} bitmap: allocated {}", self.name, index);
                Ok(index)
            }
            _ => {
                trace!("{} bitmap: exhausted at {} entries", self.name, self.capacity);
                Err(Error::OutOfSpace)
            }
        }
    }

    /// Clears `index`. Freeing an index that is already free is not detected.
    pub fn free<D: DeviceDriver>(&self, io: &mut IO<D>, index: u64) -> Result<()> {
        debug_assert!(index < self.capacity, "{} bitmap: free of {} out of range", self.name, index);
        self.mark_free(io, index)?;
        trace!("{} bitmap: freed {}", self.name, index);
        Ok(())
    }

    pub fn is_used<D: DeviceDriver>(&self, io: &IO<D>, index: u64) -> Result<bool> {
        let byte = io.read(self.start + index / 8, 1)?[0];
        Ok(byte & (1 << (index % 8)) != 0)
    }

    pub fn count_used<D: DeviceDriver>(&self, io: &IO<D>) -> Result<u64> {
        let map = io.read(self.start, self.byte_len())?;
        Ok(map.iter().map(|byte| byte.count_ones() as u64).sum())
    }

    pub(crate) fn mark_used<D: DeviceDriver>(&self, io: &mut IO<D>, index: u64) -> Result<()> {
        let byte = &mut io.read_mut(self.start + index / 8, 1)?[0];
        *byte |= 1 << (index % 8);
        Ok(())
    }

    fn mark_free<D: DeviceDriver>(&self, io: &mut IO<D>, index: u64) -> Result<()> {
        let byte = &mut io.read_mut(self.start + index / 8, 1)?[0];
        *byte &= !(1 << (index % 8));
        Ok(())
    }

    /// Zeroes the whole map.
    pub(crate) fn clear<D: DeviceDriver>(&self, io: &mut IO<D>) -> Result<()> {
        io.fill(self.start, self.byte_len(), 0)
    }

    fn byte_len(&self) -> usize {
        self.capacity.div_ceil(8) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::memory_drive::MemoryDrive;

    fn bitmap() -> (Bitmap, IO<MemoryDrive>) {
        (Bitmap::new("test", 16, 32), IO::new(MemoryDrive::new(64)))
    }

    #[test]
    fn allocate_lowest_first() {
        let (map, mut io) = bitmap();
        assert_eq!(map.allocate(&mut io).unwrap(), 0);
        assert_eq!(map.allocate(&mut io).unwrap(), 1);
        assert!(map.is_used(&io, 1).unwrap());
        assert!(!map.is_used(&io, 2).unwrap());
        assert_eq!(io.read(16, 1).unwrap()[0], 0b11);
        // nothing outside the map is touched
        assert_eq!(io.read(15, 1).unwrap()[0], 0);
        assert_eq!(io.read(20, 1).unwrap()[0], 0);
    }

    #[test]
    fn exhaustion_and_reuse() {
        let (map, mut io) = bitmap();
        for expected in 0..32 {
            assert_eq!(map.allocate(&mut io).unwrap(), expected);
        }
        assert!(matches!(map.allocate(&mut io), Err(Error::OutOfSpace)));
        assert_eq!(map.count_used(&io).unwrap(), 32);

        map.free(&mut io, 13).unwrap();
        assert!(!map.is_used(&io, 13).unwrap());
        assert_eq!(map.allocate(&mut io).unwrap(), 13);

        map.free(&mut io, 30).unwrap();
        map.free(&mut io, 7).unwrap();
        assert_eq!(map.allocate(&mut io).unwrap(), 7);
        assert_eq!(map.allocate(&mut io).unwrap(), 30);
    }

    #[test]
    fn clear_resets() {
        let (map, mut io) = bitmap();
        map.mark_used(&mut io, 5).unwrap();
        map.clear(&mut io).unwrap();
        assert_eq!(map.count_used(&io).unwrap(), 0);
    }
}
