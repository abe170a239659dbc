use crate::driver::DeviceDriver;

pub struct MemoryDrive {
    bytes: Vec<u8>,
}

impl MemoryDrive {
    pub fn new(size: usize) -> MemoryDrive {
        MemoryDrive { bytes: vec![0; size] }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> MemoryDrive {
        MemoryDrive { bytes }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl DeviceDriver for MemoryDrive {
    fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}
