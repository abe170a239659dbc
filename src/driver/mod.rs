pub mod file_drive;
pub mod memory_drive;

/// A fixed-size byte region holding one filesystem image.
pub trait DeviceDriver {
    fn as_bytes(&self) -> &[u8];
    fn as_bytes_mut(&mut self) -> &mut [u8];

    fn get_size(&self) -> u64 {
        self.as_bytes().len() as u64
    }

    /// Pushes pending writes to the backing medium, if there is one.
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
