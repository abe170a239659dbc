use std::fs::{File, OpenOptions};
use std::path::Path;

use log::debug;
use memmap2::MmapMut;

use crate::driver::DeviceDriver;

/// An image file mapped read/write into memory. Writes land in the page cache
/// immediately; `flush` forces them to disk.
pub struct FileDrive {
    _file: File,
    map: MmapMut,
}

impl FileDrive {
    pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<FileDrive> {
        let file = OpenOptions::new().read(true).write(true).open(path.as_ref())?;
        debug!("mapping image {}", path.as_ref().display());
        FileDrive::map(file)
    }

    /// Creates (or truncates) `path` to `size` zero bytes and maps it.
    pub fn create<P: AsRef<Path>>(path: P, size: u64) -> std::io::Result<FileDrive> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.as_ref())?;
        file.set_len(size)?;
        debug!("created image {} ({} bytes)", path.as_ref().display(), size);
        FileDrive::map(file)
    }

    fn map(file: File) -> std::io::Result<FileDrive> {
        // the file must not be resized or written by anyone else while mapped
        let map = unsafe { MmapMut::map_mut(&file)? };
        Ok(FileDrive { _file: file, map })
    }
}

impl DeviceDriver for FileDrive {
    fn as_bytes(&self) -> &[u8] {
        &self.map
    }

    fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.map
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.map.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_write_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drive.img");

        {
            let mut drive = FileDrive::create(&path, 4096).unwrap();
            assert_eq!(drive.get_size(), 4096);
            drive.as_bytes_mut()[100..104].copy_from_slice(&[1, 2, 3, 4]);
            drive.flush().unwrap();
        }

        let drive = FileDrive::open(&path).unwrap();
        assert_eq!(&drive.as_bytes()[100..104], &[1, 2, 3, 4]);
        assert_eq!(drive.as_bytes()[0], 0);
    }

    #[test]
    fn open_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileDrive::open(dir.path().join("missing.img")).is_err());
    }
}
