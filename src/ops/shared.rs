use parking_lot::RwLock;

use crate::consts::InodePointer;
use crate::driver::DeviceDriver;
use crate::ops::check::CheckReport;
use crate::ops::directory::DirListing;
use crate::ops::meta::{FileStat, FsStats};
use crate::ops::BlockFS;
use crate::util::error::Result;
use crate::util::mode::ModeBits;

/// A `BlockFS` behind a readers-writer lock. Lookups, reads and listings run
/// side by side; anything that mutates the image holds the lock exclusively
/// for the whole operation.
pub struct SharedFs<D: DeviceDriver> {
    inner: RwLock<BlockFS<D>>,
}

impl<D: DeviceDriver> SharedFs<D> {
    pub fn new(fs: BlockFS<D>) -> SharedFs<D> {
        SharedFs { inner: RwLock::new(fs) }
    }

    pub fn into_inner(self) -> BlockFS<D> {
        self.inner.into_inner()
    }

    pub fn create(&self, path: &str, mode: ModeBits) -> Result<FileStat> {
        self.inner.write().create(path, mode)
    }

    pub fn mkdir(&self, path: &str, permissions: ModeBits) -> Result<FileStat> {
        self.inner.write().mkdir(path, permissions)
    }

    pub fn mknod(&self, path: &str, mode: ModeBits) -> Result<FileStat> {
        self.inner.write().mknod(path, mode)
    }

    pub fn remove(&self, path: &str, expect_directory: bool) -> Result<()> {
        self.inner.write().remove(path, expect_directory)
    }

    pub fn unlink(&self, path: &str) -> Result<()> {
        self.inner.write().unlink(path)
    }

    pub fn rmdir(&self, path: &str) -> Result<()> {
        self.inner.write().rmdir(path)
    }

    pub fn write(&self, path: &str, offset: u64, data: &[u8]) -> Result<usize> {
        self.inner.write().write(path, offset, data)
    }

    pub fn sync(&self) -> Result<()> {
        self.inner.write().sync()
    }

    pub fn read(&self, path: &str, offset: u64, buffer: &mut [u8]) -> Result<usize> {
        self.inner.read().read(path, offset, buffer)
    }

    pub fn stat(&self, path: &str) -> Result<FileStat> {
        self.inner.read().stat(path)
    }

    pub fn getattr(&self, path: &str) -> Result<FileStat> {
        self.inner.read().getattr(path)
    }

    pub fn resolve(&self, path: &str) -> Result<InodePointer> {
        self.inner.read().resolve(path)
    }

    /// Directory contents as of a single moment; the lock is released before
    /// this returns.
    pub fn list(&self, path: &str) -> Result<Vec<DirListing>> {
        let fs = self.inner.read();
        let listings = fs.list(path)?.collect();
        listings
    }

    pub fn statfs(&self) -> Result<FsStats> {
        self.inner.read().statfs()
    }

    pub fn check(&self) -> Result<CheckReport> {
        self.inner.read().check()
    }
}

impl<D: DeviceDriver> From<BlockFS<D>> for SharedFs<D> {
    fn from(fs: BlockFS<D>) -> SharedFs<D> {
        SharedFs::new(fs)
    }
}
