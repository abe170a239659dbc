use log::{debug, warn};

use crate::config::{Credentials, FormatOptions};
use crate::consts::InodePointer;
use crate::driver::DeviceDriver;
use crate::ops::meta::{FileStat, FsStats};
use crate::ops::path::split;
use crate::structure::directory::validate_name;
use crate::structure::Structure;
use crate::util::error::{Error, Result};
use crate::util::format::{pretty_blocks, pretty_size_from_bytes};
use crate::util::mode::{file_mode, ModeBits, ModeBitsHelper, FILE_TYPE_MASK};

pub mod check;
pub mod directory;
pub mod file;
pub mod meta;
pub mod path;
pub mod shared;

/// A mounted image and the identity new inodes are recorded under. Every
/// operation takes an absolute path and runs to completion on the image.
pub struct BlockFS<D: DeviceDriver> {
    structure: Structure<D>,
    credentials: Credentials,
}

impl<D: DeviceDriver> BlockFS<D> {
    /// Formats `device` and mounts the result.
    pub fn format(device: D, options: &FormatOptions) -> Result<BlockFS<D>> {
        let structure = Structure::format(device, options)?;
        Ok(BlockFS::from_structure(structure))
    }

    pub fn mount(device: D) -> Result<BlockFS<D>> {
        let structure = Structure::mount(device)?;
        Ok(BlockFS::from_structure(structure))
    }

    fn from_structure(structure: Structure<D>) -> BlockFS<D> {
        let super_block = structure.super_block;
        debug!(
            "mounted image: {} inodes, {} in a {} region",
            super_block.inode_count,
            pretty_blocks(super_block.block_count),
            pretty_size_from_bytes(super_block.end())
        );
        BlockFS { structure, credentials: Credentials::current() }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> BlockFS<D> {
        self.credentials = credentials;
        self
    }

    pub fn credentials(&self) -> Credentials {
        self.credentials
    }

    /// Creates a regular file or directory at `path`; `mode` carries the type
    /// bits. The new inode is returned to the free list if the parent has no
    /// room for the entry.
    pub fn create(&mut self, path: &str, mode: ModeBits) -> Result<FileStat> {
        if !mode.is_file() && !mode.is_directory() {
            return Err(Error::InvalidArgument("only regular files and directories can be created"));
        }
        let (parent_path, name) = split(path)?;
        validate_name(name)?;

        let mut parent = self.structure.resolve_directory(parent_path)?.inode;
        if self.structure.find_entry(&parent, name)?.is_some() {
            return Err(Error::AlreadyExists);
        }

        let mut inode = self.structure.create_inode(mode, self.credentials)?;
        inode.nlinks = if inode.is_directory() { 2 } else { 1 };
        let linked = self
            .structure
            .write_inode(&inode)
            .and_then(|_| self.structure.insert_entry(&mut parent, name, inode.num));
        if let Err(err) = linked {
            warn!("rolling back inode {} for {}: {}", inode.num, path, err);
            self.structure.release_inode(&inode)?;
            return Err(err);
        }

        if inode.is_directory() {
            parent.nlinks += 1;
        }
        parent.touch_modified();
        self.structure.write_inode(&parent)?;

        debug!("created {} as inode {} (mode {:o})", path, inode.num, mode);
        self.structure.stat_inode(&inode)
    }

    /// Creates a regular file. A mode without type bits means a regular file.
    pub fn mknod(&mut self, path: &str, mode: ModeBits) -> Result<FileStat> {
        let mode = if mode & FILE_TYPE_MASK == 0 { file_mode(mode) } else { mode };
        if !mode.is_file() {
            return Err(Error::InvalidArgument("only regular files can be created with mknod"));
        }
        self.create(path, mode)
    }

    /// Unlinks `path` and frees its inode and blocks. `expect_directory`
    /// selects between `rmdir` and `unlink` semantics.
    pub fn remove(&mut self, path: &str, expect_directory: bool) -> Result<()> {
        let (parent_path, name) = split(path)?;
        if name == "." || name == ".." {
            return Err(Error::InvalidArgument("cannot remove '.' or '..'"));
        }

        let mut parent = self.structure.resolve_directory(parent_path)?.inode;
        let entry = self.structure.find_entry(&parent, name)?.ok_or(Error::NotFound)?;
        let target = self.structure.read_inode(entry.num)?;

        match (expect_directory, target.is_directory()) {
            (true, false) => return Err(Error::NotADirectory),
            (false, true) => return Err(Error::IsADirectory),
            _ => {}
        }
        if target.is_directory() && !self.structure.is_empty_directory(&target)? {
            return Err(Error::NotEmpty);
        }

        self.structure.remove_entry(&parent, name)?;
        self.structure.release_inode(&target)?;

        if target.is_directory() {
            parent.nlinks = parent.nlinks.saturating_sub(1);
        }
        parent.touch_modified();
        self.structure.write_inode(&parent)?;

        debug!("removed {} (inode {})", path, target.num);
        Ok(())
    }

    pub fn unlink(&mut self, path: &str) -> Result<()> {
        self.remove(path, false)
    }

    pub fn stat(&self, path: &str) -> Result<FileStat> {
        let inode = self.structure.resolve(path)?.inode;
        self.structure.stat_inode(&inode)
    }

    pub fn getattr(&self, path: &str) -> Result<FileStat> {
        self.stat(path)
    }

    /// Inode number `path` names.
    pub fn resolve(&self, path: &str) -> Result<InodePointer> {
        Ok(self.structure.resolve(path)?.inode.num)
    }

    pub fn statfs(&self) -> Result<FsStats> {
        self.structure.stats()
    }

    /// Flushes the image to its backing medium.
    pub fn sync(&mut self) -> Result<()> {
        self.structure.io.flush()
    }

    pub fn into_device(self) -> D {
        self.structure.io.device
    }
}
