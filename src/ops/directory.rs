use crate::consts::InodePointer;
use crate::driver::DeviceDriver;
use crate::ops::meta::FileStat;
use crate::ops::BlockFS;
use crate::structure::directory::MAX_ENTRIES;
use crate::structure::inode::Inode;
use crate::structure::Structure;
use crate::util::error::Result;
use crate::util::mode::{directory_mode, ModeBits};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirListing {
    pub name: String,
    pub stat: FileStat,
}

/// Lazy walk over a directory: `.` and `..` first, then every live entry in
/// slot order. Each call to `BlockFS::list` starts a fresh walk.
pub struct ReadDir<'a, D: DeviceDriver> {
    structure: &'a Structure<D>,
    directory: Inode,
    parent: InodePointer,
    position: usize,
}

impl<'a, D: DeviceDriver> ReadDir<'a, D> {
    fn listing(&self, name: &str, num: InodePointer) -> Result<DirListing> {
        let inode = if num == self.directory.num {
            self.directory
        } else {
            self.structure.read_inode(num)?
        };
        Ok(DirListing { name: name.to_string(), stat: self.structure.stat_inode(&inode)? })
    }
}

impl<'a, D: DeviceDriver> Iterator for ReadDir<'a, D> {
    type Item = Result<DirListing>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let position = self.position;
            match position {
                0 => {
                    self.position += 1;
                    return Some(self.listing(".", self.directory.num));
                }
                1 => {
                    self.position += 1;
                    return Some(self.listing("..", self.parent));
                }
                _ if position - 2 >= MAX_ENTRIES => return None,
                _ => {
                    self.position += 1;
                    match self.structure.read_slot(&self.directory, position - 2) {
                        Ok(Some(entry)) => return Some(self.listing(&entry.name(), entry.num)),
                        Ok(None) => continue,
                        Err(err) => return Some(Err(err)),
                    }
                }
            }
        }
    }
}

impl<D: DeviceDriver> BlockFS<D> {
    pub fn mkdir(&mut self, path: &str, permissions: ModeBits) -> Result<FileStat> {
        self.create(path, directory_mode(permissions))
    }

    pub fn rmdir(&mut self, path: &str) -> Result<()> {
        self.remove(path, true)
    }

    /// Entries of the directory at `path`, each with the same metadata `stat`
    /// reports for it.
    pub fn list(&self, path: &str) -> Result<ReadDir<'_, D>> {
        let resolved = self.structure.resolve_directory(path)?;
        Ok(ReadDir {
            structure: &self.structure,
            directory: resolved.inode,
            parent: resolved.parent,
            position: 0,
        })
    }

    /// Names in the directory at `path`, `.` and `..` included.
    pub fn list_names(&self, path: &str) -> Result<Vec<String>> {
        self.list(path)?
            .map(|listing| listing.map(|listing| listing.name))
            .collect()
    }
}
