use std::collections::{BTreeMap, BTreeSet};

use log::warn;

use crate::consts::{InodePointer, NULL_INODE, ROOT_INODE};
use crate::driver::DeviceDriver;
use crate::ops::BlockFS;
use crate::structure::directory::MAX_ENTRIES;
use crate::structure::Structure;
use crate::util::error::{Error, Result};

/// Disagreements between the bitmaps and what the directory tree reaches.
/// Block numbers are data-bitmap indices.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CheckReport {
    /// Marked allocated but unreachable from the root.
    pub leaked_inodes: Vec<InodePointer>,
    /// Reachable but marked free.
    pub unmarked_inodes: Vec<InodePointer>,
    pub leaked_blocks: Vec<u64>,
    pub unmarked_blocks: Vec<u64>,
    /// Referenced by more than one pointer.
    pub shared_blocks: Vec<u64>,
    /// Inodes named by more than one directory entry.
    pub shared_inodes: Vec<InodePointer>,
    /// `(directory, inode)` pairs whose entry names an unreadable inode.
    pub bad_entries: Vec<(InodePointer, InodePointer)>,
    /// Inodes holding a pointer outside the data region.
    pub bad_pointers: Vec<InodePointer>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        *self == CheckReport::default()
    }
}

impl<D: DeviceDriver> Structure<D> {
    pub fn check(&self) -> Result<CheckReport> {
        let mut report = CheckReport::default();
        let mut reachable = BTreeSet::from([NULL_INODE]);
        let mut references: BTreeMap<u64, u32> = BTreeMap::new();
        let mut pending = vec![(ROOT_INODE, ROOT_INODE)];

        while let Some((directory, num)) = pending.pop() {
            if reachable.contains(&num) {
                report.shared_inodes.push(num);
                continue;
            }
            let inode = match self.read_inode(num) {
                Ok(inode) => inode,
                Err(Error::Corrupted(_)) => {
                    report.bad_entries.push((directory, num));
                    continue;
                }
                Err(err) => return Err(err),
            };
            reachable.insert(num);

            let blocks = match self.owned_blocks(&inode) {
                Ok(blocks) => blocks,
                Err(Error::Corrupted(_)) => {
                    report.bad_pointers.push(num);
                    continue;
                }
                Err(err) => return Err(err),
            };
            for pointer in blocks {
                *references.entry(self.block_index(pointer)?).or_default() += 1;
            }
            if inode.is_directory() {
                for slot in 0..MAX_ENTRIES {
                    if let Some(entry) = self.read_slot(&inode, slot)? {
                        pending.push((num, entry.num));
                    }
                }
            }
        }

        for num in 0..self.super_block.inode_count {
            let num = num as InodePointer;
            match (self.inode_map.is_used(&self.io, num as u64)?, reachable.contains(&num)) {
                (true, false) => report.leaked_inodes.push(num),
                (false, true) => report.unmarked_inodes.push(num),
                _ => {}
            }
        }
        for index in 0..self.super_block.block_count {
            let count = references.get(&index).copied().unwrap_or(0);
            match (self.block_map.is_used(&self.io, index)?, count) {
                (true, 0) => report.leaked_blocks.push(index),
                (false, count) if count > 0 => report.unmarked_blocks.push(index),
                _ => {}
            }
            if count > 1 {
                report.shared_blocks.push(index);
            }
        }

        report.shared_inodes.sort_unstable();
        report.shared_inodes.dedup();
        report.bad_entries.sort_unstable();
        report.bad_pointers.sort_unstable();
        if !report.is_clean() {
            warn!("consistency check found problems: {:?}", report);
        }
        Ok(report)
    }
}

impl<D: DeviceDriver> BlockFS<D> {
    /// Walks the tree from the root and compares it with both bitmaps.
    pub fn check(&self) -> Result<CheckReport> {
        self.structure.check()
    }
}
