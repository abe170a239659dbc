//! A small block filesystem living inside one fixed-size byte region: a
//! superblock, two allocation bitmaps, an inode table and a pool of 512-byte
//! data blocks. Files and directories are addressed by absolute path.

pub mod config;
pub mod consts;
pub mod driver;
mod io;
pub mod ops;
mod structure;
pub mod util;

pub use config::{Credentials, FormatOptions};
pub use ops::check::CheckReport;
pub use ops::directory::{DirListing, ReadDir};
pub use ops::meta::{FileStat, FsStats, InodeType};
pub use ops::shared::SharedFs;
pub use ops::BlockFS;
pub use structure::directory::DirectoryEntry;
pub use structure::inode::Inode;
pub use structure::superblock::SuperBlock;
pub use util::error::{Error, Result};
