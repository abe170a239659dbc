use crate::consts::{InodePointer, ROOT_INODE};
use crate::driver::DeviceDriver;
use crate::structure::inode::Inode;
use crate::structure::Structure;
use crate::util::error::{Error, Result};

/// The inode a path names, plus the directory it was reached through. The
/// root is its own parent.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub inode: Inode,
    pub parent: InodePointer,
}

/// Non-empty segments of an absolute path. `""` and `"/"` yield nothing.
pub fn components(path: &str) -> Result<impl Iterator<Item = &str>> {
    if !path.is_empty() && !path.starts_with('/') {
        return Err(Error::InvalidArgument("path is not absolute"));
    }
    Ok(path.split('/').filter(|segment| !segment.is_empty()))
}

/// Splits an absolute path into the parent path (up to and including the last
/// `/`) and the leaf name. Trailing slashes are dropped first.
pub fn split(path: &str) -> Result<(&str, &str)> {
    if !path.starts_with('/') {
        return Err(Error::InvalidArgument("path is not absolute"));
    }
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(index) if !trimmed.is_empty() => Ok((&trimmed[..=index], &trimmed[index + 1..])),
        _ => Err(Error::InvalidArgument("the root directory has no parent")),
    }
}

impl<D: DeviceDriver> Structure<D> {
    /// Walks `path` from the root, one directory lookup per named segment.
    /// `.` stays put and `..` climbs back, matching what listings show.
    pub fn resolve(&self, path: &str) -> Result<Resolved> {
        let mut ancestors: Vec<InodePointer> = Vec::new();
        let mut current = self.read_inode(ROOT_INODE)?;

        for segment in components(path)? {
            if !current.is_directory() {
                return Err(Error::NotADirectory);
            }
            match segment {
                "." => {}
                ".." => {
                    if let Some(parent) = ancestors.pop() {
                        current = self.read_inode(parent)?;
                    }
                }
                name => {
                    let entry = self.find_entry(&current, name)?.ok_or(Error::NotFound)?;
                    ancestors.push(current.num);
                    current = self.read_inode(entry.num)?;
                }
            }
        }

        let parent = ancestors.last().copied().unwrap_or(ROOT_INODE);
        Ok(Resolved { inode: current, parent })
    }

    /// Resolves a path that must name a directory.
    pub fn resolve_directory(&self, path: &str) -> Result<Resolved> {
        let resolved = self.resolve(path)?;
        if !resolved.inode.is_directory() {
            return Err(Error::NotADirectory);
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use crate::structure::directory::lookups;
    use crate::structure::tests::structure;
    use crate::util::mode::{directory_mode, file_mode};

    #[test]
    fn split_paths() {
        assert_eq!(split("/foo").unwrap(), ("/", "foo"));
        assert_eq!(split("/a/b/c").unwrap(), ("/a/b/", "c"));
        assert_eq!(split("/a/b/").unwrap(), ("/a/", "b"));
        assert_eq!(split("//a//b").unwrap(), ("//a//", "b"));
        assert!(matches!(split("/"), Err(Error::InvalidArgument(_))));
        assert!(matches!(split("///"), Err(Error::InvalidArgument(_))));
        assert!(matches!(split("relative"), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn component_iteration() {
        assert_eq!(components("//a//b/").unwrap().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(components("").unwrap().count(), 0);
        assert_eq!(components("/").unwrap().count(), 0);
        assert!(components("a/b").is_err());
    }

    #[test]
    fn resolve_nested() {
        let mut structure = structure(32, 32);
        let mut root = structure.read_inode(ROOT_INODE).unwrap();
        let mut a = structure.create_inode(directory_mode(0o755), Credentials::root()).unwrap();
        let b = structure.create_inode(file_mode(0o644), Credentials::root()).unwrap();
        structure.insert_entry(&mut root, "a", a.num).unwrap();
        structure.insert_entry(&mut a, "b", b.num).unwrap();
        structure.write_inode(&root).unwrap();
        structure.write_inode(&a).unwrap();

        assert_eq!(structure.resolve("/").unwrap().inode.num, ROOT_INODE);
        assert_eq!(structure.resolve("").unwrap().inode.num, ROOT_INODE);
        assert_eq!(structure.resolve("/a").unwrap().inode.num, a.num);

        let resolved = structure.resolve("//a//b/").unwrap();
        assert_eq!((resolved.inode.num, resolved.parent), (b.num, a.num));
        assert_eq!(structure.resolve("/a/./b").unwrap().inode.num, b.num);
        assert_eq!(structure.resolve("/a/../a/b").unwrap().inode.num, b.num);
        assert_eq!(structure.resolve("/..").unwrap().inode.num, ROOT_INODE);

        assert!(matches!(structure.resolve("/a/missing"), Err(Error::NotFound)));
        assert!(matches!(structure.resolve("/missing/b"), Err(Error::NotFound)));
        assert!(matches!(structure.resolve("/a/b/c"), Err(Error::NotADirectory)));
        assert!(matches!(structure.resolve_directory("/a/b"), Err(Error::NotADirectory)));
    }

    #[test]
    fn one_lookup_per_named_segment() {
        let mut structure = structure(32, 32);
        let mut root = structure.read_inode(ROOT_INODE).unwrap();
        let mut a = structure.create_inode(directory_mode(0o755), Credentials::root()).unwrap();
        let mut b = structure.create_inode(directory_mode(0o755), Credentials::root()).unwrap();
        let c = structure.create_inode(file_mode(0o644), Credentials::root()).unwrap();
        structure.insert_entry(&mut root, "a", a.num).unwrap();
        structure.insert_entry(&mut a, "b", b.num).unwrap();
        structure.insert_entry(&mut b, "c", c.num).unwrap();
        for inode in [root, a, b] {
            structure.write_inode(&inode).unwrap();
        }

        lookups::take();
        assert_eq!(structure.resolve("/a/b/c").unwrap().inode.num, c.num);
        assert_eq!(lookups::take(), 3);
        assert_eq!(structure.resolve("//a//b/").unwrap().inode.num, b.num);
        assert_eq!(lookups::take(), 2);

        structure.resolve("/").unwrap();
        structure.resolve("").unwrap();
        assert_eq!(lookups::take(), 0);

        // `.` and `..` never touch a directory block
        assert_eq!(structure.resolve("/./a/../a/./b/c").unwrap().inode.num, c.num);
        assert_eq!(lookups::take(), 4);
        structure.resolve("/../..").unwrap();
        assert_eq!(lookups::take(), 0);

        assert!(matches!(structure.resolve("/a/missing/c"), Err(Error::NotFound)));
        assert_eq!(lookups::take(), 2);
    }
}
