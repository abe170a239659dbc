use std::os::raw::c_int;

pub type ErrorNum = c_int;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no such file or directory")]
    NotFound,
    #[error("no space left on device")]
    OutOfSpace,
    #[error("not a directory")]
    NotADirectory,
    #[error("is a directory")]
    IsADirectory,
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("file name too long")]
    NameTooLong,
    #[error("file exists")]
    AlreadyExists,
    #[error("directory not empty")]
    NotEmpty,
    #[error("corrupted image: {0}")]
    Corrupted(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The errno a host bridge should hand back to the kernel for this error.
    pub fn errno(&self) -> ErrorNum {
        match self {
            Error::NotFound => libc::ENOENT,
            Error::OutOfSpace => libc::ENOSPC,
            Error::NotADirectory => libc::ENOTDIR,
            Error::IsADirectory => libc::EISDIR,
            Error::InvalidArgument(_) => libc::EINVAL,
            Error::NameTooLong => libc::ENAMETOOLONG,
            Error::AlreadyExists => libc::EEXIST,
            Error::NotEmpty => libc::ENOTEMPTY,
            Error::Corrupted(_) => libc::EIO,
            Error::Io(err) => err.raw_os_error().unwrap_or(libc::EIO),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errno_mapping() {
        assert_eq!(Error::NotFound.errno(), libc::ENOENT);
        assert_eq!(Error::OutOfSpace.errno(), libc::ENOSPC);
        assert_eq!(Error::NotADirectory.errno(), libc::ENOTDIR);
        assert_eq!(Error::IsADirectory.errno(), libc::EISDIR);
        assert_eq!(Error::InvalidArgument("path").errno(), libc::EINVAL);
        assert_eq!(Error::NameTooLong.errno(), libc::ENAMETOOLONG);
        assert_eq!(Error::AlreadyExists.errno(), libc::EEXIST);
        assert_eq!(Error::NotEmpty.errno(), libc::ENOTEMPTY);
        assert_eq!(Error::Corrupted("x".to_string()).errno(), libc::EIO);
    }

    #[test]
    fn io_errors_keep_their_errno() {
        let err = Error::from(std::io::Error::from_raw_os_error(libc::EACCES));
        assert_eq!(err.errno(), libc::EACCES);
    }
}
