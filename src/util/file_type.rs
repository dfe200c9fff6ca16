#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    BlockDevice,
    CharDevice,
    Directory,
    Fifo,
    Symlink,
    Regular,
    Socket,
    Other,
}

use FileType::*;

impl FileType {
    #[allow(clippy::unnecessary_cast)]
    pub(crate) const fn from_stat_mode(st_mode: libc::mode_t) -> FileType {
        match st_mode as libc::mode_t & libc::S_IFMT {
            libc::S_IFBLK => BlockDevice,
            libc::S_IFCHR => CharDevice,
            libc::S_IFDIR => Directory,
            libc::S_IFIFO => Fifo,
            libc::S_IFLNK => Symlink,
            libc::S_IFREG => Regular,
            libc::S_IFSOCK => Socket,
            _ => Other,
        }
    }

    /// Returns [`None`] for `DT_UNKNOWN`, in which case the type has to be queried with `lstat`.
    pub(crate) const fn from_dirent_type(d_type: u8) -> Option<FileType> {
        Some(match d_type {
            libc::DT_BLK => BlockDevice,
            libc::DT_CHR => CharDevice,
            libc::DT_DIR => Directory,
            libc::DT_FIFO => Fifo,
            libc::DT_LNK => Symlink,
            libc::DT_REG => Regular,
            libc::DT_SOCK => Socket,
            libc::DT_UNKNOWN => return None,
            _ => Other,
        })
    }

    pub const fn is_dir(&self) -> bool {
        matches!(self, Directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirent_classification() {
        assert_eq!(FileType::from_dirent_type(libc::DT_DIR), Some(Directory));
        assert_eq!(FileType::from_dirent_type(libc::DT_LNK), Some(Symlink));
        assert_eq!(FileType::from_dirent_type(libc::DT_UNKNOWN), None);
        assert!(
            !FileType::from_dirent_type(libc::DT_SOCK).is_some_and(|t| t.is_dir()),
            "Sockets share a bit with directories in d_type but must not be treated as one."
        );
    }

    #[test]
    fn test_stat_mode_classification() {
        assert_eq!(FileType::from_stat_mode(libc::S_IFREG | 0o644), Regular);
        assert_eq!(FileType::from_stat_mode(libc::S_IFDIR | 0o755), Directory);
    }
}
