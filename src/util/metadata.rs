use libc::stat;

use crate::permissions::Permissions;
use crate::util::FileType;

/// A snapshot of the information reported by `stat`, taken at the time of the call.
#[derive(Debug, Clone)]
pub struct Metadata {
    pub size: u64,                  // st_size
    pub file_type: FileType,        // st_mode
    pub permissions: Permissions,   // st_mode
    pub uid: u32,                   // st_uid
    pub gid: u32,                   // st_gid
    pub links: u64,                 // st_nlink
    pub inode_num: u64,             // st_ino
    pub time_modified: (i64, i64),  // st_mtime, st_mtime_nsec
}

impl Metadata {
    #[allow(clippy::unnecessary_cast)]
    pub(crate) fn from_stat(raw: stat) -> Metadata {
        Metadata {
            size: raw.st_size.max(0) as u64,
            file_type: FileType::from_stat_mode(raw.st_mode),
            permissions: Permissions::from_raw_mask(raw.st_mode as u32),
            uid: raw.st_uid,
            gid: raw.st_gid,
            links: raw.st_nlink as u64,
            inode_num: raw.st_ino as u64,
            time_modified: (raw.st_mtime as i64, raw.st_mtime_nsec as i64),
        }
    }
}
