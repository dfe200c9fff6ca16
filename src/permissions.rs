//! POSIX `rwx` permission triads and the two numeric encodings they travel in.
//!
//! # Encodings
//! - The *display* encoding ([`Permissions::raw_value`]) spaces the triads a nibble apart, so that
//!   hexadecimal literals read like the familiar octal notation: `0x644` is `rw-r--r--`.
//! - The *raw mask* ([`Permissions::raw_mask`]) is the POSIX permission bits as consumed by `open`,
//!   `mkdir` and `chmod`: `0o644` is `rw-r--r--`.
//!
//! Converting between the two is a pure bit shift.

use std::fmt::{self, Debug, Display, Formatter};
use std::ops::{BitOr, BitOrAssign};

use libc::mode_t;

/// A subset of {read, write, execute} for a single class of user.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PermissionSet(u32);

impl PermissionSet {
    pub const NONE: PermissionSet = PermissionSet(0);
    pub const EXECUTE: PermissionSet = PermissionSet(1 << 0);
    pub const WRITE: PermissionSet = PermissionSet(1 << 1);
    pub const READ: PermissionSet = PermissionSet(1 << 2);
    pub const ALL: PermissionSet = PermissionSet(0b111);

    /// Keeps only the lowest three bits of `value`.
    pub const fn from_bits_truncate(value: u32) -> PermissionSet {
        PermissionSet(value & 0b111)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn contains(&self, other: PermissionSet) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: PermissionSet) -> PermissionSet {
        PermissionSet(self.0 | other.0)
    }
}

impl BitOr for PermissionSet {
    type Output = PermissionSet;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl BitOrAssign for PermissionSet {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl Display for PermissionSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let flag = |set: PermissionSet, ch: char| if self.contains(set) { ch } else { '-' };
        write!(
            f,
            "{}{}{}",
            flag(PermissionSet::READ, 'r'),
            flag(PermissionSet::WRITE, 'w'),
            flag(PermissionSet::EXECUTE, 'x'),
        )
    }
}

impl Debug for PermissionSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "PermissionSet({self})")
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Permissions {
    pub owner: PermissionSet,
    pub group: PermissionSet,
    pub others: PermissionSet,
}

impl Permissions {
    /// `rw-r--r--`
    pub const FILE: Permissions = Permissions::from_raw_value(0x644);
    /// `rwxr-xr-x`
    pub const DIRECTORY: Permissions = Permissions::from_raw_value(0x755);
    /// `rwxrwxrwx`, used for ancestors created on the way to a requested directory.
    pub const INTERMEDIATE_DIRECTORIES: Permissions = Permissions::from_raw_value(0x777);

    pub const fn new(owner: PermissionSet, group: PermissionSet, others: PermissionSet) -> Permissions {
        Permissions { owner, group, others }
    }

    pub const fn from_raw_value(value: u32) -> Permissions {
        Permissions {
            owner: PermissionSet::from_bits_truncate(value >> 8),
            group: PermissionSet::from_bits_truncate(value >> 4),
            others: PermissionSet::from_bits_truncate(value),
        }
    }

    /// The display encoding: owner in bits 8-10, group in bits 4-6 and others in bits 0-2.
    pub const fn raw_value(&self) -> u32 {
        self.owner.bits() << 8 | self.group.bits() << 4 | self.others.bits()
    }

    /// Reads the permission bits out of a POSIX mode. Any file type or special bits are ignored.
    pub const fn from_raw_mask(mask: u32) -> Permissions {
        Permissions {
            owner: PermissionSet::from_bits_truncate(mask >> 6),
            group: PermissionSet::from_bits_truncate(mask >> 3),
            others: PermissionSet::from_bits_truncate(mask),
        }
    }

    /// The POSIX encoding: owner in bits 6-8, group in bits 3-5 and others in bits 0-2.
    pub const fn raw_mask(&self) -> u32 {
        self.owner.bits() << 6 | self.group.bits() << 3 | self.others.bits()
    }

    #[allow(clippy::unnecessary_cast)]
    pub(crate) const fn mode(&self) -> mode_t {
        self.raw_mask() as mode_t
    }

    /// The mode passed to `chmod`-style calls for an optional value, where `None` clears every
    /// bit.
    pub(crate) const fn mode_or_empty(permissions: Option<Permissions>) -> mode_t {
        match permissions {
            Some(p) => p.mode(),
            None => 0,
        }
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Permissions::FILE
    }
}

impl Display for Permissions {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.owner, self.group, self.others)
    }
}

impl Debug for Permissions {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Permissions({self}, 0x{:03x})", self.raw_value())
    }
}
