use std::fmt::{self, Debug, Formatter};
use std::ops::{BitOr, BitOrAssign};

use libc::{O_CREAT, O_RDONLY, O_RDWR, O_TRUNC, O_WRONLY, c_int};

/// The capabilities requested when opening a [`File`](super::File).
///
/// Unlike the platform's open flags, these can be combined freely: the access mode constants
/// `O_RDONLY`, `O_WRONLY` and `O_RDWR` are an enumeration rather than bits, so `READ | WRITE` has
/// to be translated to `O_RDWR` instead of OR-ing two values together.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flags(u8);

macro_rules! get_flag {
    ($self:ident, $flag:expr) => {
        $self.0 & $flag.0 != 0
    };
}

impl Flags {
    pub const READ: Flags = Flags(1 << 0);
    pub const WRITE: Flags = Flags(1 << 1);
    pub const CREATE: Flags = Flags(1 << 2);
    pub const TRUNCATE: Flags = Flags(1 << 3);

    pub const fn empty() -> Flags {
        Flags(0)
    }

    pub const fn contains(&self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Flags) -> Flags {
        Flags(self.0 | other.0)
    }

    /// Translates to the platform's flags for `open`. Without [`Flags::WRITE`], files are opened
    /// read-only.
    pub(crate) const fn open_flags(&self) -> c_int {
        let mut flags = match (get_flag!(self, Flags::READ), get_flag!(self, Flags::WRITE)) {
            (true, true) => O_RDWR,
            (false, true) => O_WRONLY,
            _ => O_RDONLY,
        };
        if get_flag!(self, Flags::CREATE) {
            flags |= O_CREAT;
        }
        if get_flag!(self, Flags::TRUNCATE) {
            flags |= O_TRUNC;
        }
        flags
    }
}

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl Debug for Flags {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flags")
            .field("read", &get_flag!(self, Flags::READ))
            .field("write", &get_flag!(self, Flags::WRITE))
            .field("create", &get_flag!(self, Flags::CREATE))
            .field("truncate", &get_flag!(self, Flags::TRUNCATE))
            .finish()
    }
}
