use std::fmt;

use crate::Metadata;

/// Mode bits as carried in the `permissions` field of file attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileMode(u32);

bitflags! {
    impl FileMode: u32 {
        const FIFO = 0o010000;
        const CHR = 0o020000;
        const DIR = 0o040000;
        const BLK = 0o060000;
        const REG = 0o100000;
        const LNK = 0o120000;
        const SOCK = 0o140000;

        /// Mask selecting the file type
        const TYPE = 0o170000;
        /// Mask selecting the permission and setuid/setgid/sticky bits
        const PERMISSIONS = 0o7777;
    }
}

impl FileMode {
    /// Keeps only the file type bits
    pub fn file_type(self) -> Self {
        self & Self::TYPE
    }
}

/// Classification of a metadata record. Exactly one applies to any record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Regular,
    Directory,
    Symlink,
    /// Fifo, socket, character or block device, or no type information at all
    Other,
}

impl FileKind {
    pub fn from_mode(mode: u32) -> Self {
        let r#type = FileMode::from_bits_truncate(mode).file_type();

        if r#type == FileMode::REG {
            Self::Regular
        } else if r#type == FileMode::DIR {
            Self::Directory
        } else if r#type == FileMode::LNK {
            Self::Symlink
        } else {
            Self::Other
        }
    }

    /// A record without `permissions` carries no type and is [`FileKind::Other`]
    pub fn of(metadata: &Metadata) -> Self {
        metadata.permissions.map_or(Self::Other, Self::from_mode)
    }

    pub const fn is_regular(self) -> bool {
        matches!(self, Self::Regular)
    }

    pub const fn is_dir(self) -> bool {
        matches!(self, Self::Directory)
    }

    pub const fn is_symlink(self) -> bool {
        matches!(self, Self::Symlink)
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Regular => "regular",
            Self::Directory => "directory",
            Self::Symlink => "symlink",
            Self::Other => "other",
        })
    }
}
