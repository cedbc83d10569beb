use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Four-character atom type code.
///
/// Codes are raw bytes. Text views decode them one byte per character
/// (Latin-1), so `[0xA9, b'n', b'a', b'm']` reads as `"©nam"`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub const MOOV: FourCC = FourCC(*b"moov");
    pub const UDTA: FourCC = FourCC(*b"udta");
    pub const META: FourCC = FourCC(*b"meta");
    pub const ILST: FourCC = FourCC(*b"ilst");
    /// iTunes title tag, `©nam`.
    pub const TITLE: FourCC = FourCC([0xA9, b'n', b'a', b'm']);
    /// iTunes long description tag.
    pub const SYNOPSIS: FourCC = FourCC(*b"ldes");

    /// Build a code from text holding exactly four characters in U+0000..=U+00FF.
    pub fn from_latin1(s: &str) -> Option<Self> {
        let mut out = [0u8; 4];
        let mut chars = s.chars();
        for slot in out.iter_mut() {
            let c = chars.next()?;
            *slot = u8::try_from(u32::from(c)).ok()?;
        }
        if chars.next().is_some() {
            return None;
        }
        Some(FourCC(out))
    }

    /// Latin-1 decoding of the four bytes; never fails.
    pub fn as_latin1(&self) -> String {
        self.0.iter().map(|&b| b as char).collect()
    }

    /// Printable view: control and non-graphic bytes shown as `.`.
    pub fn as_str_lossy(&self) -> String {
        self.0
            .iter()
            .map(|&b| {
                let c = b as char;
                if c.is_control() { '.' } else { c }
            })
            .collect()
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_latin1())
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str_lossy())
    }
}

/// Structural flags attached to an atom type.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct AtomFlags(u8);

impl AtomFlags {
    pub const NONE: AtomFlags = AtomFlags(0);
    /// Payload is a sequence of child atoms.
    pub const CONTAINER: AtomFlags = AtomFlags(1);
    /// Container whose payload starts with 4 bytes to drop before the children.
    pub const SKIPPER: AtomFlags = AtomFlags(2);
    /// iTunes-style tag carrying a `data` sub-atom.
    pub const TAGITEM: AtomFlags = AtomFlags(4);
    /// Tag datum is two big-endian u32 values (track/disc number).
    pub const NOVERN: AtomFlags = AtomFlags(8);
    /// Freeform tag made of `mean`, `name` and `data` items.
    pub const XTAGITEM: AtomFlags = AtomFlags(16);
    /// Synthetic marker closing a container; never stored in a catalog.
    pub const CONTAINER_END: AtomFlags = AtomFlags(32);

    const NAMES: [(AtomFlags, &'static str); 6] = [
        (Self::CONTAINER, "Container"),
        (Self::SKIPPER, "Skipper"),
        (Self::TAGITEM, "Tagitem"),
        (Self::NOVERN, "Novern"),
        (Self::XTAGITEM, "Xtagitem"),
        (Self::CONTAINER_END, "ContainerEnd"),
    ];

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when every bit of `other` is set in `self`.
    pub const fn contains(self, other: AtomFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: AtomFlags) -> AtomFlags {
        AtomFlags(self.0 | other.0)
    }

    pub const fn difference(self, other: AtomFlags) -> AtomFlags {
        AtomFlags(self.0 & !other.0)
    }
}

impl BitOr for AtomFlags {
    type Output = AtomFlags;
    fn bitor(self, rhs: AtomFlags) -> AtomFlags {
        self.union(rhs)
    }
}

impl BitOrAssign for AtomFlags {
    fn bitor_assign(&mut self, rhs: AtomFlags) {
        *self = self.union(rhs);
    }
}

impl fmt::Display for AtomFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("None");
        }
        let mut first = true;
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for AtomFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AtomFlags({self})")
    }
}

/// Whether the atom offered to the caller has been dealt with yet.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConsumeState {
    /// Offered, nothing has read or skipped it; the reader will apply its default.
    Pending,
    /// Read, skipped or dived into. No further consuming call is allowed.
    Consumed,
}

/// One traversal step.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AtomEvent {
    pub name: FourCC,
    pub flags: AtomFlags,
    /// Total size including the header.
    pub size: u64,
    /// Payload size: `size` minus the 8 or 16 byte header.
    pub data_size: u64,
    /// Header position, counted from where the reader started.
    pub offset: u64,
    /// Nesting level, 0 for top-level atoms.
    pub depth: usize,
}

impl AtomEvent {
    pub fn is_container(&self) -> bool {
        self.flags.contains(AtomFlags::CONTAINER)
    }

    pub fn is_container_end(&self) -> bool {
        self.flags.contains(AtomFlags::CONTAINER_END)
    }

    /// 8 for a plain header, 16 when the 64-bit size extension was used.
    pub fn header_len(&self) -> u64 {
        self.size - self.data_size
    }

    /// The synthetic event closing this container.
    pub(crate) fn end_marker(&self) -> AtomEvent {
        AtomEvent {
            flags: AtomFlags::CONTAINER_END,
            ..self.clone()
        }
    }
}
