use crate::atom::{AtomFlags, FourCC};
use crate::catalog::Catalog;
use crate::source::AtomSource;
use byteorder::{BigEndian, ByteOrder};

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("open-ended atom '{name}' (size 0) is not supported")]
    OpenEndedAtom { name: FourCC },
    #[error("atom '{name}' declares size {size}, smaller than its {header_len}-byte header")]
    InvalidSize { name: FourCC, size: u64, header_len: u64 },
    #[error("no current atom")]
    NoCurrentAtom,
    #[error("current atom '{name}' already consumed")]
    AlreadyConsumed { name: FourCC },
    #[error("atom '{name}' is a container and carries no leaf data")]
    NoLeafData { name: FourCC },
}

impl ParseError {
    /// Caller misuse of the reader, as opposed to bad input or I/O.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            ParseError::NoCurrentAtom | ParseError::AlreadyConsumed { .. } | ParseError::NoLeafData { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// A decoded atom header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomHeader {
    pub name: FourCC,
    /// Catalog flags, `NONE` for unknown codes.
    pub flags: AtomFlags,
    /// Total size including the header.
    pub size: u64,
    /// 8, or 16 with the 64-bit size extension.
    pub header_len: u64,
}

impl AtomHeader {
    pub fn data_size(&self) -> u64 {
        self.size - self.header_len
    }
}

/// Read the header at the current position.
///
/// `Ok(None)` means the stream ended before a full header: fewer than 4
/// bytes for the size, 4 for the type, or 8 for an extended size.
pub fn read_atom_header<S: AtomSource + ?Sized>(
    src: &mut S,
    catalog: &Catalog,
) -> Result<Option<AtomHeader>> {
    let mut buf = [0u8; 8];
    if src.read_up_to(&mut buf)? < 8 {
        return Ok(None);
    }
    let size32 = BigEndian::read_u32(&buf[..4]);
    let name = FourCC([buf[4], buf[5], buf[6], buf[7]]);

    let (size, header_len) = match size32 {
        0 => return Err(ParseError::OpenEndedAtom { name }),
        1 => {
            let mut ext = [0u8; 8];
            if src.read_up_to(&mut ext)? < 8 {
                return Ok(None);
            }
            (BigEndian::read_u64(&ext), 16)
        }
        n => (u64::from(n), 8),
    };

    if size < header_len {
        return Err(ParseError::InvalidSize { name, size, header_len });
    }

    let flags = catalog.flags(&name);
    log::trace!("header '{name}' size={size} header_len={header_len} flags={flags}");
    Ok(Some(AtomHeader { name, flags, size, header_len }))
}
