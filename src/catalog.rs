use crate::atom::{AtomFlags, FourCC};
use std::borrow::Cow;
use std::collections::HashMap;

/// A registered atom type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomType {
    pub name: FourCC,
    pub flags: AtomFlags,
    /// Human-readable name, e.g. "Movie Box".
    pub full_name: Cow<'static, str>,
}

impl AtomType {
    pub fn new(name: FourCC, flags: AtomFlags, full_name: impl Into<Cow<'static, str>>) -> Self {
        AtomType { name, flags, full_name: full_name.into() }
    }
}

const C: AtomFlags = AtomFlags::CONTAINER;
const T: AtomFlags = AtomFlags::TAGITEM;
const N: AtomFlags = AtomFlags::NONE;

// File-level, the moov/trak spine, and the iTunes ilst tags.
const STANDARD: &[([u8; 4], AtomFlags, &str)] = &[
    (*b"ftyp", N, "File Type Box"),
    (*b"free", N, "Free Space Box"),
    (*b"skip", N, "Free Space Box"),
    (*b"mdat", N, "Media Data Box"),
    (*b"wide", T, "Wide Placeholder"),
    (*b"moov", C, "Movie Box"),
    (*b"udta", C, "User Data Box"),
    (*b"meta", AtomFlags::CONTAINER.union(AtomFlags::SKIPPER), "Meta Box"),
    (*b"ilst", C, "Item List"),
    (*b"trak", C, "Track Box"),
    (*b"edts", C, "Edit Box"),
    (*b"mdia", C, "Media Box"),
    (*b"minf", C, "Media Information Box"),
    (*b"dinf", C, "Data Information Box"),
    (*b"stbl", C, "Sample Table Box"),
    (*b"mvex", C, "Movie Extends Box"),
    (*b"moof", C, "Movie Fragment Box"),
    (*b"traf", C, "Track Fragment Box"),
    ([0xA9, b'n', b'a', b'm'], T, "Title"),
    ([0xA9, b'A', b'R', b'T'], T, "Artist"),
    ([0xA9, b'a', b'l', b'b'], T, "Album"),
    ([0xA9, b'd', b'a', b'y'], T, "Release Date"),
    ([0xA9, b'c', b'm', b't'], T, "Comment"),
    ([0xA9, b'g', b'e', b'n'], T, "Genre"),
    ([0xA9, b't', b'o', b'o'], T, "Encoding Tool"),
    ([0xA9, b'w', b'r', b't'], T, "Composer"),
    (*b"desc", T, "Description"),
    (*b"ldes", T, "Synopsis"),
    (*b"cprt", T, "Copyright"),
    (*b"trkn", AtomFlags::NOVERN, "Track Number"),
    (*b"disk", AtomFlags::NOVERN, "Disc Number"),
    (*b"----", AtomFlags::XTAGITEM, "Freeform Tag"),
];

/// Immutable lookup table from type code to flags.
///
/// Build one with [`Catalog::standard`] or [`Catalog::builder`]; there is no
/// way to change it afterwards.
#[derive(Debug, Clone)]
pub struct Catalog {
    types: HashMap<FourCC, AtomType>,
}

impl Catalog {
    /// The built-in table.
    pub fn standard() -> Self {
        CatalogBuilder::standard().build()
    }

    /// An empty builder; every code resolves to `AtomFlags::NONE` unless registered.
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder { types: HashMap::new() }
    }

    pub fn get(&self, name: &FourCC) -> Option<&AtomType> {
        self.types.get(name)
    }

    /// Flags for `name`, `AtomFlags::NONE` when unknown.
    pub fn flags(&self, name: &FourCC) -> AtomFlags {
        self.get(name).map(|t| t.flags).unwrap_or(AtomFlags::NONE)
    }

    pub fn full_name(&self, name: &FourCC) -> &str {
        self.get(name).map(|t| t.full_name.as_ref()).unwrap_or("Unknown")
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AtomType> {
        self.types.values()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::standard()
    }
}

/// Collects entries before a [`Catalog`] is frozen.
#[derive(Debug, Clone)]
pub struct CatalogBuilder {
    types: HashMap<FourCC, AtomType>,
}

impl CatalogBuilder {
    /// A builder pre-filled with the built-in table.
    pub fn standard() -> Self {
        STANDARD.iter().fold(Catalog::builder(), |b, (code, flags, full)| {
            b.with_type(AtomType::new(FourCC(*code), *flags, *full))
        })
    }

    /// Register or replace an entry. `CONTAINER_END` is stripped: it is only
    /// ever produced by the reader.
    pub fn with_type(mut self, mut ty: AtomType) -> Self {
        ty.flags = ty.flags.difference(AtomFlags::CONTAINER_END);
        self.types.insert(ty.name, ty);
        self
    }

    pub fn with(self, name: FourCC, flags: AtomFlags) -> Self {
        let full = name.as_latin1();
        self.with_type(AtomType::new(name, flags, full))
    }

    pub fn build(self) -> Catalog {
        Catalog { types: self.types }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_has_required_entries() {
        let cat = Catalog::standard();
        assert_eq!(cat.flags(&FourCC(*b"ftyp")), AtomFlags::NONE);
        assert_eq!(cat.flags(&FourCC(*b"mdat")), AtomFlags::NONE);
        for code in [b"moov", b"udta", b"trak", b"mdia", b"minf", b"ilst"] {
            assert_eq!(cat.flags(&FourCC(*code)), AtomFlags::CONTAINER, "{code:?}");
        }
        assert_eq!(cat.flags(&FourCC::META), AtomFlags::CONTAINER | AtomFlags::SKIPPER);
        assert_eq!(cat.flags(&FourCC(*b"wide")), AtomFlags::TAGITEM);
        assert_eq!(cat.flags(&FourCC::TITLE), AtomFlags::TAGITEM);
        assert_eq!(cat.flags(&FourCC::SYNOPSIS), AtomFlags::TAGITEM);
    }

    #[test]
    fn unknown_codes_default_to_none() {
        let cat = Catalog::standard();
        assert_eq!(cat.flags(&FourCC(*b"zzzz")), AtomFlags::NONE);
        assert_eq!(cat.full_name(&FourCC(*b"zzzz")), "Unknown");
        assert_eq!(cat.full_name(&FourCC::MOOV), "Movie Box");
    }

    #[test]
    fn builder_extends_and_strips_container_end() {
        let cat = CatalogBuilder::standard()
            .with(FourCC(*b"stsd"), AtomFlags::CONTAINER | AtomFlags::CONTAINER_END)
            .build();
        assert_eq!(cat.flags(&FourCC(*b"stsd")), AtomFlags::CONTAINER);
        assert_eq!(cat.len(), Catalog::standard().len() + 1);
    }
}
