pub mod api;
pub mod atom;
pub mod catalog;
pub mod parser;
pub mod reader;
pub mod source;
pub mod util;

pub use atom::{AtomEvent, AtomFlags, ConsumeState, FourCC};
pub use catalog::{AtomType, Catalog, CatalogBuilder};
pub use parser::{AtomHeader, ParseError, Result, read_atom_header};
pub use reader::{AtomReader, Events, SearchPath, TAG_PREFIX_LEN};
pub use source::{AtomSource, Counted, ForwardOnly, SourceStats};
