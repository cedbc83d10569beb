use crate::{
    atom::{AtomEvent, AtomFlags, FourCC},
    reader::AtomReader,
    source::AtomSource,
    util::hex_dump,
};
use serde::Serialize;
use std::{fs::File, path::Path};

/// A JSON-serializable description of one atom, as seen by a full walk.
#[derive(Debug, Serialize)]
pub struct AtomSummary {
    /// Header position from the start of the source
    pub offset: u64,
    /// Total size including header
    pub size: u64,
    /// 8, or 16 with the 64-bit size extension
    pub header_size: u64,
    pub payload_size: u64,
    /// Nesting level, 0 for top-level atoms
    pub depth: usize,
    /// Type code with non-printable bytes shown as '.'
    pub typ: String,
    /// Raw type code bytes, hex encoded (e.g. "a96e616d" for the title tag)
    pub typ_hex: String,
    pub flags: String,
    /// "container", "tag" or "leaf"
    pub kind: String,
    pub full_name: String,
    /// Text of iTunes tags found directly inside `ilst`
    pub text: Option<String>,
}

/// One text tag from the `ilst` item list.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub full_name: String,
    pub text: String,
}

/// Text metadata gathered in a single walk.
#[derive(Debug, Default, Serialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub synopsis: Option<String>,
    pub tags: Vec<Tag>,
}

/// Hex dump of one atom's payload.
#[derive(Debug, Serialize)]
pub struct PayloadDump {
    /// Header position of the atom
    pub offset: u64,
    /// Bytes actually read; may be short at end of stream
    pub length: u64,
    pub hex: String,
}

/// Tracks which container each event sits in during a default walk.
#[derive(Default)]
struct Nesting {
    open: Vec<FourCC>,
}

impl Nesting {
    fn parent(&self) -> Option<&FourCC> {
        self.open.last()
    }

    /// Update after the reader has handed out `atom` and the caller is done with it.
    fn track(&mut self, atom: &AtomEvent, entered: bool) {
        if atom.is_container_end() {
            self.open.pop();
        } else if atom.is_container() && entered {
            self.open.push(atom.name);
        }
    }
}

fn is_ilst_tag(atom: &AtomEvent, nesting: &Nesting) -> bool {
    atom.flags.contains(AtomFlags::TAGITEM) && nesting.parent() == Some(&FourCC::ILST)
}

/// Walk every atom and describe it.
///
/// # Example
/// ```no_run
/// use mp4atoms::api::list_atoms;
/// use std::fs::File;
///
/// let atoms = list_atoms(File::open("movie.m4v")?)?;
/// println!("{}", serde_json::to_string_pretty(&atoms)?);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn list_atoms<S: AtomSource>(source: S) -> anyhow::Result<Vec<AtomSummary>> {
    summarize(&mut AtomReader::new(source))
}

pub fn list_atoms_from_path(path: impl AsRef<Path>) -> anyhow::Result<Vec<AtomSummary>> {
    list_atoms(File::open(path)?)
}

/// Drive `reader` to the end, describing every atom it produces.
pub fn summarize<S: AtomSource>(reader: &mut AtomReader<S>) -> anyhow::Result<Vec<AtomSummary>> {
    let mut nesting = Nesting::default();
    let mut out = Vec::new();

    while let Some(atom) = reader.next_atom()? {
        if atom.is_container_end() {
            nesting.track(&atom, false);
            continue;
        }
        let text = if is_ilst_tag(&atom, &nesting) {
            Some(reader.read_current_text()?)
        } else {
            None
        };
        let kind = if atom.is_container() {
            "container"
        } else if atom.flags.contains(AtomFlags::TAGITEM) {
            "tag"
        } else {
            "leaf"
        };
        out.push(AtomSummary {
            offset: atom.offset,
            size: atom.size,
            header_size: atom.header_len(),
            payload_size: atom.data_size,
            depth: atom.depth,
            typ: atom.name.to_string(),
            typ_hex: hex::encode(atom.name.0),
            flags: atom.flags.to_string(),
            kind: kind.to_string(),
            full_name: reader.catalog().full_name(&atom.name).to_string(),
            text,
        });
        nesting.track(&atom, true);
    }
    Ok(out)
}

/// Collect every text tag in `ilst`, in one pass over the source.
pub fn read_metadata<S: AtomSource>(source: S) -> anyhow::Result<Metadata> {
    collect_metadata(&mut AtomReader::new(source))
}

pub fn collect_metadata<S: AtomSource>(reader: &mut AtomReader<S>) -> anyhow::Result<Metadata> {
    let mut nesting = Nesting::default();
    let mut meta = Metadata::default();

    while let Some(atom) = reader.next_atom()? {
        if is_ilst_tag(&atom, &nesting) {
            let text = reader.read_current_text()?;
            if atom.name == FourCC::TITLE && meta.title.is_none() {
                meta.title = Some(text.clone());
            } else if atom.name == FourCC::SYNOPSIS && meta.synopsis.is_none() {
                meta.synopsis = Some(text.clone());
            }
            meta.tags.push(Tag {
                name: atom.name.as_latin1(),
                full_name: reader.catalog().full_name(&atom.name).to_string(),
                text,
            });
        }
        nesting.track(&atom, true);
    }
    Ok(meta)
}

/// Hex-dump the payload of every leaf atom named `name`, at most `max_len`
/// bytes each (0 means the whole payload).
pub fn dump_payloads<S: AtomSource>(
    source: S,
    name: FourCC,
    max_len: u64,
) -> anyhow::Result<Vec<PayloadDump>> {
    collect_payloads(&mut AtomReader::new(source), name, max_len)
}

pub fn collect_payloads<S: AtomSource>(
    reader: &mut AtomReader<S>,
    name: FourCC,
    max_len: u64,
) -> anyhow::Result<Vec<PayloadDump>> {
    let limit = if max_len == 0 { u64::MAX } else { max_len };
    let mut dumps = Vec::new();

    while let Some(atom) = reader.next_atom()? {
        if atom.name != name || atom.is_container() || atom.is_container_end() {
            continue;
        }
        let bytes = reader.read_current_head(limit)?;
        let payload_start = atom.offset.saturating_add(atom.header_len());
        dumps.push(PayloadDump {
            offset: atom.offset,
            length: bytes.len() as u64,
            hex: hex_dump(&bytes, payload_start),
        });
    }
    Ok(dumps)
}
