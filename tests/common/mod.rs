#![allow(dead_code)]

pub const TITLE: [u8; 4] = [0xA9, b'n', b'a', b'm'];

/// Plain 8-byte-header atom.
pub fn atom(name: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&(8 + payload.len() as u32).to_be_bytes());
    v.extend_from_slice(name);
    v.extend_from_slice(payload);
    v
}

/// Atom using the 64-bit size extension (size field 1).
pub fn wide_atom(name: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&1u32.to_be_bytes());
    v.extend_from_slice(name);
    v.extend_from_slice(&(16 + payload.len() as u64).to_be_bytes());
    v.extend_from_slice(payload);
    v
}

pub fn container(name: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
    atom(name, &children.concat())
}

/// `meta` atom: version/flags word, then the children.
pub fn meta(children: &[Vec<u8>]) -> Vec<u8> {
    let mut payload = vec![0u8; 4];
    payload.extend_from_slice(&children.concat());
    atom(b"meta", &payload)
}

/// iTunes tag: `name` wrapping a `data` atom whose 16-byte header precedes the text.
pub fn tag(name: &[u8; 4], text: &str) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&(16 + text.len() as u32).to_be_bytes());
    data.extend_from_slice(b"data");
    data.extend_from_slice(&1u32.to_be_bytes()); // well-known type: UTF-8
    data.extend_from_slice(&0u32.to_be_bytes()); // locale
    data.extend_from_slice(text.as_bytes());
    atom(name, &data)
}

pub fn ftyp() -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(b"M4V ");
    payload.extend_from_slice(&512u32.to_be_bytes());
    payload.extend_from_slice(b"isom");
    atom(b"ftyp", &payload)
}

/// ftyp, mdat, then moov holding one track and the iTunes tag list.
pub fn itunes_file(tags: &[Vec<u8>]) -> Vec<u8> {
    let trak = container(b"trak", &[atom(b"tkhd", &[0u8; 84]), container(b"mdia", &[atom(b"mdhd", &[0u8; 24])])]);
    let hdlr = atom(b"hdlr", &[0u8; 25]);
    let udta = container(b"udta", &[meta(&[hdlr, container(b"ilst", tags)])]);
    let moov = container(b"moov", &[atom(b"mvhd", &[0u8; 100]), trak, udta]);
    [ftyp(), atom(b"mdat", &[0x55u8; 64]), moov].concat()
}
