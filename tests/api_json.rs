mod common;

use common::{TITLE, atom, itunes_file, tag};
use mp4atoms::FourCC;
use mp4atoms::api::{dump_payloads, list_atoms, list_atoms_from_path, read_metadata};
use serde_json::Value;
use std::io::{Cursor, Write};

fn sample() -> Vec<u8> {
    itunes_file(&[
        tag(&TITLE, "Sintel"),
        tag(b"ldes", "A girl and her dragon."),
        tag(&[0xA9, b'A', b'R', b'T'], "Blender Foundation"),
    ])
}

#[test]
fn listing_from_a_file_serializes() {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file failed");
    file.write_all(&sample()).expect("write temp data failed");

    let atoms = list_atoms_from_path(file.path()).expect("list_atoms failed");
    assert_eq!(atoms[0].typ, "ftyp");
    assert_eq!(atoms[0].offset, 0);
    assert_eq!(atoms[0].header_size, 8);
    assert_eq!(atoms[0].payload_size, 12);
    assert_eq!(atoms[0].full_name, "File Type Box");

    let json = serde_json::to_string(&atoms).expect("serialize to JSON failed");
    let v: Value = serde_json::from_str(&json).expect("parse JSON failed");
    let arr = v.as_array().unwrap();
    assert_eq!(arr.len(), atoms.len());

    let title = arr.iter().find(|a| a["typ_hex"] == "a96e616d").expect("title listed");
    assert_eq!(title["kind"], "tag");
    assert_eq!(title["text"], "Sintel");
    assert_eq!(title["depth"], 4);

    let moov = arr.iter().find(|a| a["typ"] == "moov").unwrap();
    assert_eq!(moov["kind"], "container");
    assert_eq!(moov["flags"], "Container");
    assert!(moov["text"].is_null());
}

#[test]
fn listing_has_no_end_markers_and_keeps_order() {
    let atoms = list_atoms(Cursor::new(sample())).unwrap();
    let types: Vec<&str> = atoms.iter().map(|a| a.typ.as_str()).collect();
    assert_eq!(
        types,
        vec![
            "ftyp", "mdat", "moov", "mvhd", "trak", "tkhd", "mdia", "mdhd", "udta", "meta", "hdlr", "ilst",
            "©nam", "ldes", "©ART",
        ]
    );
}

#[test]
fn metadata_in_one_pass() {
    let meta = read_metadata(Cursor::new(sample())).unwrap();
    assert_eq!(meta.title.as_deref(), Some("Sintel"));
    assert_eq!(meta.synopsis.as_deref(), Some("A girl and her dragon."));
    assert_eq!(meta.tags.len(), 3);
    assert_eq!(meta.tags[2].name, "©ART");
    assert_eq!(meta.tags[2].full_name, "Artist");
    assert_eq!(meta.tags[2].text, "Blender Foundation");
}

#[test]
fn top_level_wide_is_not_treated_as_a_tag() {
    let bytes = [atom(b"wide", &[]), atom(b"mdat", &[1, 2, 3])].concat();
    let meta = read_metadata(Cursor::new(bytes.clone())).unwrap();
    assert!(meta.tags.is_empty());
    let atoms = list_atoms(Cursor::new(bytes)).unwrap();
    assert_eq!(atoms[0].text, None);
}

#[test]
fn payload_dumps() {
    let payload: Vec<u8> = (0..32).collect();
    let bytes = [atom(b"free", &[]), atom(b"abcd", &payload), atom(b"abcd", b"XY")].concat();

    let dumps = dump_payloads(Cursor::new(bytes.clone()), FourCC(*b"abcd"), 20).unwrap();
    assert_eq!(dumps.len(), 2);
    assert_eq!(dumps[0].offset, 8);
    assert_eq!(dumps[0].length, 20);
    assert!(dumps[0].hex.starts_with("00000010  00 01 02"));
    assert_eq!(dumps[1].length, 2);
    assert!(dumps[1].hex.contains("|XY|"));

    let whole = dump_payloads(Cursor::new(bytes), FourCC(*b"abcd"), 0).unwrap();
    assert_eq!(whole[0].length, 32);
}
