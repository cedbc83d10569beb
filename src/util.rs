use std::fmt::Write;

/// Classic 16-bytes-per-row hex dump; `base` is the offset printed for the first byte.
pub fn hex_dump(bytes: &[u8], base: u64) -> String {
    let mut out = String::new();
    for (row, chunk) in bytes.chunks(16).enumerate() {
        let hexs: String = chunk.iter().map(|b| format!("{b:02x} ")).collect();
        let ascii: String = chunk
            .iter()
            .map(|&b| if (32..=126).contains(&b) { b as char } else { '.' })
            .collect();
        let _ = writeln!(out, "{:08x}  {:<48}  |{}|", base + row as u64 * 16, hexs, ascii);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_rows_and_ascii_column() {
        let data: Vec<u8> = (0x41..0x41 + 20).collect();
        let out = hex_dump(&data, 0x100);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("00000100  41 42 43"));
        assert!(lines[0].ends_with("|ABCDEFGHIJKLMNOP|"));
        assert!(lines[1].starts_with("00000110  51 52 53 54"));
    }

    #[test]
    fn non_printable_bytes_are_dotted() {
        let out = hex_dump(&[0xa9, b'n', 0x00], 0);
        assert!(out.contains("|.n.|"));
    }
}
