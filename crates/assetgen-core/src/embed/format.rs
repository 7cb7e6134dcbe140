//! Byte-array initializer formatting.
//!
//! Every octet is written as `0x` followed by exactly two uppercase hex
//! digits. Octets are separated by `", "`; when wrapping is enabled each line
//! holds at most `bytes_per_line` octets and ends with a trailing comma
//! except the last.

use std::fmt::Write as FmtWrite;

/// Indentation placed before every initializer line
pub const INDENT: &str = "    ";

/// Formats `bytes` as the body of a C array initializer.
///
/// Returns the indented initializer lines joined by newlines, without the
/// surrounding braces and without a final newline. A `bytes_per_line` of
/// zero keeps everything on one line. Empty input yields an empty string.
pub fn format_byte_array(bytes: &[u8], bytes_per_line: usize) -> String {
    if bytes.is_empty() {
        return String::new();
    }

    let per_line = if bytes_per_line == 0 {
        bytes.len()
    } else {
        bytes_per_line
    };

    // "0xAB, " is six characters; one indent per line
    let lines = bytes.len().div_ceil(per_line);
    let mut out = String::with_capacity(bytes.len() * 6 + lines * (INDENT.len() + 1));

    for (line_no, chunk) in bytes.chunks(per_line).enumerate() {
        if line_no > 0 {
            out.push_str(",\n");
        }
        out.push_str(INDENT);
        for (i, byte) in chunk.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            write!(out, "0x{:02X}", byte).expect("String write cannot fail");
        }
    }

    out
}

#[cfg(test)]
pub(crate) fn parse_byte_array(body: &str) -> Vec<u8> {
    body.split(',')
        .map(str::trim)
        .filter(|tok| !tok.is_empty())
        .map(|tok| {
            let hex = tok.strip_prefix("0x").expect("0x prefix");
            assert_eq!(hex.len(), 2, "fixed-width hex: {tok}");
            u8::from_str_radix(hex, 16).expect("hex octet")
        })
        .collect()
}
