//! Text decoding, escaping and filename helpers shared by the package modules.

use std::borrow::Cow;

/// Decode bytes to a string, handling various encodings.
///
/// This function:
/// 1. First tries UTF-8 (handles BOM automatically via encoding_rs)
/// 2. If malformed, tries the hint encoding (from `<?xml encoding="..."?>`)
/// 3. Falls back to Windows-1252
///
/// Uses `Cow<str>` to avoid allocation when the input is valid UTF-8.
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Extract the encoding name from an XML declaration.
///
/// Only the first 100 bytes are inspected. Returns `None` when there is no
/// declaration or it carries no `encoding` pseudo-attribute.
pub fn extract_xml_encoding(bytes: &[u8]) -> Option<&str> {
    let check_len = bytes.len().min(100);
    let prefix = &bytes[..check_len];

    let xml_start = prefix.windows(5).position(|w| w == b"<?xml")?;
    let after_xml = &prefix[xml_start..];

    let enc_pos = after_xml
        .windows(9)
        .position(|w| w.eq_ignore_ascii_case(b"encoding="))?;
    let after_enc = &after_xml[enc_pos + 9..];

    let quote = *after_enc.first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }

    let value_end = after_enc[1..].iter().position(|&b| b == quote)? + 1;
    std::str::from_utf8(&after_enc[1..value_end]).ok()
}

/// Escape a string for use inside a double-quoted XML attribute.
pub fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\n', "&#xA;")
        .replace('\r', "&#xD;")
        .replace('\t', "&#x9;")
}

/// Escape a string for use as XML character data.
///
/// Carriage returns are written as references so they survive line-ending
/// normalization on the next parse.
pub fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\r', "&#xD;")
}

/// Produce the next filename in a numbered sequence.
///
/// A trailing run of digits in the stem is incremented, keeping its width
/// (`Spread_ub9.xml` -> `Spread_ub10.xml`, `Page_007.xml` -> `Page_008.xml`).
/// A stem without trailing digits gets `1` appended.
pub fn increment_filename(name: &str) -> String {
    let (dir, file) = match name.rfind('/') {
        Some(pos) => (&name[..=pos], &name[pos + 1..]),
        None => ("", name),
    };
    let (stem, ext) = match file.rfind('.') {
        Some(pos) => (&file[..pos], &file[pos..]),
        None => (file, ""),
    };

    let digits_start = stem
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i);

    let new_stem = match digits_start {
        Some(start) => {
            let digits = &stem[start..];
            let next = digits.parse::<u128>().map(|n| n + 1).unwrap_or(1);
            format!("{}{:0width$}", &stem[..start], next, width = digits.len())
        }
        None => format!("{stem}1"),
    };

    format!("{dir}{new_stem}{ext}")
}

// ============================================================================
// Tests
// ============================================================================
