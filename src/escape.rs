//! JSON string escaping and unescaping.

use crate::error::{Error, Result};

/// Appends `value` to `out` as the body of a JSON string (no surrounding quotes).
pub(crate) fn escape_into(out: &mut Vec<u8>, value: &str) {
    let bytes = value.as_bytes();
    let mut run_start = 0;
    for (i, &byte) in bytes.iter().enumerate() {
        let escape: &[u8] = match byte {
            b'"' => b"\\\"",
            b'\\' => b"\\\\",
            b'\n' => b"\\n",
            b'\r' => b"\\r",
            b'\t' => b"\\t",
            0x08 => b"\\b",
            0x0C => b"\\f",
            0x00..=0x1F => {
                out.extend_from_slice(&bytes[run_start..i]);
                out.extend_from_slice(format!("\\u{:04x}", byte).as_bytes());
                run_start = i + 1;
                continue;
            }
            _ => continue,
        };
        out.extend_from_slice(&bytes[run_start..i]);
        out.extend_from_slice(escape);
        run_start = i + 1;
    }
    out.extend_from_slice(&bytes[run_start..]);
}

pub(crate) fn escape(value: &str) -> String {
    let mut out = Vec::with_capacity(value.len() + 2);
    escape_into(&mut out, value);
    // Only ASCII escapes are inserted between untouched UTF-8 runs.
    String::from_utf8(out).unwrap_or_default()
}

#[inline]
pub(crate) fn needs_escape(value: &str) -> bool {
    value
        .bytes()
        .any(|b| b == b'"' || b == b'\\' || b < 0x20)
}

/// Decodes the escape sequence whose backslash sits at `at`. Returns the
/// character and the offset just past the sequence. Surrogates must come in
/// high/low pairs. `base` is added to error offsets.
pub(crate) fn decode_escape(bytes: &[u8], at: usize, base: usize) -> Result<(char, usize)> {
    let code = *bytes
        .get(at + 1)
        .ok_or_else(|| Error::syntax(base + at, "unterminated escape sequence"))?;
    let simple = match code {
        b'"' => '"',
        b'\\' => '\\',
        b'/' => '/',
        b'b' => '\u{8}',
        b'f' => '\u{c}',
        b'n' => '\n',
        b'r' => '\r',
        b't' => '\t',
        b'u' => return decode_unicode(bytes, at, base),
        _ => return Err(Error::syntax(base + at, "invalid escape sequence")),
    };
    Ok((simple, at + 2))
}

fn decode_unicode(bytes: &[u8], at: usize, base: usize) -> Result<(char, usize)> {
    let high = read_hex4(bytes, at + 2, base)?;
    let (scalar, end) = match high {
        0xD800..=0xDBFF => {
            if bytes.get(at + 6) != Some(&b'\\') || bytes.get(at + 7) != Some(&b'u') {
                return Err(Error::syntax(base + at, "unpaired high surrogate"));
            }
            let low = read_hex4(bytes, at + 8, base)?;
            if !(0xDC00..=0xDFFF).contains(&low) {
                return Err(Error::syntax(base + at + 6, "invalid low surrogate"));
            }
            (0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00), at + 12)
        }
        0xDC00..=0xDFFF => return Err(Error::syntax(base + at, "unpaired low surrogate")),
        _ => (high, at + 6),
    };
    let ch = char::from_u32(scalar)
        .ok_or_else(|| Error::syntax(base + at, "invalid unicode code point"))?;
    Ok((ch, end))
}

/// Decodes the body of a JSON string. `base` is the body's offset in the
/// document, used for error positions.
pub(crate) fn unescape(body: &[u8], base: usize) -> Result<String> {
    let mut out = Vec::with_capacity(body.len());
    let mut i = 0;
    while i < body.len() {
        let byte = body[i];
        if byte != b'\\' {
            out.push(byte);
            i += 1;
            continue;
        }
        let (ch, next) = decode_escape(body, i, base)?;
        let mut utf8 = [0u8; 4];
        out.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
        i = next;
    }
    String::from_utf8(out).map_err(|e| Error::InvalidUtf8 {
        offset: base + e.utf8_error().valid_up_to(),
    })
}

fn read_hex4(bytes: &[u8], at: usize, base: usize) -> Result<u32> {
    let digits = bytes
        .get(at..at + 4)
        .ok_or_else(|| Error::syntax(base + at, "expected 4 hex digits"))?;
    digits.iter().try_fold(0u32, |acc, &d| {
        (d as char)
            .to_digit(16)
            .map(|nibble| (acc << 4) | nibble)
            .ok_or_else(|| Error::syntax(base + at, "invalid hex digit in unicode escape"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_control_characters() {
        assert_eq!(escape("a\"b\\c"), "a\\\"b\\\\c");
        assert_eq!(escape("line\nbreak\ttab"), "line\\nbreak\\ttab");
        assert_eq!(escape("\u{1}"), "\\u0001");
        assert_eq!(escape("héllo"), "héllo");
        assert!(!needs_escape("plain text"));
        assert!(needs_escape("quote\""));
    }

    #[test]
    fn test_unescape_sequences() {
        assert_eq!(unescape(br#"a\nb\/cA"#, 0).unwrap(), "a\nb/cA");
        assert_eq!(unescape(br#"\ud83d\ude00"#, 0).unwrap(), "😀");
        assert_eq!(unescape(br#"\u0041\u00e9"#, 0).unwrap(), "Aé");
    }

    #[test]
    fn test_unescape_errors() {
        assert!(unescape(br#"\x"#, 0).is_err());
        assert!(unescape(br#"\ud83d"#, 0).is_err());
        assert!(unescape(br#"\ude00"#, 0).is_err());
        assert!(unescape(br#"\u12"#, 0).is_err());
        assert!(unescape(b"\\", 0).is_err());
    }

    #[test]
    fn test_decode_escape_offsets() {
        let doc = br#"xx\ud83d\ude00yy"#;
        assert_eq!(decode_escape(doc, 2, 0).unwrap(), ('😀', 14));
        assert_eq!(decode_escape(br#"\t"#, 0, 0).unwrap(), ('\t', 2));
        assert_eq!(
            decode_escape(br#"ab\ude00"#, 2, 100),
            Err(Error::syntax(102, "unpaired low surrogate"))
        );
    }

    #[test]
    fn test_escape_then_unescape() {
        let original = "tab\t\"quoted\" \\ \u{7f} \u{1f} ünï";
        assert_eq!(unescape(escape(original).as_bytes(), 0).unwrap(), original);
    }
}
