//! Byte decoding helpers for pages read from disk.

use std::borrow::Cow;

/// Decode page bytes to a string.
///
/// 1. UTF-8 (a BOM is handled by encoding_rs)
/// 2. the hinted encoding, usually from a `<meta charset>` declaration
/// 3. Windows-1252, a superset of ISO-8859-1
///
/// ```
/// use sitetext::util::decode_text;
///
/// assert_eq!(decode_text("héllo".as_bytes(), None), "héllo");
/// assert_eq!(decode_text(b"caf\xe9", None), "café");
/// ```
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

/// Find the charset declared by a `<meta charset="...">` tag near the start
/// of a page.
///
/// Only the first 1024 bytes are inspected, as browsers do.
pub fn extract_meta_charset(bytes: &[u8]) -> Option<&str> {
    let prefix = &bytes[..bytes.len().min(1024)];

    let pos = prefix
        .windows(8)
        .position(|w| w.eq_ignore_ascii_case(b"charset="))?;
    let rest = &prefix[pos + 8..];

    let (start, quote) = match rest.first()? {
        q @ (b'"' | b'\'') => (1, Some(*q)),
        _ => (0, None),
    };
    let value = &rest[start..];
    let end = value
        .iter()
        .position(|&b| match quote {
            Some(q) => b == q,
            None => b.is_ascii_whitespace() || matches!(b, b'"' | b'\'' | b'>' | b';' | b'/'),
        })
        .unwrap_or(value.len());

    let charset = std::str::from_utf8(&value[..end]).ok()?.trim();
    (!charset.is_empty()).then_some(charset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8_with_bom() {
        assert_eq!(decode_text(b"\xef\xbb\xbftest", None), "test");
    }

    #[test]
    fn test_decode_with_hint() {
        // "тест" in windows-1251
        let bytes = b"\xf2\xe5\xf1\xf2";
        assert_eq!(decode_text(bytes, Some("windows-1251")), "тест");
    }

    #[test]
    fn test_meta_charset() {
        assert_eq!(
            extract_meta_charset(b"<html><head><meta charset=\"iso-8859-2\">"),
            Some("iso-8859-2")
        );
        assert_eq!(
            extract_meta_charset(
                b"<meta http-equiv=\"Content-Type\" content=\"text/html; charset=windows-1251\">"
            ),
            Some("windows-1251")
        );
        assert_eq!(extract_meta_charset(b"<meta charset=utf-8>"), Some("utf-8"));
        assert_eq!(extract_meta_charset(b"<p>no charset</p>"), None);
    }
}
