//! Entity decoding for text and attribute content.
//!
//! Handles the five predefined entities and numeric character references.
//! Unknown entity names pass through verbatim so lenient parsing never
//! drops content. Uses Cow to stay zero-copy when no `&` is present.

use memchr::memchr;
use std::borrow::Cow;

/// Decode entity references in content.
///
/// Returns Borrowed when the input contains no `&` (the common case).
#[inline]
pub fn decode(input: &[u8]) -> Cow<'_, [u8]> {
    if memchr(b'&', input).is_none() {
        return Cow::Borrowed(input);
    }
    Cow::Owned(decode_slow(input))
}

fn decode_slow(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut pos = 0;

    while pos < input.len() {
        let Some(amp) = memchr(b'&', &input[pos..]) else {
            out.extend_from_slice(&input[pos..]);
            break;
        };
        out.extend_from_slice(&input[pos..pos + amp]);
        pos += amp;

        // A reference runs to the next ';'. Bare or unterminated '&' is
        // kept as-is.
        match memchr(b';', &input[pos..]) {
            Some(semi) => {
                let name = &input[pos + 1..pos + semi];
                match decode_one(name) {
                    Some(decoded) => {
                        let mut buf = [0u8; 4];
                        out.extend_from_slice(decoded.encode_utf8(&mut buf).as_bytes());
                        pos += semi + 1;
                    }
                    None => {
                        out.push(b'&');
                        pos += 1;
                    }
                }
            }
            None => {
                out.push(b'&');
                pos += 1;
            }
        }
    }

    out
}

/// Decode a single reference body (between `&` and `;`).
fn decode_one(name: &[u8]) -> Option<char> {
    match name {
        b"lt" => Some('<'),
        b"gt" => Some('>'),
        b"amp" => Some('&'),
        b"quot" => Some('"'),
        b"apos" => Some('\''),
        [b'#', rest @ ..] => decode_char_ref(rest),
        _ => None,
    }
}

fn decode_char_ref(body: &[u8]) -> Option<char> {
    let codepoint = match body {
        [b'x' | b'X', hex @ ..] => {
            u32::from_str_radix(std::str::from_utf8(hex).ok()?, 16).ok()?
        }
        dec => std::str::from_utf8(dec).ok()?.parse::<u32>().ok()?,
    };
    char::from_u32(codepoint)
}

/// Escape content for XML output.
pub fn encode(input: &str) -> Cow<'_, str> {
    if !input
        .bytes()
        .any(|b| matches!(b, b'<' | b'>' | b'&' | b'"' | b'\''))
    {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_entities_is_borrowed() {
        let result = decode(b"Hello, World!");
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result.as_ref(), b"Hello, World!");
    }

    #[test]
    fn test_predefined_entities() {
        let result = decode(b"&lt;a&gt; &amp; &quot;b&quot; &apos;c&apos;");
        assert_eq!(result.as_ref(), b"<a> & \"b\" 'c'");
    }

    #[test]
    fn test_numeric_references() {
        assert_eq!(decode(b"&#65;&#66;").as_ref(), b"AB");
        assert_eq!(decode(b"&#x41;&#x42;").as_ref(), b"AB");
    }

    #[test]
    fn test_unicode_reference() {
        let result = decode(b"&#x1F600;");
        assert_eq!(std::str::from_utf8(result.as_ref()).unwrap(), "\u{1F600}");
    }

    #[test]
    fn test_unknown_entity_passes_through() {
        assert_eq!(decode(b"&nosuch; & rest").as_ref(), b"&nosuch; & rest");
    }

    #[test]
    fn test_encode_round_trip() {
        let encoded = encode("<a> & \"b\"");
        assert_eq!(encoded.as_ref(), "&lt;a&gt; &amp; &quot;b&quot;");
        assert_eq!(decode(encoded.as_bytes()).as_ref(), b"<a> & \"b\"");
    }
}
