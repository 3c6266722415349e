//! Attribute parsing from raw tag content.

use super::entities::decode;
use super::events::Attribute;
use super::scanner::{is_name_byte, is_name_start_byte};
use std::borrow::Cow;

/// Parse the attribute region of a tag (everything between the element name
/// and the closing `>` / `/>`).
///
/// Lenient: tolerates valueless attributes (`<input disabled>`) and
/// unquoted values, both common in real-world markup.
pub fn parse_attributes(input: &[u8]) -> Vec<Attribute<'_>> {
    let mut attrs = Vec::new();
    let mut pos = 0;

    while pos < input.len() {
        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }
        if pos >= input.len() || input[pos] == b'/' || input[pos] == b'>' {
            break;
        }

        let name_start = pos;
        if !is_name_start_byte(input[pos]) {
            // Junk byte where a name should be; skip it.
            pos += 1;
            continue;
        }
        while pos < input.len() && is_name_byte(input[pos]) {
            pos += 1;
        }
        let name = &input[name_start..pos];

        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }

        if pos >= input.len() || input[pos] != b'=' {
            // Valueless attribute.
            attrs.push(Attribute::new(name, Cow::Borrowed(b"" as &[u8])));
            continue;
        }
        pos += 1;

        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }
        if pos >= input.len() {
            attrs.push(Attribute::new(name, Cow::Borrowed(b"" as &[u8])));
            break;
        }

        let quote = input[pos];
        if quote == b'"' || quote == b'\'' {
            pos += 1;
            let value_start = pos;
            while pos < input.len() && input[pos] != quote {
                pos += 1;
            }
            attrs.push(Attribute::new(name, decode(&input[value_start..pos])));
            if pos < input.len() {
                pos += 1;
            }
        } else {
            // Unquoted value runs to the next whitespace or tag close.
            let value_start = pos;
            while pos < input.len()
                && !is_whitespace(input[pos])
                && input[pos] != b'/'
                && input[pos] != b'>'
            {
                pos += 1;
            }
            attrs.push(Attribute::new(name, decode(&input[value_start..pos])));
        }
    }

    attrs
}

#[inline]
fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_attributes() {
        let attrs = parse_attributes(b" id=\"test\" class='foo'");
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].name, b"id");
        assert_eq!(attrs[0].value.as_ref(), b"test");
        assert_eq!(attrs[1].name, b"class");
        assert_eq!(attrs[1].value.as_ref(), b"foo");
    }

    #[test]
    fn test_entity_in_value() {
        let attrs = parse_attributes(b" title=\"&lt;hi&gt;\"");
        assert_eq!(attrs[0].value.as_ref(), b"<hi>");
    }

    #[test]
    fn test_valueless_attribute() {
        let attrs = parse_attributes(b" disabled checked=\"1\"");
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].name, b"disabled");
        assert_eq!(attrs[0].value.as_ref(), b"");
    }

    #[test]
    fn test_unquoted_value() {
        let attrs = parse_attributes(b" width=100 height=50");
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].value.as_ref(), b"100");
        assert_eq!(attrs[1].value.as_ref(), b"50");
    }

    #[test]
    fn test_whitespace_around_equals() {
        let attrs = parse_attributes(b"  id  =  \"x\"  ");
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].value.as_ref(), b"x");
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_attributes(b"").is_empty());
    }
}
