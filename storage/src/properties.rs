//! # Properties Text Format
//!
//! Line-oriented `key=value` files in the common `.properties` dialect.
//!
//! Reading accepts:
//! - `#` and `!` comment lines, blank lines
//! - `=`, `:` or whitespace between key and value
//! - backslash escapes (`\t`, `\n`, `\r`, `\f`, `\uXXXX`, and any escaped
//!   literal character)
//! - line continuation with a trailing backslash
//!
//! Writing emits one `key=value` per line in key order, escaping whatever
//! the reader would otherwise interpret.

use errors::StorageError;
use std::collections::BTreeMap;

/// Parses properties text into a key/value map. Later duplicates win.
pub fn parse(input: &str) -> Result<BTreeMap<String, String>, StorageError> {
    let mut values = BTreeMap::new();
    let mut lines = input.lines();

    while let Some(raw) = lines.next() {
        let line = trim_leading(raw);
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }

        let mut logical = line.to_string();
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(trim_leading(next)),
                None => break,
            }
        }

        let (key, value) = split_entry(&logical);
        values.insert(unescape(key)?, unescape(value)?);
    }

    Ok(values)
}

/// Renders a key/value map as properties text, preceded by `header` as a
/// comment block when given.
pub fn render(values: &BTreeMap<String, String>, header: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(header) = header {
        for line in header.lines() {
            out.push_str("# ");
            out.push_str(line);
            out.push('\n');
        }
    }
    for (key, value) in values {
        out.push_str(&escape(key, true));
        out.push('=');
        out.push_str(&escape(value, false));
        out.push('\n');
    }
    out
}

fn trim_leading(line: &str) -> &str {
    line.trim_start_matches([' ', '\t', '\x0c'])
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

/// Splits a logical line at the first unescaped separator.
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' | ' ' | '\t' | '\x0c' => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let mut rest = trim_leading(&line[key_end..]);
    if let Some(stripped) = rest.strip_prefix(['=', ':']) {
        rest = trim_leading(stripped);
    }
    (key, rest)
}

fn unescape(input: &str) -> Result<String, StorageError> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let high = read_code_unit(&mut chars)?;
                if (0xD800..0xDC00).contains(&high) {
                    // Surrogate pair: the low half must follow as another escape.
                    if chars.next() != Some('\\') || chars.next() != Some('u') {
                        return Err(malformed("unpaired surrogate in \\u escape"));
                    }
                    let low = read_code_unit(&mut chars)?;
                    let decoded = char::decode_utf16([high, low])
                        .next()
                        .and_then(Result::ok)
                        .ok_or_else(|| malformed("invalid surrogate pair in \\u escape"))?;
                    out.push(decoded);
                } else {
                    let decoded = char::from_u32(u32::from(high))
                        .ok_or_else(|| malformed("invalid \\u escape"))?;
                    out.push(decoded);
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}

fn read_code_unit(chars: &mut std::str::Chars<'_>) -> Result<u16, StorageError> {
    let digits: String = chars.by_ref().take(4).collect();
    if digits.len() != 4 {
        return Err(malformed("truncated \\u escape"));
    }
    u16::from_str_radix(&digits, 16).map_err(|_| malformed("non-hex digit in \\u escape"))
}

fn escape(input: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for (i, c) in input.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x0c' => out.push_str("\\f"),
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            '=' | ':' | '#' | '!' if is_key => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

fn malformed(reason: &str) -> StorageError {
    StorageError::SerializationError {
        error_type: "properties".to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_simple_entries() {
        let parsed = parse("testProperty1=testValue1\ntestProperty2=testValue2\n").unwrap();
        assert_eq!(
            parsed,
            map(&[("testProperty1", "testValue1"), ("testProperty2", "testValue2")])
        );
    }

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let input = "#comment\n! another\n\n   \nkey=value\n";
        assert_eq!(parse(input).unwrap(), map(&[("key", "value")]));
    }

    #[test]
    fn test_parse_alternative_separators() {
        let input = "a:1\nb = 2\nc 3\n  d\t=\t4\ne\n";
        assert_eq!(
            parse(input).unwrap(),
            map(&[("a", "1"), ("b", "2"), ("c", "3"), ("d", "4"), ("e", "")])
        );
    }

    #[test]
    fn test_parse_value_keeps_inner_separators() {
        let parsed = parse("url=http://host:4001/path?a=b\n").unwrap();
        assert_eq!(parsed["url"], "http://host:4001/path?a=b");
    }

    #[test]
    fn test_parse_escaped_key_characters() {
        let parsed = parse("my\\ key\\=x=v\n").unwrap();
        assert_eq!(parsed["my key=x"], "v");
    }

    #[test]
    fn test_parse_line_continuation() {
        let input = "list=one, \\\n      two, \\\n      three\nnext=1\n";
        let parsed = parse(input).unwrap();
        assert_eq!(parsed["list"], "one, two, three");
        assert_eq!(parsed["next"], "1");
    }

    #[test]
    fn test_parse_even_backslashes_do_not_continue() {
        let parsed = parse("path=C:\\\\\nnext=1\n").unwrap();
        assert_eq!(parsed["path"], "C:\\");
        assert_eq!(parsed["next"], "1");
    }

    #[test]
    fn test_parse_unicode_escapes() {
        let parsed = parse("greeting=caf\\u00e9 \\uD83D\\uDE00\n").unwrap();
        assert_eq!(parsed["greeting"], "café 😀");
    }

    #[test]
    fn test_parse_rejects_truncated_unicode_escape() {
        let result = parse("bad=\\u12\n");
        assert!(matches!(result, Err(StorageError::SerializationError { .. })));
    }

    #[test]
    fn test_parse_rejects_lone_surrogate() {
        assert!(parse("bad=\\uD83D\n").is_err());
    }

    #[test]
    fn test_parse_crlf_line_endings() {
        let parsed = parse("a=1\r\nb=2\r\n").unwrap();
        assert_eq!(parsed, map(&[("a", "1"), ("b", "2")]));
    }

    #[test]
    fn test_render_sorted_with_header() {
        let rendered = render(&map(&[("b", "2"), ("a", "1")]), Some("CIAO configuration"));
        assert_eq!(rendered, "# CIAO configuration\na=1\nb=2\n");
    }

    #[test]
    fn test_render_escapes_special_characters() {
        let rendered = render(&map(&[("a key:x", " lead\ttab\\")]), None);
        assert_eq!(rendered, "a\\ key\\:x=\\ lead\\ttab\\\\\n");
    }

    #[test]
    fn test_render_then_parse_preserves_awkward_values() {
        let values = map(&[
            ("#hash", "value # not a comment"),
            ("multi", "line one\nline two"),
            ("spaces", "  padded  "),
            ("unicode", "naïve ☃"),
            ("empty", ""),
        ]);
        assert_eq!(parse(&render(&values, Some("header"))).unwrap(), values);
    }
}
