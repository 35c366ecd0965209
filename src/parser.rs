use std::borrow::Cow;
use std::io::BufRead;

use tracing::debug;

use crate::error::Error;
use crate::model::EnvMap;

/// Parse `.env` text into a key-unique mapping.
///
/// Blank lines, `#` comments, and lines without `=` are skipped. Keys and
/// values are trimmed, and one layer of matching `'` or `"` quotes is
/// removed from the value.
pub fn parse_str(input: &str) -> EnvMap {
    let normalized = normalize_newlines(input);

    let mut map = EnvMap::new();
    for (idx, line) in normalized.split('\n').enumerate() {
        if let Some((key, value)) = parse_line(line, idx + 1) {
            map.insert(key, value);
        }
    }
    map
}

/// Parse `.env` content from UTF-8 bytes.
pub fn parse_bytes(input: &[u8]) -> Result<EnvMap, Error> {
    let text = std::str::from_utf8(input)?;
    Ok(parse_str(text))
}

/// Parse `.env` content from a buffered reader.
pub fn parse_reader<R: BufRead>(mut reader: R) -> Result<EnvMap, Error> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    parse_bytes(&buf)
}

fn normalize_newlines(input: &str) -> Cow<'_, str> {
    if !input.contains('\r') {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\r' {
            out.push('\n');
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            continue;
        }
        out.push(ch);
    }

    Cow::Owned(out)
}

fn parse_line(line: &str, line_num: usize) -> Option<(&str, &str)> {
    let working = line.trim();
    if working.is_empty() || working.starts_with('#') {
        return None;
    }

    let Some((key, value)) = working.split_once('=') else {
        debug!(line = line_num, "skipping line without `=`");
        return None;
    };

    let key = key.trim();
    if key.is_empty() {
        debug!(line = line_num, "skipping line with empty key");
        return None;
    }

    Some((key, unquote(value.trim())))
}

pub(crate) fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2
            && let Some(inner) = value
                .strip_prefix(quote)
                .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_basic_values_and_comments() {
        let input = "A=1\nB = 2\n# skip\n\n   \nD=\n";
        let parsed = parse_str(input);

        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed.get("A"), Some("1"));
        assert_eq!(parsed.get("B"), Some("2"));
        assert_eq!(parsed.get("D"), Some(""));
    }

    #[test]
    fn splits_on_first_equals_only() {
        let parsed = parse_str("URL=postgres://u:p@host/db?sslmode=require\n");
        assert_eq!(
            parsed.get("URL"),
            Some("postgres://u:p@host/db?sslmode=require")
        );
    }

    #[test]
    fn skips_lines_without_separator() {
        let parsed = parse_str("A=1\nBAD LINE\nB=2\n");

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.keys().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn skips_empty_keys() {
        let parsed = parse_str("=orphan\n  = also\nA=1\n");
        assert_eq!(parsed.keys().collect::<Vec<_>>(), vec!["A"]);
    }

    #[test]
    fn strips_one_layer_of_matching_quotes() {
        let input = "D=\"double\"\nS='single'\nNESTED=\"'inner'\"\nMIXED=\"oops'\nLONE=\"\nPAIR=\"\"\n";
        let parsed = parse_str(input);

        assert_eq!(parsed.get("D"), Some("double"));
        assert_eq!(parsed.get("S"), Some("single"));
        assert_eq!(parsed.get("NESTED"), Some("'inner'"));
        assert_eq!(parsed.get("MIXED"), Some("\"oops'"));
        assert_eq!(parsed.get("LONE"), Some("\""));
        assert_eq!(parsed.get("PAIR"), Some(""));
    }

    #[test]
    fn does_not_strip_quotes_from_keys() {
        let parsed = parse_str("\"A\"=1\n");
        assert_eq!(parsed.get("\"A\""), Some("1"));
    }

    #[test]
    fn keeps_whitespace_inside_quotes() {
        let parsed = parse_str("A = \"  padded  \"  \n");
        assert_eq!(parsed.get("A"), Some("  padded  "));
    }

    #[test]
    fn duplicate_keys_keep_last() {
        let parsed = parse_str("A=1\nB=x\nA=2\n");

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.get("A"), Some("2"));
        assert_eq!(parsed.keys().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn hash_inside_value_is_kept() {
        let parsed = parse_str("COLOR=#ff0000\nNOTE=a # b\n");
        assert_eq!(parsed.get("COLOR"), Some("#ff0000"));
        assert_eq!(parsed.get("NOTE"), Some("a # b"));
    }

    #[test]
    fn parses_unicode_values() {
        let parsed = parse_str("GREETING=こんにちは\n");
        assert_eq!(parsed.get("GREETING"), Some("こんにちは"));
    }

    #[test]
    fn parses_crlf_and_lone_cr_newlines() {
        let parsed = parse_str("A=1\r\nB=2\rC=3");

        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed.get("A"), Some("1"));
        assert_eq!(parsed.get("B"), Some("2"));
        assert_eq!(parsed.get("C"), Some("3"));
    }

    #[test]
    fn rejects_invalid_utf8_bytes() {
        let err = parse_bytes(&[b'A', b'=', 0xff]).expect_err("expected encoding error");
        match err {
            Error::InvalidEncoding(_) => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_reader_reads_whole_input() {
        let reader = std::io::Cursor::new("KEY=one\nOTHER='two'\n");
        let parsed = parse_reader(reader).expect("parse should succeed");
        assert_eq!(parsed.get("KEY"), Some("one"));
        assert_eq!(parsed.get("OTHER"), Some("two"));
    }
}
