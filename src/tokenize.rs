//! Line-level tokenizer for the compat CSV dialect.
//!
//! Rules: fields split on `,`; a `"` toggles quoted mode, in which commas do not
//! split; quote marks are consumed rather than kept, so `"B, C"` reads as `B, C`
//! and an embedded `""` simply disappears (no RFC 4180 unescaping). Every field
//! is trimmed.

use thiserror::Error;

/// Why a single data row was dropped. Never fatal for the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("row ends inside a quoted field")]
    UnterminatedQuote,
    #[error("row is not valid UTF-8")]
    InvalidUtf8,
}

fn split_fields(line: &str) -> (Vec<String>, bool) {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());
    (fields, in_quotes)
}

/// Header names. An unbalanced quote in the header is tolerated.
pub fn parse_header(line: &str) -> Vec<String> {
    split_fields(line).0
}

pub fn parse_row(line: &str) -> Result<Vec<String>, RowError> {
    match split_fields(line) {
        (_, true) => Err(RowError::UnterminatedQuote),
        (fields, false) => Ok(fields),
    }
}

/// Decode and tokenize one raw data line.
pub fn parse_row_bytes(line: &[u8]) -> Result<Vec<String>, RowError> {
    let text = std::str::from_utf8(line).map_err(|_| RowError::InvalidUtf8)?;
    parse_row(text)
}

pub fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_commas_do_not_split() {
        let row = parse_row(r#""A","B, C",5,10"#).unwrap();
        assert_eq!(row, vec!["A", "B, C", "5", "10"]);
    }

    #[test]
    fn fields_are_trimmed() {
        let row = parse_row("  Lamp ,  \" warm light \" ,12").unwrap();
        assert_eq!(row, vec!["Lamp", "warm light", "12"]);
    }

    #[test]
    fn doubled_quotes_are_not_unescaped() {
        let row = parse_row(r#""say ""hi""",x"#).unwrap();
        assert_eq!(row, vec!["say hi", "x"]);
    }

    #[test]
    fn empty_cells_survive() {
        assert_eq!(parse_row("a,,c,").unwrap(), vec!["a", "", "c", ""]);
    }

    #[test]
    fn header_quotes_are_removed() {
        assert_eq!(
            parse_header(r#""Product Name", "price",cat"#),
            vec!["Product Name", "price", "cat"]
        );
    }

    #[test]
    fn unterminated_quote_is_a_row_error() {
        assert_eq!(parse_row(r#"a,"b,c"#), Err(RowError::UnterminatedQuote));
    }

    #[test]
    fn invalid_utf8_is_a_row_error() {
        assert_eq!(parse_row_bytes(b"ok,\xff\xfe"), Err(RowError::InvalidUtf8));
    }

    #[test]
    fn whitespace_only_lines_are_blank() {
        assert!(is_blank(b""));
        assert!(is_blank(b"  \t"));
        assert!(!is_blank(b" ,"));
    }
}
