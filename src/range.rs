//! Compact character range syntax used in probabilistic choice keys.
//!
//! `a-c` denotes the characters `a`, `b` and `c`; `\x` denotes `x` itself.
//! Any other character stands for itself.

use std::collections::BTreeSet;
use thiserror::Error;

/// Outcome of parsing a range string
#[derive(Debug, Clone, PartialEq)]
pub enum RangeResult {
    /// The input is kept verbatim (a lone `\` or `-`)
    Literal(String),
    /// The set of single characters described by the input, in codepoint order
    CharSet(BTreeSet<char>),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RangeError {
    #[error("unexpected end")]
    UnexpectedEnd,

    #[error("no symbol before")]
    NoSymbolBefore,
}

/// Parse a range string into a set of characters.
pub fn parse_range(input: &str) -> Result<RangeResult, RangeError> {
    if input == "\\" || input == "-" {
        return Ok(RangeResult::Literal(input.to_string()));
    }

    let chars: Vec<char> = input.chars().collect();
    let mut result = BTreeSet::new();
    let mut pos = 0;

    while pos < chars.len() {
        match chars[pos] {
            '\\' => {
                pos += 1;
                let escaped = *chars.get(pos).ok_or(RangeError::UnexpectedEnd)?;
                result.insert(escaped);
            }
            '-' => {
                if pos == 0 {
                    return Err(RangeError::NoSymbolBefore);
                }
                let start = chars[pos - 1];
                pos += 1;
                let end = *chars.get(pos).ok_or(RangeError::UnexpectedEnd)?;
                result.extend(start..=end);
            }
            symbol => {
                result.insert(symbol);
            }
        }
        pos += 1;
    }

    Ok(RangeResult::CharSet(result))
}

/// Whether a token uses range syntax at all.
pub fn has_range_syntax(token: &str) -> bool {
    token.contains('-') || token.contains('\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(chars: &str) -> RangeResult {
        RangeResult::CharSet(chars.chars().collect())
    }

    #[test]
    fn test_simple_range() {
        assert_eq!(parse_range("a-c").unwrap(), set("abc"));
        assert_eq!(parse_range("0-9").unwrap(), set("0123456789"));
    }

    #[test]
    fn test_escape_is_literal_next_char() {
        assert_eq!(parse_range("\\n").unwrap(), set("n"));
        assert_eq!(parse_range("a\\-b").unwrap(), set("a-b"));
    }

    #[test]
    fn test_lone_specials_are_verbatim() {
        assert_eq!(
            parse_range("-").unwrap(),
            RangeResult::Literal("-".to_string())
        );
        assert_eq!(
            parse_range("\\").unwrap(),
            RangeResult::Literal("\\".to_string())
        );
    }

    #[test]
    fn test_plain_characters_and_mixed() {
        assert_eq!(parse_range("xyz").unwrap(), set("xyz"));
        assert_eq!(parse_range("a-cx-z+").unwrap(), set("abcxyz+"));
        // Duplicates collapse.
        assert_eq!(parse_range("aa-b").unwrap(), set("ab"));
    }

    #[test]
    fn test_reversed_range_is_empty() {
        // The start symbol is still in the set; the range itself adds nothing.
        assert_eq!(parse_range("c-a").unwrap(), set("c"));
    }

    #[test]
    fn test_dangling_dash() {
        assert_eq!(parse_range("-a"), Err(RangeError::NoSymbolBefore));
        assert_eq!(parse_range("a-"), Err(RangeError::UnexpectedEnd));
    }

    #[test]
    fn test_dangling_escape() {
        assert_eq!(parse_range("ab\\"), Err(RangeError::UnexpectedEnd));
    }

    #[test]
    fn test_range_syntax_detection() {
        assert!(has_range_syntax("0-9"));
        assert!(has_range_syntax("\\n"));
        assert!(!has_range_syntax("Alice"));
    }
}
