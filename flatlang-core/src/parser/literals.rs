//! Conversion of literal token text into values.

use super::error::{Expected, ParseError};
use super::expressions::{parse_expression, Precedence};
use super::Parser;
use crate::ast::{Node, StringPart};
use crate::lexer::{Token, TokenKind, Tokenizer};

fn split_radix(literal: &str) -> (u32, &str) {
    let prefix = literal.get(..2).map(|prefix| prefix.to_ascii_lowercase());
    match prefix.as_deref() {
        Some("0x") => (16, &literal[2..]),
        Some("0o") => (8, &literal[2..]),
        Some("0b") => (2, &literal[2..]),
        _ if literal.len() > 1 && literal.starts_with('0') => (8, &literal[1..]),
        _ => (10, literal),
    }
}

pub fn parse_integer(literal: &str) -> Result<i64, String> {
    let digits = literal.replace('_', "");
    let (radix, digits) = split_radix(&digits);

    i64::from_str_radix(digits, radix)
        .map_err(|err| format!("invalid integer literal {literal}: {err}"))
}

pub fn parse_float(literal: &str) -> Result<f64, String> {
    let digits = literal.replace('_', "");
    let value = match split_radix(&digits) {
        (16, hex) => parse_hex_float(hex),
        _ => digits.parse::<f64>().ok(),
    };

    match value {
        Some(value) if value.is_finite() => Ok(value),
        Some(_) => Err(format!("float literal {literal} out of range")),
        None => Err(format!("invalid float literal {literal}")),
    }
}

/// `1.8p3` style mantissa and binary exponent, after the `0x` prefix.
fn parse_hex_float(literal: &str) -> Option<f64> {
    let (mantissa, exponent) = literal.split_once(['p', 'P'])?;
    let mut exponent: i32 = exponent.parse().ok()?;

    let mut value = 0f64;
    let mut fraction = false;
    for ch in mantissa.chars() {
        if ch == '.' {
            fraction = true;
            continue;
        }
        value = value * 16.0 + f64::from(ch.to_digit(16)?);
        if fraction {
            exponent = exponent.checked_sub(4)?;
        }
    }

    Some(scale_by_power_of_two(value, exponent))
}

/// `value * 2^exponent` without passing through an infinite or zero
/// intermediate power.
fn scale_by_power_of_two(mut value: f64, mut exponent: i32) -> f64 {
    const STEP: i32 = 1000;
    while exponent > STEP {
        value *= 2f64.powi(STEP);
        exponent -= STEP;
    }
    while exponent < -STEP {
        value *= 2f64.powi(-STEP);
        exponent += STEP;
    }
    value * 2f64.powi(exponent)
}

fn read_escape_digits(
    chars: &mut std::str::Chars,
    first: Option<char>,
    radix: u32,
    count: usize,
) -> Result<u32, String> {
    let mut value = 0;
    for ch in first.into_iter().chain(chars.by_ref().take(count - first.iter().count())) {
        let digit = ch.to_digit(radix).ok_or("invalid char escape")?;
        value = value * radix + digit;
    }
    Ok(value)
}

/// Resolves the escapes of a quoted string segment.
fn unescape(segment: &str, quote: char) -> Result<String, String> {
    let mut text = String::with_capacity(segment.len());
    let mut chars = segment.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            text.push(ch);
            continue;
        }
        let code = match chars.next() {
            Some('a') => 0x07,
            Some('b') => 0x08,
            Some('f') => 0x0c,
            Some('n') => 0x0a,
            Some('r') => 0x0d,
            Some('t') => 0x09,
            Some('v') => 0x0b,
            Some(ch @ ('\\' | '$')) => u32::from(ch),
            Some(ch) if ch == quote => u32::from(ch),
            Some(first @ '0'..='7') => {
                let value = read_escape_digits(&mut chars, Some(first), 8, 3)?;
                if value > 255 {
                    return Err(format!("octal escape value {value} > 255"));
                }
                value
            }
            Some('x') => read_escape_digits(&mut chars, None, 16, 2)?,
            Some('u') => read_escape_digits(&mut chars, None, 16, 4)?,
            Some('U') => read_escape_digits(&mut chars, None, 16, 8)?,
            _ => return Err("invalid char escape".to_owned()),
        };
        let ch = char::from_u32(code)
            .ok_or("escape sequence is invalid Unicode code point")?;
        text.push(ch);
    }

    Ok(text)
}

/// Byte offset of the next unescaped `${` in a string body.
fn find_interpolation(body: &str, raw: bool) -> Option<usize> {
    let mut chars = body.char_indices().peekable();
    while let Some((index, ch)) = chars.next() {
        match ch {
            '\\' if !raw => {
                chars.next();
            }
            '$' if matches!(chars.peek(), Some((_, '{'))) => return Some(index),
            _ => {}
        }
    }
    None
}

/// Length of an interpolated expression: the offset of the `}` closing it.
fn interpolation_len(source: &str) -> Result<usize, ParseError> {
    let mut depth = 1;
    for token in Tokenizer::new(source) {
        if let TokenKind::Illegal(message) = token.kind.clone() {
            return Err(ParseError::Lex { token, message });
        }
        match token.kind {
            TokenKind::LBrace => depth += 1,
            TokenKind::RBrace => {
                depth -= 1;
                if depth == 0 {
                    return Ok(token.start);
                }
            }
            _ => {}
        }
    }
    Err(ParseError::PrematureEndOfInput {
        expected: Expected::Token(TokenKind::RBrace),
    })
}

fn parse_interpolation(source: &str, depth: usize) -> Result<Node, ParseError> {
    let mut parser = Parser::nested(Tokenizer::new(source), depth);
    let node = parse_expression(&mut parser, Precedence::Lowest)?;

    match parser.iter.next() {
        None => Ok(node),
        Some(token) => Err(ParseError::unexpected_token(TokenKind::RBrace, Some(token))),
    }
}

/// Unquotes a string or raw string token, splitting out `${...}`
/// interpolations.
pub fn parse_string(parser: &mut Parser, token: &Token, raw: bool) -> Result<Node, ParseError> {
    let (TokenKind::String(literal) | TokenKind::RawString(literal)) = &token.kind else {
        return Err(ParseError::NoPrefixFunction(token.clone()));
    };
    let quote = literal.chars().next().unwrap_or('"');
    let body = literal
        .get(1..literal.len().saturating_sub(1))
        .unwrap_or_default();

    let unquote = |segment: &str| -> Result<String, ParseError> {
        if raw {
            Ok(segment.replace('\r', ""))
        } else {
            unescape(segment, quote).map_err(|reason| ParseError::InvalidLiteral {
                token: token.clone(),
                reason,
            })
        }
    };

    let mut parts = Vec::new();
    let mut rest = body;
    while let Some(index) = find_interpolation(rest, raw) {
        let text = unquote(&rest[..index])?;
        if !text.is_empty() {
            parts.push(StringPart::Text(text));
        }

        let source = &rest[index + 2..];
        let len = interpolation_len(source).map_err(|err| err.context(token, "interpolation"))?;
        let node = parser
            .descend(token, |parser| parse_interpolation(&source[..len], parser.depth()))
            .map_err(|err| err.context(token, "interpolation"))?;
        parts.push(StringPart::Interpolation(node));
        rest = &source[len + 1..];
    }

    let text = unquote(rest)?;
    if parts.is_empty() {
        return Ok(Node::TextLiteral(text));
    }
    if !text.is_empty() {
        parts.push(StringPart::Text(text));
    }
    Ok(Node::InterpolatedString(parts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::InfixOperationKind;

    fn string_token(literal: &str) -> Token {
        let token = Tokenizer::new(literal).next().unwrap();
        assert!(
            matches!(token.kind, TokenKind::String(_) | TokenKind::RawString(_)),
            "{literal}: {token:?}"
        );
        token
    }

    fn string(literal: &str) -> Result<Node, ParseError> {
        let token = string_token(literal);
        let raw = matches!(token.kind, TokenKind::RawString(_));
        parse_string(&mut Parser::new(Tokenizer::new("")), &token, raw)
    }

    #[test]
    fn test_integers() {
        let tests = vec![
            ("0", 0),
            ("42", 42),
            ("1_000_000", 1_000_000),
            ("0x_1f", 31),
            ("0XFF", 255),
            ("0o777", 511),
            ("0755", 493),
            ("0b1010", 10),
            ("9223372036854775807", i64::MAX),
        ];

        for (input, expected) in tests {
            assert_eq!(parse_integer(input), Ok(expected), "input: {input}");
        }
        assert!(parse_integer("9223372036854775808").is_err());
    }

    #[test]
    fn test_floats() {
        let tests = vec![
            ("1.5", 1.5),
            ("1.", 1.0),
            (".25", 0.25),
            ("1e3", 1000.0),
            ("1_000.5", 1000.5),
            ("2.5E-1", 0.25),
            ("0x1p-2", 0.25),
            ("0x1.8p3", 12.0),
            ("0X_1FP0", 31.0),
            ("017.5", 17.5),
        ];

        for (input, expected) in tests {
            assert_eq!(parse_float(input), Ok(expected), "input: {input}");
        }
        assert!(parse_float("1e309").is_err());
        assert!(parse_float("0x1p2000").is_err());
        assert!(parse_float("0x0.1p1028").is_err());
    }

    #[test]
    fn test_hex_float_exponent_range() {
        let tests = vec![
            ("0x1p-1074", f64::from_bits(1)),
            ("0x1p-1022", f64::MIN_POSITIVE),
            ("0x0.01p1030", 2f64.powi(1022)),
            ("0x1.fffffffffffffp1023", f64::MAX),
            ("0x0p2000", 0.0),
            ("0x10p-1078", f64::from_bits(1)),
        ];

        for (input, expected) in tests {
            assert_eq!(parse_float(input), Ok(expected), "input: {input}");
        }
    }

    #[test]
    fn test_plain_strings() {
        let tests = vec![
            (r#""hello""#, "hello"),
            (r#"'it\'s'"#, "it's"),
            (r#""tab\there""#, "tab\there"),
            (r#""\a\b\f\v\\""#, "\u{7}\u{8}\u{c}\u{b}\\"),
            (r#""\101\x42C\U00000044""#, "ABCD"),
            (r#""cost: \${x}""#, "cost: ${x}"),
            ("`raw \\n`", "raw \\n"),
            ("`a\r\nb`", "a\nb"),
        ];

        for (input, expected) in tests {
            let node = string(input).unwrap_or_else(|err| panic!("{input}: {err}"));
            let text = match node {
                Node::TextLiteral(text) => text,
                Node::InterpolatedString(parts) => parts
                    .into_iter()
                    .map(|part| match part {
                        StringPart::Text(text) => text,
                        StringPart::Interpolation(node) => node.to_string(),
                    })
                    .collect(),
                other => panic!("{input}: unexpected {other:?}"),
            };
            assert_eq!(text, expected, "input: {input}");
        }
    }

    #[test]
    fn test_interpolated_strings() {
        assert_eq!(
            string("`this is a ${1+2} test`").unwrap(),
            Node::InterpolatedString(vec![
                StringPart::Text("this is a ".to_owned()),
                StringPart::Interpolation(Node::InfixOperation(
                    InfixOperationKind::Plus,
                    Box::new(Node::IntegerLiteral(1)),
                    Box::new(Node::IntegerLiteral(2)),
                )),
                StringPart::Text(" test".to_owned()),
            ])
        );
        assert_eq!(
            string(r#""${x}${"y"}""#).unwrap(),
            Node::InterpolatedString(vec![
                StringPart::Interpolation(Node::Identifier(crate::ast::Identifier {
                    name: "x".into()
                })),
                StringPart::Interpolation(Node::TextLiteral("y".to_owned())),
            ])
        );
    }

    #[test]
    fn test_string_errors() {
        assert!(matches!(
            string(r#""\400""#).unwrap_err(),
            ParseError::InvalidLiteral { .. }
        ));
        assert!(matches!(
            string(r#""\uD800""#).unwrap_err(),
            ParseError::InvalidLiteral { .. }
        ));
        assert!(matches!(
            string(r#""${}""#).unwrap_err().root(),
            ParseError::PrematureEndOfInput { .. }
        ));
        assert!(matches!(
            string(r#""${1 2}""#).unwrap_err().root(),
            ParseError::UnexpectedToken { .. }
        ));
        assert!(matches!(
            string(r#""${"a" + 1}""#).unwrap_err().root(),
            ParseError::InvalidOperands { .. }
        ));
    }
}
