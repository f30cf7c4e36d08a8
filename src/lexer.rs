//! PDF tokenizer built on `nom`.
//!
//! Whitespace (space, `\t`, `\r`, `\n`, `\0`, `\f`) and `%` comments are
//! skipped before every token. String escapes are left for the parser;
//! `#xx` escapes in names are decoded here.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_while, take_while1},
    character::complete::{char, digit0, digit1, one_of},
    combinator::{map, opt, recognize, value},
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

/// A lexical token.
#[derive(Debug, PartialEq, Clone)]
pub enum Token<'a> {
    /// Integer number
    Integer(i64),
    /// Real number
    Real(f64),
    /// Raw bytes between `(` and `)`, escapes undecoded
    LiteralString(&'a [u8]),
    /// Raw bytes between `<` and `>`
    HexString(&'a [u8]),
    /// Name without the leading `/`
    Name(String),
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,
    /// `[`
    ArrayStart,
    /// `]`
    ArrayEnd,
    /// `<<`
    DictStart,
    /// `>>`
    DictEnd,
    /// `obj`
    ObjStart,
    /// `endobj`
    ObjEnd,
    /// `stream`
    StreamStart,
    /// `endstream`
    StreamEnd,
    /// `R`
    R,
}

/// PDF whitespace byte.
pub fn is_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\r' | b'\n' | 0x00 | 0x0C)
}

/// PDF delimiter byte.
pub fn is_delimiter(c: u8) -> bool {
    matches!(c, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

fn comment(input: &[u8]) -> IResult<&[u8], ()> {
    value((), preceded(char('%'), take_till(|c| c == b'\r' || c == b'\n')))(input)
}

/// Skip any run of whitespace and comments.
pub fn skip_ws(input: &[u8]) -> IResult<&[u8], ()> {
    let mut rest = input;
    loop {
        let (after_ws, _) = take_while(is_whitespace)(rest)?;
        match comment(after_ws) {
            Ok((after_comment, _)) => rest = after_comment,
            Err(_) => return Ok((after_ws, ())),
        }
    }
}

fn number(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (rest, text) = recognize(tuple((
        opt(one_of("+-")),
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
    )))(input)?;

    let fail = || nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit));
    let text = std::str::from_utf8(text).map_err(|_| fail())?;
    let text = text.strip_prefix('+').unwrap_or(text);

    if text.contains('.') {
        let normalized = if text.ends_with('.') {
            format!("{}0", text)
        } else {
            text.replacen("-.", "-0.", 1)
        };
        normalized
            .parse::<f64>()
            .map(|n| (rest, Token::Real(n)))
            .map_err(|_| fail())
    } else {
        // Out-of-range integers degrade to reals.
        match text.parse::<i64>() {
            Ok(n) => Ok((rest, Token::Integer(n))),
            Err(_) => text.parse::<f64>().map(|n| (rest, Token::Real(n))).map_err(|_| fail()),
        }
    }
}

fn literal_string(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (body, _) = char('(')(input)?;
    let mut depth = 1usize;
    let mut pos = 0;

    while pos < body.len() {
        match body[pos] {
            b'\\' => pos += 2,
            b'(' => {
                depth += 1;
                pos += 1;
            },
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&body[pos + 1..], Token::LiteralString(&body[..pos])));
                }
                pos += 1;
            },
            _ => pos += 1,
        }
    }

    Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag)))
}

fn hex_string(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    if input.starts_with(b"<<") {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag)));
    }
    delimited(
        char('<'),
        map(
            take_while(|c: u8| c.is_ascii_hexdigit() || is_whitespace(c)),
            Token::HexString,
        ),
        char('>'),
    )(input)
}

/// Decode `#xx` escapes in a raw name.
///
/// ```
/// use rm_lines::lexer::decode_name_escapes;
///
/// assert_eq!(decode_name_escapes(b"A#20B"), "A B");
/// assert_eq!(decode_name_escapes(b"Bad#zz"), "Bad#zz");
/// ```
pub fn decode_name_escapes(raw: &[u8]) -> String {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'#' && i + 2 < raw.len() {
            let hex = std::str::from_utf8(&raw[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(raw[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn name(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    preceded(
        char('/'),
        map(take_while(|c| !is_whitespace(c) && !is_delimiter(c)), |raw: &[u8]| {
            Token::Name(decode_name_escapes(raw))
        }),
    )(input)
}

fn keyword(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    alt((
        value(Token::DictStart, tag(b"<<")),
        value(Token::DictEnd, tag(b">>")),
        value(Token::ArrayStart, tag(b"[")),
        value(Token::ArrayEnd, tag(b"]")),
        bare_word,
    ))(input)
}

/// Regular-character run, classified as a keyword.
fn bare_word(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (rest, word) = take_while1(|c: u8| c.is_ascii_alphabetic())(input)?;
    let tok = match word {
        b"true" => Token::True,
        b"false" => Token::False,
        b"null" => Token::Null,
        b"obj" => Token::ObjStart,
        b"endobj" => Token::ObjEnd,
        b"stream" => Token::StreamStart,
        b"endstream" => Token::StreamEnd,
        b"R" => Token::R,
        _ => {
            return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag)));
        },
    };
    Ok((rest, tok))
}

/// Parse one token after skipping whitespace and comments.
pub fn token(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (input, _) = skip_ws(input)?;
    alt((keyword, name, number, literal_string, hex_string))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(input: &[u8]) -> Token<'_> {
        token(input).unwrap().1
    }

    // ========================================================================
    // Numbers
    // ========================================================================

    #[test]
    fn test_integers() {
        assert_eq!(tok(b"42"), Token::Integer(42));
        assert_eq!(tok(b"-123"), Token::Integer(-123));
        assert_eq!(tok(b"+17"), Token::Integer(17));
    }

    #[test]
    fn test_reals() {
        assert_eq!(tok(b"612.5"), Token::Real(612.5));
        assert_eq!(tok(b".5"), Token::Real(0.5));
        assert_eq!(tok(b"5."), Token::Real(5.0));
        assert_eq!(tok(b"-.002"), Token::Real(-0.002));
    }

    // ========================================================================
    // Strings and names
    // ========================================================================

    #[test]
    fn test_literal_string_nesting_and_escapes() {
        assert_eq!(tok(b"(a (b) c)"), Token::LiteralString(b"a (b) c"));
        assert_eq!(tok(b"(x\\)y)"), Token::LiteralString(b"x\\)y"));
        assert!(token(b"(unterminated").is_err());
    }

    #[test]
    fn test_hex_string() {
        assert_eq!(tok(b"<48 65>"), Token::HexString(b"48 65"));
        assert_eq!(tok(b"<<"), Token::DictStart);
    }

    #[test]
    fn test_names() {
        assert_eq!(tok(b"/MediaBox"), Token::Name("MediaBox".to_string()));
        assert_eq!(tok(b"/A#20B"), Token::Name("A B".to_string()));
        assert_eq!(tok(b"/"), Token::Name(String::new()));
    }

    // ========================================================================
    // Keywords and whitespace
    // ========================================================================

    #[test]
    fn test_keywords() {
        assert_eq!(tok(b"endstream"), Token::StreamEnd);
        assert_eq!(tok(b"stream"), Token::StreamStart);
        assert_eq!(tok(b"endobj"), Token::ObjEnd);
        assert_eq!(tok(b"R"), Token::R);
        assert_eq!(tok(b"null"), Token::Null);
        assert!(token(b"startxref").is_err());
    }

    #[test]
    fn test_skips_comments() {
        let (rest, t) = token(b"  % comment\r\n  /Type /Page").unwrap();
        assert_eq!(t, Token::Name("Type".to_string()));
        assert_eq!(rest, b" /Page");
    }

    #[test]
    fn test_token_sequence() {
        let mut input: &[u8] = b"10 0 R";
        let mut out = Vec::new();
        while let Ok((rest, t)) = token(input) {
            out.push(t);
            input = rest;
        }
        assert_eq!(out, vec![Token::Integer(10), Token::Integer(0), Token::R]);
    }
}
