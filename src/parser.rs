//! Recursive-descent PDF object parser over [`crate::lexer`] tokens.

use crate::error::{Error, Result};
use crate::lexer::{skip_ws, token, Token};
use crate::object::{Dict, Object, ObjectRef};
use nom::IResult;

fn fail(input: &[u8]) -> nom::Err<nom::error::Error<&[u8]>> {
    nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag))
}

/// Decode escapes of a literal string body.
///
/// ```
/// use rm_lines::parser::decode_literal_string;
///
/// assert_eq!(decode_literal_string(b"a\\(b\\)\\101"), b"a(b)A");
/// ```
pub fn decode_literal_string(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        if raw[i] != b'\\' || i + 1 >= raw.len() {
            out.push(raw[i]);
            i += 1;
            continue;
        }
        let c = raw[i + 1];
        i += 2;
        match c {
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'b' => out.push(8),
            b'f' => out.push(12),
            b'\n' => {},
            b'\r' => {
                if raw.get(i) == Some(&b'\n') {
                    i += 1;
                }
            },
            b'0'..=b'7' => {
                let mut code = (c - b'0') as u32;
                for _ in 0..2 {
                    match raw.get(i) {
                        Some(d @ b'0'..=b'7') => {
                            code = code * 8 + (d - b'0') as u32;
                            i += 1;
                        },
                        _ => break,
                    }
                }
                out.push((code & 0xFF) as u8);
            },
            // \( \) \\ and unknown escapes keep the escaped byte
            other => out.push(other),
        }
    }

    out
}

/// Decode a hex string body. An odd trailing digit is padded with 0.
pub fn decode_hex(hex: &[u8]) -> Result<Vec<u8>> {
    let digits: Vec<u8> = hex.iter().copied().filter(|c| !c.is_ascii_whitespace()).collect();
    digits
        .chunks(2)
        .map(|pair| {
            let hi = hex_val(pair[0])?;
            let lo = pair.get(1).map(|&d| hex_val(d)).transpose()?.unwrap_or(0);
            Ok(hi << 4 | lo)
        })
        .collect()
}

fn hex_val(d: u8) -> Result<u8> {
    (d as char)
        .to_digit(16)
        .map(|v| v as u8)
        .ok_or_else(|| Error::ParseError {
            offset: 0,
            reason: format!("invalid hex digit {:?}", d as char),
        })
}

/// Parse one direct object (an `n g R` triple becomes a reference).
///
/// ```
/// use rm_lines::object::{Object, ObjectRef};
/// use rm_lines::parser::parse_object;
///
/// let (_, obj) = parse_object(b"<< /Parent 3 0 R /Count 2 >>").unwrap();
/// let dict = obj.as_dict().unwrap();
/// assert_eq!(dict["Parent"], Object::Reference(ObjectRef::new(3, 0)));
/// assert_eq!(dict["Count"], Object::Integer(2));
/// ```
pub fn parse_object(input: &[u8]) -> IResult<&[u8], Object> {
    let (rest, tok) = token(input)?;

    match tok {
        Token::Null => Ok((rest, Object::Null)),
        Token::True => Ok((rest, Object::Boolean(true))),
        Token::False => Ok((rest, Object::Boolean(false))),
        Token::Integer(id) => {
            if let Ok((after_gen, Token::Integer(gen))) = token(rest) {
                if let Ok((after_r, Token::R)) = token(after_gen) {
                    if (0..=u32::MAX as i64).contains(&id) && (0..=u16::MAX as i64).contains(&gen) {
                        return Ok((after_r, Object::Reference(ObjectRef::new(id as u32, gen as u16))));
                    }
                }
            }
            Ok((rest, Object::Integer(id)))
        },
        Token::Real(r) => Ok((rest, Object::Real(r))),
        Token::LiteralString(raw) => Ok((rest, Object::String(decode_literal_string(raw)))),
        Token::HexString(raw) => decode_hex(raw)
            .map(|bytes| (rest, Object::String(bytes)))
            .map_err(|_| fail(input)),
        Token::Name(name) => Ok((rest, Object::Name(name))),
        Token::ArrayStart => parse_array(rest),
        Token::DictStart => {
            let (after_dict, dict) = parse_dict_body(rest)?;
            match token(after_dict) {
                Ok((after_kw, Token::StreamStart)) => {
                    let (after_stream, data) = stream_body(after_kw, &dict)?;
                    Ok((
                        after_stream,
                        Object::Stream {
                            dict,
                            data: bytes::Bytes::copy_from_slice(data),
                        },
                    ))
                },
                _ => Ok((after_dict, Object::Dictionary(dict))),
            }
        },
        _ => Err(fail(input)),
    }
}

fn parse_array(mut input: &[u8]) -> IResult<&[u8], Object> {
    let mut items = Vec::new();
    loop {
        if let Ok((rest, Token::ArrayEnd)) = token(input) {
            return Ok((rest, Object::Array(items)));
        }
        let (rest, item) = parse_object(input)?;
        items.push(item);
        input = rest;
    }
}

fn parse_dict_body(mut input: &[u8]) -> IResult<&[u8], Dict> {
    let mut dict = Dict::new();
    loop {
        match token(input)? {
            (rest, Token::DictEnd) => return Ok((rest, dict)),
            (rest, Token::Name(key)) => {
                let (rest, value) = parse_object(rest)?;
                // A null value is equivalent to an absent key.
                if !value.is_null() {
                    dict.insert(key, value);
                }
                input = rest;
            },
            _ => return Err(fail(input)),
        }
    }
}

/// Stream bytes after the `stream` keyword.
///
/// A direct `/Length` is trusted when `endstream` follows it; otherwise the
/// body runs up to the next `endstream`.
fn stream_body<'a>(input: &'a [u8], dict: &Dict) -> IResult<&'a [u8], &'a [u8]> {
    let body = if input.starts_with(b"\r\n") {
        &input[2..]
    } else if input.starts_with(b"\n") || input.starts_with(b"\r") {
        &input[1..]
    } else {
        input
    };

    if let Some(len) = dict.get("Length").and_then(Object::as_integer) {
        let len = len.max(0) as usize;
        if len <= body.len() {
            if let Ok((rest, Token::StreamEnd)) = token(&body[len..]) {
                return Ok((rest, &body[..len]));
            }
        }
        log::debug!("stream /Length {} does not end at endstream, scanning", len);
    }

    let pos = find(body, b"endstream").ok_or_else(|| fail(body))?;
    let mut data = &body[..pos];
    if data.ends_with(b"\r\n") {
        data = &data[..data.len() - 2];
    } else if data.ends_with(b"\n") || data.ends_with(b"\r") {
        data = &data[..data.len() - 1];
    }
    Ok((&body[pos + b"endstream".len()..], data))
}

/// Position of `needle` in `haystack`.
pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Parse `id gen obj <object> endobj` starting at `offset` of `data`.
pub fn parse_indirect_object(data: &[u8], offset: usize) -> Result<(ObjectRef, Object)> {
    let err = |reason: &str| Error::ParseError {
        offset,
        reason: reason.to_string(),
    };
    let input = data.get(offset..).ok_or_else(|| err("offset past end of file"))?;

    let (rest, id) = match token(input) {
        Ok((rest, Token::Integer(id))) if id >= 0 => (rest, id as u32),
        _ => return Err(err("expected object number")),
    };
    let (rest, gen) = match token(rest) {
        Ok((rest, Token::Integer(gen))) if (0..=u16::MAX as i64).contains(&gen) => (rest, gen as u16),
        _ => return Err(err("expected generation number")),
    };
    let rest = match token(rest) {
        Ok((rest, Token::ObjStart)) => rest,
        _ => return Err(err("expected 'obj' keyword")),
    };
    let (rest, object) = parse_object(rest).map_err(|_| err("malformed object body"))?;

    if !matches!(token(rest), Ok((_, Token::ObjEnd))) {
        let (after_ws, _) = skip_ws(rest).map_err(|_| err("malformed object tail"))?;
        log::debug!(
            "object {} {} at byte {} lacks endobj (next: {:?})",
            id,
            gen,
            offset,
            String::from_utf8_lossy(&after_ws[..after_ws.len().min(16)])
        );
    }

    Ok((ObjectRef::new(id, gen), object))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &[u8]) -> Object {
        parse_object(input).unwrap().1
    }

    // ========================================================================
    // Primitives
    // ========================================================================

    #[test]
    fn test_primitives() {
        assert_eq!(parse(b"null"), Object::Null);
        assert_eq!(parse(b"true"), Object::Boolean(true));
        assert_eq!(parse(b"-7"), Object::Integer(-7));
        assert_eq!(parse(b"0.25"), Object::Real(0.25));
        assert_eq!(parse(b"/Page"), Object::name("Page"));
        assert_eq!(parse(b"(Hi\\n)"), Object::String(b"Hi\n".to_vec()));
        assert_eq!(parse(b"<48 69 7>"), Object::String(b"Hip".to_vec()));
    }

    #[test]
    fn test_octal_escapes() {
        assert_eq!(decode_literal_string(b"\\247"), vec![0xA7]);
        assert_eq!(decode_literal_string(b"\\53x"), b"+x");
        assert_eq!(decode_literal_string(b"a\\\nb"), b"ab");
    }

    #[test]
    fn test_integer_is_not_reference_without_r() {
        let (rest, obj) = parse_object(b"1 0 obj").unwrap();
        assert_eq!(obj, Object::Integer(1));
        assert_eq!(rest, b" 0 obj");
    }

    // ========================================================================
    // Composites
    // ========================================================================

    #[test]
    fn test_nested_array() {
        let obj = parse(b"[0 0 612 792 [1 2 R]]");
        let arr = obj.as_array().unwrap();
        assert_eq!(arr.len(), 5);
        assert_eq!(arr[4].as_array().unwrap()[0], Object::Reference(ObjectRef::new(1, 2)));
    }

    #[test]
    fn test_dict_drops_null_values() {
        let obj = parse(b"<< /A null /B 1 >>");
        let dict = obj.as_dict().unwrap();
        assert!(!dict.contains_key("A"));
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn test_unclosed_array_is_error() {
        assert!(parse_object(b"[1 2").is_err());
    }

    // ========================================================================
    // Streams and indirect objects
    // ========================================================================

    #[test]
    fn test_stream_with_length() {
        let obj = parse(b"<< /Length 5 >>\nstream\nhello\nendstream");
        match obj {
            Object::Stream { data, .. } => assert_eq!(&data[..], b"hello"),
            other => panic!("expected stream, got {:?}", other),
        }
    }

    #[test]
    fn test_stream_with_wrong_length_scans() {
        let obj = parse(b"<< /Length 99 >>\r\nstream\r\nabc\r\nendstream");
        match obj {
            Object::Stream { data, .. } => assert_eq!(&data[..], b"abc"),
            other => panic!("expected stream, got {:?}", other),
        }
    }

    #[test]
    fn test_stream_with_indirect_length() {
        let obj = parse(b"<< /Length 8 0 R >>\nstream\nq Q\nendstream");
        match obj {
            Object::Stream { data, .. } => assert_eq!(&data[..], b"q Q"),
            other => panic!("expected stream, got {:?}", other),
        }
    }

    #[test]
    fn test_indirect_object() {
        let data = b"%PDF-1.4\n4 0 obj\n<< /Type /Page >>\nendobj\n";
        let (r, obj) = parse_indirect_object(data, 9).unwrap();
        assert_eq!(r, ObjectRef::new(4, 0));
        assert_eq!(obj.as_dict().unwrap()["Type"], Object::name("Page"));
    }

    #[test]
    fn test_indirect_object_bad_offset() {
        let err = parse_indirect_object(b"garbage", 0).unwrap_err();
        assert!(matches!(err, Error::ParseError { offset: 0, .. }));
        assert!(parse_indirect_object(b"x", 50).is_err());
    }
}
