//! Object streams (`/Type /ObjStm`).
//!
//! ```text
//! << /Type /ObjStm /N 2 /First 9 /Filter /FlateDecode >>
//! stream
//! 10 0 11 15          % N pairs of (object number, offset from /First)
//! << /Type /Page >>   % object 10
//! [0 0 612 792]       % object 11
//! endstream
//! ```

use crate::error::{Error, Result};
use crate::lexer::{token, Token};
use crate::object::Object;
use crate::parser::parse_object;
use std::collections::HashMap;

/// Decode an object stream into its members, keyed by object number.
///
/// Members that fail to parse are logged and left out.
pub fn parse_object_stream(stream: &Object) -> Result<HashMap<u32, Object>> {
    let dict = match stream {
        Object::Stream { dict, .. } => dict,
        _ => return Err(Error::InvalidPdf("object stream is not a Stream object".to_string())),
    };
    if let Some(kind) = dict.get("Type").and_then(Object::as_name) {
        if kind != "ObjStm" {
            return Err(Error::InvalidPdf(format!("expected /Type /ObjStm, got /Type /{}", kind)));
        }
    }

    let int = |key: &str| {
        dict.get(key)
            .and_then(Object::as_integer)
            .ok_or_else(|| Error::InvalidPdf(format!("object stream missing /{} entry", key)))
    };
    let n = int("N")?;
    let first = int("First")?;
    if !(0..=1_000_000).contains(&n) || first < 0 {
        return Err(Error::InvalidPdf(format!("invalid object stream /N {} /First {}", n, first)));
    }
    let (n, first) = (n as usize, first as usize);

    let data = stream.decode_stream_data()?;
    if data.len() < first {
        return Err(Error::InvalidPdf(format!(
            "object stream data too short: {} bytes, /First is {}",
            data.len(),
            first
        )));
    }

    let mut header: &[u8] = &data[..first];
    let mut pairs = Vec::with_capacity(n.min(first / 2 + 1));
    for _ in 0..n {
        let (rest, id) = match token(header) {
            Ok((rest, Token::Integer(id))) if id >= 0 => (rest, id as u32),
            _ => break,
        };
        let (rest, offset) = match token(rest) {
            Ok((rest, Token::Integer(off))) if off >= 0 => (rest, off as usize),
            _ => break,
        };
        pairs.push((id, offset));
        header = rest;
    }
    if pairs.len() < n {
        log::warn!("object stream declares {} objects, header lists {}", n, pairs.len());
    }

    let body = &data[first..];
    let mut objects = HashMap::with_capacity(pairs.len());
    for (id, offset) in pairs {
        let Some(slice) = body.get(offset..) else {
            log::warn!("object {} offset {} lies outside its object stream", id, offset);
            continue;
        };
        match parse_object(slice) {
            Ok((_, obj)) => {
                objects.insert(id, obj);
            },
            Err(e) => log::warn!("object {} in object stream failed to parse: {:?}", id, e),
        }
    }

    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoders::flate_encode;
    use crate::object::Dict;

    fn objstm(body: &[u8], n: i64, first: i64, compress: bool) -> Object {
        let mut dict = Dict::new();
        dict.insert("Type".to_string(), Object::name("ObjStm"));
        dict.insert("N".to_string(), Object::Integer(n));
        dict.insert("First".to_string(), Object::Integer(first));
        let data = if compress {
            dict.insert("Filter".to_string(), Object::name("FlateDecode"));
            flate_encode(body).unwrap()
        } else {
            body.to_vec()
        };
        Object::Stream {
            dict,
            data: data.into(),
        }
    }

    #[test]
    fn test_two_members() {
        let body = b"10 0 11 18 << /Type /Page >> [0 0 612 792]";
        let objs = parse_object_stream(&objstm(body, 2, 11, true)).unwrap();
        assert_eq!(objs.len(), 2);
        assert_eq!(objs[&10].as_dict().unwrap()["Type"], Object::name("Page"));
        assert_eq!(objs[&11].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_missing_n() {
        let mut obj = objstm(b"", 0, 0, false);
        if let Object::Stream { dict, .. } = &mut obj {
            dict.remove("N");
        }
        let err = parse_object_stream(&obj).unwrap_err();
        assert!(err.to_string().contains("/N"));
    }

    #[test]
    fn test_first_beyond_data() {
        assert!(parse_object_stream(&objstm(b"1 0", 1, 50, false)).is_err());
    }

    #[test]
    fn test_not_a_stream() {
        assert!(parse_object_stream(&Object::Null).is_err());
    }
}
