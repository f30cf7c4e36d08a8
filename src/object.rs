//! PDF object model shared by the reader and the writers.

use crate::decoders::DecodeParams;
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Dictionary payload. Key order is not significant; the serializer sorts.
pub type Dict = HashMap<String, Object>;

/// One parsed or generated PDF object.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// `null`, also what free and missing objects resolve to
    Null,
    /// `true` / `false`
    Boolean(bool),
    /// Integer
    Integer(i64),
    /// Real
    Real(f64),
    /// Literal or hex string, as raw bytes
    String(Vec<u8>),
    /// Name (stored without the leading /)
    Name(String),
    /// `[ ... ]`
    Array(Vec<Object>),
    /// `<< ... >>`
    Dictionary(Dict),
    /// Stream (dictionary + raw, still-encoded data)
    Stream {
        /// Stream dictionary
        dict: Dict,
        /// Stream data
        data: bytes::Bytes,
    },
    /// `n g R`
    Reference(ObjectRef),
}

/// Object number and generation of an indirect object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef {
    /// Object number
    pub id: u32,
    /// Generation number
    pub gen: u16,
}

impl ObjectRef {
    /// Reference to object `id`, generation `gen`.
    pub fn new(id: u32, gen: u16) -> Self {
        Self { id, gen }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.id, self.gen)
    }
}

impl Object {
    /// Name object from a string slice.
    pub fn name(name: &str) -> Self {
        Object::Name(name.to_string())
    }

    /// Real object from an `f32` page coordinate.
    pub fn real(value: f32) -> Self {
        Object::Real(value as f64)
    }

    /// Array of numbers, integers where exact.
    pub fn number_array(values: &[f32]) -> Self {
        Object::Array(
            values
                .iter()
                .map(|&v| {
                    if v.fract() == 0.0 && v.abs() < 1e9 {
                        Object::Integer(v as i64)
                    } else {
                        Object::real(v)
                    }
                })
                .collect(),
        )
    }

    /// Type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Integer(_) => "Integer",
            Object::Real(_) => "Real",
            Object::String(_) => "String",
            Object::Name(_) => "Name",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
            Object::Stream { .. } => "Stream",
            Object::Reference(_) => "Reference",
        }
    }

    /// Integer payload.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Integer or real as `f64`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Object::Integer(i) => Some(*i as f64),
            Object::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Name payload, without the slash.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Object::Name(s) => Some(s),
            _ => None,
        }
    }

    /// Dictionary of a Dictionary or Stream object.
    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Object::Dictionary(d) => Some(d),
            Object::Stream { dict, .. } => Some(dict),
            _ => None,
        }
    }

    /// Array items.
    pub fn as_array(&self) -> Option<&Vec<Object>> {
        match self {
            Object::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Target of a `Reference`.
    pub fn as_reference(&self) -> Option<ObjectRef> {
        match self {
            Object::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// `true` for `Object::Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    /// Dictionary or an `InvalidObjectType` error.
    pub fn expect_dict(&self) -> Result<&Dict> {
        self.as_dict().ok_or_else(|| Error::InvalidObjectType {
            expected: "Dictionary".to_string(),
            found: self.type_name().to_string(),
        })
    }

    /// Apply the stream's `/Filter` chain and return the plain bytes.
    pub fn decode_stream_data(&self) -> Result<Vec<u8>> {
        match self {
            Object::Stream { dict, data } => {
                let filters = dict.get("Filter").map(filter_names).unwrap_or_default();
                if filters.is_empty() {
                    return Ok(data.to_vec());
                }
                let params = decode_params(dict.get("DecodeParms"));
                crate::decoders::decode_stream(data, &filters, params.as_ref())
            },
            _ => Err(Error::InvalidObjectType {
                expected: "Stream".to_string(),
                found: self.type_name().to_string(),
            }),
        }
    }
}

/// `/Filter` is a single name or an array of names.
fn filter_names(filter: &Object) -> Vec<String> {
    match filter {
        Object::Name(name) => vec![name.clone()],
        Object::Array(arr) => arr
            .iter()
            .filter_map(|obj| obj.as_name().map(str::to_string))
            .collect(),
        _ => vec![],
    }
}

/// `/DecodeParms` is a dictionary, or an array with one entry per filter.
fn decode_params(params: Option<&Object>) -> Option<DecodeParams> {
    let dict = match params? {
        Object::Dictionary(d) => d,
        Object::Array(arr) => arr.iter().find_map(Object::as_dict)?,
        _ => return None,
    };
    let int = |key: &str, default: i64| dict.get(key).and_then(Object::as_integer).unwrap_or(default);

    Some(DecodeParams {
        predictor: int("Predictor", 1),
        columns: int("Columns", 1).max(1) as usize,
        colors: int("Colors", 1).max(1) as usize,
        bits_per_component: int("BitsPerComponent", 8).max(1) as usize,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_accessors() {
        assert_eq!(Object::Integer(612).as_number(), Some(612.0));
        assert_eq!(Object::Real(791.5).as_number(), Some(791.5));
        assert_eq!(Object::name("Page").as_number(), None);
    }

    #[test]
    fn test_number_array_prefers_integers() {
        let arr = Object::number_array(&[0.0, 0.0, 612.0, 791.5]);
        let items = arr.as_array().unwrap();
        assert_eq!(items[2], Object::Integer(612));
        assert_eq!(items[3], Object::Real(791.5));
    }

    #[test]
    fn test_stream_is_dict() {
        let mut dict = Dict::new();
        dict.insert("Length".to_string(), Object::Integer(5));
        let obj = Object::Stream {
            dict,
            data: bytes::Bytes::from_static(b"Hello"),
        };
        assert_eq!(obj.as_dict().unwrap()["Length"].as_integer(), Some(5));
        assert_eq!(obj.decode_stream_data().unwrap(), b"Hello");
    }

    #[test]
    fn test_decode_flate_stream_with_params() {
        let packed = crate::decoders::flate_encode(&[0, 7, 8]).unwrap();
        let mut parms = Dict::new();
        parms.insert("Predictor".to_string(), Object::Integer(12));
        parms.insert("Columns".to_string(), Object::Integer(2));
        let mut dict = Dict::new();
        dict.insert("Filter".to_string(), Object::Array(vec![Object::name("FlateDecode")]));
        dict.insert("DecodeParms".to_string(), Object::Dictionary(parms));
        let obj = Object::Stream {
            dict,
            data: packed.into(),
        };
        assert_eq!(obj.decode_stream_data().unwrap(), vec![7, 8]);
    }

    #[test]
    fn test_decode_not_a_stream() {
        match Object::Integer(42).decode_stream_data() {
            Err(Error::InvalidObjectType { expected, found }) => {
                assert_eq!(expected, "Stream");
                assert_eq!(found, "Integer");
            },
            other => panic!("Expected InvalidObjectType error, got {:?}", other),
        }
    }

    #[test]
    fn test_object_ref_display_and_order() {
        assert_eq!(ObjectRef::new(10, 0).to_string(), "10 0 R");
        assert!(ObjectRef::new(2, 0) < ObjectRef::new(10, 0));
    }
}
