//! Stream filters needed to read cross-reference and object streams.
//!
//! Only FlateDecode (plus PNG/TIFF predictors) is implemented. Page content
//! streams of a source PDF are never decoded: the composer wraps them as they
//! are, whatever their filters.

use crate::error::{Error, Result};

mod flate;
mod predictor;

pub use flate::{flate_encode, FlateDecoder};
pub use predictor::{decode_predictor, DecodeParams};

/// Upper bound on a single decoded stream.
const MAX_DECODED_SIZE: usize = 256 * 1024 * 1024;

/// A PDF stream filter.
pub trait StreamDecoder {
    /// Decode the input data.
    fn decode(&self, input: &[u8]) -> Result<Vec<u8>>;

    /// Filter name as it appears in `/Filter`.
    fn name(&self) -> &str;
}

/// Apply `filters` in order, then the predictor from `params`.
///
/// # Examples
///
/// ```
/// use rm_lines::decoders::{decode_stream, flate_encode};
///
/// let packed = flate_encode(b"BT /F1 12 Tf ET").unwrap();
/// let plain = decode_stream(&packed, &["FlateDecode".to_string()], None).unwrap();
/// assert_eq!(plain, b"BT /F1 12 Tf ET");
/// ```
pub fn decode_stream(data: &[u8], filters: &[String], params: Option<&DecodeParams>) -> Result<Vec<u8>> {
    let mut current = data.to_vec();

    for filter_name in filters {
        let decoder: Box<dyn StreamDecoder> = match filter_name.as_str() {
            "FlateDecode" | "Fl" => Box::new(FlateDecoder),
            _ => return Err(Error::UnsupportedFilter(filter_name.clone())),
        };
        current = decoder.decode(&current)?;
        log::debug!("{} produced {} bytes", decoder.name(), current.len());

        if current.len() > MAX_DECODED_SIZE {
            return Err(Error::Decode(format!(
                "decoded size {} bytes exceeds limit {} bytes",
                current.len(),
                MAX_DECODED_SIZE
            )));
        }
    }

    if let Some(params) = params {
        if params.predictor != 1 {
            current = decode_predictor(&current, params)?;
        }
    }

    Ok(current)
}
