//! FlateDecode via `flate2`.

use crate::decoders::StreamDecoder;
use crate::error::{Error, Result};
use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

/// FlateDecode filter.
///
/// Falls back to raw deflate when the zlib wrapper is damaged, and keeps
/// whatever was inflated before a corrupt tail.
pub struct FlateDecoder;

impl StreamDecoder for FlateDecoder {
    fn decode(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let zlib_err = match ZlibDecoder::new(input).read_to_end(&mut output) {
            Ok(_) => return Ok(output),
            Err(e) if !output.is_empty() => {
                log::warn!("FlateDecode recovered {} bytes before corruption: {}", output.len(), e);
                return Ok(output);
            },
            Err(e) => e,
        };

        output.clear();
        match DeflateDecoder::new(input).read_to_end(&mut output) {
            Ok(_) => Ok(output),
            Err(_) if !output.is_empty() => {
                log::warn!("Raw deflate recovered {} bytes", output.len());
                Ok(output)
            },
            Err(_) => Err(Error::Decode(format!("FlateDecode failed: {}", zlib_err))),
        }
    }

    fn name(&self) -> &str {
        "FlateDecode"
    }
}

/// Zlib-compress data for a `/FlateDecode` stream.
pub fn flate_encode(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| Error::Encode(format!("FlateDecode: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| Error::Encode(format!("FlateDecode: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::DeflateEncoder;

    #[test]
    fn test_zlib_stream() {
        let packed = flate_encode(b"0 0 m 10 10 l S").unwrap();
        assert_eq!(packed[0], 0x78);
        assert_eq!(FlateDecoder.decode(&packed).unwrap(), b"0 0 m 10 10 l S");
    }

    #[test]
    fn test_raw_deflate_fallback() {
        let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
        enc.write_all(b"no zlib header here").unwrap();
        let raw = enc.finish().unwrap();
        assert_eq!(FlateDecoder.decode(&raw).unwrap(), b"no zlib header here");
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let result = FlateDecoder.decode(&[0xff, 0xff, 0xff, 0xff]);
        assert!(matches!(result, Err(Error::Decode(_))));
    }
}
