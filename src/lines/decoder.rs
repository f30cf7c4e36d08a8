//! Sequential little-endian decoder for stroke files.

use super::{Layer, Segment, Stroke, StrokeFile, Version};
use crate::error::{Error, Result};
use crate::pen::PenType;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Cursor};

/// Length of the ASCII header literal.
pub const HEADER_LEN: usize = 43;

/// Header of a version 3 file.
pub const HEADER_V3: &[u8; HEADER_LEN] = b"reMarkable .lines file, version=3          ";

/// Header of a version 5 file.
pub const HEADER_V5: &[u8; HEADER_LEN] = b"reMarkable .lines file, version=5          ";

const SEGMENT_SIZE: usize = 6 * 4;
const STROKE_V3_SIZE: usize = 5 * 4;
const STROKE_V5_SIZE: usize = 6 * 4;

/// Decode a complete stroke file.
///
/// Fails with [`Error::Format`] when the buffer is shorter than the header
/// plus layer count, the header is not a known version, the layer count is
/// zero, or any record runs past the end of the buffer.
pub fn decode(data: &[u8]) -> Result<StrokeFile> {
    if data.len() < HEADER_LEN + 4 {
        return Err(Error::Format(format!(
            "buffer is {} bytes, need at least {}",
            data.len(),
            HEADER_LEN + 4
        )));
    }

    let header = &data[..HEADER_LEN];
    let version = if header == HEADER_V3 {
        Version::V3
    } else if header == HEADER_V5 {
        Version::V5
    } else {
        return Err(Error::Format(format!(
            "unrecognized header {:?}",
            String::from_utf8_lossy(header).trim_end()
        )));
    };

    let mut cursor = Cursor::new(data);
    cursor.set_position(HEADER_LEN as u64);

    let layer_count = read_u32(&mut cursor, "layer count")?;
    if layer_count == 0 {
        return Err(Error::Format("file declares zero layers".to_string()));
    }
    log::debug!("Decoding v{} lines file with {} layers", version.number(), layer_count);

    let mut layers = Vec::with_capacity(bounded(layer_count, &cursor, 4));
    for _ in 0..layer_count {
        layers.push(read_layer(&mut cursor, version)?);
    }

    let trailing = data.len() as u64 - cursor.position();
    if trailing > 0 {
        log::debug!("{} trailing bytes after last layer ignored", trailing);
    }

    Ok(StrokeFile { version, layers })
}

fn read_layer(cursor: &mut Cursor<&[u8]>, version: Version) -> Result<Layer> {
    let stroke_count = read_u32(cursor, "stroke count")?;
    let record_size = match version {
        Version::V3 => STROKE_V3_SIZE,
        Version::V5 => STROKE_V5_SIZE,
    };

    let mut strokes = Vec::with_capacity(bounded(stroke_count, cursor, record_size));
    for _ in 0..stroke_count {
        strokes.push(read_stroke(cursor, version)?);
    }

    Ok(Layer {
        strokes,
        color_override: None,
    })
}

fn read_stroke(cursor: &mut Cursor<&[u8]>, version: Version) -> Result<Stroke> {
    let pen_id = read_u32(cursor, "pen id")?;
    let color = read_u32(cursor, "color id")?;
    let reserved = read_u32(cursor, "stroke reserved field")?;
    let base_width = read_f32(cursor, "stroke width")?;
    let extra = match version {
        Version::V3 => None,
        Version::V5 => Some(read_f32(cursor, "stroke v5 field")?),
    };
    let segment_count = read_u32(cursor, "segment count")?;

    let mut segments = Vec::with_capacity(bounded(segment_count, cursor, SEGMENT_SIZE));
    for _ in 0..segment_count {
        segments.push(Segment {
            x: read_f32(cursor, "segment x")?,
            y: read_f32(cursor, "segment y")?,
            speed: read_f32(cursor, "segment speed")?,
            tilt: read_f32(cursor, "segment tilt")?,
            width: read_f32(cursor, "segment width")?,
            pressure: read_f32(cursor, "segment pressure")?,
        });
    }

    Ok(Stroke {
        pen_id,
        pen: PenType::from_id(pen_id),
        color,
        reserved,
        base_width,
        extra,
        segments,
    })
}

/// Cap a declared element count by what the remaining bytes can hold.
fn bounded(count: u32, cursor: &Cursor<&[u8]>, element_size: usize) -> usize {
    let remaining = cursor.get_ref().len().saturating_sub(cursor.position() as usize);
    (count as usize).min(remaining / element_size)
}

fn read_u32(cursor: &mut Cursor<&[u8]>, what: &str) -> Result<u32> {
    let at = cursor.position();
    cursor
        .read_u32::<LittleEndian>()
        .map_err(|e| truncated(e, what, at))
}

fn read_f32(cursor: &mut Cursor<&[u8]>, what: &str) -> Result<f32> {
    let at = cursor.position();
    cursor
        .read_f32::<LittleEndian>()
        .map_err(|e| truncated(e, what, at))
}

fn truncated(err: io::Error, what: &str, at: u64) -> Error {
    match err.kind() {
        io::ErrorKind::UnexpectedEof => {
            Error::Format(format!("truncated while reading {} at byte {}", what, at))
        },
        _ => Error::Io(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;

    fn header(version: Version, layers: u32) -> Vec<u8> {
        let mut buf = match version {
            Version::V3 => HEADER_V3.to_vec(),
            Version::V5 => HEADER_V5.to_vec(),
        };
        buf.write_u32::<LittleEndian>(layers).unwrap();
        buf
    }

    fn push_stroke(buf: &mut Vec<u8>, version: Version, pen: u32, points: &[(f32, f32)]) {
        buf.write_u32::<LittleEndian>(pen).unwrap();
        buf.write_u32::<LittleEndian>(0).unwrap();
        buf.write_u32::<LittleEndian>(0).unwrap();
        buf.write_f32::<LittleEndian>(2.0).unwrap();
        if version == Version::V5 {
            buf.write_f32::<LittleEndian>(0.0).unwrap();
        }
        buf.write_u32::<LittleEndian>(points.len() as u32).unwrap();
        for &(x, y) in points {
            for v in [x, y, 1.0, 0.5, 2.0, 0.75] {
                buf.write_f32::<LittleEndian>(v).unwrap();
            }
        }
    }

    #[test]
    fn test_header_literals_are_43_bytes() {
        assert_eq!(HEADER_V3.len(), 43);
        assert_eq!(HEADER_V5.len(), 43);
        assert!(HEADER_V5.starts_with(b"reMarkable .lines file, version=5"));
    }

    #[test]
    fn test_decode_empty_v3_layer() {
        let mut buf = header(Version::V3, 1);
        buf.write_u32::<LittleEndian>(0).unwrap();
        let file = decode(&buf).unwrap();
        assert_eq!(file.version, Version::V3);
        assert_eq!(file.layer_count(), 1);
        assert_eq!(file.stroke_count(), 0);
    }

    #[test]
    fn test_decode_v5_stroke_fields() {
        let mut buf = header(Version::V5, 1);
        buf.write_u32::<LittleEndian>(1).unwrap();
        push_stroke(&mut buf, Version::V5, 17, &[(10.0, 20.0), (30.0, 40.0)]);

        let file = decode(&buf).unwrap();
        let stroke = &file.layers[0].strokes[0];
        assert_eq!(stroke.pen_id, 17);
        assert_eq!(stroke.pen, Some(PenType::Fineliner));
        assert_eq!(stroke.extra, Some(0.0));
        assert_eq!(stroke.segments.len(), 2);
        let seg = stroke.segments[1];
        assert_eq!((seg.x, seg.y), (30.0, 40.0));
        assert_eq!(seg.speed, 1.0);
        assert_eq!(seg.tilt, 0.5);
        assert_eq!(seg.width, 2.0);
        assert_eq!(seg.pressure, 0.75);
    }

    #[test]
    fn test_v3_stroke_has_no_extra_field() {
        let mut buf = header(Version::V3, 1);
        buf.write_u32::<LittleEndian>(1).unwrap();
        push_stroke(&mut buf, Version::V3, 2, &[(1.0, 2.0)]);
        let file = decode(&buf).unwrap();
        assert_eq!(file.layers[0].strokes[0].extra, None);
        assert_eq!(file.layers[0].strokes[0].pen, Some(PenType::Ballpoint));
    }

    #[test]
    fn test_too_short_is_format_error() {
        let buf = HEADER_V5.to_vec();
        assert!(matches!(decode(&buf), Err(Error::Format(_))));
        assert!(matches!(decode(&[]), Err(Error::Format(_))));
    }

    #[test]
    fn test_unknown_header_is_format_error() {
        let mut buf = b"reMarkable .lines file, version=6          ".to_vec();
        buf.write_u32::<LittleEndian>(1).unwrap();
        assert!(matches!(decode(&buf), Err(Error::Format(_))));
    }

    #[test]
    fn test_zero_layers_is_format_error() {
        let buf = header(Version::V5, 0);
        let err = decode(&buf).unwrap_err();
        assert!(err.to_string().contains("zero layers"));
    }

    #[test]
    fn test_truncated_segment_is_format_error() {
        let mut buf = header(Version::V5, 1);
        buf.write_u32::<LittleEndian>(1).unwrap();
        push_stroke(&mut buf, Version::V5, 4, &[(1.0, 2.0), (3.0, 4.0)]);
        buf.truncate(buf.len() - 3);
        let err = decode(&buf).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
        assert!(err.to_string().contains("segment pressure"));
    }

    #[test]
    fn test_huge_declared_counts_do_not_preallocate() {
        let mut buf = header(Version::V3, u32::MAX);
        buf.write_u32::<LittleEndian>(u32::MAX).unwrap();
        assert!(matches!(decode(&buf), Err(Error::Format(_))));
    }

    #[test]
    fn test_unknown_pen_id_decodes() {
        let mut buf = header(Version::V5, 1);
        buf.write_u32::<LittleEndian>(1).unwrap();
        push_stroke(&mut buf, Version::V5, 99, &[(1.0, 2.0)]);
        let file = decode(&buf).unwrap();
        assert_eq!(file.layers[0].strokes[0].pen, None);
    }
}
