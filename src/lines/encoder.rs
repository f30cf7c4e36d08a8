//! Writer for stroke files, the inverse of [`super::decode`].
//!
//! Used to produce fixtures and to re-save pages after edits.

use super::{StrokeFile, Version, HEADER_V3, HEADER_V5};
use crate::error::Result;
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;

/// Serialize a stroke file.
///
/// v5 strokes without an `extra` value are written with `0.0`; the extra
/// field of v3 strokes is dropped.
pub fn encode(file: &StrokeFile) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_to(&mut buf, file)?;
    Ok(buf)
}

/// Serialize a stroke file into any writer.
pub fn write_to<W: Write>(w: &mut W, file: &StrokeFile) -> Result<()> {
    match file.version {
        Version::V3 => w.write_all(HEADER_V3)?,
        Version::V5 => w.write_all(HEADER_V5)?,
    }
    w.write_u32::<LittleEndian>(file.layers.len() as u32)?;

    for layer in &file.layers {
        w.write_u32::<LittleEndian>(layer.strokes.len() as u32)?;
        for stroke in &layer.strokes {
            w.write_u32::<LittleEndian>(stroke.pen_id)?;
            w.write_u32::<LittleEndian>(stroke.color)?;
            w.write_u32::<LittleEndian>(stroke.reserved)?;
            w.write_f32::<LittleEndian>(stroke.base_width)?;
            if file.version == Version::V5 {
                w.write_f32::<LittleEndian>(stroke.extra.unwrap_or(0.0))?;
            }
            w.write_u32::<LittleEndian>(stroke.segments.len() as u32)?;
            for seg in &stroke.segments {
                for v in [seg.x, seg.y, seg.speed, seg.tilt, seg.width, seg.pressure] {
                    w.write_f32::<LittleEndian>(v)?;
                }
            }
        }
    }

    Ok(())
}
