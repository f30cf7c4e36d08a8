//! PDF writing.
//!
//! ## Architecture
//!
//! ```text
//! Overlay / template image
//!     ↓
//! [ContentStreamBuilder] + [ExtGStateBuilder] + [ImageData]
//!     ↓
//! [PdfWriter] (fresh notebook documents)   [crate::editor] (incremental updates)
//!     ↓
//! [ObjectSerializer]
//!     ↓
//! PDF bytes
//! ```

mod content_stream;
mod graphics_state;
mod image_handler;
mod object_serializer;
mod pdf_writer;

pub use content_stream::{ContentStreamBuilder, ContentStreamOp, LineCap, LineJoin};
pub use graphics_state::ExtGStateBuilder;
pub use image_handler::{ColorSpace, ImageData};
pub use object_serializer::{format_real, ObjectSerializer};
pub use pdf_writer::{PageSpec, PdfWriter, PdfWriterConfig};

use crate::decoders::flate_encode;
use crate::error::Result;
use crate::object::{Dict, Object};

/// Wrap content bytes in a stream object, Flate-compressed when asked.
pub fn content_stream_object(data: Vec<u8>, compress: bool) -> Result<Object> {
    let mut dict = Dict::new();
    let data = if compress {
        dict.insert("Filter".to_string(), Object::name("FlateDecode"));
        flate_encode(&data)?
    } else {
        data
    };
    Ok(Object::Stream {
        dict,
        data: data.into(),
    })
}

/// Append a classic `xref` section for `entries` (object id, generation,
/// byte offset).
///
/// Entries are grouped into subsections of consecutive ids. With
/// `free_head` the section starts with the `0 65535 f` entry a complete
/// table needs.
pub(crate) fn write_xref_section(out: &mut Vec<u8>, entries: &[(u32, u16, usize)], free_head: bool) {
    let mut rows: Vec<(u32, String)> = entries
        .iter()
        .map(|(id, gen, offset)| (*id, format!("{:010} {:05} n \n", offset, gen)))
        .collect();
    if free_head {
        rows.push((0, "0000000000 65535 f \n".to_string()));
    }
    rows.sort_by_key(|(id, _)| *id);
    rows.dedup_by_key(|(id, _)| *id);

    out.extend_from_slice(b"xref\n");
    let mut start = 0;
    while start < rows.len() {
        let mut end = start + 1;
        while end < rows.len() && rows[end].0 == rows[end - 1].0 + 1 {
            end += 1;
        }
        out.extend_from_slice(format!("{} {}\n", rows[start].0, end - start).as_bytes());
        for (_, row) in &rows[start..end] {
            out.extend_from_slice(row.as_bytes());
        }
        start = end;
    }
}
