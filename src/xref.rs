//! Cross-reference parsing.
//!
//! Handles classic `xref` tables, cross-reference streams (`/Type /XRef`),
//! hybrid files whose trailer carries `/XRefStm`, and `/Prev` chains left by
//! incremental updates. Newer sections win over older ones.

use crate::error::{Error, Result};
use crate::lexer::{token, Token};
use crate::object::{Dict, Object};
use crate::parser::{parse_indirect_object, parse_object};
use std::collections::HashMap;

/// Maximum length of a `/Prev` chain.
const MAX_PREV_DEPTH: u32 = 100;

/// Where to find one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XRefEntry {
    /// Free or deleted
    Free,
    /// Uncompressed object at a byte offset
    InUse {
        /// Byte offset of `id gen obj`
        offset: usize,
        /// Generation number
        gen: u16,
    },
    /// Object stored inside an object stream
    Compressed {
        /// Object number of the `/Type /ObjStm` stream
        stream: u32,
        /// Index within that stream
        index: u32,
    },
}

/// Merged cross-reference table plus the newest trailer.
#[derive(Debug, Clone, Default)]
pub struct CrossRefTable {
    entries: HashMap<u32, XRefEntry>,
    trailer: Dict,
}

impl CrossRefTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for an object number.
    pub fn get(&self, id: u32) -> Option<XRefEntry> {
        self.entries.get(&id).copied()
    }

    /// Record an entry, replacing any existing one.
    pub fn insert(&mut self, id: u32, entry: XRefEntry) {
        self.entries.insert(id, entry);
    }

    /// Trailer dictionary of the newest section.
    pub fn trailer(&self) -> &Dict {
        &self.trailer
    }

    /// Largest object number in use, plus one.
    pub fn size(&self) -> u32 {
        let from_entries = self.entries.keys().max().map(|m| m + 1).unwrap_or(0);
        let declared = self
            .trailer
            .get("Size")
            .and_then(Object::as_integer)
            .unwrap_or(0)
            .clamp(0, u32::MAX as i64) as u32;
        from_entries.max(declared)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fill in entries and trailer keys missing from `self` with an older section's.
    pub fn merge_older(&mut self, older: CrossRefTable) {
        for (id, entry) in older.entries {
            self.entries.entry(id).or_insert(entry);
        }
        for (key, value) in older.trailer {
            if key != "Prev" && key != "XRefStm" {
                self.trailer.entry(key).or_insert(value);
            }
        }
    }
}

/// Offset recorded after the last `startxref` in the final 2 KB.
pub fn find_startxref(data: &[u8]) -> Result<usize> {
    let tail_start = data.len().saturating_sub(2048);
    let tail = &data[tail_start..];
    let pos = tail
        .windows(9)
        .rposition(|w| w == b"startxref")
        .ok_or(Error::InvalidXref)?;

    match token(&tail[pos + 9..]) {
        Ok((_, Token::Integer(offset))) if offset >= 0 && (offset as usize) < data.len() => Ok(offset as usize),
        _ => Err(Error::InvalidXref),
    }
}

/// Parse the section at `offset` and every section it chains to.
pub fn parse_xref(data: &[u8], offset: usize) -> Result<CrossRefTable> {
    parse_chain(data, offset, 0)
}

fn parse_chain(data: &[u8], offset: usize, depth: u32) -> Result<CrossRefTable> {
    if depth > MAX_PREV_DEPTH {
        return Err(Error::InvalidPdf(format!(
            "xref /Prev chain depth exceeded {}",
            MAX_PREV_DEPTH
        )));
    }

    let section = data.get(offset..).ok_or(Error::InvalidXref)?;
    let start = section
        .iter()
        .position(|c| !c.is_ascii_whitespace())
        .ok_or(Error::InvalidXref)?;

    let mut table = if section[start..].starts_with(b"xref") {
        log::debug!("classic xref table at byte {}", offset);
        let mut table = parse_table(data, offset + start + 4)?;
        if let Some(stm) = table.trailer.get("XRefStm").and_then(Object::as_integer) {
            log::debug!("hybrid file, xref stream at byte {}", stm);
            match parse_stream(data, stm.max(0) as usize) {
                Ok(hidden) => table.merge_older(hidden),
                Err(e) => log::warn!("ignoring unreadable /XRefStm: {}", e),
            }
        }
        table
    } else {
        log::debug!("xref stream at byte {}", offset);
        parse_stream(data, offset)?
    };

    if let Some(prev) = table.trailer.get("Prev").and_then(Object::as_integer) {
        let prev = prev.max(0) as usize;
        if prev == offset {
            return Err(Error::InvalidPdf("xref /Prev points at itself".to_string()));
        }
        let older = parse_chain(data, prev, depth + 1)?;
        table.merge_older(older);
    }
    table.trailer.remove("Prev");
    table.trailer.remove("XRefStm");

    Ok(table)
}

/// Parse subsections after the `xref` keyword, then the trailer dictionary.
fn parse_table(data: &[u8], mut pos: usize) -> Result<CrossRefTable> {
    let mut table = CrossRefTable::new();

    loop {
        let line_start = pos;
        let line = next_line(data, &mut pos).ok_or(Error::InvalidXref)?;
        let text = String::from_utf8_lossy(line);
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        if text.starts_with("trailer") {
            // The dictionary may start on the same line.
            let keyword_at = line_start + crate::parser::find(line, b"trailer").unwrap_or(0);
            let (_, trailer) =
                parse_object(&data[keyword_at + b"trailer".len()..]).map_err(|_| Error::InvalidXref)?;
            table.trailer = trailer.as_dict().cloned().ok_or(Error::InvalidXref)?;
            return Ok(table);
        }

        let mut parts = text.split_whitespace();
        let (first, count) = match (parts.next(), parts.next()) {
            (Some(a), Some(b)) => (
                a.parse::<u32>().map_err(|_| Error::InvalidXref)?,
                b.parse::<u32>().map_err(|_| Error::InvalidXref)?,
            ),
            _ => return Err(Error::InvalidXref),
        };
        if count > 10_000_000 {
            return Err(Error::InvalidPdf("xref subsection count exceeds limit".to_string()));
        }

        let mut read = 0;
        while read < count {
            let line = next_line(data, &mut pos).ok_or(Error::InvalidXref)?;
            let text = String::from_utf8_lossy(line);
            let fields: Vec<&str> = text.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            let id = first + read;
            read += 1;

            let entry = match fields.as_slice() {
                [off, gen, kind, ..] if kind.starts_with('n') => match (off.parse(), gen.parse()) {
                    (Ok(offset), Ok(gen)) => XRefEntry::InUse { offset, gen },
                    _ => {
                        log::warn!("malformed xref entry for object {}: {:?}", id, text);
                        XRefEntry::Free
                    },
                },
                _ => XRefEntry::Free,
            };
            table.entries.entry(id).or_insert(entry);
        }
    }
}

/// Next line ending in CR, LF or CRLF; advances `pos` past the terminator.
fn next_line<'a>(data: &'a [u8], pos: &mut usize) -> Option<&'a [u8]> {
    if *pos >= data.len() {
        return None;
    }
    let rest = &data[*pos..];
    let end = rest.iter().position(|&c| c == b'\r' || c == b'\n').unwrap_or(rest.len());
    let mut next = *pos + end;
    if data.get(next) == Some(&b'\r') {
        next += 1;
    }
    if data.get(next) == Some(&b'\n') {
        next += 1;
    }
    *pos = next;
    Some(&rest[..end])
}

/// Parse a `/Type /XRef` stream object at `offset`.
fn parse_stream(data: &[u8], offset: usize) -> Result<CrossRefTable> {
    let (_, obj) = parse_indirect_object(data, offset)?;
    let dict = obj.as_dict().ok_or(Error::InvalidXref)?;
    if dict.get("Type").and_then(Object::as_name) != Some("XRef") {
        return Err(Error::InvalidXref);
    }

    let widths: Vec<usize> = dict
        .get("W")
        .and_then(Object::as_array)
        .ok_or(Error::InvalidXref)?
        .iter()
        .map(|w| w.as_integer().unwrap_or(0).clamp(0, 8) as usize)
        .collect();
    if widths.len() != 3 {
        return Err(Error::InvalidXref);
    }
    let row_len: usize = widths.iter().sum();
    if row_len == 0 {
        return Err(Error::InvalidXref);
    }

    let size = dict.get("Size").and_then(Object::as_integer).unwrap_or(0).max(0);
    let index: Vec<i64> = match dict.get("Index").and_then(Object::as_array) {
        Some(arr) => arr.iter().filter_map(Object::as_integer).collect(),
        None => vec![0, size],
    };

    let body = obj.decode_stream_data()?;
    let mut table = CrossRefTable::new();
    let mut rows = body.chunks_exact(row_len);

    for range in index.chunks_exact(2) {
        let (first, count) = (range[0].max(0) as u32, range[1].max(0) as u32);
        for i in 0..count {
            let Some(row) = rows.next() else {
                log::debug!("xref stream at {} has fewer rows than /Index declares", offset);
                break;
            };
            let (f1, rest) = row.split_at(widths[0]);
            let (f2, f3) = rest.split_at(widths[1]);
            // A zero-width type field defaults to 1.
            let kind = if widths[0] == 0 { 1 } else { read_int(f1) };
            let entry = match kind {
                0 => XRefEntry::Free,
                1 => XRefEntry::InUse {
                    offset: read_int(f2) as usize,
                    gen: read_int(f3) as u16,
                },
                2 => XRefEntry::Compressed {
                    stream: read_int(f2) as u32,
                    index: read_int(f3) as u32,
                },
                _ => continue,
            };
            table.entries.insert(first + i, entry);
        }
    }

    let mut trailer = dict.clone();
    for key in ["Length", "Filter", "DecodeParms", "W", "Index", "Type"] {
        trailer.remove(key);
    }
    table.trailer = trailer;
    Ok(table)
}

/// Big-endian unsigned integer of up to 8 bytes.
fn read_int(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0, |acc, &b| (acc << 8) | b as u64)
}
