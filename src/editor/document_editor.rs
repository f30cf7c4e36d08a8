//! Incremental updates of an existing document.
//!
//! The original bytes are never touched. New and replaced objects are
//! appended after them together with a classic `xref` section whose trailer
//! chains to the original one through `/Prev`.

use crate::document::PdfDocument;
use crate::error::Result;
use crate::object::{Dict, Object, ObjectRef};
use crate::writer::{write_xref_section, ObjectSerializer};
use bytes::Bytes;
use std::collections::BTreeMap;
use std::path::Path;

/// Trailer keys carried over from the original document.
const CARRIED_TRAILER_KEYS: [&str; 3] = ["Root", "Info", "ID"];

/// Collects object changes against a source document.
#[derive(Debug, Clone)]
pub struct DocumentEditor {
    /// Original file contents
    source: Bytes,
    /// Offset of the original `startxref` section
    prev_xref: usize,
    /// Original trailer entries to repeat in the new trailer
    trailer: Dict,
    /// Next unused object number
    next_object_id: u32,
    /// Objects written in the update, by object number
    modified_objects: BTreeMap<u32, (u16, Object)>,
}

impl DocumentEditor {
    /// Start an update of `doc`.
    pub fn new(doc: &PdfDocument) -> Self {
        let trailer = CARRIED_TRAILER_KEYS
            .iter()
            .filter_map(|key| doc.trailer().get(*key).map(|v| (key.to_string(), v.clone())))
            .collect();
        Self {
            source: doc.source_bytes(),
            prev_xref: doc.startxref(),
            trailer,
            next_object_id: doc.next_object_id(),
            modified_objects: BTreeMap::new(),
        }
    }

    /// Add a new object and return its reference.
    pub fn add_object(&mut self, obj: Object) -> ObjectRef {
        let id = self.next_object_id;
        self.next_object_id += 1;
        self.modified_objects.insert(id, (0, obj));
        ObjectRef::new(id, 0)
    }

    /// Replace an existing object, keeping its number and generation.
    pub fn replace_object(&mut self, obj_ref: ObjectRef, obj: Object) {
        self.next_object_id = self.next_object_id.max(obj_ref.id + 1);
        self.modified_objects.insert(obj_ref.id, (obj_ref.gen, obj));
    }

    /// Object currently staged under `id`, if any.
    pub fn staged(&self, id: u32) -> Option<&Object> {
        self.modified_objects.get(&id).map(|(_, obj)| obj)
    }

    /// Number of objects in the update.
    pub fn modified_count(&self) -> usize {
        self.modified_objects.len()
    }

    /// True when nothing was added or replaced.
    pub fn is_unchanged(&self) -> bool {
        self.modified_objects.is_empty()
    }

    /// Original bytes followed by the update section.
    ///
    /// An editor without changes returns the original bytes as they are.
    pub fn write(&self) -> Result<Vec<u8>> {
        if self.is_unchanged() {
            return Ok(self.source.to_vec());
        }

        let serializer = ObjectSerializer::new();
        let mut output = Vec::with_capacity(self.source.len() + self.modified_objects.len() * 256);
        output.extend_from_slice(&self.source);
        if !output.ends_with(b"\n") {
            output.push(b'\n');
        }

        let mut entries = Vec::with_capacity(self.modified_objects.len());
        for (&id, (gen, obj)) in &self.modified_objects {
            entries.push((id, *gen, output.len()));
            output.extend_from_slice(&serializer.serialize_indirect(id, *gen, obj));
        }

        let xref_offset = output.len();
        write_xref_section(&mut output, &entries, false);

        let mut trailer = self.trailer.clone();
        trailer.insert("Size".to_string(), Object::Integer(self.next_object_id as i64));
        trailer.insert("Prev".to_string(), Object::Integer(self.prev_xref as i64));
        output.extend_from_slice(b"trailer\n");
        output.extend_from_slice(&serializer.serialize(&Object::Dictionary(trailer)));
        output.extend_from_slice(format!("\nstartxref\n{}\n%%EOF\n", xref_offset).as_bytes());

        log::debug!(
            "incremental update: {} objects, {} bytes appended",
            self.modified_objects.len(),
            output.len() - self.source.len()
        );
        Ok(output)
    }

    /// Write the updated document to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.write()?)?;
        Ok(())
    }
}
