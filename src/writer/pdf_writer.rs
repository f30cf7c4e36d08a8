//! PDF document writer.
//!
//! Assembles complete PDF documents: header, body, xref table and trailer.
//! Object numbers are handed out in call order, so the same sequence of
//! calls always yields the same bytes.

use super::object_serializer::ObjectSerializer;
use super::write_xref_section;
use crate::error::Result;
use crate::object::{Dict, Object, ObjectRef};
use std::collections::BTreeMap;

/// Configuration for PDF generation.
#[derive(Debug, Clone)]
pub struct PdfWriterConfig {
    /// PDF version (e.g., "1.7")
    pub version: String,
    /// Document title
    pub title: Option<String>,
    /// Creator application
    pub creator: Option<String>,
    /// Whether to compress streams
    pub compress: bool,
}

impl Default for PdfWriterConfig {
    fn default() -> Self {
        Self {
            version: "1.7".to_string(),
            title: None,
            creator: Some("rm_lines".to_string()),
            compress: true,
        }
    }
}

impl PdfWriterConfig {
    /// Set document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the creator application.
    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = Some(creator.into());
        self
    }

    /// Enable or disable stream compression.
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }
}

/// Description of one page to add.
#[derive(Debug, Clone, Default)]
pub struct PageSpec {
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
    /// `/Rotate`, omitted when zero
    pub rotate: i64,
    /// Content streams, painted in order
    pub contents: Vec<ObjectRef>,
    /// Resource dictionary
    pub resources: Dict,
}

/// PDF document writer.
#[derive(Debug)]
pub struct PdfWriter {
    config: PdfWriterConfig,
    /// Object ID counter
    next_obj_id: u32,
    /// Allocated objects (id -> object)
    objects: BTreeMap<u32, Object>,
    /// Page objects in order
    pages: Vec<ObjectRef>,
    /// Reserved id of the page tree root
    pages_id: u32,
}

impl PdfWriter {
    /// Create a new PDF writer with default config.
    pub fn new() -> Self {
        Self::with_config(PdfWriterConfig::default())
    }

    /// Create a PDF writer with custom config.
    pub fn with_config(config: PdfWriterConfig) -> Self {
        Self {
            config,
            // 1 is the catalog, 2 the page tree.
            next_obj_id: 3,
            objects: BTreeMap::new(),
            pages: Vec::new(),
            pages_id: 2,
        }
    }

    /// Writer configuration.
    pub fn config(&self) -> &PdfWriterConfig {
        &self.config
    }

    fn alloc_obj_id(&mut self) -> u32 {
        let id = self.next_obj_id;
        self.next_obj_id += 1;
        id
    }

    /// Add an indirect object and return its reference.
    pub fn add_object(&mut self, obj: Object) -> ObjectRef {
        let id = self.alloc_obj_id();
        self.objects.insert(id, obj);
        ObjectRef::new(id, 0)
    }

    /// Add a content stream, compressed when the config says so.
    pub fn add_content(&mut self, data: Vec<u8>) -> Result<ObjectRef> {
        let stream = super::content_stream_object(data, self.config.compress)?;
        Ok(self.add_object(stream))
    }

    /// Add a page and return its reference.
    pub fn add_page(&mut self, page: PageSpec) -> ObjectRef {
        let mut dict = Dict::new();
        dict.insert("Type".to_string(), Object::name("Page"));
        dict.insert("Parent".to_string(), ObjectSerializer::reference(self.pages_id));
        dict.insert("MediaBox".to_string(), Object::number_array(&[0.0, 0.0, page.width, page.height]));
        if page.rotate != 0 {
            dict.insert("Rotate".to_string(), Object::Integer(page.rotate));
        }
        let contents = page.contents.into_iter().map(Object::Reference).collect();
        dict.insert("Contents".to_string(), Object::Array(contents));
        dict.insert("Resources".to_string(), Object::Dictionary(page.resources));

        let page_ref = self.add_object(Object::Dictionary(dict));
        self.pages.push(page_ref);
        page_ref
    }

    /// Number of pages added so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Build the complete PDF document.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let serializer = ObjectSerializer::new();

        self.objects.insert(
            1,
            ObjectSerializer::dict(vec![
                ("Type", Object::name("Catalog")),
                ("Pages", ObjectSerializer::reference(self.pages_id)),
            ]),
        );
        self.objects.insert(
            self.pages_id,
            ObjectSerializer::dict(vec![
                ("Type", Object::name("Pages")),
                ("Kids", Object::Array(self.pages.iter().copied().map(Object::Reference).collect())),
                ("Count", Object::Integer(self.pages.len() as i64)),
            ]),
        );

        let mut info = Vec::new();
        if let Some(title) = &self.config.title {
            info.push(("Title", ObjectSerializer::string(title)));
        }
        if let Some(creator) = &self.config.creator {
            info.push(("Creator", ObjectSerializer::string(creator)));
            info.push(("Producer", ObjectSerializer::string(creator)));
        }
        let info_ref = if info.is_empty() {
            None
        } else {
            Some(self.add_object(ObjectSerializer::dict(info)))
        };

        let mut output = format!("%PDF-{}\n", self.config.version).into_bytes();
        // Binary marker
        output.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

        let mut offsets = Vec::with_capacity(self.objects.len());
        for (id, obj) in &self.objects {
            offsets.push((*id, 0, output.len()));
            output.extend_from_slice(&serializer.serialize_indirect(*id, 0, obj));
        }

        let xref_start = output.len();
        write_xref_section(&mut output, &offsets, true);

        let mut trailer = vec![
            ("Size", Object::Integer(self.next_obj_id as i64)),
            ("Root", ObjectSerializer::reference(1)),
        ];
        if let Some(info_ref) = info_ref {
            trailer.push(("Info", Object::Reference(info_ref)));
        }
        output.extend_from_slice(b"trailer\n");
        output.extend_from_slice(&serializer.serialize(&ObjectSerializer::dict(trailer)));
        output.extend_from_slice(format!("\nstartxref\n{}\n%%EOF\n", xref_start).as_bytes());

        log::debug!("wrote {} objects, {} pages, {} bytes", self.objects.len(), self.pages.len(), output.len());
        Ok(output)
    }

    /// Save the PDF to a file.
    pub fn save(self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let bytes = self.finish()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}
