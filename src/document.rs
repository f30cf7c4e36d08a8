//! PDF document reader.
//!
//! The whole file is held in memory. Objects are parsed lazily through the
//! cross-reference table and cached; object streams are decoded once and
//! kept for later lookups.

use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::object::{Dict, Object, ObjectRef};
use crate::objstm::parse_object_stream;
use crate::parser::parse_indirect_object;
use crate::xref::{find_startxref, parse_xref, CrossRefTable, XRefEntry};
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Maximum recursion depth for object resolution and page tree walks
const MAX_RECURSION_DEPTH: u32 = 100;

/// Page attributes inherited from ancestor `/Pages` nodes.
const INHERITABLE: [&str; 4] = ["Resources", "MediaBox", "CropBox", "Rotate"];

/// Boxes tried, in order, for the area annotations are fitted to.
const BOX_PRIORITY: [&str; 5] = ["CropBox", "BleedBox", "TrimBox", "MediaBox", "ArtBox"];

/// One leaf of the page tree.
#[derive(Debug, Clone)]
pub struct Page {
    /// Zero-based position in document order
    pub index: usize,
    /// Indirect reference of the page dictionary
    pub obj_ref: ObjectRef,
    /// Page dictionary with inherited attributes copied in
    pub dict: Dict,
    /// Box strokes are fitted to; `None` when the page declares no usable box
    pub page_box: Option<Rect>,
    /// `/Rotate` in degrees
    pub rotate: i64,
}

/// PDF document.
///
/// # Example
///
/// ```no_run
/// use rm_lines::document::PdfDocument;
///
/// let mut doc = PdfDocument::open("sample.pdf")?;
/// println!("PDF version: {}.{}", doc.version().0, doc.version().1);
/// println!("Page count: {}", doc.page_count()?);
/// # Ok::<(), rm_lines::Error>(())
/// ```
pub struct PdfDocument {
    /// Complete file contents
    data: Bytes,
    /// PDF version (major, minor)
    version: (u8, u8),
    /// Offset named by the final `startxref`
    startxref: usize,
    /// Merged cross-reference table
    xref: CrossRefTable,
    /// Cache for loaded objects
    object_cache: HashMap<ObjectRef, Object>,
    /// Decoded object streams, by stream object number
    objstm_cache: HashMap<u32, HashMap<u32, Object>>,
    /// Objects currently being loaded (cycle detection)
    resolving_stack: HashSet<ObjectRef>,
    /// Current recursion depth
    recursion_depth: u32,
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("version", &self.version)
            .field("bytes", &self.data.len())
            .field("xref_entries", &self.xref.len())
            .field("cached_objects", &self.object_cache.len())
            .finish_non_exhaustive()
    }
}

impl PdfDocument {
    /// Open a PDF document from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the header is invalid,
    /// the cross-reference data cannot be parsed, or the file is encrypted.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        log::debug!("read {} bytes from {}", data.len(), path.as_ref().display());
        Self::from_bytes(data)
    }

    /// Parse a PDF held in memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let version = parse_header(&data)?;
        let startxref = find_startxref(&data)?;
        let xref = parse_xref(&data, startxref)?;

        if xref.trailer().contains_key("Encrypt") {
            return Err(Error::InvalidPdf("encrypted documents are not supported".to_string()));
        }
        if !xref.trailer().contains_key("Root") {
            return Err(Error::InvalidPdf("trailer has no /Root".to_string()));
        }

        log::debug!(
            "PDF {}.{}: {} xref entries, startxref {}",
            version.0,
            version.1,
            xref.len(),
            startxref
        );

        Ok(Self {
            data: Bytes::from(data),
            version,
            startxref,
            xref,
            object_cache: HashMap::new(),
            objstm_cache: HashMap::new(),
            resolving_stack: HashSet::new(),
            recursion_depth: 0,
        })
    }

    /// PDF version from the header.
    pub fn version(&self) -> (u8, u8) {
        self.version
    }

    /// Raw file contents.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Shared handle to the raw file contents.
    pub fn source_bytes(&self) -> Bytes {
        self.data.clone()
    }

    /// Offset of the newest cross-reference section.
    pub fn startxref(&self) -> usize {
        self.startxref
    }

    /// Newest trailer dictionary.
    pub fn trailer(&self) -> &Dict {
        self.xref.trailer()
    }

    /// First object number not used by the document.
    pub fn next_object_id(&self) -> u32 {
        self.xref.size().max(1)
    }

    /// Load an indirect object.
    ///
    /// Free or missing objects resolve to `Null`, as PDF readers are required
    /// to treat them.
    pub fn load_object(&mut self, obj_ref: ObjectRef) -> Result<Object> {
        if let Some(cached) = self.object_cache.get(&obj_ref) {
            return Ok(cached.clone());
        }
        if self.recursion_depth >= MAX_RECURSION_DEPTH {
            return Err(Error::RecursionLimitExceeded(MAX_RECURSION_DEPTH));
        }
        if self.resolving_stack.contains(&obj_ref) {
            return Err(Error::CircularReference(obj_ref));
        }

        self.resolving_stack.insert(obj_ref);
        self.recursion_depth += 1;
        let result = self.load_uncached(obj_ref);
        self.recursion_depth -= 1;
        self.resolving_stack.remove(&obj_ref);

        let object = result?;
        self.object_cache.insert(obj_ref, object.clone());
        Ok(object)
    }

    fn load_uncached(&mut self, obj_ref: ObjectRef) -> Result<Object> {
        match self.xref.get(obj_ref.id) {
            Some(XRefEntry::InUse { offset, gen }) => {
                if gen != obj_ref.gen {
                    log::warn!("object {} requested with gen {}, xref has gen {}", obj_ref.id, obj_ref.gen, gen);
                }
                let (found, object) = parse_indirect_object(&self.data, offset)?;
                if found.id != obj_ref.id {
                    return Err(Error::ParseError {
                        offset,
                        reason: format!("expected object {}, found {}", obj_ref.id, found.id),
                    });
                }
                Ok(object)
            },
            Some(XRefEntry::Compressed { stream, index }) => {
                log::debug!("object {} is compressed in stream {} (index {})", obj_ref.id, stream, index);
                self.load_compressed(obj_ref, stream)
            },
            Some(XRefEntry::Free) | None => {
                log::debug!("object {} is free or missing; treating as null", obj_ref);
                Ok(Object::Null)
            },
        }
    }

    fn load_compressed(&mut self, obj_ref: ObjectRef, stream_id: u32) -> Result<Object> {
        if !self.objstm_cache.contains_key(&stream_id) {
            let stream = self.load_object(ObjectRef::new(stream_id, 0))?;
            let members = parse_object_stream(&stream)?;
            self.objstm_cache.insert(stream_id, members);
        }
        self.objstm_cache
            .get(&stream_id)
            .and_then(|members| members.get(&obj_ref.id))
            .cloned()
            .ok_or(Error::ObjectNotFound(obj_ref.id, obj_ref.gen))
    }

    /// Follow a reference, or clone a direct object.
    pub fn resolve(&mut self, obj: &Object) -> Result<Object> {
        match obj {
            Object::Reference(r) => self.load_object(*r),
            other => Ok(other.clone()),
        }
    }

    /// Reference to the document catalog.
    pub fn catalog_ref(&self) -> Result<ObjectRef> {
        self.trailer()
            .get("Root")
            .and_then(Object::as_reference)
            .ok_or_else(|| Error::InvalidPdf("trailer /Root is not a reference".to_string()))
    }

    /// Document catalog dictionary.
    pub fn catalog(&mut self) -> Result<Dict> {
        let root = self.catalog_ref()?;
        let catalog = self.load_object(root)?;
        Ok(catalog.expect_dict()?.clone())
    }

    /// Reference to the root `/Pages` node.
    pub fn pages_root_ref(&mut self) -> Result<ObjectRef> {
        self.catalog()?
            .get("Pages")
            .and_then(Object::as_reference)
            .ok_or_else(|| Error::InvalidPdf("catalog /Pages is not a reference".to_string()))
    }

    /// All pages in document order.
    pub fn pages(&mut self) -> Result<Vec<Page>> {
        let root = self.pages_root_ref()?;
        let mut pages = Vec::new();
        let mut visited = HashSet::new();
        self.walk_page_tree(root, &Dict::new(), 0, &mut visited, &mut pages)?;
        log::debug!("page tree holds {} pages", pages.len());
        Ok(pages)
    }

    /// Number of pages reachable from the page tree.
    pub fn page_count(&mut self) -> Result<usize> {
        Ok(self.pages()?.len())
    }

    fn walk_page_tree(
        &mut self,
        node_ref: ObjectRef,
        inherited: &Dict,
        depth: u32,
        visited: &mut HashSet<ObjectRef>,
        pages: &mut Vec<Page>,
    ) -> Result<()> {
        if depth > MAX_RECURSION_DEPTH {
            return Err(Error::RecursionLimitExceeded(MAX_RECURSION_DEPTH));
        }
        if !visited.insert(node_ref) {
            log::warn!("page tree node {} visited twice; skipping", node_ref);
            return Ok(());
        }

        let node = self.load_object(node_ref)?;
        let mut dict = node.expect_dict()?.clone();

        let mut attrs = inherited.clone();
        for key in INHERITABLE {
            if let Some(value) = dict.get(key) {
                attrs.insert(key.to_string(), value.clone());
            }
        }

        let is_tree_node = dict.get("Type").and_then(Object::as_name) == Some("Pages") || dict.contains_key("Kids");
        if is_tree_node {
            let kids = match dict.get("Kids") {
                Some(kids) => self.resolve(kids)?,
                None => Object::Array(Vec::new()),
            };
            for kid in kids.as_array().map(Vec::as_slice).unwrap_or_default() {
                match kid.as_reference() {
                    Some(kid_ref) => self.walk_page_tree(kid_ref, &attrs, depth + 1, visited, pages)?,
                    None => log::warn!("direct object in /Kids of {} ignored", node_ref),
                }
            }
            return Ok(());
        }

        for (key, value) in attrs {
            dict.entry(key).or_insert(value);
        }
        let page_box = self.page_box(&dict)?;
        let rotate = match dict.get("Rotate") {
            Some(r) => self.resolve(r)?.as_integer().unwrap_or(0),
            None => 0,
        };

        pages.push(Page {
            index: pages.len(),
            obj_ref: node_ref,
            dict,
            page_box,
            rotate,
        });
        Ok(())
    }

    fn page_box(&mut self, dict: &Dict) -> Result<Option<Rect>> {
        for key in BOX_PRIORITY {
            let Some(value) = dict.get(key) else { continue };
            if let Some(rect) = self.rect(value)? {
                return Ok(Some(rect));
            }
        }
        Ok(None)
    }

    fn rect(&mut self, value: &Object) -> Result<Option<Rect>> {
        let array = self.resolve(value)?;
        let Some(items) = array.as_array() else {
            return Ok(None);
        };
        if items.len() != 4 {
            return Ok(None);
        }
        let mut coords = [0f32; 4];
        for (slot, item) in coords.iter_mut().zip(items) {
            match self.resolve(item)?.as_number() {
                Some(n) => *slot = n as f32,
                None => return Ok(None),
            }
        }
        Ok(Some(Rect::from_points(coords[0], coords[1], coords[2], coords[3])))
    }
}

/// Parse the `%PDF-M.m` header.
///
/// # Example
///
/// ```
/// use rm_lines::document::parse_header;
///
/// assert_eq!(parse_header(b"%PDF-1.7\n").unwrap(), (1, 7));
/// assert!(parse_header(b"GIF89a").is_err());
/// ```
pub fn parse_header(data: &[u8]) -> Result<(u8, u8)> {
    // Some producers put junk before the header; readers accept it within 1 KB.
    let window = &data[..data.len().min(1024)];
    let start = crate::parser::find(window, b"%PDF-").ok_or_else(|| {
        Error::InvalidHeader(String::from_utf8_lossy(&data[..data.len().min(5)]).into_owned())
    })?;
    let version = data.get(start + 5..start + 8).unwrap_or_default();
    match version {
        [major, b'.', minor] if major.is_ascii_digit() && minor.is_ascii_digit() => {
            Ok((major - b'0', minor - b'0'))
        },
        _ => Err(Error::InvalidHeader(format!(
            "%PDF-{}",
            String::from_utf8_lossy(version)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a classic-xref PDF from `(id, body)` pairs.
    fn build_pdf(objects: &[(u32, &str)], root: u32) -> Vec<u8> {
        let mut out = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (id, body) in objects {
            offsets.push((*id, out.len()));
            out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", id, body).as_bytes());
        }
        let size = objects.iter().map(|(id, _)| id + 1).max().unwrap_or(1);
        let xref_at = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", size).as_bytes());
        for id in 1..size {
            match offsets.iter().find(|(i, _)| *i == id) {
                Some((_, off)) => out.extend_from_slice(format!("{:010} 00000 n \n", off).as_bytes()),
                None => out.extend_from_slice(b"0000000000 00000 f \n"),
            }
        }
        out.extend_from_slice(
            format!("trailer\n<< /Size {} /Root {} 0 R >>\nstartxref\n{}\n%%EOF\n", size, root, xref_at).as_bytes(),
        );
        out
    }

    fn three_pages() -> Vec<u8> {
        build_pdf(
            &[
                (1, "<< /Type /Catalog /Pages 2 0 R >>"),
                (2, "<< /Type /Pages /Kids [3 0 R 4 0 R] /Count 3 /MediaBox [0 0 612 792] /Resources << >> >>"),
                (3, "<< /Type /Page /Parent 2 0 R /CropBox [10 10 600 780] >>"),
                (4, "<< /Type /Pages /Parent 2 0 R /Kids [5 0 R 6 0 R] /Count 2 /Rotate 90 >>"),
                (5, "<< /Type /Page /Parent 4 0 R /MediaBox 7 0 R >>"),
                (6, "<< /Type /Page /Parent 4 0 R >>"),
                (7, "[0 0 842 595]"),
            ],
            1,
        )
    }

    // ========================================================================
    // Header
    // ========================================================================

    #[test]
    fn test_parse_header_versions() {
        assert_eq!(parse_header(b"%PDF-1.4\n").unwrap(), (1, 4));
        assert_eq!(parse_header(b"%PDF-2.0\n").unwrap(), (2, 0));
        assert_eq!(parse_header(b"\xEF\xBB\xBF%PDF-1.6\n").unwrap(), (1, 6));
    }

    #[test]
    fn test_parse_header_invalid() {
        match parse_header(b"%PDF-x.y") {
            Err(Error::InvalidHeader(found)) => assert!(found.contains("x.y")),
            other => panic!("Expected InvalidHeader error, got {:?}", other),
        }
        assert!(parse_header(b"").is_err());
    }

    // ========================================================================
    // Page tree
    // ========================================================================

    #[test]
    fn test_pages_in_order_with_inheritance() {
        let mut doc = PdfDocument::from_bytes(three_pages()).unwrap();
        let pages = doc.pages().unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages.iter().map(|p| p.obj_ref.id).collect::<Vec<_>>(), vec![3, 5, 6]);

        // CropBox wins over the inherited MediaBox.
        assert_eq!(pages[0].page_box, Some(Rect::from_points(10.0, 10.0, 600.0, 780.0)));
        assert_eq!(pages[0].rotate, 0);
        assert!(pages[0].dict.contains_key("Resources"));

        // Indirect MediaBox is resolved.
        assert_eq!(pages[1].page_box, Some(Rect::from_points(0.0, 0.0, 842.0, 595.0)));
        assert_eq!(pages[1].rotate, 90);

        // Inherited from the root node.
        assert_eq!(pages[2].page_box, Some(Rect::from_points(0.0, 0.0, 612.0, 792.0)));
        assert_eq!(pages[2].index, 2);
    }

    #[test]
    fn test_page_without_box() {
        let pdf = build_pdf(
            &[
                (1, "<< /Type /Catalog /Pages 2 0 R >>"),
                (2, "<< /Type /Pages /Kids [3 0 R] /Count 1 >>"),
                (3, "<< /Type /Page /Parent 2 0 R >>"),
            ],
            1,
        );
        let mut doc = PdfDocument::from_bytes(pdf).unwrap();
        assert_eq!(doc.pages().unwrap()[0].page_box, None);
    }

    #[test]
    fn test_page_tree_cycle_is_cut() {
        let pdf = build_pdf(
            &[
                (1, "<< /Type /Catalog /Pages 2 0 R >>"),
                (2, "<< /Type /Pages /Kids [3 0 R 2 0 R] /Count 1 >>"),
                (3, "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 100 100] >>"),
            ],
            1,
        );
        let mut doc = PdfDocument::from_bytes(pdf).unwrap();
        assert_eq!(doc.page_count().unwrap(), 1);
    }

    // ========================================================================
    // Objects
    // ========================================================================

    #[test]
    fn test_missing_object_is_null() {
        let mut doc = PdfDocument::from_bytes(three_pages()).unwrap();
        assert!(doc.load_object(ObjectRef::new(99, 0)).unwrap().is_null());
    }

    #[test]
    fn test_trailer_and_next_id() {
        let doc = PdfDocument::from_bytes(three_pages()).unwrap();
        assert_eq!(doc.next_object_id(), 8);
        assert_eq!(doc.trailer()["Root"], Object::Reference(ObjectRef::new(1, 0)));
        assert_eq!(doc.version(), (1, 4));
    }

    #[test]
    fn test_encrypted_rejected() {
        let mut pdf = three_pages();
        let pos = crate::parser::find(&pdf, b"/Root").unwrap();
        pdf.splice(pos..pos, b"/Encrypt 9 0 R ".iter().copied());
        match PdfDocument::from_bytes(pdf) {
            Err(Error::InvalidPdf(msg)) => assert!(msg.contains("encrypted")),
            other => panic!("Expected InvalidPdf error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_open_nonexistent_file() {
        assert!(matches!(PdfDocument::open("/nonexistent/file.pdf"), Err(Error::Io(_))));
    }
}
