//! Overlaying strokes onto an existing PDF.
//!
//! Every annotated page is rewritten as
//! `Contents = [q, original contents..., Q + overlay]` so the overlay is
//! drawn in the page's default user space whatever state the original
//! content leaves behind. Inherited attributes are copied into the page and
//! the overlay's ExtGStates are merged into its resources.

use super::load_page_strokes;
use crate::config::RenderOptions;
use crate::document::{Page, PdfDocument};
use crate::editor::DocumentEditor;
use crate::error::{Error, Result, Warning};
use crate::highlights::PageHighlights;
use crate::mapper::PageLayout;
use crate::object::{Dict, Object, ObjectRef};
use crate::render::{Overlay, StrokeRenderer};
use crate::writer::content_stream_object;
use std::path::{Path, PathBuf};

/// Output of a PDF annotation render.
#[derive(Debug, Clone)]
pub struct AnnotatedPdf {
    /// Every source page, annotated ones carrying their overlay
    pub full: Vec<u8>,
    /// Only the annotated pages, in source order
    pub annotated_only: Vec<u8>,
    /// Page count of the source document
    pub page_count: usize,
    /// Zero-based indices of the annotated pages
    pub annotated_pages: Vec<usize>,
    /// Non-fatal problems met along the way
    pub warnings: Vec<Warning>,
}

impl AnnotatedPdf {
    /// Write both documents.
    pub fn save(&self, full: impl AsRef<Path>, annotated_only: impl AsRef<Path>) -> Result<()> {
        std::fs::write(full, &self.full)?;
        std::fs::write(annotated_only, &self.annotated_only)?;
        Ok(())
    }
}

/// A page ready to be staged into an update.
struct PageRewrite {
    obj_ref: ObjectRef,
    /// Page dictionary with inherited attributes and merged resources
    dict: Dict,
    /// Original content stream references, in paint order
    contents: Vec<Object>,
    /// Overlay content, without the leading `Q`
    overlay: Vec<u8>,
}

/// Merges rendered strokes onto the pages of a PDF.
#[derive(Debug, Clone)]
pub struct PdfAnnotator<'a> {
    options: &'a RenderOptions,
    highlights_dir: Option<PathBuf>,
    page_ids: Vec<String>,
}

impl<'a> PdfAnnotator<'a> {
    /// Annotator without snapped highlights.
    pub fn new(options: &'a RenderOptions) -> Self {
        Self {
            options,
            highlights_dir: None,
            page_ids: Vec::new(),
        }
    }

    /// Draw snapped highlights from `<dir>/<page-id>.json`.
    ///
    /// Page `n` uses `page_ids[n]`, or `n` itself past the end of the list.
    pub fn with_highlights(mut self, dir: impl Into<PathBuf>, page_ids: Vec<String>) -> Self {
        self.highlights_dir = Some(dir.into());
        self.page_ids = page_ids;
        self
    }

    /// Annotate the PDF at `source` with the stroke files in `strokes_dir`.
    ///
    /// # Errors
    ///
    /// [`Error::MissingSourcePdf`] when `source` does not exist, or any error
    /// reading the source document.
    pub fn annotate(&self, source: impl AsRef<Path>, strokes_dir: impl AsRef<Path>) -> Result<AnnotatedPdf> {
        let source = source.as_ref();
        if !source.is_file() {
            return Err(Error::MissingSourcePdf(source.to_path_buf()));
        }
        let doc = PdfDocument::open(source)?;
        self.annotate_document(doc, strokes_dir)
    }

    /// Annotate an already parsed document.
    pub fn annotate_document(&self, mut doc: PdfDocument, strokes_dir: impl AsRef<Path>) -> Result<AnnotatedPdf> {
        let strokes_dir = strokes_dir.as_ref();
        let pages = doc.pages()?;
        let mut warnings = Vec::new();
        let mut rewrites = Vec::new();
        let mut annotated_pages = Vec::new();

        for page in &pages {
            let Some(overlay) = self.render_page(page, strokes_dir, &mut warnings)? else {
                continue;
            };
            rewrites.push(prepare_page(&mut doc, page, overlay)?);
            annotated_pages.push(page.index);
        }

        let pages_root = doc.pages_root_ref()?;
        let root_dict = doc.load_object(pages_root)?.expect_dict()?.clone();

        let mut full = DocumentEditor::new(&doc);
        let mut only = DocumentEditor::new(&doc);
        for rewrite in &rewrites {
            self.stage_page(&mut full, rewrite, None)?;
            self.stage_page(&mut only, rewrite, Some(pages_root))?;
        }

        let mut root_dict = root_dict;
        root_dict.insert(
            "Kids".to_string(),
            Object::Array(rewrites.iter().map(|r| Object::Reference(r.obj_ref)).collect()),
        );
        root_dict.insert("Count".to_string(), Object::Integer(rewrites.len() as i64));
        only.replace_object(pages_root, Object::Dictionary(root_dict));

        log::info!(
            "annotated {} of {} pages ({} warnings)",
            annotated_pages.len(),
            pages.len(),
            warnings.len()
        );

        Ok(AnnotatedPdf {
            full: full.write()?,
            annotated_only: only.write()?,
            page_count: pages.len(),
            annotated_pages,
            warnings,
        })
    }

    fn render_page(&self, page: &Page, strokes_dir: &Path, warnings: &mut Vec<Warning>) -> Result<Option<Overlay>> {
        let Some(strokes) = load_page_strokes(strokes_dir, page.index, self.options, warnings)? else {
            return Ok(None);
        };
        let Some(layout) = page.page_box.and_then(PageLayout::from_box) else {
            log::warn!("page {} has no usable page box; leaving it unannotated", page.index);
            warnings.push(Warning::SkippedPage {
                page: page.index,
                reason: "no usable page box".to_string(),
            });
            return Ok(None);
        };

        let highlights = self.page_highlights(page.index, warnings)?;
        let mut overlay = StrokeRenderer::new(layout, self.options)
            .with_page(page.index)
            .render_with_highlights(&strokes, highlights.as_ref());
        warnings.append(&mut overlay.warnings);
        Ok(Some(overlay))
    }

    fn page_highlights(&self, page: usize, warnings: &mut Vec<Warning>) -> Result<Option<PageHighlights>> {
        let Some(dir) = &self.highlights_dir else {
            return Ok(None);
        };
        let id = self.page_ids.get(page).cloned().unwrap_or_else(|| page.to_string());
        let path = dir.join(format!("{}.json", id));
        if !path.exists() {
            return Ok(None);
        }
        match PageHighlights::open(&path) {
            Ok(h) => Ok(Some(h)),
            Err(e) if !self.options.strict => {
                log::warn!("ignoring highlights {}: {}", path.display(), e);
                warnings.push(Warning::MalformedHighlights {
                    page,
                    reason: e.to_string(),
                    path,
                });
                Ok(None)
            },
            Err(e) => Err(e),
        }
    }

    fn stage_page(&self, editor: &mut DocumentEditor, rewrite: &PageRewrite, parent: Option<ObjectRef>) -> Result<()> {
        let open = editor.add_object(content_stream_object(b"q\n".to_vec(), false)?);
        let mut overlay = b"Q\n".to_vec();
        overlay.extend_from_slice(&rewrite.overlay);
        let close = editor.add_object(content_stream_object(overlay, self.options.compress)?);

        let mut contents = Vec::with_capacity(rewrite.contents.len() + 2);
        contents.push(Object::Reference(open));
        contents.extend(rewrite.contents.iter().cloned());
        contents.push(Object::Reference(close));

        let mut dict = rewrite.dict.clone();
        dict.insert("Contents".to_string(), Object::Array(contents));
        if let Some(parent) = parent {
            dict.insert("Parent".to_string(), Object::Reference(parent));
        }
        editor.replace_object(rewrite.obj_ref, Object::Dictionary(dict));
        Ok(())
    }
}

/// Resolve everything a page rewrite needs from the source document.
fn prepare_page(doc: &mut PdfDocument, page: &Page, overlay: Overlay) -> Result<PageRewrite> {
    let (content, states) = overlay.to_content()?;
    let mut dict = page.dict.clone();

    let contents = match dict.remove("Contents") {
        Some(Object::Reference(r)) => match doc.load_object(r)? {
            Object::Array(items) => items,
            Object::Null => Vec::new(),
            _ => vec![Object::Reference(r)],
        },
        Some(Object::Array(items)) => items,
        Some(Object::Null) | None => Vec::new(),
        Some(other) => {
            return Err(Error::InvalidObjectType {
                expected: "Stream or Array".to_string(),
                found: other.type_name().to_string(),
            })
        },
    };

    let mut resources = match dict.get("Resources") {
        Some(r) => match doc.resolve(r)? {
            Object::Dictionary(d) => d,
            _ => Dict::new(),
        },
        None => Dict::new(),
    };
    if !states.is_empty() {
        let mut ext = match resources.get("ExtGState") {
            Some(e) => match doc.resolve(e)? {
                Object::Dictionary(d) => d,
                _ => Dict::new(),
            },
            None => Dict::new(),
        };
        ext.extend(states);
        resources.insert("ExtGState".to_string(), Object::Dictionary(ext));
    }
    dict.insert("Resources".to_string(), Object::Dictionary(resources));

    Ok(PageRewrite {
        obj_ref: page.obj_ref,
        dict,
        contents,
        overlay: content,
    })
}
