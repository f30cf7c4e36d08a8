//! Notebooks: documents built from stroke files alone.
//!
//! Pages are discovered as `0.rm`, `1.rm`, ... and discovery stops at the
//! first missing index. Every page has the native 1404x1872 size; landscape
//! notebooks keep the portrait page and set `/Rotate 90`.

use super::{load_page_strokes, stroke_path};
use crate::config::RenderOptions;
use crate::error::{Result, Warning};
use crate::lines::{DEVICE_HEIGHT, DEVICE_WIDTH};
use crate::mapper::PageLayout;
use crate::object::{Dict, Object, ObjectRef};
use crate::render::StrokeRenderer;
use crate::template::PageTemplates;
use crate::writer::{ContentStreamBuilder, PageSpec, PdfWriter, PdfWriterConfig};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Resource name of the template image on each page.
const TEMPLATE_RESOURCE: &str = "RmTpl";

/// Output of a notebook render.
#[derive(Debug, Clone)]
pub struct NotebookPdf {
    /// The document
    pub pdf: Vec<u8>,
    /// Number of pages written
    pub page_count: usize,
    /// Non-fatal problems met along the way
    pub warnings: Vec<Warning>,
}

impl NotebookPdf {
    /// Write the document to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.pdf)?;
        Ok(())
    }
}

/// Builds notebook documents.
#[derive(Debug, Clone)]
pub struct NotebookComposer<'a> {
    options: &'a RenderOptions,
    templates: PageTemplates,
    title: Option<String>,
}

impl<'a> NotebookComposer<'a> {
    /// Composer drawing every page on a blank background.
    pub fn new(options: &'a RenderOptions) -> Self {
        Self {
            options,
            templates: PageTemplates::default(),
            title: None,
        }
    }

    /// Use page templates.
    pub fn with_templates(mut self, templates: PageTemplates) -> Self {
        self.templates = templates;
        self
    }

    /// Document title written to the info dictionary.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Number of contiguous stroke files starting at `0.rm`.
    pub fn discover(strokes_dir: &Path) -> usize {
        (0..).take_while(|&n| stroke_path(strokes_dir, n).exists()).count()
    }

    /// Render the notebook whose stroke files live in `strokes_dir`.
    pub fn compose(&self, strokes_dir: impl AsRef<Path>) -> Result<NotebookPdf> {
        let strokes_dir = strokes_dir.as_ref();
        let page_count = Self::discover(strokes_dir);
        log::info!("notebook {}: {} pages", strokes_dir.display(), page_count);

        let mut config = PdfWriterConfig::default().with_compress(self.options.compress);
        if let Some(title) = &self.title {
            config = config.with_title(title.clone());
        }
        let mut writer = PdfWriter::with_config(config);
        let mut warnings = Vec::new();
        let mut embedded: HashMap<PathBuf, (ObjectRef, u32, u32)> = HashMap::new();

        // Strokes are stored in the portrait frame whatever the orientation.
        let layout = PageLayout::native(false);
        let rotate = if self.options.landscape { 90 } else { 0 };

        for page in 0..page_count {
            let mut content = ContentStreamBuilder::new();
            let mut resources = Dict::new();

            if let Some((image_ref, width, height)) = self.template(&mut writer, page, &mut embedded, &mut warnings) {
                content.draw_image(TEMPLATE_RESOURCE, 0.0, 0.0, width as f32, height as f32);
                let mut xobjects = Dict::new();
                xobjects.insert(TEMPLATE_RESOURCE.to_string(), Object::Reference(image_ref));
                resources.insert("XObject".to_string(), Object::Dictionary(xobjects));
            }

            let mut bytes = content.build()?;
            if let Some(strokes) = load_page_strokes(strokes_dir, page, self.options, &mut warnings)? {
                let mut overlay = StrokeRenderer::new(layout, self.options)
                    .with_page(page)
                    .render(&strokes);
                warnings.append(&mut overlay.warnings);
                let (overlay_bytes, states) = overlay.to_content_with_resources()?;
                bytes.extend_from_slice(&overlay_bytes);
                if !states.is_empty() {
                    resources.insert("ExtGState".to_string(), Object::Dictionary(states));
                }
            }

            let contents = if bytes.is_empty() {
                Vec::new()
            } else {
                vec![writer.add_content(bytes)?]
            };
            writer.add_page(PageSpec {
                width: DEVICE_WIDTH,
                height: DEVICE_HEIGHT,
                rotate,
                contents,
                resources,
            });
        }

        Ok(NotebookPdf {
            pdf: writer.finish()?,
            page_count,
            warnings,
        })
    }

    /// Embed (once per file) the template of a page.
    fn template(
        &self,
        writer: &mut PdfWriter,
        page: usize,
        embedded: &mut HashMap<PathBuf, (ObjectRef, u32, u32)>,
        warnings: &mut Vec<Warning>,
    ) -> Option<(ObjectRef, u32, u32)> {
        let path = self.templates.path(page)?;
        if let Some(found) = embedded.get(&path) {
            return Some(*found);
        }
        let image = self.templates.load(page, warnings)?;
        let smask = image.soft_mask_xobject().map(|mask| writer.add_object(mask));
        let image_ref = writer.add_object(image.to_xobject(smask));
        let entry = (image_ref, image.width, image.height);
        embedded.insert(path, entry);
        Some(entry)
    }
}
