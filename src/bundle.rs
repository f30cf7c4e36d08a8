//! Document bundles as laid out by the sync layer.
//!
//! ```text
//! <root>/<uuid>/<n>.rm               stroke file of page n
//! <root>/<uuid>/<n>-metadata.json    layer names of page n
//! <root>/<uuid>.pdf                  source PDF (annotation mode)
//! <root>/<uuid>.pagedata             template name per page (notebook mode)
//! <root>/<uuid>.content              document metadata
//! <root>/<uuid>.highlights/<id>.json snapped highlights of page <id>
//! ```

use crate::compose::{AnnotatedPdf, NotebookComposer, NotebookPdf, PdfAnnotator};
use crate::config::RenderOptions;
use crate::error::{Result, Warning};
use crate::template::PageTemplates;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Parsed `<uuid>.content`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentInfo {
    /// Page ids in page order
    pub pages: Vec<String>,
    /// `"portrait"` or `"landscape"`
    pub orientation: Option<String>,
    /// `"pdf"`, `"epub"` or `"notebook"`
    pub file_type: Option<String>,
}

impl ContentInfo {
    /// Parse `.content` JSON.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// True for `"orientation": "landscape"`.
    pub fn is_landscape(&self) -> bool {
        self.orientation.as_deref() == Some("landscape")
    }
}

/// How a bundle is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Strokes are merged onto `<uuid>.pdf`
    PdfAnnotation,
    /// Pages are built from stroke files and templates
    Notebook,
}

/// Result of [`render_bundle`].
#[derive(Debug, Clone)]
pub enum BundleOutput {
    /// PDF annotation mode output
    Annotated(AnnotatedPdf),
    /// Notebook mode output
    Notebook(NotebookPdf),
}

impl BundleOutput {
    /// Warnings collected while rendering.
    pub fn warnings(&self) -> &[Warning] {
        match self {
            BundleOutput::Annotated(out) => &out.warnings,
            BundleOutput::Notebook(out) => &out.warnings,
        }
    }

    /// Write `<uuid>.pdf` into `dir`, plus `<uuid>.annotated-only.pdf` in
    /// annotation mode. Returns the written paths.
    pub fn save(&self, dir: impl AsRef<Path>, uuid: &str) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let main = dir.join(format!("{}.pdf", uuid));
        match self {
            BundleOutput::Annotated(out) => {
                let only = dir.join(format!("{}.annotated-only.pdf", uuid));
                out.save(&main, &only)?;
                Ok(vec![main, only])
            },
            BundleOutput::Notebook(out) => {
                out.save(&main)?;
                Ok(vec![main])
            },
        }
    }
}

/// One document `<uuid>` under a root directory.
#[derive(Debug, Clone)]
pub struct DocumentBundle {
    root: PathBuf,
    uuid: String,
    content: ContentInfo,
}

impl DocumentBundle {
    /// Bundle without reading anything.
    pub fn new(root: impl Into<PathBuf>, uuid: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            uuid: uuid.into(),
            content: ContentInfo::default(),
        }
    }

    /// Bundle with its `.content` file loaded, when there is one.
    pub fn open(root: impl Into<PathBuf>, uuid: impl Into<String>) -> Result<Self> {
        let mut bundle = Self::new(root, uuid);
        let path = bundle.content_path();
        if path.exists() {
            bundle.content = ContentInfo::from_json(&std::fs::read_to_string(&path)?)?;
            log::debug!("{}: {} page ids", path.display(), bundle.content.pages.len());
        }
        Ok(bundle)
    }

    /// Document id.
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Document metadata, empty without a `.content` file.
    pub fn content(&self) -> &ContentInfo {
        &self.content
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        self.root.join(format!("{}{}", self.uuid, suffix))
    }

    /// Directory holding the stroke files.
    pub fn strokes_dir(&self) -> PathBuf {
        self.root.join(&self.uuid)
    }

    /// Source PDF.
    pub fn pdf_path(&self) -> PathBuf {
        self.sibling(".pdf")
    }

    /// Page template list.
    pub fn pagedata_path(&self) -> PathBuf {
        self.sibling(".pagedata")
    }

    /// Document metadata.
    pub fn content_path(&self) -> PathBuf {
        self.sibling(".content")
    }

    /// Directory holding snapped highlights.
    pub fn highlights_dir(&self) -> PathBuf {
        self.sibling(".highlights")
    }

    /// Mode chosen by the presence of the source PDF.
    pub fn mode(&self) -> RenderMode {
        if self.pdf_path().is_file() {
            RenderMode::PdfAnnotation
        } else {
            RenderMode::Notebook
        }
    }
}

/// Render a bundle in the mode its files call for.
///
/// Notebooks are landscape when `options.landscape` is set or the
/// `.content` file says so.
pub fn render_bundle(bundle: &DocumentBundle, options: &RenderOptions) -> Result<BundleOutput> {
    match bundle.mode() {
        RenderMode::PdfAnnotation => {
            log::info!("{}: annotating {}", bundle.uuid(), bundle.pdf_path().display());
            let out = PdfAnnotator::new(options)
                .with_highlights(bundle.highlights_dir(), bundle.content().pages.clone())
                .annotate(bundle.pdf_path(), bundle.strokes_dir())?;
            Ok(BundleOutput::Annotated(out))
        },
        RenderMode::Notebook => {
            let mut options = options.clone();
            options.landscape |= bundle.content().is_landscape();
            log::info!(
                "{}: building {} notebook",
                bundle.uuid(),
                if options.landscape { "landscape" } else { "portrait" }
            );
            let templates = PageTemplates::from_pagedata(options.templates_dir.clone(), bundle.pagedata_path())?;
            let out = NotebookComposer::new(&options)
                .with_templates(templates)
                .compose(bundle.strokes_dir())?;
            Ok(BundleOutput::Notebook(out))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths() {
        let bundle = DocumentBundle::new("/data", "abc");
        assert_eq!(bundle.strokes_dir(), PathBuf::from("/data/abc"));
        assert_eq!(bundle.pdf_path(), PathBuf::from("/data/abc.pdf"));
        assert_eq!(bundle.pagedata_path(), PathBuf::from("/data/abc.pagedata"));
        assert_eq!(bundle.content_path(), PathBuf::from("/data/abc.content"));
        assert_eq!(bundle.highlights_dir(), PathBuf::from("/data/abc.highlights"));
    }

    #[test]
    fn test_content_info() {
        let info = ContentInfo::from_json(
            r#"{"pages":["p1","p2"],"orientation":"landscape","fileType":"notebook","extra":1}"#,
        )
        .unwrap();
        assert_eq!(info.pages, vec!["p1", "p2"]);
        assert!(info.is_landscape());
        assert_eq!(info.file_type.as_deref(), Some("notebook"));

        let empty = ContentInfo::from_json("{}").unwrap();
        assert!(!empty.is_landscape());
        assert!(empty.pages.is_empty());
    }

    #[test]
    fn test_mode_follows_pdf() {
        let dir = TempDir::new().unwrap();
        let bundle = DocumentBundle::open(dir.path(), "abc").unwrap();
        assert_eq!(bundle.mode(), RenderMode::Notebook);
        std::fs::write(bundle.pdf_path(), b"%PDF-1.4\n").unwrap();
        assert_eq!(bundle.mode(), RenderMode::PdfAnnotation);
    }

    #[test]
    fn test_content_file_is_read() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("abc.content"), r#"{"orientation":"landscape"}"#).unwrap();
        let bundle = DocumentBundle::open(dir.path(), "abc").unwrap();
        assert!(bundle.content().is_landscape());
    }

    #[test]
    fn test_notebook_bundle_renders() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("abc")).unwrap();
        let bundle = DocumentBundle::open(dir.path(), "abc").unwrap();
        let out = render_bundle(&bundle, &RenderOptions::default()).unwrap();
        let out_dir = TempDir::new().unwrap();
        let written = out.save(out_dir.path(), "abc").unwrap();
        assert_eq!(written, vec![out_dir.path().join("abc.pdf")]);
        assert!(written[0].exists());
        assert!(out.warnings().is_empty());
    }
}
