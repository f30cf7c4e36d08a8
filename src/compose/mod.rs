//! Page composition.
//!
//! Two entry points turn rendered overlays into PDF output:
//!
//! - [`PdfAnnotator`] merges overlays onto the pages of an existing PDF and
//!   produces the full document plus a document holding only the annotated
//!   pages. Both are incremental updates of the source bytes.
//! - [`NotebookComposer`] builds a fresh document with one page per stroke
//!   file, each on a blank or template background.
//!
//! Both are terminal: nothing is kept once they return.

mod notebook;
mod pdf_annotation;

pub use notebook::{NotebookComposer, NotebookPdf};
pub use pdf_annotation::{AnnotatedPdf, PdfAnnotator};

use crate::config::RenderOptions;
use crate::error::{Error, Result, Warning};
use crate::lines::{metadata_path, read_metadata, StrokeFile};
use std::path::{Path, PathBuf};

/// Stroke file of a page: `<dir>/<page>.rm`.
pub fn stroke_path(dir: &Path, page: usize) -> PathBuf {
    dir.join(format!("{}.rm", page))
}

/// Load the stroke file of a page.
///
/// `Ok(None)` when the page has no stroke file, or when it is malformed and
/// `options.strict` is off; the latter adds a [`Warning::SkippedPage`]. A
/// malformed metadata sidecar never drops the page: it adds a
/// [`Warning::MalformedMetadata`] and the layers keep their palette colors.
pub(crate) fn load_page_strokes(
    dir: &Path,
    page: usize,
    options: &RenderOptions,
    warnings: &mut Vec<Warning>,
) -> Result<Option<StrokeFile>> {
    let path = stroke_path(dir, page);
    if !path.exists() {
        log::debug!("page {} has no stroke file", page);
        return Ok(None);
    }

    let data = std::fs::read(&path)?;
    let metadata = match read_metadata(&path) {
        Ok(metadata) => metadata,
        Err(e) => {
            log::warn!("page {}: ignoring layer metadata: {}", page, e);
            warnings.push(Warning::MalformedMetadata {
                page,
                path: metadata_path(&path),
                reason: e.to_string(),
            });
            None
        },
    };

    match StrokeFile::from_bytes_with_metadata(&data, metadata.as_ref()) {
        Ok(file) => {
            log::debug!(
                "page {}: v{} with {} layers, {} strokes",
                page,
                file.version.number(),
                file.layer_count(),
                file.stroke_count()
            );
            Ok(Some(file))
        },
        Err(e @ Error::Format(_)) if !options.strict => {
            log::warn!("skipping page {}: {}", page, e);
            warnings.push(Warning::SkippedPage {
                page,
                reason: e.to_string(),
            });
            Ok(None)
        },
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lines::{encode, Layer, Version};
    use tempfile::TempDir;

    #[test]
    fn test_stroke_path() {
        assert_eq!(stroke_path(Path::new("/doc/abc"), 3), PathBuf::from("/doc/abc/3.rm"));
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let mut warnings = Vec::new();
        let loaded = load_page_strokes(dir.path(), 0, &RenderOptions::default(), &mut warnings).unwrap();
        assert!(loaded.is_none());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_malformed_file_skipped_or_fatal() {
        let dir = TempDir::new().unwrap();
        std::fs::write(stroke_path(dir.path(), 0), b"garbage").unwrap();

        let mut warnings = Vec::new();
        let loaded = load_page_strokes(dir.path(), 0, &RenderOptions::default(), &mut warnings).unwrap();
        assert!(loaded.is_none());
        assert!(matches!(warnings[..], [Warning::SkippedPage { page: 0, .. }]));

        let strict = RenderOptions::default().with_strict(true);
        match load_page_strokes(dir.path(), 0, &strict, &mut Vec::new()) {
            Err(Error::Format(_)) => {},
            other => panic!("Expected Format error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_metadata_keeps_strokes() {
        let dir = TempDir::new().unwrap();
        let file = StrokeFile {
            version: Version::V5,
            layers: vec![Layer {
                strokes: Vec::new(),
                color_override: None,
            }],
        };
        std::fs::write(stroke_path(dir.path(), 0), encode(&file).unwrap()).unwrap();
        std::fs::write(dir.path().join("0-metadata.json"), r#"{"layers":[{"name":null}]}"#).unwrap();

        for options in [RenderOptions::default(), RenderOptions::default().with_strict(true)] {
            let mut warnings = Vec::new();
            let loaded = load_page_strokes(dir.path(), 0, &options, &mut warnings).unwrap();
            assert_eq!(loaded, Some(file.clone()));
            assert!(matches!(warnings[..], [Warning::MalformedMetadata { page: 0, .. }]));
        }
    }
}
