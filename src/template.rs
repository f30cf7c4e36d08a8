//! Notebook page templates.
//!
//! `<uuid>.pagedata` lists one template name per line, in page order. The
//! background of notebook page `n` is `<templates>/<line n>.png`. Pages
//! without a usable template are left blank.

use crate::error::{Result, Warning};
use crate::writer::ImageData;
use std::path::{Path, PathBuf};

/// Template assignment for the pages of one notebook.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageTemplates {
    dir: Option<PathBuf>,
    names: Vec<String>,
}

impl PageTemplates {
    /// Templates `names` looked up in `dir`.
    pub fn new(dir: Option<PathBuf>, names: Vec<String>) -> Self {
        Self { dir, names }
    }

    /// Read a `.pagedata` file. A missing file yields no templates.
    pub fn from_pagedata(dir: Option<PathBuf>, pagedata: impl AsRef<Path>) -> Result<Self> {
        let pagedata = pagedata.as_ref();
        if !pagedata.exists() {
            log::debug!("no page data at {}", pagedata.display());
            return Ok(Self::new(dir, Vec::new()));
        }
        let text = std::fs::read_to_string(pagedata)?;
        Ok(Self::new(dir, parse_pagedata(&text)))
    }

    /// Template name of a page, if one is listed.
    pub fn name(&self, page: usize) -> Option<&str> {
        self.names.get(page).map(String::as_str).filter(|n| !n.is_empty())
    }

    /// Number of listed pages.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when no page lists a template.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Image path of a page's template.
    ///
    /// `None` when no templates directory is configured or the page lists
    /// no template.
    pub fn path(&self, page: usize) -> Option<PathBuf> {
        let dir = self.dir.as_ref()?;
        Some(dir.join(format!("{}.png", self.name(page)?)))
    }

    /// Decode the template of a page.
    ///
    /// Missing or undecodable images become warnings and the page falls
    /// back to blank.
    pub fn load(&self, page: usize, warnings: &mut Vec<Warning>) -> Option<ImageData> {
        let path = self.path(page)?;
        if !path.exists() {
            log::warn!("template {} for page {} not found; using blank page", path.display(), page);
            warnings.push(Warning::MissingTemplate { page, path });
            return None;
        }
        match ImageData::from_file(&path) {
            Ok(image) => {
                log::debug!("page {} template {} ({}x{})", page, path.display(), image.width, image.height);
                Some(image)
            },
            Err(e) => {
                log::warn!("template {} for page {} unreadable: {}", path.display(), page, e);
                warnings.push(Warning::UnreadableTemplate {
                    page,
                    path,
                    reason: e.to_string(),
                });
                None
            },
        }
    }
}

/// Template names, one per line. Trailing whitespace is dropped.
pub fn parse_pagedata(text: &str) -> Vec<String> {
    text.lines().map(|line| line.trim_end().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn write_png(path: &Path) {
        let img = image::DynamicImage::ImageLuma8(image::GrayImage::from_pixel(3, 4, image::Luma([240])));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageOutputFormat::Png).unwrap();
        std::fs::write(path, out.into_inner()).unwrap();
    }

    #[test]
    fn test_parse_pagedata() {
        assert_eq!(parse_pagedata("Blank\nP Lines medium \r\n\nGrid"), vec!["Blank", "P Lines medium", "", "Grid"]);
        assert!(parse_pagedata("").is_empty());
    }

    #[test]
    fn test_paths() {
        let templates = PageTemplates::new(Some(PathBuf::from("/t")), vec!["Grid".into(), String::new()]);
        assert_eq!(templates.path(0), Some(PathBuf::from("/t/Grid.png")));
        assert_eq!(templates.path(1), None);
        assert_eq!(templates.path(2), None);

        let no_dir = PageTemplates::new(None, vec!["Grid".into()]);
        assert_eq!(no_dir.path(0), None);
    }

    #[test]
    fn test_load_existing_and_missing() {
        let dir = TempDir::new().unwrap();
        write_png(&dir.path().join("Grid.png"));
        let templates = PageTemplates::new(Some(dir.path().to_path_buf()), vec!["Grid".into(), "Dots".into()]);

        let mut warnings = Vec::new();
        let image = templates.load(0, &mut warnings).unwrap();
        assert_eq!((image.width, image.height), (3, 4));
        assert!(warnings.is_empty());

        assert!(templates.load(1, &mut warnings).is_none());
        assert_eq!(
            warnings,
            vec![Warning::MissingTemplate {
                page: 1,
                path: dir.path().join("Dots.png")
            }]
        );
    }

    #[test]
    fn test_unreadable_template() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Broken.png"), b"not a png").unwrap();
        let templates = PageTemplates::new(Some(dir.path().to_path_buf()), vec!["Broken".into()]);
        let mut warnings = Vec::new();
        assert!(templates.load(0, &mut warnings).is_none());
        match &warnings[..] {
            [Warning::UnreadableTemplate { page: 0, .. }] => {},
            other => panic!("Expected UnreadableTemplate, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_pagedata_file() {
        let dir = TempDir::new().unwrap();
        let templates = PageTemplates::from_pagedata(None, dir.path().join("x.pagedata")).unwrap();
        assert!(templates.is_empty());
    }
}
