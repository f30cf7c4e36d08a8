//! Editing of existing PDF documents.
//!
//! ## Architecture
//!
//! ```text
//! PdfDocument (read-only source)
//!     ↓
//! [DocumentEditor] (tracks added and replaced objects)
//!     ↓
//! Incremental update (original bytes + appended objects, xref, trailer)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use rm_lines::document::PdfDocument;
//! use rm_lines::editor::DocumentEditor;
//! use rm_lines::object::Object;
//!
//! let doc = PdfDocument::open("input.pdf")?;
//! let mut editor = DocumentEditor::new(&doc);
//! editor.add_object(Object::Null);
//! editor.save("output.pdf")?;
//! # Ok::<(), rm_lines::Error>(())
//! ```

mod document_editor;

pub use document_editor::DocumentEditor;
