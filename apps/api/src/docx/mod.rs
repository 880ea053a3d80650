// Word (.docx) template support.
// Only what placeholder substitution needs: paragraph text and table cells.
// Parsing and rendering are CPU-bound and run inside tokio::task::spawn_blocking.

pub mod model;
pub mod package;

use std::path::PathBuf;

use thiserror::Error;

pub use model::{Block, Cell, Document, Paragraph, Row, Table};
pub use package::{xml_safe_text, DocxTemplate};

#[derive(Debug, Error)]
pub enum DocxError {
    #[error("not a .docx package: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("package is missing the {0} part")]
    MissingPart(String),

    #[error("document XML is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("malformed document XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("document has {found} paragraphs but the template has {expected}")]
    StructureMismatch { expected: usize, found: usize },

    #[error("output path {0} is the template itself")]
    SameInputAndOutput(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
