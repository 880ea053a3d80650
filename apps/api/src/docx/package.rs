//! Reading and writing the .docx zip package.
//!
//! Every part is kept byte-for-byte except `word/document.xml`. On render the body XML
//! is re-streamed: paragraphs whose text changed get the new text written into their
//! first `<w:t>` and their remaining `<w:t>` elements emptied. Run properties, tables,
//! styles and everything else pass through untouched.

use std::borrow::Cow;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use tracing::debug;
use zip::write::FileOptions;
use zip::result::ZipError;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::model::{Block, Cell, Document, Paragraph, Row, Table};
use super::DocxError;

pub const DOCUMENT_PART: &str = "word/document.xml";

const W_P: &[u8] = b"w:p";
const W_T: &[u8] = b"w:t";
const W_TBL: &[u8] = b"w:tbl";
const W_TR: &[u8] = b"w:tr";
const W_TC: &[u8] = b"w:tc";

struct PackagePart {
    name: String,
    data: Vec<u8>,
    is_dir: bool,
}

/// An opened .docx template.
pub struct DocxTemplate {
    parts: Vec<PackagePart>,
    document_xml: String,
    document: Document,
    source_path: Option<PathBuf>,
}

impl DocxTemplate {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocxError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = Vec::with_capacity(archive.len());
        let mut document_xml = None;

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();
            let is_dir = file.is_dir();
            let mut data = Vec::new();
            if !is_dir {
                file.read_to_end(&mut data).map_err(ZipError::Io)?;
            }
            if name == DOCUMENT_PART {
                document_xml = Some(String::from_utf8(data.clone())?);
            }
            parts.push(PackagePart { name, data, is_dir });
        }

        let document_xml =
            document_xml.ok_or_else(|| DocxError::MissingPart(DOCUMENT_PART.to_string()))?;
        let document = parse_document(&document_xml)?;

        debug!(
            parts = parts.len(),
            paragraphs = document.paragraphs().count(),
            "Opened .docx package"
        );

        Ok(Self {
            parts,
            document_xml,
            document,
            source_path: None,
        })
    }

    pub fn open(path: &Path) -> Result<Self, DocxError> {
        let bytes = std::fs::read(path)?;
        let mut template = Self::from_bytes(&bytes)?;
        template.source_path = Some(path.to_path_buf());
        Ok(template)
    }

    /// The document body as it was in the template.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Serialises `document` back into a complete .docx package.
    ///
    /// `document` must have the same paragraph layout as `self.document()`; only
    /// paragraph text may differ.
    pub fn render(&self, document: &Document) -> Result<Vec<u8>, DocxError> {
        let original: Vec<&str> = self.document.paragraphs().map(|p| p.text.as_str()).collect();
        let updated: Vec<&str> = document.paragraphs().map(|p| p.text.as_str()).collect();
        if original.len() != updated.len() {
            return Err(DocxError::StructureMismatch {
                expected: original.len(),
                found: updated.len(),
            });
        }

        let replacements: Vec<Option<&str>> = original
            .iter()
            .zip(&updated)
            .map(|(old, new)| (old != new).then_some(*new))
            .collect();

        let body = rewrite_paragraph_text(&self.document_xml, &replacements)?;

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        for part in &self.parts {
            if part.is_dir {
                zip.add_directory(part.name.clone(), options)?;
                continue;
            }
            zip.start_file(part.name.clone(), options)?;
            if part.name == DOCUMENT_PART {
                zip.write_all(body.as_bytes())?;
            } else {
                zip.write_all(&part.data)?;
            }
        }
        Ok(zip.finish()?.into_inner())
    }

    /// Renders `document` and writes it to `target`. Never overwrites the template file.
    pub fn save(&self, document: &Document, target: &Path) -> Result<(), DocxError> {
        if let Some(source) = &self.source_path {
            if is_same_file(source, target) {
                return Err(DocxError::SameInputAndOutput(target.to_path_buf()));
            }
        }
        let bytes = self.render(document)?;
        std::fs::write(target, bytes)?;
        Ok(())
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Reading
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct DocumentBuilder {
    blocks: Vec<Block>,
    table: Option<Table>,
    table_depth: usize,
    paragraph_depth: usize,
    in_text: bool,
    text: String,
}

impl DocumentBuilder {
    fn open(&mut self, name: &[u8]) {
        match name {
            W_TBL => {
                self.table_depth += 1;
                if self.table_depth == 1 {
                    self.table = Some(Table::default());
                }
            }
            W_TR if self.table_depth == 1 => {
                if let Some(table) = self.table.as_mut() {
                    table.rows.push(Row::default());
                }
            }
            W_TC if self.table_depth == 1 => self.current_row().cells.push(Cell::default()),
            W_P => {
                if self.paragraph_depth == 0 {
                    self.text.clear();
                }
                self.paragraph_depth += 1;
            }
            W_T if self.paragraph_depth > 0 => self.in_text = true,
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            W_TBL => {
                self.table_depth = self.table_depth.saturating_sub(1);
                if self.table_depth == 0 {
                    if let Some(table) = self.table.take() {
                        self.blocks.push(Block::Table(table));
                    }
                }
            }
            W_P => {
                self.paragraph_depth = self.paragraph_depth.saturating_sub(1);
                if self.paragraph_depth == 0 {
                    let text = std::mem::take(&mut self.text);
                    self.finish_paragraph(Paragraph { text });
                }
            }
            W_T => self.in_text = false,
            _ => {}
        }
    }

    fn empty(&mut self, name: &[u8]) {
        match name {
            W_P if self.paragraph_depth == 0 => self.finish_paragraph(Paragraph::default()),
            W_TC if self.table_depth == 1 => self.current_row().cells.push(Cell::default()),
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn finish_paragraph(&mut self, paragraph: Paragraph) {
        if self.table_depth == 0 {
            self.blocks.push(Block::Paragraph(paragraph));
        } else {
            self.current_cell().paragraphs.push(paragraph);
        }
    }

    fn current_row(&mut self) -> &mut Row {
        let table = self.table.get_or_insert_with(Table::default);
        if table.rows.is_empty() {
            table.rows.push(Row::default());
        }
        let last = table.rows.len() - 1;
        &mut table.rows[last]
    }

    fn current_cell(&mut self) -> &mut Cell {
        let row = self.current_row();
        if row.cells.is_empty() {
            row.cells.push(Cell::default());
        }
        let last = row.cells.len() - 1;
        &mut row.cells[last]
    }

    fn finish(self) -> Document {
        Document {
            blocks: self.blocks,
        }
    }
}

fn parse_document(xml: &str) -> Result<Document, DocxError> {
    let mut reader = Reader::from_str(xml);
    let mut builder = DocumentBuilder::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => builder.open(e.name().as_ref()),
            Event::Empty(e) => builder.empty(e.name().as_ref()),
            Event::End(e) => builder.close(e.name().as_ref()),
            Event::Text(t) if builder.in_text => builder.push_text(&t.unescape()?),
            Event::CData(c) if builder.in_text => builder.push_text(&String::from_utf8_lossy(&c)),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(builder.finish())
}

// ────────────────────────────────────────────────────────────────────────────
// Writing
// ────────────────────────────────────────────────────────────────────────────

fn preserved_text_start() -> BytesStart<'static> {
    BytesStart::new("w:t").with_attributes([("xml:space", "preserve")])
}

/// Re-streams the body XML, writing new text into changed paragraphs.
/// `replacements[i]` is `Some(text)` when the i-th outermost paragraph changed.
fn rewrite_paragraph_text(xml: &str, replacements: &[Option<&str>]) -> Result<String, DocxError> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));

    let mut next_index = 0usize;
    let mut paragraph_depth = 0usize;
    let mut current: Option<&str> = None;
    let mut text_written = false;
    let mut in_text = false;

    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Eof => break,
            Event::Start(e) if e.name().as_ref() == W_P => {
                if paragraph_depth == 0 {
                    current = replacements.get(next_index).copied().flatten();
                    text_written = false;
                    next_index += 1;
                }
                paragraph_depth += 1;
                writer.write_event(&event)?;
            }
            Event::Empty(e) if e.name().as_ref() == W_P => {
                if paragraph_depth == 0 {
                    next_index += 1;
                }
                writer.write_event(&event)?;
            }
            Event::End(e) if e.name().as_ref() == W_P => {
                paragraph_depth = paragraph_depth.saturating_sub(1);
                if paragraph_depth == 0 {
                    current = None;
                }
                writer.write_event(&event)?;
            }
            Event::Start(e) if e.name().as_ref() == W_T && current.is_some() => {
                in_text = true;
                writer.write_event(Event::Start(preserved_text_start()))?;
                if !text_written {
                    if let Some(text) = current {
                        let text = xml_safe_text(text);
                        writer.write_event(Event::Text(BytesText::new(&text)))?;
                    }
                    text_written = true;
                }
            }
            Event::Empty(e) if e.name().as_ref() == W_T && current.is_some() => {
                if text_written {
                    writer.write_event(&event)?;
                } else {
                    writer.write_event(Event::Start(preserved_text_start()))?;
                    if let Some(text) = current {
                        let text = xml_safe_text(text);
                        writer.write_event(Event::Text(BytesText::new(&text)))?;
                    }
                    writer.write_event(Event::End(BytesEnd::new("w:t")))?;
                    text_written = true;
                }
            }
            Event::End(e) if e.name().as_ref() == W_T && in_text => {
                in_text = false;
                writer.write_event(&event)?;
            }
            Event::Text(_) | Event::CData(_) if in_text => {}
            _ => writer.write_event(&event)?,
        }
    }

    Ok(String::from_utf8(writer.into_inner())?)
}

/// Drops characters XML 1.0 cannot carry: C0 controls other than tab, LF and CR,
/// and U+FFFE/U+FFFF. Escaping does not help for these; Word rejects the part.
pub fn xml_safe_text(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|c| is_xml_char(*c)).collect())
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Builds a minimal .docx package around a `<w:body>` fragment.
#[cfg(test)]
pub(crate) fn test_docx(body: &str) -> Vec<u8> {
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );
    let content_types = r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(content_types.as_bytes()).unwrap();
    zip.start_file(DOCUMENT_PART, options).unwrap();
    zip.write_all(document.as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}
