//! In-memory view of a Word document body.
//!
//! A `Document` is an ordered list of blocks. Table cells hold paragraphs; nested
//! tables are flattened into the cell that contains them. `paragraphs()` walks every
//! paragraph in document order, which is also the order they appear in the XML.

/// A single paragraph. All runs are concatenated into one text string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub text: String,
}

impl Paragraph {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    /// Every paragraph in document order, including those inside table cells.
    pub fn paragraphs<'a>(&'a self) -> impl Iterator<Item = &'a Paragraph> + 'a {
        self.blocks
            .iter()
            .flat_map(|block| -> Box<dyn Iterator<Item = &'a Paragraph> + 'a> {
                match block {
                    Block::Paragraph(p) => Box::new(std::iter::once(p)),
                    Block::Table(table) => Box::new(
                        table
                            .rows
                            .iter()
                            .flat_map(|row| row.cells.iter())
                            .flat_map(|cell| cell.paragraphs.iter()),
                    ),
                }
            })
    }

    pub fn paragraphs_mut<'a>(&'a mut self) -> impl Iterator<Item = &'a mut Paragraph> + 'a {
        self.blocks
            .iter_mut()
            .flat_map(|block| -> Box<dyn Iterator<Item = &'a mut Paragraph> + 'a> {
                match block {
                    Block::Paragraph(p) => Box::new(std::iter::once(p)),
                    Block::Table(table) => Box::new(
                        table
                            .rows
                            .iter_mut()
                            .flat_map(|row| row.cells.iter_mut())
                            .flat_map(|cell| cell.paragraphs.iter_mut()),
                    ),
                }
            })
    }

    /// Plain-text rendering used when the document is read as RFP input.
    /// Paragraphs become lines; table cells in a row are joined with ` | `.
    pub fn plain_text(&self) -> String {
        let mut lines: Vec<String> = Vec::new();
        for block in &self.blocks {
            match block {
                Block::Paragraph(p) => lines.push(p.text.clone()),
                Block::Table(table) => {
                    for row in &table.rows {
                        let cells: Vec<String> = row
                            .cells
                            .iter()
                            .map(|cell| {
                                cell.paragraphs
                                    .iter()
                                    .map(|p| p.text.as_str())
                                    .collect::<Vec<_>>()
                                    .join(" ")
                            })
                            .collect();
                        lines.push(cells.join(" | "));
                    }
                }
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document {
            blocks: vec![
                Block::Paragraph(Paragraph::new("Intro")),
                Block::Table(Table {
                    rows: vec![Row {
                        cells: vec![
                            Cell {
                                paragraphs: vec![Paragraph::new("Name"), Paragraph::new("[Name]")],
                            },
                            Cell {
                                paragraphs: vec![Paragraph::new("[Address]")],
                            },
                        ],
                    }],
                }),
                Block::Paragraph(Paragraph::new("Outro")),
            ],
        }
    }

    #[test]
    fn test_paragraphs_walks_tables_in_document_order() {
        let doc = sample();
        let texts: Vec<&str> = doc.paragraphs().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["Intro", "Name", "[Name]", "[Address]", "Outro"]);
    }

    #[test]
    fn test_paragraphs_mut_reaches_cells() {
        let mut doc = sample();
        for p in doc.paragraphs_mut() {
            p.text = p.text.to_uppercase();
        }
        let texts: Vec<&str> = doc.paragraphs().map(|p| p.text.as_str()).collect();
        assert_eq!(texts[3], "[ADDRESS]");
    }

    #[test]
    fn test_plain_text_joins_cells() {
        let doc = sample();
        assert_eq!(doc.plain_text(), "Intro\nName [Name] | [Address]\nOutro");
    }
}
