//! Placeholder Scanner — collects the distinct `[...]` tokens in a document.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::docx::Document;

/// `[name]` with no nested brackets. The capture may be empty (`[]`).
pub static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\[\]]*)\]").expect("valid regex"));

/// Distinct placeholder names across every paragraph, table cells included.
pub fn scan_placeholders(document: &Document) -> BTreeSet<String> {
    document
        .paragraphs()
        .flat_map(|p| placeholders_in(&p.text))
        .collect()
}

pub fn placeholders_in(text: &str) -> impl Iterator<Item = String> + '_ {
    PLACEHOLDER_RE
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
}

/// The bracketed form of a placeholder name, as it appears in the document.
pub fn bracketed(name: &str) -> String {
    format!("[{name}]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::{Block, Cell, Paragraph, Row, Table};

    fn names(text: &str) -> Vec<String> {
        placeholders_in(text).collect()
    }

    #[test]
    fn test_adjacent_brackets_are_two_placeholders() {
        assert_eq!(names("[A][B]"), vec!["A", "B"]);
    }

    #[test]
    fn test_unterminated_bracket_yields_nothing() {
        assert!(names("Dear [ClientName, thanks").is_empty());
    }

    #[test]
    fn test_empty_brackets_yield_empty_name() {
        assert_eq!(names("Value: []"), vec![""]);
    }

    #[test]
    fn test_nested_brackets_take_innermost() {
        assert_eq!(names("[outer [inner] tail]"), vec!["inner"]);
    }

    #[test]
    fn test_scan_deduplicates_across_paragraphs_and_cells() {
        let doc = Document {
            blocks: vec![
                Block::Paragraph(Paragraph::new("Dear [ClientName], re [Project]")),
                Block::Table(Table {
                    rows: vec![Row {
                        cells: vec![
                            Cell {
                                paragraphs: vec![Paragraph::new("[ClientName]")],
                            },
                            Cell {
                                paragraphs: vec![Paragraph::new("[ABN] and []")],
                            },
                        ],
                    }],
                }),
            ],
        };

        let found = scan_placeholders(&doc);
        let expected: BTreeSet<String> = ["", "ABN", "ClientName", "Project"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(found, expected);
    }
}
