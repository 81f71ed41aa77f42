use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// One `(Id, Body)` row of a posts dump, tagged with the site it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRow {
    pub site: String,
    pub id: String,
    pub body: String,
}

/// Attribute table of one dump XML file: each child of the root is a row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlTable {
    pub name: String,
    /// Union of attribute names, in first-seen order.
    pub columns: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
}

impl XmlTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn push_row(&mut self, row: Vec<(String, String)>) {
        let mut cells = HashMap::with_capacity(row.len());
        for (key, value) in row {
            if !self.columns.contains(&key) {
                self.columns.push(key.clone());
            }
            cells.insert(key, value);
        }
        self.rows.push(cells);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell value, empty when the row lacks the attribute.
    pub fn cell(&self, row: usize, column: &str) -> &str {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordFrequency {
    pub word: String,
    pub frequency: u64,
}

/// Canvas and font settings of the rendered word cloud.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub background: String,
    pub min_font: f32,
    pub max_font: f32,
    pub max_words: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 400,
            background: "white".to_string(),
            min_font: 8.0,
            max_font: 96.0,
            max_words: 200,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExtractedData {
    pub posts: Vec<PostRow>,
    pub tables: Vec<XmlTable>,
    /// Posts files the rows were read from.
    pub sources: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct TransformResult {
    pub cleaned_posts: Vec<PostRow>,
    pub frequencies: Vec<WordFrequency>,
    pub total_words: u64,
    pub distinct_words: usize,
    pub tables: Vec<XmlTable>,
    pub sources: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_keep_first_seen_order() {
        let mut table = XmlTable::new("Users");
        table.push_row(vec![
            ("Id".to_string(), "1".to_string()),
            ("DisplayName".to_string(), "ann".to_string()),
        ]);
        table.push_row(vec![
            ("Id".to_string(), "2".to_string()),
            ("Location".to_string(), "Pune".to_string()),
        ]);

        assert_eq!(table.columns, vec!["Id", "DisplayName", "Location"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(1, "Location"), "Pune");
        assert_eq!(table.cell(0, "Location"), "");
        assert_eq!(table.cell(5, "Id"), "");
    }
}
