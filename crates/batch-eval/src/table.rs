//! Column-ordered string table stored as JSON
//!
//! ```json
//! {"columns": ["Prompt Contents", "Prompt Execution"],
//!  "rows": [["Move up 36mm", "delta_x, delta_y, delta_z = 0.0, 0.0, 36.0"]]}
//! ```

use crate::{BatchError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix added to the file stem of a saved result table
pub const COMPLETION_SUFFIX: &str = "_Completion";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    #[serde(deserialize_with = "string_cells")]
    pub rows: Vec<Vec<String>>,
}

/// Cells exported from spreadsheets may be numbers or null
fn string_cells<'de, D>(deserializer: D) -> std::result::Result<Vec<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<Vec<serde_json::Value>> = Deserialize::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| match cell {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                })
                .collect()
        })
        .collect())
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let table = Self { columns, rows };
        table.validate()?;
        Ok(table)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| BatchError::Table {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let table: Table = serde_json::from_str(&raw).map_err(|e| BatchError::Table {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        table.validate()?;
        tracing::info!(
            "Loaded {} rows x {} columns from {}",
            table.rows.len(),
            table.columns.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|e| BatchError::Table {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        fs::write(path, json).map_err(|e| BatchError::Table {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        tracing::info!("Completion saved to: {}", path.display());
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        for (i, row) in self.rows.iter().enumerate() {
            if row.len() != self.columns.len() {
                return Err(BatchError::Malformed(format!(
                    "row {} has {} cells, expected {}",
                    i,
                    row.len(),
                    self.columns.len()
                )));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| BatchError::MissingColumn(name.to_string()))
    }

    /// Cells of one column, in row order
    pub fn column(&self, name: &str) -> Result<Vec<String>> {
        let index = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| row[index].clone()).collect())
    }

    /// Append a column, or overwrite it if the name is already taken
    pub fn set_column(&mut self, name: &str, values: Vec<String>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(BatchError::ShapeMismatch {
                left: self.rows.len(),
                right: values.len(),
            });
        }
        match self.column_index(name) {
            Ok(index) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[index] = value;
                }
            }
            Err(_) => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }
}

/// `dir/prompts.json` becomes `dir/prompts_Completion.json`
pub fn completion_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!("{}{}.{}", stem, COMPLETION_SUFFIX, ext.to_string_lossy()),
        None => format!("{}{}", stem, COMPLETION_SUFFIX),
    };
    input.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(
            vec!["Prompt Contents".to_string(), "Note".to_string()],
            vec![
                vec!["Move up 36mm".to_string(), "a".to_string()],
                vec!["Shift left for 54cm".to_string(), "b".to_string()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn set_column_appends_and_keeps_other_cells() {
        let mut table = sample();
        table
            .set_column("Completion", vec!["x".to_string(), "y".to_string()])
            .unwrap();

        assert_eq!(table.columns, ["Prompt Contents", "Note", "Completion"]);
        assert_eq!(table.rows[1], ["Shift left for 54cm", "b", "y"]);

        table
            .set_column("Completion", vec!["z".to_string(), "w".to_string()])
            .unwrap();
        assert_eq!(table.columns.len(), 3);
        assert_eq!(table.column("Completion").unwrap(), ["z", "w"]);
    }

    #[test]
    fn wrong_length_column_is_a_shape_mismatch() {
        let mut table = sample();
        assert!(matches!(
            table.set_column("Completion", vec!["only one".to_string()]),
            Err(BatchError::ShapeMismatch { left: 2, right: 1 })
        ));
    }

    #[test]
    fn missing_column_is_named() {
        match sample().column("Prompt Execution") {
            Err(BatchError::MissingColumn(name)) => assert_eq!(name, "Prompt Execution"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn load_accepts_spreadsheet_cells_and_saves_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompts.json");
        fs::write(
            &path,
            r#"{"columns": ["Prompt Contents", "Id"], "rows": [["Move up 36mm", 7], ["hello", null]]}"#,
        )
        .unwrap();

        let table = Table::load(&path).unwrap();
        assert_eq!(table.column("Id").unwrap(), ["7", ""]);

        let out = completion_path(&path);
        table.save(&out).unwrap();
        assert_eq!(Table::load(&out).unwrap(), table);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"columns": ["a", "b"], "rows": [["1"]]}"#).unwrap();
        assert!(matches!(Table::load(&path), Err(BatchError::Malformed(_))));
    }

    #[test]
    fn completion_path_adds_suffix_before_extension() {
        assert_eq!(
            completion_path(Path::new("data/Prompts_TestData_4_1.json")),
            Path::new("data/Prompts_TestData_4_1_Completion.json")
        );
        assert_eq!(
            completion_path(Path::new("prompts")),
            Path::new("prompts_Completion")
        );
    }
}
