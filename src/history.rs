// history.rs

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::parser::{parse_records, quote_field};
use crate::util::format_number;

pub const HEADER: [&str; 4] = ["Operation", "Num1", "Num2", "Result"];
pub const MAX_RECORDS: usize = 5;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("history file {path}, line {line}: {reason}")]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub operation: String,
    pub operand1: f64,
    pub operand2: f64,
    pub result: f64,
}

impl Record {
    pub fn new(operation: impl Into<String>, operand1: f64, operand2: f64, result: f64) -> Self {
        Self { operation: operation.into(), operand1, operand2, result }
    }

    fn to_line(&self) -> String {
        [
            quote_field(&self.operation),
            format_number(self.operand1),
            format_number(self.operand2),
            format_number(self.result),
        ]
        .join(",")
    }
}

/// Bounded calculation history kept in a comma-separated file. Every
/// mutation reads the whole file and rewrites it.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    /// Opens the store, creating a header-only file if none exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, HistoryError> {
        let store = Self { path: path.into() };
        if !store.path.exists() {
            if let Some(parent) = store.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| store.io_error(e))?;
            }
            store.write_all(&[])?;
            info!(path = %store.path.display(), "history file created");
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a record and keeps only the most recent `MAX_RECORDS`.
    pub fn add_record(&self, operation: &str, operand1: f64, operand2: f64, result: f64) -> Result<(), HistoryError> {
        let mut records = self.load_all()?;
        records.push(Record::new(operation, operand1, operand2, result));
        let excess = records.len().saturating_sub(MAX_RECORDS);
        if excess > 0 {
            debug!(evicted = excess, "dropping oldest history records");
            records.drain(..excess);
        }
        self.write_all(&records)
    }

    pub fn load_all(&self) -> Result<Vec<Record>, HistoryError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        let rows = parse_records(&content).map_err(|e| HistoryError::Malformed {
            path: self.path.clone(),
            line: e.line,
            reason: e.reason,
        })?;
        // the first row is the header
        rows.into_iter().skip(1).map(|(line_no, fields)| self.parse_row(line_no, fields)).collect()
    }

    pub fn clear(&self) -> Result<(), HistoryError> {
        info!(path = %self.path.display(), "history cleared");
        self.write_all(&[])
    }

    /// Removes the record at `index`. Returns `None`, leaving the file
    /// untouched, when the index is out of range.
    pub fn delete_at(&self, index: usize) -> Result<Option<Record>, HistoryError> {
        let mut records = self.load_all()?;
        if index >= records.len() {
            warn!(index, len = records.len(), "history delete out of range");
            return Ok(None);
        }
        let removed = records.remove(index);
        self.write_all(&records)?;
        Ok(Some(removed))
    }

    /// Human-readable table of the current history.
    pub fn render(&self) -> Result<String, HistoryError> {
        let records = self.load_all()?;
        if records.is_empty() {
            return Ok("No history available.".to_string());
        }
        let rows: Vec<[String; 4]> = records
            .iter()
            .map(|r| [r.operation.clone(), format_number(r.operand1), format_number(r.operand2), format_number(r.result)])
            .collect();
        let widths: Vec<usize> = (0..4)
            .map(|col| rows.iter().map(|row| row[col].len()).chain([HEADER[col].len()]).max().unwrap_or(0))
            .collect();
        let index_width = (records.len() - 1).to_string().len();
        let header = format!(
            "{:iw$}  {}",
            "",
            HEADER.iter().enumerate().map(|(col, h)| format!("{:>w$}", h, w = widths[col])).join("  "),
            iw = index_width
        );
        let body = rows.iter().enumerate().map(|(i, row)| {
            format!(
                "{:<iw$}  {}",
                i,
                row.iter().enumerate().map(|(col, v)| format!("{:>w$}", v, w = widths[col])).join("  "),
                iw = index_width
            )
        });
        Ok(std::iter::once(header).chain(body).join("\n"))
    }

    fn parse_row(&self, line_no: usize, mut fields: Vec<String>) -> Result<Record, HistoryError> {
        let malformed = |reason: String| HistoryError::Malformed { path: self.path.clone(), line: line_no, reason };
        if fields.len() != HEADER.len() {
            return Err(malformed(format!("expected {} fields, found {}", HEADER.len(), fields.len())));
        }
        let number = |col: usize| {
            fields[col]
                .trim()
                .parse::<f64>()
                .map_err(|e| malformed(format!("column {}: {}", HEADER[col], e)))
        };
        let (operand1, operand2, result) = (number(1)?, number(2)?, number(3)?);
        Ok(Record { operation: fields.swap_remove(0), operand1, operand2, result })
    }

    fn write_all(&self, records: &[Record]) -> Result<(), HistoryError> {
        let mut file = fs::File::create(&self.path).map_err(|e| self.io_error(e))?;
        writeln!(file, "{}", HEADER.join(",")).map_err(|e| self.io_error(e))?;
        for record in records {
            writeln!(file, "{}", record.to_line()).map_err(|e| self.io_error(e))?;
        }
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> HistoryError {
        HistoryError::Io { path: self.path.clone(), source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> HistoryStore {
        HistoryStore::open(dir.path().join("test_history.csv")).unwrap()
    }

    #[test]
    fn creates_header_only_file() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let content = fs::read_to_string(store.path()).unwrap();
        assert_eq!(content, "Operation,Num1,Num2,Result\n");
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn creates_missing_parent_directory() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::open(dir.path().join("data").join("history.csv")).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn add_then_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.add_record("Add", 2.0, 3.0, 5.0).unwrap();
        assert_eq!(store.load_all().unwrap(), vec![Record::new("Add", 2.0, 3.0, 5.0)]);
        let content = fs::read_to_string(store.path()).unwrap();
        assert_eq!(content, "Operation,Num1,Num2,Result\nAdd,2.0,3.0,5.0\n");
    }

    #[test]
    fn keeps_only_last_five_records() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        for i in 0..7 {
            store.add_record(&format!("op{}", i), i as f64, (i + 1) as f64, (i + 2) as f64).unwrap();
        }
        let records = store.load_all().unwrap();
        assert_eq!(records.len(), 5);
        let tags: Vec<&str> = records.iter().map(|r| r.operation.as_str()).collect();
        assert_eq!(tags, vec!["op2", "op3", "op4", "op5", "op6"]);
        assert_eq!(records[0], Record::new("op2", 2.0, 3.0, 4.0));
    }

    #[test]
    fn clear_leaves_empty_history() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.add_record("Multiply", 2.0, 3.0, 6.0).unwrap();
        store.clear().unwrap();
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn delete_reindexes_remaining_records() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        for i in 0..3 {
            let i = i as f64;
            store.add_record("Subtract", i + 2.0, i, i + 2.0).unwrap();
        }
        let removed = store.delete_at(1).unwrap();
        assert_eq!(removed, Some(Record::new("Subtract", 3.0, 1.0, 3.0)));
        let records = store.load_all().unwrap();
        assert_eq!(records, vec![Record::new("Subtract", 2.0, 0.0, 2.0), Record::new("Subtract", 4.0, 2.0, 4.0)]);
    }

    #[test]
    fn delete_out_of_range_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.add_record("Divide", 10.0, 2.0, 5.0).unwrap();
        let before = fs::read_to_string(store.path()).unwrap();
        assert_eq!(store.delete_at(5).unwrap(), None);
        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
    }

    #[test]
    fn operation_names_with_commas_survive() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.add_record("a, \"b\"", 1.0, 2.0, 3.0).unwrap();
        assert_eq!(store.load_all().unwrap()[0].operation, "a, \"b\"");
    }

    #[test]
    fn multiline_operation_names_do_not_split_rows() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.add_record("two\nlines", 1.0, 2.0, 3.0).unwrap();
        store.add_record("Add", 4.0, 5.0, 9.0).unwrap();
        let records = store.load_all().unwrap();
        assert_eq!(records, vec![Record::new("two\nlines", 1.0, 2.0, 3.0), Record::new("Add", 4.0, 5.0, 9.0)]);
        assert_eq!(store.delete_at(0).unwrap(), Some(Record::new("two\nlines", 1.0, 2.0, 3.0)));
        assert_eq!(store.load_all().unwrap().len(), 1);
    }

    #[test]
    fn reads_integer_columns() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::write(store.path(), "Operation,Num1,Num2,Result\nadd,1,2,3\n").unwrap();
        assert_eq!(store.load_all().unwrap(), vec![Record::new("add", 1.0, 2.0, 3.0)]);
    }

    #[test]
    fn malformed_row_names_the_line() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::write(store.path(), "Operation,Num1,Num2,Result\nAdd,1,2,3\nAdd,x,2,3\n").unwrap();
        match store.load_all() {
            Err(HistoryError::Malformed { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected malformed error, got {:?}", other),
        }
    }

    #[test]
    fn render_empty_and_filled() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert_eq!(store.render().unwrap(), "No history available.");
        store.add_record("Add", 2.0, 3.0, 5.0).unwrap();
        let table = store.render().unwrap();
        assert!(table.contains("Operation"));
        assert!(table.lines().nth(1).unwrap().starts_with("0  "));
        assert!(table.contains("5.0"));
    }
}
