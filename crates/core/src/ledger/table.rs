//! In-memory ledger table with CSV and XLSX persistence.

use std::fs;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::Workbook;

use super::error::LedgerError;
use super::types::{Cell, LedgerFormat};

static EMPTY_CELL: Cell = Cell::Empty;

/// A ledger loaded into memory: one header row followed by data rows.
///
/// Rows may have different lengths; missing cells read as [`Cell::Empty`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerTable {
    sheet_name: Option<String>,
    header: Vec<Cell>,
    rows: Vec<Vec<Cell>>,
}

impl LedgerTable {
    /// Creates a table from a header and data rows.
    pub fn new(header: Vec<Cell>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            sheet_name: None,
            header,
            rows,
        }
    }

    /// Loads a ledger, detecting the format from the file extension.
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let format = LedgerFormat::from_path(path).ok_or_else(|| LedgerError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;

        if !path.exists() {
            return Err(LedgerError::NotFound {
                path: path.to_path_buf(),
            });
        }

        match format {
            LedgerFormat::Csv => Self::load_csv(path),
            LedgerFormat::Xlsx => Self::load_xlsx(path),
        }
    }

    fn load_csv(path: &Path) -> Result<Self, LedgerError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;

        let mut records = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| LedgerError::malformed(path, e))?;
            records.push(record.iter().map(Cell::from_text).collect::<Vec<_>>());
        }

        let mut records = records.into_iter();
        let header = records.next().unwrap_or_default();

        Ok(Self {
            sheet_name: None,
            header,
            rows: records.collect(),
        })
    }

    fn load_xlsx(path: &Path) -> Result<Self, LedgerError> {
        let mut workbook = open_workbook_auto(path).map_err(|e| LedgerError::malformed(path, e))?;
        let sheet_name = workbook.sheet_names().first().cloned();

        let range = match workbook.worksheet_range_at(0) {
            Some(Ok(range)) => range,
            Some(Err(e)) => return Err(LedgerError::malformed(path, e)),
            None => return Err(LedgerError::malformed(path, "workbook has no worksheets")),
        };

        // The used range may start right of column A; keep absolute positions
        let col_offset = range.start().map(|(_, col)| col as usize).unwrap_or(0);

        let mut rows = range.rows().map(|row| {
            let mut cells = vec![Cell::Empty; col_offset];
            cells.extend(row.iter().map(cell_from_data));
            cells
        });
        let header = rows.next().unwrap_or_default();

        Ok(Self {
            sheet_name,
            header,
            rows: rows.collect(),
        })
    }

    /// Persists the whole table to `path`.
    ///
    /// The table is written to a hidden sibling file first and renamed over
    /// the target, so readers never observe a partially written ledger.
    pub fn save(&self, path: &Path) -> Result<(), LedgerError> {
        let format = LedgerFormat::from_path(path).ok_or_else(|| LedgerError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;

        let tmp_path = temp_sibling(path);
        let written = match format {
            LedgerFormat::Csv => self.write_csv(&tmp_path),
            LedgerFormat::Xlsx => self.write_xlsx(&tmp_path),
        };

        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        fs::rename(&tmp_path, path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            LedgerError::write_failed(path, e)
        })
    }

    fn write_csv(&self, path: &Path) -> Result<(), LedgerError> {
        let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;
        for row in self.all_rows() {
            writer.write_record(row.iter().map(|cell| cell.to_string()))?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_xlsx(&self, path: &Path) -> Result<(), LedgerError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        if let Some(name) = &self.sheet_name {
            worksheet
                .set_name(name.as_str())
                .map_err(|e| LedgerError::write_failed(path, e))?;
        }

        for (row_idx, row) in self.all_rows().enumerate() {
            let row_num =
                u32::try_from(row_idx).map_err(|e| LedgerError::write_failed(path, e))?;
            for (col_idx, cell) in row.iter().enumerate() {
                let col_num =
                    u16::try_from(col_idx).map_err(|e| LedgerError::write_failed(path, e))?;
                let written = match cell {
                    Cell::Empty => continue,
                    Cell::Text(text) => worksheet.write_string(row_num, col_num, text.as_str()),
                    Cell::Number(n) => worksheet.write_number(row_num, col_num, *n),
                    Cell::Bool(b) => worksheet.write_boolean(row_num, col_num, *b),
                };
                written.map_err(|e| LedgerError::write_failed(path, e))?;
            }
        }

        workbook
            .save(path)
            .map_err(|e| LedgerError::write_failed(path, e))
    }

    fn all_rows(&self) -> impl Iterator<Item = &Vec<Cell>> {
        std::iter::once(&self.header).chain(self.rows.iter())
    }

    /// Header row.
    pub fn header(&self) -> &[Cell] {
        &self.header
    }

    /// Data rows in file order.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the cell at a 0-based data row and column, or an empty cell.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    /// Widens the table so every row has at least `count` columns.
    ///
    /// New header cells are named `Column_<n>`. Existing cells are never
    /// dropped.
    pub fn ensure_columns(&mut self, count: usize) {
        while self.header.len() < count {
            let name = format!("Column_{}", self.header.len() + 1);
            self.header.push(Cell::Text(name));
        }
        for row in &mut self.rows {
            if row.len() < count {
                row.resize(count, Cell::Empty);
            }
        }
    }

    /// Sets a cell, widening the table as needed. Returns false when the
    /// row does not exist.
    pub fn set_cell(&mut self, row: usize, col: usize, cell: Cell) -> bool {
        if row >= self.rows.len() {
            return false;
        }
        self.ensure_columns(col + 1);
        self.rows[row][col] = cell;
        true
    }
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::String(s) => Cell::from_text(s.as_str()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::from_text(s.as_str()),
        // Error cells and blanks count as absent
        _ => Cell::Empty,
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn test_csv_load_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.csv");
        fs::write(&path, "id,name,prompt\n1,a,a cat\n2,b\n").unwrap();

        let table = LedgerTable::load(&path).unwrap();
        assert_eq!(table.header().len(), 3);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.cell(0, 2), &text("a cat"));
        // Short rows read as empty
        assert_eq!(table.cell(1, 2), &Cell::Empty);
        assert_eq!(table.cell(9, 9), &Cell::Empty);
    }

    #[test]
    fn test_csv_save_extends_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.csv");
        fs::write(&path, "id,name,prompt\n1,a,a cat\n").unwrap();

        let mut table = LedgerTable::load(&path).unwrap();
        assert!(table.set_cell(0, 4, text("done")));
        table.save(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "id,name,prompt,Column_4,Column_5\n1,a,a cat,,done\n");
        assert!(!dir.path().join(".tasks.csv.tmp").exists());
    }

    #[test]
    fn test_set_cell_out_of_range() {
        let mut table = LedgerTable::new(vec![text("a")], vec![vec![text("x")]]);
        assert!(!table.set_cell(1, 0, text("y")));
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn test_xlsx_round_trip_preserves_types() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.xlsx");

        let table = LedgerTable::new(
            vec![text("id"), text("prompt"), text("status")],
            vec![
                vec![Cell::Number(1.0), text("a cat"), Cell::Empty],
                vec![Cell::Number(2.0), text("a dog"), text("done")],
            ],
        );
        table.save(&path).unwrap();

        let loaded = LedgerTable::load(&path).unwrap();
        assert_eq!(loaded.row_count(), 2);
        assert_eq!(loaded.cell(0, 0), &Cell::Number(1.0));
        assert_eq!(loaded.cell(0, 1), &text("a cat"));
        assert_eq!(loaded.cell(0, 2), &Cell::Empty);
        assert_eq!(loaded.cell(1, 2), &text("done"));
    }

    #[test]
    fn test_load_missing_and_unsupported() {
        let dir = TempDir::new().unwrap();
        let missing = LedgerTable::load(&dir.path().join("nope.csv"));
        assert!(matches!(missing, Err(LedgerError::NotFound { .. })));

        let unsupported = LedgerTable::load(&dir.path().join("tasks.txt"));
        assert!(matches!(unsupported, Err(LedgerError::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_load_malformed_xlsx() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.xlsx");
        fs::write(&path, b"definitely not a zip archive").unwrap();

        let result = LedgerTable::load(&path);
        assert!(matches!(result, Err(LedgerError::Malformed { .. })));
    }
}
