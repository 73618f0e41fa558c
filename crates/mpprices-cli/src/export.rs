//! Spreadsheet output shared by every command.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

/// Widest a column is allowed to grow, in characters.
pub(crate) const DEFAULT_WIDTH_CAP: usize = 50;

/// One typed spreadsheet value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    fn display_len(&self) -> usize {
        match self {
            Cell::Text(s) => s.chars().count(),
            Cell::Number(n) => n.to_string().len(),
            Cell::Empty => 0,
        }
    }

    fn is_filled(&self) -> bool {
        !matches!(self, Cell::Empty)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_owned())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<Option<String>> for Cell {
    fn from(value: Option<String>) -> Self {
        value.map_or(Cell::Empty, Cell::Text)
    }
}

impl From<Option<&str>> for Cell {
    fn from(value: Option<&str>) -> Self {
        value.map_or(Cell::Empty, Cell::from)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Cell::Empty, Cell::Number)
    }
}

impl From<u64> for Cell {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: u64) -> Self {
        Cell::Number(value as f64)
    }
}

impl From<Option<u64>> for Cell {
    fn from(value: Option<u64>) -> Self {
        value.map_or(Cell::Empty, Cell::from)
    }
}

/// A sheet of an existing workbook, copied as-is when the workbook is
/// rewritten. `origin` is the (row, column) of its first cell.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct KeptSheet {
    pub(crate) name: String,
    pub(crate) origin: (u32, u16),
    pub(crate) rows: Vec<Vec<Cell>>,
}

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, cell: &Cell) -> Result<(), XlsxError> {
    match cell {
        Cell::Text(s) => {
            sheet.write_string(row, col, s)?;
        }
        Cell::Number(n) => {
            sheet.write_number(row, col, *n)?;
        }
        Cell::Empty => {}
    }
    Ok(())
}

fn copy_sheet(workbook: &mut Workbook, kept: &KeptSheet) -> anyhow::Result<()> {
    let sheet = workbook.add_worksheet();
    sheet.set_name(&kept.name)?;
    let (row0, col0) = kept.origin;
    for (r, row) in kept.rows.iter().enumerate() {
        let row_num = row0 + u32::try_from(r)?;
        for (c, cell) in row.iter().enumerate() {
            write_cell(sheet, row_num, col0 + u16::try_from(c)?, cell)?;
        }
    }
    Ok(())
}

/// Writes a single-sheet workbook with a bold header row.
pub(crate) struct SheetWriter<'a> {
    sheet_name: &'a str,
    headers: &'a [&'a str],
    width_cap: usize,
}

impl<'a> SheetWriter<'a> {
    pub(crate) fn new(sheet_name: &'a str, headers: &'a [&'a str]) -> Self {
        Self {
            sheet_name,
            headers,
            width_cap: DEFAULT_WIDTH_CAP,
        }
    }

    pub(crate) fn width_cap(mut self, cap: usize) -> Self {
        self.width_cap = cap;
        self
    }

    /// Column widths: the longest value or header plus two, capped.
    fn column_widths(&self, rows: &[Vec<Cell>]) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(col, header)| {
                let longest = rows
                    .iter()
                    .filter_map(|row| row.get(col))
                    .map(Cell::display_len)
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or_default();
                (longest + 2).min(self.width_cap)
            })
            .collect()
    }

    /// Saves `rows` to `path`, creating the parent directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the workbook
    /// cannot be written.
    pub(crate) fn write(&self, path: &Path, rows: &[Vec<Cell>]) -> anyhow::Result<PathBuf> {
        self.write_alongside(path, rows, &[])
    }

    /// Like [`Self::write`], with `kept` sheets placed before this one.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the workbook
    /// cannot be written.
    pub(crate) fn write_alongside(
        &self,
        path: &Path,
        rows: &[Vec<Cell>],
        kept: &[KeptSheet],
    ) -> anyhow::Result<PathBuf> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut workbook = Workbook::new();
        for other in kept {
            copy_sheet(&mut workbook, other)?;
        }
        let sheet = workbook.add_worksheet();
        sheet.set_name(self.sheet_name)?;

        let bold = Format::new().set_bold();
        for (col, header) in self.headers.iter().enumerate() {
            sheet.write_string_with_format(0, u16::try_from(col)?, *header, &bold)?;
        }

        for (index, row) in rows.iter().enumerate() {
            let row_num = u32::try_from(index + 1)?;
            for (col, cell) in row.iter().enumerate() {
                write_cell(sheet, row_num, u16::try_from(col)?, cell)?;
            }
        }

        for (col, width) in self.column_widths(rows).into_iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let width = width as f64;
            sheet.set_column_width(u16::try_from(col)?, width)?;
        }

        workbook.save(path)?;
        tracing::info!(
            path = %path.display(),
            sheet = self.sheet_name,
            rows = rows.len(),
            columns = self.headers.len(),
            kept_sheets = kept.len(),
            "spreadsheet written"
        );
        Ok(path.to_path_buf())
    }
}

/// `{dir}/{prefix}_{YYYYmmdd_HHMMSS}.xlsx`.
pub(crate) fn timestamped_path(dir: &Path, prefix: &str, now: DateTime<Local>) -> PathBuf {
    dir.join(format!("{prefix}_{}.xlsx", now.format("%Y%m%d_%H%M%S")))
}

/// Logs how many rows have a value in each column.
pub(crate) fn log_fill_rates(headers: &[&str], rows: &[Vec<Cell>]) {
    if rows.is_empty() {
        return;
    }
    for (col, header) in headers.iter().enumerate() {
        let filled = rows
            .iter()
            .filter(|row| row.get(col).is_some_and(Cell::is_filled))
            .count();
        #[allow(clippy::cast_precision_loss)]
        let pct = filled as f64 / rows.len() as f64 * 100.0;
        tracing::info!(column = *header, filled, total = rows.len(), "fill rate {pct:.1}%");
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn timestamped_name_format() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let path = timestamped_path(Path::new("out"), "wb_prices", now);
        assert_eq!(path, Path::new("out/wb_prices_20240309_070501.xlsx"));
    }

    #[test]
    fn widths_are_capped_and_padded() {
        let headers = ["ID", "Название"];
        let rows = vec![
            vec![Cell::from(12_345_u64), Cell::from("x".repeat(80))],
            vec![Cell::Empty, Cell::from("short")],
        ];
        let widths = SheetWriter::new("Prices", &headers).column_widths(&rows);
        assert_eq!(widths, vec![7, DEFAULT_WIDTH_CAP]);
    }

    #[test]
    fn header_length_counts_characters_not_bytes() {
        let headers = ["Цена"];
        let widths = SheetWriter::new("Prices", &headers).column_widths(&[]);
        assert_eq!(widths, vec![6]);
    }

    #[test]
    fn option_conversions() {
        assert_eq!(Cell::from(None::<f64>), Cell::Empty);
        assert_eq!(Cell::from(Some(1.5)), Cell::Number(1.5));
        assert_eq!(Cell::from(Some("a".to_string())), Cell::Text("a".into()));
    }

    #[test]
    fn write_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.xlsx");
        let headers = ["A", "B"];
        let rows = vec![vec![Cell::from("x"), Cell::from(2.0)]];
        let written = SheetWriter::new("Sheet", &headers)
            .write(&path, &rows)
            .unwrap();
        assert_eq!(written, path);
        assert!(path.exists());
    }
}
