//! Extraction of the first sheet of an uploaded file into header-keyed rows.
//!
//! Workbooks (`.xlsx`, `.xls`, `.xlsb`, `.ods`) are read with `calamine`;
//! anything that does not carry a workbook signature is parsed as CSV.

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{Data, Reader};
use pdash_core::{Cell, RawRow};

use crate::error::IngestError;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// The raw cell grid of one sheet, top to bottom.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetGrid {
    rows: Vec<Vec<Cell>>,
}

/// Rows keyed by header, with the header names they were keyed by.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetRecords {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl SheetGrid {
    #[must_use]
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    /// Treats the grid row at `header_offset` as the header row and keys every
    /// row below it by those headers.
    ///
    /// Header cells are trimmed; empty header cells drop their column. A
    /// repeated header gets a `_1`, `_2`, ... suffix. Rows whose cells are all
    /// empty are skipped. Every kept row has an entry for every header, with
    /// [`Cell::Empty`] where the sheet had nothing.
    #[must_use]
    pub fn records(&self, header_offset: usize) -> SheetRecords {
        let mut grid_rows = self.rows.iter().skip(header_offset);
        let Some(header_cells) = grid_rows.next() else {
            return SheetRecords::default();
        };

        let columns = header_columns(header_cells);
        let rows = grid_rows
            .filter(|cells| cells.iter().any(|cell| !cell.is_empty()))
            .map(|cells| {
                columns
                    .iter()
                    .map(|(index, header)| {
                        let cell = cells.get(*index).cloned().unwrap_or(Cell::Empty);
                        (header.clone(), cell)
                    })
                    .collect::<RawRow>()
            })
            .collect();

        SheetRecords {
            headers: columns.into_iter().map(|(_, header)| header).collect(),
            rows,
        }
    }
}

/// Reads the first sheet of `bytes`, sniffing the format from its leading
/// bytes.
///
/// # Errors
///
/// Returns [`IngestError::Workbook`] if a workbook cannot be opened,
/// [`IngestError::NoSheets`] if it has no sheets, and [`IngestError::Csv`] if
/// CSV input is malformed.
pub fn read_first_sheet(bytes: &[u8]) -> Result<SheetGrid, IngestError> {
    if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
        read_workbook(bytes)
    } else {
        read_csv(bytes)
    }
}

fn read_workbook(bytes: &[u8]) -> Result<SheetGrid, IngestError> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(IngestError::NoSheets)??;

    let rows = range
        .rows()
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();
    Ok(SheetGrid::new(rows))
}

fn read_csv(bytes: &[u8]) -> Result<SheetGrid, IngestError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    // Byte records: a stray non-UTF-8 byte in free text is replaced, not fatal.
    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(String::from_utf8_lossy(field).into_owned())
                    }
                })
                .collect(),
        );
    }
    Ok(SheetGrid::new(rows))
}

#[allow(clippy::cast_precision_loss)]
fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        // Serial day number, as spreadsheets store it.
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
    }
}

/// Maps each non-empty header cell to `(column index, unique header name)`.
fn header_columns(cells: &[Cell]) -> Vec<(usize, String)> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut columns = Vec::with_capacity(cells.len());

    for (index, cell) in cells.iter().enumerate() {
        let Some(text) = cell.as_text() else {
            continue;
        };
        let name = text.trim();
        if name.is_empty() {
            continue;
        }

        let count = seen.entry(name.to_string()).or_insert(0);
        let unique = if *count == 0 {
            name.to_string()
        } else {
            format!("{name}_{count}")
        };
        *count += 1;
        columns.push((index, unique));
    }

    columns
}
