//! Chunked spreadsheet writer.
//!
//! Splits a tabular result into fixed-size row blocks and serializes each
//! block to its own named sheet of one workbook. Sheets are appended in
//! ascending order and never revisited; concatenating them (minus the
//! repeated headers) reconstructs the input exactly.

use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, Workbook, Worksheet};
use tracing::debug;

use crate::error::{ExportError, Result};
use crate::warehouse::{TabularResult, Value};

/// Default rows per sheet.
pub const DEFAULT_CHUNK_SIZE: usize = 800_000;

/// Sheet name prefix, kept from the original export tool's UI language.
pub const SHEET_NAME_PREFIX: &str = "数据";

/// Returns the number of sheets for `n` rows at the given chunk size.
///
/// An empty result still produces one header-only sheet.
pub fn sheet_count(n: usize, chunk_size: usize) -> usize {
    if n == 0 {
        1
    } else {
        n.div_ceil(chunk_size)
    }
}

/// Returns the deterministic name of the sheet at `index` (0-based).
pub fn sheet_name(index: usize) -> String {
    format!("{SHEET_NAME_PREFIX}_{}", index + 1)
}

/// Returns the half-open row ranges `[start, end)` of each sheet, in order.
pub fn chunk_bounds(n: usize, chunk_size: usize) -> Vec<(usize, usize)> {
    (0..sheet_count(n, chunk_size))
        .map(|i| (i * chunk_size, ((i + 1) * chunk_size).min(n)))
        .collect()
}

/// Serializes the result into a multi-sheet xlsx byte buffer.
///
/// `on_sheet` is invoked once after each sheet is finalized with
/// `(sheets_written, sheet_count)`. The buffer is only valid once every sheet
/// has been written; no partial output ever escapes this function.
pub fn write_workbook(
    table: &TabularResult,
    chunk_size: usize,
    on_sheet: &mut dyn FnMut(usize, usize),
) -> Result<Vec<u8>> {
    if chunk_size == 0 {
        return Err(ExportError::invalid_input("chunk size must be positive"));
    }

    let mut workbook = Workbook::new();

    // Pin the container timestamp so identical input yields identical bytes.
    let fixed = ExcelDateTime::from_ymd(2000, 1, 1)?;
    workbook.set_properties(&DocProperties::new().set_creation_datetime(&fixed));

    let header_format = Format::new().set_bold();

    let total = sheet_count(table.row_count(), chunk_size);
    for (i, (start, end)) in chunk_bounds(table.row_count(), chunk_size).iter().enumerate() {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet_name(i))?;

        write_header(worksheet, table, &header_format)?;
        for (offset, row) in table.rows[*start..*end].iter().enumerate() {
            // Row 0 is the header.
            let sheet_row = (offset + 1) as u32;
            for (col, value) in row.iter().enumerate() {
                write_cell(worksheet, sheet_row, col, value, table)?;
            }
        }

        debug!(sheet = i + 1, total, rows = end - start, "Sheet finalized");
        on_sheet(i + 1, total);
    }

    Ok(workbook.save_to_buffer()?)
}

/// Writes the column-name header into row 0.
fn write_header(
    worksheet: &mut Worksheet,
    table: &TabularResult,
    format: &Format,
) -> Result<()> {
    for (col, column) in table.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, column_index(col)?, &column.name, format)?;
    }
    Ok(())
}

/// Writes one cell, rejecting values the xlsx cell model cannot represent.
fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: usize,
    value: &Value,
    table: &TabularResult,
) -> Result<()> {
    let col = column_index(col)?;
    match value {
        // NULL maps to an empty cell, as the original tool's writer did.
        Value::Null => {}
        Value::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        Value::Int(i) => {
            // xlsx cells are IEEE doubles; refuse integers that would change.
            // i64::MAX rounds up to 2^63 and the saturating cast back would
            // mask that, so it is excluded explicitly.
            let n = *i as f64;
            if *i == i64::MAX || n as i64 != *i {
                return Err(ExportError::serialization(format!(
                    "integer {i} in column '{}' exceeds exact spreadsheet precision",
                    column_name(table, col)
                )));
            }
            worksheet.write_number(row, col, n)?;
        }
        Value::Float(f) => {
            if !f.is_finite() {
                return Err(ExportError::serialization(format!(
                    "non-finite number in column '{}'",
                    column_name(table, col)
                )));
            }
            worksheet.write_number(row, col, *f)?;
        }
        Value::String(s) => {
            worksheet.write_string(row, col, s)?;
        }
    }
    Ok(())
}

fn column_index(col: usize) -> Result<u16> {
    u16::try_from(col)
        .map_err(|_| ExportError::serialization(format!("column index {col} out of range")))
}

fn column_name(table: &TabularResult, col: u16) -> &str {
    table
        .columns
        .get(col as usize)
        .map(|c| c.name.as_str())
        .unwrap_or("?")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warehouse::ColumnInfo;
    use pretty_assertions::assert_eq;

    fn small_table(n: usize) -> TabularResult {
        let columns = vec![
            ColumnInfo::new("id", "bigint"),
            ColumnInfo::new("name", "string"),
        ];
        let rows = (0..n)
            .map(|i| vec![Value::Int(i as i64), Value::String(format!("row_{i}"))])
            .collect();
        TabularResult::with_data(columns, rows)
    }

    #[test]
    fn test_sheet_count_math() {
        assert_eq!(sheet_count(0, 800_000), 1);
        assert_eq!(sheet_count(1, 800_000), 1);
        assert_eq!(sheet_count(800_000, 800_000), 1);
        assert_eq!(sheet_count(800_001, 800_000), 2);
        assert_eq!(sheet_count(1_600_000, 800_000), 2);
        assert_eq!(sheet_count(1_600_001, 800_000), 3);
    }

    #[test]
    fn test_chunk_bounds_boundary_scenario() {
        // 1,600,001 rows at 800,000 per sheet: sizes [800000, 800000, 1].
        let bounds = chunk_bounds(1_600_001, 800_000);
        assert_eq!(
            bounds,
            vec![
                (0, 800_000),
                (800_000, 1_600_000),
                (1_600_000, 1_600_001)
            ]
        );
    }

    #[test]
    fn test_chunk_bounds_exact_multiple_has_no_trailing_sheet() {
        let bounds = chunk_bounds(800_000, 800_000);
        assert_eq!(bounds, vec![(0, 800_000)]);
    }

    #[test]
    fn test_chunk_bounds_empty_is_one_header_only_sheet() {
        assert_eq!(chunk_bounds(0, 800_000), vec![(0, 0)]);
    }

    #[test]
    fn test_chunk_bounds_conserve_rows() {
        for (n, chunk) in [(0, 8), (1, 8), (7, 8), (8, 8), (9, 8), (17, 8), (24, 8)] {
            let bounds = chunk_bounds(n, chunk);
            let total: usize = bounds.iter().map(|(s, e)| e - s).sum();
            assert_eq!(total, n, "n={n} chunk={chunk}");

            // Contiguous and ordered: each sheet picks up where the last ended.
            let mut expected_start = 0;
            for (s, e) in bounds {
                assert_eq!(s, expected_start);
                assert!(e >= s);
                expected_start = e;
            }
        }
    }

    #[test]
    fn test_sheet_names_are_one_indexed() {
        assert_eq!(sheet_name(0), "数据_1");
        assert_eq!(sheet_name(1), "数据_2");
        assert_eq!(sheet_name(11), "数据_12");
    }

    #[test]
    fn test_write_workbook_reports_progress_per_sheet() {
        let table = small_table(17);
        let mut seen = Vec::new();
        write_workbook(&table, 8, &mut |sheet, total| seen.push((sheet, total))).unwrap();
        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_write_workbook_empty_emits_one_sheet() {
        let table = small_table(0);
        let mut seen = Vec::new();
        let bytes = write_workbook(&table, 8, &mut |sheet, total| seen.push((sheet, total))).unwrap();
        assert_eq!(seen, vec![(1, 1)]);
        assert!(!bytes.is_empty());
    }

    #[test]
    fn test_write_workbook_is_deterministic() {
        let table = small_table(10);
        let a = write_workbook(&table, 4, &mut |_, _| {}).unwrap();
        let b = write_workbook(&table, 4, &mut |_, _| {}).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_write_workbook_rejects_non_finite_floats() {
        let mut table = small_table(1);
        table.columns.push(ColumnInfo::new("amount", "double"));
        table.rows[0].push(Value::Float(f64::NAN));

        let err = write_workbook(&table, 8, &mut |_, _| {}).unwrap_err();

        assert!(matches!(err, ExportError::Serialization(_)));
        assert!(err.to_string().contains("amount"));
    }

    #[test]
    fn test_write_workbook_rejects_imprecise_large_ints() {
        // 2^53 + 1 is the first integer an IEEE double cannot hold exactly.
        let mut table = small_table(1);
        table.columns.push(ColumnInfo::new("big_id", "bigint"));
        table.rows[0].push(Value::Int(9_007_199_254_740_993));

        let err = write_workbook(&table, 8, &mut |_, _| {}).unwrap_err();

        assert!(matches!(err, ExportError::Serialization(_)));
        assert!(err.to_string().contains("big_id"));

        table.rows[0][2] = Value::Int(i64::MAX);
        let err = write_workbook(&table, 8, &mut |_, _| {}).unwrap_err();
        assert!(matches!(err, ExportError::Serialization(_)));
    }

    #[test]
    fn test_write_workbook_accepts_exactly_representable_ints() {
        let mut table = small_table(1);
        table.columns.push(ColumnInfo::new("big_id", "bigint"));
        table.rows[0].push(Value::Int(9_007_199_254_740_992));

        assert!(write_workbook(&table, 8, &mut |_, _| {}).is_ok());
    }

    #[test]
    fn test_write_workbook_rejects_zero_chunk_size() {
        let err = write_workbook(&small_table(1), 0, &mut |_, _| {}).unwrap_err();
        assert!(matches!(err, ExportError::InvalidInput(_)));
    }

    #[test]
    fn test_write_workbook_handles_null_and_bool_cells() {
        let columns = vec![
            ColumnInfo::new("flag", "boolean"),
            ColumnInfo::new("note", "string"),
        ];
        let rows = vec![
            vec![Value::Bool(true), Value::Null],
            vec![Value::Null, Value::String("ok".to_string())],
        ];
        let table = TabularResult::with_data(columns, rows);

        let bytes = write_workbook(&table, 8, &mut |_, _| {}).unwrap();
        assert!(!bytes.is_empty());
    }
}
