use crate::domain::model::{AvailabilityRecord, Table};
use crate::utils::error::{EtlError, Result};

/// UTF-8 signature so spreadsheet tools pick the right encoding.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Merges records with differing key sets into one table.
///
/// Columns are the union of all keys in first-seen order, with
/// `date_column` moved to the front. Absent fields become empty cells.
pub fn rectangularize(records: &[AvailabilityRecord], date_column: &str) -> Table {
    let mut columns: Vec<String> = Vec::new();
    for key in records.iter().flat_map(AvailabilityRecord::keys) {
        if !columns.iter().any(|column| column == key) {
            columns.push(key.to_string());
        }
    }

    if let Some(position) = columns.iter().position(|column| column == date_column) {
        let date = columns.remove(position);
        columns.insert(0, date);
    }

    let rows = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|column| record.get(column).unwrap_or_default().to_string())
                .collect()
        })
        .collect();

    Table { columns, rows }
}

/// Header row plus one line per record, prefixed with the UTF-8 BOM.
pub fn encode_csv(table: &Table) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(UTF8_BOM.to_vec());
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.into_inner().map_err(|e| EtlError::ProcessingError {
        message: format!("Failed to flush CSV buffer: {}", e.error()),
    })
}
