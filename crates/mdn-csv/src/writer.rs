//! CSV writer

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::options::CsvWriteOptions;
use mdn_core::Sheet;

/// Tabular block writer
pub struct CsvWriter;

impl CsvWriter {
    /// Write a sheet's grid to a CSV file
    pub fn write_file<P: AsRef<Path>>(
        sheet: &Sheet,
        path: P,
        options: &CsvWriteOptions,
    ) -> CsvResult<()> {
        let file = File::create(path)?;
        Self::write(sheet, file, options)
    }

    /// Render a sheet's grid as a tabular block body
    pub fn write_string(sheet: &Sheet, options: &CsvWriteOptions) -> CsvResult<String> {
        let mut buf = Vec::new();
        Self::write(sheet, &mut buf, options)?;
        String::from_utf8(buf).map_err(|e| CsvError::Parse {
            row: 0,
            column: 0,
            message: e.to_string(),
        })
    }

    /// Write the header record then every data row, padded to the header width
    pub fn write<W: Write>(sheet: &Sheet, writer: W, options: &CsvWriteOptions) -> CsvResult<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .terminator(options.line_terminator.to_csv())
            .flexible(false)
            .from_writer(writer);

        let width = sheet.headers().len();
        if width > 0 {
            csv_writer.write_record(sheet.headers())?;
            for row in sheet.rows() {
                let mut record: Vec<String> = row.iter().map(ToString::to_string).collect();
                record.resize(width, String::new());
                csv_writer.write_record(&record)?;
            }
        }

        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CsvReadOptions, CsvReader, LineTerminator};
    use mdn_core::CellValue;
    use pretty_assertions::assert_eq;

    fn revenue() -> Sheet {
        let mut sheet = Sheet::with_headers("Revenue", ["Month", "Revenue", "Growth", "Total"]);
        sheet
            .push_row(vec![CellValue::text("Jan"), 10000.0.into(), 0.05.into()])
            .unwrap();
        sheet
            .push_row(vec![CellValue::text("Feb"), 10500.0.into(), 0.05.into()])
            .unwrap();
        sheet
    }

    #[test]
    fn test_write_pads_rows() {
        let text = CsvWriter::write_string(&revenue(), &CsvWriteOptions::default()).unwrap();
        assert_eq!(
            text,
            "Month,Revenue,Growth,Total\nJan,10000,0.05,\nFeb,10500,0.05,\n"
        );
    }

    #[test]
    fn test_write_quotes_when_needed() {
        let mut sheet = Sheet::with_headers("S", ["name"]);
        sheet.push_row(vec!["Smith, J"]).unwrap();
        let text = CsvWriter::write_string(&sheet, &CsvWriteOptions::default()).unwrap();
        assert_eq!(text, "name\n\"Smith, J\"\n");
    }

    #[test]
    fn test_crlf_terminator() {
        let options = CsvWriteOptions {
            line_terminator: LineTerminator::CRLF,
            ..Default::default()
        };
        let mut sheet = Sheet::with_headers("S", ["a", "b"]);
        sheet.push_row(vec![1.0, 2.0]).unwrap();
        let text = CsvWriter::write_string(&sheet, &options).unwrap();
        assert_eq!(text, "a,b\r\n1,2\r\n");
    }

    #[test]
    fn test_headerless_sheet_writes_nothing() {
        let text = CsvWriter::write_string(&Sheet::new("E"), &CsvWriteOptions::default()).unwrap();
        assert_eq!(text, "");
    }

    #[test]
    fn test_written_block_reads_back() {
        let sheet = revenue();
        let text = CsvWriter::write_string(&sheet, &CsvWriteOptions::default()).unwrap();
        let back = CsvReader::read_str("Revenue", &text, &CsvReadOptions::default()).unwrap();
        assert_eq!(back, sheet);
    }

    #[test]
    fn test_write_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("revenue.csv");
        CsvWriter::write_file(&revenue(), &path, &CsvWriteOptions::default()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Month,Revenue"));
    }
}
