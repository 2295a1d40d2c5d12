//! CSV reader

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::options::CsvReadOptions;
use mdn_core::{CellValue, Sheet};

/// Tabular block reader
pub struct CsvReader;

impl CsvReader {
    /// Read a CSV file into a sheet named `name`
    pub fn read_file<P: AsRef<Path>>(
        name: &str,
        path: P,
        options: &CsvReadOptions,
    ) -> CsvResult<Sheet> {
        let file = File::open(path)?;
        Self::read(name, file, options)
    }

    /// Read a tabular block body into a sheet named `name`
    pub fn read_str(name: &str, text: &str, options: &CsvReadOptions) -> CsvResult<Sheet> {
        Self::read(name, text.as_bytes(), options)
    }

    /// Read CSV from a reader into a sheet named `name`.
    ///
    /// The first record becomes the headers. Shorter rows are padded with
    /// blanks; a row with more fields than headers is a parse error.
    pub fn read<R: Read>(name: &str, reader: R, options: &CsvReadOptions) -> CsvResult<Sheet> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut records = csv_reader.records();
        let Some(headers) = records.next().transpose()? else {
            return Ok(Sheet::new(name));
        };
        let mut sheet = Sheet::with_headers(name, headers.iter());
        let width = headers.len();

        for result in records {
            let record = result?;
            if record.len() > width {
                let row = record
                    .position()
                    .map_or(sheet.row_count() + 2, |p| p.line() as usize);
                return Err(CsvError::Parse {
                    row,
                    column: width + 1,
                    message: format!(
                        "{} fields but only {} headers in sheet '{}'",
                        record.len(),
                        width,
                        name
                    ),
                });
            }

            let values = record.iter().map(|field| {
                if options.auto_detect_types {
                    CellValue::from_field(field)
                } else if field.is_empty() {
                    CellValue::Blank
                } else {
                    CellValue::text(field)
                }
            });
            sheet.push_row(values)?;
        }

        tracing::trace!(
            sheet = name,
            rows = sheet.row_count(),
            cols = width,
            "read tabular block"
        );
        Ok(sheet)
    }
}
