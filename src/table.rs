//! A generic table of string values with named columns.
//!
//! Data package files come in many shapes, but all share a header row and refer to columns by
//! name. Values are kept as strings so that tables can be written back out unchanged apart from
//! the rows which have been added, removed or modified.
use crate::input::input_err_msg;
use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim, Writer};
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Column holding technology identifiers
pub const TECHNOLOGY: &str = "TECHNOLOGY";
/// Column holding fuel identifiers
pub const FUEL: &str = "FUEL";
/// Column holding the value of a fact (or the members of a set, for catalog tables)
pub const VALUE: &str = "VALUE";
/// Column holding the year of a fact
pub const YEAR: &str = "YEAR";

/// A row of a [`Table`]
pub type Row = Vec<String>;

/// A table with named columns
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Create an empty table with the given column names
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Read a table from a CSV file
    pub fn from_path(file_path: &Path) -> Result<Self> {
        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .from_path(file_path)
            .with_context(|| input_err_msg(file_path))?;
        Self::from_csv_reader(reader).with_context(|| input_err_msg(file_path))
    }

    /// Read a table from CSV data
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_csv_reader(ReaderBuilder::new().trim(Trim::All).from_reader(reader))
    }

    fn from_csv_reader<R: Read>(mut reader: csv::Reader<R>) -> Result<Self> {
        let headers = reader.headers()?.iter().map(str::to_string).collect();
        let rows = reader
            .records()
            .map(|record| Ok(record?.iter().map(str::to_string).collect()))
            .collect::<Result<_>>()?;

        Ok(Self { headers, rows })
    }

    /// Write this table to a CSV file
    pub fn write(&self, file_path: &Path) -> Result<()> {
        let write = || -> Result<()> {
            let mut writer = Writer::from_path(file_path)?;
            writer.write_record(&self.headers)?;
            for row in &self.rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
            Ok(())
        };

        write().with_context(|| format!("Error writing {}", file_path.display()))
    }

    /// The column names
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// The rows of the table
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// The number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether the table has a column with the given name
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Get the index of a column, if present
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// Get the index of a column which the caller cannot do without
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .with_context(|| format!("Missing required column '{name}'"))
    }

    /// Add a row to the end of the table.
    ///
    /// # Panics
    ///
    /// If the row has a different number of fields to the table's header.
    pub fn push_row(&mut self, row: Row) {
        assert_eq!(
            row.len(),
            self.headers.len(),
            "Row length does not match number of columns"
        );
        self.rows.push(row);
    }

    /// Keep only the rows for which `f` returns `true`
    pub fn retain_rows<F>(&mut self, f: F)
    where
        F: FnMut(&Row) -> bool,
    {
        self.rows.retain(f);
    }

    /// Get a mutable reference to a single field
    pub fn field_mut(&mut self, row: usize, column: usize) -> &mut String {
        &mut self.rows[row][column]
    }
}

/// Parse a field of a row into a value of type `T`
pub fn parse_field<T>(row: &[String], column: usize, column_name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let field = &row[column];
    field
        .parse()
        .with_context(|| format!("Invalid {column_name} value: '{field}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use std::fs;
    use tempfile::tempdir;

    const CSV: &str = "REGION,TECHNOLOGY,YEAR,VALUE\nGLOBAL,PWRHYDUSA01,2020, 1.5\n";

    #[test]
    fn from_reader_trims_fields() {
        let table = Table::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(table.headers(), ["REGION", TECHNOLOGY, YEAR, VALUE]);
        assert_eq!(table.rows(), [["GLOBAL", "PWRHYDUSA01", "2020", "1.5"]]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn write_round_trips_unchanged() {
        let dir = tempdir().unwrap();
        let in_path = dir.path().join("in.csv");
        let out_path = dir.path().join("out.csv");
        fs::write(&in_path, "FUEL,VALUE\nELCUSA01,3\n").unwrap();

        Table::from_path(&in_path).unwrap().write(&out_path).unwrap();
        assert_eq!(
            fs::read_to_string(&in_path).unwrap(),
            fs::read_to_string(&out_path).unwrap()
        );
    }

    #[test]
    fn from_path_missing_file() {
        assert!(Table::from_path(Path::new("does/not/exist.csv")).is_err());
    }

    #[test]
    fn header_only_table_is_empty() {
        let table = Table::from_reader("VALUE\n".as_bytes()).unwrap();
        assert!(table.is_empty());
        assert!(table.has_column(VALUE));
    }

    #[test]
    fn require_column_missing() {
        let table = Table::new([TECHNOLOGY, VALUE]);
        assert_eq!(table.require_column(VALUE).unwrap(), 1);
        assert_error!(table.require_column(YEAR), "Missing required column 'YEAR'");
    }

    #[test]
    fn parse_field_works() {
        let row: Row = vec!["2020".into(), "abc".into()];
        assert_eq!(parse_field::<u32>(&row, 0, YEAR).unwrap(), 2020);
        assert_error!(
            parse_field::<f64>(&row, 1, VALUE),
            "Invalid VALUE value: 'abc'"
        );
    }

    #[test]
    #[should_panic(expected = "Row length does not match number of columns")]
    fn push_row_wrong_length() {
        let mut table = Table::new([TECHNOLOGY, VALUE]);
        table.push_row(vec!["PWRHYDUSA01".into()]);
    }
}
