//! Filter data package tables down to a geographic scope.
//!
//! Each table names the columns holding identifiers and the geography slots of each identifier
//! which are checked against the scope in a [`TableSchema`]. Tables without identifier columns
//! pass through untouched.
use crate::identifier::{INTERNATIONAL, SEGMENT_WIDTH, SliceSpec};
use crate::table::{FUEL, TECHNOLOGY, Table, VALUE};
use anyhow::{Context, Result, ensure};
use log::{debug, info};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the catalog table listing every technology in the model
const TECHNOLOGY_CATALOG: &str = "TECHNOLOGY";
/// Name of the catalog table listing every fuel in the model
const FUEL_CATALOG: &str = "FUEL";

/// Geography slots checked for technology identifiers.
///
/// The first slot catches the origin of transmission links (e.g. `TRNCANXXUSAXX`), the second
/// ordinary technologies (e.g. `PWRHYDUSA01`) and the third the destination of transmission links.
const TECHNOLOGY_SLOTS: [usize; 3] = [3, 6, 8];
/// Geography slots checked for fuel identifiers (e.g. `COAUSA`, `ELCUSA01`)
const FUEL_SLOTS: [usize; 2] = [3, 6];

/// The set of geography codes to be kept.
///
/// The international code is always included so that cross-border links are never dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeographyScope(HashSet<String>);

impl GeographyScope {
    /// Create a new scope from a list of geography codes
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut codes: HashSet<String> = codes.into_iter().map(Into::into).collect();
        codes.insert(INTERNATIONAL.to_string());
        Self(codes)
    }

    /// Whether `code` is in scope. Empty codes never are.
    pub fn contains(&self, code: &str) -> bool {
        !code.is_empty() && self.0.contains(code)
    }
}

/// Check that a geography code is well formed
pub fn check_geography_code(code: &str) -> Result<()> {
    ensure!(
        code.len() == SEGMENT_WIDTH && code.chars().all(|c| c.is_ascii_uppercase()),
        "Invalid geography code '{code}': must be {SEGMENT_WIDTH} upper-case letters"
    );

    Ok(())
}

/// A column of a table which holds identifiers
#[derive(Clone, Debug, PartialEq)]
pub struct IdentifierColumn {
    /// The name of the column
    pub name: String,
    /// Where the geography codes are found within the identifiers
    pub spec: SliceSpec,
}

impl IdentifierColumn {
    fn new(name: &str, slots: &[usize]) -> Self {
        Self {
            name: name.to_string(),
            spec: SliceSpec::geography_slots(slots),
        }
    }
}

/// Describes which columns of a table hold identifiers
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableSchema {
    /// Identifier columns. A row must be in scope for all of them to be kept.
    pub identifier_columns: Vec<IdentifierColumn>,
}

impl TableSchema {
    /// Work out the schema for a table from its name and columns.
    ///
    /// # Arguments
    ///
    /// * `table_name` - The table name (i.e. the file stem, e.g. `ResidualCapacity`)
    /// * `table` - The table itself
    pub fn for_table(table_name: &str, table: &Table) -> Self {
        let mut identifier_columns = Vec::new();
        if table.has_column(TECHNOLOGY) {
            identifier_columns.push(IdentifierColumn::new(TECHNOLOGY, &TECHNOLOGY_SLOTS));
        }
        if table.has_column(FUEL) {
            identifier_columns.push(IdentifierColumn::new(FUEL, &FUEL_SLOTS));
        }

        // Catalog tables list identifiers in their VALUE column
        match table_name {
            TECHNOLOGY_CATALOG => {
                identifier_columns.push(IdentifierColumn::new(VALUE, &TECHNOLOGY_SLOTS));
            }
            FUEL_CATALOG => identifier_columns.push(IdentifierColumn::new(VALUE, &FUEL_SLOTS)),
            _ => {}
        }

        Self { identifier_columns }
    }

    /// Whether this schema places no constraints on rows
    pub fn is_unconstrained(&self) -> bool {
        self.identifier_columns.is_empty()
    }
}

/// Filter a table by geography.
///
/// A row is kept if, for every identifier column in `schema`, at least one geography slot of the
/// identifier is in `scope`.
pub fn filter_table(table: &Table, schema: &TableSchema, scope: &GeographyScope) -> Result<Table> {
    let columns = schema
        .identifier_columns
        .iter()
        .map(|column| Ok((table.require_column(&column.name)?, &column.spec)))
        .collect::<Result<Vec<_>>>()?;

    let mut filtered = table.clone();
    filtered.retain_rows(|row| {
        columns.iter().all(|(idx, spec)| {
            spec.geographies(&row[*idx])
                .any(|code| scope.contains(code))
        })
    });

    Ok(filtered)
}

/// Get the paths of all CSV files in a directory, sorted by name
fn get_csv_file_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file()
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        {
            paths.push(path);
        }
    }
    paths.sort();

    Ok(paths)
}

/// Filter every CSV file in `input_dir`, writing the results to `output_dir`.
///
/// Every table is filtered, so if `scope` contains nothing but the international code then only
/// international rows are kept. Tables without identifier columns are copied unchanged.
///
/// # Returns
///
/// The number of files written.
pub fn filter_data_dir(input_dir: &Path, output_dir: &Path, scope: &GeographyScope) -> Result<usize> {
    let file_paths = get_csv_file_paths(input_dir)
        .with_context(|| format!("Could not list CSV files in {}", input_dir.display()))?;
    for file_path in &file_paths {
        let table = Table::from_path(file_path)?;
        let table_name = file_path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default();
        let schema = TableSchema::for_table(table_name, &table);

        let filtered = if table.is_empty() {
            table.clone()
        } else {
            filter_table(&table, &schema, scope)
                .with_context(|| format!("Could not filter table {table_name}"))?
        };
        debug!(
            "{table_name}: kept {} of {} rows",
            filtered.len(),
            table.len()
        );

        let file_name = file_path.file_name().context("Missing file name")?;
        filtered.write(&output_dir.join(file_name))?;
    }

    info!("Geographic filter applied to {} files", file_paths.len());

    Ok(file_paths.len())
}
