//! Derivation of maximum capacity limits for renewable technologies.
//!
//! Limits on capacity additions come from the `Properties` sheet of an external workbook (the
//! PLEXOS-World/MESSAGEix-GLOBIOM soft-link dataset). Adding these to the residual (already
//! installed) capacity in the base year gives the total capacity which may be installed, which is
//! applied to every year of the model horizon.
use crate::config::Config;
use crate::fetch::ensure_cached;
use crate::identifier::{Identifier, POWER_CLASS, TechnologyFamily, encode};
use crate::input::{input_err_msg, read_csv};
use crate::output::write_csv;
use crate::table::{TECHNOLOGY, Table, VALUE, YEAR, parse_field};
use anyhow::{Context, Result, bail};
use calamine::{Data, Reader, open_workbook_auto};
use indexmap::IndexMap;
use itertools::Itertools;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The year in which residual capacity is taken
pub const BASE_YEAR: u32 = 2015;

/// The name of the residual capacity table
pub const RESIDUAL_CAPACITY_FILE_NAME: &str = "ResidualCapacity.csv";

/// The name of the derived maximum capacity table
pub const MAX_CAPACITY_FILE_NAME: &str = "TotalAnnualMaxCapacity.csv";

/// The worksheet containing generator properties
const PROPERTIES_SHEET_NAME: &str = "Properties";

const MAX_UNITS_PROPERTY: &str = "Max Units Built";
const MAX_CAPACITY_PROPERTY: &str = "Max Capacity";
const GENERATOR_CLASS: &str = "Generator";
const BASE_SCENARIO_MARKER: &str = "Base";

/// Conversion factor from property units (MW) to model capacity units (GW)
const MW_PER_GW: f64 = 1000.0;

/// Padding appended to node codes which have no sub-national part
const NODE_PADDING: &str = "XX";

/// Node names of at most this many characters have no sub-national part (e.g. `AF-DZA`)
const SHORT_NODE_LEN: usize = 6;

/// Unit suffix for synthesised technology identifiers
const UNIT_SUFFIX: &str = "01";

/// Plant types in the properties table and the families they correspond to
const PLANT_FAMILIES: [(&str, TechnologyFamily); 5] = [
    ("Hydro", TechnologyFamily::Hydro),
    ("Solar|CSP", TechnologyFamily::ConcentratedSolar),
    ("Solar|PV", TechnologyFamily::SolarPV),
    ("Wind|Onshore", TechnologyFamily::WindOnshore),
    ("Wind|Offshore", TechnologyFamily::WindOffshore),
];

/// A row of the properties table
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PropertyRecord {
    /// The object the property applies to, e.g. `Wind|Onshore|NA-USA-CA`
    pub child_object: String,
    /// The property name, e.g. `Max Capacity`
    pub property: String,
    /// The scenario to which the property applies
    #[serde(default)]
    pub scenario: String,
    /// The class of the object, e.g. `Generator`
    pub child_class: String,
    /// The property value
    pub value: f64,
}

/// A row of the derived maximum capacity table
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MaxCapacityRow {
    /// The model region
    #[serde(rename = "REGION")]
    pub region: String,
    /// The technology identifier
    #[serde(rename = "TECHNOLOGY")]
    pub technology: String,
    /// The year
    #[serde(rename = "YEAR")]
    pub year: u32,
    /// Maximum total capacity
    #[serde(rename = "VALUE")]
    pub value: f64,
}

/// Get the technology family for a plant type in the properties table
fn family_for_plant(plant: &str) -> Option<TechnologyFamily> {
    PLANT_FAMILIES
        .iter()
        .find(|(name, _)| *name == plant)
        .map(|(_, family)| *family)
}

/// Whether a technology family can have its capacity limited
pub fn is_limited_family(family: TechnologyFamily) -> bool {
    PLANT_FAMILIES.iter().any(|(_, f)| *f == family)
}

/// Convert a node name from the properties table into a geography code.
///
/// The leading region token is dropped (e.g. `NA-USA-CA` becomes `USACA`). Nodes without a
/// sub-national part are padded (e.g. `AF-DZA` becomes `DZAXX`).
pub fn node_code(node: &str) -> String {
    let code = node.split('-').skip(1).join("");
    if node.len() <= SHORT_NODE_LEN {
        code + NODE_PADDING
    } else {
        code
    }
}

/// Split a child object into its plant type and node (e.g. `Wind|Onshore` and `NA-USA-CA`)
fn split_child_object(child_object: &str) -> Option<(&str, &str)> {
    child_object.rsplit_once('|')
}

/// Calculate capacity addition limits from the properties table.
///
/// The limit for each generator is its maximum capacity multiplied by the maximum number of
/// units which may be built (in the base scenario), converted to GW.
///
/// # Returns
///
/// A map of addition limits keyed by technology identifier
pub fn addition_limits(records: &[PropertyRecord]) -> IndexMap<String, f64> {
    let is_limited_object = |record: &PropertyRecord| {
        record.child_class == GENERATOR_CLASS
            && PLANT_FAMILIES
                .iter()
                .any(|(plant, _)| record.child_object.contains(plant))
    };

    let mut max_units = IndexMap::new();
    let mut max_capacity = IndexMap::new();
    for record in records.iter().filter(|record| is_limited_object(record)) {
        match record.property.as_str() {
            MAX_UNITS_PROPERTY if record.scenario.contains(BASE_SCENARIO_MARKER) => {
                max_units.insert(record.child_object.as_str(), record.value);
            }
            MAX_CAPACITY_PROPERTY => {
                max_capacity.insert(record.child_object.as_str(), record.value);
            }
            _ => {}
        }
    }

    let mut limits = IndexMap::new();
    for (child_object, capacity) in max_capacity {
        let Some(units) = max_units.get(child_object) else {
            continue;
        };
        let Some((plant, node)) = split_child_object(child_object) else {
            continue;
        };
        let Some(family) = family_for_plant(plant) else {
            continue;
        };

        let technology = encode(POWER_CLASS, family.code(), &node_code(node), UNIT_SUFFIX);
        limits.insert(technology, capacity * units / MW_PER_GW);
    }

    limits
}

/// Round a value to four decimal places
fn round4(value: f64) -> f64 {
    (value * 1e4).round() / 1e4
}

/// Get residual capacity in the base year for technologies whose capacity can be limited.
///
/// # Returns
///
/// A map of residual capacities (rounded to four decimal places) keyed by technology identifier
pub fn residual_capacities(table: &Table, base_year: u32) -> Result<IndexMap<String, f64>> {
    let tech_idx = table.require_column(TECHNOLOGY)?;
    let year_idx = table.require_column(YEAR)?;
    let value_idx = table.require_column(VALUE)?;

    let mut residual = IndexMap::new();
    for row in table.rows() {
        let year: u32 = parse_field(row, year_idx, YEAR)?;
        if year != base_year {
            continue;
        }

        let tech = &row[tech_idx];
        if !Identifier::parse(tech).is_ok_and(|id| is_limited_family(id.family)) {
            continue;
        }

        let value: f64 = parse_field(row, value_idx, VALUE)?;
        residual.insert(tech.clone(), round4(value));
    }

    Ok(residual)
}

/// Derive the maximum capacity for each technology in every year.
///
/// Technologies without an addition limit are skipped with a warning.
///
/// # Arguments
///
/// * `limits` - Capacity addition limits keyed by technology
/// * `residual` - Residual capacities keyed by technology
/// * `years` - The years of the model horizon
/// * `region` - The model region
pub fn derive_max_capacity(
    limits: &IndexMap<String, f64>,
    residual: &IndexMap<String, f64>,
    years: &[u32],
    region: &str,
) -> Vec<MaxCapacityRow> {
    let mut rows = Vec::new();
    for (tech, residual) in residual {
        let Some(limit) = limits.get(tech) else {
            warn!("No max cap set for {tech}");
            continue;
        };

        let max_capacity = residual + limit;
        rows.extend(years.iter().map(|&year| MaxCapacityRow {
            region: region.to_string(),
            technology: tech.clone(),
            year,
            value: max_capacity,
        }));
    }

    rows
}

/// Read the properties table from either a workbook or a CSV export of its properties sheet
pub fn read_properties(file_path: &Path) -> Result<Vec<PropertyRecord>> {
    let is_workbook = file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ["xlsx", "xlsm", "xlsb", "xls", "ods"].contains(&ext));

    if is_workbook {
        read_properties_workbook(file_path).with_context(|| input_err_msg(file_path))
    } else {
        read_csv(file_path)
    }
}

/// Get a cell as a string
fn cell_str(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

/// Get a cell as a number
fn cell_f64(cell: &Data) -> Result<f64> {
    Ok(match cell {
        Data::Float(value) => *value,
        #[allow(clippy::cast_precision_loss)]
        Data::Int(value) => *value as f64,
        Data::String(s) => s
            .trim()
            .parse()
            .with_context(|| format!("Invalid value: '{s}'"))?,
        other => bail!("Invalid value: '{other}'"),
    })
}

fn read_properties_workbook(file_path: &Path) -> Result<Vec<PropertyRecord>> {
    let mut workbook = open_workbook_auto(file_path)?;
    let range = workbook
        .worksheet_range(PROPERTIES_SHEET_NAME)
        .with_context(|| format!("Could not read sheet '{PROPERTIES_SHEET_NAME}'"))?;

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .context("Properties sheet is empty")?
        .iter()
        .map(cell_str)
        .collect();
    let column = |name: &str| {
        header
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("Missing required column '{name}'"))
    };
    let child_object = column("child_object")?;
    let property = column("property")?;
    let scenario = column("scenario")?;
    let child_class = column("child_class")?;
    let value = column("value")?;

    rows.enumerate()
        .map(|(i, row)| {
            let get = |idx: usize| row.get(idx).unwrap_or(&Data::Empty);
            Ok(PropertyRecord {
                child_object: cell_str(get(child_object)),
                property: cell_str(get(property)),
                scenario: cell_str(get(scenario)),
                child_class: cell_str(get(child_class)),
                value: cell_f64(get(value))
                    .with_context(|| format!("Bad value in row {}", i + 2))?,
            })
        })
        .collect()
}

/// Derive the maximum capacity table from the configured input files.
///
/// The properties workbook is downloaded first if there is no local copy.
///
/// # Returns
///
/// The path to the file written
pub fn write_max_capacity(config: &Config) -> Result<PathBuf> {
    let properties_path = config.properties_path();
    ensure_cached(&properties_path, config.properties_url.as_deref())?;
    let properties = read_properties(&properties_path)?;
    let limits = addition_limits(&properties);
    info!("Read {} capacity addition limits", limits.len());

    let data_dir = config.output_data_dir();
    let residual_path = data_dir.join(RESIDUAL_CAPACITY_FILE_NAME);
    let residual_table = Table::from_path(&residual_path)?;
    let residual = residual_capacities(&residual_table, BASE_YEAR)
        .with_context(|| input_err_msg(&residual_path))?;

    let years: Vec<_> = config.years().collect();
    let rows = derive_max_capacity(&limits, &residual, &years, &config.region);

    let output_path = data_dir.join(MAX_CAPACITY_FILE_NAME);
    write_csv(&output_path, rows)?;

    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{capture_logs, property_records, residual_capacity_table, was_logged};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    #[case("AF-DZA", "DZAXX")]
    #[case("NA-USA-CA", "USACA")]
    #[case("AS-IND-NO", "INDNO")]
    #[case("EU-GBR", "GBRXX")]
    fn node_code_works(#[case] node: &str, #[case] expected: &str) {
        assert_eq!(node_code(node), expected);
    }

    #[test]
    fn split_child_object_on_last_separator() {
        assert_eq!(
            split_child_object("Wind|Onshore|NA-USA-CA"),
            Some(("Wind|Onshore", "NA-USA-CA"))
        );
        assert_eq!(split_child_object("Hydro|AF-DZA"), Some(("Hydro", "AF-DZA")));
        assert_eq!(split_child_object("Hydro"), None);
    }

    #[rstest]
    fn addition_limits_works(property_records: Vec<PropertyRecord>) {
        let limits = addition_limits(&property_records);
        assert_eq!(
            limits.keys().collect_vec(),
            ["PWRHYDDZAXX01", "PWRWONUSACA01"]
        );
        assert_approx_eq!(f64, limits["PWRHYDDZAXX01"], 2.0);
        assert_approx_eq!(f64, limits["PWRWONUSACA01"], 0.5);
    }

    #[rstest]
    fn residual_capacities_works(residual_capacity_table: Table) {
        let residual = residual_capacities(&residual_capacity_table, BASE_YEAR).unwrap();
        assert_eq!(
            residual.keys().collect_vec(),
            ["PWRHYDDZAXX01", "PWRWONUSACA01", "PWRSPVGBRXX01"]
        );
        assert_approx_eq!(f64, residual["PWRHYDDZAXX01"], 1.2346);
    }

    #[test]
    fn residual_capacities_missing_column() {
        let table = Table::new([TECHNOLOGY, VALUE]);
        assert!(residual_capacities(&table, BASE_YEAR).is_err());
    }

    #[rstest]
    fn derive_max_capacity_works(
        property_records: Vec<PropertyRecord>,
        residual_capacity_table: Table,
    ) {
        let limits = addition_limits(&property_records);
        let residual = residual_capacities(&residual_capacity_table, BASE_YEAR).unwrap();
        let years = [2020, 2021, 2022];
        let rows = derive_max_capacity(&limits, &residual, &years, "GLOBAL");

        // PWRSPVGBRXX01 has no limit, so is skipped
        assert_eq!(rows.len(), 2 * years.len());
        for (row, &year) in rows[..3].iter().zip(&years) {
            assert_eq!(row.region, "GLOBAL");
            assert_eq!(row.technology, "PWRHYDDZAXX01");
            assert_eq!(row.year, year);
            assert_approx_eq!(f64, row.value, 1.2346 + 2.0);
        }
        for (row, &year) in rows[3..].iter().zip(&years) {
            assert_eq!(row.technology, "PWRWONUSACA01");
            assert_eq!(row.year, year);
            assert_approx_eq!(f64, row.value, 10.0 + 0.5);
        }
    }

    #[rstest]
    fn derive_max_capacity_warns_on_missing_limit(
        property_records: Vec<PropertyRecord>,
        residual_capacity_table: Table,
    ) {
        capture_logs();
        let limits = addition_limits(&property_records);
        let residual = residual_capacities(&residual_capacity_table, BASE_YEAR).unwrap();
        derive_max_capacity(&limits, &residual, &[2020], "GLOBAL");
        assert!(was_logged(log::Level::Warn, "No max cap set for PWRSPVGBRXX01"));
    }

    #[test]
    fn derive_max_capacity_no_years() {
        let limits = IndexMap::from([("PWRHYDDZAXX01".to_string(), 1.0)]);
        let residual = IndexMap::from([("PWRHYDDZAXX01".to_string(), 1.0)]);
        assert!(derive_max_capacity(&limits, &residual, &[], "GLOBAL").is_empty());
    }

    #[rstest]
    #[case(Data::Float(1.5), 1.5)]
    #[case(Data::Int(2), 2.0)]
    #[case(Data::String(" 3.5 ".into()), 3.5)]
    fn cell_f64_valid(#[case] cell: Data, #[case] expected: f64) {
        assert_approx_eq!(f64, cell_f64(&cell).unwrap(), expected);
    }

    #[rstest]
    #[case(Data::Empty)]
    #[case(Data::Bool(true))]
    #[case(Data::String("abc".into()))]
    fn cell_f64_invalid(#[case] cell: Data) {
        assert!(cell_f64(&cell).is_err());
    }
}
