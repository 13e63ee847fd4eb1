//! Aggregation of capacity results for presentation.
//!
//! Results are summed by technology family and year. Families which never exceed a threshold are
//! folded into the catch-all category, so that the set of series shown to the user stays small
//! and stable across years.
use crate::identifier::{POWER_CLASS, SliceSpec, class_of, decode, describe_family};
use crate::table::{TECHNOLOGY, Table, VALUE, YEAR, parse_field};
use anyhow::Result;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// The catch-all category into which small categories are folded
pub const CATCH_ALL_LABEL: &str = "OTH";

/// Default threshold (in GW) above which a category gets its own series
pub const DEFAULT_THRESHOLD: f64 = 25.0;

/// Marker for transmission technologies, which are not power plants
const TRANSMISSION_MARKER: &str = "TRN";

/// A value for a category in a given year
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LabelledValue {
    /// The category (e.g. a technology family code)
    #[serde(rename = "LABEL")]
    pub label: String,
    /// The year
    #[serde(rename = "YEAR")]
    pub year: u32,
    /// The value
    #[serde(rename = "VALUE")]
    pub value: f64,
}

impl LabelledValue {
    /// Create a new [`LabelledValue`]
    pub fn new(label: &str, year: u32, value: f64) -> Self {
        Self {
            label: label.to_string(),
            year,
            value,
        }
    }
}

/// A row of the aggregated capacity output file
#[derive(Debug, PartialEq, Serialize)]
pub struct DescribedValue<'a> {
    #[serde(rename = "LABEL")]
    label: &'a str,
    #[serde(rename = "DESCRIPTION")]
    description: &'a str,
    #[serde(rename = "YEAR")]
    year: u32,
    #[serde(rename = "VALUE")]
    value: f64,
}

impl<'a> From<&'a LabelledValue> for DescribedValue<'a> {
    fn from(value: &'a LabelledValue) -> Self {
        Self {
            label: &value.label,
            description: describe_family(&value.label),
            year: value.year,
            value: value.value,
        }
    }
}

/// Select power-plant rows of a results table, labelled by technology family.
///
/// Transmission technologies are excluded.
///
/// # Arguments
///
/// * `table` - A results table with `TECHNOLOGY`, `YEAR` and `VALUE` columns
/// * `country` - If given, only keep technologies for this geography
pub fn powerplant_filter(table: &Table, country: Option<&str>) -> Result<Vec<LabelledValue>> {
    let tech_idx = table.require_column(TECHNOLOGY)?;
    let year_idx = table.require_column(YEAR)?;
    let value_idx = table.require_column(VALUE)?;
    let spec = SliceSpec::ordinary();

    let mut values = Vec::new();
    for row in table.rows() {
        let tech = &row[tech_idx];
        if tech.contains(TRANSMISSION_MARKER) || class_of(tech) != POWER_CLASS {
            continue;
        }

        let decoded = decode(tech, &spec);
        if country.is_some_and(|country| decoded.geography_primary != country) {
            continue;
        }

        values.push(LabelledValue::new(
            decoded.family,
            parse_field(row, year_idx, YEAR)?,
            parse_field(row, value_idx, VALUE)?,
        ));
    }

    Ok(values)
}

/// Sum values by label and year.
///
/// The output is sorted by label, then year.
pub fn sum_by_label_year(values: &[LabelledValue]) -> Vec<LabelledValue> {
    let mut sums: BTreeMap<(&str, u32), f64> = BTreeMap::new();
    for value in values {
        *sums.entry((value.label.as_str(), value.year)).or_default() += value.value;
    }

    sums.into_iter()
        .map(|((label, year), value)| LabelledValue::new(label, year, value))
        .collect()
}

/// Fold categories which never exceed `threshold` into the catch-all category.
///
/// A category which exceeds the threshold in at least one year is kept for every year. All other
/// categories are removed and their values added to the catch-all category for the same year,
/// creating a catch-all row for that year if there isn't one already. The catch-all category is
/// always kept, so the total for each year is unchanged.
///
/// Only the values of categories which are not kept are folded, rather than every value below the
/// threshold. Folding every small value would move the small years of kept categories into the
/// catch-all and leave gaps in their series.
///
/// There should be at most one value for each label and year (see [`sum_by_label_year`]).
pub fn aggregate(values: &[LabelledValue], threshold: f64) -> Vec<LabelledValue> {
    let mut retained: HashSet<&str> = values
        .iter()
        .filter(|value| value.value > threshold)
        .map(|value| value.label.as_str())
        .collect();
    retained.insert(CATCH_ALL_LABEL);

    let mut folded: BTreeMap<u32, f64> = BTreeMap::new();
    let mut out = Vec::new();
    for value in values {
        if retained.contains(value.label.as_str()) {
            out.push(value.clone());
        } else {
            *folded.entry(value.year).or_default() += value.value;
        }
    }

    for (year, sum) in folded {
        if let Some(catch_all) = out
            .iter_mut()
            .find(|value| value.label == CATCH_ALL_LABEL && value.year == year)
        {
            catch_all.value += sum;
        } else {
            out.push(LabelledValue::new(CATCH_ALL_LABEL, year, sum));
        }
    }

    out
}

/// Get total capacity by technology family and year, ready for presentation.
///
/// # Arguments
///
/// * `table` - The `TotalCapacityAnnual` results table
/// * `threshold` - Families which never exceed this value are folded into the catch-all category
/// * `country` - If given, only include technologies for this geography
pub fn total_capacity_by_family(
    table: &Table,
    threshold: f64,
    country: Option<&str>,
) -> Result<Vec<LabelledValue>> {
    let values = powerplant_filter(table, country)?;
    Ok(aggregate(&sum_by_label_year(&values), threshold))
}
