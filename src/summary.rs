//! Headline metrics summarising the results of a model run.
use crate::identifier::{Identifier, POWER_CLASS, class_of};
use crate::table::{TECHNOLOGY, Table, VALUE, parse_field};
use anyhow::{Context, Result, ensure};
use std::fmt;
use std::path::Path;

const EMISSIONS_FILE_NAME: &str = "AnnualEmissions.csv";
const PRODUCTION_FILE_NAME: &str = "ProductionByTechnologyAnnual.csv";
const SYSTEM_COST_FILE_NAME: &str = "TotalDiscountedCost.csv";

/// Headline metrics for a model run
#[derive(Clone, Debug, PartialEq)]
pub struct HeadlineMetrics {
    /// Total emissions over the model horizon
    pub emissions: f64,
    /// Percentage of power generation from renewable sources
    pub renewable_share: f64,
    /// Total discounted system cost
    pub system_cost: f64,
}

impl fmt::Display for HeadlineMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Emissions: {:.0}", self.emissions)?;
        writeln!(f, "RE Share: {:.0}%", self.renewable_share)?;
        write!(f, "Total System Cost: {:.0}", self.system_cost)
    }
}

/// Sum the `VALUE` column over rows where `predicate` holds for the technology
fn sum_technology_values<F>(table: &Table, mut predicate: F) -> Result<f64>
where
    F: FnMut(&str) -> bool,
{
    let tech_idx = table.require_column(TECHNOLOGY)?;
    let value_idx = table.require_column(VALUE)?;

    let mut total = 0.0;
    for row in table.rows() {
        if predicate(&row[tech_idx]) {
            total += parse_field::<f64>(row, value_idx, VALUE)?;
        }
    }

    Ok(total)
}

/// Sum the `VALUE` column of a table
fn sum_values(table: &Table) -> Result<f64> {
    let value_idx = table.require_column(VALUE)?;
    table
        .rows()
        .iter()
        .map(|row| parse_field::<f64>(row, value_idx, VALUE))
        .sum()
}

/// Whether a technology is a renewable power plant
pub fn is_renewable_power_plant(technology: &str) -> bool {
    Identifier::parse(technology).is_ok_and(|id| id.is_power_plant() && id.family.is_renewable())
}

/// Calculate the share of power generation from renewable sources, as a percentage
pub fn renewable_share(production: &Table) -> Result<f64> {
    let total = sum_technology_values(production, |tech| class_of(tech) == POWER_CLASS)?;
    ensure!(total > 0.0, "No power generation found");
    let renewable = sum_technology_values(production, is_renewable_power_plant)?;

    Ok(renewable / total * 100.0)
}

/// Calculate headline metrics from a directory of results tables
pub fn headline_metrics(results_dir: &Path) -> Result<HeadlineMetrics> {
    let read = |file_name: &str| Table::from_path(&results_dir.join(file_name));

    let emissions = sum_values(&read(EMISSIONS_FILE_NAME)?).context("Invalid emissions data")?;
    let renewable_share =
        renewable_share(&read(PRODUCTION_FILE_NAME)?).context("Invalid production data")?;
    let system_cost =
        sum_values(&read(SYSTEM_COST_FILE_NAME)?).context("Invalid system cost data")?;

    Ok(HeadlineMetrics {
        emissions: emissions.round(),
        renewable_share: renewable_share.round(),
        system_cost,
    })
}
