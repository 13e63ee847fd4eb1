//! Normalisation of cost projections.
//!
//! Capital and fixed costs for power plants are held at their pivot-year level for a fixed
//! number of years, rather than following the declining cost projections in the source data.
use crate::table::{Table, VALUE, YEAR, parse_field};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::info;
use std::path::Path;

/// The number of years for which costs are held constant, including the pivot year
pub const PROJECTION_YEARS: usize = 26;

/// The year whose costs are carried forward
pub const PIVOT_YEAR: u32 = 2025;

/// The cost tables which are normalised
pub const COST_FILE_NAMES: [&str; 2] = ["FixedCost.csv", "CapitalCost.csv"];

/// Group the rows of a table by every column other than `YEAR` and `VALUE`.
///
/// Each group is a list of row indices, in the order the rows appear in the table.
fn group_rows(table: &Table, year_idx: usize, value_idx: usize) -> Vec<Vec<usize>> {
    let mut groups: IndexMap<Vec<&str>, Vec<usize>> = IndexMap::new();
    for (i, row) in table.rows().iter().enumerate() {
        let key = row
            .iter()
            .enumerate()
            .filter(|(col, _)| *col != year_idx && *col != value_idx)
            .map(|(_, field)| field.as_str())
            .collect();
        groups.entry(key).or_default().push(i);
    }

    groups.into_values().collect()
}

/// Carry the value for `pivot_year` forward.
///
/// Rows are grouped by every column other than `YEAR` and `VALUE` (i.e. by region, technology
/// etc.). Within each group, the value of the row for `pivot_year` overwrites the values of the
/// following `window - 1` rows of the same group, stopping at the end of the group. Rows are
/// assumed to be sorted by year within each group.
pub fn flatten_from(table: &mut Table, pivot_year: u32, window: usize) -> Result<()> {
    let year_idx = table.require_column(YEAR)?;
    let value_idx = table.require_column(VALUE)?;

    let years = table
        .rows()
        .iter()
        .map(|row| parse_field::<u32>(row, year_idx, YEAR))
        .collect::<Result<Vec<_>>>()?;

    for group in group_rows(table, year_idx, value_idx) {
        for (pos, &row) in group.iter().enumerate() {
            if years[row] != pivot_year {
                continue;
            }

            let value = table.rows()[row][value_idx].clone();
            let end = (pos + window).min(group.len());
            for &later in &group[pos + 1..end] {
                table.field_mut(later, value_idx).clone_from(&value);
            }
        }
    }

    Ok(())
}

/// Normalise the cost tables of a scenario in place.
///
/// # Arguments
///
/// * `data_dir` - The scenario's data directory
/// * `pivot_year` - The year whose costs are carried forward
/// * `window` - The number of years for which costs are held constant
pub fn fix_cost_files(data_dir: &Path, pivot_year: u32, window: usize) -> Result<()> {
    for file_name in COST_FILE_NAMES {
        let file_path = data_dir.join(file_name);
        let mut table = Table::from_path(&file_path)?;
        flatten_from(&mut table, pivot_year, window)
            .with_context(|| format!("Could not normalise {}", file_path.display()))?;
        table.write(&file_path)?;
        info!("Costs in {file_name} held at {pivot_year} level");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use std::fs;
    use tempfile::tempdir;

    fn cost_table(rows: &[(&str, u32, &str)]) -> Table {
        let mut table = Table::new(["REGION", "TECHNOLOGY", YEAR, VALUE]);
        for (tech, year, value) in rows {
            table.push_row(vec![
                "GLOBAL".into(),
                (*tech).into(),
                year.to_string(),
                (*value).into(),
            ]);
        }
        table
    }

    fn values(table: &Table) -> Vec<&str> {
        table.rows().iter().map(|row| row[3].as_str()).collect()
    }

    #[test]
    fn flatten_from_short_window() {
        let mut table = cost_table(&[
            ("TECH_A", 2024, "10"),
            ("TECH_A", 2025, "15"),
            ("TECH_A", 2026, "99"),
            ("TECH_A", 2027, "99"),
        ]);
        flatten_from(&mut table, 2025, 3).unwrap();
        assert_eq!(values(&table), ["10", "15", "15", "15"]);
    }

    #[test]
    fn flatten_from_thirty_year_block() {
        let rows: Vec<_> = (2020..2050)
            .map(|year| ("TECH_A", year, if year == 2025 { "7.5" } else { "1" }))
            .collect();
        let mut table = cost_table(&rows);
        flatten_from(&mut table, PIVOT_YEAR, PROJECTION_YEARS).unwrap();

        let values = values(&table);
        assert_eq!(values.len(), 30);
        assert!(values[..5].iter().all(|v| *v == "1"));
        assert!(values[5..].iter().all(|v| *v == "7.5"));
    }

    #[test]
    fn flatten_from_stops_at_end_of_group() {
        let mut table = cost_table(&[
            ("TECH_A", 2025, "15"),
            ("TECH_A", 2026, "99"),
            ("TECH_B", 2024, "1"),
            ("TECH_B", 2025, "2"),
            ("TECH_B", 2026, "3"),
        ]);
        flatten_from(&mut table, 2025, PROJECTION_YEARS).unwrap();
        assert_eq!(values(&table), ["15", "15", "1", "2", "2"]);
    }

    #[test]
    fn flatten_from_interleaved_technologies() {
        let mut table = cost_table(&[
            ("TECH_A", 2025, "15"),
            ("TECH_B", 2025, "2"),
            ("TECH_A", 2026, "99"),
            ("TECH_B", 2026, "3"),
        ]);
        flatten_from(&mut table, 2025, PROJECTION_YEARS).unwrap();
        assert_eq!(values(&table), ["15", "2", "15", "2"]);
    }

    #[test]
    fn flatten_from_no_pivot_year() {
        let mut table = cost_table(&[("TECH_A", 2030, "1"), ("TECH_A", 2031, "2")]);
        flatten_from(&mut table, 2025, PROJECTION_YEARS).unwrap();
        assert_eq!(values(&table), ["1", "2"]);
    }

    #[test]
    fn flatten_from_bad_year() {
        let mut table = Table::new([YEAR, VALUE]);
        table.push_row(vec!["soon".into(), "1".into()]);
        assert_error!(
            flatten_from(&mut table, 2025, PROJECTION_YEARS),
            "Invalid YEAR value: 'soon'"
        );
    }

    #[test]
    fn fix_cost_files_works() {
        let dir = tempdir().unwrap();
        for file_name in COST_FILE_NAMES {
            fs::write(
                dir.path().join(file_name),
                "REGION,TECHNOLOGY,YEAR,VALUE\nGLOBAL,PWRSPVUSA01,2025,5\nGLOBAL,PWRSPVUSA01,2026,4\n",
            )
            .unwrap();
        }

        fix_cost_files(dir.path(), PIVOT_YEAR, PROJECTION_YEARS).unwrap();
        for file_name in COST_FILE_NAMES {
            assert_eq!(
                fs::read_to_string(dir.path().join(file_name)).unwrap(),
                "REGION,TECHNOLOGY,YEAR,VALUE\nGLOBAL,PWRSPVUSA01,2025,5\nGLOBAL,PWRSPVUSA01,2026,5\n"
            );
        }
    }

    #[test]
    fn fix_cost_files_missing_file() {
        let dir = tempdir().unwrap();
        assert!(fix_cost_files(dir.path(), PIVOT_YEAR, PROJECTION_YEARS).is_err());
    }
}
