//! Read and validate the pipeline configuration from `config.toml`.
//!
//! The configuration is loaded once at startup and passed to each stage of the pipeline.
use crate::filter::{GeographyScope, check_geography_code};
use crate::input::{input_err_msg, read_toml};
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

/// The default name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.toml";

const DATA_DIR_NAME: &str = "data";

fn default_properties_file() -> String {
    "PLEXOS_World_MESSAGEix_GLOBIOM_Softlink.xlsx".into()
}

/// Pipeline configuration
#[derive(Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Geography codes to keep when filtering. May be empty, in which case nothing is filtered.
    #[serde(default)]
    pub geographic_scope: Vec<String>,
    /// Name of the scenario, used to name the filtered data directory
    pub scenario: String,
    /// Directory containing external input data
    pub input_dir: PathBuf,
    /// Directory containing the unfiltered data package and scenario outputs
    pub output_dir: PathBuf,
    /// The model region
    pub region: String,
    /// First year of the model horizon
    pub start_year: u32,
    /// Last year of the model horizon
    pub end_year: u32,
    /// Name of the properties workbook within `<input_dir>/data`
    #[serde(default = "default_properties_file")]
    pub properties_file: String,
    /// Where to download the properties workbook from, if there is no local copy
    #[serde(default)]
    pub properties_url: Option<String>,
    /// A `datapackage.json` to copy alongside the filtered data
    #[serde(default)]
    pub datapackage: Option<PathBuf>,
}

impl Config {
    /// Read the configuration from a TOML file.
    ///
    /// # Arguments
    ///
    /// * `file_path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// The validated configuration or an error.
    pub fn from_path(file_path: &Path) -> Result<Config> {
        let config: Config = read_toml(file_path)?;
        config.validate().with_context(|| input_err_msg(file_path))?;

        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        ensure!(
            self.end_year >= self.start_year,
            "end_year ({}) must not be before start_year ({})",
            self.end_year,
            self.start_year
        );
        ensure!(!self.scenario.trim().is_empty(), "scenario cannot be empty");
        ensure!(!self.region.trim().is_empty(), "region cannot be empty");
        for code in &self.geographic_scope {
            check_geography_code(code)?;
        }

        Ok(())
    }

    /// The years of the model horizon
    pub fn years(&self) -> RangeInclusive<u32> {
        self.start_year..=self.end_year
    }

    /// The geographic scope, including international links
    pub fn scope(&self) -> GeographyScope {
        GeographyScope::new(self.geographic_scope.iter().cloned())
    }

    /// The directory containing the unfiltered data package
    pub fn output_data_dir(&self) -> PathBuf {
        self.output_dir.join(DATA_DIR_NAME)
    }

    /// The scenario directory
    pub fn scenario_dir(&self) -> PathBuf {
        self.output_dir.join(&self.scenario)
    }

    /// The directory into which filtered data are written
    pub fn scenario_data_dir(&self) -> PathBuf {
        self.scenario_dir().join(DATA_DIR_NAME)
    }

    /// The local path of the properties workbook
    pub fn properties_path(&self) -> PathBuf {
        self.input_dir.join(DATA_DIR_NAME).join(&self.properties_file)
    }
}
