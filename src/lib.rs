//! Tools for preparing and deriving the input datasets of OSeMOSYS Global energy-system models.
//!
//! Model data are tables of energy-technology facts keyed by fixed-width identifier strings (e.g.
//! `PWRHYDUSA01`) whose substrings encode the technology family, the geography and the plant
//! unit. This crate decodes those identifiers and uses them to filter data packages by geography,
//! derive capacity limits for renewable technologies, normalise cost projections and summarise
//! model results.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod aggregate;
pub mod capacity;
pub mod cli;
pub mod config;
pub mod costs;
pub mod fetch;
pub mod filter;
pub mod identifier;
pub mod input;
pub mod log;
pub mod output;
pub mod settings;
pub mod summary;
pub mod table;

#[cfg(test)]
mod fixture;

/// Get the directory in which program settings are stored
pub fn get_osemosys_prep_config_dir() -> PathBuf {
    let Some(mut dir) = dirs::config_dir() else {
        // No config dir for this platform, so fall back on the working directory
        return PathBuf::default();
    };
    dir.push("osemosys_prep");

    dir
}
