//! The `log` module provides initialisation and configuration of the application's logging
//! system.
//!
//! Log messages are written to the terminal, coloured by level, with `error` and `warn` messages
//! going to stderr and everything else to stdout. Optionally, log messages can also be saved to
//! files in a given directory (without colours).
//!
//! The log level can be set by the `OSEMOSYS_PREP_LOG_LEVEL` environment variable, which takes
//! precedence over the level in the program settings.
use anyhow::{Result, bail};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Record};
use std::env;
use std::fmt::{Arguments, Display};
use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::OnceLock;

/// The default log level for the program.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// The file name for the log file containing messages about the ordinary operation of the program
const LOG_INFO_FILE_NAME: &str = "osemosys_prep_info.log";

/// The file name for the log file containing debug messages
const LOG_DEBUG_FILE_NAME: &str = "osemosys_prep_debug.log";

/// Used to indicate whether the logger has been initialised
static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// Whether the program logger has been initialised
pub fn is_logger_initialised() -> bool {
    LOGGER_INIT.get().is_some()
}

/// Parse a log level from a string
fn parse_log_level(log_level_str: &str) -> Result<LevelFilter> {
    let level = match log_level_str.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        unknown => bail!("Unknown log level: {unknown}"),
    };

    Ok(level)
}

/// Initialise the program logger using the `fern` logging library.
///
/// If the logger has already been initialised, this function does nothing.
///
/// # Arguments
///
/// * `log_level_from_settings`: The log level specified in the program settings
/// * `log_file_path`: The location to save log files (if any)
pub fn init(log_level_from_settings: &str, log_file_path: Option<&Path>) -> Result<()> {
    if is_logger_initialised() {
        return Ok(());
    }

    // Environment variable takes precedence over settings file
    let log_level = env::var("OSEMOSYS_PREP_LOG_LEVEL")
        .unwrap_or_else(|_| log_level_from_settings.to_string());
    let log_level = parse_log_level(&log_level)?;

    // Set up colours for log levels
    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);

    // Automatically apply colours only if the output is a terminal
    let use_colour_stdout = std::io::stdout().is_terminal();
    let use_colour_stderr = std::io::stderr().is_terminal();

    // Format log messages for stdout and stderr, using colours if appropriate
    let stdout_dispatch = Dispatch::new()
        .filter(|metadata| metadata.level() > LevelFilter::Warn)
        .format(move |out, message, record| {
            write_log(out, &level_label(record, colours, use_colour_stdout), message, record);
        })
        .chain(std::io::stdout());

    let stderr_dispatch = Dispatch::new()
        .filter(|metadata| metadata.level() <= LevelFilter::Warn)
        .format(move |out, message, record| {
            write_log(out, &level_label(record, colours, use_colour_stderr), message, record);
        })
        .chain(std::io::stderr());

    let mut dispatch = Dispatch::new()
        .level(log_level)
        .chain(stdout_dispatch)
        .chain(stderr_dispatch);

    // Log files for the info and debug levels, plain text
    if let Some(log_file_path) = log_file_path {
        let open = |file_name: &str| {
            OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(log_file_path.join(file_name))
        };

        let info_dispatch = Dispatch::new()
            .level(log_level.min(LevelFilter::Info))
            .format(|out, message, record| write_log(out, record.level(), message, record))
            .chain(open(LOG_INFO_FILE_NAME)?);
        dispatch = dispatch.chain(info_dispatch);

        if log_level >= LevelFilter::Debug {
            let debug_dispatch = Dispatch::new()
                .filter(|metadata| metadata.level() >= LevelFilter::Debug)
                .format(|out, message, record| write_log(out, record.level(), message, record))
                .chain(open(LOG_DEBUG_FILE_NAME)?);
            dispatch = dispatch.chain(debug_dispatch);
        }
    }

    dispatch.apply()?;
    let _ = LOGGER_INIT.set(());

    Ok(())
}

/// The label for the level of a log message, coloured if requested
fn level_label(record: &Record, colours: ColoredLevelConfig, use_colour: bool) -> String {
    if use_colour {
        colours.color(record.level()).to_string()
    } else {
        record.level().to_string()
    }
}

/// Write a log message with a timestamp and the module it came from
fn write_log<T: Display>(out: FormatCallback, level: T, message: &Arguments, record: &Record) {
    let timestamp = Local::now().format("%H:%M:%S");
    out.finish(format_args!(
        "[{timestamp} {level} {}] {message}",
        record.target()
    ));
}
