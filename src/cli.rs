//! The command line interface for the data pipeline.
use crate::aggregate::{DEFAULT_THRESHOLD, DescribedValue, total_capacity_by_family};
use crate::capacity::write_max_capacity;
use crate::config::{CONFIG_FILE_NAME, Config};
use crate::costs::{PIVOT_YEAR, PROJECTION_YEARS, fix_cost_files};
use crate::filter::filter_data_dir;
use crate::log;
use crate::output::{create_output_directory, write_csv};
use crate::settings::Settings;
use crate::summary::headline_metrics;
use crate::table::Table;
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for the data pipeline.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Options for the `filter` command
#[derive(Args)]
pub struct FilterOpts {
    /// Whether to overwrite the scenario data directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
}

/// Options for the `fix-costs` command
#[derive(Args)]
pub struct FixCostsOpts {
    /// Directory containing the scenario directories
    #[arg(long, default_value = "results")]
    pub results_dir: PathBuf,
    /// The year whose costs are carried forward
    #[arg(long, default_value_t = PIVOT_YEAR)]
    pub pivot_year: u32,
    /// The number of years for which costs are held constant
    #[arg(long, default_value_t = PROJECTION_YEARS)]
    pub window: usize,
}

/// Options for the `aggregate-capacity` command
#[derive(Args)]
pub struct AggregateOpts {
    /// Technology families which never exceed this capacity are grouped together
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,
    /// Only include technologies for this country
    #[arg(long)]
    pub country: Option<String>,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Filter the data package to the configured geographic scope.
    Filter {
        /// Path to the configuration file.
        #[arg(short, long, default_value = CONFIG_FILE_NAME)]
        config: PathBuf,
        /// Other filter options
        #[command(flatten)]
        opts: FilterOpts,
    },
    /// Derive maximum capacity limits for renewable power plants.
    MaxCapacity {
        /// Path to the configuration file.
        #[arg(short, long, default_value = CONFIG_FILE_NAME)]
        config: PathBuf,
    },
    /// Hold capital and fixed costs at their pivot-year level.
    FixCosts {
        /// Name of the scenario.
        scenario: String,
        /// Other options
        #[command(flatten)]
        opts: FixCostsOpts,
    },
    /// Aggregate power-plant capacity by technology family.
    AggregateCapacity {
        /// Path to the capacity results file.
        input: PathBuf,
        /// Path to the output file.
        output: PathBuf,
        /// Other options
        #[command(flatten)]
        opts: AggregateOpts,
    },
    /// Summarise the results of a model run.
    Summarise {
        /// Directory containing the results tables.
        results_dir: PathBuf,
    },
    /// Manage settings file.
    Settings {
        /// The subcommands for managing the settings file.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Filter { config, opts } => handle_filter_command(&config, &opts, None),
            Self::MaxCapacity { config } => handle_max_capacity_command(&config, None),
            Self::FixCosts { scenario, opts } => handle_fix_costs_command(&scenario, &opts, None),
            Self::AggregateCapacity {
                input,
                output,
                opts,
            } => handle_aggregate_capacity_command(&input, &output, &opts, None),
            Self::Summarise { results_dir } => handle_summarise_command(&results_dir, None),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and run the requested pipeline stage
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ osemosys-prep --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    if let Some(command) = cli.command {
        command.execute()?;
    } else {
        // No command provided. Show help.
        Cli::command().print_long_help()?;
    }

    Ok(())
}

/// Load program settings, if not provided
fn load_settings(settings: Option<Settings>) -> Result<Settings> {
    if let Some(settings) = settings {
        Ok(settings)
    } else {
        Settings::load().context("Failed to load settings.")
    }
}

/// Handle the `filter` command.
pub fn handle_filter_command(
    config_path: &Path,
    opts: &FilterOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let mut settings = load_settings(settings)?;
    if opts.overwrite {
        settings.overwrite = true;
    }

    let config = Config::from_path(config_path).context("Failed to load configuration.")?;
    let output_path = config.scenario_data_dir();
    let overwrite =
        create_output_directory(&output_path, settings.overwrite).with_context(|| {
            format!(
                "Failed to create scenario data directory: {}",
                output_path.display()
            )
        })?;

    // Log files are saved alongside the scenario data
    log::init(&settings.log_level, Some(&config.scenario_dir()))
        .context("Failed to initialise logging.")?;

    info!("Starting osemosys-prep v{}", env!("CARGO_PKG_VERSION"));

    // NB: We have to wait until the logger is initialised to display this warning
    if overwrite {
        warn!("Scenario data directory will be overwritten");
    }
    if config.geographic_scope.is_empty() {
        warn!("No geographic scope given; only international rows will be kept");
    }

    filter_data_dir(&config.output_data_dir(), &output_path, &config.scope())?;

    if let Some(datapackage) = &config.datapackage {
        let file_name = datapackage
            .file_name()
            .context("Invalid datapackage path")?;
        let dest = config.scenario_dir().join(file_name);
        fs::copy(datapackage, &dest)
            .with_context(|| format!("Could not copy {}", datapackage.display()))?;
        info!("Copied {} to {}", datapackage.display(), dest.display());
    }

    info!("Filtered data saved to: {}", output_path.display());

    Ok(())
}

/// Handle the `max-capacity` command.
pub fn handle_max_capacity_command(config_path: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = load_settings(settings)?;

    // Initialise program logger (we won't save log files when running this command)
    log::init(&settings.log_level, None).context("Failed to initialise logging.")?;

    let config = Config::from_path(config_path).context("Failed to load configuration.")?;
    let output_path = write_max_capacity(&config).context("Failed to derive capacity limits.")?;
    info!("Maximum capacity limits saved to: {}", output_path.display());

    Ok(())
}

/// Handle the `fix-costs` command.
pub fn handle_fix_costs_command(
    scenario: &str,
    opts: &FixCostsOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = load_settings(settings)?;
    log::init(&settings.log_level, None).context("Failed to initialise logging.")?;

    let data_dir = opts.results_dir.join(scenario).join("data");
    fix_cost_files(&data_dir, opts.pivot_year, opts.window)
        .with_context(|| format!("Failed to fix costs for scenario {scenario}."))?;

    Ok(())
}

/// Handle the `aggregate-capacity` command.
pub fn handle_aggregate_capacity_command(
    input_path: &Path,
    output_path: &Path,
    opts: &AggregateOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = load_settings(settings)?;
    log::init(&settings.log_level, None).context("Failed to initialise logging.")?;

    let table = Table::from_path(input_path)?;
    let values = total_capacity_by_family(&table, opts.threshold, opts.country.as_deref())
        .context("Failed to aggregate capacity.")?;
    write_csv(output_path, values.iter().map(DescribedValue::from))?;
    info!(
        "Capacity for {} family-years saved to: {}",
        values.len(),
        output_path.display()
    );

    Ok(())
}

/// Handle the `summarise` command.
pub fn handle_summarise_command(results_dir: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = load_settings(settings)?;
    log::init(&settings.log_level, None).context("Failed to initialise logging.")?;

    let metrics = headline_metrics(results_dir).context("Failed to summarise results.")?;
    println!("{metrics}");

    Ok(())
}
