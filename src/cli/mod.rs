//! Command-line parsing for the curve matcher.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the selection/classification code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "cm",
    version,
    about = "Match reference curves to a candidate library and classify test points"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Select candidates, classify the test dataset, print a report and optionally plot/export.
    Run(RunArgs),
    /// Select candidates only and print the selection table.
    Select(SelectArgs),
    /// Plot a previously exported run JSON.
    Plot(PlotArgs),
    /// Write synthetic train/ideal/test CSVs.
    Generate(GenerateArgs),
}

/// Reference + candidate dataset locations.
#[derive(Debug, Args, Clone)]
pub struct DatasetArgs {
    /// Reference ("training") CSV with columns x, y1..y4.
    #[arg(long, env = "CM_TRAIN", default_value = "dataset/train.csv")]
    pub train: PathBuf,

    /// Candidate ("ideal") CSV with columns x, y1..y50.
    #[arg(long, env = "CM_IDEAL", default_value = "dataset/ideal.csv")]
    pub ideal: PathBuf,
}

/// Options for a full run.
#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub datasets: DatasetArgs,

    /// Test CSV with columns x, y.
    #[arg(long, env = "CM_TEST", default_value = "dataset/test.csv")]
    pub test: PathBuf,

    /// Show the first N accepted test observations.
    #[arg(long, default_value_t = 20)]
    pub top: usize,

    /// Render ASCII plots in the terminal.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export accepted test observations to CSV.
    #[arg(long)]
    pub export_results: Option<PathBuf>,

    /// Export the selection table to CSV.
    #[arg(long)]
    pub export_selection: Option<PathBuf>,

    /// Export the whole run (selection + curves + results) to JSON.
    #[arg(long)]
    pub export_run: Option<PathBuf>,

    /// Write a three-panel SVG chart.
    #[arg(long, value_name = "SVG")]
    pub svg: Option<PathBuf>,
}

/// Options for selection only.
#[derive(Debug, Args, Clone)]
pub struct SelectArgs {
    #[command(flatten)]
    pub datasets: DatasetArgs,

    /// Export the selection table to CSV.
    #[arg(long)]
    pub export_selection: Option<PathBuf>,
}

/// Options for plotting a saved run.
#[derive(Debug, Args)]
pub struct PlotArgs {
    /// Run JSON file produced by `cm run --export-run`.
    #[arg(long, value_name = "JSON")]
    pub run: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Write a three-panel SVG chart instead of printing ASCII plots.
    #[arg(long, value_name = "SVG")]
    pub svg: Option<PathBuf>,
}

/// Options for synthetic dataset generation.
#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Directory that receives train.csv, ideal.csv and test.csv.
    #[arg(long, default_value = "dataset")]
    pub out_dir: PathBuf,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Lower end of the x grid (inclusive).
    #[arg(long, default_value_t = -20.0, allow_hyphen_values = true)]
    pub x_min: f64,

    /// Upper end of the x grid (exclusive).
    #[arg(long, default_value_t = 20.0, allow_hyphen_values = true)]
    pub x_max: f64,

    /// Grid spacing.
    #[arg(long, default_value_t = 0.1)]
    pub step: f64,

    /// Number of test observations.
    #[arg(long, default_value_t = 100)]
    pub test_rows: usize,

    /// Standard deviation of the Gaussian noise.
    #[arg(long, default_value_t = 0.25)]
    pub noise: f64,

    /// Share of test rows drawn as uniform outliers.
    #[arg(long, default_value_t = 0.1)]
    pub outliers: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_flags_parse() {
        let cli = Cli::parse_from([
            "cm",
            "run",
            "--train",
            "a.csv",
            "--test",
            "c.csv",
            "--plot",
            "--export-run",
            "run.json",
        ]);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.datasets.train, PathBuf::from("a.csv"));
        assert_eq!(args.test, PathBuf::from("c.csv"));
        assert!(args.plot);
        assert_eq!(args.export_run, Some(PathBuf::from("run.json")));
    }

    #[test]
    fn generate_accepts_negative_range() {
        let cli = Cli::parse_from(["cm", "generate", "--x-min", "-5", "--x-max", "5"]);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.x_min, -5.0);
        assert_eq!(args.x_max, 5.0);
    }
}
