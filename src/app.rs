//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments
//! - runs selection + classification
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use log::info;

use crate::cli::{Command, GenerateArgs, PlotArgs, RunArgs, SelectArgs};
use crate::domain::{CurveSet, GenerateConfig, RunConfig, TestObservation};
use crate::error::AppError;
use crate::io::ingest::Ingested;

pub mod pipeline;

/// Entry point for the `cm` binary.
pub fn run() -> Result<(), AppError> {
    // A missing `.env` is fine; CM_* defaults then come from the real environment.
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // `cm` and `cm --test t.csv` behave like `cm run ...`; clap needs the
    // subcommand name, so argv is rewritten before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Run(args) => handle_run(&args),
        Command::Select(args) => handle_select(&args),
        Command::Plot(args) => handle_plot(&args),
        Command::Generate(args) => handle_generate(&args),
    }
}

fn handle_run(args: &RunArgs) -> Result<(), AppError> {
    let config = run_config_from_args(args);
    let run = pipeline::run_pipeline(&config)?;

    println!("{}", format_datasets(&run.references, &run.candidates, Some(&run.tests)));
    println!("{}", crate::report::format_selection(&run.selection));
    println!("{}", crate::report::format_match_summary(&run.summary));
    println!("{}", crate::report::format_results(&run.results, config.top_n));

    let needs_run_file = config.plot || config.export_run.is_some() || config.svg.is_some();
    let run_file = if needs_run_file {
        Some(crate::io::build_run_file(
            &run.selection,
            &run.references.data,
            &run.candidates.data,
            &run.results,
        )?)
    } else {
        None
    };

    if let Some(run_file) = &run_file {
        if config.plot {
            println!(
                "{}",
                crate::plot::render_run_plot(run_file, config.plot_width, config.plot_height)
            );
        }
        if let Some(path) = &config.export_run {
            crate::io::write_run_json(path, run_file)?;
            info!("Wrote run file '{}'", path.display());
        }
        if let Some(path) = &config.svg {
            crate::plot::write_run_svg(path, run_file, SVG_WIDTH, SVG_HEIGHT)?;
            info!("Wrote SVG chart '{}'", path.display());
        }
    }

    // Optional exports.
    if let Some(path) = &config.export_results {
        crate::io::write_results_csv(path, &run.results)?;
        info!("Wrote {} result row(s) to '{}'", run.results.len(), path.display());
    }
    if let Some(path) = &config.export_selection {
        crate::io::write_selection_csv(path, &run.selection)?;
        info!("Wrote selection table to '{}'", path.display());
    }

    Ok(())
}

fn handle_select(args: &SelectArgs) -> Result<(), AppError> {
    let out = pipeline::run_selection(&args.datasets.train, &args.datasets.ideal)?;

    println!("{}", format_datasets(&out.references, &out.candidates, None));
    println!("{}", crate::report::format_selection(&out.selection));

    if let Some(path) = &args.export_selection {
        crate::io::write_selection_csv(path, &out.selection)?;
        info!("Wrote selection table to '{}'", path.display());
    }
    Ok(())
}

fn handle_plot(args: &PlotArgs) -> Result<(), AppError> {
    let run = crate::io::read_run_json(&args.run)?;

    match &args.svg {
        Some(path) => {
            crate::plot::write_run_svg(path, &run, SVG_WIDTH, SVG_HEIGHT)?;
            info!("Wrote SVG chart '{}'", path.display());
        }
        None => println!("{}", crate::plot::render_run_plot(&run, args.width, args.height)),
    }
    Ok(())
}

fn handle_generate(args: &GenerateArgs) -> Result<(), AppError> {
    let config = generate_config_from_args(args);
    let (data, files) = crate::data::write_datasets(&config)?;

    let chosen: Vec<String> = data.chosen.iter().map(ToString::to_string).collect();
    println!("Reference curves built from: {}", chosen.join(", "));
    println!("  {}", files.train.display());
    println!("  {}", files.ideal.display());
    println!("  {}", files.test.display());
    Ok(())
}

/// SVG size in pixels; three stacked panels.
const SVG_WIDTH: u32 = 900;
const SVG_HEIGHT: u32 = 1200;

fn format_datasets(
    references: &Ingested<CurveSet>,
    candidates: &Ingested<CurveSet>,
    tests: Option<&Ingested<Vec<TestObservation>>>,
) -> String {
    let mut lines = vec![
        crate::report::format_dataset_line("reference", references),
        crate::report::format_dataset_line("candidate", candidates),
    ];
    if let Some(tests) = tests {
        lines.push(crate::report::format_dataset_line("test", tests));
    }
    lines.join("\n")
}

pub fn run_config_from_args(args: &RunArgs) -> RunConfig {
    RunConfig {
        train_csv: args.datasets.train.clone(),
        ideal_csv: args.datasets.ideal.clone(),
        test_csv: args.test.clone(),
        top_n: args.top,
        plot: args.plot,
        plot_width: args.width,
        plot_height: args.height,
        export_results: args.export_results.clone(),
        export_selection: args.export_selection.clone(),
        export_run: args.export_run.clone(),
        svg: args.svg.clone(),
    }
}

pub fn generate_config_from_args(args: &GenerateArgs) -> GenerateConfig {
    GenerateConfig {
        out_dir: args.out_dir.clone(),
        seed: args.seed,
        x_min: args.x_min,
        x_max: args.x_max,
        step: args.step,
        test_rows: args.test_rows,
        noise: args.noise,
        outlier_fraction: args.outliers,
    }
}

/// Rewrite argv so `cm` defaults to `cm run`.
///
/// Rules:
/// - `cm`                      -> `cm run`
/// - `cm --test t.csv ...`     -> `cm run --test t.csv ...`
/// - `cm --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("run".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "run".to_string());
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_runs() {
        assert_eq!(rewrite_args(argv(&["cm"])), argv(&["cm", "run"]));
    }

    #[test]
    fn leading_flag_runs() {
        assert_eq!(
            rewrite_args(argv(&["cm", "--test", "t.csv"])),
            argv(&["cm", "run", "--test", "t.csv"])
        );
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        for args in [
            argv(&["cm", "select"]),
            argv(&["cm", "generate", "--seed", "1"]),
            argv(&["cm", "--help"]),
            argv(&["cm", "-V"]),
        ] {
            assert_eq!(rewrite_args(args.clone()), args);
        }
    }

    #[test]
    fn rewritten_args_parse_into_run_config() {
        let cli = crate::cli::Cli::parse_from(rewrite_args(argv(&[
            "cm",
            "--train",
            "t.csv",
            "--top",
            "5",
            "--svg",
            "out.svg",
        ])));
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        let config = run_config_from_args(&args);
        assert_eq!(config.train_csv, std::path::PathBuf::from("t.csv"));
        assert_eq!(config.top_n, 5);
        assert_eq!(config.svg, Some(std::path::PathBuf::from("out.svg")));
        assert!(!config.plot);
    }
}
