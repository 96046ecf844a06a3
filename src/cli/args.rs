use crate::constants::{exit_codes, verbosity};
use clap::{error::ErrorKind, CommandFactory, Parser};
use log::LevelFilter;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#;

/// CLI arguments for microtemplate.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Template file, or `-` to read it from stdin.
    #[arg(value_name = "TEMPLATE")]
    pub template: String,

    /// Data as a JSON string, or `-` to read it from stdin.
    #[arg(short, long, conflicts_with = "data_file")]
    pub data: Option<String>,

    /// Read data from a JSON or YAML file.
    #[arg(long = "data-file", value_name = "FILE")]
    pub data_file: Option<PathBuf>,

    /// Delimiter settings file (JSON or YAML).
    #[arg(short, long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Expose the data under this name instead of binding its properties.
    #[arg(long)]
    pub variable: Option<String>,

    /// Print the compiled function source instead of rendering.
    #[arg(long)]
    pub source: bool,

    /// Write the result to FILE instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Increase logging verbosity (`-v`, `-vv`, `-vvv`).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Parse command line arguments with custom handling for missing required inputs.
pub fn get_args() -> Args {
    Args::try_parse().unwrap_or_else(|e| {
        if e.kind() == ErrorKind::MissingRequiredArgument {
            let mut command = Args::command().help_template(HELP_TEMPLATE);
            if let Err(print_err) = command.print_help() {
                eprintln!("Failed to display help information: {print_err}");
            } else {
                println!();
            }
            std::process::exit(exit_codes::FAILURE);
        } else {
            e.exit();
        }
    })
}

/// Map `-v` counts to the appropriate log level.
pub fn get_log_level_from_verbose(verbose_count: u8) -> LevelFilter {
    match verbose_count {
        verbosity::OFF => LevelFilter::Error,
        verbosity::INFO => LevelFilter::Info,
        verbosity::DEBUG => LevelFilter::Debug,
        verbosity::TRACE.. => LevelFilter::Trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_verbose_flags_to_log_filters() {
        assert_eq!(get_log_level_from_verbose(verbosity::OFF), LevelFilter::Error);
        assert_eq!(get_log_level_from_verbose(verbosity::INFO), LevelFilter::Info);
        assert_eq!(get_log_level_from_verbose(verbosity::DEBUG), LevelFilter::Debug);
        assert_eq!(get_log_level_from_verbose(verbosity::TRACE), LevelFilter::Trace);
        assert_eq!(get_log_level_from_verbose(verbosity::TRACE + 1), LevelFilter::Trace);
    }

    #[test]
    fn parses_minimal_args() {
        let args = Args::parse_from(["microtemplate", "page.html"]);
        assert_eq!(args.template, "page.html");
        assert!(args.data.is_none());
        assert!(!args.source);
    }

    #[test]
    fn parses_full_feature_flags() {
        let args = Args::parse_from([
            "microtemplate",
            "-",
            "--data",
            "{\"name\":\"Moe\"}",
            "--settings",
            "settings.yaml",
            "--variable",
            "data",
            "--source",
            "-o",
            "out.js",
            "-vv",
        ]);
        assert_eq!(args.template, "-");
        assert_eq!(args.data.as_deref(), Some("{\"name\":\"Moe\"}"));
        assert_eq!(args.settings, Some(PathBuf::from("settings.yaml")));
        assert_eq!(args.variable.as_deref(), Some("data"));
        assert!(args.source);
        assert_eq!(args.output, Some(PathBuf::from("out.js")));
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn data_and_data_file_conflict() {
        let result = Args::try_parse_from([
            "microtemplate",
            "page.html",
            "--data",
            "{}",
            "--data-file",
            "data.json",
        ]);
        assert!(result.is_err());
    }
}
