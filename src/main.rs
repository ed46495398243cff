//! yaml-sort CLI.
//!
//! Rewrites YAML files with sorted mapping keys, or checks that they
//! already are. Reads stdin and writes stdout when no files are given.

use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;
use yaml_sort::{Driver, Options, Schema, SortResult, WriteMode};

/// A file failed to load, sort or write.
const EXIT_FAILED: u8 = 1;
/// Bad configuration, such as an unknown schema.
const EXIT_CONFIG: u8 = 2;

#[derive(Parser)]
#[command(name = "yaml-sort")]
#[command(about = "Sort YAML mapping keys into canonical order", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite files with sorted keys (stdin to stdout when no files)
    Sort {
        /// Files to rewrite in place
        files: Vec<PathBuf>,

        /// Print canonical output instead of rewriting files
        #[arg(long)]
        stdout: bool,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Fail if any file's keys are not in canonical order
    Check {
        /// Files to check (stdin when none)
        files: Vec<PathBuf>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// List schema names
    Schemas,
}

#[derive(Args)]
struct CommonArgs {
    /// Schema name, e.g. core_schema (case-insensitive)
    #[arg(long)]
    schema: Option<String>,

    /// Allow !!js/* types (default_full_schema)
    #[arg(long = "unsafe")]
    allow_unsafe: bool,

    /// Fold strings longer than this (0 = never)
    #[arg(long, default_value_t = 0)]
    line_width: usize,

    /// Name used in messages instead of the file path
    #[arg(long)]
    filename: Option<String>,
}

impl CommonArgs {
    fn to_options(&self, check: bool) -> SortResult<Options> {
        let mut options = Options::default()
            .with_safe(!self.allow_unsafe)
            .with_line_width(self.line_width)
            .with_check_ordered(check);
        if let Some(name) = &self.schema {
            options = options.with_schema_name(name)?;
        }
        if let Some(filename) = &self.filename {
            options = options.with_filename(filename.clone());
        }
        Ok(options)
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Sort {
            files,
            stdout,
            common,
        } => {
            let mode = if stdout {
                WriteMode::Stdout
            } else {
                WriteMode::InPlace
            };
            run(&files, &common, false, mode)
        }
        Commands::Check { files, common } => run(&files, &common, true, WriteMode::Stdout),
        Commands::Schemas => {
            for schema in Schema::ALL {
                println!("{}", schema.name());
            }
            ExitCode::SUCCESS
        }
    }
}

fn run(files: &[PathBuf], common: &CommonArgs, check: bool, mode: WriteMode) -> ExitCode {
    let options = match common.to_options(check) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("yaml-sort: {}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };
    let driver = Driver::new(options).with_mode(mode);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if files.is_empty() {
        let result = driver.process_reader(io::stdin().lock(), &mut out);
        let _ = out.flush();
        return match result {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("yaml-sort: {}", e);
                ExitCode::from(EXIT_FAILED)
            }
        };
    }

    let report = driver.process_all(files, &mut out);
    let _ = out.flush();
    for (_, e) in report.failures() {
        eprintln!("yaml-sort: {}", e);
    }
    info!("{}", report.summary());

    if report.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_FAILED)
    }
}
