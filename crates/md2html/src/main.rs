//! md2html CLI - creates HTML documentation out of Markdown texts.
//!
//! Processes a single document described on the command line, or every
//! document of an argument file:
//!
//! ```text
//! md2html -i intro.md -t "Introduction"
//! md2html --argument-file md2html_args.json --force
//! ```

mod error;
mod output;

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use md2html_build::{Runner, Services};
use md2html_cache::FileContentCache;
use md2html_config::{CliSettings, RunConfig};
use md2html_render::CommonMarkConverter;
use tracing_subscriber::EnvFilter;

use error::CliError;
use output::Output;

/// Creates HTML documentation out of Markdown texts.
#[derive(Parser)]
#[command(name = "md2html", version, about)]
struct Cli {
    /// Argument file describing the documents to process and the plugins.
    #[arg(long, env = "MD2HTML_ARGUMENT_FILE")]
    argument_file: Option<PathBuf>,

    /// Root directory for input files.
    #[arg(long)]
    input_root: Option<PathBuf>,

    /// Input file, absolute or relative to the input root.
    #[arg(short, long, conflicts_with = "input_glob")]
    input: Option<PathBuf>,

    /// Input file pattern, absolute or relative to the input root.
    #[arg(long)]
    input_glob: Option<String>,

    /// Sort documents matched by the input pattern by file path.
    #[arg(long)]
    sort_by_file_path: bool,

    /// Root directory for output files.
    #[arg(long)]
    output_root: Option<PathBuf>,

    /// Output file; defaults to the input file with the `.html` extension.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Page title.
    #[arg(short, long)]
    title: Option<String>,

    /// Page template.
    #[arg(long)]
    template: Option<PathBuf>,

    /// Link a CSS file (repeatable).
    #[arg(long)]
    link_css: Vec<String>,

    /// Include the content of a CSS file (repeatable).
    #[arg(long)]
    include_css: Vec<PathBuf>,

    /// Generate pages without CSS.
    #[arg(long, conflicts_with_all = ["link_css", "include_css"])]
    no_css: bool,

    /// Regenerate outputs even when they are newer than their inputs.
    #[arg(short, long)]
    force: bool,

    /// Print progress messages.
    #[arg(short, long)]
    verbose: bool,

    /// Print the path of every generated file.
    #[arg(short, long)]
    report: bool,
}

impl Cli {
    fn settings(&self) -> CliSettings {
        CliSettings {
            input: self.input.clone(),
            input_glob: self.input_glob.clone(),
            input_root: self.input_root.clone(),
            output: self.output.clone(),
            output_root: self.output_root.clone(),
            title: self.title.clone(),
            template: self.template.clone(),
            link_css: (!self.link_css.is_empty()).then(|| self.link_css.clone()),
            include_css: (!self.include_css.is_empty()).then(|| self.include_css.clone()),
            no_css: self.no_css.then_some(true),
            force: self.force.then_some(true),
            verbose: self.verbose.then_some(true),
            report: self.report.then_some(true),
            sort_by_file_path: self.sort_by_file_path.then_some(true),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(&cli, &output) {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

fn run(cli: &Cli, output: &Output) -> Result<(), CliError> {
    let started = Instant::now();
    let config = RunConfig::load(cli.argument_file.as_deref(), &cli.settings())?;
    let verbose = config.options.verbose;

    let cache = FileContentCache::new();
    let converter = CommonMarkConverter::new();
    let services = Services::new(&cache, &converter);
    Runner::new(config)?.run(&services, |page| output.page(page))?;

    if verbose {
        output.info(&format!("Finished in: {:.3?}", started.elapsed()));
    }
    Ok(())
}
