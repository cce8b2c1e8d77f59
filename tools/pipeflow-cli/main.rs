use clap::Parser;
use pipeflow::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Converts a pipeline definition (XML or JSON) into a controller module
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the pipeline definition
    input: PathBuf,

    /// Write the generated controller here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Mark best-effort regions and unsupported pipelets with `// WARNING:` comments
    #[arg(long)]
    strict: bool,

    /// Print the structured block tree of every function to stderr
    #[arg(long)]
    dump_tree: bool,

    /// Extra template treated as an error page (repeatable)
    #[arg(long = "error-template", value_name = "TEMPLATE")]
    error_templates: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let started = Instant::now();

    let source = fs::read_to_string(&cli.input).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read '{}': {}", cli.input.display(), e))
    });

    let mut builder = Converter::builder().strict(cli.strict);
    for template in &cli.error_templates {
        builder = builder.with_error_template(template);
    }
    let converter = builder.build();

    let conversion = converter
        .convert(&source, &definition_name(&cli.input))
        .unwrap_or_else(|e| exit_with_error(&format!("Conversion failed: {}", e)));

    if cli.dump_tree {
        for function in &conversion.analysis.functions {
            eprintln!("function {}:", function.name);
            eprint!("{}", DisplayBlock { block: &function.body });
        }
    }

    match &cli.output {
        Some(path) => fs::write(path, conversion.code()).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to write '{}': {}", path.display(), e))
        }),
        None => print!("{}", conversion.code()),
    }

    tracing::info!(
        functions = conversion.analysis.functions.len(),
        warnings = conversion.warnings().len(),
        elapsed = ?started.elapsed(),
        "conversion finished"
    );
}

/// The file stem, which is also the controller name.
fn definition_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Pipeline".to_string())
}

fn exit_with_error(message: &str) -> ! {
    tracing::error!("{}", message);
    eprintln!("Error: {}", message);
    process::exit(1);
}
