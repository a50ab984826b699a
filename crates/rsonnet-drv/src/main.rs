//! The rsonnet CLI.
//!
//! Evaluates a Jsonnet file (or program text with `-e`) and prints the
//! resulting JSON document. Errors go to standard error and exit with
//! code 1.

use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rsonnet_drv::{Config, DriverError, Session};

/// rsonnet - a Jsonnet interpreter
#[derive(Parser, Debug)]
#[command(name = "rsonnet")]
#[command(about = "Evaluate a Jsonnet program and print JSON", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(disable_version_flag = true)]
struct Cli {
    /// Input file; reads standard input when omitted and not a terminal
    input: Option<String>,

    /// Treat the positional argument as a Jsonnet program, not a path
    #[arg(short = 'e', long = "exec")]
    exec: bool,

    /// Add an external string variable; bare NAME reads the environment
    #[arg(short = 'V', long = "ext-str", value_name = "NAME[=VALUE]")]
    ext_str: Vec<String>,

    /// Print the parsed AST as JSON instead of evaluating
    #[arg(long)]
    ast: bool,

    /// Indentation width for JSON output
    #[arg(long, value_name = "N")]
    indent: Option<usize>,

    /// Escape non-ASCII characters in JSON output
    #[arg(long)]
    ensure_ascii: bool,

    /// Print version information and exit
    #[arg(short = 'v', long = "version")]
    version: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.version {
        println!("rsonnet {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let ext_vars = parse_ext_vars(&cli.ext_str)?;

    let session = Session::new(Config {
        ext_vars,
        native_callbacks: Vec::new(),
        max_depth: None,
    });

    // Decide where the program text comes from.
    let (source, file): (String, Option<PathBuf>) = if cli.exec {
        let Some(program) = cli.input else {
            bail!("--exec requires a program argument");
        };
        (program, None)
    } else if let Some(input) = cli.input {
        let path = PathBuf::from(input);
        let source = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        (source, Some(path))
    } else if !std::io::stdin().is_terminal() {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("Failed to read standard input")?;
        (source, None)
    } else {
        bail!("the following arguments are required: input");
    };

    if cli.ast {
        let ast = session.parse(&source).map_err(render_error)?;
        let tree = serde_json::to_value(&ast).context("Failed to serialize AST")?;
        println!("{}", rsonnet_drv::render(&tree, cli.indent, cli.ensure_ascii));
        return Ok(());
    }

    let json = match file {
        Some(path) => session.load(&path),
        None => session.loads(&source),
    }
    .map_err(render_error)?;

    println!("{}", rsonnet_drv::render(&json, cli.indent, cli.ensure_ascii));
    Ok(())
}

/// Splits `-V NAME=VALUE` arguments; a bare `NAME` reads the process
/// environment.
fn parse_ext_vars(inputs: &[String]) -> anyhow::Result<Vec<(String, String)>> {
    let mut ext_vars = Vec::with_capacity(inputs.len());
    for input in inputs {
        match input.split_once('=') {
            Some((name, value)) => ext_vars.push((name.to_string(), value.to_string())),
            None => {
                let value = std::env::var(input).map_err(|_| {
                    anyhow!("environment variable {input} is not set (for -V {input})")
                })?;
                ext_vars.push((input.clone(), value));
            }
        }
    }
    Ok(ext_vars)
}

/// Formats driver errors for stderr; syntax errors print one message per
/// line, runtime errors keep their `Runtime Error:` prefix.
fn render_error(error: DriverError) -> anyhow::Error {
    anyhow!("{error}")
}
