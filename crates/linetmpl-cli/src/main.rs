use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use linetmpl::MissingKey;

#[derive(Parser)]
#[command(author, version, about = "linetmpl - bracket-delimited templates and their syntax trees")]
struct Cli {
    /// Directory holding named templates, resolved as <DIR>/<NAME>.tpl
    #[arg(
        long,
        global = true,
        env = "LINETMPL_TEMPLATE_DIR",
        default_value = "templates",
        value_name = "DIR"
    )]
    template_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the syntax tree of a template as JSON
    Parse {
        /// Template file, or the name of a template in the template directory
        #[arg(value_name = "TEMPLATE")]
        template: String,
        /// Wrap the tree as {"data": tree}
        #[arg(long)]
        envelope: bool,
        /// Print on a single line
        #[arg(long)]
        compact: bool,
    },
    /// Render a template against a JSON data file
    Render {
        /// Template file, or the name of a template in the template directory
        #[arg(value_name = "TEMPLATE")]
        template: String,
        /// JSON file with the data context (defaults to an empty object)
        #[arg(long, short, value_name = "FILE")]
        data: Option<PathBuf>,
        /// What a lookup of a missing key does
        #[arg(long, default_value = "default")]
        missing_key: MissingKeyArg,
    },
    /// Check templates for syntax errors and unsupported constructs
    Check {
        /// Templates to check
        #[arg(value_name = "TEMPLATE", required = true)]
        templates: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MissingKeyArg {
    /// Print "<no value>"
    Default,
    /// Fail the render
    Error,
}

impl From<MissingKeyArg> for MissingKey {
    fn from(arg: MissingKeyArg) -> Self {
        match arg {
            MissingKeyArg::Default => MissingKey::Default,
            MissingKeyArg::Error => MissingKey::Error,
        }
    }
}

/// Template text together with the name it is parsed under.
struct Source {
    name: String,
    text: String,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    let dir = cli.template_dir.as_path();
    match cli.command {
        Commands::Parse {
            template,
            envelope,
            compact,
        } => parse_template(&load(&template, dir)?, envelope, compact),
        Commands::Render {
            template,
            data,
            missing_key,
        } => render_template(&load(&template, dir)?, data.as_deref(), missing_key.into()),
        Commands::Check { templates } => check_templates(&templates, dir),
    }
}

/// Resolve `template` as a file path first, then as a name in `dir`.
fn load(template: &str, dir: &Path) -> Result<Source> {
    let direct = Path::new(template);
    let (path, name) = if direct.is_file() {
        let name = direct
            .file_stem()
            .map_or_else(|| template.to_string(), |stem| stem.to_string_lossy().into_owned());
        (direct.to_path_buf(), name)
    } else {
        (dir.join(format!("{template}.tpl")), template.to_string())
    };
    debug!(path = %path.display(), name = %name, "load template");
    let text = std::fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
    Ok(Source { name, text })
}

fn parse_template(source: &Source, envelope: bool, compact: bool) -> Result<bool> {
    let tree = linetmpl::parse(&source.name, &source.text)?;
    let value = if envelope {
        serde_json::json!({ "data": serde_json::to_value(&tree)? })
    } else {
        serde_json::to_value(&tree)?
    };
    let output = if compact {
        serde_json::to_string(&value)?
    } else {
        serde_json::to_string_pretty(&value)?
    };
    println!("{output}");
    Ok(true)
}

fn render_template(source: &Source, data: Option<&Path>, missing_key: MissingKey) -> Result<bool> {
    let context: Value = match data {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
            serde_json::from_str(&text)
                .map_err(|e| anyhow::anyhow!("Invalid JSON in {}: {}", path.display(), e))?
        }
        None => Value::Object(serde_json::Map::new()),
    };

    let template = linetmpl::compile(&source.name, &source.text)?.option(missing_key);
    let mut out = std::io::stdout().lock();
    template.execute(&mut out, &context)?;
    out.flush()?;
    Ok(true)
}

fn check_templates(templates: &[String], dir: &Path) -> Result<bool> {
    let mut failures = 0;

    for template in templates {
        let result = load(template, dir).and_then(|source| {
            linetmpl::parse(&source.name, &source.text)?;
            Ok(())
        });
        match result {
            Ok(()) => println!("{} {}", "✓".green().bold(), template),
            Err(e) => {
                eprintln!("{}: {}: {}", template, "error".red().bold(), e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        eprintln!(
            "\n{}: {} of {} template(s) failed",
            "error".red().bold(),
            failures,
            templates.len()
        );
        return Ok(false);
    }
    Ok(true)
}
