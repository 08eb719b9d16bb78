mod pipeline;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use oafn_core::config::{self, CONFIG_FILE_NAME};
use oafn_csharp::CSharpGenerator;

#[derive(Parser)]
#[command(
    name = "oafn",
    about = "OpenAPI 3.x to C# Azure Functions generator",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate models and functions for every configured service
    Generate {
        /// Path to the config file
        #[arg(short, long, default_value = CONFIG_FILE_NAME)]
        config: PathBuf,
    },

    /// Validate an OpenAPI spec and report what would be generated
    Validate {
        /// Path to the OpenAPI spec file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Inspect the resolved models and endpoints of an OpenAPI spec
    Inspect {
        /// Path to the OpenAPI spec file
        #[arg(short, long)]
        input: PathBuf,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: InspectFormat,
    },

    /// Initialize a new oafn configuration
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Clone, ValueEnum)]
enum InspectFormat {
    Yaml,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { config } => cmd_generate(&config),

        Commands::Validate { input } => cmd_validate(&input),

        Commands::Inspect { input, format } => cmd_inspect(&input, format),

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "oafn", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn cmd_generate(config_path: &Path) -> Result<()> {
    let cfg = config::load_config(config_path)?;
    let base_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let summary = pipeline::generate_all(&cfg, base_dir, &CSharpGenerator)?;

    eprintln!(
        "Wrote {} files for {} services.",
        summary.written, summary.total
    );
    if summary.failed > 0 {
        anyhow::bail!(
            "{} of {} services had errors; see the log above",
            summary.failed,
            summary.total
        );
    }
    Ok(())
}

fn cmd_validate(input: &Path) -> Result<()> {
    let resolved = pipeline::resolve_document(input)?;
    let spec = &resolved.spec;

    eprintln!("Valid OpenAPI {} spec: {}", spec.openapi, spec.info.title);
    eprintln!("  Version: {}", spec.info.version);
    eprintln!("  Models: {}", resolved.models.items.len());
    eprintln!("  Endpoints: {}", resolved.endpoints.items.len());

    let failures: Vec<_> = resolved
        .models
        .failures
        .iter()
        .chain(&resolved.endpoints.failures)
        .collect();
    for failure in &failures {
        eprintln!("  error: {failure}");
    }
    if !failures.is_empty() {
        anyhow::bail!("{} definitions cannot be generated", failures.len());
    }

    eprintln!("Validation successful.");
    Ok(())
}

fn cmd_inspect(input: &Path, format: InspectFormat) -> Result<()> {
    let resolved = pipeline::resolve_document(input)?;
    let summary = pipeline::InspectSummary::from(&resolved);

    match format {
        InspectFormat::Yaml => {
            let yaml = serde_yaml_ng::to_string(&summary)?;
            print!("{yaml}");
        }
        InspectFormat::Json => {
            let json = serde_json::to_string_pretty(&summary)?;
            println!("{json}");
        }
    }

    Ok(())
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())
        .with_context(|| format!("failed to write {}", config_path.display()))?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}
