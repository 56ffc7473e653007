//! modelgate CLI entry point.
//!
//! Binary name: `modelgate`
//!
//! Parses CLI arguments, loads configuration and secrets, builds the
//! configured provider, then dispatches to the command handler.

mod cli;

use clap::Parser;

use modelgate_core::llm::capability::CapabilityRegistry;
use modelgate_infra::config::AppConfig;
use modelgate_infra::llm::{ProviderSettings, create_provider};
use modelgate_observe::tracing_setup::{TelemetryOptions, init_tracing, shutdown_tracing};

use cli::complete::CompleteOptions;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let default_level = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,modelgate=debug",
        _ => "trace",
    };
    init_tracing(&TelemetryOptions {
        default_level: default_level.to_string(),
        json: false,
        otel: cli.otel,
    })
    .map_err(|e| anyhow::anyhow!(e))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Listing models needs no credentials
    if let Commands::Models { catalog } = &cli.command {
        return cli::models::list_models(catalog.as_deref(), cli.json).await;
    }

    let config = AppConfig::load().await?;
    CapabilityRegistry::init_global(config.capability_registry().await?)?;
    let provider = create_provider(&ProviderSettings::from(&config), CapabilityRegistry::global())?;

    match cli.command {
        Commands::Complete {
            prompt,
            system,
            system_template,
            vars,
            images,
            max_tokens,
            temperature,
            usage,
        } => {
            let options = CompleteOptions {
                prompt: &prompt,
                system: &system,
                system_template: system_template.as_deref(),
                vars: &vars,
                images: &images,
                max_tokens,
                temperature,
                usage,
            };
            cli::complete::complete(&provider, options, cli.json).await?;
        }
        Commands::Check { connect } => {
            cli::check::check(&config, &provider, connect, cli.json).await?;
        }
        Commands::Models { .. } => {}
    }

    Ok(())
}
