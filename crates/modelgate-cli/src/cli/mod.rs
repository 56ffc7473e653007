//! CLI command definitions for the `modelgate` binary.

pub mod check;
pub mod complete;
pub mod models;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Capability-aware chat completions against Azure and OpenAI models.
#[derive(Parser)]
#[command(name = "modelgate", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Log errors only. Command output is still printed.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send one system + user prompt to the configured model.
    Complete {
        /// User prompt text.
        #[arg(short, long)]
        prompt: String,

        /// System prompt text.
        #[arg(short, long, default_value = "You are a helpful assistant.")]
        system: String,

        /// Render the system prompt from a template file instead of --system.
        #[arg(long, conflicts_with = "system")]
        system_template: Option<PathBuf>,

        /// Template variable as key=value (repeatable).
        #[arg(long = "var", value_name = "KEY=VALUE")]
        vars: Vec<String>,

        /// Image URL to attach to the user prompt (repeatable).
        #[arg(long = "image", value_name = "URL")]
        images: Vec<String>,

        /// Upper bound on generated tokens.
        #[arg(long)]
        max_tokens: Option<u64>,

        /// Sampling temperature.
        #[arg(long)]
        temperature: Option<f64>,

        /// Report token usage alongside the content.
        #[arg(long)]
        usage: bool,
    },

    /// List models with known capabilities.
    Models {
        /// Extra TOML model catalog merged over the built-in models.
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Validate configuration and provider construction.
    Check {
        /// Also send a minimal completion to verify connectivity.
        #[arg(long)]
        connect: bool,
    },
}
