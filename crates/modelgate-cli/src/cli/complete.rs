//! `modelgate complete`: one system + user completion.

use std::path::Path;

use anyhow::{Context, bail};
use serde_json::{Map, Value};

use modelgate_core::llm::box_provider::BoxLlmProvider;
use modelgate_core::llm::request::CompletionArgs;
use modelgate_core::prompt::PromptRegistry;
use modelgate_types::llm::{ContentBlock, UserPrompt};

/// Options collected from the `complete` subcommand.
pub struct CompleteOptions<'a> {
    pub prompt: &'a str,
    pub system: &'a str,
    pub system_template: Option<&'a Path>,
    pub vars: &'a [String],
    pub images: &'a [String],
    pub max_tokens: Option<u64>,
    pub temperature: Option<f64>,
    pub usage: bool,
}

pub async fn complete(
    provider: &BoxLlmProvider,
    options: CompleteOptions<'_>,
    json: bool,
) -> anyhow::Result<()> {
    let system = match options.system_template {
        Some(path) => render_system(path, options.vars)?,
        None => options.system.to_string(),
    };

    let mut args = CompletionArgs::new().return_usage(options.usage);
    if let Some(max_tokens) = options.max_tokens {
        args = args.max_tokens(max_tokens);
    }
    if let Some(temperature) = options.temperature {
        args = args.temperature(temperature);
    }

    let completion = provider
        .get_completion(&system, user_prompt(options.prompt, options.images), args)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&completion)?);
        return Ok(());
    }

    let (content, usage) = completion.into_parts();
    println!("{content}");
    if let Some(usage) = usage {
        eprintln!();
        eprintln!(
            "  {} prompt {} / completion {} / total {}",
            console::style("tokens").dim(),
            console::style(usage.prompt_tokens).cyan(),
            console::style(usage.completion_tokens).cyan(),
            console::style(usage.total_tokens).bold(),
        );
    }
    Ok(())
}

fn user_prompt(text: &str, images: &[String]) -> UserPrompt {
    if images.is_empty() {
        return UserPrompt::from(text);
    }
    let mut blocks = vec![ContentBlock::text(text)];
    blocks.extend(images.iter().map(ContentBlock::image));
    UserPrompt::Blocks(blocks)
}

fn render_system(path: &Path, vars: &[String]) -> anyhow::Result<String> {
    let prompts = PromptRegistry::global();
    prompts
        .register_file("system", path)
        .with_context(|| format!("failed to load template {}", path.display()))?;
    let rendered = prompts.render("system", &parse_vars(vars)?)?;
    tracing::debug!(template = %path.display(), vars = vars.len(), "Rendered system prompt");
    Ok(rendered)
}

fn parse_vars(vars: &[String]) -> anyhow::Result<Map<String, Value>> {
    let mut context = Map::new();
    for var in vars {
        let Some((key, value)) = var.split_once('=') else {
            bail!("invalid --var '{var}': expected KEY=VALUE");
        };
        context.insert(key.trim().to_string(), Value::String(value.to_string()));
    }
    Ok(context)
}
