//! `modelgate check`: configuration and connectivity check.

use modelgate_core::llm::box_provider::BoxLlmProvider;
use modelgate_infra::config::AppConfig;
use modelgate_infra::llm::test_provider_connection;

pub async fn check(
    config: &AppConfig,
    provider: &BoxLlmProvider,
    connect: bool,
    json: bool,
) -> anyhow::Result<()> {
    let connection = if connect {
        Some(test_provider_connection(provider).await.map_err(|e| e.to_string()))
    } else {
        None
    };

    if json {
        let out = serde_json::json!({
            "provider": provider.provider_type().to_string(),
            "model": provider.model().name,
            "endpoint": config.azure_endpoint,
            "secrets_dir": config.secrets_dir.display().to_string(),
            "connected": connection.as_ref().map(|r| r.is_ok()),
            "error": connection.as_ref().and_then(|r| r.as_ref().err()),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        let check_mark = |ok: bool| {
            if ok {
                format!("{}", console::style("✓").green())
            } else {
                format!("{}", console::style("✗").red())
            }
        };
        println!();
        println!(
            "  {} Provider {} for model {}",
            check_mark(true),
            console::style(provider.provider_type()).cyan(),
            console::style(&provider.model().name).bold()
        );
        println!("  {} Secrets directory: {}", check_mark(true), config.secrets_dir.display());
        match &connection {
            Some(Ok(())) => println!("  {} Connection OK", check_mark(true)),
            Some(Err(e)) => println!("  {} Connection failed: {e}", check_mark(false)),
            None => {}
        }
        println!();
    }

    if let Some(Err(e)) = connection {
        anyhow::bail!("connection check failed: {e}");
    }
    Ok(())
}
