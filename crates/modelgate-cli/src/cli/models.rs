//! `modelgate models`: list the capability registry.

use std::path::Path;

use modelgate_core::llm::capability::CapabilityRegistry;
use modelgate_infra::config::load_model_catalog;

pub async fn list_models(catalog: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let mut registry = CapabilityRegistry::with_builtin_models();
    if let Some(path) = catalog {
        registry.extend(load_model_catalog(path).await?);
    }
    CapabilityRegistry::init_global(registry)?;
    let registry = CapabilityRegistry::global();

    let mut models = Vec::with_capacity(registry.len());
    for name in registry.names() {
        models.push(registry.lookup(name)?);
    }

    if json {
        let out: Vec<_> = models
            .iter()
            .map(|caps| {
                let mut features: Vec<_> = caps.features.keys().cloned().collect();
                features.sort();
                serde_json::json!({
                    "name": caps.name,
                    "version": caps.version,
                    "features": features,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    for caps in &models {
        let mut features: Vec<_> = caps.features.iter().collect();
        features.sort_by(|a, b| a.0.cmp(b.0));
        println!(
            "  {} {}",
            console::style(&caps.name).bold().cyan(),
            console::style(&caps.version).dim()
        );
        for (param, expected) in features {
            println!("    {param}: {expected}");
        }
        println!();
    }
    Ok(())
}
