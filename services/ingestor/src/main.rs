mod config;
mod output;
mod run;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use checklist::{ChecklistError, ConfigDocument, ValidatedConfig};
use clap::Parser;
use tracing::info;

use crate::config::IngestConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cfg = IngestConfig::parse();
    cfg.check()?;

    // --- Config: load + validate (abort on any error) ---
    let doc = ConfigDocument::from_path(&cfg.config)
        .with_context(|| format!("Failed to load {}", cfg.config.display()))?;
    let config = match ValidatedConfig::new(doc) {
        Ok(config) => config,
        Err(ChecklistError::InvalidConfig { errors }) => {
            for e in &errors {
                eprintln!("  {e}");
            }
            bail!("config validation failed with {} error(s)", errors.len());
        }
        Err(e) => return Err(e.into()),
    };
    info!(checklists = config.document().checklists.len(), "config ok");

    // --- Scan ---
    let config_path = cfg.config.canonicalize().unwrap_or_else(|_| cfg.config.clone());
    let files: Vec<_> = sources::scan_directory(&cfg.dir)?
        .into_iter()
        .filter(|p| p.canonicalize().map(|c| c != config_path).unwrap_or(true))
        .collect();
    if files.is_empty() {
        info!(dir=%cfg.dir.display(), "no checklist files found");
    }

    let summary = run::run(&cfg, Arc::new(config), files).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if summary.failed > 0 {
        bail!("{} of {} file(s) failed", summary.failed, summary.files);
    }
    Ok(())
}
