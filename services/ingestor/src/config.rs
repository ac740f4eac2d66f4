use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;

#[derive(Clone, Debug, Parser)]
#[command(name = "ingestor")]
#[command(about = "Classify checklist files into sets, parallels and cards")]
#[command(version)]
pub struct IngestConfig {
    /// Directory holding checklist files
    #[arg(long, env = "INGEST_DIR")]
    pub dir: PathBuf,

    /// YAML or JSON checklist configuration
    #[arg(long, env = "CHECKLIST_CONFIG")]
    pub config: PathBuf,

    /// Where per-file entity JSON is written
    #[arg(long, env = "INGEST_OUT_DIR", default_value = "out")]
    pub out_dir: PathBuf,

    /// Write staging rows to a JSONL file instead of entity files
    #[arg(long, env = "INGEST_DRY_RUN", default_value_t = false)]
    pub dry_run: bool,

    #[arg(long, env = "INGEST_WORKERS", default_value_t = 4)]
    pub workers: usize,

    /// Check `meta.checksum` values before ingesting
    #[arg(long, env = "INGEST_VERIFY_CHECKSUMS", default_value_t = false)]
    pub verify_checksums: bool,
}

impl IngestConfig {
    /// Checked before any file is read.
    pub fn check(&self) -> Result<()> {
        if !self.dir.is_dir() {
            bail!("INGEST_DIR is not a directory: {}", self.dir.display());
        }
        if !self.config.is_file() {
            bail!("CHECKLIST_CONFIG not found: {}", self.config.display());
        }
        if self.workers == 0 {
            bail!("INGEST_WORKERS must be at least 1");
        }
        Ok(())
    }
}
