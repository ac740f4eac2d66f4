use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use checklist::normalize::normalize_parallel;
use checklist::{ingest_workbook, IngestOutput, StagingRow, ValidatedConfig};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::IngestConfig;
use crate::output::{write_entities, DryRunWriter};

/// Result of one file. A failed file does not stop the run.
#[derive(Debug)]
pub struct FileResult {
    pub path: PathBuf,
    pub output: Result<IngestOutput>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub files: usize,
    pub failed: usize,
    pub cards: usize,
    pub parallels: usize,
    pub duplicates: usize,
    pub staging_rows: usize,
    pub staging_errors: usize,
    pub elapsed_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run_file: Option<PathBuf>,
}

/// Read, optionally verify, and ingest one file. Blocking.
pub fn ingest_file(path: &Path, config: &ValidatedConfig, verify_checksums: bool) -> Result<IngestOutput> {
    if verify_checksums {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let key = checklist::checklist_key(&file_name);
        let expected = config
            .document()
            .checklist(&key)
            .and_then(|c| c.meta.checksum.as_deref());
        if let Some(expected) = expected {
            if sources::verify_checksum(path, expected)? {
                info!(file=%file_name, "checksum ok");
            }
        }
    }

    let workbook = sources::read_workbook(path).with_context(|| format!("read {}", path.display()))?;
    let output = ingest_workbook(&workbook, config).with_context(|| format!("ingest {}", path.display()))?;
    Ok(output)
}

/// Ingest files on blocking tasks, at most `workers` at a time. Results come
/// back in the order of `files`.
pub async fn ingest_files(
    files: Vec<PathBuf>,
    config: Arc<ValidatedConfig>,
    workers: usize,
    verify_checksums: bool,
) -> Vec<FileResult> {
    let permits = Arc::new(Semaphore::new(workers.max(1)));
    let mut set = JoinSet::new();

    for (idx, path) in files.iter().cloned().enumerate() {
        let permits = permits.clone();
        let config = config.clone();
        set.spawn(async move {
            let _permit = permits.acquire_owned().await;
            let p = path.clone();
            let output = tokio::task::spawn_blocking(move || ingest_file(&p, &config, verify_checksums))
                .await
                .unwrap_or_else(|e| Err(anyhow::anyhow!("ingest task failed: {e}")));
            (idx, FileResult { path, output })
        });
    }

    let mut results: Vec<Option<FileResult>> = files.iter().map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((idx, result)) => results[idx] = Some(result),
            Err(e) => error!("ingest task panicked: {e:?}"),
        }
    }
    results.into_iter().flatten().collect()
}

/// Full run: ingest, merge by key, write outputs and summarize.
pub async fn run(cfg: &IngestConfig, config: Arc<ValidatedConfig>, files: Vec<PathBuf>) -> Result<RunSummary> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    info!(%run_id, files = files.len(), workers = cfg.workers, dry_run = cfg.dry_run, "ingest run started");

    let results = ingest_files(files, config, cfg.workers, cfg.verify_checksums).await;

    let mut merged = IngestOutput::default();
    let mut failed = 0usize;
    for result in &results {
        match &result.output {
            Ok(out) => {
                info!(
                    file=%result.path.display(),
                    cards = out.card_count(),
                    parallels = out.parallel_count(),
                    "file ingested"
                );
                merged.merge(out.clone());
            }
            Err(e) => {
                failed += 1;
                error!(file=%result.path.display(), "file failed: {e:#}");
            }
        }
    }

    let mut staging_rows = 0usize;
    let mut staging_errors = 0usize;
    let mut dry_run_file = None;

    if cfg.dry_run {
        let known_parallels: BTreeSet<String> = merged
            .parallels
            .values()
            .filter_map(|e| e.as_parallel())
            .filter_map(|p| normalize_parallel(Some(p.parallel_name.as_str())))
            .collect();

        let mut writer = DryRunWriter::create(&cfg.out_dir, run_id)?;
        for (key, entity) in &merged.cards {
            let Some(card) = entity.as_card() else { continue };
            let mut row = StagingRow::from_card(key, card);
            row.normalize();
            if !row.validate(&known_parallels) {
                staging_errors += 1;
                warn!(key=%key, errors=?row.errors, "staging row invalid");
            }
            writer.write(&row)?;
        }
        let (path, rows) = writer.finish()?;
        info!(path=%path.display(), rows, "dry run written");
        staging_rows = rows;
        dry_run_file = Some(path);
    } else {
        for result in &results {
            if let Ok(out) = &result.output {
                let file_name = result
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let path = write_entities(&cfg.out_dir, &file_name, out)?;
                info!(path=%path.display(), "entities written");
            }
        }
    }

    let summary = RunSummary {
        run_id,
        started_at,
        files: results.len(),
        failed,
        cards: merged.card_count(),
        parallels: merged.parallel_count(),
        duplicates: merged.duplicates.len(),
        staging_rows,
        staging_errors,
        elapsed_ms: (Utc::now() - started_at).num_milliseconds(),
        dry_run_file,
    };
    info!(
        %run_id,
        files = summary.files,
        failed = summary.failed,
        cards = summary.cards,
        parallels = summary.parallels,
        duplicates = summary.duplicates,
        staging_errors = summary.staging_errors,
        elapsed_ms = summary.elapsed_ms,
        "ingest run finished"
    );
    Ok(summary)
}
