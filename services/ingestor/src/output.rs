use anyhow::{Context, Result};
use checklist::{CanonicalEntity, DuplicateKey, IngestOutput, StagingRow};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Serialize)]
struct EntityFile<'a> {
    file: &'a str,
    fingerprint: String,
    cards: &'a BTreeMap<String, CanonicalEntity>,
    parallels: &'a BTreeMap<String, CanonicalEntity>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    duplicates: &'a Vec<DuplicateKey>,
}

/// `<out_dir>/<stem>.json`
pub fn write_entities(out_dir: &Path, file_name: &str, output: &IngestOutput) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("create output dir {}", out_dir.display()))?;
    let path = out_dir.join(format!("{}.json", checklist::checklist_key(file_name)));

    let doc = EntityFile {
        file: file_name,
        fingerprint: checklist::fingerprint_hex(output)?,
        cards: &output.cards,
        parallels: &output.parallels,
        duplicates: &output.duplicates,
    };
    let file = File::create(&path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut w, &doc)?;
    w.flush()?;
    Ok(path)
}

/// Staging rows as JSON lines, one file per run.
pub struct DryRunWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    rows: usize,
}

impl DryRunWriter {
    pub fn create(out_dir: &Path, run_id: Uuid) -> Result<Self> {
        std::fs::create_dir_all(out_dir)
            .with_context(|| format!("create output dir {}", out_dir.display()))?;
        let path = out_dir.join(format!("dry_run_{run_id}.jsonl"));
        let file = File::create(&path).with_context(|| format!("create {}", path.display()))?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            rows: 0,
        })
    }

    pub fn write(&mut self, row: &StagingRow) -> Result<()> {
        serde_json::to_writer(&mut self.writer, row)?;
        self.writer.write_all(b"\n")?;
        self.rows += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<(PathBuf, usize)> {
        self.writer.flush()?;
        Ok((self.path, self.rows))
    }
}
