//! Deterministic fingerprint of an ingest output.

use crate::{ChecklistError, IngestOutput, Result};

pub type Hash32 = [u8; 32];

/// Deterministic output fingerprint:
/// - cards, then parallels, each in key order (maps are already sorted)
/// - hash bytes: "<section>\n<key>\n<entity json>\n" for each entry
pub fn output_fingerprint(output: &IngestOutput) -> Result<Hash32> {
    let mut hasher = blake3::Hasher::new();
    for (section, map) in [("cards", &output.cards), ("parallels", &output.parallels)] {
        for (key, entity) in map {
            let json = serde_json::to_vec(entity).map_err(|e| ChecklistError::Ser(e.to_string()))?;
            hasher.update(section.as_bytes());
            hasher.update(b"\n");
            hasher.update(key.as_bytes());
            hasher.update(b"\n");
            hasher.update(&json);
            hasher.update(b"\n");
        }
    }
    Ok(hasher.finalize().into())
}

pub fn fingerprint_hex(output: &IngestOutput) -> Result<String> {
    output_fingerprint(output).map(hex::encode)
}

impl IngestOutput {
    pub fn fingerprint(&self) -> Result<Hash32> {
        output_fingerprint(self)
    }
}
