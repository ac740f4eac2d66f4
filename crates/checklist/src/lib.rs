//! Checklist classification and identity assignment
//!
//! Turns loosely structured checklist rows into canonical sets, parallels and
//! cards with deterministic composite keys.

pub mod fields;
pub mod row;
pub mod columns;
pub mod config;
pub mod classify;
pub mod entity;
pub mod build;
pub mod ingest;
pub mod validate;
pub mod fingerprint;
pub mod headers;
pub mod normalize;
pub mod staging;
pub mod crosscheck;
pub mod summary;

pub use row::*;
pub use columns::*;
pub use config::*;
pub use classify::*;
pub use entity::*;
pub use build::*;
pub use ingest::*;
pub use validate::*;
pub use fingerprint::*;
pub use staging::*;
pub use crosscheck::*;
pub use summary::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChecklistError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(String),

    /// `checklist` is empty when the caller has no checklist name.
    #[error("{}meta is missing '{field}'", checklist_prefix(.checklist))]
    MissingMeta { checklist: String, field: &'static str },

    #[error("Config validation failed with {} error(s)", .errors.len())]
    InvalidConfig { errors: Vec<String> },

    #[error("Serialization error: {0}")]
    Ser(String),
}

pub type Result<T> = std::result::Result<T, ChecklistError>;

fn checklist_prefix(checklist: &str) -> String {
    if checklist.is_empty() {
        String::new()
    } else {
        format!("Checklist '{checklist}' ")
    }
}
