//! Per-sheet ingestion.
//!
//! Rows are processed strictly in order: the current subset and the parallel
//! flag carry from one row to the next. State lives in [`SheetState`] and is
//! fresh for every sheet.

use crate::build::{build_with_identity, SetIdentity};
use crate::{
    classify_row, resolve_columns, CanonicalEntity, ChecklistConfig, ColumnLayout, EntityKind,
    ParallelRef, Provenance, RawRow, Result, RowTag, SetRecord, SheetDef, ValidatedConfig, Workbook,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// A key written twice. The later entity is the one kept.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateKey {
    pub key: String,
    pub kind: EntityKind,
    pub previous: Option<Provenance>,
    pub current: Option<Provenance>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOutput {
    pub cards: BTreeMap<String, CanonicalEntity>,
    pub parallels: BTreeMap<String, CanonicalEntity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub duplicates: Vec<DuplicateKey>,
}

impl IngestOutput {
    pub fn insert_card(&mut self, key: String, entity: CanonicalEntity) {
        Self::insert(&mut self.cards, &mut self.duplicates, EntityKind::Card, key, entity);
    }

    pub fn insert_parallel(&mut self, key: String, entity: CanonicalEntity) {
        Self::insert(&mut self.parallels, &mut self.duplicates, EntityKind::Parallel, key, entity);
    }

    fn insert(
        map: &mut BTreeMap<String, CanonicalEntity>,
        duplicates: &mut Vec<DuplicateKey>,
        kind: EntityKind,
        key: String,
        entity: CanonicalEntity,
    ) {
        let current = entity.provenance().cloned();
        if let Some(previous) = map.insert(key.clone(), entity) {
            warn!(key=%key, ?kind, "duplicate key, keeping the later row");
            duplicates.push(DuplicateKey {
                key,
                kind,
                previous: previous.provenance().cloned(),
                current,
            });
        }
    }

    /// Merge another output by key; entries of `other` win.
    pub fn merge(&mut self, other: IngestOutput) {
        self.duplicates.extend(other.duplicates);
        for (k, v) in other.cards {
            self.insert_card(k, v);
        }
        for (k, v) in other.parallels {
            self.insert_parallel(k, v);
        }
    }

    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    pub fn parallel_count(&self) -> usize {
        self.parallels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty() && self.parallels.is_empty()
    }
}

/// Cross-row context: `{no_subset, has_subset} x {outside, inside parallel}`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SheetState {
    pub current_subset: Option<SetRecord>,
    pub in_parallel: bool,
    /// last parallel row seen inside the current parallel block
    pub current_parallel: Option<ParallelRef>,
}

impl SheetState {
    pub fn has_subset(&self) -> bool {
        self.current_subset.is_some()
    }
}

/// One sheet's ingestion run.
pub struct SheetSession<'a> {
    checklist: &'a ChecklistConfig,
    defaults: &'a ColumnLayout,
    sheet_def: &'a SheetDef,
    identity: SetIdentity,
    file_name: String,
    sheet_name: String,
    row_no: usize,
    state: SheetState,
    output: IngestOutput,
}

impl<'a> SheetSession<'a> {
    pub fn new(
        checklist_key: &str,
        checklist: &'a ChecklistConfig,
        defaults: &'a ColumnLayout,
        sheet_def: &'a SheetDef,
        file_name: &str,
        sheet_name: &str,
    ) -> Result<Self> {
        let identity = SetIdentity::from_meta(checklist_key, &checklist.meta)?;
        Ok(Self {
            checklist,
            defaults,
            sheet_def,
            identity,
            file_name: file_name.to_string(),
            sheet_name: sheet_name.to_string(),
            row_no: 0,
            state: SheetState::default(),
            output: IngestOutput::default(),
        })
    }

    pub fn state(&self) -> &SheetState {
        &self.state
    }

    pub fn output(&self) -> &IngestOutput {
        &self.output
    }

    /// Classify one row, apply its transition and build what it describes.
    pub fn process(&mut self, row: &RawRow) -> RowTag {
        self.row_no += 1;
        let classified = classify_row(row, self.state.in_parallel);
        let tag = classified.tag;

        match tag {
            RowTag::Unknown => return tag,
            RowTag::ParallelMarker => {
                debug!(row = self.row_no, marker=%classified.field(crate::fields::PARALLEL_NAME), "entering parallel block");
                self.state.in_parallel = true;
                self.state.current_parallel = None;
                return tag;
            }
            RowTag::Card => {
                self.state.in_parallel = false;
                self.state.current_parallel = None;
            }
            RowTag::Subset => self.state.current_parallel = None,
            RowTag::Parallel | RowTag::Master => {}
        }

        let columns = resolve_columns(
            self.sheet_def,
            &self.checklist.column_sets,
            &self.checklist.meta,
            self.defaults,
            tag,
        );
        let (key, mut entity) = build_with_identity(row, &columns, &self.checklist.meta, &self.identity);

        if tag == RowTag::Subset {
            match entity {
                CanonicalEntity::Set(set) => self.state.current_subset = Some(set),
                // a subset row whose column map pulls a card number or parallel name
                other => debug!(row = self.row_no, kind = ?other.kind(), "subset row did not build a set"),
            }
            return tag;
        }

        entity.set_cardset(self.state.current_subset.clone());
        entity.set_provenance(Provenance {
            file: self.file_name.clone(),
            sheet: self.sheet_name.clone(),
            row: self.row_no,
        });

        if tag == RowTag::Parallel {
            if let CanonicalEntity::Parallel(p) = &entity {
                self.state.current_parallel = Some(ParallelRef {
                    key: key.clone(),
                    parallel_name: p.parallel_name.clone(),
                });
            }
            self.output.insert_parallel(key, entity);
        } else {
            if tag == RowTag::Master && self.state.in_parallel {
                if let Some(card) = entity.as_card_mut() {
                    card.parallel = self.state.current_parallel.clone();
                }
            }
            self.output.insert_card(key, entity);
        }
        tag
    }

    pub fn finish(self) -> IngestOutput {
        self.output
    }
}

/// Ingest the rows of one sheet. A sheet with no matching definition is
/// skipped with an empty result.
pub fn ingest_checklist<'r, I>(
    rows: I,
    file_name: &str,
    sheet_name: &str,
    checklist_key: &str,
    checklist: &ChecklistConfig,
    defaults: &ColumnLayout,
) -> Result<IngestOutput>
where
    I: IntoIterator<Item = &'r RawRow>,
{
    let Some(sheet_def) = checklist.sheet_named(sheet_name) else {
        warn!(file=%file_name, sheet=%sheet_name, "no config for sheet, skipping");
        return Ok(IngestOutput::default());
    };
    ingest_sheet(rows, file_name, sheet_name, checklist_key, checklist, defaults, sheet_def)
}

fn ingest_sheet<'r, I>(
    rows: I,
    file_name: &str,
    sheet_name: &str,
    checklist_key: &str,
    checklist: &ChecklistConfig,
    defaults: &ColumnLayout,
    sheet_def: &SheetDef,
) -> Result<IngestOutput>
where
    I: IntoIterator<Item = &'r RawRow>,
{
    let mut session = SheetSession::new(checklist_key, checklist, defaults, sheet_def, file_name, sheet_name)?;
    let mut skipped = 0usize;
    for row in rows {
        if session.process(row) == RowTag::Unknown {
            skipped += 1;
        }
    }
    let out = session.finish();
    info!(
        file=%file_name,
        sheet=%sheet_name,
        cards = out.card_count(),
        parallels = out.parallel_count(),
        skipped,
        "sheet ingested"
    );
    Ok(out)
}

/// Ingest every sheet of a workbook and merge the results by key.
///
/// The checklist is looked up by the file name without extension. A single
/// sheet that matches no definition by name uses the definition at index 0.
pub fn ingest_workbook(workbook: &Workbook, config: &ValidatedConfig) -> Result<IngestOutput> {
    let doc = config.document();
    let key = workbook.checklist_key();
    let Some(checklist) = doc.checklist(&key) else {
        warn!(file=%workbook.file_name, "no checklist config for file");
        return Ok(IngestOutput::default());
    };

    let single = workbook.sheets.len() == 1;
    let mut all = IngestOutput::default();
    for sheet in &workbook.sheets {
        let sheet_def = checklist
            .sheet_named(&sheet.name)
            .or_else(|| if single { checklist.sheets.get(&0) } else { None });
        let Some(sheet_def) = sheet_def else {
            warn!(file=%workbook.file_name, sheet=%sheet.name, "no config for sheet, skipping");
            continue;
        };
        info!(file=%workbook.file_name, sheet=%sheet.name, "processing sheet");
        let out = ingest_sheet(
            &sheet.rows,
            &workbook.file_name,
            &sheet.name,
            &key,
            checklist,
            &doc.defaults,
            sheet_def,
        )?;
        all.merge(out);
    }
    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigDocument;

    const DOC: &str = r#"
defaults:
  columns:
    cards:
      0: subset_name
      1: card_number
      2: player_name
      3: team_name
    subset:
      0: subset_name
    parallel:
      0: parallel_name
Select:
  meta:
    year: 2024
    brand: Panini
    set_name: Select
  sheets:
    0:
      name: Inserts
"#;

    fn rows(data: &[&[Option<&str>]]) -> Vec<RawRow> {
        data.iter().map(|r| r.iter().copied().collect()).collect()
    }

    fn setup() -> ConfigDocument {
        ConfigDocument::from_yaml_str(DOC).unwrap()
    }

    #[test]
    fn test_state_transitions() {
        let doc = setup();
        let checklist = doc.checklist("Select").unwrap();
        let sheet_def = checklist.sheet_named("Inserts").unwrap();
        let mut s = SheetSession::new("Select", checklist, &doc.defaults, sheet_def, "f.xlsx", "Inserts").unwrap();

        assert_eq!(s.state(), &SheetState::default());

        let input = rows(&[
            &[Some("Rookies"), None, None],
            &[Some("Parallels"), None, None],
            &[Some("Gold Foil"), None, None],
            &[Some("Rookies"), Some("12"), Some("John Doe"), Some("Yankees")],
            &[Some("Silver"), None, None],
        ]);

        assert_eq!(s.process(&input[0]), RowTag::Subset);
        assert!(s.state().has_subset());
        assert!(!s.state().in_parallel);

        assert_eq!(s.process(&input[1]), RowTag::ParallelMarker);
        assert!(s.state().in_parallel);
        assert!(s.state().has_subset());

        assert_eq!(s.process(&input[2]), RowTag::Parallel);
        assert_eq!(s.state().current_parallel.as_ref().unwrap().parallel_name, "Gold Foil");

        assert_eq!(s.process(&input[3]), RowTag::Card);
        assert!(!s.state().in_parallel);
        assert!(s.state().current_parallel.is_none());

        // out of the block again, so a lone name is a subset
        assert_eq!(s.process(&input[4]), RowTag::Subset);
        assert_eq!(s.state().current_subset.as_ref().unwrap().subset_name, "Silver");
    }

    #[test]
    fn test_unknown_rows_leave_state_alone() {
        let doc = setup();
        let checklist = doc.checklist("Select").unwrap();
        let sheet_def = checklist.sheet_named("Inserts").unwrap();
        let mut s = SheetSession::new("Select", checklist, &doc.defaults, sheet_def, "f.xlsx", "Inserts").unwrap();
        s.process(&rows(&[&[Some("Parallels")]])[0]);
        let before = s.state().clone();
        assert_eq!(s.process(&RawRow::default()), RowTag::Unknown);
        assert_eq!(s.state(), &before);
        assert!(s.output().is_empty());
    }

    #[test]
    fn test_master_row_inside_block_links_parallel() {
        let doc = setup();
        let checklist = doc.checklist("Select").unwrap();
        let input = rows(&[
            &[Some("Rookies"), None, None],
            &[Some("Parallels"), None, None],
            &[Some("Gold Foil"), None, None],
            &[Some("Rookies"), Some("12"), Some("John Doe"), Some("Yankees"), Some("25")],
        ]);
        let out = ingest_checklist(&input, "f.xlsx", "Inserts", "Select", checklist, &doc.defaults).unwrap();
        let card = out.cards["2024-Panini-Select-Rookies-12"].as_card().unwrap();
        assert_eq!(card.parallel.as_ref().unwrap().key, "2024-Panini-Select-Gold Foil");
        assert_eq!(card.provenance.as_ref().unwrap().row, 4);
    }

    #[test]
    fn test_duplicate_keys_last_write_wins() {
        let doc = setup();
        let checklist = doc.checklist("Select").unwrap();
        let input = rows(&[
            &[Some("Rookies"), Some("12"), Some("John Doe"), Some("Yankees")],
            &[Some("Rookies"), Some("12"), Some("Jane Roe"), Some("Mets")],
        ]);
        let out = ingest_checklist(&input, "f.xlsx", "Inserts", "Select", checklist, &doc.defaults).unwrap();
        assert_eq!(out.card_count(), 1);
        assert_eq!(out.cards["2024-Panini-Select-Rookies-12"].as_card().unwrap().name, "Jane Roe");
        assert_eq!(out.duplicates.len(), 1);
        assert_eq!(out.duplicates[0].previous.as_ref().unwrap().row, 1);
        assert_eq!(out.duplicates[0].current.as_ref().unwrap().row, 2);
    }

    #[test]
    fn test_flat_meta_columns_leave_block_rows_to_defaults() {
        let doc = ConfigDocument::from_yaml_str(&DOC.replace(
            "    set_name: Select\n",
            "    set_name: Select\n    columns:\n      0: subset_name\n      1: card_number\n      2: player_name\n      3: print_run\n",
        ))
        .unwrap();
        let checklist = doc.checklist("Select").unwrap();
        let input = rows(&[
            &[Some("Rookies"), None, None],
            &[Some("Parallels"), None, None],
            &[Some("Gold Foil"), None, None],
            &[Some("Rookies"), Some("12"), Some("John Doe"), Some("Yankees")],
        ]);
        let out = ingest_checklist(&input, "f.xlsx", "Inserts", "Select", checklist, &doc.defaults).unwrap();

        // the subset row built a set, so it became the owning subset
        let parallel = out.parallels["2024-Panini-Select-Gold Foil"].as_parallel().unwrap();
        assert_eq!(parallel.parallel_name, "Gold Foil");
        assert_eq!(parallel.cardset.as_ref().unwrap().subset_name, "Rookies");

        // cards section of the defaults, not the flat meta map
        let card = out.cards["2024-Panini-Select-Rookies-12"].as_card().unwrap();
        assert_eq!(card.team_name, "Yankees");
        assert_eq!(card.print_run, "");
        assert_eq!(card.cardset.as_ref().unwrap().subset_name, "Rookies");
    }

    #[test]
    fn test_unconfigured_sheet_is_skipped() {
        let doc = setup();
        let checklist = doc.checklist("Select").unwrap();
        let input = rows(&[&[Some("Rookies"), Some("12"), Some("John Doe")]]);
        let out = ingest_checklist(&input, "f.xlsx", "Autographs", "Select", checklist, &doc.defaults).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_merge_prefers_other() {
        let mut a = IngestOutput::default();
        let mut b = IngestOutput::default();
        let set = |name: &str| {
            CanonicalEntity::Set(SetRecord {
                year: "2024".into(),
                brand: "Panini".into(),
                set_name: name.into(),
                subset_name: String::new(),
                sport: None,
                source_file: None,
                print_run: String::new(),
                friendly_name: String::new(),
            })
        };
        a.insert_card("k".into(), set("A"));
        b.insert_card("k".into(), set("B"));
        a.merge(b);
        assert_eq!(a.cards["k"].as_set().unwrap().set_name, "B");
        assert_eq!(a.duplicates.len(), 1);
    }
}
