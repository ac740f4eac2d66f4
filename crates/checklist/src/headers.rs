//! Contributor header spellings mapped to canonical field names.

use crate::fields::{CARD_NUMBER, PARALLEL_NAME, PLAYER_NAME, PRINT_RUN, SET_NAME, SUBSET_NAME, TEAM_NAME};
use crate::RawRow;

const HEADER_MAP: &[(&str, &str)] = &[
    // card number
    ("card #", CARD_NUMBER),
    ("card#", CARD_NUMBER),
    ("card no", CARD_NUMBER),
    ("card no.", CARD_NUMBER),
    ("card number", CARD_NUMBER),
    ("cardnum", CARD_NUMBER),
    ("no", CARD_NUMBER),
    ("no.", CARD_NUMBER),
    ("#", CARD_NUMBER),
    // player
    ("player", PLAYER_NAME),
    ("player name", PLAYER_NAME),
    ("name", PLAYER_NAME),
    ("athlete", PLAYER_NAME),
    // team
    ("team", TEAM_NAME),
    ("team name", TEAM_NAME),
    ("tm", TEAM_NAME),
    // set
    ("set", SET_NAME),
    ("set name", SET_NAME),
    ("series", SET_NAME),
    // subset
    ("subset", SUBSET_NAME),
    ("subset name", SUBSET_NAME),
    ("insert", SUBSET_NAME),
    // parallel
    ("parallel", PARALLEL_NAME),
    ("par", PARALLEL_NAME),
    ("variation", PARALLEL_NAME),
    ("var", PARALLEL_NAME),
    // print run / serial
    ("serial", PRINT_RUN),
    ("serial #", PRINT_RUN),
    ("serial number", PRINT_RUN),
    ("print run", PRINT_RUN),
    ("pr", PRINT_RUN),
    ("seq", PRINT_RUN),
    ("sequence", PRINT_RUN),
    // misc
    ("notes", "notes"),
    ("comment", "notes"),
    ("comments", "notes"),
];

/// Positions used when a source has named fields instead of positions. Matches
/// what the classifier expects: subset, number, player, team, print run.
pub const CANONICAL_LAYOUT: [&str; 5] = [SUBSET_NAME, CARD_NUMBER, PLAYER_NAME, TEAM_NAME, PRINT_RUN];

/// Canonical field for a header, ignoring case and surrounding space.
/// Canonical names map to themselves.
pub fn canonical_field(header: &str) -> Option<&'static str> {
    let h = header.trim().to_lowercase();
    HEADER_MAP
        .iter()
        .find(|(spelling, _)| *spelling == h)
        .map(|(_, field)| *field)
        .or_else(|| {
            HEADER_MAP
                .iter()
                .map(|(_, field)| *field)
                .find(|field| *field == h)
        })
}

pub fn layout_position(field: &str) -> Option<usize> {
    CANONICAL_LAYOUT.iter().position(|f| *f == field)
}

/// A row whose every non-blank cell is a known header.
pub fn is_header_row(row: &RawRow) -> bool {
    let mut seen = 0;
    for i in 0..row.len() {
        let text = row.get(i);
        if text.is_empty() {
            continue;
        }
        if canonical_field(&text).is_none() {
            return false;
        }
        seen += 1;
    }
    seen > 0
}
