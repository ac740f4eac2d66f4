//! Canonical field names shared by column maps, classification and entities.

pub const SUBSET_NAME: &str = "subset_name";
pub const PARALLEL_NAME: &str = "parallel_name";
pub const CARD_NUMBER: &str = "card_number";
pub const PLAYER_NAME: &str = "player_name";
pub const TEAM_NAME: &str = "team_name";
pub const PRINT_RUN: &str = "print_run";
pub const SET_NAME: &str = "set_name";
