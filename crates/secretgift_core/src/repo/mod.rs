//! Persistence gateway for the participant roster.
//!
//! # Responsibility
//! - Define the whole-collection load/save contract the store relies on.
//! - Keep SQLite and JSON file details out of store and engine code.
//!
//! # Invariants
//! - `load_all` on fresh storage returns an empty roster, not an error.
//! - `save_all` replaces the persisted roster wholesale or not at all.

pub mod json_file_repo;
pub mod participant_repo;
