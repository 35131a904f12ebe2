//! Domain model for the gift exchange roster.
//!
//! # Responsibility
//! - Define the participant record shared by store, engine and storage.
//!
//! # Invariants
//! - Every participant is identified by a stable `ParticipantId`.
//! - Recipient links are owned by the assignment engine, not by callers.

pub mod participant;
