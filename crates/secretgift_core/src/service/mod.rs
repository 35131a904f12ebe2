//! Roster use-case services.
//!
//! # Responsibility
//! - Own the live participant collection and its uniqueness rules.
//! - Run assignment rounds and commit them through the repository.

pub mod assignment;
pub mod participant_service;
