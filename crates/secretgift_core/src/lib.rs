//! Core domain logic for the secret gift exchange.
//! This crate owns the roster invariants and the assignment algorithm.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig, DynParticipantRepository, StorageBackend};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::participant::{Participant, ParticipantId, ParticipantValidationError};
pub use repo::json_file_repo::JsonFileParticipantRepository;
pub use repo::participant_repo::{
    ParticipantRepository, RepoError, RepoResult, SqliteParticipantRepository,
};
pub use service::assignment::{assign_recipients, derangement, AssignmentError};
pub use service::participant_service::{
    GiftAssignment, ParticipantService, ServiceError, ServiceResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
