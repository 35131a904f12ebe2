//! Boundary layer for the secret gift exchange.
//!
//! Translates core results into transport-level envelopes. Front ends
//! (CLI, HTTP adapters) depend on this crate instead of on core error kinds.

pub mod api;

pub use api::{
    ApiResponse, ApiStatus, AssignmentView, GiftExchangeApi, ParticipantDto, ParticipantView,
};
