//! Use-case API over the participant store.
//!
//! # Responsibility
//! - Accept request DTOs and return stable response envelopes.
//! - Map core error kinds to transport status codes in one place.
//!
//! # Invariants
//! - Exported functions never panic.
//! - Remove operations report success whether or not anything existed.
//! - Client-correctable errors map to `BadRequest`, unknown ids on update to
//!   `NotFound`, storage failures to `InternalError`.

use log::warn;
use secretgift_core::{
    CoreConfig, DynParticipantRepository, GiftAssignment, Participant, ParticipantId,
    ParticipantRepository, ParticipantService, ServiceError,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Transport-neutral outcome of an API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiStatus {
    Ok,
    BadRequest,
    NotFound,
    InternalError,
}

impl ApiStatus {
    /// HTTP status code for this outcome.
    pub fn http_code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::InternalError => 500,
        }
    }

    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

/// Response envelope returned by every API call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponse<T> {
    pub status: ApiStatus,
    /// Human-readable outcome or error diagnostic.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    fn ok(message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            status: ApiStatus::Ok,
            message: message.into(),
            data,
        }
    }

    fn failure(status: ApiStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            data: None,
        }
    }

    fn from_error(operation: &str, err: &ServiceError) -> Self {
        let status = status_for(err);
        if status == ApiStatus::InternalError {
            warn!("event=api_call module=api status=error operation={operation} error={err}");
        }
        Self::failure(status, err.to_string())
    }
}

/// Request body for add and update.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ParticipantDto {
    pub name: String,
    pub email: String,
}

/// Participant as exposed to clients, including the assignment link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantView {
    pub id: ParticipantId,
    pub name: String,
    pub email: String,
    pub assigned_recipient_id: Option<ParticipantId>,
}

impl From<Participant> for ParticipantView {
    fn from(value: Participant) -> Self {
        Self {
            id: value.id,
            name: value.name,
            email: value.email,
            assigned_recipient_id: value.assigned_recipient_id,
        }
    }
}

/// Giver name with the resolved recipient name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentView {
    pub giver: String,
    /// `None` when unassigned or the recipient no longer exists.
    pub recipient: Option<String>,
}

impl From<GiftAssignment> for AssignmentView {
    fn from(value: GiftAssignment) -> Self {
        Self {
            giver: value.giver,
            recipient: value.recipient,
        }
    }
}

/// Gift exchange API over a participant store.
pub struct GiftExchangeApi<R: ParticipantRepository> {
    service: ParticipantService<R>,
}

impl GiftExchangeApi<DynParticipantRepository> {
    /// Opens the store configured by `config`.
    pub fn from_config(config: &CoreConfig) -> Result<Self, String> {
        let repo = config
            .open_repository()
            .map_err(|err| format!("failed to open {} storage: {err}", config.storage.as_str()))?;
        let service = ParticipantService::open(repo)
            .map_err(|err| format!("failed to load participants: {err}"))?;
        Ok(Self::new(service))
    }
}

impl<R: ParticipantRepository> GiftExchangeApi<R> {
    pub fn new(service: ParticipantService<R>) -> Self {
        Self { service }
    }

    /// Borrows the underlying store.
    pub fn service(&self) -> &ParticipantService<R> {
        &self.service
    }

    /// Adds a participant. Returns the new id on success.
    pub fn add_participant(&self, dto: &ParticipantDto) -> ApiResponse<ParticipantId> {
        match self.service.add(dto.name.trim(), dto.email.trim()) {
            Ok(id) => ApiResponse::ok("Participant added successfully.", Some(id)),
            Err(err) => ApiResponse::from_error("add_participant", &err),
        }
    }

    /// Updates name and email of the participant with textual id `id`.
    pub fn update_participant(&self, id: &str, dto: &ParticipantDto) -> ApiResponse<()> {
        let id = match parse_id(id) {
            Ok(id) => id,
            Err(response) => return response,
        };
        match self.service.update(id, dto.name.trim(), dto.email.trim()) {
            Ok(()) => ApiResponse::ok("Participant updated successfully.", None),
            Err(err) => ApiResponse::from_error("update_participant", &err),
        }
    }

    /// Lists every participant with assignment links.
    pub fn get_all_participants(&self) -> ApiResponse<Vec<ParticipantView>> {
        let participants = self
            .service
            .list()
            .into_iter()
            .map(ParticipantView::from)
            .collect::<Vec<_>>();
        let message = format!("Found {} participant(s).", participants.len());
        ApiResponse::ok(message, Some(participants))
    }

    /// Runs one assignment round.
    pub fn assign_gifts(&self) -> ApiResponse<()> {
        match self.service.assign_gifts() {
            Ok(()) => ApiResponse::ok("Gifts assigned successfully.", None),
            Err(err) => ApiResponse::from_error("assign_gifts", &err),
        }
    }

    /// Lists giver -> recipient names for the current round.
    pub fn get_gift_assignments(&self) -> ApiResponse<Vec<AssignmentView>> {
        let assignments = self
            .service
            .assignments()
            .into_iter()
            .map(AssignmentView::from)
            .collect::<Vec<_>>();
        ApiResponse::ok("Current gift assignments.", Some(assignments))
    }

    /// Removes one participant; unknown ids still report success.
    pub fn remove_participant(&self, id: &str) -> ApiResponse<()> {
        let id = match parse_id(id) {
            Ok(id) => id,
            Err(response) => return response,
        };
        match self.service.remove(id) {
            Ok(_) => ApiResponse::ok("Participant removed successfully.", None),
            Err(err) => ApiResponse::from_error("remove_participant", &err),
        }
    }

    /// Removes every participant.
    pub fn remove_all_participants(&self) -> ApiResponse<()> {
        match self.service.remove_all() {
            Ok(()) => ApiResponse::ok("All participants removed successfully.", None),
            Err(err) => ApiResponse::from_error("remove_all_participants", &err),
        }
    }
}

fn status_for(err: &ServiceError) -> ApiStatus {
    match err {
        ServiceError::NotFound(_) => ApiStatus::NotFound,
        ServiceError::Repo(_) => ApiStatus::InternalError,
        _ if err.is_client_error() => ApiStatus::BadRequest,
        _ => ApiStatus::InternalError,
    }
}

fn parse_id<T>(raw: &str) -> Result<ParticipantId, ApiResponse<T>> {
    Uuid::parse_str(raw.trim()).map_err(|_| {
        ApiResponse::failure(
            ApiStatus::BadRequest,
            format!("invalid participant id `{}`", raw.trim()),
        )
    })
}
