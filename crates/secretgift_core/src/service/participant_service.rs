//! Participant store: the authoritative roster.
//!
//! # Responsibility
//! - Enforce case-insensitive name uniqueness across the live roster.
//! - Persist the whole roster through the repository after every mutation.
//! - Run assignment rounds against the live snapshot.
//!
//! # Invariants
//! - Validation runs before any mutation or persistence attempt.
//! - Mutations are applied to a copy and published only after `save_all`
//!   succeeds, so memory never runs ahead of durable state.
//! - Every mutation holds the roster write lock from read to publish.
//! - Removing a participant does not touch links pointing at it; such links
//!   dangle until the next assignment round.

use crate::model::participant::{
    validate_name, Participant, ParticipantId, ParticipantValidationError,
};
use crate::repo::participant_repo::{ParticipantRepository, RepoError};
use crate::service::assignment::{assign_recipients, AssignmentError};
use log::{error, info, warn};
use rand::Rng;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Error for roster use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Another participant already uses this name (case-insensitive).
    DuplicateName(String),
    /// No participant has this id.
    NotFound(ParticipantId),
    /// Fewer than two participants; no derangement exists.
    InsufficientParticipants { count: usize },
    /// Field-level validation failure.
    Validation(ParticipantValidationError),
    /// Storage failure. The operation did not take effect.
    Repo(RepoError),
}

impl ServiceError {
    /// Whether the caller can fix this by changing its input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateName(_) | Self::InsufficientParticipants { .. } | Self::Validation(_)
        )
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateName(name) => {
                write!(f, "A participant with the name '{name}' already exists.")
            }
            Self::NotFound(_) => write!(f, "Participant not found."),
            Self::InsufficientParticipants { .. } => {
                write!(f, "Not enough participants for gift exchange.")
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<ParticipantValidationError> for ServiceError {
    fn from(value: ParticipantValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<AssignmentError> for ServiceError {
    fn from(value: AssignmentError) -> Self {
        match value {
            AssignmentError::InsufficientParticipants { count } => {
                Self::InsufficientParticipants { count }
            }
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// One giver and the resolved name of their recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GiftAssignment {
    pub giver_id: ParticipantId,
    pub giver: String,
    /// `None` when no round has run or the recipient was removed since.
    pub recipient: Option<String>,
}

/// Thread-safe roster store over a persistence gateway.
pub struct ParticipantService<R: ParticipantRepository> {
    participants: RwLock<Vec<Participant>>,
    repo: Mutex<R>,
}

impl<R: ParticipantRepository> ParticipantService<R> {
    /// Loads the persisted roster and wraps it in a store.
    pub fn open(repo: R) -> ServiceResult<Self> {
        let participants = repo.load_all().map_err(|err| {
            error!("event=store_open module=service status=error error={err}");
            err
        })?;
        info!(
            "event=store_open module=service status=ok participants={}",
            participants.len()
        );

        Ok(Self {
            participants: RwLock::new(participants),
            repo: Mutex::new(repo),
        })
    }

    /// Adds a participant with a fresh id and returns that id.
    pub fn add(
        &self,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> ServiceResult<ParticipantId> {
        let participant = Participant::new(name, email);
        participant.validate()?;

        let mut live = self.write_roster();
        if live.iter().any(|existing| existing.name_matches(&participant.name)) {
            return Err(ServiceError::DuplicateName(participant.name));
        }

        let id = participant.id;
        let mut next = live.clone();
        next.push(participant);
        self.commit(&mut live, next, "participant_add")?;

        info!("event=participant_add module=service status=ok participant_id={id}");
        Ok(id)
    }

    /// Replaces name and email of participant `id`.
    ///
    /// Keeping one's own name under different casing is allowed.
    pub fn update(
        &self,
        id: ParticipantId,
        new_name: impl Into<String>,
        new_email: impl Into<String>,
    ) -> ServiceResult<()> {
        let new_name = new_name.into();
        let new_email = new_email.into();

        let mut live = self.write_roster();
        let index = live
            .iter()
            .position(|participant| participant.id == id)
            .ok_or(ServiceError::NotFound(id))?;
        validate_name(&new_name)?;
        if live
            .iter()
            .any(|other| other.id != id && other.name_matches(&new_name))
        {
            return Err(ServiceError::DuplicateName(new_name));
        }

        let mut next = live.clone();
        next[index].name = new_name;
        next[index].email = new_email;
        self.commit(&mut live, next, "participant_update")?;

        info!("event=participant_update module=service status=ok participant_id={id}");
        Ok(())
    }

    /// Removes participant `id`. Returns `false` when nobody has that id.
    pub fn remove(&self, id: ParticipantId) -> ServiceResult<bool> {
        let mut live = self.write_roster();
        let Some(index) = live.iter().position(|participant| participant.id == id) else {
            warn!("event=participant_remove module=service status=skipped participant_id={id} reason=not_found");
            return Ok(false);
        };

        let mut next = live.clone();
        next.remove(index);
        let orphaned = next
            .iter()
            .filter(|giver| giver.assigned_recipient_id == Some(id))
            .map(|giver| giver.id.to_string())
            .collect::<Vec<_>>();
        self.commit(&mut live, next, "participant_remove")?;

        if !orphaned.is_empty() {
            warn!(
                "event=participant_remove module=service status=ok participant_id={id} dangling_givers={}",
                orphaned.join(",")
            );
        } else {
            info!("event=participant_remove module=service status=ok participant_id={id}");
        }
        Ok(true)
    }

    /// Removes every participant.
    pub fn remove_all(&self) -> ServiceResult<()> {
        let mut live = self.write_roster();
        let removed = live.len();
        self.commit(&mut live, Vec::new(), "participant_remove_all")?;

        info!("event=participant_remove_all module=service status=ok removed={removed}");
        Ok(())
    }

    /// Returns a copy of the roster in insertion order.
    pub fn list(&self) -> Vec<Participant> {
        self.read_roster().clone()
    }

    /// Returns a copy of one participant.
    pub fn get(&self, id: ParticipantId) -> Option<Participant> {
        self.read_roster()
            .iter()
            .find(|participant| participant.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.read_roster().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_roster().is_empty()
    }

    /// Pairs each giver with the current name of their recipient.
    pub fn assignments(&self) -> Vec<GiftAssignment> {
        let live = self.read_roster();
        live.iter()
            .map(|giver| GiftAssignment {
                giver_id: giver.id,
                giver: giver.name.clone(),
                recipient: giver.assigned_recipient_id.and_then(|recipient_id| {
                    live.iter()
                        .find(|candidate| candidate.id == recipient_id)
                        .map(|recipient| recipient.name.clone())
                }),
            })
            .collect()
    }

    /// Runs one assignment round with the thread-local RNG.
    pub fn assign_gifts(&self) -> ServiceResult<()> {
        self.assign_gifts_with_rng(&mut rand::thread_rng())
    }

    /// Runs one assignment round with a caller-supplied RNG.
    ///
    /// All previous links are overwritten. With fewer than two participants
    /// nothing changes.
    pub fn assign_gifts_with_rng<G: Rng + ?Sized>(&self, rng: &mut G) -> ServiceResult<()> {
        let mut live = self.write_roster();
        let mut next = live.clone();
        assign_recipients(&mut next, rng)?;
        let count = next.len();
        self.commit(&mut live, next, "gift_assign")?;

        info!("event=gift_assign module=service status=ok participants={count}");
        Ok(())
    }

    fn commit(
        &self,
        live: &mut RwLockWriteGuard<'_, Vec<Participant>>,
        next: Vec<Participant>,
        event: &str,
    ) -> ServiceResult<()> {
        let repo = self.repo.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = repo.save_all(&next) {
            error!("event={event} module=service status=error error_code=save_failed error={err}");
            return Err(err.into());
        }
        **live = next;
        Ok(())
    }

    // Published state is only ever replaced wholesale after a successful
    // save, so a poisoned lock still guards a consistent roster.
    fn read_roster(&self) -> RwLockReadGuard<'_, Vec<Participant>> {
        self.participants
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_roster(&self) -> RwLockWriteGuard<'_, Vec<Participant>> {
        self.participants
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
