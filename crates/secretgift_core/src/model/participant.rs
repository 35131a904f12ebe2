//! Participant domain model.
//!
//! # Responsibility
//! - Define the canonical participant record and its stored shape.
//! - Provide the case-insensitive name comparison behind roster uniqueness.
//!
//! # Invariants
//! - `id` is generated once and never reassigned.
//! - `name` is non-empty after trimming.
//! - `assigned_recipient_id` is `None` until an assignment round runs.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a participant.
pub type ParticipantId = Uuid;

/// Validation error for participant fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticipantValidationError {
    /// Name is empty or whitespace only.
    EmptyName,
}

impl Display for ParticipantValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "participant name cannot be empty"),
        }
    }
}

impl Error for ParticipantValidationError {}

/// One member of the gift exchange.
///
/// Field names serialize in PascalCase so JSON rosters keep the
/// `Id`/`Name`/`Email`/`AssignedRecipientId` layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Participant {
    pub id: ParticipantId,
    /// Display name, unique under case-insensitive comparison.
    pub name: String,
    /// Contact address. Not validated.
    pub email: String,
    /// Who this participant gives a gift to. The nil UUID on the wire means
    /// no assignment.
    #[serde(default, with = "nil_as_none")]
    pub assigned_recipient_id: Option<ParticipantId>,
}

impl Participant {
    /// Creates a participant with a freshly generated id and no recipient.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name, email)
    }

    /// Creates a participant with a caller-provided id.
    ///
    /// Used by storage and import paths where identity already exists.
    pub fn with_id(id: ParticipantId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            assigned_recipient_id: None,
        }
    }

    /// Checks field-level invariants.
    pub fn validate(&self) -> Result<(), ParticipantValidationError> {
        validate_name(&self.name)
    }

    /// Returns whether `other` names the same person under case-insensitive
    /// comparison.
    pub fn name_matches(&self, other: &str) -> bool {
        names_equal(&self.name, other)
    }

    /// Returns whether an assignment round has set a recipient.
    pub fn has_recipient(&self) -> bool {
        self.assigned_recipient_id.is_some()
    }
}

/// Rejects names that are empty after trimming.
pub fn validate_name(name: &str) -> Result<(), ParticipantValidationError> {
    if name.trim().is_empty() {
        return Err(ParticipantValidationError::EmptyName);
    }
    Ok(())
}

/// Case-insensitive name equality using Unicode lowercase folding.
pub fn names_equal(left: &str, right: &str) -> bool {
    if left.eq_ignore_ascii_case(right) {
        return true;
    }
    left.to_lowercase() == right.to_lowercase()
}

mod nil_as_none {
    use serde::{Deserialize, Deserializer, Serializer};
    use uuid::Uuid;

    pub fn serialize<S>(value: &Option<Uuid>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&value.unwrap_or_else(Uuid::nil))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Uuid>::deserialize(deserializer)?;
        Ok(value.filter(|id| !id.is_nil()))
    }
}

#[cfg(test)]
mod tests {
    use super::{names_equal, Participant, ParticipantValidationError};
    use uuid::Uuid;

    #[test]
    fn names_compare_case_insensitively() {
        assert!(names_equal("Alice", "alice"));
        assert!(names_equal("ÉLODIE", "élodie"));
        assert!(!names_equal("Alice", "Alicia"));
    }

    #[test]
    fn blank_name_is_rejected() {
        let participant = Participant::new("   ", "x@example.com");
        assert_eq!(
            participant.validate(),
            Err(ParticipantValidationError::EmptyName)
        );
    }

    #[test]
    fn nil_recipient_on_the_wire_reads_as_none() {
        let json = r#"{
            "Id": "11111111-2222-4333-8444-555555555555",
            "Name": "Bob",
            "Email": "b@x.com",
            "AssignedRecipientId": "00000000-0000-0000-0000-000000000000"
        }"#;
        let participant: Participant = serde_json::from_str(json).unwrap();
        assert_eq!(participant.assigned_recipient_id, None);
    }

    #[test]
    fn missing_recipient_serializes_as_nil() {
        let id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
        let participant = Participant::with_id(id, "Bob", "b@x.com");
        let json = serde_json::to_value(&participant).unwrap();
        assert_eq!(json["Id"], "11111111-2222-4333-8444-555555555555");
        assert_eq!(
            json["AssignedRecipientId"],
            "00000000-0000-0000-0000-000000000000"
        );
    }
}
