//! Assignment engine: random derangements over the roster.
//!
//! # Invariants
//! - `derangement(n)` has no fixed points for every `n >= 2`.
//! - Links are derived from a permutation, so giver -> recipient is a bijection.

use crate::model::participant::Participant;
use rand::Rng;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Smallest roster that admits a derangement.
pub const MIN_PARTICIPANTS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentError {
    InsufficientParticipants { count: usize },
}

impl Display for AssignmentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientParticipants { count } => write!(
                f,
                "not enough participants for gift exchange: need at least {MIN_PARTICIPANTS}, have {count}"
            ),
        }
    }
}

impl Error for AssignmentError {}

/// Builds a random permutation of `0..n` with no fixed points.
///
/// Each position `i < n - 1` swaps with a uniformly chosen later position,
/// which always yields a single `n`-cycle. Returns the identity for `n < 2`;
/// callers check the roster size first.
pub fn derangement<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<usize> {
    let mut indices = (0..n).collect::<Vec<_>>();
    for i in 0..n.saturating_sub(1) {
        let j = rng.gen_range(i + 1..n);
        indices.swap(i, j);
    }
    indices
}

/// Overwrites every participant's recipient link with a fresh derangement.
///
/// Leaves `participants` untouched when there are fewer than two of them.
pub fn assign_recipients<R: Rng + ?Sized>(
    participants: &mut [Participant],
    rng: &mut R,
) -> Result<(), AssignmentError> {
    let count = participants.len();
    if count < MIN_PARTICIPANTS {
        return Err(AssignmentError::InsufficientParticipants { count });
    }

    let permutation = derangement(count, rng);
    let recipient_ids = permutation
        .iter()
        .map(|&index| participants[index].id)
        .collect::<Vec<_>>();
    for (participant, recipient_id) in participants.iter_mut().zip(recipient_ids) {
        participant.assigned_recipient_id = Some(recipient_id);
    }

    Ok(())
}
