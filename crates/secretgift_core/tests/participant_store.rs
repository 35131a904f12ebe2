use proptest::prelude::*;
use secretgift_core::model::participant::names_equal;
use secretgift_core::{
    Participant, ParticipantRepository, ParticipantService, ParticipantValidationError,
    RepoError, RepoResult, ServiceError, SqliteParticipantRepository,
};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use uuid::Uuid;

/// In-memory repository that records the last saved roster and can be told
/// to fail writes.
#[derive(Clone, Default)]
struct RecordingRepository {
    saved: Arc<Mutex<Vec<Participant>>>,
    saves: Arc<Mutex<usize>>,
    fail_writes: Arc<AtomicBool>,
}

impl RecordingRepository {
    fn saved(&self) -> Vec<Participant> {
        self.saved.lock().unwrap().clone()
    }

    fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

impl ParticipantRepository for RecordingRepository {
    fn load_all(&self) -> RepoResult<Vec<Participant>> {
        Ok(self.saved())
    }

    fn save_all(&self, participants: &[Participant]) -> RepoResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepoError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "storage is read-only",
            )));
        }
        *self.saved.lock().unwrap() = participants.to_vec();
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}

fn sqlite_store() -> ParticipantService<SqliteParticipantRepository> {
    ParticipantService::open(SqliteParticipantRepository::in_memory().unwrap()).unwrap()
}

#[test]
fn add_then_list_keeps_insertion_order() {
    let store = sqlite_store();
    store.add("Alice", "a@x.com").unwrap();
    store.add("Bob", "b@x.com").unwrap();

    let participants = store.list();
    assert_eq!(participants.len(), 2);
    assert_eq!(participants[0].name, "Alice");
    assert_eq!(participants[1].name, "Bob");
    assert!(participants.iter().all(|p| p.assigned_recipient_id.is_none()));
}

#[test]
fn add_rejects_name_that_differs_only_in_case() {
    let store = sqlite_store();
    store.add("Alice", "a@x.com").unwrap();
    store.add("Bob", "b@x.com").unwrap();

    let err = store.add("alice", "other@x.com").unwrap_err();
    assert!(matches!(err, ServiceError::DuplicateName(ref name) if name == "alice"));
    assert_eq!(
        err.to_string(),
        "A participant with the name 'alice' already exists."
    );
    assert_eq!(store.len(), 2);
}

#[test]
fn add_rejects_blank_name() {
    let store = sqlite_store();
    let err = store.add("  ", "a@x.com").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ParticipantValidationError::EmptyName)
    ));
    assert!(store.is_empty());
}

#[test]
fn add_returns_the_generated_id() {
    let store = sqlite_store();
    let id = store.add("Alice", "a@x.com").unwrap();

    let stored = store.get(id).unwrap();
    assert_eq!(stored.name, "Alice");
    assert!(!id.is_nil());
}

#[test]
fn update_changes_name_and_email() {
    let store = sqlite_store();
    let id = store.add("John Doe", "john@x.com").unwrap();

    store.update(id, "Jane Doe", "jane@x.com").unwrap();

    let updated = store.get(id).unwrap();
    assert_eq!(updated.name, "Jane Doe");
    assert_eq!(updated.email, "jane@x.com");
}

#[test]
fn update_to_name_of_another_participant_fails() {
    let store = sqlite_store();
    store.add("Alice", "a@x.com").unwrap();
    let bob = store.add("Bob", "b@x.com").unwrap();

    let err = store.update(bob, "ALICE", "b@x.com").unwrap_err();
    assert!(matches!(err, ServiceError::DuplicateName(_)));
    assert_eq!(store.get(bob).unwrap().name, "Bob");
}

#[test]
fn update_to_own_name_succeeds() {
    let store = sqlite_store();
    let alice = store.add("Alice", "a@x.com").unwrap();

    store.update(alice, "Alice", "new@x.com").unwrap();
    store.update(alice, "alice", "new@x.com").unwrap();

    assert_eq!(store.get(alice).unwrap().name, "alice");
}

#[test]
fn update_unknown_id_is_not_found() {
    let store = sqlite_store();
    store.add("Alice", "a@x.com").unwrap();
    let missing = Uuid::new_v4();

    let err = store.update(missing, "Bob", "b@x.com").unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(id) if id == missing));
    assert!(!err.is_client_error());
}

#[test]
fn remove_deletes_participant() {
    let store = sqlite_store();
    let id = store.add("John Doe", "john@x.com").unwrap();

    assert!(store.remove(id).unwrap());
    assert!(store.get(id).is_none());
    assert!(store.is_empty());
}

#[test]
fn remove_unknown_id_is_a_no_op() {
    let repo = RecordingRepository::default();
    let store = ParticipantService::open(repo.clone()).unwrap();
    store.add("Alice", "a@x.com").unwrap();
    let saves_before = repo.save_count();

    assert!(!store.remove(Uuid::new_v4()).unwrap());
    assert_eq!(store.len(), 1);
    assert_eq!(repo.save_count(), saves_before);
}

#[test]
fn remove_leaves_links_to_the_removed_recipient_dangling() {
    let store = sqlite_store();
    let alice = store.add("Alice", "a@x.com").unwrap();
    let bob = store.add("Bob", "b@x.com").unwrap();
    store.add("Carol", "c@x.com").unwrap();
    store.assign_gifts().unwrap();

    let giver_of_bob = store
        .list()
        .into_iter()
        .find(|p| p.assigned_recipient_id == Some(bob))
        .unwrap();
    store.remove(bob).unwrap();

    let giver = store.get(giver_of_bob.id).unwrap();
    assert_eq!(giver.assigned_recipient_id, Some(bob));

    let assignments = store.assignments();
    let view = assignments
        .iter()
        .find(|assignment| assignment.giver_id == giver.id)
        .unwrap();
    assert_eq!(view.recipient, None);
    assert!(assignments.iter().any(|a| a.giver_id == alice));
}

#[test]
fn remove_all_clears_roster_and_storage() {
    let repo = RecordingRepository::default();
    let store = ParticipantService::open(repo.clone()).unwrap();
    store.add("Alice", "a@x.com").unwrap();
    store.add("Bob", "b@x.com").unwrap();

    store.remove_all().unwrap();

    assert!(store.is_empty());
    assert!(repo.saved().is_empty());
}

#[test]
fn list_is_idempotent_and_detached_from_store() {
    let store = sqlite_store();
    store.add("Alice", "a@x.com").unwrap();
    store.add("Bob", "b@x.com").unwrap();

    let mut first = store.list();
    let second = store.list();
    assert_eq!(first, second);

    first[0].name = "Mallory".to_string();
    first.clear();
    assert_eq!(store.list(), second);
}

#[test]
fn every_mutation_is_persisted_before_returning() {
    let repo = RecordingRepository::default();
    let store = ParticipantService::open(repo.clone()).unwrap();

    let alice = store.add("Alice", "a@x.com").unwrap();
    assert_eq!(repo.saved(), store.list());

    store.add("Bob", "b@x.com").unwrap();
    store.update(alice, "Alicia", "a@x.com").unwrap();
    assert_eq!(repo.saved(), store.list());

    store.assign_gifts().unwrap();
    assert_eq!(repo.saved(), store.list());

    store.remove(alice).unwrap();
    assert_eq!(repo.saved(), store.list());
}

#[test]
fn failed_save_leaves_memory_at_last_durable_state() {
    let repo = RecordingRepository::default();
    let store = ParticipantService::open(repo.clone()).unwrap();
    let alice = store.add("Alice", "a@x.com").unwrap();
    store.add("Bob", "b@x.com").unwrap();
    let durable = store.list();

    repo.fail_writes.store(true, Ordering::SeqCst);

    assert!(matches!(
        store.add("Carol", "c@x.com"),
        Err(ServiceError::Repo(_))
    ));
    assert!(matches!(
        store.update(alice, "Alicia", "x@x.com"),
        Err(ServiceError::Repo(_))
    ));
    assert!(matches!(store.remove(alice), Err(ServiceError::Repo(_))));
    assert!(matches!(store.assign_gifts(), Err(ServiceError::Repo(_))));
    assert!(matches!(store.remove_all(), Err(ServiceError::Repo(_))));

    assert_eq!(store.list(), durable);
    assert_eq!(repo.saved(), durable);
}

#[test]
fn validation_errors_never_reach_storage() {
    let repo = RecordingRepository::default();
    let store = ParticipantService::open(repo.clone()).unwrap();
    store.add("Alice", "a@x.com").unwrap();
    let saves_before = repo.save_count();

    assert!(store.add("ALICE", "a@x.com").is_err());
    assert!(store.update(Uuid::new_v4(), "Bob", "b@x.com").is_err());
    assert!(store.assign_gifts().is_err());

    assert_eq!(repo.save_count(), saves_before);
}

#[test]
fn concurrent_adds_of_the_same_name_admit_exactly_one() {
    let store = Arc::new(sqlite_store());

    let handles = (0..8)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let name = if worker % 2 == 0 { "Dana" } else { "DANA" };
                store.add(name, format!("{worker}@x.com")).is_ok()
            })
        })
        .collect::<Vec<_>>();

    let admitted = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert_eq!(admitted, 1);
    assert_eq!(store.len(), 1);
}

#[test]
fn concurrent_distinct_adds_all_land() {
    let store = Arc::new(sqlite_store());

    let handles = (0..16)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                store
                    .add(format!("Person {worker}"), format!("{worker}@x.com"))
                    .unwrap();
            })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len(), 16);
    assert!(store.list().iter().any(|p| p.name == "Person 7"));
}

proptest! {
    #[test]
    fn names_stay_unique_under_any_add_update_sequence(
        ops in prop::collection::vec((any::<bool>(), 0usize..6, 0usize..8), 1..40)
    ) {
        const POOL: [&str; 6] = ["Ann", "ann", "ANN", "Ben", "bEn", "Cy"];
        let store = sqlite_store();

        for (is_add, name_index, target) in ops {
            let name = POOL[name_index];
            if is_add || store.is_empty() {
                let _ = store.add(name, "p@x.com");
            } else {
                let participants = store.list();
                let id = participants[target % participants.len()].id;
                let _ = store.update(id, name, "p@x.com");
            }

            let participants = store.list();
            for (i, left) in participants.iter().enumerate() {
                for right in &participants[i + 1..] {
                    prop_assert!(!names_equal(&left.name, &right.name));
                }
            }
        }
    }
}
