// src/db/store.rs
// DOCUMENTATION: In-process storage engine for places and the owner index
// PURPOSE: Atomic cross-entity writes plus versioned single-place commits

#[cfg(test)]
use crate::db::OwnerSlot;
use crate::db::UserPlaceIndex;
use crate::errors::PlacesError;
use crate::models::{Place, RatingLedger};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Bounded retry for the owner-link transaction: one retry, exponential backoff.
const COMMIT_RETRY_LIMIT: u32 = 1;
const COMMIT_BACKOFF: Duration = Duration::from_millis(25);

/// Outcome of a versioned single-place commit.
/// `Conflict` means another writer got in between snapshot and commit;
/// `Missing` means the record disappeared (e.g. a delete won the race).
#[derive(Debug, PartialEq, Eq)]
pub enum CommitError {
    Conflict,
    Missing,
}

/// A place record behind its own lock, paired with its optimistic-concurrency
/// version. `deleted` is the tombstone a completed delete leaves for writers
/// that captured the slot before the record vanished from the map.
#[derive(Debug)]
struct PlaceSlot {
    record: Place,
    version: u64,
    deleted: bool,
}

type SharedPlace = Arc<RwLock<PlaceSlot>>;

/// Storage engine owning place records and the user->places index.
/// DOCUMENTATION: Locking is sharded per entity so unrelated places and owners
/// never contend: the outer maps are locked only long enough to find or move a
/// slot, each place record has its own lock and version, and each owner's
/// place set has its own lock. The owner-link transaction holds exactly one
/// owner slot for its whole critical section - concurrent creates/deletes for
/// the same owner queue there, different owners proceed independently, and
/// readers of that owner's places block until both halves of the write have
/// landed, so neither half is ever visible alone. Single-place mutations
/// commit through a version check so stale writers are told to retry instead
/// of silently overwriting.
///
/// Lock order: owner slot, then place record or place map, never both at once.
pub struct PlaceStore {
    places: RwLock<HashMap<Uuid, SharedPlace>>,
    owners: UserPlaceIndex,
    /// Simulated commit failures, armed by the transactional tests.
    commit_faults: AtomicU32,
}

impl PlaceStore {
    pub fn new() -> Self {
        PlaceStore {
            places: RwLock::new(HashMap::new()),
            owners: UserPlaceIndex::new(),
            commit_faults: AtomicU32::new(0),
        }
    }

    /// Register a user record (empty place set). Called from the boundary that
    /// stands in for the external auth subsystem.
    /// Returns false if the user was already registered.
    pub async fn register_user(&self, user_id: Uuid) -> bool {
        let created = self.owners.register(user_id).await;
        if created {
            log::info!("Registered user {}", user_id);
        }
        created
    }

    pub async fn user_exists(&self, user_id: Uuid) -> bool {
        self.owners.contains(user_id).await
    }

    /// Point-in-time snapshot of a place.
    pub async fn get(&self, place_id: Uuid) -> Result<Place, PlacesError> {
        let (place, _) = self.get_versioned(place_id).await?;
        Ok(place)
    }

    /// Snapshot plus the record version, for read-compute-commit callers.
    pub async fn get_versioned(&self, place_id: Uuid) -> Result<(Place, u64), PlacesError> {
        let slot = self.place_slot(place_id).await;
        let slot = slot.ok_or_else(|| PlacesError::NotFound(place_id.to_string()))?;
        let guard = slot.read().await;
        if guard.deleted {
            return Err(PlacesError::NotFound(place_id.to_string()));
        }
        Ok((guard.record.clone(), guard.version))
    }

    /// All places owned by a user, resolved through the reverse index.
    /// Read-committed: an empty vec covers both "unknown user" and "no places".
    pub async fn find_by_owner(&self, owner_id: Uuid) -> Vec<Place> {
        let ids = match self.owners.place_ids(owner_id).await {
            Some(ids) => ids,
            None => return Vec::new(),
        };

        let slots: Vec<SharedPlace> = {
            let map = self.places.read().await;
            ids.iter().filter_map(|id| map.get(id).cloned()).collect()
        };

        let mut places = Vec::new();
        for slot in slots {
            let guard = slot.read().await;
            if !guard.deleted {
                places.push(guard.record.clone());
            }
        }
        places.sort_by_key(|p| p.created_at);
        places
    }

    /// Owned place ids as the index sees them.
    pub async fn owner_place_ids(&self, owner_id: Uuid) -> Option<HashSet<Uuid>> {
        self.owners.place_ids(owner_id).await
    }

    pub async fn place_count(&self) -> usize {
        self.places.read().await.len()
    }

    pub async fn user_count(&self) -> usize {
        self.owners.user_count().await
    }

    /// Insert a place and append its id to the creator's place set as one
    /// atomic unit of work.
    /// DOCUMENTATION: Validates the owner, then applies both writes while
    /// holding the owner's slot - if the commit fails neither write is
    /// visible. A failed commit is retried once with backoff before surfacing
    /// StorageFailure.
    pub async fn create_with_owner_link(&self, place: Place) -> Result<Place, PlacesError> {
        let owner_id = place.creator_id;

        for attempt in 0..=COMMIT_RETRY_LIMIT {
            {
                let owner_slot = match self.owners.slot(owner_id).await {
                    Some(slot) => slot,
                    None => return Err(PlacesError::OwnerNotFound(owner_id)),
                };
                let mut owned = owner_slot.write().await;

                if !self.take_fault() {
                    self.places.write().await.insert(
                        place.id,
                        Arc::new(RwLock::new(PlaceSlot {
                            record: place.clone(),
                            version: 1,
                            deleted: false,
                        })),
                    );
                    owned.insert(place.id);
                    log::info!("Created place {} for owner {}", place.id, owner_id);
                    return Ok(place);
                }
            }

            log::warn!(
                "Commit failed creating place {} (attempt {}), retrying",
                place.id,
                attempt + 1
            );
            self.backoff(attempt).await;
        }

        Err(PlacesError::StorageFailure(format!(
            "could not commit create for place {}",
            place.id
        )))
    }

    /// Remove a place and its id from the owner's place set as one atomic unit
    /// of work. Returns the removed record so the caller can release its image.
    pub async fn delete_with_owner_unlink(
        &self,
        place_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Place, PlacesError> {
        for attempt in 0..=COMMIT_RETRY_LIMIT {
            {
                let owner_slot = match self.owners.slot(owner_id).await {
                    Some(slot) => slot,
                    None => return Err(PlacesError::NotFound(place_id.to_string())),
                };
                let mut owned = owner_slot.write().await;

                let place_slot = self.place_slot(place_id).await;
                let Some(place_slot) = place_slot else {
                    return Err(PlacesError::NotFound(place_id.to_string()));
                };

                if !self.take_fault() {
                    let removed = {
                        let mut slot = place_slot.write().await;
                        if slot.deleted {
                            return Err(PlacesError::NotFound(place_id.to_string()));
                        }
                        slot.deleted = true;
                        slot.record.clone()
                    };
                    self.places.write().await.remove(&place_id);
                    owned.remove(&place_id);
                    log::info!("Deleted place {} of owner {}", place_id, owner_id);
                    return Ok(removed);
                }
            }

            log::warn!(
                "Commit failed deleting place {} (attempt {}), retrying",
                place_id,
                attempt + 1
            );
            self.backoff(attempt).await;
        }

        Err(PlacesError::StorageFailure(format!(
            "could not commit delete for place {}",
            place_id
        )))
    }

    /// Replace the mutable content fields if the version still matches.
    pub async fn update_content(
        &self,
        place_id: Uuid,
        expected_version: u64,
        title: String,
        description: String,
    ) -> Result<Place, CommitError> {
        let slot = self.place_slot(place_id).await.ok_or(CommitError::Missing)?;
        let mut guard = slot.write().await;
        if guard.deleted {
            return Err(CommitError::Missing);
        }
        if guard.version != expected_version {
            return Err(CommitError::Conflict);
        }

        guard.record.title = title;
        guard.record.description = description;
        guard.record.updated_at = Utc::now();
        guard.version += 1;
        Ok(guard.record.clone())
    }

    /// Replace the rating ledger if the version still matches.
    /// DOCUMENTATION: The version check is what turns the aggregator's pure
    /// read-compute into a lost-update-free write: a rater working from a stale
    /// snapshot gets Conflict and re-reads instead of clobbering a parallel
    /// vote, and the tombstone turns a rate racing a completed delete into
    /// Missing rather than a silent write to an unreachable record.
    pub async fn commit_rating(
        &self,
        place_id: Uuid,
        expected_version: u64,
        ledger: RatingLedger,
    ) -> Result<Place, CommitError> {
        let slot = self.place_slot(place_id).await.ok_or(CommitError::Missing)?;
        let mut guard = slot.write().await;
        if guard.deleted {
            return Err(CommitError::Missing);
        }
        if guard.version != expected_version {
            return Err(CommitError::Conflict);
        }

        guard.record.rating = ledger;
        guard.record.updated_at = Utc::now();
        guard.version += 1;
        Ok(guard.record.clone())
    }

    async fn place_slot(&self, place_id: Uuid) -> Option<SharedPlace> {
        self.places.read().await.get(&place_id).cloned()
    }

    /// The owner's serialization point, exposed for callers that need to pin
    /// an owner across assertions.
    #[cfg(test)]
    pub(crate) async fn owner_slot(&self, owner_id: Uuid) -> Option<OwnerSlot> {
        self.owners.slot(owner_id).await
    }

    async fn backoff(&self, attempt: u32) {
        tokio::time::sleep(COMMIT_BACKOFF * 2u32.saturating_pow(attempt)).await;
    }

    fn take_fault(&self) -> bool {
        self.commit_faults
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    /// Arm the next `n` commit attempts to fail, as an injected storage fault.
    #[cfg(test)]
    pub(crate) fn fail_next_commits(&self, n: u32) {
        self.commit_faults.store(n, Ordering::SeqCst);
    }
}

impl Default for PlaceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinates;

    fn sample_place(owner: Uuid) -> Place {
        Place::new(
            "Empire State Building".into(),
            "One of the most famous sky scrapers in the world".into(),
            "20 W 34th St, New York, NY 10001".into(),
            Coordinates { lat: 40.7484, lng: -73.9857 },
            "uploads/images/empire.jpg".into(),
            owner,
        )
    }

    #[tokio::test]
    async fn create_links_place_to_owner() {
        let store = PlaceStore::new();
        let owner = Uuid::new_v4();
        store.register_user(owner).await;

        let place = store.create_with_owner_link(sample_place(owner)).await.unwrap();

        assert_eq!(store.get(place.id).await.unwrap().title, place.title);
        let owned = store.owner_place_ids(owner).await.unwrap();
        assert_eq!(owned, HashSet::from([place.id]));
    }

    #[tokio::test]
    async fn create_rejects_unknown_owner() {
        let store = PlaceStore::new();
        let owner = Uuid::new_v4();

        let err = store.create_with_owner_link(sample_place(owner)).await.unwrap_err();
        assert!(matches!(err, PlacesError::OwnerNotFound(id) if id == owner));
        assert_eq!(store.place_count().await, 0);
    }

    #[tokio::test]
    async fn delete_unlinks_place_from_owner() {
        let store = PlaceStore::new();
        let owner = Uuid::new_v4();
        store.register_user(owner).await;
        let place = store.create_with_owner_link(sample_place(owner)).await.unwrap();

        let removed = store.delete_with_owner_unlink(place.id, owner).await.unwrap();

        assert_eq!(removed.id, place.id);
        assert!(matches!(store.get(place.id).await, Err(PlacesError::NotFound(_))));
        assert!(store.owner_place_ids(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn injected_fault_leaves_no_partial_state() {
        let store = PlaceStore::new();
        let owner = Uuid::new_v4();
        store.register_user(owner).await;
        let place = sample_place(owner);
        let place_id = place.id;

        // Both the first attempt and the retry fail: the whole operation fails
        // and neither entity shows any trace of it.
        store.fail_next_commits(2);
        let err = store.create_with_owner_link(place).await.unwrap_err();

        assert!(matches!(err, PlacesError::StorageFailure(_)));
        assert!(matches!(store.get(place_id).await, Err(PlacesError::NotFound(_))));
        assert!(store.owner_place_ids(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn single_fault_is_absorbed_by_the_retry() {
        let store = PlaceStore::new();
        let owner = Uuid::new_v4();
        store.register_user(owner).await;
        let place = sample_place(owner);
        let place_id = place.id;

        store.fail_next_commits(1);
        store.create_with_owner_link(place).await.unwrap();

        assert!(store.get(place_id).await.is_ok());
        assert!(store.owner_place_ids(owner).await.unwrap().contains(&place_id));
    }

    #[tokio::test]
    async fn delete_fault_keeps_place_and_link_intact() {
        let store = PlaceStore::new();
        let owner = Uuid::new_v4();
        store.register_user(owner).await;
        let place = store.create_with_owner_link(sample_place(owner)).await.unwrap();

        store.fail_next_commits(2);
        let err = store.delete_with_owner_unlink(place.id, owner).await.unwrap_err();

        assert!(matches!(err, PlacesError::StorageFailure(_)));
        assert!(store.get(place.id).await.is_ok());
        assert!(store.owner_place_ids(owner).await.unwrap().contains(&place.id));
    }

    #[tokio::test]
    async fn stale_version_commit_is_rejected() {
        let store = PlaceStore::new();
        let owner = Uuid::new_v4();
        store.register_user(owner).await;
        let place = store.create_with_owner_link(sample_place(owner)).await.unwrap();

        let (snapshot, version) = store.get_versioned(place.id).await.unwrap();

        // A competing writer commits first and bumps the version.
        let mut first = snapshot.rating.clone();
        first.rater_ids.push(Uuid::new_v4());
        first.rater_ratings.push(5);
        first.average = 5.0;
        store.commit_rating(place.id, version, first).await.unwrap();

        // The stale snapshot must now be refused.
        let stale = snapshot.rating.clone();
        let err = store.commit_rating(place.id, version, stale).await.unwrap_err();
        assert_eq!(err, CommitError::Conflict);
    }

    #[tokio::test]
    async fn commit_against_deleted_place_reports_missing() {
        let store = PlaceStore::new();
        let owner = Uuid::new_v4();
        store.register_user(owner).await;
        let place = store.create_with_owner_link(sample_place(owner)).await.unwrap();
        let (_, version) = store.get_versioned(place.id).await.unwrap();

        store.delete_with_owner_unlink(place.id, owner).await.unwrap();

        let err = store
            .commit_rating(place.id, version, RatingLedger::default())
            .await
            .unwrap_err();
        assert_eq!(err, CommitError::Missing);
    }

    #[tokio::test]
    async fn unrelated_owners_do_not_contend() {
        let store = PlaceStore::new();
        let owner_a = Uuid::new_v4();
        let owner_b = Uuid::new_v4();
        store.register_user(owner_a).await;
        store.register_user(owner_b).await;

        // Pin owner A's slot the way an in-flight transaction would; a write
        // for owner B must still go through.
        let slot_a = store.owner_slot(owner_a).await.unwrap();
        let held = slot_a.write().await;

        let place_b = store.create_with_owner_link(sample_place(owner_b)).await.unwrap();
        assert!(store.get(place_b.id).await.is_ok());

        drop(held);
        let place_a = store.create_with_owner_link(sample_place(owner_a)).await.unwrap();
        assert!(store.get(place_a.id).await.is_ok());
    }

    #[tokio::test]
    async fn forward_and_reverse_references_always_agree() {
        let store = PlaceStore::new();
        let owner_a = Uuid::new_v4();
        let owner_b = Uuid::new_v4();
        store.register_user(owner_a).await;
        store.register_user(owner_b).await;

        let a1 = store.create_with_owner_link(sample_place(owner_a)).await.unwrap();
        let a2 = store.create_with_owner_link(sample_place(owner_a)).await.unwrap();
        let b1 = store.create_with_owner_link(sample_place(owner_b)).await.unwrap();
        store.delete_with_owner_unlink(a1.id, owner_a).await.unwrap();

        for owner in [owner_a, owner_b] {
            let forward: HashSet<Uuid> = store
                .find_by_owner(owner)
                .await
                .iter()
                .map(|p| p.id)
                .collect();
            let reverse = store.owner_place_ids(owner).await.unwrap();
            assert_eq!(forward, reverse);
        }
        assert_eq!(
            store.owner_place_ids(owner_a).await.unwrap(),
            HashSet::from([a2.id])
        );
        assert_eq!(
            store.owner_place_ids(owner_b).await.unwrap(),
            HashSet::from([b1.id])
        );
    }
}
