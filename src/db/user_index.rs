// src/db/user_index.rs
// DOCUMENTATION: Reverse mapping User -> set of owned Place ids
// PURPOSE: Per-owner serialization point for the ownership relation

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// One owner's place set behind its own lock. Writers to the same owner queue
/// on this slot; unrelated owners never contend.
pub type OwnerSlot = Arc<RwLock<HashSet<Uuid>>>;

/// Reverse index from users to the places they created.
/// DOCUMENTATION: The outer map is locked only long enough to find a slot.
/// Linking and unlinking go through the slot lock, which the store holds for
/// the whole cross-entity critical section - that is what keeps the forward
/// reference (Place.creator_id) and this index moving together. An entry
/// existing at all is what "the user exists" means to this service; user
/// lifecycle itself belongs to the auth subsystem.
#[derive(Debug, Default)]
pub struct UserPlaceIndex {
    entries: RwLock<HashMap<Uuid, OwnerSlot>>,
}

impl UserPlaceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user with an empty place set.
    /// Returns false if the user was already known.
    pub async fn register(&self, user_id: Uuid) -> bool {
        let mut entries = self.entries.write().await;
        match entries.entry(user_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(RwLock::new(HashSet::new())));
                true
            }
        }
    }

    pub async fn contains(&self, user_id: Uuid) -> bool {
        self.entries.read().await.contains_key(&user_id)
    }

    /// The owner's slot, for callers that need to hold the per-owner lock
    /// across a multi-step write. None for an unknown user.
    pub async fn slot(&self, user_id: Uuid) -> Option<OwnerSlot> {
        self.entries.read().await.get(&user_id).cloned()
    }

    /// Snapshot of the place ids owned by a user, or None for an unknown user.
    pub async fn place_ids(&self, user_id: Uuid) -> Option<HashSet<Uuid>> {
        let slot = self.entries.read().await.get(&user_id).cloned()?;
        let ids = slot.read().await.clone();
        Some(ids)
    }

    pub async fn user_count(&self) -> usize {
        self.entries.read().await.len()
    }
}
