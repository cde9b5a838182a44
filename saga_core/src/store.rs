//! Orphan cleanup against the host's trait persistence

use crate::types::{CharacterId, TraitId};
use thiserror::Error;

/// Errors reported by a trait store
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Trait not found: {0}")]
    NotFound(TraitId),
    #[error("Store error: {0}")]
    Backend(String),
}

/// Host-side persistence for trait documents
pub trait TraitStore {
    fn delete_trait(&mut self, character: &CharacterId, id: &TraitId) -> Result<(), StoreError>;
}

/// Ask the store to delete orphaned traits
///
/// Failures are logged and never returned: the derived block is already
/// correct without the orphans. Returns how many deletions succeeded.
pub fn cleanup_orphans(store: &mut dyn TraitStore, character: &CharacterId, orphans: &[TraitId]) -> usize {
    let mut deleted = 0;
    for id in orphans {
        match store.delete_trait(character, id) {
            Ok(()) => deleted += 1,
            // Someone else got there first
            Err(StoreError::NotFound(_)) => {
                tracing::debug!(character = %character, trait_id = %id, "orphan already deleted");
            }
            Err(e) => {
                tracing::warn!(character = %character, trait_id = %id, error = %e, "failed to delete orphaned trait");
            }
        }
    }
    if deleted > 0 {
        tracing::info!(character = %character, deleted, "removed orphaned traits");
    }
    deleted
}
