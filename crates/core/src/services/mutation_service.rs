use std::collections::HashSet;
use std::sync::Mutex;

use crate::errors::CoreError;
use crate::models::enriched::EnrichedRecord;

/// A removal that has been applied locally but not yet settled with the
/// server. Owns the snapshot needed to roll the collection back.
///
/// Exactly one of [`MutationService::confirm`] or
/// [`MutationService::roll_back`] must consume the token; discarding it
/// without settling would leave the target id locked.
#[derive(Debug)]
pub struct AppliedMutation {
    target_id: String,
    snapshot: Vec<EnrichedRecord>,
}

impl AppliedMutation {
    /// Stock id this removal targets.
    pub fn target_id(&self) -> &str {
        &self.target_id
    }
}

/// Optimistic removal controller.
///
/// Applies a removal to the local collection immediately, remembering
/// the exact prior state. Remote confirmation discards the snapshot;
/// remote failure restores it as captured, without re-fetching. At most
/// one mutation may be in flight per target id; distinct ids proceed
/// independently with independent snapshots.
pub struct MutationService {
    in_flight: Mutex<HashSet<String>>,
}

impl MutationService {
    pub fn new() -> Self {
        Self {
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Snapshot the collection and remove every record for `target_id`.
    ///
    /// Rejects the call with [`CoreError::MutationInProgress`] when a
    /// mutation for the same id is applied but not yet settled.
    pub fn apply_removal(
        &self,
        records: &mut Vec<EnrichedRecord>,
        target_id: &str,
    ) -> Result<AppliedMutation, CoreError> {
        {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
            if !in_flight.insert(target_id.to_string()) {
                return Err(CoreError::MutationInProgress {
                    target_id: target_id.to_string(),
                });
            }
        }

        let snapshot = records.clone();
        records.retain(|r| r.stock_id() != target_id);

        Ok(AppliedMutation {
            target_id: target_id.to_string(),
            snapshot,
        })
    }

    /// The server accepted the removal: drop the snapshot and release
    /// the target id.
    pub fn confirm(&self, applied: AppliedMutation) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        in_flight.remove(&applied.target_id);
    }

    /// The server rejected the removal: restore the exact pre-mutation
    /// collection and release the target id.
    pub fn roll_back(&self, applied: AppliedMutation, records: &mut Vec<EnrichedRecord>) {
        let AppliedMutation {
            target_id,
            snapshot,
        } = applied;
        log::warn!("Removal of {target_id} failed remotely, restoring prior state");
        *records = snapshot;
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        in_flight.remove(&target_id);
    }

    /// Number of mutations currently applied but not settled.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

impl Default for MutationService {
    fn default() -> Self {
        Self::new()
    }
}
