//! Per-visit result cache: artifact id → single-assignment transform outcome.
//!
//! Discovery threads race on [`ResultCache::reserve`]; exactly one of them gets the
//! [`OutcomeSlot`] back and is then responsible for filling it (success or failure).
//! Everyone else sees the reservation and schedules nothing.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use log::warn;
use std::sync::{Arc, OnceLock};

use crate::ArtifactId;
use crate::error::SetError;
use crate::transform::TransformationOutcome;

/// Write-once cell for one artifact's outcome.
#[derive(Debug, Default)]
pub struct OutcomeSlot {
    outcome: OnceLock<TransformationOutcome>,
}

impl OutcomeSlot {
    /// Fill the slot. Only the reserving thread calls this; a second write is ignored and logged.
    pub fn complete(&self, outcome: TransformationOutcome) {
        if self.outcome.set(outcome).is_err() {
            warn!("outcome slot completed twice; keeping the first outcome");
        }
    }

    pub fn get(&self) -> Option<&TransformationOutcome> {
        self.outcome.get()
    }

    pub fn is_complete(&self) -> bool {
        self.outcome.get().is_some()
    }
}

/// Concurrent map from artifact identity to its outcome slot.
#[derive(Debug, Default)]
pub struct ResultCache {
    slots: DashMap<ArtifactId, Arc<OutcomeSlot>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically reserve the slot for `id`. Returns the slot only to the first caller.
    pub fn reserve(&self, id: &ArtifactId) -> Option<Arc<OutcomeSlot>> {
        match self.slots.entry(id.clone()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(v) => {
                let slot = Arc::new(OutcomeSlot::default());
                v.insert(Arc::clone(&slot));
                Some(slot)
            }
        }
    }

    /// True if `id` has been reserved (whether or not its outcome is in yet).
    pub fn contains(&self, id: &ArtifactId) -> bool {
        self.slots.contains_key(id)
    }

    /// Outcome for `id` after the queue drained.
    ///
    /// A reserved-but-empty slot means the caller replayed too early; an unknown id means
    /// the artifact was never announced during the visit. Both are contract violations.
    pub fn outcome(&self, id: &ArtifactId) -> Result<TransformationOutcome, SetError> {
        let slot = self
            .slots
            .get(id)
            .map(|s| Arc::clone(s.value()))
            .ok_or_else(|| SetError::MissingOutcome {
                artifact: id.clone(),
            })?;
        slot.get().cloned().ok_or_else(|| SetError::ReplayBeforeDrain {
            artifact: id.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
