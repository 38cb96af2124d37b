//! crates/flashcards_core/src/curation.rs
//!
//! Persists curated flashcards and keeps each generation's acceptance counters in step
//! with the batches that reference it.

use crate::domain::{
    Flashcard, FlashcardChanges, FlashcardId, FlashcardPatch, FlashcardQuery, FlashcardSource,
    GenerationId, NewFlashcard, Page,
};
use crate::error::{CoreError, CoreResult};
use crate::ports::DatabaseService;
use crate::validation::{check_source_link, validate_batch, validate_patch};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Per-generation increments produced by one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcceptanceDelta {
    pub unedited: i32,
    pub edited: i32,
}

/// Groups AI-sourced cards by generation and counts them by source.
/// Manual cards contribute nothing.
pub fn tally_acceptance(cards: &[NewFlashcard]) -> BTreeMap<GenerationId, AcceptanceDelta> {
    let mut tally: BTreeMap<GenerationId, AcceptanceDelta> = BTreeMap::new();
    for card in cards {
        let Some(generation_id) = card.generation_id else {
            continue;
        };
        let delta = tally.entry(generation_id).or_default();
        match card.source {
            FlashcardSource::AiFull => delta.unedited += 1,
            FlashcardSource::AiEdited => delta.edited += 1,
            FlashcardSource::Manual => {}
        }
    }
    tally
}

/// Resolves the column values an update writes, applying the edit relabelling rule:
/// changing the content of an `ai-full` card turns it into `ai-edited`.
pub fn merge_patch(existing: &Flashcard, patch: &FlashcardPatch) -> FlashcardChanges {
    let front = patch.front.clone().unwrap_or_else(|| existing.front.clone());
    let back = patch.back.clone().unwrap_or_else(|| existing.back.clone());
    let content_changed = front != existing.front || back != existing.back;

    let mut source = patch.source.unwrap_or(existing.source);
    if source == FlashcardSource::AiFull && content_changed {
        source = FlashcardSource::AiEdited;
    }

    let generation_id = match patch.generation_id {
        Some(value) => value,
        None if source == FlashcardSource::Manual => None,
        None => existing.generation_id,
    };

    FlashcardChanges {
        front,
        back,
        source,
        generation_id,
    }
}

#[derive(Clone)]
pub struct CurationEngine {
    db: Arc<dyn DatabaseService>,
}

impl CurationEngine {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    /// Fails with `ReferentialIntegrity` unless every id exists and belongs to `user_id`.
    async fn ensure_generations_exist(
        &self,
        user_id: Uuid,
        ids: BTreeSet<GenerationId>,
    ) -> CoreResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let wanted: Vec<GenerationId> = ids.into_iter().collect();
        let found: BTreeSet<GenerationId> = self
            .db
            .existing_generation_ids(user_id, &wanted)
            .await?
            .into_iter()
            .collect();
        let missing: Vec<GenerationId> = wanted
            .into_iter()
            .filter(|id| !found.contains(id))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CoreError::ReferentialIntegrity { missing })
        }
    }

    /// Validates and inserts a batch, then bumps the acceptance counters of every
    /// referenced generation. Nothing is inserted if any item is invalid. Counter
    /// failures after a successful insert are logged, not returned.
    pub async fn create_batch(
        &self,
        user_id: Uuid,
        items: &[NewFlashcard],
    ) -> CoreResult<Vec<Flashcard>> {
        let cards = validate_batch(items)?;

        let referenced = cards.iter().filter_map(|c| c.generation_id).collect();
        self.ensure_generations_exist(user_id, referenced).await?;

        let created = self.db.insert_flashcards(user_id, &cards).await?;

        // The rows are stored at this point; a counter failure must not turn the batch
        // into an error the client would retry. Each increment is a single statement, so
        // concurrent batches cannot lose updates.
        for (generation_id, delta) in tally_acceptance(&cards) {
            if delta == AcceptanceDelta::default() {
                continue;
            }
            match self
                .db
                .increment_acceptance_counts(generation_id, delta.unedited, delta.edited)
                .await
            {
                Ok(()) => debug!(
                    generation_id,
                    unedited = delta.unedited,
                    edited = delta.edited,
                    "Acceptance counters incremented."
                ),
                Err(e) => warn!(
                    generation_id,
                    unedited = delta.unedited,
                    edited = delta.edited,
                    "Failed to update acceptance counters: {:?}",
                    e
                ),
            }
        }

        info!(count = created.len(), "Flashcards created.");
        Ok(created)
    }

    pub async fn get(&self, user_id: Uuid, id: FlashcardId) -> CoreResult<Flashcard> {
        self.db
            .get_flashcard(user_id, id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Applies a partial update. Acceptance counters are not revisited.
    pub async fn update(
        &self,
        user_id: Uuid,
        id: FlashcardId,
        patch: &FlashcardPatch,
    ) -> CoreResult<Flashcard> {
        let patch = validate_patch(patch)?;
        let existing = self.get(user_id, id).await?;
        let changes = merge_patch(&existing, &patch);
        check_source_link(changes.source, changes.generation_id)?;

        if let Some(generation_id) = changes.generation_id {
            if Some(generation_id) != existing.generation_id {
                self.ensure_generations_exist(user_id, BTreeSet::from([generation_id]))
                    .await?;
            }
        }

        self.db
            .update_flashcard(user_id, id, &changes)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Removes the card if the caller owns it. Counters keep their historical values.
    pub async fn delete(&self, user_id: Uuid, id: FlashcardId) -> CoreResult<bool> {
        Ok(self.db.delete_flashcard(user_id, id).await?)
    }

    pub async fn list(&self, user_id: Uuid, query: &FlashcardQuery) -> CoreResult<Page<Flashcard>> {
        Ok(self.db.list_flashcards(user_id, query).await?)
    }
}

fn not_found(id: FlashcardId) -> CoreError {
    CoreError::NotFound(format!("Flashcard {} not found", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn new_card(source: FlashcardSource, generation_id: Option<GenerationId>) -> NewFlashcard {
        NewFlashcard {
            front: "Q".to_string(),
            back: "A".to_string(),
            source,
            generation_id,
        }
    }

    fn stored(source: FlashcardSource, generation_id: Option<GenerationId>) -> Flashcard {
        Flashcard {
            id: 1,
            user_id: Uuid::nil(),
            front: "Front".to_string(),
            back: "Back".to_string(),
            source,
            generation_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn tally_groups_by_generation_and_source() {
        let cards = vec![
            new_card(FlashcardSource::AiFull, Some(1)),
            new_card(FlashcardSource::AiFull, Some(1)),
            new_card(FlashcardSource::AiEdited, Some(1)),
            new_card(FlashcardSource::AiEdited, Some(2)),
            new_card(FlashcardSource::Manual, None),
        ];
        let tally = tally_acceptance(&cards);
        assert_eq!(tally.len(), 2);
        assert_eq!(tally[&1], AcceptanceDelta { unedited: 2, edited: 1 });
        assert_eq!(tally[&2], AcceptanceDelta { unedited: 0, edited: 1 });
    }

    #[test]
    fn editing_ai_full_content_relabels_it() {
        let card = stored(FlashcardSource::AiFull, Some(7));
        let patch = FlashcardPatch {
            back: Some("Better back".to_string()),
            ..Default::default()
        };
        let changes = merge_patch(&card, &patch);
        assert_eq!(changes.source, FlashcardSource::AiEdited);
        assert_eq!(changes.generation_id, Some(7));
        assert_eq!(changes.front, "Front");
    }

    #[test]
    fn unchanged_content_keeps_ai_full() {
        let card = stored(FlashcardSource::AiFull, Some(7));
        let patch = FlashcardPatch {
            front: Some("Front".to_string()),
            ..Default::default()
        };
        assert_eq!(merge_patch(&card, &patch).source, FlashcardSource::AiFull);
    }

    #[test]
    fn switching_to_manual_drops_the_generation_link() {
        let card = stored(FlashcardSource::AiEdited, Some(7));
        let patch = FlashcardPatch {
            source: Some(FlashcardSource::Manual),
            ..Default::default()
        };
        let changes = merge_patch(&card, &patch);
        assert_eq!(changes.source, FlashcardSource::Manual);
        assert_eq!(changes.generation_id, None);
    }
}
