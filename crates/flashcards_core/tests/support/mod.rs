//! In-memory implementations of the core ports for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use flashcards_core::{
    AuthSession, CompletionRequest, CompletionService, DatabaseService, Flashcard,
    FlashcardChanges, FlashcardId, FlashcardQuery, Generation, GenerationId, NewFlashcard,
    NewGeneration, NewGenerationErrorLog, Page, PageRequest, PortError, PortResult,
    ProviderError, SortField, SortOrder, User, UserCredentials,
};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
pub struct State {
    pub users: HashMap<String, UserCredentials>,
    pub auth_sessions: HashMap<String, AuthSession>,
    pub generations: Vec<Generation>,
    pub flashcards: Vec<Flashcard>,
    pub error_logs: Vec<NewGenerationErrorLog>,
    pub existence_queries: usize,
    next_id: i64,
    clock: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Strictly increasing timestamps so ordering by creation time is deterministic.
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        Utc.timestamp_opt(self.clock, 0).unwrap()
    }
}

#[derive(Default)]
pub struct InMemoryDb {
    pub state: Mutex<State>,
    pub fail_flashcard_inserts: bool,
    pub fail_error_log: bool,
    pub fail_generation_insert: bool,
    pub fail_increments: bool,
}

impl InMemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_generation(&self, user_id: Uuid, generated_count: i32) -> GenerationId {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let now = state.tick();
        state.generations.push(Generation {
            id,
            user_id,
            model: "test-model".to_string(),
            generated_count,
            accepted_unedited_count: None,
            accepted_edited_count: None,
            source_text_hash: "hash".to_string(),
            source_text_length: 1000,
            generation_duration: Some(10),
            created_at: now,
            updated_at: now,
        });
        id
    }

    pub fn generation(&self, id: GenerationId) -> Generation {
        let state = self.state.lock().unwrap();
        state
            .generations
            .iter()
            .find(|g| g.id == id)
            .cloned()
            .expect("generation exists")
    }

    pub fn flashcard_count(&self) -> usize {
        self.state.lock().unwrap().flashcards.len()
    }

    pub fn generation_count(&self) -> usize {
        self.state.lock().unwrap().generations.len()
    }

    pub fn error_logs(&self) -> Vec<NewGenerationErrorLog> {
        self.state.lock().unwrap().error_logs.clone()
    }
}

fn compare(a: &Flashcard, b: &Flashcard, sort: SortField) -> std::cmp::Ordering {
    match sort {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::Front => a.front.cmp(&b.front),
        SortField::Back => a.back.cmp(&b.back),
    }
}

fn window<T: Clone>(rows: &[T], window: PageRequest) -> Vec<T> {
    rows.iter()
        .skip(window.offset() as usize)
        .take(window.limit as usize)
        .cloned()
        .collect()
}

#[async_trait]
impl DatabaseService for InMemoryDb {
    async fn create_user_with_email(&self, email: &str, hashed_password: &str) -> PortResult<User> {
        let mut state = self.state.lock().unwrap();
        if state.users.contains_key(email) {
            return Err(PortError::Conflict(format!("{} already registered", email)));
        }
        let user_id = Uuid::new_v4();
        state.users.insert(
            email.to_string(),
            UserCredentials {
                user_id,
                email: email.to_string(),
                hashed_password: hashed_password.to_string(),
            },
        );
        Ok(User {
            user_id,
            email: email.to_string(),
        })
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let state = self.state.lock().unwrap();
        state
            .users
            .get(email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(email.to_string()))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut state = self.state.lock().unwrap();
        state.auth_sessions.insert(
            session_id.to_string(),
            AuthSession {
                id: session_id.to_string(),
                user_id,
                expires_at,
            },
        );
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let state = self.state.lock().unwrap();
        match state.auth_sessions.get(session_id) {
            Some(session) if session.expires_at > Utc::now() => Ok(session.user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.state.lock().unwrap().auth_sessions.remove(session_id);
        Ok(())
    }

    async fn insert_generation(&self, generation: NewGeneration) -> PortResult<Generation> {
        if self.fail_generation_insert {
            return Err(PortError::Storage {
                code: "23514".to_string(),
                message: "generations_generated_count_check".to_string(),
            });
        }
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let now = state.tick();
        let row = Generation {
            id,
            user_id: generation.user_id,
            model: generation.model,
            generated_count: generation.generated_count,
            accepted_unedited_count: None,
            accepted_edited_count: None,
            source_text_hash: generation.source_text_hash,
            source_text_length: generation.source_text_length,
            generation_duration: Some(generation.generation_duration),
            created_at: now,
            updated_at: now,
        };
        state.generations.push(row.clone());
        Ok(row)
    }

    async fn list_accepted_generations(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> PortResult<Page<Generation>> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<Generation> = state
            .generations
            .iter()
            .filter(|g| g.user_id == user_id && g.total_accepted() > 0)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(Page {
            total: rows.len() as u64,
            items: window(&rows, page),
        })
    }

    async fn get_generation(
        &self,
        user_id: Uuid,
        generation_id: GenerationId,
    ) -> PortResult<Option<Generation>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .generations
            .iter()
            .find(|g| g.id == generation_id && g.user_id == user_id)
            .cloned())
    }

    async fn existing_generation_ids(
        &self,
        user_id: Uuid,
        ids: &[GenerationId],
    ) -> PortResult<Vec<GenerationId>> {
        let mut state = self.state.lock().unwrap();
        state.existence_queries += 1;
        Ok(state
            .generations
            .iter()
            .filter(|g| g.user_id == user_id && ids.contains(&g.id))
            .map(|g| g.id)
            .collect())
    }

    async fn increment_acceptance_counts(
        &self,
        generation_id: GenerationId,
        unedited: i32,
        edited: i32,
    ) -> PortResult<()> {
        if self.fail_increments {
            return Err(PortError::Storage {
                code: "40001".to_string(),
                message: "could not serialize access".to_string(),
            });
        }
        let mut state = self.state.lock().unwrap();
        let generation = state
            .generations
            .iter_mut()
            .find(|g| g.id == generation_id)
            .ok_or_else(|| PortError::NotFound(generation_id.to_string()))?;
        generation.accepted_unedited_count =
            Some(generation.accepted_unedited_count.unwrap_or(0) + unedited);
        generation.accepted_edited_count =
            Some(generation.accepted_edited_count.unwrap_or(0) + edited);
        Ok(())
    }

    async fn insert_generation_error_log(&self, entry: NewGenerationErrorLog) -> PortResult<()> {
        if self.fail_error_log {
            return Err(PortError::Storage {
                code: "53300".to_string(),
                message: "too many connections".to_string(),
            });
        }
        self.state.lock().unwrap().error_logs.push(entry);
        Ok(())
    }

    async fn insert_flashcards(
        &self,
        user_id: Uuid,
        flashcards: &[NewFlashcard],
    ) -> PortResult<Vec<Flashcard>> {
        if self.fail_flashcard_inserts {
            return Err(PortError::Storage {
                code: "23514".to_string(),
                message: "check constraint violated".to_string(),
            });
        }
        let mut state = self.state.lock().unwrap();
        let mut created = Vec::with_capacity(flashcards.len());
        for card in flashcards {
            let id = state.next_id();
            let now = state.tick();
            created.push(Flashcard {
                id,
                user_id,
                front: card.front.clone(),
                back: card.back.clone(),
                source: card.source,
                generation_id: card.generation_id,
                created_at: now,
                updated_at: now,
            });
        }
        state.flashcards.extend(created.iter().cloned());
        Ok(created)
    }

    async fn list_flashcards(
        &self,
        user_id: Uuid,
        query: &FlashcardQuery,
    ) -> PortResult<Page<Flashcard>> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<Flashcard> = state
            .flashcards
            .iter()
            .filter(|f| f.user_id == user_id)
            .filter(|f| query.source.map_or(true, |s| f.source == s))
            .filter(|f| query.generation_id.map_or(true, |g| f.generation_id == Some(g)))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            let ord = compare(a, b, query.sort).then(a.id.cmp(&b.id));
            match query.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
        Ok(Page {
            total: rows.len() as u64,
            items: window(&rows, query.window),
        })
    }

    async fn list_generation_flashcards(
        &self,
        user_id: Uuid,
        generation_id: GenerationId,
    ) -> PortResult<Vec<Flashcard>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .flashcards
            .iter()
            .filter(|f| f.user_id == user_id && f.generation_id == Some(generation_id))
            .cloned()
            .collect())
    }

    async fn get_flashcard(&self, user_id: Uuid, id: FlashcardId) -> PortResult<Option<Flashcard>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .flashcards
            .iter()
            .find(|f| f.id == id && f.user_id == user_id)
            .cloned())
    }

    async fn update_flashcard(
        &self,
        user_id: Uuid,
        id: FlashcardId,
        changes: &FlashcardChanges,
    ) -> PortResult<Option<Flashcard>> {
        let mut state = self.state.lock().unwrap();
        let now = state.tick();
        let Some(card) = state
            .flashcards
            .iter_mut()
            .find(|f| f.id == id && f.user_id == user_id)
        else {
            return Ok(None);
        };
        card.front = changes.front.clone();
        card.back = changes.back.clone();
        card.source = changes.source;
        card.generation_id = changes.generation_id;
        card.updated_at = now;
        Ok(Some(card.clone()))
    }

    async fn delete_flashcard(&self, user_id: Uuid, id: FlashcardId) -> PortResult<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.flashcards.len();
        state
            .flashcards
            .retain(|f| !(f.id == id && f.user_id == user_id));
        Ok(state.flashcards.len() < before)
    }
}

/// What the fake provider does when called.
#[derive(Debug, Clone)]
pub enum MockCompletion {
    Respond(String),
    Fail(ProviderError),
}

pub struct MockCompletionService {
    behavior: MockCompletion,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl MockCompletionService {
    pub fn responding(raw: impl Into<String>) -> Self {
        Self {
            behavior: MockCompletion::Respond(raw.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            behavior: MockCompletion::Fail(error),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for MockCompletionService {
    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: &CompletionRequest) -> PortResult<String> {
        self.calls.lock().unwrap().push(request.clone());
        match &self.behavior {
            MockCompletion::Respond(raw) => Ok(raw.clone()),
            MockCompletion::Fail(err) => Err(PortError::Provider(err.clone())),
        }
    }
}

/// A source text comfortably inside the accepted length range.
pub fn source_text() -> String {
    "Rust ownership rules keep memory safe without a garbage collector. ".repeat(20)
}
